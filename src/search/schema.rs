//! Search query and result types / 搜索查询与结果类型

use serde::Serialize;

use crate::models::Record;

/// Search result / 搜索结果
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub record: Record,
    /// bm25 rank, lower is better / 相关性分数（越小越相关）
    pub score: f64,
}

/// Search query options / 搜索查询选项
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Search keywords / 搜索关键词
    pub query: String,
    /// Maximum number of results to return / 最大返回结果数
    pub limit: i64,
    /// Offset (for pagination) / 偏移量
    pub offset: i64,
}

impl SearchOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: 10,
            offset: 0,
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// 索引统计
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub document_count: u64,
}
