//! Read side: search, listing and single-record lookup / 查询服务

use serde::Serialize;

use crate::config::SearchConfig;
use crate::error::QueryError;
use crate::models::{Pagination, Record};
use crate::search::SearchOptions;
use crate::store::RecordStore;

/// Shortest accepted search string (characters, after trimming) / 最短搜索长度
pub const MIN_QUERY_CHARS: usize = 3;

/// One page of search results / 搜索结果页
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub query: String,
    pub items: Vec<Record>,
    pub pagination: Pagination,
}

/// One page of the ordered listing / 列表页
#[derive(Debug, Clone, Serialize)]
pub struct ListingPage {
    pub items: Vec<Record>,
    pub pagination: Pagination,
}

/// Validate a raw search string, returning the trimmed query / 校验搜索词
pub fn validate_query(raw_query: &str) -> Result<&str, QueryError> {
    let query = raw_query.trim();
    if query.is_empty() {
        return Err(QueryError::EmptyQuery);
    }
    if query.chars().count() < MIN_QUERY_CHARS {
        return Err(QueryError::QueryTooShort);
    }
    Ok(query)
}

/// Clamp page to >= 1 and page size to 1..=max, falling back to the default size
fn clamp_paging(page: i64, page_size: Option<i64>, config: &SearchConfig) -> (i64, i64) {
    let max = config.max_page_size.max(1);
    let size = page_size.unwrap_or(config.page_size).clamp(1, max);
    (page.max(1), size)
}

pub struct QueryService<'a> {
    store: &'a RecordStore,
    config: &'a SearchConfig,
}

impl<'a> QueryService<'a> {
    pub fn new(store: &'a RecordStore, config: &'a SearchConfig) -> Self {
        Self { store, config }
    }

    /// Full-text search over name, username, nickname / 全文搜索
    pub async fn search(
        &self,
        raw_query: &str,
        page: i64,
        page_size: Option<i64>,
    ) -> Result<SearchPage, QueryError> {
        let query = validate_query(raw_query)?;
        let (page, page_size) = clamp_paging(page, page_size, self.config);

        let options = SearchOptions::new(query)
            .with_limit(page_size)
            .with_offset(Pagination::offset_for(page, page_size));
        let (hits, total) = self.store.index().search(&options).await?;

        tracing::debug!("Search {:?} page {}: {} of {} hits", query, page, hits.len(), total);
        Ok(SearchPage {
            query: query.to_string(),
            items: hits.into_iter().map(|h| h.record).collect(),
            pagination: Pagination::new(page, page_size, total),
        })
    }

    /// Exact nickname lookup / 按昵称查找
    pub async fn lookup(&self, nickname: &str) -> Result<Record, QueryError> {
        self.store
            .get_by_nickname(nickname)
            .await?
            .ok_or(QueryError::RecordNotFound)
    }
}

pub struct ListingService<'a> {
    store: &'a RecordStore,
    config: &'a SearchConfig,
}

impl<'a> ListingService<'a> {
    pub fn new(store: &'a RecordStore, config: &'a SearchConfig) -> Self {
        Self { store, config }
    }

    /// Records in ascending id order / 按 id 升序分页
    pub async fn list(&self, page: i64, page_size: Option<i64>) -> Result<ListingPage, QueryError> {
        let (page, page_size) = clamp_paging(page, page_size, self.config);
        let (items, total) = self
            .store
            .list_ordered(Pagination::offset_for(page, page_size), page_size)
            .await?;

        Ok(ListingPage {
            items,
            pagination: Pagination::new(page, page_size, total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{open_store, record};

    #[test]
    fn test_validate_query_boundaries() {
        assert!(matches!(validate_query(""), Err(QueryError::EmptyQuery)));
        assert!(matches!(validate_query("   "), Err(QueryError::EmptyQuery)));
        assert!(matches!(validate_query("ab"), Err(QueryError::QueryTooShort)));
        assert!(matches!(validate_query("  ab  "), Err(QueryError::QueryTooShort)));
        assert_eq!(validate_query(" abc ").unwrap(), "abc");
        // characters, not bytes
        assert!(matches!(validate_query("张三"), Err(QueryError::QueryTooShort)));
        assert_eq!(validate_query("张三丰").unwrap(), "张三丰");
    }

    #[test]
    fn test_clamp_paging() {
        let config = SearchConfig::default();
        assert_eq!(clamp_paging(0, None, &config), (1, 10));
        assert_eq!(clamp_paging(-4, Some(0), &config), (1, 1));
        assert_eq!(clamp_paging(2, Some(1000), &config), (2, 100));
    }

    #[tokio::test]
    async fn test_listing_pages_of_25() {
        let (_dir, store) = open_store().await;
        for i in 0..25 {
            store.insert(&record(&format!("user{:02}", i), "n")).await.unwrap();
        }
        let config = SearchConfig::default();
        let listing = ListingService::new(&store, &config);

        let p1 = listing.list(1, None).await.unwrap();
        let p2 = listing.list(2, None).await.unwrap();
        let p3 = listing.list(3, None).await.unwrap();
        assert_eq!(p1.items.len(), 10);
        assert_eq!(p2.items.len(), 10);
        assert_eq!(p3.items.len(), 5);
        assert_eq!(p3.pagination.total_pages, 3);
        assert_eq!(p3.pagination.total_count, 25);
        assert_eq!(p2.items[0].username, "user10");

        let clamped = listing.list(0, None).await.unwrap();
        assert_eq!(clamped.pagination.page, 1);
        assert_eq!(clamped.items[0].username, "user00");

        let past_end = listing.list(9, None).await.unwrap();
        assert!(past_end.items.is_empty());
    }

    #[tokio::test]
    async fn test_search_pages_of_25() {
        let (_dir, store) = open_store().await;
        for i in 0..25 {
            store.insert(&record(&format!("match{:02}", i), "n")).await.unwrap();
        }
        store.insert(&record("unrelated", "n")).await.unwrap();
        let config = SearchConfig::default();
        let service = QueryService::new(&store, &config);

        let p1 = service.search("match", 1, None).await.unwrap();
        let p3 = service.search("match", 3, None).await.unwrap();
        assert_eq!(p1.items.len(), 10);
        assert_eq!(p3.items.len(), 5);
        assert_eq!(p1.pagination.total_count, 25);
        assert_eq!(p1.pagination.total_pages, 3);
        assert_eq!(p1.query, "match");
    }

    #[tokio::test]
    async fn test_search_boundary_two_vs_three() {
        let (_dir, store) = open_store().await;
        store.insert(&record("abcuser", "n")).await.unwrap();
        let config = SearchConfig::default();
        let service = QueryService::new(&store, &config);

        assert!(matches!(service.search("ab", 1, None).await, Err(QueryError::QueryTooShort)));
        assert!(matches!(service.search("  ", 1, None).await, Err(QueryError::EmptyQuery)));
        let page = service.search("abc", 1, None).await.unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_new_record_is_immediately_searchable() {
        let (_dir, store) = open_store().await;
        store.insert(&record("quiet", "other")).await.unwrap();
        let id = store.insert(&record("someone", "zed123")).await.unwrap();
        let config = SearchConfig::default();

        let page = QueryService::new(&store, &config).search("zed", 1, None).await.unwrap();
        assert!(page.items.iter().any(|r| r.id == id));
    }

    #[tokio::test]
    async fn test_lookup_by_nickname() {
        let (_dir, store) = open_store().await;
        store.insert(&record("alice", "ally")).await.unwrap();
        let config = SearchConfig::default();
        let service = QueryService::new(&store, &config);

        assert_eq!(service.lookup("ally").await.unwrap().username, "alice");
        assert!(matches!(service.lookup("nobody").await, Err(QueryError::RecordNotFound)));
    }
}
