//! 数据库全文索引 - FTS5 trigram
//!
//! 存储方案：
//! - record_search：FTS5 虚拟表，外部内容表为 records（content_rowid = id），只存分词
//! - 三个触发器（插入/更新/删除）在 records 的同一事务内维护索引
//! - 查询时按 bm25 排序，分数相同按 id 升序

use sqlx::{Pool, Sqlite, SqliteConnection};

use super::schema::{IndexStats, SearchHit, SearchOptions};
use super::tokenizer::match_expression;
use crate::models::Record;

/// FTS5 表名
pub const INDEX_TABLE: &str = "record_search";

const TRIGGERS: [&str; 3] = ["record_search_ai", "record_search_ad", "record_search_au"];

#[derive(sqlx::FromRow)]
struct HitRow {
    #[sqlx(flatten)]
    record: Record,
    score: f64,
}

/// 全文搜索索引
#[derive(Clone)]
pub struct SearchIndex {
    db: Pool<Sqlite>,
}

impl SearchIndex {
    /// 使用现有数据库连接池
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 初始化索引表与触发器（不删除已有数据）
    pub async fn init(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.db.acquire().await?;
        Self::ensure_schema(&mut conn).await
    }

    /// 创建索引表；表是新建的则从 records 回填
    pub(crate) async fn ensure_schema(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        let existed = Self::table_exists(&mut *conn).await?;

        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE IF NOT EXISTS record_search USING fts5(
                name,
                username,
                nickname,
                content='records',
                content_rowid='id',
                tokenize='trigram'
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;

        if !existed {
            sqlx::query("INSERT INTO record_search(record_search) VALUES ('rebuild')")
                .execute(&mut *conn)
                .await?;
            tracing::info!("Created search index {}", INDEX_TABLE);
        }

        sqlx::query(
            r#"
            CREATE TRIGGER IF NOT EXISTS record_search_ai AFTER INSERT ON records BEGIN
                INSERT INTO record_search(rowid, name, username, nickname)
                VALUES (new.id, new.name, new.username, new.nickname);
            END
            "#,
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            CREATE TRIGGER IF NOT EXISTS record_search_ad AFTER DELETE ON records BEGIN
                INSERT INTO record_search(record_search, rowid, name, username, nickname)
                VALUES ('delete', old.id, old.name, old.username, old.nickname);
            END
            "#,
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            CREATE TRIGGER IF NOT EXISTS record_search_au AFTER UPDATE ON records BEGIN
                INSERT INTO record_search(record_search, rowid, name, username, nickname)
                VALUES ('delete', old.id, old.name, old.username, old.nickname);
                INSERT INTO record_search(rowid, name, username, nickname)
                VALUES (new.id, new.name, new.username, new.nickname);
            END
            "#,
        )
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// 删除触发器和索引表（清空重建时调用）
    pub(crate) async fn drop_schema(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        for trigger in TRIGGERS {
            sqlx::query(&format!("DROP TRIGGER IF EXISTS {}", trigger))
                .execute(&mut *conn)
                .await?;
        }
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", INDEX_TABLE))
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn table_exists(conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(INDEX_TABLE)
                .fetch_one(conn)
                .await?;
        Ok(count > 0)
    }

    /// 从 records 全量重建索引
    pub async fn rebuild(&self) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO record_search(record_search) VALUES ('rebuild')")
            .execute(&self.db)
            .await?;
        tracing::info!("Search index rebuilt");
        Ok(())
    }

    /// 搜索：返回当前页命中和命中总数（同一读事务内）
    pub async fn search(&self, options: &SearchOptions) -> Result<(Vec<SearchHit>, i64), sqlx::Error> {
        let Some(expression) = match_expression(&options.query) else {
            return Ok((Vec::new(), 0));
        };
        tracing::debug!("FTS match expression: {}", expression);

        let mut tx = self.db.begin().await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM record_search WHERE record_search MATCH ?")
                .bind(&expression)
                .fetch_one(&mut *tx)
                .await?;

        let rows: Vec<HitRow> = if total == 0 {
            Vec::new()
        } else {
            sqlx::query_as(
                r#"
                SELECT r.id, r.username, r.email, r.password, r.nickname, r.name, r.id_card, r.phone,
                    m.score AS score
                FROM (
                    SELECT rowid AS rid, rank AS score
                    FROM record_search
                    WHERE record_search MATCH ?
                ) AS m
                JOIN records r ON r.id = m.rid
                ORDER BY m.score ASC, r.id ASC
                LIMIT ? OFFSET ?
                "#,
            )
            .bind(&expression)
            .bind(options.limit)
            .bind(options.offset)
            .fetch_all(&mut *tx)
            .await?
        };

        tx.commit().await?;

        let hits = rows
            .into_iter()
            .map(|row| SearchHit {
                record: row.record,
                score: row.score,
            })
            .collect();
        Ok((hits, total))
    }

    /// 获取统计信息
    pub async fn stats(&self) -> Result<IndexStats, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM record_search_docsize")
            .fetch_one(&self.db)
            .await?;
        Ok(IndexStats {
            document_count: count.max(0) as u64,
        })
    }
}
