//! Record store - the `records` table plus its search index / 记录存储
//!
//! Every write goes through the store's write lock and a single transaction; the
//! FTS triggers fire inside that transaction, so a reader that runs after a write
//! returns always sees the record in search results as well.

use std::sync::Arc;

use sqlx::{SqliteConnection, SqlitePool};
use tokio::sync::Mutex;

use crate::db;
use crate::error::StoreError;
use crate::models::{NewRecord, Record};
use crate::search::SearchIndex;

const SELECT_COLUMNS: &str = "id, username, email, password, nickname, name, id_card, phone";

/// Record store / 记录存储
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
    index: SearchIndex,
    write_lock: Arc<Mutex<()>>,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            index: SearchIndex::new(pool.clone()),
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create missing tables, index and triggers / 初始化表结构
    pub async fn init(&self) -> Result<(), StoreError> {
        self.reset(false).await
    }

    /// Recreate the schema, optionally dropping everything first / 重建表结构
    pub async fn reset(&self, drop_existing: bool) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        if drop_existing {
            SearchIndex::drop_schema(&mut tx).await?;
            db::drop_tables(&mut *tx).await?;
            tracing::warn!("Dropped records table and search index");
        }

        db::run_migrations(&mut *tx).await?;
        SearchIndex::ensure_schema(&mut tx).await?;
        tx.commit().await?;

        tracing::info!("Record store initialized");
        Ok(())
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    /// Repopulate the search index from `records` / 重建搜索索引
    pub async fn reindex(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.index.rebuild().await?;
        Ok(())
    }

    /// Insert one record / 插入单条记录
    pub async fn insert(&self, record: &NewRecord) -> Result<i64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let id = insert_one(&mut tx, record).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Insert all records in one transaction, all or nothing / 批量插入（单事务）
    ///
    /// On any failure the transaction is rolled back and no row survives.
    pub async fn insert_batch(&self, records: &[NewRecord]) -> Result<Vec<i64>, StoreError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(records.len());

        for record in records {
            match insert_one(&mut tx, record).await {
                Ok(id) => ids.push(id),
                Err(e) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        tracing::error!("Rollback failed: {}", rollback_err);
                    }
                    tracing::warn!("Batch of {} records rolled back: {}", records.len(), e);
                    return Err(e);
                }
            }
        }

        tx.commit().await?;
        tracing::debug!("Committed batch of {} records", ids.len());
        Ok(ids)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Record>, StoreError> {
        let record = sqlx::query_as::<_, Record>(&format!(
            "SELECT {} FROM records WHERE username = ?",
            SELECT_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Exact nickname match, lowest id first / 按昵称精确查找
    pub async fn get_by_nickname(&self, nickname: &str) -> Result<Option<Record>, StoreError> {
        let record = sqlx::query_as::<_, Record>(&format!(
            "SELECT {} FROM records WHERE nickname = ? ORDER BY id LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM records WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Page of records in id order plus the total, from one snapshot / 按 id 分页
    pub async fn list_ordered(&self, offset: i64, limit: i64) -> Result<(Vec<Record>, i64), StoreError> {
        let mut tx = self.pool.begin().await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
            .fetch_one(&mut *tx)
            .await?;

        let items = sqlx::query_as::<_, Record>(&format!(
            "SELECT {} FROM records ORDER BY id ASC LIMIT ? OFFSET ?",
            SELECT_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((items, total))
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    /// Close database connection pool / 关闭数据库连接池
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn insert_one(conn: &mut SqliteConnection, record: &NewRecord) -> Result<i64, StoreError> {
    let result = sqlx::query(
        "INSERT INTO records (username, email, password, nickname, name, id_card, phone)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&record.username)
    .bind(&record.email)
    .bind(&record.password)
    .bind(&record.nickname)
    .bind(&record.name)
    .bind(&record.id_card)
    .bind(&record.phone)
    .execute(&mut *conn)
    .await
    .map_err(|e| classify(e, record))?;

    Ok(result.last_insert_rowid())
}

/// Turn UNIQUE constraint failures into [`StoreError::Uniqueness`] / 区分唯一约束冲突
fn classify(err: sqlx::Error, record: &NewRecord) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            // SQLite: "UNIQUE constraint failed: records.email"
            let message = db_err.message();
            let field = message
                .rsplit("records.")
                .next()
                .filter(|f| *f != message)
                .unwrap_or("unknown")
                .trim()
                .to_string();
            let value = match field.as_str() {
                "username" => record.username.clone(),
                "email" => record.email.clone(),
                _ => String::new(),
            };
            return StoreError::Uniqueness { field, value };
        }
    }
    StoreError::Database(err)
}
