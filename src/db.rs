//! 数据库连接与表结构
//!
//! - 单个 SQLite 文件 + WAL 模式（读写并发安全）
//! - records 表：用户名、邮箱唯一
//! - 全文索引表由 search 模块负责创建（见 `SearchIndex::init`）

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Executor, SqlitePool};
use std::str::FromStr;
use std::time::Duration;

/// Open the connection pool / 打开连接池
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    // busy_timeout 按连接生效，所以写在连接参数里而不是单独执行 PRAGMA
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(10));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await?;

    tracing::info!("Database opened: {} (WAL mode)", database_url);
    Ok(pool)
}

/// Run database migrations / 创建表结构（只在不存在时创建）
pub async fn run_migrations<'c, E>(executor: E) -> Result<(), sqlx::Error>
where
    E: Executor<'c, Database = sqlx::Sqlite>,
{
    executor
        .execute(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                nickname TEXT NOT NULL,
                name TEXT NOT NULL,
                id_card TEXT NOT NULL,
                phone TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_records_nickname ON records(nickname);
            "#,
        )
        .await?;
    Ok(())
}

/// Drop the records table / 删除记录表
pub async fn drop_tables<'c, E>(executor: E) -> Result<(), sqlx::Error>
where
    E: Executor<'c, Database = sqlx::Sqlite>,
{
    executor.execute("DROP TABLE IF EXISTS records").await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn open_temp() -> (tempfile::TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("test.db").to_string_lossy());
    let pool = connect(&url, 4).await.unwrap();
    (dir, pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let (_dir, pool) = open_temp().await;
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let tables: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'records'")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(tables.len(), 1);
    }

    #[tokio::test]
    async fn test_wal_mode_enabled() {
        let (_dir, pool) = open_temp().await;
        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode").fetch_one(&pool).await.unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
