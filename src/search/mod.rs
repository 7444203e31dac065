//! Search module - full-text index over name, username, nickname / 搜索模块
//!
//! Index features / 索引特性：
//! - SQLite FTS5 virtual table with the trigram tokenizer (substring matching, case-insensitive)
//! - External content: rows live in `records`, the index stores only tokens
//! - Triggers keep the index in the same transaction as every insert/delete on `records`
//! - bm25 ranking, ties broken by ascending record id

pub mod db_index;
pub mod schema;
pub mod tokenizer;

pub use db_index::SearchIndex;
pub use schema::{IndexStats, SearchHit, SearchOptions};
