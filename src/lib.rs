pub mod api;
pub mod config;
pub mod db;
pub mod encoding;
pub mod error;
pub mod import;
pub mod models;
pub mod search;
pub mod service;
pub mod state;
pub mod store;
