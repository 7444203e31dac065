pub mod records;
pub mod search;
pub mod server;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::QueryError;
use crate::state::AppState;

/// Shown when a search is submitted without keywords / 空搜索提示
pub const EMPTY_QUERY_WARNING: &str = "Enter keyword about name, username, nickname.";

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(status: StatusCode, message: &str) -> Self {
        Self {
            code: status.as_u16(),
            message: message.to_string(),
            data: None,
        }
    }
}

/// Handler error, rendered per [`QueryError`] kind / 接口错误
pub struct ApiError(pub QueryError);

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            QueryError::EmptyQuery => {
                let target = format!(
                    "/api/records?warning={}",
                    urlencoding::encode(EMPTY_QUERY_WARNING)
                );
                return Redirect::to(&target).into_response();
            }
            QueryError::QueryTooShort => StatusCode::BAD_REQUEST,
            QueryError::RecordNotFound => StatusCode::NOT_FOUND,
            QueryError::Store(e) => {
                tracing::error!("Storage error while serving request: {}", e);
                let body = ApiResponse::<()>::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };
        (status, Json(ApiResponse::<()>::error(status, &self.0.to_string()))).into_response()
    }
}

/// Lenient page parameter, anything unparsable means page 1 / 解析页码
pub(crate) fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|p| p.trim().parse::<i64>().ok()).unwrap_or(1)
}

/// Optional page size, unparsable values fall back to the configured default
pub(crate) fn parse_page_size(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|p| p.trim().parse::<i64>().ok())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(server::health_check))
        .route("/api/records", get(records::list_records))
        .route("/api/user/:nickname", get(records::get_user))
        .route("/api/search", get(search::search))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
