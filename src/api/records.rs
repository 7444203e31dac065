use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{parse_page, ApiError, ApiResponse};
use crate::models::Record;
use crate::service::ListingPage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    page: Option<String>,
    /// Set by the empty-search redirect / 空搜索跳转带回的提示
    #[serde(default)]
    warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    #[serde(flatten)]
    pub page: ListingPage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// GET /api/records?page=N - 分页列出全部记录
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ApiResponse<ListResponse>>, ApiError> {
    let page = parse_page(params.page.as_deref());
    let listing = state.listing_service().list(page, None).await?;

    Ok(Json(ApiResponse::success(ListResponse {
        page: listing,
        warning: params.warning,
    })))
}

/// GET /api/user/:nickname - 按昵称查看单条记录
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(nickname): Path<String>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    let record = state.query_service().lookup(&nickname).await?;
    Ok(Json(ApiResponse::success(record)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::api::tests::{get_json, test_app};

    #[tokio::test]
    async fn test_list_records_paginates() {
        let names: Vec<String> = (0..25).map(|i| format!("user{:02}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let (_dir, app) = test_app(&refs).await;

        let (status, body) = get_json(app.clone(), "/api/records?page=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 5);
        assert_eq!(body["data"]["pagination"]["total_pages"], 3);
        assert_eq!(body["data"]["pagination"]["total_count"], 25);

        let (_, body) = get_json(app, "/api/records?page=bogus").await;
        assert_eq!(body["data"]["pagination"]["page"], 1);
        assert_eq!(body["data"]["items"][0]["username"], "user00");
        assert!(body["data"]["items"][0].get("password").is_none());
    }

    #[tokio::test]
    async fn test_get_user_found_and_missing() {
        let (_dir, app) = test_app(&["alice"]).await;

        let (status, body) = get_json(app.clone(), "/api/user/nick_alice").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], "alice");

        let (status, body) = get_json(app, "/api/user/nobody").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Record not found");
    }
}
