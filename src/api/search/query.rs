use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::types::SearchParams;
use crate::api::{parse_page, parse_page_size, ApiError, ApiResponse};
use crate::service::SearchPage;
use crate::state::AppState;

/// GET /api/search?q=...&page=N - 按姓名、用户名、昵称全文搜索
///
/// An empty `q` redirects to the listing with a warning, fewer than three
/// characters is a 400.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<SearchPage>>, ApiError> {
    let raw = params.q.unwrap_or_default();
    let page = parse_page(params.page.as_deref());
    let page_size = parse_page_size(params.page_size.as_deref());

    let result = state
        .query_service()
        .search(&raw, page, page_size)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::api::tests::{get_json, test_app};

    #[tokio::test]
    async fn test_search_returns_matches() {
        let (_dir, app) = test_app(&["matchone", "matchtwo", "other"]).await;

        let (status, body) = get_json(app, "/api/search?q=match").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["query"], "match");
        assert_eq!(body["data"]["pagination"]["total_count"], 2);
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_search_bad_page_size_uses_default() {
        let (_dir, app) = test_app(&["matchone", "matchtwo"]).await;

        let (status, body) = get_json(app.clone(), "/api/search?q=match&page_size=abc").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 200);
        assert_eq!(body["data"]["pagination"]["page_size"], 10);

        let (_, body) = get_json(app, "/api/search?q=match&page_size=1").await;
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["pagination"]["has_next"], true);
        assert_eq!(body["data"]["pagination"]["has_prev"], false);
    }

    #[tokio::test]
    async fn test_search_too_short() {
        let (_dir, app) = test_app(&["alice"]).await;

        let (status, body) = get_json(app, "/api/search?q=al").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Search string must have at least 3 characters");
    }

    #[tokio::test]
    async fn test_empty_search_redirects_with_warning() {
        let (_dir, app) = test_app(&[]).await;

        let response = app
            .oneshot(Request::builder().uri("/api/search?q=%20").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("/api/records?warning="));
        assert!(location.contains("Enter%20keyword"));
    }

    #[tokio::test]
    async fn test_redirect_target_echoes_warning() {
        let (_dir, app) = test_app(&[]).await;

        let (status, body) = get_json(app, "/api/records?warning=Enter%20keyword").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["warning"], "Enter keyword");
    }
}
