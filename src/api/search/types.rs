use serde::Deserialize;

/// GET /api/search 参数
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    /// Optional override, clamped to `search.max_page_size` / 每页条数
    #[serde(default)]
    pub page_size: Option<String>,
}
