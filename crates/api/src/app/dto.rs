use serde::Deserialize;

/// `GET /job/search?q=...`
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}
