use serde::{Deserialize, Serialize};

use super::repo_types::Product;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
    /// Client-side search counter; omitted means "next".
    pub seq: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub seq: u64,
    /// A newer search from the same user was issued while this one ran; discard it.
    pub stale: bool,
    pub results: Vec<Product>,
    pub lowest_calorie: Option<Product>,
    pub balanced: Option<Product>,
}

impl SearchResponse {
    pub fn stale(seq: u64) -> Self {
        Self {
            seq,
            stale: true,
            results: Vec::new(),
            lowest_calorie: None,
            balanced: None,
        }
    }
}
