//! Substring matching over a candidate list.
//!
//! No ranking: matches keep source order and are cut at `limit`.

use super::repo_types::Product;

pub fn search(query: &str, candidates: &[Product], limit: usize) -> Vec<Product> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    candidates
        .iter()
        .filter(|p| matches(p, &needle))
        .take(limit)
        .cloned()
        .collect()
}

/// `needle` must already be lowercased.
fn matches(p: &Product, needle: &str) -> bool {
    [&p.name, &p.brand, &p.description]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}
