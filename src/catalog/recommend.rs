//! Picks two drinks out of a result set: the lightest one and a "balanced" alternative.
//!
//! The balanced score rewards rating first, calorie efficiency second and a brand that
//! differs from the lightest pick last:
//!
//! ```text
//! score = 0.5 * rating/5 + 0.3 * (1 - (cal - min) / range) + 0.2 * [brand differs]
//! ```
//!
//! `min` and `range` come from the full result set, the lightest pick included.
//! Ties on either pick go to the first element in iteration order.

use serde::Serialize;

use super::repo_types::Product;

const RATING_WEIGHT: f64 = 0.5;
const CALORIE_WEIGHT: f64 = 0.3;
const BRAND_WEIGHT: f64 = 0.2;
const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub lowest_calorie: Option<Product>,
    pub balanced: Option<Product>,
}

pub fn recommend(results: &[Product]) -> Recommendation {
    let Some(lowest) = lowest_calorie(results) else {
        return Recommendation::default();
    };

    let min_cal = lowest.calories as f64;
    let max_cal = results.iter().map(|p| p.calories).max().unwrap_or(lowest.calories) as f64;
    let range = match max_cal - min_cal {
        r if r == 0.0 => 1.0,
        r => r,
    };

    let remaining: Vec<&Product> = results.iter().filter(|p| p.id != lowest.id).collect();

    let mut best: Option<(&Product, f64)> = None;
    for p in &remaining {
        let s = balanced_score(p, lowest, min_cal, range);
        if best.map_or(true, |(_, top)| s > top) {
            best = Some((p, s));
        }
    }

    let balanced = match best {
        Some((p, _)) => Some(p),
        None => fallback_by_rating(&remaining),
    };

    tracing::debug!(
        lowest = %lowest.id,
        balanced = balanced.map(|p| p.id.as_str()).unwrap_or("-"),
        candidates = results.len(),
        "recommendation picked"
    );

    Recommendation {
        lowest_calorie: Some(lowest.clone()),
        balanced: balanced.cloned(),
    }
}

fn lowest_calorie(results: &[Product]) -> Option<&Product> {
    let mut iter = results.iter();
    let first = iter.next()?;
    Some(iter.fold(first, |min, p| if p.calories < min.calories { p } else { min }))
}

fn balanced_score(p: &Product, lowest: &Product, min_cal: f64, range: f64) -> f64 {
    let rating = p.rating / MAX_RATING;
    let efficiency = 1.0 - (p.calories as f64 - min_cal) / range;
    let diversity = if p.brand != lowest.brand { 1.0 } else { 0.0 };
    RATING_WEIGHT * rating + CALORIE_WEIGHT * efficiency + BRAND_WEIGHT * diversity
}

/// Highest rating, ties to fewer calories, then to first seen.
fn fallback_by_rating<'a>(candidates: &[&'a Product]) -> Option<&'a Product> {
    let mut best: Option<&Product> = None;
    for &p in candidates {
        best = match best {
            None => Some(p),
            Some(b) if p.rating > b.rating => Some(p),
            Some(b) if p.rating == b.rating && p.calories < b.calories => Some(p),
            keep => keep,
        };
    }
    best
}
