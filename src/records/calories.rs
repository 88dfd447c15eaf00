use super::repo_types::CupSize;

/// Calories assigned to free-text drinks that match no catalog product.
pub const DEFAULT_CUSTOM_CALORIES: u32 = 200;

/// Share of the base calories that does not depend on sugar.
const BASE_SHARE: f64 = 0.7;
const SUGAR_SHARE: f64 = 0.3;

/// Scales a product's reference calories by cup volume and, partially, by sweetness.
///
/// `round(base * size * (0.7 + 0.3 * sweetness/100))`. Inputs are clamped to
/// non-negative values and sweetness to 100 %.
pub fn estimate(base_calories: f64, size: CupSize, sweetness_percent: f64) -> u32 {
    let base = base_calories.max(0.0);
    let sweetness = sweetness_percent.clamp(0.0, 100.0) / 100.0;
    let factor = BASE_SHARE + SUGAR_SHARE * sweetness;
    (base * size.multiplier() * factor).round() as u32
}
