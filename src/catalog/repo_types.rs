use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Coarse calorie bucket shown next to a product.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CalorieCategory {
    Low,
    #[default]
    Medium,
    High,
}

impl CalorieCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            CalorieCategory::Low => "low",
            CalorieCategory::Medium => "medium",
            CalorieCategory::High => "high",
        }
    }
}

impl fmt::Display for CalorieCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalorieCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(CalorieCategory::Low),
            "medium" => Ok(CalorieCategory::Medium),
            "high" => Ok(CalorieCategory::High),
            other => Err(format!("unknown calorie category: {other}")),
        }
    }
}

/// Catalog entry. `calories` is the reference value at medium size and full sweetness.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub description: String,
    pub calories: u32,
    pub sweetness: String,
    pub size: String,
    pub ingredients: Vec<String>,
    /// 0..=5
    pub rating: f64,
    pub category: CalorieCategory,
    pub image_url: Option<String>,
}

/// Row shape of the `products` table.
#[derive(Debug, FromRow)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub calories: Option<i32>,
    pub sweetness: Option<String>,
    pub size: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            brand: r.brand.unwrap_or_default(),
            description: r.description.unwrap_or_default(),
            calories: r.calories.unwrap_or(0).max(0) as u32,
            sweetness: r.sweetness.unwrap_or_default(),
            size: r.size.unwrap_or_default(),
            ingredients: r.ingredients.unwrap_or_default(),
            rating: r.rating.unwrap_or(0.0),
            category: r
                .category
                .as_deref()
                .and_then(|c| c.parse().ok())
                .unwrap_or_default(),
            image_url: r.image_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_deserializes_with_missing_fields() {
        let p: Product = serde_json::from_str(r#"{"id":"x","name":"Plain"}"#).unwrap();
        assert_eq!(p.calories, 0);
        assert_eq!(p.rating, 0.0);
        assert!(p.brand.is_empty());
        assert_eq!(p.category, CalorieCategory::Medium);
    }

    #[test]
    fn row_with_nulls_and_negative_calories_converts() {
        let row = ProductRow {
            id: "r1".into(),
            name: "Row Tea".into(),
            brand: None,
            description: None,
            calories: Some(-5),
            sweetness: None,
            size: None,
            ingredients: None,
            rating: None,
            category: Some("HIGH".into()),
            image_url: None,
        };
        let p = Product::from(row);
        assert_eq!(p.calories, 0);
        assert_eq!(p.category, CalorieCategory::High);
    }
}
