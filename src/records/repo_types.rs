use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CupSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl CupSize {
    pub fn multiplier(self) -> f64 {
        match self {
            CupSize::Small => 0.8,
            CupSize::Medium => 1.0,
            CupSize::Large => 1.3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CupSize::Small => "small",
            CupSize::Medium => "medium",
            CupSize::Large => "large",
        }
    }

    /// Unknown labels read as medium, whose multiplier is 1.0.
    pub fn parse_lenient(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }
}

impl FromStr for CupSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(CupSize::Small),
            "medium" => Ok(CupSize::Medium),
            "large" => Ok(CupSize::Large),
            other => Err(format!("unknown cup size: {other}")),
        }
    }
}

/// Four-tier sweetness label derived from a percentage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SugarTier {
    None,
    Light,
    #[default]
    Half,
    Full,
}

impl SugarTier {
    /// `0 -> none`, `(0,30] -> light`, `(30,70] -> half`, `(70,100] -> full`.
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            0 => SugarTier::None,
            1..=30 => SugarTier::Light,
            31..=70 => SugarTier::Half,
            _ => SugarTier::Full,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SugarTier::None => "none",
            SugarTier::Light => "light",
            SugarTier::Half => "half",
            SugarTier::Full => "full",
        }
    }
}

impl FromStr for SugarTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(SugarTier::None),
            "light" => Ok(SugarTier::Light),
            "half" => Ok(SugarTier::Half),
            "full" => Ok(SugarTier::Full),
            other => Err(format!("unknown sugar level: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Happy,
    Relaxed,
    Tired,
    Stressed,
    Celebrating,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Relaxed => "relaxed",
            Mood::Tired => "tired",
            Mood::Stressed => "stressed",
            Mood::Celebrating => "celebrating",
        }
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(Mood::Happy),
            "relaxed" => Ok(Mood::Relaxed),
            "tired" => Ok(Mood::Tired),
            "stressed" => Ok(Mood::Stressed),
            "celebrating" => Ok(Mood::Celebrating),
            other => Err(format!("unknown mood: {other}")),
        }
    }
}

/// A logged drink. Field names are shared by the database mirror and the local JSON file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: Uuid,
    pub drink_name: String,
    pub brand: String,
    #[serde(default)]
    pub product_id: Option<String>,
    pub calories: u32,
    pub cup_size: CupSize,
    pub sugar_level: SugarTier,
    #[serde(default)]
    pub sugar_percent: u8,
    pub mood: Mood,
    #[serde(default)]
    pub notes: String,
    /// Creation time; kept across edits.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// Unix millis of the latest save.
    pub timestamp: i64,
}

/// Row shape of the `drink_records` table.
#[derive(Debug, FromRow)]
pub struct RecordRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub drink_name: String,
    pub brand: String,
    pub product_id: Option<String>,
    pub calories: i32,
    pub cup_size: String,
    pub sugar_level: String,
    pub sugar_percent: i16,
    pub mood: String,
    pub notes: Option<String>,
    pub date: OffsetDateTime,
    pub timestamp: i64,
}

impl From<RecordRow> for Record {
    fn from(r: RecordRow) -> Self {
        let sugar_percent = r.sugar_percent.clamp(0, 100) as u8;
        Self {
            id: r.id,
            drink_name: r.drink_name,
            brand: r.brand,
            product_id: r.product_id,
            calories: r.calories.max(0) as u32,
            cup_size: CupSize::parse_lenient(&r.cup_size),
            sugar_level: r
                .sugar_level
                .parse()
                .unwrap_or_else(|_| SugarTier::from_percent(sugar_percent)),
            sugar_percent,
            mood: r.mood.parse().unwrap_or_default(),
            notes: r.notes.unwrap_or_default(),
            date: r.date,
            timestamp: r.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sugar_tier_boundaries() {
        assert_eq!(SugarTier::from_percent(0), SugarTier::None);
        assert_eq!(SugarTier::from_percent(1), SugarTier::Light);
        assert_eq!(SugarTier::from_percent(30), SugarTier::Light);
        assert_eq!(SugarTier::from_percent(31), SugarTier::Half);
        assert_eq!(SugarTier::from_percent(70), SugarTier::Half);
        assert_eq!(SugarTier::from_percent(71), SugarTier::Full);
        assert_eq!(SugarTier::from_percent(100), SugarTier::Full);
    }

    #[test]
    fn sugar_tier_is_monotonic() {
        let mut prev = SugarTier::from_percent(0);
        for pct in 1..=100u8 {
            let tier = SugarTier::from_percent(pct);
            assert!(tier >= prev, "{pct}% went from {prev:?} to {tier:?}");
            prev = tier;
        }
    }

    #[test]
    fn unknown_cup_size_is_neutral() {
        assert_eq!(CupSize::parse_lenient("venti").multiplier(), 1.0);
        assert_eq!(CupSize::parse_lenient("LARGE"), CupSize::Large);
    }

    #[test]
    fn record_uses_stable_camel_case_field_names() {
        let rec = Record {
            id: Uuid::nil(),
            drink_name: "Pearl Milk Tea".into(),
            brand: "CoCo".into(),
            product_id: None,
            calories: 288,
            cup_size: CupSize::Medium,
            sugar_level: SugarTier::Half,
            sugar_percent: 50,
            mood: Mood::Relaxed,
            notes: String::new(),
            date: OffsetDateTime::UNIX_EPOCH,
            timestamp: 0,
        };
        let json = serde_json::to_value(&rec).unwrap();
        for key in [
            "drinkName", "brand", "calories", "cupSize", "sugarLevel", "mood", "notes", "date",
            "timestamp", "id",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["sugarLevel"], "half");
        assert_eq!(json["cupSize"], "medium");
    }
}
