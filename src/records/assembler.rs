use time::OffsetDateTime;
use uuid::Uuid;

use super::calories::{estimate, DEFAULT_CUSTOM_CALORIES};
use super::repo_types::{CupSize, Mood, Record, SugarTier};
use crate::catalog::repo_types::Product;

pub const CUSTOM_BRAND: &str = "custom";

/// What the user picked: a catalog product or a free-text drink name.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Product(Product),
    Custom(String),
}

/// The form state that is not the selection itself.
#[derive(Debug, Clone, Default)]
pub struct EntryDetails {
    pub cup_size: CupSize,
    pub sugar_percent: u8,
    pub mood: Mood,
    pub notes: String,
}

pub fn assemble(selection: &Selection, details: &EntryDetails, existing: Option<&Record>) -> Record {
    assemble_at(selection, details, existing, OffsetDateTime::now_utc())
}

/// `existing` means edit mode: its id and creation date survive.
pub fn assemble_at(
    selection: &Selection,
    details: &EntryDetails,
    existing: Option<&Record>,
    now: OffsetDateTime,
) -> Record {
    let sugar_percent = details.sugar_percent.min(100);

    let (drink_name, brand, product_id, calories) = match selection {
        Selection::Product(p) => (
            p.name.clone(),
            p.brand.clone(),
            Some(p.id.clone()),
            estimate(p.calories as f64, details.cup_size, sugar_percent as f64),
        ),
        Selection::Custom(name) => (
            name.trim().to_string(),
            CUSTOM_BRAND.to_string(),
            None,
            DEFAULT_CUSTOM_CALORIES,
        ),
    };

    let (id, date) = match existing {
        Some(r) => (r.id, r.date),
        None => (Uuid::now_v7(), now),
    };

    Record {
        id,
        drink_name,
        brand,
        product_id,
        calories,
        cup_size: details.cup_size,
        sugar_level: SugarTier::from_percent(sugar_percent),
        sugar_percent,
        mood: details.mood,
        notes: details.notes.trim().to_string(),
        date,
        timestamp: unix_millis(now),
    }
}

pub fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}
