use serde::{Deserialize, Serialize};

use super::assembler::EntryDetails;
use super::repo_types::{CupSize, Mood, Record, SugarTier};
use super::services::SavedTo;

/// Body for create and edit. `productId` wins over `drinkName` when both are sent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest {
    pub product_id: Option<String>,
    pub drink_name: Option<String>,
    #[serde(default)]
    pub cup_size: CupSize,
    #[serde(default = "default_sugar_percent")]
    pub sugar_percent: u8,
    #[serde(default)]
    pub mood: Mood,
    #[serde(default)]
    pub notes: String,
}

fn default_sugar_percent() -> u8 {
    100
}

impl RecordRequest {
    pub fn details(&self) -> EntryDetails {
        EntryDetails {
            cup_size: self.cup_size,
            sugar_percent: self.sugar_percent,
            mood: self.mood,
            notes: self.notes.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub record: Record,
    pub saved_to: SavedTo,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub product_id: Option<String>,
    #[serde(default)]
    pub cup_size: CupSize,
    #[serde(default = "default_sugar_percent")]
    pub sugar_percent: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub calories: u32,
    pub sugar_level: SugarTier,
    /// No catalog product matched; the fixed custom default was used.
    pub custom: bool,
}
