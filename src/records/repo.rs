use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Record, RecordRow};
use crate::store::{Disconnected, StoreError, StoreResult};

/// One persistence target for drink records. Writes are keyed by record id, so a
/// repeated save of the same id replaces rather than duplicates.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn save(&self, user_id: Uuid, record: &Record) -> StoreResult<Record>;
    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<Record>>;
    async fn get(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Record>>;
    async fn update(&self, id: Uuid, user_id: Uuid, record: &Record) -> StoreResult<Record>;
    /// `Ok(false)` when nothing matched.
    async fn delete(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool>;
}

const RECORD_COLUMNS: &str = "id, user_id, drink_name, brand, product_id, calories, cup_size, \
     sugar_level, sugar_percent, mood, notes, date, timestamp";

#[derive(Clone)]
pub struct PgRecordStore {
    db: PgPool,
}

impl PgRecordStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn save(&self, user_id: Uuid, record: &Record) -> StoreResult<Record> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            r#"
            INSERT INTO drink_records ({RECORD_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                drink_name = EXCLUDED.drink_name,
                brand = EXCLUDED.brand,
                product_id = EXCLUDED.product_id,
                calories = EXCLUDED.calories,
                cup_size = EXCLUDED.cup_size,
                sugar_level = EXCLUDED.sugar_level,
                sugar_percent = EXCLUDED.sugar_percent,
                mood = EXCLUDED.mood,
                notes = EXCLUDED.notes,
                timestamp = EXCLUDED.timestamp
            WHERE drink_records.user_id = EXCLUDED.user_id
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(record.id)
        .bind(user_id)
        .bind(&record.drink_name)
        .bind(&record.brand)
        .bind(&record.product_id)
        .bind(calories_column(record)?)
        .bind(record.cup_size.as_str())
        .bind(record.sugar_level.as_str())
        .bind(i16::from(record.sugar_percent))
        .bind(record.mood.as_str())
        .bind(&record.notes)
        .bind(record.date)
        .bind(record.timestamp)
        .fetch_optional(&self.db)
        .await?;
        // no row back means the id belongs to another user
        row.map(Record::from).ok_or(StoreError::NotFound)
    }

    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<Record>> {
        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM drink_records
            WHERE user_id = $1
            ORDER BY date DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Record::from).collect())
    }

    async fn get(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Record>> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM drink_records
            WHERE id = $1 AND user_id = $2
            "#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Record::from))
    }

    async fn update(&self, id: Uuid, user_id: Uuid, record: &Record) -> StoreResult<Record> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            r#"
            UPDATE drink_records SET
                drink_name = $3, brand = $4, product_id = $5, calories = $6, cup_size = $7,
                sugar_level = $8, sugar_percent = $9, mood = $10, notes = $11, timestamp = $12
            WHERE id = $1 AND user_id = $2
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(&record.drink_name)
        .bind(&record.brand)
        .bind(&record.product_id)
        .bind(calories_column(record)?)
        .bind(record.cup_size.as_str())
        .bind(record.sugar_level.as_str())
        .bind(i16::from(record.sugar_percent))
        .bind(record.mood.as_str())
        .bind(&record.notes)
        .bind(record.timestamp)
        .fetch_optional(&self.db)
        .await?;
        row.map(Record::from).ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM drink_records WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

fn calories_column(record: &Record) -> StoreResult<i32> {
    i32::try_from(record.calories).map_err(|_| StoreError::OutOfRange("calories"))
}

#[async_trait]
impl RecordStore for Disconnected {
    async fn save(&self, _user_id: Uuid, _record: &Record) -> StoreResult<Record> {
        Err(StoreError::NotConnected)
    }
    async fn list(&self, _user_id: Uuid) -> StoreResult<Vec<Record>> {
        Err(StoreError::NotConnected)
    }
    async fn get(&self, _id: Uuid, _user_id: Uuid) -> StoreResult<Option<Record>> {
        Err(StoreError::NotConnected)
    }
    async fn update(&self, _id: Uuid, _user_id: Uuid, _record: &Record) -> StoreResult<Record> {
        Err(StoreError::NotConnected)
    }
    async fn delete(&self, _id: Uuid, _user_id: Uuid) -> StoreResult<bool> {
        Err(StoreError::NotConnected)
    }
}
