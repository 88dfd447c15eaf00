use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{Disconnected, LocalStore, StoreError, StoreResult};

/// A single weekly calorie threshold per user.
#[async_trait]
pub trait BudgetStore: Send + Sync {
    async fn get(&self, user_id: Uuid) -> StoreResult<Option<u32>>;
    async fn set(&self, user_id: Uuid, weekly_budget: u32) -> StoreResult<()>;
}

#[derive(Clone)]
pub struct PgBudgetStore {
    db: PgPool,
}

impl PgBudgetStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BudgetStore for PgBudgetStore {
    async fn get(&self, user_id: Uuid) -> StoreResult<Option<u32>> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT weekly_budget FROM calorie_budgets WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;
        Ok(row.map(|(v,)| v.max(0) as u32))
    }

    async fn set(&self, user_id: Uuid, weekly_budget: u32) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO calorie_budgets (user_id, weekly_budget, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id) DO UPDATE
               SET weekly_budget = EXCLUDED.weekly_budget, updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(i32::try_from(weekly_budget).map_err(|_| StoreError::OutOfRange("weekly budget"))?)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

/// The budget as last set on this host.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LocalBudget {
    pub weekly_budget: u32,
    /// False while the value has not reached the remote store.
    pub synced: bool,
}

pub struct LocalBudgetStore {
    files: LocalStore,
}

impl LocalBudgetStore {
    pub fn new(files: LocalStore) -> Self {
        Self { files }
    }

    fn key(user_id: Uuid) -> String {
        format!("budget-{user_id}")
    }

    pub async fn get(&self, user_id: Uuid) -> Option<LocalBudget> {
        self.files.load(&Self::key(user_id)).await
    }

    pub async fn set(&self, user_id: Uuid, budget: LocalBudget) -> StoreResult<()> {
        self.files.save(&Self::key(user_id), &Some(budget)).await
    }
}

#[async_trait]
impl BudgetStore for Disconnected {
    async fn get(&self, _user_id: Uuid) -> StoreResult<Option<u32>> {
        Err(StoreError::NotConnected)
    }
    async fn set(&self, _user_id: Uuid, _weekly_budget: u32) -> StoreResult<()> {
        Err(StoreError::NotConnected)
    }
}
