use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::repo::{BudgetStore, LocalBudget, LocalBudgetStore};
use crate::records::repo_types::Record;
use crate::records::services::BothStoresFailed;
use crate::store::with_timeout;

/// Share of the budget at which the status turns from `under` to `near`.
const NEAR_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Under,
    Near,
    Over,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub weekly_budget: u32,
    pub consumed: u64,
    pub remaining: i64,
    pub record_count: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub week_start: OffsetDateTime,
    pub status: BudgetStatus,
    pub message: String,
}

pub struct BudgetService {
    remote: Arc<dyn BudgetStore>,
    local: LocalBudgetStore,
    default_budget: u32,
    timeout: Duration,
}

impl BudgetService {
    pub fn new(
        remote: Arc<dyn BudgetStore>,
        local: LocalBudgetStore,
        default_budget: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            remote,
            local,
            default_budget,
            timeout,
        }
    }

    /// A value set while the remote was unreachable wins until it has been pushed.
    pub async fn get(&self, user_id: Uuid) -> u32 {
        let local = self.local.get(user_id).await;
        if let Some(pending) = local.filter(|b| !b.synced) {
            self.push_pending(user_id, pending).await;
            return pending.weekly_budget;
        }
        let stored = match with_timeout(self.timeout, self.remote.get(user_id)).await {
            Ok(Some(v)) => Some(v),
            Ok(None) => local.map(|b| b.weekly_budget),
            Err(e) => {
                warn!(error = %e, %user_id, "remote budget read failed; reading local storage");
                local.map(|b| b.weekly_budget)
            }
        };
        stored.unwrap_or(self.default_budget)
    }

    pub async fn set(&self, user_id: Uuid, weekly_budget: u32) -> Result<(), BothStoresFailed> {
        let remote = with_timeout(self.timeout, self.remote.set(user_id, weekly_budget)).await;
        let synced = remote.is_ok();
        let local = self
            .local
            .set(user_id, LocalBudget { weekly_budget, synced })
            .await;
        match (remote, local) {
            (Err(remote), Err(local)) => Err(BothStoresFailed { remote, local }),
            (remote, local) => {
                if let Err(e) = remote {
                    warn!(error = %e, %user_id, "remote budget write failed; kept locally");
                }
                if let Err(e) = local {
                    warn!(error = %e, %user_id, "local budget mirror write failed");
                }
                info!(%user_id, weekly_budget, synced, "weekly budget updated");
                Ok(())
            }
        }
    }

    async fn push_pending(&self, user_id: Uuid, pending: LocalBudget) {
        match with_timeout(self.timeout, self.remote.set(user_id, pending.weekly_budget)).await {
            Ok(()) => {
                let synced = LocalBudget {
                    synced: true,
                    ..pending
                };
                if let Err(e) = self.local.set(user_id, synced).await {
                    warn!(error = %e, %user_id, "marking budget synced failed");
                }
                info!(%user_id, weekly_budget = pending.weekly_budget, "offline budget pushed to remote");
            }
            Err(e) => debug!(error = %e, %user_id, "remote still unavailable; budget stays pending"),
        }
    }
}

/// Monday 00:00 UTC of the week containing `now`.
pub fn week_start(now: OffsetDateTime) -> OffsetDateTime {
    let now = now.to_offset(time::UtcOffset::UTC);
    let back = now.weekday().number_days_from_monday() as i64;
    (now.date() - TimeDuration::days(back)).midnight().assume_utc()
}

pub fn weekly_summary(weekly_budget: u32, records: &[Record], now: OffsetDateTime) -> WeeklySummary {
    let start = week_start(now);
    let end = start + TimeDuration::weeks(1);
    let this_week: Vec<&Record> = records
        .iter()
        .filter(|r| r.date >= start && r.date < end)
        .collect();
    let consumed: u64 = this_week.iter().map(|r| u64::from(r.calories)).sum();
    let remaining = i64::from(weekly_budget).saturating_sub(i64::try_from(consumed).unwrap_or(i64::MAX));
    let status = status_for(weekly_budget, consumed);
    let message = match status {
        BudgetStatus::Under => format!("{remaining} kcal left this week"),
        BudgetStatus::Near => format!("Close to your weekly budget: {remaining} kcal left"),
        BudgetStatus::Over => format!("Over your weekly budget by {} kcal", -remaining),
    };
    WeeklySummary {
        weekly_budget,
        consumed,
        remaining,
        record_count: this_week.len(),
        week_start: start,
        status,
        message,
    }
}

fn status_for(budget: u32, consumed: u64) -> BudgetStatus {
    if consumed > u64::from(budget) {
        BudgetStatus::Over
    } else if budget > 0 && consumed as f64 >= budget as f64 * NEAR_THRESHOLD {
        BudgetStatus::Near
    } else {
        BudgetStatus::Under
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::records::repo_types::{CupSize, Mood, SugarTier};
    use crate::store::{Disconnected, LocalStore};

    fn record(calories: u32, date: OffsetDateTime) -> Record {
        Record {
            id: Uuid::now_v7(),
            drink_name: "x".into(),
            brand: "custom".into(),
            product_id: None,
            calories,
            cup_size: CupSize::Medium,
            sugar_level: SugarTier::Half,
            sugar_percent: 50,
            mood: Mood::Happy,
            notes: String::new(),
            date,
            timestamp: 0,
        }
    }

    #[test]
    fn week_starts_on_monday_midnight() {
        // 2026-10-18 is a Sunday
        assert_eq!(week_start(datetime!(2026-10-18 23:59 UTC)), datetime!(2026-10-12 0:00 UTC));
        assert_eq!(week_start(datetime!(2026-10-12 0:00 UTC)), datetime!(2026-10-12 0:00 UTC));
    }

    #[test]
    fn only_current_week_counts() {
        let now = datetime!(2026-10-15 12:00 UTC);
        let records = vec![
            record(300, datetime!(2026-10-12 8:00 UTC)),
            record(250, datetime!(2026-10-15 9:00 UTC)),
            record(999, datetime!(2026-10-11 23:59 UTC)),
            record(999, datetime!(2026-10-19 0:00 UTC)),
        ];
        let s = weekly_summary(2000, &records, now);
        assert_eq!(s.consumed, 550);
        assert_eq!(s.remaining, 1450);
        assert_eq!(s.record_count, 2);
        assert_eq!(s.status, BudgetStatus::Under);
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(status_for(1000, 799), BudgetStatus::Under);
        assert_eq!(status_for(1000, 800), BudgetStatus::Near);
        assert_eq!(status_for(1000, 1000), BudgetStatus::Near);
        assert_eq!(status_for(1000, 1001), BudgetStatus::Over);
        assert_eq!(status_for(0, 0), BudgetStatus::Under);
    }

    #[test]
    fn over_budget_message_reports_excess() {
        let now = datetime!(2026-10-15 12:00 UTC);
        let s = weekly_summary(500, &[record(650, now)], now);
        assert_eq!(s.status, BudgetStatus::Over);
        assert_eq!(s.remaining, -150);
        assert!(s.message.contains("150"));
    }

    #[tokio::test]
    async fn budget_falls_back_to_local_then_default() {
        let dir = tempfile::tempdir().unwrap();
        let svc = BudgetService::new(
            Arc::new(Disconnected),
            LocalBudgetStore::new(LocalStore::new(dir.path())),
            3500,
            Duration::from_secs(1),
        );
        let user = Uuid::new_v4();
        assert_eq!(svc.get(user).await, 3500);
        svc.set(user, 2800).await.unwrap();
        assert_eq!(svc.get(user).await, 2800);
    }

    /// In-memory remote budget that can be switched off between calls.
    #[derive(Default)]
    struct FlakyBudgets {
        down: std::sync::Mutex<bool>,
        value: std::sync::Mutex<Option<u32>>,
    }

    impl FlakyBudgets {
        fn set_down(&self, down: bool) {
            *self.down.lock().unwrap() = down;
        }
        fn stored(&self) -> Option<u32> {
            *self.value.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl BudgetStore for FlakyBudgets {
        async fn get(&self, _user_id: Uuid) -> crate::store::StoreResult<Option<u32>> {
            if *self.down.lock().unwrap() {
                return Err(crate::store::StoreError::NotConnected);
            }
            Ok(self.stored())
        }
        async fn set(&self, _user_id: Uuid, weekly_budget: u32) -> crate::store::StoreResult<()> {
            if *self.down.lock().unwrap() {
                return Err(crate::store::StoreError::NotConnected);
            }
            *self.value.lock().unwrap() = Some(weekly_budget);
            Ok(())
        }
    }

    #[tokio::test]
    async fn offline_budget_change_survives_remote_recovery() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(FlakyBudgets::default());
        let svc = BudgetService::new(
            remote.clone(),
            LocalBudgetStore::new(LocalStore::new(dir.path())),
            3500,
            Duration::from_secs(1),
        );
        let user = Uuid::new_v4();

        svc.set(user, 2000).await.unwrap();
        remote.set_down(true);
        svc.set(user, 1500).await.unwrap();
        assert_eq!(svc.get(user).await, 1500);

        remote.set_down(false);
        assert_eq!(svc.get(user).await, 1500);
        assert_eq!(remote.stored(), Some(1500));

        // once pushed, a later remote value is authoritative again
        remote.set(user, 1800).await.unwrap();
        assert_eq!(svc.get(user).await, 1800);
    }

    #[test]
    fn large_totals_do_not_wrap() {
        let now = datetime!(2026-10-15 12:00 UTC);
        let records = vec![record(u32::MAX, now), record(u32::MAX, now)];
        let s = weekly_summary(1000, &records, now);
        assert_eq!(s.consumed, 2 * u64::from(u32::MAX));
        assert_eq!(s.status, BudgetStatus::Over);
        assert!(s.remaining < 0);
    }
}
