//! Daily runs: the current seed and the rankings built from daily scores.
//!
//! The seed is owned by the store (one per UTC date, first writer wins) and
//! cached here. [`spawn_rotation`] moves the cache to the new date right
//! after each UTC midnight; [`DailyService::seed`] also catches up on its
//! own if it observes a stale date before the task does.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng as _;
use rogue_db::{DbError, GameStore};
use rogue_types::{AccountId, RankingCategory, RankingEntry};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::GatewayError;

/// Entries per rankings page.
pub const PAGE_SIZE: u64 = 10;

/// Random bytes behind a generated seed.
const SEED_BYTES: usize = 24;

/// Delay before retrying a failed rotation.
const ROTATION_RETRY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CurrentSeed {
    date: NaiveDate,
    seed: String,
}

/// Seed holder and ranking queries.
pub struct DailyService {
    store: Arc<dyn GameStore>,
    current: RwLock<Option<CurrentSeed>>,
}

impl DailyService {
    /// Create a service with no seed cached yet.
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            store,
            current: RwLock::new(None),
        }
    }

    /// The seed for the current UTC date.
    ///
    /// # Errors
    ///
    /// Returns a store error if the seed had to be loaded and that failed.
    pub async fn seed(&self) -> Result<String, DbError> {
        let today = Utc::now().date_naive();
        if let Some(current) = self.current.read().await.as_ref()
            && current.date == today
        {
            return Ok(current.seed.clone());
        }
        self.ensure_seed(today).await
    }

    /// Make sure a seed exists for `date` and cache it.
    ///
    /// An existing stored seed always wins over a freshly generated one, so
    /// concurrent gateways agree on the seed.
    ///
    /// # Errors
    ///
    /// Returns the store error if reading or inserting the seed fails.
    pub async fn ensure_seed(&self, date: NaiveDate) -> Result<String, DbError> {
        let seed = match self.store.daily_seed(date).await? {
            Some(seed) => seed,
            None => {
                let stored = self.store.insert_daily_seed(date, &generate_seed()).await?;
                info!(%date, "Created daily seed");
                stored
            }
        };

        let mut current = self.current.write().await;
        // Never move the cache backwards past a newer date.
        if current.as_ref().is_none_or(|c| c.date <= date) {
            *current = Some(CurrentSeed {
                date,
                seed: seed.clone(),
            });
        }
        Ok(seed)
    }

    /// One page of rankings for `category`. Pages are numbered from 1.
    ///
    /// # Errors
    ///
    /// [`GatewayError::BadRequest`] for a page below 1 or too large to
    /// address; store errors otherwise.
    pub async fn rankings(
        &self,
        uuid: AccountId,
        category: RankingCategory,
        page: i64,
    ) -> Result<Vec<RankingEntry>, GatewayError> {
        let offset = page
            .checked_sub(1)
            .and_then(|index| u64::try_from(index).ok())
            .and_then(|index| index.checked_mul(PAGE_SIZE))
            .ok_or_else(|| GatewayError::bad_request(format!("invalid page: {page}")))?;

        debug!(%uuid, ?category, page, "Fetching rankings");
        let entries = self
            .store
            .rankings(category, Utc::now().date_naive(), offset, PAGE_SIZE)
            .await?;
        Ok(entries)
    }

    /// Number of pages [`rankings`](Self::rankings) can return for
    /// `category`.
    ///
    /// # Errors
    ///
    /// Returns the store error if counting entries fails.
    pub async fn ranking_page_count(&self, category: RankingCategory) -> Result<u64, DbError> {
        let entries = self
            .store
            .ranking_entry_count(category, Utc::now().date_naive())
            .await?;
        Ok(entries.div_ceil(PAGE_SIZE))
    }
}

fn generate_seed() -> String {
    let mut bytes = [0_u8; SEED_BYTES];
    rand::rng().fill(&mut bytes);
    STANDARD.encode(bytes)
}

/// Time from `now` until the next UTC midnight.
fn until_next_midnight(now: DateTime<Utc>) -> Duration {
    now.date_naive()
        .succ_opt()
        .and_then(|tomorrow| tomorrow.and_hms_opt(0, 0, 0))
        .and_then(|midnight| midnight.and_utc().signed_duration_since(now).to_std().ok())
        .unwrap_or(ROTATION_RETRY)
}

/// Spawn the task that rotates the daily seed after each UTC midnight.
pub fn spawn_rotation(daily: Arc<DailyService>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(until_next_midnight(Utc::now())).await;

            let today = Utc::now().date_naive();
            while let Err(e) = daily.ensure_seed(today).await {
                warn!(error = %e, %today, "Daily seed rotation failed, retrying");
                tokio::time::sleep(ROTATION_RETRY).await;
            }
            info!(%today, "Rotated daily seed");
        }
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::TimeZone as _;
    use rogue_db::{AccountStore, DailyStore, MemoryStore, NewAccount};

    use super::*;

    fn service() -> (Arc<MemoryStore>, DailyService) {
        let store = Arc::new(MemoryStore::new());
        let daily = DailyService::new(Arc::clone(&store) as Arc<dyn GameStore>);
        (store, daily)
    }

    async fn add_player(store: &MemoryStore, name: &str) -> AccountId {
        let uuid = AccountId::new();
        store
            .add_account(&NewAccount {
                uuid,
                username: name.to_owned(),
                key: Vec::new(),
                salt: Vec::new(),
            })
            .await
            .unwrap();
        uuid
    }

    #[test]
    fn midnight_is_computed_in_utc() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 23, 59, 30).unwrap();
        assert_eq!(until_next_midnight(now), Duration::from_secs(30));
    }

    #[test]
    fn generated_seeds_differ() {
        assert_ne!(generate_seed(), generate_seed());
    }

    #[tokio::test]
    async fn seed_is_stable_for_a_date() {
        let (_, daily) = service();
        let first = daily.seed().await.unwrap();
        assert!(!first.is_empty());
        assert_eq!(daily.seed().await.unwrap(), first);
    }

    #[tokio::test]
    async fn stored_seed_wins() {
        let (store, daily) = service();
        let today = Utc::now().date_naive();
        store.insert_daily_seed(today, "fixed").await.unwrap();

        assert_eq!(daily.ensure_seed(today).await.unwrap(), "fixed");
        assert_eq!(daily.seed().await.unwrap(), "fixed");
    }

    #[tokio::test]
    async fn page_count_rounds_up() {
        let (store, daily) = service();
        let today = Utc::now().date_naive();
        assert_eq!(
            daily.ranking_page_count(RankingCategory::Daily).await.unwrap(),
            0
        );

        for i in 0..11_u64 {
            let uuid = add_player(&store, &format!("player{i}")).await;
            store.record_daily_run(uuid, today, i, 10).await.unwrap();
        }
        assert_eq!(
            daily.ranking_page_count(RankingCategory::Daily).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn pages_start_at_one() {
        let (store, daily) = service();
        let today = Utc::now().date_naive();
        let uuid = add_player(&store, "foo").await;
        store.record_daily_run(uuid, today, 500, 20).await.unwrap();

        let first = daily
            .rankings(uuid, RankingCategory::Daily, 1)
            .await
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first.first().map(|e| e.rank), Some(1));

        assert!(
            daily
                .rankings(uuid, RankingCategory::Daily, 2)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(matches!(
            daily.rankings(uuid, RankingCategory::Daily, 0).await,
            Err(GatewayError::BadRequest(_))
        ));
    }
}
