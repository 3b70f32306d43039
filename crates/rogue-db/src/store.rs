//! Store traits the gateway talks to.
//!
//! Each trait covers one collaborator concern. [`GameStore`] bundles them
//! so the gateway can hold a single `Arc<dyn GameStore>`; both
//! [`PostgresPool`](crate::PostgresPool) and
//! [`MemoryStore`](crate::MemoryStore) implement all four.
//!
//! Implementations must serialize mutations per (account, slot): every
//! write here is a single upsert or delete, never a read-modify-write
//! split across calls.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use rogue_types::{
    AccountId, DataType, GameStats, RankingCategory, RankingEntry, SESSION_SLOT_COUNT,
    SaveEnvelope,
};

use crate::error::DbError;

/// How long a login session stays valid.
pub const SESSION_TTL_DAYS: i64 = 7;

/// A new account as written at registration.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Account key.
    pub uuid: AccountId,
    /// Unique username.
    pub username: String,
    /// Derived password key.
    pub key: Vec<u8>,
    /// Salt used to derive `key`.
    pub salt: Vec<u8>,
}

/// Stored credentials for a username.
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    /// Account key.
    pub uuid: AccountId,
    /// Derived password key.
    pub key: Vec<u8>,
    /// Salt used to derive `key`.
    pub salt: Vec<u8>,
}

/// Accounts, login sessions, and per-account bookkeeping.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. A taken username yields [`DbError::Conflict`].
    async fn add_account(&self, account: &NewAccount) -> Result<(), DbError>;

    /// Look up the credentials stored for `username`.
    async fn fetch_credentials(&self, username: &str) -> Result<AccountCredentials, DbError>;

    /// Store a session token for `uuid`, valid for [`SESSION_TTL_DAYS`].
    async fn add_session(&self, uuid: AccountId, token: &[u8]) -> Result<(), DbError>;

    /// Remove the session for `token`. Removing an unknown token is an error.
    async fn remove_session(&self, token: &[u8]) -> Result<(), DbError>;

    /// Resolve an unexpired session token to its account's username.
    async fn fetch_username_from_token(&self, token: &[u8]) -> Result<String, DbError>;

    /// Resolve an unexpired session token to its account key.
    async fn fetch_uuid_from_token(&self, token: &[u8]) -> Result<AccountId, DbError>;

    /// Record a successful login (also counts as activity).
    async fn touch_last_login(&self, uuid: AccountId) -> Result<(), DbError>;

    /// Record activity for the active-player count.
    async fn touch_activity(&self, uuid: AccountId) -> Result<(), DbError>;

    /// Replace the account's lifetime statistics.
    async fn update_account_stats(&self, uuid: AccountId, stats: &GameStats)
    -> Result<(), DbError>;
}

/// Save-data persistence. Slot ranges are validated here.
#[async_trait]
pub trait SaveDataStore: Send + Sync {
    /// Read the save of kind `data_type` at `slot`.
    async fn read_save(
        &self,
        uuid: AccountId,
        data_type: DataType,
        slot: i32,
    ) -> Result<SaveEnvelope, DbError>;

    /// Write `save` at `slot`, replacing whatever was there.
    async fn store_save(&self, uuid: AccountId, slot: i32, save: &SaveEnvelope)
    -> Result<(), DbError>;

    /// Delete the save of kind `data_type` at `slot`. Deleting an empty
    /// slot succeeds.
    async fn delete_save(&self, uuid: AccountId, data_type: DataType, slot: i32)
    -> Result<(), DbError>;

    /// Slot of the most recently written session save, if any.
    async fn latest_session_slot(&self, uuid: AccountId) -> Result<Option<i32>, DbError>;
}

/// Daily seeds and daily-run scores.
#[async_trait]
pub trait DailyStore: Send + Sync {
    /// The seed stored for `date`, if one exists.
    async fn daily_seed(&self, date: NaiveDate) -> Result<Option<String>, DbError>;

    /// Store `seed` for `date` unless one already exists. Returns the seed
    /// that is stored afterwards (the existing one wins).
    async fn insert_daily_seed(&self, date: NaiveDate, seed: &str) -> Result<String, DbError>;

    /// Record a daily-run result, keeping the best score and wave per
    /// account per date.
    async fn record_daily_run(
        &self,
        uuid: AccountId,
        date: NaiveDate,
        score: u64,
        wave: u32,
    ) -> Result<(), DbError>;

    /// One page of rankings for `category` as of `today`.
    async fn rankings(
        &self,
        category: RankingCategory,
        today: NaiveDate,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<RankingEntry>, DbError>;

    /// Number of ranked accounts for `category` as of `today`.
    async fn ranking_entry_count(
        &self,
        category: RankingCategory,
        today: NaiveDate,
    ) -> Result<u64, DbError>;
}

/// Aggregates behind the title-screen counters.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Accounts with activity after `since`.
    async fn active_player_count(&self, since: DateTime<Utc>) -> Result<u64, DbError>;

    /// Battles summed across all account statistics.
    async fn battle_count(&self) -> Result<u64, DbError>;

    /// Classic-mode session saves written after `since`.
    async fn classic_session_count(&self, since: DateTime<Utc>) -> Result<u64, DbError>;
}

/// Everything the gateway needs from persistence.
pub trait GameStore: AccountStore + SaveDataStore + DailyStore + StatsStore {}

impl<T> GameStore for T where T: AccountStore + SaveDataStore + DailyStore + StatsStore {}

/// Check that `slot` is valid for saves of kind `data_type`.
///
/// System data lives only at slot 0; session data at
/// `0..SESSION_SLOT_COUNT`.
pub fn check_slot(data_type: DataType, slot: i32) -> Result<(), DbError> {
    let valid = match data_type {
        DataType::System => slot == 0,
        DataType::Session => (0..SESSION_SLOT_COUNT).contains(&slot),
    };
    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidSlot {
            slot,
            kind: match data_type {
                DataType::System => "system",
                DataType::Session => "session",
            },
        })
    }
}

/// First date counted by a ranking `category` as of `today`.
///
/// Weekly rankings start on the most recent Sunday.
pub fn ranking_window_start(category: RankingCategory, today: NaiveDate) -> NaiveDate {
    match category {
        RankingCategory::Daily => today,
        RankingCategory::Weekly => {
            let back = u64::from(today.weekday().num_days_from_sunday());
            today.checked_sub_days(Days::new(back)).unwrap_or(today)
        }
    }
}
