//! In-process implementation of every store trait.
//!
//! Backs the gateway's tests and the `memory` store backend for local
//! development. All tables live behind one [`RwLock`], so each trait call
//! is a single critical section and writes to the same (account, slot)
//! are serialized.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use rogue_types::{
    AccountId, DataType, GameMode, GameStats, RankingCategory, RankingEntry, SaveEnvelope,
    SessionSaveData, SystemSaveData,
};
use tokio::sync::RwLock;

use crate::error::DbError;
use crate::store::{
    AccountCredentials, AccountStore, DailyStore, NewAccount, SESSION_TTL_DAYS, SaveDataStore,
    StatsStore, check_slot, ranking_window_start,
};

#[derive(Debug, Clone)]
struct AccountRow {
    username: String,
    key: Vec<u8>,
    salt: Vec<u8>,
    last_activity: Option<DateTime<Utc>>,
    stats: Option<(u64, u64)>,
}

#[derive(Debug, Clone)]
struct SessionRow {
    data: SessionSaveData,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct DailyRunRow {
    score: u64,
    wave: u32,
    recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    accounts: BTreeMap<AccountId, AccountRow>,
    usernames: BTreeMap<String, AccountId>,
    sessions: BTreeMap<Vec<u8>, (AccountId, DateTime<Utc>)>,
    system_saves: BTreeMap<AccountId, SystemSaveData>,
    session_saves: BTreeMap<(AccountId, i32), SessionRow>,
    daily_seeds: BTreeMap<NaiveDate, String>,
    daily_runs: BTreeMap<(AccountId, NaiveDate), DailyRunRow>,
}

impl Tables {
    fn live_session(&self, token: &[u8]) -> Result<AccountId, DbError> {
        match self.sessions.get(token) {
            Some((uuid, expires_at)) if *expires_at > Utc::now() => Ok(*uuid),
            _ => Err(DbError::NotFound(String::from("session"))),
        }
    }

    fn account_mut(&mut self, uuid: AccountId) -> Result<&mut AccountRow, DbError> {
        self.accounts
            .get_mut(&uuid)
            .ok_or_else(|| DbError::NotFound(format!("account {uuid}")))
    }
}

/// Store holding everything in memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn add_account(&self, account: &NewAccount) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        if tables.usernames.contains_key(&account.username) {
            return Err(DbError::Conflict(String::from("username already exists")));
        }
        tables
            .usernames
            .insert(account.username.clone(), account.uuid);
        tables.accounts.insert(
            account.uuid,
            AccountRow {
                username: account.username.clone(),
                key: account.key.clone(),
                salt: account.salt.clone(),
                last_activity: None,
                stats: None,
            },
        );
        Ok(())
    }

    async fn fetch_credentials(&self, username: &str) -> Result<AccountCredentials, DbError> {
        let tables = self.tables.read().await;
        tables
            .usernames
            .get(username)
            .and_then(|uuid| tables.accounts.get(uuid).map(|row| (*uuid, row)))
            .map(|(uuid, row)| AccountCredentials {
                uuid,
                key: row.key.clone(),
                salt: row.salt.clone(),
            })
            .ok_or_else(|| DbError::NotFound(format!("account {username}")))
    }

    async fn add_session(&self, uuid: AccountId, token: &[u8]) -> Result<(), DbError> {
        let expires_at = Utc::now()
            .checked_add_signed(TimeDelta::days(SESSION_TTL_DAYS))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut tables = self.tables.write().await;
        if tables.sessions.contains_key(token) {
            return Err(DbError::Conflict(String::from("session already exists")));
        }
        tables.sessions.insert(token.to_vec(), (uuid, expires_at));
        Ok(())
    }

    async fn remove_session(&self, token: &[u8]) -> Result<(), DbError> {
        self.tables
            .write()
            .await
            .sessions
            .remove(token)
            .map(|_| ())
            .ok_or_else(|| DbError::NotFound(String::from("session")))
    }

    async fn fetch_username_from_token(&self, token: &[u8]) -> Result<String, DbError> {
        let tables = self.tables.read().await;
        let uuid = tables.live_session(token)?;
        tables
            .accounts
            .get(&uuid)
            .map(|row| row.username.clone())
            .ok_or_else(|| DbError::NotFound(format!("account {uuid}")))
    }

    async fn fetch_uuid_from_token(&self, token: &[u8]) -> Result<AccountId, DbError> {
        self.tables.read().await.live_session(token)
    }

    async fn touch_last_login(&self, uuid: AccountId) -> Result<(), DbError> {
        // Login time itself is not tracked in memory; it only matters for activity.
        self.touch_activity(uuid).await
    }

    async fn touch_activity(&self, uuid: AccountId) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        tables.account_mut(uuid)?.last_activity = Some(Utc::now());
        Ok(())
    }

    async fn update_account_stats(
        &self,
        uuid: AccountId,
        stats: &GameStats,
    ) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        tables.account_mut(uuid)?.stats = Some((stats.battles, stats.classic_sessions_played));
        Ok(())
    }
}

#[async_trait]
impl SaveDataStore for MemoryStore {
    async fn read_save(
        &self,
        uuid: AccountId,
        data_type: DataType,
        slot: i32,
    ) -> Result<SaveEnvelope, DbError> {
        check_slot(data_type, slot)?;
        let tables = self.tables.read().await;
        let envelope = match data_type {
            DataType::System => tables
                .system_saves
                .get(&uuid)
                .cloned()
                .map(SaveEnvelope::System),
            DataType::Session => tables
                .session_saves
                .get(&(uuid, slot))
                .map(|row| SaveEnvelope::Session(row.data.clone())),
        };
        envelope.ok_or_else(|| DbError::NotFound(format!("save data for slot {slot}")))
    }

    async fn store_save(
        &self,
        uuid: AccountId,
        slot: i32,
        save: &SaveEnvelope,
    ) -> Result<(), DbError> {
        check_slot(save.data_type(), slot)?;
        let mut tables = self.tables.write().await;
        if !tables.accounts.contains_key(&uuid) {
            return Err(DbError::NotFound(format!("account {uuid}")));
        }
        match save {
            SaveEnvelope::System(data) => {
                tables.system_saves.insert(uuid, data.clone());
            }
            SaveEnvelope::Session(data) => {
                tables.session_saves.insert(
                    (uuid, slot),
                    SessionRow {
                        data: data.clone(),
                        updated_at: Utc::now(),
                    },
                );
            }
        }
        Ok(())
    }

    async fn delete_save(
        &self,
        uuid: AccountId,
        data_type: DataType,
        slot: i32,
    ) -> Result<(), DbError> {
        check_slot(data_type, slot)?;
        let mut tables = self.tables.write().await;
        match data_type {
            DataType::System => {
                tables.system_saves.remove(&uuid);
            }
            DataType::Session => {
                tables.session_saves.remove(&(uuid, slot));
            }
        }
        Ok(())
    }

    async fn latest_session_slot(&self, uuid: AccountId) -> Result<Option<i32>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables
            .session_saves
            .iter()
            .filter(|((owner, _), _)| *owner == uuid)
            .max_by_key(|(_, row)| row.updated_at)
            .map(|((_, slot), _)| *slot))
    }
}

/// A ranking row before ranks are assigned.
struct Unranked {
    username: String,
    score: u64,
    wave: u32,
    recorded_at: DateTime<Utc>,
}

/// Assign competition ranks: ordered by score, ties share a rank and are
/// ordered by who got there first.
fn rank_rows(mut rows: Vec<Unranked>) -> Vec<RankingEntry> {
    rows.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.recorded_at.cmp(&b.recorded_at))
    });

    let mut entries = Vec::with_capacity(rows.len());
    let mut rank = 0;
    let mut previous = None;
    for (position, row) in (1_u64..).zip(rows) {
        if previous != Some(row.score) {
            rank = position;
            previous = Some(row.score);
        }
        entries.push(RankingEntry {
            rank,
            username: row.username,
            score: row.score,
            wave: row.wave,
        });
    }
    entries
}

impl Tables {
    fn ranking_rows(&self, category: RankingCategory, today: NaiveDate) -> Vec<Unranked> {
        let start = ranking_window_start(category, today);
        let in_window = self.daily_runs.iter().filter(|((_, date), _)| match category {
            RankingCategory::Daily => *date == start,
            RankingCategory::Weekly => *date >= start,
        });

        let mut per_account: BTreeMap<AccountId, Unranked> = BTreeMap::new();
        for ((uuid, _), run) in in_window {
            let Some(account) = self.accounts.get(uuid) else {
                continue;
            };
            per_account
                .entry(*uuid)
                .and_modify(|row| {
                    row.score = row.score.saturating_add(run.score);
                    row.wave = row.wave.max(run.wave);
                    row.recorded_at = row.recorded_at.min(run.recorded_at);
                })
                .or_insert_with(|| Unranked {
                    username: account.username.clone(),
                    score: run.score,
                    wave: run.wave,
                    recorded_at: run.recorded_at,
                });
        }
        per_account.into_values().collect()
    }
}

#[async_trait]
impl DailyStore for MemoryStore {
    async fn daily_seed(&self, date: NaiveDate) -> Result<Option<String>, DbError> {
        Ok(self.tables.read().await.daily_seeds.get(&date).cloned())
    }

    async fn insert_daily_seed(&self, date: NaiveDate, seed: &str) -> Result<String, DbError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .daily_seeds
            .entry(date)
            .or_insert_with(|| seed.to_owned())
            .clone())
    }

    async fn record_daily_run(
        &self,
        uuid: AccountId,
        date: NaiveDate,
        score: u64,
        wave: u32,
    ) -> Result<(), DbError> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        tables
            .daily_runs
            .entry((uuid, date))
            .and_modify(|run| {
                if score > run.score {
                    run.recorded_at = now;
                }
                run.score = run.score.max(score);
                run.wave = run.wave.max(wave);
            })
            .or_insert(DailyRunRow {
                score,
                wave,
                recorded_at: now,
            });
        Ok(())
    }

    async fn rankings(
        &self,
        category: RankingCategory,
        today: NaiveDate,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<RankingEntry>, DbError> {
        let rows = self.tables.read().await.ranking_rows(category, today);
        Ok(rank_rows(rows)
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn ranking_entry_count(
        &self,
        category: RankingCategory,
        today: NaiveDate,
    ) -> Result<u64, DbError> {
        let rows = self.tables.read().await.ranking_rows(category, today);
        Ok(u64::try_from(rows.len()).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl StatsStore for MemoryStore {
    async fn active_player_count(&self, since: DateTime<Utc>) -> Result<u64, DbError> {
        let tables = self.tables.read().await;
        let count = tables
            .accounts
            .values()
            .filter(|row| row.last_activity.is_some_and(|at| at > since))
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn battle_count(&self) -> Result<u64, DbError> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .filter_map(|row| row.stats.map(|(battles, _)| battles))
            .fold(0_u64, u64::saturating_add))
    }

    async fn classic_session_count(&self, since: DateTime<Utc>) -> Result<u64, DbError> {
        let tables = self.tables.read().await;
        let count = tables
            .session_saves
            .values()
            .filter(|row| row.data.game_mode == GameMode::Classic && row.updated_at > since)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use super::*;

    fn session(mode: GameMode, wave: u32) -> SessionSaveData {
        serde_json::from_value(serde_json::json!({
            "seed": "seed",
            "gameMode": mode.code(),
            "waveIndex": wave,
        }))
        .unwrap()
    }

    async fn store_with_account(name: &str) -> (MemoryStore, AccountId) {
        let store = MemoryStore::new();
        let uuid = AccountId::new();
        store
            .add_account(&NewAccount {
                uuid,
                username: name.to_owned(),
                key: vec![1; 32],
                salt: vec![2; 16],
            })
            .await
            .unwrap();
        (store, uuid)
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let (store, _) = store_with_account("foo").await;
        let err = store
            .add_account(&NewAccount {
                uuid: AccountId::new(),
                username: String::from("foo"),
                key: Vec::new(),
                salt: Vec::new(),
            })
            .await;
        assert!(matches!(err, Err(DbError::Conflict(_))));
    }

    #[tokio::test]
    async fn session_tokens_resolve_both_identity_shapes() {
        let (store, uuid) = store_with_account("foo").await;
        let token = [7_u8; 32];
        store.add_session(uuid, &token).await.unwrap();

        assert_eq!(store.fetch_uuid_from_token(&token).await.unwrap(), uuid);
        assert_eq!(store.fetch_username_from_token(&token).await.unwrap(), "foo");

        store.remove_session(&token).await.unwrap();
        assert!(matches!(
            store.fetch_uuid_from_token(&token).await,
            Err(DbError::NotFound(_))
        ));
        assert!(store.remove_session(&token).await.is_err());
    }

    #[tokio::test]
    async fn session_saves_are_per_slot() {
        let (store, uuid) = store_with_account("foo").await;
        let save = SaveEnvelope::Session(session(GameMode::Classic, 12));
        store.store_save(uuid, 2, &save).await.unwrap();

        assert_eq!(store.read_save(uuid, DataType::Session, 2).await.unwrap(), save);
        assert!(store.read_save(uuid, DataType::Session, 1).await.is_err());
        assert_eq!(store.latest_session_slot(uuid).await.unwrap(), Some(2));

        store.delete_save(uuid, DataType::Session, 2).await.unwrap();
        assert!(store.read_save(uuid, DataType::Session, 2).await.is_err());
        assert_eq!(store.latest_session_slot(uuid).await.unwrap(), None);
    }

    #[tokio::test]
    async fn out_of_range_slots_are_rejected() {
        let (store, uuid) = store_with_account("foo").await;
        let save = SaveEnvelope::Session(session(GameMode::Classic, 1));
        assert!(matches!(
            store.store_save(uuid, 9, &save).await,
            Err(DbError::InvalidSlot { slot: 9, .. })
        ));
        assert!(matches!(
            store.read_save(uuid, DataType::System, 1).await,
            Err(DbError::InvalidSlot { slot: 1, .. })
        ));
    }

    #[tokio::test]
    async fn saves_for_unknown_accounts_are_rejected() {
        let store = MemoryStore::new();
        let save = SaveEnvelope::Session(session(GameMode::Classic, 1));
        assert!(matches!(
            store.store_save(AccountId::new(), 0, &save).await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn first_daily_seed_wins() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(store.insert_daily_seed(date, "a").await.unwrap(), "a");
        assert_eq!(store.insert_daily_seed(date, "b").await.unwrap(), "a");
        assert_eq!(store.daily_seed(date).await.unwrap().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn daily_rankings_keep_best_score_and_share_tied_ranks() {
        let store = MemoryStore::new();
        let today = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
        let mut ids = Vec::new();
        for name in ["ann", "bob", "cat"] {
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
            ids.push(uuid);
        }

        store.record_daily_run(ids[0], today, 500, 20).await.unwrap();
        store.record_daily_run(ids[0], today, 100, 30).await.unwrap();
        store.record_daily_run(ids[1], today, 800, 40).await.unwrap();
        store.record_daily_run(ids[2], today, 500, 10).await.unwrap();

        let page = store
            .rankings(RankingCategory::Daily, today, 0, 10)
            .await
            .unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].username, "bob");
        assert_eq!(page[0].rank, 1);
        assert_eq!(page[1].rank, 2);
        assert_eq!(page[2].rank, 2);
        assert_eq!(page[1].username, "ann");
        assert_eq!(page[1].score, 500);
        assert_eq!(page[1].wave, 30);

        let second = store
            .rankings(RankingCategory::Daily, today, 2, 10)
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(
            store
                .ranking_entry_count(RankingCategory::Daily, today)
                .await
                .unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn weekly_rankings_sum_scores_since_sunday() {
        let (store, uuid) = store_with_account("ann").await;
        let wednesday = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let last_saturday = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();

        store.record_daily_run(uuid, wednesday, 100, 5).await.unwrap();
        store.record_daily_run(uuid, monday, 50, 9).await.unwrap();
        store.record_daily_run(uuid, last_saturday, 1000, 50).await.unwrap();

        let page = store
            .rankings(RankingCategory::Weekly, wednesday, 0, 10)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].score, 150);
        assert_eq!(page[0].wave, 9);
    }

    #[tokio::test]
    async fn stats_count_recent_activity() {
        let (store, uuid) = store_with_account("foo").await;
        let an_hour_ago = Utc::now()
            .checked_sub_signed(TimeDelta::hours(1))
            .unwrap();

        assert_eq!(store.active_player_count(an_hour_ago).await.unwrap(), 0);
        store.touch_activity(uuid).await.unwrap();
        assert_eq!(store.active_player_count(an_hour_ago).await.unwrap(), 1);

        let stats = GameStats {
            battles: 42,
            ..GameStats::default()
        };
        store.update_account_stats(uuid, &stats).await.unwrap();
        assert_eq!(store.battle_count().await.unwrap(), 42);

        store
            .store_save(uuid, 0, &SaveEnvelope::Session(session(GameMode::Classic, 3)))
            .await
            .unwrap();
        store
            .store_save(uuid, 1, &SaveEnvelope::Session(session(GameMode::Endless, 3)))
            .await
            .unwrap();
        assert_eq!(store.classic_session_count(an_hour_ago).await.unwrap(), 1);
    }
}
