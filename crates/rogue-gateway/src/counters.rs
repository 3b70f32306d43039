//! Title-screen counters.
//!
//! [`CounterRegistry`] holds three process-wide counters as atomics. The
//! gateway never mutates them from a request: a background task started by
//! [`spawn_refresh`] recomputes them from the store on a fixed interval and
//! the `/api/game/*` handlers only load them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rogue_db::{DbError, GameStore, StatsStore};
use rogue_types::TitleStats;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Accounts active within this many minutes count as online players.
pub const ACTIVE_PLAYER_WINDOW_MINUTES: i64 = 5;

/// Classic sessions saved within this many minutes count as in progress.
pub const ACTIVE_SESSION_WINDOW_MINUTES: i64 = 15;

/// One consistent read of all three counters from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Recently active accounts.
    pub player_count: u64,
    /// Battles across all accounts.
    pub battle_count: u64,
    /// Classic runs in progress.
    pub classic_session_count: u64,
}

/// Process-wide counters, shared by reference with the refresh task.
#[derive(Debug, Default)]
pub struct CounterRegistry {
    player_count: AtomicU64,
    battle_count: AtomicU64,
    classic_session_count: AtomicU64,
}

impl CounterRegistry {
    /// All counters start at zero until the first refresh.
    pub const fn new() -> Self {
        Self {
            player_count: AtomicU64::new(0),
            battle_count: AtomicU64::new(0),
            classic_session_count: AtomicU64::new(0),
        }
    }

    /// Recently active accounts.
    pub fn player_count(&self) -> u64 {
        self.player_count.load(Ordering::Acquire)
    }

    /// Battles across all accounts.
    pub fn battle_count(&self) -> u64 {
        self.battle_count.load(Ordering::Acquire)
    }

    /// Classic runs in progress.
    pub fn classic_session_count(&self) -> u64 {
        self.classic_session_count.load(Ordering::Acquire)
    }

    /// Counters shown on the title screen.
    pub fn title_stats(&self) -> TitleStats {
        TitleStats {
            player_count: self.player_count(),
            battle_count: self.battle_count(),
        }
    }

    /// Publish a new snapshot. Each counter is stored independently.
    pub fn store_snapshot(&self, snapshot: StatsSnapshot) {
        self.player_count
            .store(snapshot.player_count, Ordering::Release);
        self.battle_count
            .store(snapshot.battle_count, Ordering::Release);
        self.classic_session_count
            .store(snapshot.classic_session_count, Ordering::Release);
    }

    /// Recompute every counter from `store` and publish the result.
    ///
    /// Nothing is published unless all three queries succeed.
    ///
    /// # Errors
    ///
    /// Returns the first store error encountered.
    pub async fn refresh<S>(&self, store: &S) -> Result<StatsSnapshot, DbError>
    where
        S: StatsStore + ?Sized,
    {
        let now = Utc::now();
        let snapshot = StatsSnapshot {
            player_count: store
                .active_player_count(minutes_before(now, ACTIVE_PLAYER_WINDOW_MINUTES))
                .await?,
            battle_count: store.battle_count().await?,
            classic_session_count: store
                .classic_session_count(minutes_before(now, ACTIVE_SESSION_WINDOW_MINUTES))
                .await?,
        };
        self.store_snapshot(snapshot);
        Ok(snapshot)
    }
}

fn minutes_before(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    now.checked_sub_signed(TimeDelta::minutes(minutes))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Spawn the background task that refreshes `counters` every `every`.
///
/// The first refresh runs immediately. A failed refresh is logged and the
/// previous values stay published until the next successful one.
pub fn spawn_refresh(
    counters: Arc<CounterRegistry>,
    store: Arc<dyn GameStore>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match counters.refresh(&*store).await {
                Ok(snapshot) => debug!(
                    players = snapshot.player_count,
                    battles = snapshot.battle_count,
                    classic_sessions = snapshot.classic_session_count,
                    "Refreshed stat counters"
                ),
                Err(e) => warn!(error = %e, "Stat refresh failed, keeping previous counters"),
            }
        }
    })
}
