//! [`StatsStore`] on `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rogue_types::GameMode;

use crate::error::DbError;
use crate::postgres::{PostgresPool, from_bigint};
use crate::store::StatsStore;

#[async_trait]
impl StatsStore for PostgresPool {
    async fn active_player_count(&self, since: DateTime<Utc>) -> Result<u64, DbError> {
        let count =
            sqlx::query_scalar::<_, i64>(r"SELECT COUNT(*) FROM accounts WHERE last_activity > $1")
                .bind(since)
                .fetch_one(self.pool())
                .await?;
        Ok(from_bigint(count))
    }

    async fn battle_count(&self) -> Result<u64, DbError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"SELECT COALESCE(SUM(battles), 0)::BIGINT FROM account_stats",
        )
        .fetch_one(self.pool())
        .await?;
        Ok(from_bigint(count))
    }

    async fn classic_session_count(&self, since: DateTime<Utc>) -> Result<u64, DbError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM session_saves WHERE game_mode = $1 AND updated_at > $2",
        )
        .bind(GameMode::Classic.code())
        .bind(since)
        .fetch_one(self.pool())
        .await?;
        Ok(from_bigint(count))
    }
}
