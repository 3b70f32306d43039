//! [`DailyStore`] on `PostgreSQL`.
//!
//! Tables: `daily_seeds`, `account_daily_runs`. Rankings use `RANK()`
//! over score so tied scores share a rank.

use async_trait::async_trait;
use chrono::NaiveDate;
use rogue_types::{AccountId, RankingCategory, RankingEntry};

use crate::error::DbError;
use crate::postgres::{PostgresPool, from_bigint, to_bigint};
use crate::store::{DailyStore, ranking_window_start};

/// One ranking row as returned by the window query.
#[derive(Debug, sqlx::FromRow)]
struct RankingRow {
    rank: i64,
    username: String,
    score: i64,
    wave: i32,
}

impl From<RankingRow> for RankingEntry {
    fn from(row: RankingRow) -> Self {
        Self {
            rank: from_bigint(row.rank),
            username: row.username,
            score: from_bigint(row.score),
            wave: u32::try_from(row.wave).unwrap_or(0),
        }
    }
}

#[async_trait]
impl DailyStore for PostgresPool {
    async fn daily_seed(&self, date: NaiveDate) -> Result<Option<String>, DbError> {
        let seed = sqlx::query_scalar::<_, String>(r"SELECT seed FROM daily_seeds WHERE date = $1")
            .bind(date)
            .fetch_optional(self.pool())
            .await?;
        Ok(seed)
    }

    async fn insert_daily_seed(&self, date: NaiveDate, seed: &str) -> Result<String, DbError> {
        sqlx::query(
            r"INSERT INTO daily_seeds (date, seed) VALUES ($1, $2)
              ON CONFLICT (date) DO NOTHING",
        )
        .bind(date)
        .bind(seed)
        .execute(self.pool())
        .await?;

        self.daily_seed(date)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("daily seed for {date}")))
    }

    async fn record_daily_run(
        &self,
        uuid: AccountId,
        date: NaiveDate,
        score: u64,
        wave: u32,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO account_daily_runs (uuid, date, score, wave, recorded_at)
              VALUES ($1, $2, $3, $4, now())
              ON CONFLICT (uuid, date) DO UPDATE SET
                recorded_at = CASE
                    WHEN EXCLUDED.score > account_daily_runs.score THEN EXCLUDED.recorded_at
                    ELSE account_daily_runs.recorded_at
                END,
                score = GREATEST(account_daily_runs.score, EXCLUDED.score),
                wave = GREATEST(account_daily_runs.wave, EXCLUDED.wave)",
        )
        .bind(uuid.into_inner())
        .bind(date)
        .bind(to_bigint(score))
        .bind(i32::try_from(wave).unwrap_or(i32::MAX))
        .execute(self.pool())
        .await?;

        tracing::debug!(%uuid, %date, score, wave, "Recorded daily run");
        Ok(())
    }

    async fn rankings(
        &self,
        category: RankingCategory,
        today: NaiveDate,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<RankingEntry>, DbError> {
        let query = match category {
            RankingCategory::Daily => {
                r"SELECT RANK() OVER (ORDER BY r.score DESC) AS rank,
                         a.username, r.score, r.wave
                  FROM account_daily_runs r
                  JOIN accounts a ON a.uuid = r.uuid
                  WHERE r.date = $1
                  ORDER BY rank, r.recorded_at
                  LIMIT $2 OFFSET $3"
            }
            RankingCategory::Weekly => {
                r"SELECT RANK() OVER (ORDER BY SUM(r.score) DESC) AS rank,
                         a.username, SUM(r.score)::BIGINT AS score, MAX(r.wave) AS wave
                  FROM account_daily_runs r
                  JOIN accounts a ON a.uuid = r.uuid
                  WHERE r.date >= $1
                  GROUP BY a.uuid, a.username
                  ORDER BY rank, MIN(r.recorded_at)
                  LIMIT $2 OFFSET $3"
            }
        };

        let rows = sqlx::query_as::<_, RankingRow>(query)
            .bind(ranking_window_start(category, today))
            .bind(to_bigint(limit))
            .bind(to_bigint(offset))
            .fetch_all(self.pool())
            .await?;

        Ok(rows.into_iter().map(RankingEntry::from).collect())
    }

    async fn ranking_entry_count(
        &self,
        category: RankingCategory,
        today: NaiveDate,
    ) -> Result<u64, DbError> {
        let query = match category {
            RankingCategory::Daily => r"SELECT COUNT(*) FROM account_daily_runs WHERE date = $1",
            RankingCategory::Weekly => {
                r"SELECT COUNT(DISTINCT uuid) FROM account_daily_runs WHERE date >= $1"
            }
        };

        let count = sqlx::query_scalar::<_, i64>(query)
            .bind(ranking_window_start(category, today))
            .fetch_one(self.pool())
            .await?;
        Ok(from_bigint(count))
    }
}
