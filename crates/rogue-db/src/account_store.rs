//! [`AccountStore`] on `PostgreSQL`.
//!
//! Tables: `accounts`, `sessions`, `account_stats`.

use async_trait::async_trait;
use rogue_types::{AccountId, GameStats};
use uuid::Uuid;

use crate::error::DbError;
use crate::postgres::{PostgresPool, to_bigint};
use crate::store::{AccountCredentials, AccountStore, NewAccount, SESSION_TTL_DAYS};

/// Row returned by the credential lookup.
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    uuid: Uuid,
    hash: Vec<u8>,
    salt: Vec<u8>,
}

#[async_trait]
impl AccountStore for PostgresPool {
    async fn add_account(&self, account: &NewAccount) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO accounts (uuid, username, hash, salt, registered_at)
              VALUES ($1, $2, $3, $4, now())",
        )
        .bind(account.uuid.into_inner())
        .bind(&account.username)
        .bind(&account.key)
        .bind(&account.salt)
        .execute(self.pool())
        .await
        .map_err(|e| DbError::from_insert(e, "username"))?;

        tracing::debug!(uuid = %account.uuid, "Inserted account");
        Ok(())
    }

    async fn fetch_credentials(&self, username: &str) -> Result<AccountCredentials, DbError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"SELECT uuid, hash, salt FROM accounts WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| DbError::NotFound(format!("account {username}")))?;

        Ok(AccountCredentials {
            uuid: AccountId::from(row.uuid),
            key: row.hash,
            salt: row.salt,
        })
    }

    async fn add_session(&self, uuid: AccountId, token: &[u8]) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO sessions (token, uuid, expires_at)
              VALUES ($1, $2, now() + make_interval(days => $3))",
        )
        .bind(token)
        .bind(uuid.into_inner())
        .bind(i32::try_from(SESSION_TTL_DAYS).unwrap_or(i32::MAX))
        .execute(self.pool())
        .await
        .map_err(|e| DbError::from_insert(e, "session"))?;
        Ok(())
    }

    async fn remove_session(&self, token: &[u8]) -> Result<(), DbError> {
        let result = sqlx::query(r"DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(String::from("session")));
        }
        Ok(())
    }

    async fn fetch_username_from_token(&self, token: &[u8]) -> Result<String, DbError> {
        sqlx::query_scalar::<_, String>(
            r"SELECT a.username
              FROM sessions s
              JOIN accounts a ON a.uuid = s.uuid
              WHERE s.token = $1 AND s.expires_at > now()",
        )
        .bind(token)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| DbError::NotFound(String::from("session")))
    }

    async fn fetch_uuid_from_token(&self, token: &[u8]) -> Result<AccountId, DbError> {
        sqlx::query_scalar::<_, Uuid>(
            r"SELECT uuid FROM sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(self.pool())
        .await?
        .map(AccountId::from)
        .ok_or_else(|| DbError::NotFound(String::from("session")))
    }

    async fn touch_last_login(&self, uuid: AccountId) -> Result<(), DbError> {
        sqlx::query(
            r"UPDATE accounts SET last_logged_in = now(), last_activity = now() WHERE uuid = $1",
        )
        .bind(uuid.into_inner())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn touch_activity(&self, uuid: AccountId) -> Result<(), DbError> {
        sqlx::query(r"UPDATE accounts SET last_activity = now() WHERE uuid = $1")
            .bind(uuid.into_inner())
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn update_account_stats(
        &self,
        uuid: AccountId,
        stats: &GameStats,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO account_stats (uuid, battles, classic_sessions_played)
              VALUES ($1, $2, $3)
              ON CONFLICT (uuid) DO UPDATE SET
                battles = EXCLUDED.battles,
                classic_sessions_played = EXCLUDED.classic_sessions_played",
        )
        .bind(uuid.into_inner())
        .bind(to_bigint(stats.battles))
        .bind(to_bigint(stats.classic_sessions_played))
        .execute(self.pool())
        .await?;
        Ok(())
    }
}
