//! [`SaveDataStore`] on `PostgreSQL`.
//!
//! Payloads are stored as `JSONB`. Session rows also carry the game mode
//! so the classic-session counter can be computed without decoding JSON.

use async_trait::async_trait;
use rogue_types::{AccountId, DataType, SaveEnvelope, SessionSaveData, SystemSaveData};
use sqlx::types::Json;

use crate::error::DbError;
use crate::postgres::PostgresPool;
use crate::store::{SaveDataStore, check_slot};

#[async_trait]
impl SaveDataStore for PostgresPool {
    async fn read_save(
        &self,
        uuid: AccountId,
        data_type: DataType,
        slot: i32,
    ) -> Result<SaveEnvelope, DbError> {
        check_slot(data_type, slot)?;

        let envelope = match data_type {
            DataType::System => sqlx::query_scalar::<_, Json<SystemSaveData>>(
                r"SELECT data FROM system_saves WHERE uuid = $1",
            )
            .bind(uuid.into_inner())
            .fetch_optional(self.pool())
            .await?
            .map(|Json(data)| SaveEnvelope::System(data)),
            DataType::Session => sqlx::query_scalar::<_, Json<SessionSaveData>>(
                r"SELECT data FROM session_saves WHERE uuid = $1 AND slot = $2",
            )
            .bind(uuid.into_inner())
            .bind(slot)
            .fetch_optional(self.pool())
            .await?
            .map(|Json(data)| SaveEnvelope::Session(data)),
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

        match save {
            SaveEnvelope::System(data) => {
                sqlx::query(
                    r"INSERT INTO system_saves (uuid, data, updated_at)
                      VALUES ($1, $2, now())
                      ON CONFLICT (uuid) DO UPDATE SET
                        data = EXCLUDED.data,
                        updated_at = EXCLUDED.updated_at",
                )
                .bind(uuid.into_inner())
                .bind(Json(data))
                .execute(self.pool())
                .await?;
            }
            SaveEnvelope::Session(data) => {
                sqlx::query(
                    r"INSERT INTO session_saves (uuid, slot, game_mode, data, updated_at)
                      VALUES ($1, $2, $3, $4, now())
                      ON CONFLICT (uuid, slot) DO UPDATE SET
                        game_mode = EXCLUDED.game_mode,
                        data = EXCLUDED.data,
                        updated_at = EXCLUDED.updated_at",
                )
                .bind(uuid.into_inner())
                .bind(slot)
                .bind(data.game_mode.code())
                .bind(Json(data))
                .execute(self.pool())
                .await?;
            }
        }

        tracing::debug!(%uuid, slot, data_type = ?save.data_type(), "Stored save data");
        Ok(())
    }

    async fn delete_save(
        &self,
        uuid: AccountId,
        data_type: DataType,
        slot: i32,
    ) -> Result<(), DbError> {
        check_slot(data_type, slot)?;

        match data_type {
            DataType::System => {
                sqlx::query(r"DELETE FROM system_saves WHERE uuid = $1")
                    .bind(uuid.into_inner())
                    .execute(self.pool())
                    .await?;
            }
            DataType::Session => {
                sqlx::query(r"DELETE FROM session_saves WHERE uuid = $1 AND slot = $2")
                    .bind(uuid.into_inner())
                    .bind(slot)
                    .execute(self.pool())
                    .await?;
            }
        }
        Ok(())
    }

    async fn latest_session_slot(&self, uuid: AccountId) -> Result<Option<i32>, DbError> {
        let slot = sqlx::query_scalar::<_, i32>(
            r"SELECT slot FROM session_saves
              WHERE uuid = $1
              ORDER BY updated_at DESC
              LIMIT 1",
        )
        .bind(uuid.into_inner())
        .fetch_optional(self.pool())
        .await?;
        Ok(slot)
    }
}
