//! Shared type definitions for the Rogue game gateway.
//!
//! Used by both the data layer and the HTTP gateway. Response DTOs export
//! `TypeScript` bindings via `ts-rs` for the game client.
//!
//! # Modules
//!
//! - [`ids`] -- Account identifier
//! - [`enums`] -- Integer-coded enums (data type, game mode, ranking category)
//! - [`save`] -- Save payloads and the [`SaveEnvelope`] that tags them
//! - [`api`] -- JSON response bodies

pub mod api;
pub mod enums;
pub mod ids;
pub mod save;

// Re-export all public types at crate root for convenience.
pub use api::{AccountInfo, ClearResponse, LoginResponse, RankingEntry, TitleStats};
pub use enums::{DataType, GameMode, RankingCategory, UnknownCode};
pub use ids::AccountId;
pub use save::{
    GameStats, SESSION_SLOT_COUNT, SaveEnvelope, SessionSaveData, SystemSaveData, TRAINER_BATTLE,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the client-facing DTOs.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::ids::AccountId::export_all();
        let _ = crate::api::AccountInfo::export_all();
        let _ = crate::api::LoginResponse::export_all();
        let _ = crate::api::TitleStats::export_all();
        let _ = crate::api::ClearResponse::export_all();
        let _ = crate::api::RankingEntry::export_all();
    }
}
