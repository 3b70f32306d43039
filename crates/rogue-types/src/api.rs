//! Response bodies returned by the gateway.
//!
//! Field names are camelCase to match what the game client reads.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// `GET /api/account/info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct AccountInfo {
    /// Account username.
    pub username: String,
    /// Slot of the most recently written session save, or `-1` if none.
    pub last_session_slot: i32,
}

/// `POST /api/account/login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LoginResponse {
    /// Base64 session token to send back in `Authorization`.
    pub token: String,
}

/// `GET /api/game/titlestats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TitleStats {
    /// Players active in the last few minutes.
    pub player_count: u64,
    /// Battles fought across all accounts.
    pub battle_count: u64,
}

/// `POST /api/savedata/clear`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ClearResponse {
    /// Whether the cleared run was a completed one.
    pub success: bool,
}

/// One row of `GET /api/daily/rankings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RankingEntry {
    /// 1-based competition rank (ties share a rank).
    pub rank: u64,
    /// Account username.
    pub username: String,
    /// Best (daily) or summed (weekly) score.
    pub score: u64,
    /// Highest wave cleared.
    pub wave: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_stats_use_client_field_names() {
        let stats = TitleStats {
            player_count: 3,
            battle_count: 40,
        };
        let json = serde_json::to_value(stats).unwrap_or_default();
        assert_eq!(json, serde_json::json!({"playerCount": 3, "battleCount": 40}));
    }

    #[test]
    fn account_info_field_names() {
        let info = AccountInfo {
            username: String::from("foo"),
            last_session_slot: -1,
        };
        let json = serde_json::to_value(info).unwrap_or_default();
        assert_eq!(json["lastSessionSlot"], -1);
        assert_eq!(json["username"], "foo");
    }
}
