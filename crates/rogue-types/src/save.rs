//! Save-data payloads and the envelope that tags them.
//!
//! The game client owns the full schema of both payloads. Only the fields
//! the server acts on are typed here; every other key is kept verbatim in
//! `extra` so a save round-trips through the server unchanged.
//!
//! A [`SaveEnvelope`] is always built for a known [`DataType`] via
//! [`SaveEnvelope::from_json`]. There is deliberately no untagged
//! `Deserialize` impl: a body that fails to parse as the chosen variant
//! must fail, never fall back to the other one.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enums::{DataType, GameMode};

/// Number of session slots each account has.
pub const SESSION_SLOT_COUNT: i32 = 5;

/// Battle type code for a trainer battle.
pub const TRAINER_BATTLE: u8 = 2;

/// Lifetime statistics embedded in the system save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    /// Total battles fought across all runs.
    #[serde(default)]
    pub battles: u64,
    /// Classic runs started.
    #[serde(default)]
    pub classic_sessions_played: u64,
    /// Remaining client-owned statistics.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Account-wide progress (unlocks, dex, statistics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSaveData {
    /// Public trainer id.
    pub trainer_id: u32,
    /// Secret trainer id.
    pub secret_id: u32,
    /// Lifetime statistics.
    #[serde(default)]
    pub game_stats: GameStats,
    /// Client version that wrote the save.
    #[serde(default)]
    pub game_version: String,
    /// Client timestamp (milliseconds since the Unix epoch).
    #[serde(default)]
    pub timestamp: i64,
    /// Remaining client-owned fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SystemSaveData {
    /// A system save with both trainer ids zero was never initialised.
    pub const fn has_trainer(&self) -> bool {
        self.trainer_id != 0 || self.secret_id != 0
    }
}

/// One in-progress run, stored in a session slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSaveData {
    /// Seed the run was generated from.
    pub seed: String,
    /// Mode the run was started in.
    pub game_mode: GameMode,
    /// Current wave.
    pub wave_index: u32,
    /// Current score.
    #[serde(default)]
    pub score: u64,
    /// Kind of the current battle.
    #[serde(default)]
    pub battle_type: u8,
    /// Seconds played.
    #[serde(default)]
    pub play_time: u64,
    /// Client version that wrote the save.
    #[serde(default)]
    pub game_version: String,
    /// Client timestamp (milliseconds since the Unix epoch).
    #[serde(default)]
    pub timestamp: i64,
    /// Remaining client-owned fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionSaveData {
    /// Whether the run reached its mode's final wave in a trainer battle.
    pub const fn is_completed(&self) -> bool {
        match self.game_mode.final_wave() {
            Some(wave) => wave == self.wave_index && self.battle_type == TRAINER_BATTLE,
            None => false,
        }
    }

    /// The last wave the player actually cleared.
    pub const fn waves_cleared(&self) -> u32 {
        if self.is_completed() {
            self.wave_index
        } else {
            self.wave_index.saturating_sub(1)
        }
    }
}

/// A save payload tagged with its [`DataType`].
///
/// Serializes as the bare inner payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SaveEnvelope {
    /// Account-wide save.
    System(SystemSaveData),
    /// Slot save.
    Session(SessionSaveData),
}

impl SaveEnvelope {
    /// Parse `body` strictly as the variant named by `data_type`.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the body does not match that variant's
    /// schema.
    pub fn from_json(data_type: DataType, body: &[u8]) -> Result<Self, serde_json::Error> {
        match data_type {
            DataType::System => serde_json::from_slice(body).map(Self::System),
            DataType::Session => serde_json::from_slice(body).map(Self::Session),
        }
    }

    /// The tag of this envelope.
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::System(_) => DataType::System,
            Self::Session(_) => DataType::Session,
        }
    }
}
