//! Enumeration types shared by the gateway and the data layer.
//!
//! All of these travel as bare integers on the wire (query parameters or
//! JSON numbers), so each one converts to and from its integer code
//! through `TryFrom` instead of serde's default string representation.

use serde::{Deserialize, Serialize};

/// An integer code that does not name a variant of the target enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} code: {code}")]
pub struct UnknownCode {
    /// Human-readable name of the enum being decoded.
    pub kind: &'static str,
    /// The rejected code.
    pub code: i64,
}

// ---------------------------------------------------------------------------
// Save data type
// ---------------------------------------------------------------------------

/// Which kind of save payload a request refers to.
///
/// Encoded as the `datatype` query parameter: `0` for system data (the
/// account-wide progress record) and `1` for session data (one in-flight
/// run stored in a slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum DataType {
    /// Account-wide system save.
    System,
    /// Per-slot session save.
    Session,
}

impl DataType {
    /// The integer code used on the wire.
    pub const fn code(self) -> i64 {
        match self {
            Self::System => 0,
            Self::Session => 1,
        }
    }
}

impl TryFrom<i64> for DataType {
    type Error = UnknownCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::System),
            1 => Ok(Self::Session),
            _ => Err(UnknownCode {
                kind: "data type",
                code,
            }),
        }
    }
}

impl From<DataType> for i64 {
    fn from(value: DataType) -> Self {
        value.code()
    }
}

// ---------------------------------------------------------------------------
// Game mode
// ---------------------------------------------------------------------------

/// The mode a session was started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum GameMode {
    /// Standard run, completed at wave 200.
    Classic,
    /// Run without a final wave.
    Endless,
    /// Endless run with fusion enabled.
    SplicedEndless,
    /// Seeded daily challenge, completed at wave 50.
    Daily,
}

impl GameMode {
    /// The integer code used on the wire and in storage.
    pub const fn code(self) -> i64 {
        match self {
            Self::Classic => 0,
            Self::Endless => 1,
            Self::SplicedEndless => 2,
            Self::Daily => 3,
        }
    }

    /// The wave a run in this mode must reach to count as completed, if any.
    pub const fn final_wave(self) -> Option<u32> {
        match self {
            Self::Classic => Some(200),
            Self::Daily => Some(50),
            Self::Endless | Self::SplicedEndless => None,
        }
    }
}

impl TryFrom<i64> for GameMode {
    type Error = UnknownCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Classic),
            1 => Ok(Self::Endless),
            2 => Ok(Self::SplicedEndless),
            3 => Ok(Self::Daily),
            _ => Err(UnknownCode {
                kind: "game mode",
                code,
            }),
        }
    }
}

impl From<GameMode> for i64 {
    fn from(value: GameMode) -> Self {
        value.code()
    }
}

// ---------------------------------------------------------------------------
// Ranking category
// ---------------------------------------------------------------------------

/// Leaderboard window for daily-run rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum RankingCategory {
    /// Scores for the current UTC date only.
    Daily,
    /// Scores summed per account since the start of the week (Sunday).
    Weekly,
}

impl RankingCategory {
    /// The integer code used on the wire.
    pub const fn code(self) -> i64 {
        match self {
            Self::Daily => 0,
            Self::Weekly => 1,
        }
    }
}

impl TryFrom<i64> for RankingCategory {
    type Error = UnknownCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Daily),
            1 => Ok(Self::Weekly),
            _ => Err(UnknownCode {
                kind: "ranking category",
                code,
            }),
        }
    }
}

impl From<RankingCategory> for i64 {
    fn from(value: RankingCategory) -> Self {
        value.code()
    }
}
