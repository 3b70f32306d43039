//! Account identifier.
//!
//! Accounts are keyed by a random UUID assigned at registration. The
//! newtype keeps account keys from being mixed with other UUID-shaped
//! values. Session tokens are raw bytes and never pass through here.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unique identifier for a player account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct AccountId(pub Uuid);

impl AccountId {
    /// Assign a fresh random (v4) key.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The key as stored in the `accounts.uuid` column.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for AccountId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}
