//! Store errors.
//!
//! Both backends report failures as [`DbError`]. Driver errors pass through
//! unchanged; the remaining variants describe conditions the gateway maps to
//! its own responses (missing rows, taken usernames, bad slots).

/// Failure of a store operation.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored JSON document could not be encoded or decoded.
    #[error("save data encoding error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The requested record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness constraint was violated (e.g. a taken username).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A save slot outside the range allowed for its data type.
    #[error("slot id {slot} out of range for {kind} data")]
    InvalidSlot {
        /// The rejected slot.
        slot: i32,
        /// Which save kind the slot was checked against.
        kind: &'static str,
    },

    /// A save was addressed by a data type code that names no variant.
    #[error("invalid data type: {0}")]
    UnknownDataType(i64),

    /// The store was configured with unusable settings.
    #[error("invalid store configuration: {0}")]
    Config(String),
}

impl DbError {
    /// Map a unique-violation into [`DbError::Conflict`], passing other
    /// `sqlx` errors through unchanged.
    pub(crate) fn from_insert(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(db) = &err
            && db.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Postgres(err)
    }
}
