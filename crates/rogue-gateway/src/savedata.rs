//! Save-data lifecycle: get, update, delete, and clear.
//!
//! A request is handled in two phases. [`SaveRequest::resolve`] turns the
//! raw query values and body into a typed request, choosing the body
//! variant up front with [`resolve_body_variant`]; a body that does not
//! parse as that variant is rejected, never retried as the other one.
//! [`execute`] then applies the typed request against the store.
//!
//! ```text
//! op      datatype            body variant
//! ------  ------------------  ------------
//! Get     any                 none
//! Delete  any                 none
//! Update  0                   System
//! Update  anything else/none  Session
//! Clear   any                 Session
//! ```
//!
//! Get and Delete address the save by `datatype`. A missing value becomes
//! [`MISSING_DATATYPE`], and a code naming no variant fails in the store
//! tier like any other unresolvable save.

use chrono::Utc;
use rogue_db::{DbError, GameStore};
use rogue_types::{AccountId, ClearResponse, DataType, GameMode, SaveEnvelope, SessionSaveData};
use tracing::{debug, info};

use crate::daily::DailyService;
use crate::error::GatewayError;

/// Data type code used when a Get or Delete omits `datatype`. Matches no
/// variant.
pub const MISSING_DATATYPE: i64 = -1;

/// Which save-data endpoint a request came in on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOperation {
    /// `/api/savedata/get`
    Get,
    /// `/api/savedata/update`
    Update,
    /// `/api/savedata/delete`
    Delete,
    /// `/api/savedata/clear`
    Clear,
}

/// The body variant `op` expects for a given raw `datatype`, or `None` if
/// the operation takes no body.
pub const fn resolve_body_variant(op: SaveOperation, datatype: Option<i64>) -> Option<DataType> {
    match op {
        SaveOperation::Get | SaveOperation::Delete => None,
        SaveOperation::Update => match datatype {
            Some(0) => Some(DataType::System),
            _ => Some(DataType::Session),
        },
        SaveOperation::Clear => Some(DataType::Session),
    }
}

/// Parse an optional integer query parameter.
///
/// # Errors
///
/// [`GatewayError::BadRequest`] if the value is present but not an
/// integer.
pub fn parse_int_param<T>(name: &str, raw: Option<&str>) -> Result<Option<T>, GatewayError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.map(|value| {
        value
            .parse()
            .map_err(|e| GatewayError::bad_request(format!("failed to convert {name}: {e}")))
    })
    .transpose()
}

/// A fully typed save-data request.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequest {
    /// Read one save.
    Get {
        /// Kind of save.
        data_type: DataType,
        /// Slot to read.
        slot: i32,
    },
    /// Write one save.
    Update {
        /// Slot to write.
        slot: i32,
        /// Payload, already tagged.
        save: SaveEnvelope,
    },
    /// Remove one save.
    Delete {
        /// Kind of save.
        data_type: DataType,
        /// Slot to remove.
        slot: i32,
    },
    /// End a run: record a daily score if applicable, then free the slot.
    Clear {
        /// Slot being cleared.
        slot: i32,
        /// Final state of the run.
        session: SessionSaveData,
    },
}

impl SaveRequest {
    /// Build a typed request from raw inputs. `slot` defaults to 0.
    ///
    /// # Errors
    ///
    /// [`GatewayError::BadRequest`] if the body does not parse as the
    /// resolved variant. [`GatewayError::Store`] if Get/Delete name no data
    /// type.
    pub fn resolve(
        op: SaveOperation,
        datatype: Option<i64>,
        slot: Option<i32>,
        body: &[u8],
    ) -> Result<Self, GatewayError> {
        let slot = slot.unwrap_or(0);

        let save = match resolve_body_variant(op, datatype) {
            Some(variant) => Some(SaveEnvelope::from_json(variant, body).map_err(|e| {
                GatewayError::bad_request(format!("failed to unmarshal request body: {e}"))
            })?),
            None => None,
        };

        match (op, save) {
            (SaveOperation::Get, _) => Ok(Self::Get {
                data_type: named_data_type(datatype)?,
                slot,
            }),
            (SaveOperation::Delete, _) => Ok(Self::Delete {
                data_type: named_data_type(datatype)?,
                slot,
            }),
            (SaveOperation::Update, Some(save)) => Ok(Self::Update { slot, save }),
            (SaveOperation::Clear, Some(SaveEnvelope::Session(session))) => {
                Ok(Self::Clear { slot, session })
            }
            (SaveOperation::Clear, Some(SaveEnvelope::System(_))) => Err(
                GatewayError::bad_request("save data is not type SessionSaveData"),
            ),
            (SaveOperation::Update | SaveOperation::Clear, None) => {
                Err(GatewayError::bad_request("missing save data"))
            }
        }
    }
}

fn named_data_type(datatype: Option<i64>) -> Result<DataType, GatewayError> {
    let code = datatype.unwrap_or(MISSING_DATATYPE);
    DataType::try_from(code).map_err(|_| GatewayError::Store(DbError::UnknownDataType(code)))
}

/// What a save-data request produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Success with an empty body.
    Empty,
    /// The requested save.
    Save(SaveEnvelope),
    /// Result of a clear.
    Cleared(ClearResponse),
}

/// Apply `request` for account `uuid`.
///
/// # Errors
///
/// [`GatewayError::BadRequest`] for a system save without trainer ids;
/// store errors (missing save, slot out of range, unknown account)
/// otherwise.
pub async fn execute<S>(
    store: &S,
    daily: &DailyService,
    uuid: AccountId,
    request: SaveRequest,
) -> Result<SaveOutcome, GatewayError>
where
    S: GameStore + ?Sized,
{
    match request {
        SaveRequest::Get { data_type, slot } => {
            let save = store.read_save(uuid, data_type, slot).await?;
            Ok(SaveOutcome::Save(save))
        }
        SaveRequest::Update { slot, save } => {
            if let SaveEnvelope::System(system) = &save
                && !system.has_trainer()
            {
                return Err(GatewayError::bad_request("invalid system data"));
            }
            store.touch_activity(uuid).await?;
            if let SaveEnvelope::System(system) = &save {
                store.update_account_stats(uuid, &system.game_stats).await?;
            }
            store.store_save(uuid, slot, &save).await?;
            debug!(%uuid, slot, data_type = ?save.data_type(), "Stored save data");
            Ok(SaveOutcome::Empty)
        }
        SaveRequest::Delete { data_type, slot } => {
            store.touch_activity(uuid).await?;
            store.delete_save(uuid, data_type, slot).await?;
            debug!(%uuid, slot, ?data_type, "Deleted save data");
            Ok(SaveOutcome::Empty)
        }
        SaveRequest::Clear { slot, session } => {
            store.touch_activity(uuid).await?;
            let completed = session.is_completed();

            if session.game_mode == GameMode::Daily && session.seed == daily.seed().await? {
                let wave = session.waves_cleared();
                store
                    .record_daily_run(uuid, Utc::now().date_naive(), session.score, wave)
                    .await?;
                info!(%uuid, score = session.score, wave, "Recorded daily run");
            }

            store.delete_save(uuid, DataType::Session, slot).await?;
            Ok(SaveOutcome::Cleared(ClearResponse { success: completed }))
        }
    }
}
