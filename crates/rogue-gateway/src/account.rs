//! Account glue: registration, login, logout, and account info.
//!
//! Passwords are never stored. Registration derives an Argon2i key from
//! the password and a random salt; login derives again with the stored
//! salt and compares keys.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::Rng as _;
use rogue_db::{AccountStore, NewAccount, SaveDataStore};
use rogue_types::{AccountId, AccountInfo, LoginResponse};
use serde::Deserialize;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::error::GatewayError;
use crate::token::Token;

/// Longest accepted username.
pub const USERNAME_MAX_LEN: u64 = 16;

/// Shortest accepted password.
pub const PASSWORD_MIN_LEN: u64 = 1;

/// Argon2 passes.
const ARGON2_TIME_COST: u32 = 3;
/// Argon2 memory in KiB (32 MiB).
const ARGON2_MEMORY_KIB: u32 = 32_768;
/// Argon2 lanes.
const ARGON2_LANES: u32 = 4;
/// Derived key length.
const KEY_LEN: usize = 32;
/// Salt length.
const SALT_LEN: usize = 16;

/// Username and password as submitted in the account forms.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Credentials {
    /// 1 to 16 ASCII letters or digits.
    #[serde(default)]
    #[validate(
        length(min = 1, max = USERNAME_MAX_LEN, message = "invalid username"),
        custom(function = "ascii_alphanumeric")
    )]
    pub username: String,

    /// Any non-empty string.
    #[serde(default)]
    #[validate(length(min = PASSWORD_MIN_LEN, message = "invalid password"))]
    pub password: String,
}

fn ascii_alphanumeric(username: &str) -> Result<(), ValidationError> {
    if username.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ValidationError::new("alphanumeric").with_message("invalid username".into()))
    }
}

impl Credentials {
    fn check(&self) -> Result<(), GatewayError> {
        self.validate()
            .map_err(|e| GatewayError::bad_request(e.to_string()))
    }
}

/// Derive the password key for `password` under `salt`.
fn derive_key(password: &[u8], salt: &[u8]) -> Result<Vec<u8>, GatewayError> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_TIME_COST,
        ARGON2_LANES,
        Some(KEY_LEN),
    )
    .map_err(|e| GatewayError::Internal(format!("invalid argon2 parameters: {e}")))?;

    let mut key = vec![0_u8; KEY_LEN];
    Argon2::new(Algorithm::Argon2i, Version::V0x13, params)
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| GatewayError::Internal(format!("failed to derive key: {e}")))?;
    Ok(key)
}

/// Run [`derive_key`] off the async workers; it is deliberately slow.
async fn derive_key_blocking(password: String, salt: Vec<u8>) -> Result<Vec<u8>, GatewayError> {
    tokio::task::spawn_blocking(move || derive_key(password.as_bytes(), &salt))
        .await
        .map_err(|e| GatewayError::Internal(format!("key derivation task failed: {e}")))?
}

/// Compare two derived keys without short-circuiting on the first
/// differing byte.
fn keys_match(derived: &[u8], stored: &[u8]) -> bool {
    derived.len() == stored.len()
        && derived
            .iter()
            .zip(stored)
            .fold(0_u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

/// Create a new account.
///
/// # Errors
///
/// [`GatewayError::BadRequest`] if the credentials are malformed; store
/// errors (including a taken username) otherwise.
pub async fn register<S>(store: &S, credentials: Credentials) -> Result<(), GatewayError>
where
    S: AccountStore + ?Sized,
{
    credentials.check()?;

    let mut salt = vec![0_u8; SALT_LEN];
    rand::rng().fill(salt.as_mut_slice());
    let key = derive_key_blocking(credentials.password, salt.clone()).await?;

    let uuid = AccountId::new();
    store
        .add_account(&NewAccount {
            uuid,
            username: credentials.username.clone(),
            key,
            salt,
        })
        .await?;

    info!(%uuid, username = %credentials.username, "Registered account");
    Ok(())
}

/// Check credentials and open a new session.
///
/// # Errors
///
/// [`GatewayError::BadRequest`] for malformed credentials, an unknown
/// username, or a wrong password; store errors otherwise.
pub async fn login<S>(store: &S, credentials: Credentials) -> Result<LoginResponse, GatewayError>
where
    S: AccountStore + ?Sized,
{
    credentials.check()?;

    let stored = store
        .fetch_credentials(&credentials.username)
        .await
        .map_err(|e| match e {
            rogue_db::DbError::NotFound(_) => {
                GatewayError::bad_request("account doesn't exist")
            }
            other => GatewayError::Store(other),
        })?;

    let key = derive_key_blocking(credentials.password, stored.salt).await?;
    if !keys_match(&key, &stored.key) {
        return Err(GatewayError::bad_request("password doesn't match"));
    }

    let token = Token::generate();
    store.add_session(stored.uuid, token.as_bytes()).await?;
    store.touch_last_login(stored.uuid).await?;

    info!(uuid = %stored.uuid, "Account logged in");
    Ok(LoginResponse {
        token: token.encode(),
    })
}

/// End the session identified by `token`.
///
/// # Errors
///
/// Returns the store error if no such session exists.
pub async fn logout<S>(store: &S, token: &Token) -> Result<(), GatewayError>
where
    S: AccountStore + ?Sized,
{
    store.remove_session(token.as_bytes()).await?;
    Ok(())
}

/// Account summary shown by the client after login.
///
/// # Errors
///
/// Returns the store error if the latest session slot cannot be read.
pub async fn info<S>(store: &S, username: String, uuid: AccountId) -> Result<AccountInfo, GatewayError>
where
    S: SaveDataStore + ?Sized,
{
    let last_session_slot = store.latest_session_slot(uuid).await?.unwrap_or(-1);
    Ok(AccountInfo {
        username,
        last_session_slot,
    })
}
