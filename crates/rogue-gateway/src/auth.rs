//! Resolving the `Authorization` header to an account.
//!
//! Both resolvers decode the header the same way and only differ in which
//! store lookup follows. Identity is never cached: every request hits the
//! store, so a logout takes effect immediately.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use rogue_db::AccountStore;
use rogue_types::AccountId;

use crate::error::GatewayError;
use crate::token::Token;

/// Decode the raw `Authorization` value. A missing or non-UTF-8 header
/// decodes like an empty one.
///
/// # Errors
///
/// Returns [`GatewayError::Token`] if the value is not a valid token.
pub fn token_from_header(headers: &HeaderMap) -> Result<Token, GatewayError> {
    let raw = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    Ok(Token::decode(raw)?)
}

/// Resolve the request's token to the account's username.
///
/// # Errors
///
/// [`GatewayError::Token`] for a malformed token and
/// [`GatewayError::Identity`] if no live session matches it.
pub async fn username_from_header<S>(store: &S, headers: &HeaderMap) -> Result<String, GatewayError>
where
    S: AccountStore + ?Sized,
{
    let token = token_from_header(headers)?;
    store
        .fetch_username_from_token(token.as_bytes())
        .await
        .map_err(GatewayError::Identity)
}

/// Resolve the request's token to the account key.
///
/// # Errors
///
/// Same as [`username_from_header`].
pub async fn uuid_from_header<S>(store: &S, headers: &HeaderMap) -> Result<AccountId, GatewayError>
where
    S: AccountStore + ?Sized,
{
    let token = token_from_header(headers)?;
    store
        .fetch_uuid_from_token(token.as_bytes())
        .await
        .map_err(GatewayError::Identity)
}
