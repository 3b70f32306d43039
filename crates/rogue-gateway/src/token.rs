//! Bearer credential codec.
//!
//! Clients send their session token in the `Authorization` header as plain
//! standard base64 (no `Bearer` scheme). A credential is valid only if it
//! decodes to exactly [`TOKEN_SIZE`] bytes; anything else is rejected
//! before the account store is consulted.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::Rng as _;

/// Length in bytes of a decoded session token.
pub const TOKEN_SIZE: usize = 32;

/// Why an `Authorization` value is not a usable token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The header was absent or empty.
    #[error("missing token")]
    Missing,

    /// The header was not valid base64.
    #[error("failed to decode token: {0}")]
    Malformed(#[from] base64::DecodeError),

    /// The header decoded to the wrong number of bytes.
    #[error("invalid token length: got {got}, expected {expected}")]
    InvalidLength {
        /// Decoded length.
        got: usize,
        /// Required length ([`TOKEN_SIZE`]).
        expected: usize,
    },
}

/// A decoded session token.
#[derive(Clone, PartialEq, Eq)]
pub struct Token([u8; TOKEN_SIZE]);

impl Token {
    /// Decode an `Authorization` header value.
    ///
    /// # Errors
    ///
    /// [`TokenError::Missing`] for an empty value,
    /// [`TokenError::Malformed`] if base64 decoding fails, and
    /// [`TokenError::InvalidLength`] if the decoded length is not
    /// [`TOKEN_SIZE`].
    pub fn decode(header: &str) -> Result<Self, TokenError> {
        if header.is_empty() {
            return Err(TokenError::Missing);
        }

        let bytes = STANDARD.decode(header)?;
        let bytes: [u8; TOKEN_SIZE] =
            bytes
                .try_into()
                .map_err(|rejected: Vec<u8>| TokenError::InvalidLength {
                    got: rejected.len(),
                    expected: TOKEN_SIZE,
                })?;

        Ok(Self(bytes))
    }

    /// Generate a fresh random token.
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_SIZE];
        rand::rng().fill(&mut bytes);
        Self(bytes)
    }

    /// The header form of this token.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Raw token bytes, as stored.
    pub const fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Debug for Token {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Token(..)")
    }
}
