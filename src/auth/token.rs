//! Bearer tokens: JSON Web Tokens that identify the user making a request.

use std::fmt::Debug;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserID};

/// How long a token is valid for after it is issued.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::days(7);

/// The contents of a JSON Web Token.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: UserID,
    /// The time the token was issued as a unix timestamp.
    pub iat: i64,
    /// The expiry time of the token as a unix timestamp.
    pub exp: i64,
}

/// The keys used to sign and verify tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Derive the signing and verification keys from a shared `secret`.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtKeys { .. }")
    }
}

/// Create a signed token for `user_id` that expires `duration` after `issued_at`.
///
/// # Errors
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(
    user_id: UserID,
    issued_at: OffsetDateTime,
    duration: Duration,
    keys: &JwtKeys,
) -> Result<String, Error> {
    let claims = Claims {
        sub: user_id,
        iat: issued_at.unix_timestamp(),
        exp: (issued_at + duration).unix_timestamp(),
    };

    encode(&Header::default(), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of `token` and return its claims.
///
/// # Errors
/// Returns [Error::InvalidToken] for any malformed, badly signed or expired
/// token. The cause is only logged.
pub fn decode_token(token: &str, keys: &JwtKeys) -> Result<Claims, Error> {
    decode::<Claims>(token, &keys.decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("rejected bearer token: {error}");
            Error::InvalidToken
        })
}
