//! User codes: the short identifiers users share to invite others to their
//! account group.

use std::fmt::Display;

use rand::Rng;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, user::is_code_taken};

/// The number of characters in a user code.
pub const USER_CODE_LENGTH: usize = 6;

/// The characters a generated user code is drawn from.
const USER_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The number of random candidates tried before giving up on finding an unused code.
pub const MAX_USER_CODE_ATTEMPTS: usize = 32;

/// A short code identifying a user, which doubles as the code of the account
/// group created for that user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserCode(String);

impl UserCode {
    /// Parse a code supplied by a client.
    ///
    /// Returns `None` if `raw_code` is not exactly [USER_CODE_LENGTH]
    /// characters long. No other normalization is applied, codes are matched
    /// exactly.
    pub fn parse(raw_code: &str) -> Option<Self> {
        (raw_code.chars().count() == USER_CODE_LENGTH).then(|| Self(raw_code.to_owned()))
    }

    /// Create a code without any validation, e.g. when reading from the database.
    pub fn new_unchecked(raw_code: &str) -> Self {
        Self(raw_code.to_owned())
    }

    /// Draw a random code from `[A-Z0-9]`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..USER_CODE_LENGTH)
            .map(|_| USER_CODE_ALPHABET[rng.gen_range(0..USER_CODE_ALPHABET.len())] as char)
            .collect();

        Self(code)
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Generate a code that is not used by any user or account group.
///
/// # Errors
///
/// Returns [Error::UserCodeExhausted] if [MAX_USER_CODE_ATTEMPTS] candidates
/// were all taken, or [Error::SqlError] if the store could not be queried.
pub fn generate_unique_user_code(connection: &Connection) -> Result<UserCode, Error> {
    generate_unique_user_code_with(&mut rand::thread_rng(), |code| {
        is_code_taken(code, connection)
    })
}

fn generate_unique_user_code_with<R, F>(rng: &mut R, mut is_taken: F) -> Result<UserCode, Error>
where
    R: Rng + ?Sized,
    F: FnMut(&UserCode) -> Result<bool, Error>,
{
    for _ in 0..MAX_USER_CODE_ATTEMPTS {
        let candidate = UserCode::random(rng);

        if !is_taken(&candidate)? {
            return Ok(candidate);
        }

        tracing::debug!("user code {candidate} is taken, trying another");
    }

    Err(Error::UserCodeExhausted(MAX_USER_CODE_ATTEMPTS))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{SeedableRng, rngs::StdRng};

    use crate::{
        Error,
        user::code::{
            MAX_USER_CODE_ATTEMPTS, USER_CODE_LENGTH, UserCode, generate_unique_user_code_with,
        },
    };

    fn assert_valid_code(code: &UserCode) {
        assert_eq!(code.as_str().len(), USER_CODE_LENGTH);
        assert!(
            code.as_str()
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
            "{code} contains characters outside [A-Z0-9]"
        );
    }

    #[test]
    fn random_codes_use_expected_alphabet() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..1000 {
            assert_valid_code(&UserCode::random(&mut rng));
        }
    }

    #[test]
    fn parse_requires_exact_length() {
        assert_eq!(UserCode::parse("ABC123"), Some(UserCode::new_unchecked("ABC123")));
        assert_eq!(UserCode::parse("ABC12"), None);
        assert_eq!(UserCode::parse("ABC1234"), None);
        assert_eq!(UserCode::parse(""), None);
    }

    #[test]
    fn skips_taken_codes() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();

        let code = generate_unique_user_code_with(&mut rng, |candidate| {
            // Reject the first two candidates.
            seen.insert(candidate.clone());
            Ok(seen.len() <= 2)
        })
        .unwrap();

        assert_valid_code(&code);
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn gives_up_when_every_code_is_taken() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut attempts = 0;

        let result = generate_unique_user_code_with(&mut rng, |_| {
            attempts += 1;
            Ok(true)
        });

        assert_eq!(result, Err(Error::UserCodeExhausted(MAX_USER_CODE_ATTEMPTS)));
        assert_eq!(attempts, MAX_USER_CODE_ATTEMPTS);
    }

    #[test]
    fn propagates_store_errors() {
        let mut rng = StdRng::seed_from_u64(7);

        let result = generate_unique_user_code_with(&mut rng, |_| Err(Error::DatabaseLockError));

        assert_eq!(result, Err(Error::DatabaseLockError));
    }
}
