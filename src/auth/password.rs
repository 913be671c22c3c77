//! Password strength checks and bcrypt hashing.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// A password that is hard enough to guess, but not yet hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check the strength of `raw_password`.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with zxcvbn's suggestions when the password
    /// scores below three.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        let analysis = zxcvbn(raw_password, &[]);

        match analysis.score() {
            Score::Three | Score::Four => Ok(Self(raw_password.to_owned())),
            _ => Err(Error::TooWeak(
                analysis
                    .feedback()
                    .unwrap_or(&Feedback::default())
                    .to_string(),
            )),
        }
    }

    /// Wrap `raw_password` without checking its strength.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "********")
    }
}

/// A salted bcrypt hash of the treasurer's password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The bcrypt cost used outside of tests.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with `cost` rounds.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt fails.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read from the database.
    pub fn new_unchecked(raw_hash: &str) -> Self {
        Self(raw_hash.to_owned())
    }

    /// Check the strength of `raw_password` and hash it.
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        PasswordHash::new(ValidatedPassword::new(raw_password)?, cost)
    }

    /// Whether `raw_password` matches this hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
