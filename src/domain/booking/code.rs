//! Human-readable booking code generation.
//!
//! Format: `BK-YYYY-MMDD-XXXX` where XXXX is a random 4-digit suffix.
//! Codes are not globally unique by construction; the database uniqueness
//! constraint is the authority, and insert callers regenerate on conflict.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Timestamp, ValidationError};

/// How many times an insert may regenerate the code before giving up
/// with a conflict error.
pub const MAX_CODE_ATTEMPTS: u32 = 3;

/// Human-readable booking reference shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingCode(String);

impl BookingCode {
    /// Generates a code for the given moment with a random suffix in [1000, 9999].
    pub fn generate(now: &Timestamp) -> Self {
        let date = now.date();
        let suffix: u32 = rand::thread_rng().gen_range(1000..=9999);
        Self(format!("BK-{}-{}-{}", date.format("%Y"), date.format("%m%d"), suffix))
    }

    /// Validates and wraps an existing code (e.g. read back from storage).
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if !Self::is_valid(&value) {
            return Err(ValidationError::invalid_format(
                "booking_code",
                "expected BK-YYYY-MMDD-XXXX",
            ));
        }
        Ok(Self(value))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(value: &str) -> bool {
        let mut parts = value.split('-');
        let (prefix, year, monthday, suffix) = match (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) {
            (Some(p), Some(y), Some(md), Some(s), None) => (p, y, md, s),
            _ => return false,
        };
        prefix == "BK"
            && year.len() == 4
            && monthday.len() == 4
            && suffix.len() == 4
            && [year, monthday, suffix]
                .iter()
                .all(|p| p.chars().all(|c| c.is_ascii_digit()))
    }
}

impl fmt::Display for BookingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
