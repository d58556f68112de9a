//! Shared domain primitives.
//!
//! Value objects and error types used across all domain modules.

mod errors;
mod ids;
mod money;
mod rating;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AddressId, BookingId, ExternalId, ServiceId, UserId};
pub use money::{compute_total, Money};
pub use rating::Rating;
pub use timestamp::Timestamp;
