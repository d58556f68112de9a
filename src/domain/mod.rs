//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, money, errors)
//! - `booking` - Booking aggregate, lifecycle state machine, and pricing
//! - `user` - User roles and the soft-deletable user entity

pub mod booking;
pub mod foundation;
pub mod user;
