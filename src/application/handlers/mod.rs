//! Command and query handlers, one per operation.

pub mod booking;
