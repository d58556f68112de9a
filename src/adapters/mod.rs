//! Infrastructure adapters implementing the ports.

pub mod http;
pub mod payment;
pub mod postgres;
pub mod redis;
