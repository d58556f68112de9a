//! Service Booking - marketplace backend for service bookings.
//!
//! Customers book catalog services, providers fulfil them, and the Booking
//! aggregate tracks lifecycle state, payment state, and derived pricing.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
