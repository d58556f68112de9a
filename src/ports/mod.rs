//! Ports - interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.

mod booking_reader;
mod booking_repository;
mod cache;
mod event_publisher;
mod payment_gateway;
mod reference_checker;

pub use booking_reader::BookingReader;
pub use booking_repository::{is_code_collision, BookingRepository, CODE_CONSTRAINT_DETAIL};
pub use cache::Cache;
pub use event_publisher::EventPublisher;
pub use payment_gateway::{
    PaymentCallback, PaymentCallbackKind, PaymentGateway, PaymentGatewayError, RefundInstruction,
};
pub use reference_checker::ReferenceChecker;
