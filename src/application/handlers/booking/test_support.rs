//! In-memory fakes shared by the booking handler tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use crate::domain::booking::{Booking, BookingCode, BookingEvent};
use crate::domain::foundation::{
    AddressId, BookingId, DomainError, ErrorCode, ExternalId, ServiceId, Timestamp, UserId,
};
use crate::domain::user::{User, UserRole};
use crate::ports::{
    BookingReader, BookingRepository, Cache, EventPublisher, PaymentCallback, PaymentGateway,
    PaymentGatewayError, ReferenceChecker, RefundInstruction, CODE_CONSTRAINT_DETAIL,
};

/// In-memory booking store with real version semantics.
pub struct InMemoryBookingRepository {
    bookings: Mutex<HashMap<i64, Booking>>,
    next_id: AtomicI64,
    /// Number of inserts that should fail with a code collision first.
    code_collisions: AtomicI64,
    /// When set, external-id reads return this snapshot instead of the
    /// stored row, so two callers can both read the same stale version.
    pinned_read: Mutex<Option<Booking>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self {
            bookings: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            code_collisions: AtomicI64::new(0),
            pinned_read: Mutex::new(None),
        }
    }

    /// Serves every later external-id read from this snapshot. Writes still
    /// hit the real store, so conditional updates see the true version.
    pub fn pin_reads(&self, snapshot: Booking) {
        *self.pinned_read.lock().unwrap() = Some(snapshot);
    }

    pub fn with_booking(booking: Booking) -> Self {
        let repo = Self::new();
        let mut b = booking;
        if b.id.is_none() {
            b.id = Some(BookingId::new(repo.next_id.fetch_add(1, Ordering::SeqCst)));
        }
        repo.bookings
            .lock()
            .unwrap()
            .insert(b.id.unwrap().value(), b);
        repo
    }

    pub fn fail_next_inserts_with_code_collision(&self, count: i64) {
        self.code_collisions.store(count, Ordering::SeqCst);
    }

    pub fn stored(&self, id: BookingId) -> Option<Booking> {
        self.bookings.lock().unwrap().get(&id.value()).cloned()
    }

    pub fn insert_count(&self) -> usize {
        self.bookings.lock().unwrap().len()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, DomainError> {
        Ok(self.bookings.lock().unwrap().get(&id.value()).cloned())
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<Booking>, DomainError> {
        if let Some(pinned) = self.pinned_read.lock().unwrap().as_ref() {
            if pinned.external_id == *external_id {
                return Ok(Some(pinned.clone()));
            }
        }
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .values()
            .find(|b| b.external_id == *external_id)
            .cloned())
    }

    async fn insert(&self, booking: &Booking) -> Result<Booking, DomainError> {
        if self.code_collisions.fetch_sub(1, Ordering::SeqCst) > 0 {
            return Err(DomainError::conflict("duplicate booking_code")
                .with_detail(CODE_CONSTRAINT_DETAIL, "booking_code"));
        }
        self.code_collisions.fetch_max(0, Ordering::SeqCst);
        let mut stored = booking.clone();
        stored.id = Some(BookingId::new(self.next_id.fetch_add(1, Ordering::SeqCst)));
        self.bookings
            .lock()
            .unwrap()
            .insert(stored.id.unwrap().value(), stored.clone());
        Ok(stored)
    }

    async fn update_conditional(
        &self,
        booking: &Booking,
        expected_version: i32,
    ) -> Result<Booking, DomainError> {
        let id = booking
            .id
            .ok_or_else(|| DomainError::new(ErrorCode::InternalError, "booking has no id"))?;
        let mut bookings = self.bookings.lock().unwrap();
        let current = bookings
            .get_mut(&id.value())
            .ok_or_else(|| DomainError::new(ErrorCode::BookingNotFound, "Booking not found"))?;
        if current.version != expected_version {
            return Err(DomainError::conflict(format!(
                "booking version changed (expected {}, found {})",
                expected_version, current.version
            )));
        }
        let mut updated = booking.clone();
        updated.version = expected_version + 1;
        *current = updated.clone();
        Ok(updated)
    }

    async fn booking_code_exists(&self, code: &BookingCode) -> Result<bool, DomainError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .values()
            .any(|b| b.booking_code == *code))
    }
}

#[async_trait]
impl BookingReader for InMemoryBookingRepository {
    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<Booking>, DomainError> {
        BookingRepository::find_by_external_id(self, external_id).await
    }

    async fn list_for_customer(&self, customer_id: UserId) -> Result<Vec<Booking>, DomainError> {
        let mut list: Vec<_> = self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.customer_id == customer_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn list_for_provider(&self, provider_id: UserId) -> Result<Vec<Booking>, DomainError> {
        let mut list: Vec<_> = self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.provider_id == Some(provider_id))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }
}

/// Reference checker backed by a fixed set of users and catalog rows.
pub struct FakeReferences {
    users: Mutex<Vec<User>>,
    active_services: Vec<ServiceId>,
    addresses: Vec<(AddressId, UserId)>,
}

impl FakeReferences {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            active_services: Vec::new(),
            addresses: Vec::new(),
        }
    }

    pub fn with_user(self, id: UserId, role: UserRole) -> Self {
        self.users.lock().unwrap().push(make_user(id, role));
        self
    }

    pub fn with_service(mut self, id: ServiceId) -> Self {
        self.active_services.push(id);
        self
    }

    pub fn with_address(mut self, id: AddressId, owner: UserId) -> Self {
        self.addresses.push((id, owner));
        self
    }
}

pub fn make_user(id: UserId, role: UserRole) -> User {
    User {
        id,
        external_id: ExternalId::new(),
        name: format!("user-{}", id),
        email: format!("user{}@example.com", id),
        role,
        is_active: true,
        deleted_at: None,
        created_at: Timestamp::now(),
        updated_at: Timestamp::now(),
    }
}

#[async_trait]
impl ReferenceChecker for FakeReferences {
    async fn find_live_user(&self, id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id && u.is_live())
            .cloned())
    }

    async fn service_is_active(&self, id: ServiceId) -> Result<bool, DomainError> {
        Ok(self.active_services.contains(&id))
    }

    async fn address_owner(&self, id: AddressId) -> Result<Option<UserId>, DomainError> {
        Ok(self
            .addresses
            .iter()
            .find(|(addr, _)| *addr == id)
            .map(|(_, owner)| *owner))
    }
}

/// Event publisher that records everything it is given.
pub struct RecordingEventPublisher {
    pub events: Mutex<Vec<BookingEvent>>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn published(&self) -> Vec<BookingEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(&self, event: BookingEvent) -> Result<(), DomainError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Payment gateway that records refund instructions.
pub struct RecordingPaymentGateway {
    pub refunds: Mutex<Vec<RefundInstruction>>,
    pub callback: Mutex<Option<PaymentCallback>>,
}

impl RecordingPaymentGateway {
    pub fn new() -> Self {
        Self {
            refunds: Mutex::new(Vec::new()),
            callback: Mutex::new(None),
        }
    }

    pub fn with_callback(callback: PaymentCallback) -> Self {
        let gateway = Self::new();
        *gateway.callback.lock().unwrap() = Some(callback);
        gateway
    }

    pub fn refund_count(&self) -> usize {
        self.refunds.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for RecordingPaymentGateway {
    async fn request_refund(
        &self,
        instruction: RefundInstruction,
    ) -> Result<(), PaymentGatewayError> {
        self.refunds.lock().unwrap().push(instruction);
        Ok(())
    }

    fn verify_callback(
        &self,
        _payload: &[u8],
        signature: &str,
    ) -> Result<PaymentCallback, PaymentGatewayError> {
        if signature == "valid" {
            self.callback
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| PaymentGatewayError::rejected("no callback configured"))
        } else {
            Err(PaymentGatewayError::invalid_signature())
        }
    }
}

/// Cache over a plain map, counting hits and misses.
pub struct FakeCache {
    entries: Mutex<HashMap<String, String>>,
    pub hits: AtomicI64,
    pub misses: AtomicI64,
}

impl FakeCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hits: AtomicI64::new(0),
            misses: AtomicI64::new(0),
        }
    }

    pub fn hits(&self) -> i64 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn misses(&self) -> i64 {
        self.misses.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Cache for FakeCache {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let value = self.entries.lock().unwrap().get(key).cloned();
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::SeqCst);
        } else {
            self.misses.fetch_add(1, Ordering::SeqCst);
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, _ttl_secs: u64) -> Result<(), DomainError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
