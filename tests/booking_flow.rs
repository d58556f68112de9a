//! End-to-end booking lifecycle tests.
//!
//! Drives the application handlers through the full flow a real request
//! sequence would take: create, confirm, assign, payment callback, start,
//! complete, rate, plus the cancellation/refund path. Uses in-memory
//! implementations of the ports so no external services are required.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use service_booking::application::handlers::booking::{
    Actor, CreateBookingCommand, CreateBookingHandler, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, RecordRatingCommand, RecordRatingHandler,
    TransitionBookingCommand, TransitionBookingHandler,
};
use service_booking::domain::booking::{
    Booking, BookingCode, BookingEvent, BookingStatus, CancellationRequest, CancelledBy,
    PaymentStatus, TimeSlot, Trigger,
};
use service_booking::domain::foundation::{
    AddressId, BookingId, DomainError, ErrorCode, ExternalId, Money, ServiceId, Timestamp, UserId,
};
use service_booking::domain::user::{User, UserRole};
use service_booking::ports::{
    BookingRepository, EventPublisher, PaymentCallback, PaymentCallbackKind, PaymentGateway,
    PaymentGatewayError, ReferenceChecker, RefundInstruction, CODE_CONSTRAINT_DETAIL,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// In-memory booking store with the same version semantics as Postgres.
struct TestRepository {
    bookings: Mutex<HashMap<i64, Booking>>,
    next_id: AtomicI64,
    // When set, external-id reads return this snapshot so two callers can
    // both read the same stale version. Writes still hit the real store.
    pinned_read: Mutex<Option<Booking>>,
}

impl TestRepository {
    fn new() -> Self {
        Self {
            bookings: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            pinned_read: Mutex::new(None),
        }
    }

    fn stored(&self, id: BookingId) -> Option<Booking> {
        self.bookings.lock().unwrap().get(&id.value()).cloned()
    }

    fn pin_reads(&self, snapshot: Booking) {
        *self.pinned_read.lock().unwrap() = Some(snapshot);
    }
}

#[async_trait]
impl BookingRepository for TestRepository {
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
        let mut bookings = self.bookings.lock().unwrap();
        if bookings
            .values()
            .any(|b| b.booking_code == booking.booking_code)
        {
            return Err(DomainError::conflict("duplicate booking_code")
                .with_detail(CODE_CONSTRAINT_DETAIL, "booking_code"));
        }
        let mut stored = booking.clone();
        stored.id = Some(BookingId::new(self.next_id.fetch_add(1, Ordering::SeqCst)));
        bookings.insert(stored.id.unwrap().value(), stored.clone());
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
            return Err(DomainError::conflict("booking version changed"));
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

/// Reference data for the world the bookings live in.
struct TestReferences {
    users: HashMap<i64, User>,
    services: HashSet<i64>,
    addresses: HashMap<i64, i64>,
}

impl TestReferences {
    fn new() -> Self {
        Self {
            users: HashMap::new(),
            services: HashSet::new(),
            addresses: HashMap::new(),
        }
    }

    fn with_user(mut self, id: i64, role: UserRole) -> Self {
        let now = Timestamp::now();
        self.users.insert(
            id,
            User {
                id: UserId::new(id),
                external_id: ExternalId::new(),
                name: format!("user-{}", id),
                email: format!("user{}@example.com", id),
                role,
                is_active: true,
                deleted_at: None,
                created_at: now,
                updated_at: now,
            },
        );
        self
    }

    fn with_service(mut self, id: i64) -> Self {
        self.services.insert(id);
        self
    }

    fn with_address(mut self, id: i64, owner: i64) -> Self {
        self.addresses.insert(id, owner);
        self
    }
}

#[async_trait]
impl ReferenceChecker for TestReferences {
    async fn find_live_user(&self, id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self.users.get(&id.value()).cloned())
    }

    async fn service_is_active(&self, id: ServiceId) -> Result<bool, DomainError> {
        Ok(self.services.contains(&id.value()))
    }

    async fn address_owner(&self, id: AddressId) -> Result<Option<UserId>, DomainError> {
        Ok(self.addresses.get(&id.value()).copied().map(UserId::new))
    }
}

struct RecordingPublisher {
    events: Mutex<Vec<BookingEvent>>,
}

impl RecordingPublisher {
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    fn event_names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: BookingEvent) -> Result<(), DomainError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

struct TestGateway {
    refunds: Mutex<Vec<RefundInstruction>>,
    callback: Mutex<Option<PaymentCallback>>,
}

impl TestGateway {
    fn new() -> Self {
        Self {
            refunds: Mutex::new(Vec::new()),
            callback: Mutex::new(None),
        }
    }

    fn set_callback(&self, callback: PaymentCallback) {
        *self.callback.lock().unwrap() = Some(callback);
    }

    fn refunds(&self) -> Vec<RefundInstruction> {
        self.refunds.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for TestGateway {
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
        if signature != "valid" {
            return Err(PaymentGatewayError::invalid_signature());
        }
        self.callback
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| PaymentGatewayError::rejected("no callback configured"))
    }
}

// =============================================================================
// Fixture
// =============================================================================

const CUSTOMER: i64 = 1;
const PROVIDER: i64 = 2;
const SERVICE: i64 = 10;
const ADDRESS: i64 = 100;

struct Fixture {
    repository: Arc<TestRepository>,
    gateway: Arc<TestGateway>,
    publisher: Arc<RecordingPublisher>,
    create: CreateBookingHandler,
    transition: TransitionBookingHandler,
    rating: RecordRatingHandler,
    webhook: HandlePaymentWebhookHandler,
}

impl Fixture {
    fn new() -> Self {
        let repository = Arc::new(TestRepository::new());
        let references = Arc::new(
            TestReferences::new()
                .with_user(CUSTOMER, UserRole::Customer)
                .with_user(PROVIDER, UserRole::Provider)
                .with_service(SERVICE)
                .with_address(ADDRESS, CUSTOMER),
        );
        let gateway = Arc::new(TestGateway::new());
        let publisher = Arc::new(RecordingPublisher::new());

        let create = CreateBookingHandler::new(
            repository.clone(),
            references.clone(),
            publisher.clone(),
        );
        let transition = TransitionBookingHandler::new(
            repository.clone(),
            references,
            gateway.clone(),
            publisher.clone(),
        );
        let rating = RecordRatingHandler::new(repository.clone(), publisher.clone());
        let webhook = HandlePaymentWebhookHandler::new(
            repository.clone(),
            gateway.clone(),
            publisher.clone(),
        );

        Self {
            repository,
            gateway,
            publisher,
            create,
            transition,
            rating,
            webhook,
        }
    }

    async fn create_booking(&self) -> Booking {
        self.create
            .handle(CreateBookingCommand {
                customer_id: UserId::new(CUSTOMER),
                service_id: ServiceId::new(SERVICE),
                address_id: AddressId::new(ADDRESS),
                schedule_date: Timestamp::now().add_days(3).date(),
                schedule_time: TimeSlot::parse("09:00-11:00").unwrap(),
                preferred_time: None,
                base_price: Money::parse("base_price", "1200.00").unwrap(),
                addons_total: Money::parse("addons_total", "200.00").unwrap(),
                discount_amount: Money::parse("discount_amount", "50.00").unwrap(),
                tax_amount: Money::parse("tax_amount", "150.00").unwrap(),
                special_instructions: None,
            })
            .await
            .expect("create booking")
    }

    async fn trigger(
        &self,
        booking: &Booking,
        trigger: Trigger,
        actor_id: i64,
        role: UserRole,
    ) -> Result<Booking, DomainError> {
        self.transition
            .handle(TransitionBookingCommand {
                external_id: booking.external_id,
                trigger,
                actor: Actor {
                    user_id: UserId::new(actor_id),
                    role,
                },
                provider_id: (trigger == Trigger::Assign).then(|| UserId::new(PROVIDER)),
                cancellation: None,
            })
            .await
    }

    async fn deliver_payment(&self, booking: &Booking, kind: PaymentCallbackKind) -> Booking {
        self.gateway.set_callback(PaymentCallback {
            booking_external_id: booking.external_id,
            kind,
            payment_method: Some("card".to_string()),
            payment_id: Some("pay_789".to_string()),
        });
        self.webhook
            .handle(HandlePaymentWebhookCommand {
                payload: b"{}".to_vec(),
                signature: "valid".to_string(),
            })
            .await
            .expect("payment callback")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn full_lifecycle_from_create_to_rating() {
    let fx = Fixture::new();

    let booking = fx.create_booking().await;
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.version, 0);
    assert_eq!(format!("{}", booking.total_amount), "1500.00");

    let booking = fx
        .trigger(&booking, Trigger::Confirm, CUSTOMER, UserRole::Customer)
        .await
        .expect("confirm");
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.version, 1);

    let booking = fx
        .trigger(&booking, Trigger::Assign, PROVIDER, UserRole::Provider)
        .await
        .expect("assign");
    assert_eq!(booking.status, BookingStatus::Assigned);
    assert_eq!(booking.provider_id, Some(UserId::new(PROVIDER)));

    let booking = fx
        .deliver_payment(&booking, PaymentCallbackKind::Succeeded)
        .await;
    assert_eq!(booking.payment_status, PaymentStatus::Paid);
    assert_eq!(booking.payment_id.as_deref(), Some("pay_789"));

    let booking = fx
        .trigger(&booking, Trigger::Start, PROVIDER, UserRole::Provider)
        .await
        .expect("start");
    assert_eq!(booking.status, BookingStatus::Ongoing);
    assert!(booking.start_time.is_some());

    let booking = fx
        .trigger(&booking, Trigger::Complete, PROVIDER, UserRole::Provider)
        .await
        .expect("complete");
    assert_eq!(booking.status, BookingStatus::Completed);
    assert!(booking.end_time.is_some());

    let booking = fx
        .rating
        .handle(RecordRatingCommand {
            external_id: booking.external_id,
            rater_id: UserId::new(CUSTOMER),
            rater_role: UserRole::Customer,
            rating: 5,
            feedback: Some("great work".to_string()),
        })
        .await
        .expect("rate");
    assert_eq!(booking.provider_rating.map(|r| r.value()), Some(5));

    assert_eq!(
        fx.publisher.event_names(),
        vec![
            "booking.created",
            "booking.status_changed",
            "booking.status_changed",
            "booking.payment_recorded",
            "booking.status_changed",
            "booking.status_changed",
            "booking.rating_recorded",
        ]
    );
    assert!(fx.gateway.refunds().is_empty());
}

#[tokio::test]
async fn cancelling_a_paid_booking_requests_a_refund() {
    let fx = Fixture::new();

    let booking = fx.create_booking().await;
    let booking = fx
        .trigger(&booking, Trigger::Confirm, CUSTOMER, UserRole::Customer)
        .await
        .expect("confirm");
    let booking = fx
        .deliver_payment(&booking, PaymentCallbackKind::Succeeded)
        .await;

    let cancelled = fx
        .transition
        .handle(TransitionBookingCommand {
            external_id: booking.external_id,
            trigger: Trigger::Cancel,
            actor: Actor {
                user_id: UserId::new(CUSTOMER),
                role: UserRole::Customer,
            },
            provider_id: None,
            cancellation: Some(CancellationRequest {
                reason: "plans changed".to_string(),
                cancelled_by: CancelledBy::Customer,
                charge: Money::parse("cancellation_charge", "100.00").unwrap(),
            }),
        })
        .await
        .expect("cancel");

    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.cancelled_by, Some(CancelledBy::Customer));

    let refunds = fx.gateway.refunds();
    assert_eq!(refunds.len(), 1);
    assert_eq!(format!("{}", refunds[0].amount), "1400.00");
    assert_eq!(refunds[0].payment_id.as_deref(), Some("pay_789"));

    let names = fx.publisher.event_names();
    assert_eq!(names.last(), Some(&"booking.cancelled"));
}

#[tokio::test]
async fn unpaid_cancellation_needs_no_refund() {
    let fx = Fixture::new();

    let booking = fx.create_booking().await;
    let cancelled = fx
        .transition
        .handle(TransitionBookingCommand {
            external_id: booking.external_id,
            trigger: Trigger::Cancel,
            actor: Actor {
                user_id: UserId::new(CUSTOMER),
                role: UserRole::Customer,
            },
            provider_id: None,
            cancellation: Some(CancellationRequest {
                reason: "booked by mistake".to_string(),
                cancelled_by: CancelledBy::Customer,
                charge: Money::ZERO,
            }),
        })
        .await
        .expect("cancel");

    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(fx.gateway.refunds().is_empty());
}

#[tokio::test]
async fn failed_payment_blocks_completion() {
    let fx = Fixture::new();

    let booking = fx.create_booking().await;
    let booking = fx
        .trigger(&booking, Trigger::Confirm, CUSTOMER, UserRole::Customer)
        .await
        .expect("confirm");
    let booking = fx
        .trigger(&booking, Trigger::Assign, PROVIDER, UserRole::Provider)
        .await
        .expect("assign");
    let booking = fx
        .deliver_payment(&booking, PaymentCallbackKind::Failed)
        .await;
    assert_eq!(booking.payment_status, PaymentStatus::Failed);

    let booking = fx
        .trigger(&booking, Trigger::Start, PROVIDER, UserRole::Provider)
        .await
        .expect("start");

    let err = fx
        .trigger(&booking, Trigger::Complete, PROVIDER, UserRole::Provider)
        .await
        .expect_err("complete with failed payment");
    assert_eq!(err.code, ErrorCode::InvalidState);
}

#[tokio::test]
async fn concurrent_transitions_let_exactly_one_win() {
    let fx = Fixture::new();

    let booking = fx.create_booking().await;

    // Pin reads to the version-0 snapshot so both writers plan against the
    // same state, the way two racing requests would.
    fx.repository.pin_reads(booking.clone());

    let confirmed = fx
        .trigger(&booking, Trigger::Confirm, CUSTOMER, UserRole::Customer)
        .await
        .expect("first writer wins");
    assert_eq!(confirmed.version, 1);

    let err = fx
        .transition
        .handle(TransitionBookingCommand {
            external_id: booking.external_id,
            trigger: Trigger::Cancel,
            actor: Actor {
                user_id: UserId::new(CUSTOMER),
                role: UserRole::Customer,
            },
            provider_id: None,
            cancellation: Some(CancellationRequest {
                reason: "changed my mind".to_string(),
                cancelled_by: CancelledBy::Customer,
                charge: Money::ZERO,
            }),
        })
        .await
        .expect_err("second writer must lose");
    assert_eq!(err.code, ErrorCode::Conflict);

    let stored = fx.repository.stored(BookingId::new(1)).expect("stored");
    assert_eq!(stored.status, BookingStatus::Confirmed);
    assert_eq!(stored.version, 1);
}
