//! HTTP handlers for booking endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::booking::{
    invalidate_cached_booking, Actor, CreateBookingCommand, CreateBookingHandler,
    GetBookingHandler, GetBookingQuery, HandlePaymentWebhookCommand, HandlePaymentWebhookHandler,
    ListBookingsHandler, ListBookingsQuery, RecordRatingCommand, RecordRatingHandler,
    TransitionBookingCommand, TransitionBookingHandler,
};
use crate::domain::booking::{CancellationRequest, CancelledBy, TimeSlot, Trigger};
use crate::domain::foundation::{
    AddressId, DomainError, ExternalId, Money, ServiceId, UserId,
};
use crate::domain::user::UserRole;
use crate::ports::Cache;

use super::dto::{
    map_domain_error, AssignProviderRequest, BookingListResponse, BookingResponse,
    CancelBookingRequest, CreateBookingRequest, ErrorResponse, ListBookingsParams,
    RateBookingRequest,
};

/// Signature header carried by payment gateway callbacks.
const PAYMENT_SIGNATURE_HEADER: &str = "x-payment-signature";

#[derive(Clone)]
pub struct BookingHandlers {
    create_handler: Arc<CreateBookingHandler>,
    transition_handler: Arc<TransitionBookingHandler>,
    rating_handler: Arc<RecordRatingHandler>,
    get_handler: Arc<GetBookingHandler>,
    list_handler: Arc<ListBookingsHandler>,
    webhook_handler: Arc<HandlePaymentWebhookHandler>,
    cache: Arc<dyn Cache>,
}

impl BookingHandlers {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        create_handler: Arc<CreateBookingHandler>,
        transition_handler: Arc<TransitionBookingHandler>,
        rating_handler: Arc<RecordRatingHandler>,
        get_handler: Arc<GetBookingHandler>,
        list_handler: Arc<ListBookingsHandler>,
        webhook_handler: Arc<HandlePaymentWebhookHandler>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self {
            create_handler,
            transition_handler,
            rating_handler,
            get_handler,
            list_handler,
            webhook_handler,
            cache,
        }
    }
}

fn error_response(err: DomainError) -> Response {
    let (status, body) = map_domain_error(&err);
    (status, Json(body)).into_response()
}

fn parse_external_id(raw: &str) -> Result<ExternalId, Response> {
    raw.parse::<ExternalId>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("Invalid booking id")),
        )
            .into_response()
    })
}

fn parse_money(field: &'static str, raw: Option<&str>) -> Result<Money, DomainError> {
    match raw {
        Some(raw) => Money::parse(field, raw).map_err(DomainError::from),
        None => Ok(Money::ZERO),
    }
}

/// POST /api/bookings - create a booking for the authenticated customer.
pub async fn create_booking(
    State(handlers): State<BookingHandlers>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<CreateBookingRequest>,
) -> Response {
    let cmd = {
        let schedule_time = match TimeSlot::parse(req.schedule_time) {
            Ok(slot) => slot,
            Err(e) => return error_response(e.into()),
        };
        let parsed = (|| {
            Ok::<_, DomainError>(CreateBookingCommand {
                customer_id: user.id,
                service_id: ServiceId::new(req.service_id),
                address_id: AddressId::new(req.address_id),
                schedule_date: req.schedule_date,
                schedule_time,
                preferred_time: req.preferred_time,
                base_price: Money::parse("base_price", &req.base_price)?,
                addons_total: parse_money("addons_total", req.addons_total.as_deref())?,
                discount_amount: parse_money("discount_amount", req.discount_amount.as_deref())?,
                tax_amount: parse_money("tax_amount", req.tax_amount.as_deref())?,
                special_instructions: req.special_instructions,
            })
        })();
        match parsed {
            Ok(cmd) => cmd,
            Err(e) => return error_response(e),
        }
    };

    match handlers.create_handler.handle(cmd).await {
        Ok(booking) => (StatusCode::CREATED, Json(BookingResponse::from(booking))).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/bookings/:id - fetch one booking.
pub async fn get_booking(
    State(handlers): State<BookingHandlers>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Response {
    let external_id = match parse_external_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let query = GetBookingQuery {
        external_id,
        requester_id: user.id,
        requester_role: user.role,
    };
    match handlers.get_handler.handle(query).await {
        Ok(booking) => (StatusCode::OK, Json(BookingResponse::from(booking))).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/bookings - list the authenticated user's bookings.
pub async fn list_bookings(
    State(handlers): State<BookingHandlers>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<ListBookingsParams>,
) -> Response {
    let query = ListBookingsQuery {
        requester_id: user.id,
        requester_role: user.role,
        for_user: params.user_id.map(UserId::new),
        status: params.status,
    };
    match handlers.list_handler.handle(query).await {
        Ok(bookings) => {
            let bookings: Vec<BookingResponse> =
                bookings.into_iter().map(BookingResponse::from).collect();
            let total = bookings.len();
            (StatusCode::OK, Json(BookingListResponse { bookings, total })).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn run_transition(
    handlers: &BookingHandlers,
    cmd: TransitionBookingCommand,
) -> Response {
    let external_id = cmd.external_id;
    match handlers.transition_handler.handle(cmd).await {
        Ok(booking) => {
            invalidate_cached_booking(handlers.cache.as_ref(), &external_id).await;
            (StatusCode::OK, Json(BookingResponse::from(booking))).into_response()
        }
        Err(e) => error_response(e),
    }
}

macro_rules! simple_transition {
    ($name:ident, $trigger:expr, $doc:literal) => {
        #[doc = $doc]
        pub async fn $name(
            State(handlers): State<BookingHandlers>,
            RequireAuth(user): RequireAuth,
            Path(id): Path<String>,
        ) -> Response {
            let external_id = match parse_external_id(&id) {
                Ok(id) => id,
                Err(resp) => return resp,
            };
            let cmd = TransitionBookingCommand {
                external_id,
                trigger: $trigger,
                actor: Actor {
                    user_id: user.id,
                    role: user.role,
                },
                provider_id: None,
                cancellation: None,
            };
            run_transition(&handlers, cmd).await
        }
    };
}

simple_transition!(
    confirm_booking,
    Trigger::Confirm,
    "POST /api/bookings/:id/confirm"
);
simple_transition!(
    reject_booking,
    Trigger::Reject,
    "POST /api/bookings/:id/reject"
);
simple_transition!(start_booking, Trigger::Start, "POST /api/bookings/:id/start");
simple_transition!(
    complete_booking,
    Trigger::Complete,
    "POST /api/bookings/:id/complete"
);

/// POST /api/bookings/:id/assign - assign a provider.
pub async fn assign_booking(
    State(handlers): State<BookingHandlers>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    Json(req): Json<AssignProviderRequest>,
) -> Response {
    let external_id = match parse_external_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let cmd = TransitionBookingCommand {
        external_id,
        trigger: Trigger::Assign,
        actor: Actor {
            user_id: user.id,
            role: user.role,
        },
        provider_id: Some(UserId::new(req.provider_id)),
        cancellation: None,
    };
    run_transition(&handlers, cmd).await
}

/// POST /api/bookings/:id/cancel - cancel with a reason.
pub async fn cancel_booking(
    State(handlers): State<BookingHandlers>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    Json(req): Json<CancelBookingRequest>,
) -> Response {
    let external_id = match parse_external_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let charge = match parse_money("cancellation_charge", req.cancellation_charge.as_deref()) {
        Ok(charge) => charge,
        Err(e) => return error_response(e),
    };
    let cancelled_by = match user.role {
        UserRole::Customer => CancelledBy::Customer,
        UserRole::Provider => CancelledBy::Provider,
        UserRole::Admin => CancelledBy::Admin,
    };
    let cmd = TransitionBookingCommand {
        external_id,
        trigger: Trigger::Cancel,
        actor: Actor {
            user_id: user.id,
            role: user.role,
        },
        provider_id: None,
        cancellation: Some(CancellationRequest {
            reason: req.reason,
            cancelled_by,
            charge,
        }),
    };
    run_transition(&handlers, cmd).await
}

/// POST /api/bookings/:id/rating - rate a completed booking.
pub async fn rate_booking(
    State(handlers): State<BookingHandlers>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    Json(req): Json<RateBookingRequest>,
) -> Response {
    let external_id = match parse_external_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let cmd = RecordRatingCommand {
        external_id,
        rater_id: user.id,
        rater_role: user.role,
        rating: req.rating,
        feedback: req.feedback,
    };
    match handlers.rating_handler.handle(cmd).await {
        Ok(booking) => {
            invalidate_cached_booking(handlers.cache.as_ref(), &external_id).await;
            (StatusCode::OK, Json(BookingResponse::from(booking))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/webhooks/payments - signed payment callback.
///
/// Unauthenticated; the HMAC signature is the authentication.
pub async fn payment_webhook(
    State(handlers): State<BookingHandlers>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = match headers
        .get(PAYMENT_SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
    {
        Some(sig) => sig.to_string(),
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    code: "INVALID_WEBHOOK_SIGNATURE".to_string(),
                    message: "Missing signature header".to_string(),
                }),
            )
                .into_response()
        }
    };

    let cmd = HandlePaymentWebhookCommand {
        payload: body.to_vec(),
        signature,
    };
    match handlers.webhook_handler.handle(cmd).await {
        Ok(booking) => {
            invalidate_cached_booking(handlers.cache.as_ref(), &booking.external_id).await;
            (
                StatusCode::OK,
                Json(serde_json::json!({ "received": true })),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}
