use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use summit_booking::dashboard::{reports, staff_overview, CheckInTotals, Report, StaffOverview};
use summit_booking::{
    BookingEvent, BookingFilter, BookingListing, BookingQuery, BookingStatus, CheckInEvent, CheckInFilter, CheckInListing,
    CheckInStatus, Participant,
};
use summit_core::Capability;
use summit_shared::models::{Actor, CheckInReviewed};

use crate::bookings::{listing, log_transition};
use crate::error::AppError;
use crate::middleware::Claims;
use crate::state::AppState;

/// Cancellation reason recorded when staff reject a payment without one.
const DEFAULT_PAYMENT_REJECTION: &str = "Pembayaran tidak valid";

#[derive(Debug, Serialize)]
struct BookingList {
    bookings: Vec<BookingListing>,
    count: usize,
    statuses: Vec<StatusOption>,
}

#[derive(Debug, Serialize)]
struct StatusOption {
    value: &'static str,
    label: &'static str,
}

#[derive(Debug, Serialize)]
struct BookingReview {
    booking: BookingListing,
    participants: Vec<Participant>,
    payment_proof_url: Option<String>,
    status_label: &'static str,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum BookingAction {
    Confirm,
    Reject,
    Complete,
}

#[derive(Debug, Deserialize)]
struct BookingDecision {
    action: BookingAction,
    #[serde(default)]
    reason: String,
    admin_notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CheckInQuery {
    /// Absent means `pending`; `all` lifts the status filter.
    status: Option<String>,
    search: Option<String>,
}

#[derive(Debug, Serialize)]
struct CheckInList {
    checkins: Vec<CheckInListing>,
    status_filter: Option<CheckInStatus>,
    totals: CheckInTotals,
}

#[derive(Debug, Serialize)]
struct CheckInReview {
    checkin: CheckInListing,
    id_card_url: String,
    selfie_url: Option<String>,
    qr_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum CheckInAction {
    Verify,
    Reject,
}

#[derive(Debug, Deserialize)]
struct CheckInDecision {
    action: CheckInAction,
    #[serde(default)]
    reason: String,
    notes: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/admin", get(overview))
        .route("/dashboard/admin/bookings", get(bookings))
        .route("/dashboard/admin/bookings/{id}/verify", get(booking_review).post(decide_booking))
        .route("/dashboard/admin/checkins", get(checkins))
        .route("/dashboard/admin/checkins/{id}/verify", get(checkin_review).post(decide_checkin))
        .route("/dashboard/admin/reports", get(report))
}

fn media_url(path: &str) -> String {
    format!("/media/{}", path)
}

async fn overview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<StaffOverview>, AppError> {
    claims.require(Capability::ViewStaffDashboard)?;
    let all = state.bookings.list_bookings(&BookingFilter::default()).await?;
    let pending = CheckInFilter {
        status: Some(CheckInStatus::Pending),
        ..Default::default()
    };
    let pending_checkins = state.checkins.list_checkins(&pending).await?.len();
    let routes = state.catalog.list_route_listings().await?;

    Ok(Json(staff_overview(&all, &routes, pending_checkins, Utc::now().date_naive())))
}

async fn bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<BookingQuery>,
) -> Result<Json<BookingList>, AppError> {
    claims.require(Capability::ReviewBookings)?;
    let filter = query.into_filter()?;
    let bookings = state.bookings.list_bookings(&filter).await?;

    Ok(Json(BookingList {
        count: bookings.len(),
        bookings,
        statuses: BookingStatus::ALL
            .into_iter()
            .map(|s| StatusOption {
                value: s.as_str(),
                label: s.label(),
            })
            .collect(),
    }))
}

async fn booking_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingReview>, AppError> {
    claims.require(Capability::ReviewBookings)?;
    let booking = listing(&state, id).await?;
    let participants = state.bookings.list_participants(id).await?;

    Ok(Json(BookingReview {
        payment_proof_url: booking.booking.payment_proof.as_deref().map(media_url),
        status_label: booking.booking.status.label(),
        booking,
        participants,
    }))
}

async fn decide_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(decision): Json<BookingDecision>,
) -> Result<Json<BookingListing>, AppError> {
    claims.require(Capability::ReviewBookings)?;
    let mut booking = state
        .bookings
        .get_booking(id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking tidak ditemukan."))?;

    let event = match decision.action {
        BookingAction::Confirm => BookingEvent::Confirm,
        BookingAction::Complete => BookingEvent::Complete,
        BookingAction::Reject => {
            let reason = decision.reason.trim();
            BookingEvent::Cancel {
                reason: if reason.is_empty() {
                    DEFAULT_PAYMENT_REJECTION.to_string()
                } else {
                    reason.to_string()
                },
            }
        }
    };

    let from = booking.apply(event, Utc::now())?;
    if let Some(notes) = decision.admin_notes {
        booking.admin_notes = notes.trim().to_string();
    }
    state.bookings.update_booking(&booking).await?;
    log_transition(&booking, from, Actor::Staff, claims.sub);

    Ok(Json(listing(&state, id).await?))
}

async fn checkins(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<CheckInQuery>,
) -> Result<Json<CheckInList>, AppError> {
    claims.require(Capability::ReviewCheckIns)?;
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => Some(CheckInStatus::Pending),
        Some("all") => None,
        Some(other) => Some(other.parse::<CheckInStatus>()?),
    };

    let filter = CheckInFilter {
        status,
        search: query.search,
        booking_id: None,
    };
    let totals = CheckInTotals::from_listings(&state.checkins.list_checkins(&CheckInFilter::default()).await?);

    Ok(Json(CheckInList {
        checkins: state.checkins.list_checkins(&filter).await?,
        status_filter: status,
        totals,
    }))
}

async fn checkin_listing(state: &AppState, id: Uuid) -> Result<CheckInListing, AppError> {
    state
        .checkins
        .get_checkin_listing(id)
        .await?
        .ok_or_else(|| AppError::not_found("Check-in tidak ditemukan."))
}

async fn checkin_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckInReview>, AppError> {
    claims.require(Capability::ReviewCheckIns)?;
    let checkin = checkin_listing(&state, id).await?;

    Ok(Json(CheckInReview {
        id_card_url: media_url(&checkin.checkin.id_card_photo),
        selfie_url: checkin.checkin.selfie_photo.as_deref().map(media_url),
        qr_url: checkin.checkin.qr_code.as_deref().map(media_url),
        checkin,
    }))
}

async fn decide_checkin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(decision): Json<CheckInDecision>,
) -> Result<Json<CheckInListing>, AppError> {
    claims.require(Capability::ReviewCheckIns)?;
    let listing = checkin_listing(&state, id).await?;
    let mut checkin = listing.checkin;

    let event = match decision.action {
        CheckInAction::Verify => CheckInEvent::Verify,
        CheckInAction::Reject => CheckInEvent::Reject {
            reason: decision.reason,
        },
    };
    let now = Utc::now();
    checkin.review(event, claims.sub, now)?;
    if let Some(notes) = decision.notes {
        checkin.notes = notes.trim().to_string();
    }
    state.checkins.update_checkin(&checkin).await?;

    let event = CheckInReviewed {
        checkin_id: checkin.id,
        booking_code: listing.booking_code,
        participant_id: checkin.participant_id,
        status: checkin.status.to_string(),
        reviewer_id: claims.sub,
        at: now,
    };
    info!(event = %event.to_json(), "check-in reviewed");

    Ok(Json(checkin_listing(&state, id).await?))
}

async fn report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Report>, AppError> {
    claims.require(Capability::ViewReports)?;
    let all = state.bookings.list_bookings(&BookingFilter::default()).await?;
    let routes = state.catalog.list_route_listings().await?;
    Ok(Json(reports(&all, &routes, Utc::now().date_naive())))
}
