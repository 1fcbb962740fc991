use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use summit_booking::{
    generate_booking_code, status_param, Booking, BookingEvent, BookingFilter, BookingForm, BookingListing,
    BookingStatus, CheckIn, Participant, ParticipantForm, PaymentMethod, ScheduleSelection,
};
use summit_catalog::{package_route_slug, Route, RouteListing};
use summit_core::{constraints, Capability};
use summit_shared::models::{Actor, BookingStatusChanged};
use summit_shared::{FieldErrors, UploadKind};

use crate::error::AppError;
use crate::middleware::Claims;
use crate::state::AppState;
use crate::upload::{store_file, MultipartForm};

#[derive(Debug, Deserialize)]
struct WizardQuery {
    package: Option<String>,
}

#[derive(Debug, Serialize)]
struct WizardStart {
    routes: Vec<RouteListing>,
    selected_route: Option<RouteListing>,
    min_start_date: NaiveDate,
    max_participants: i32,
}

#[derive(Debug, Serialize)]
struct WizardStep {
    booking: BookingListing,
    next: String,
}

#[derive(Debug, Serialize)]
struct ParticipantStep {
    booking: BookingListing,
    participants: Vec<Participant>,
    /// 1-based number of the participant being entered.
    current: usize,
    total: usize,
    roster_complete: bool,
    next: String,
}

#[derive(Debug, Serialize)]
struct ParticipantSaved {
    participant: Participant,
    roster_size: usize,
    total: usize,
    next: String,
}

#[derive(Debug, Serialize)]
struct PaymentStep {
    booking: BookingListing,
    participants: Vec<Participant>,
    total_price: i64,
    payment_methods: Vec<PaymentOption>,
}

#[derive(Debug, Serialize)]
struct PaymentOption {
    value: &'static str,
    label: &'static str,
}

#[derive(Debug, Serialize)]
struct ParticipantCheckIn {
    participant: Participant,
    checkin: Option<CheckIn>,
}

#[derive(Debug, Serialize)]
struct BookingDetail {
    booking: BookingListing,
    participants: Vec<ParticipantCheckIn>,
    status_label: &'static str,
    can_edit: bool,
    can_cancel: bool,
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CancelForm {
    reason: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(my_bookings))
        .route("/bookings/create", get(wizard_start).post(create_booking))
        .route("/bookings/{id}", get(booking_detail))
        .route("/bookings/{id}/participants", get(participant_step).post(add_participant))
        .route("/bookings/{id}/payment", get(payment_step).post(submit_payment))
        .route("/bookings/{id}/cancel", post(cancel_booking))
        .route(
            "/bookings/participants/{id}",
            put(update_participant).delete(delete_participant),
        )
}

fn participants_url(id: Uuid) -> String {
    format!("/bookings/{}/participants", id)
}

fn payment_url(id: Uuid) -> String {
    format!("/bookings/{}/payment", id)
}

fn detail_url(id: Uuid) -> String {
    format!("/bookings/{}", id)
}

/// Loads a booking the caller owns. Someone else's booking reads as missing.
pub(crate) async fn owned_booking(state: &AppState, claims: &Claims, id: Uuid) -> Result<Booking, AppError> {
    state
        .bookings
        .get_booking(id)
        .await?
        .filter(|b| b.is_owned_by(claims.sub))
        .ok_or_else(|| AppError::not_found("Booking tidak ditemukan."))
}

pub(crate) async fn listing(state: &AppState, id: Uuid) -> Result<BookingListing, AppError> {
    state
        .bookings
        .get_listing(id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking tidak ditemukan."))
}

/// Logs a status change in the shared event shape.
pub(crate) fn log_transition(booking: &Booking, from: BookingStatus, actor: Actor, actor_id: Uuid) {
    let reason = (booking.status == BookingStatus::Cancelled).then(|| booking.cancellation_reason.clone());
    let event = BookingStatusChanged {
        booking_id: booking.id,
        booking_code: booking.booking_code.clone(),
        from: from.to_string(),
        to: booking.status.to_string(),
        actor,
        actor_id,
        reason,
        at: booking.updated_at,
    };
    info!(event = %event.to_json(), "booking status changed");
}

async fn wizard_start(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<WizardQuery>,
) -> Result<Json<WizardStart>, AppError> {
    claims.require(Capability::ManageOwnBookings)?;

    let routes = state.catalog.list_route_listings().await?;
    let selected_route = match query.package.as_deref().and_then(package_route_slug) {
        Some(slug) => state.catalog.find_route_by_slug(slug).await?,
        None => None,
    };

    let rules = state.wizard_rules();
    Ok(Json(WizardStart {
        routes,
        selected_route,
        min_start_date: Utc::now().date_naive() + Duration::days(rules.min_lead_days),
        max_participants: rules.max_participants,
    }))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<BookingForm>,
) -> Result<(StatusCode, Json<WizardStep>), AppError> {
    claims.require(Capability::ManageOwnBookings)?;
    let today = Utc::now().date_naive();

    let route = state
        .catalog
        .get_route(form.route_id)
        .await?
        .ok_or_else(|| AppError::field("route_id", "Jalur yang dipilih tidak tersedia."))?
        .route;
    let selection = form.validate(&route, &state.wizard_rules(), today)?;

    let booking = insert_booking(&state, claims.sub, &route, selection, today).await?;
    info!(
        booking_id = %booking.id,
        code = %booking.booking_code,
        participants = booking.num_participants,
        total = booking.total_price(),
        "booking created"
    );

    Ok((
        StatusCode::CREATED,
        Json(WizardStep {
            booking: listing(&state, booking.id).await?,
            next: participants_url(booking.id),
        }),
    ))
}

/// Persists a new booking, drawing a fresh code whenever the last one was taken.
async fn insert_booking(
    state: &AppState,
    user_id: Uuid,
    route: &Route,
    selection: ScheduleSelection,
    today: NaiveDate,
) -> Result<Booking, AppError> {
    for attempt in 1..=state.rules.code_retry_attempts.max(1) {
        let code = generate_booking_code(&state.rules.code_prefix, today);
        let booking = Booking::new(
            code,
            user_id,
            route,
            selection.start_date,
            selection.num_participants,
            selection.notes.clone(),
        );
        match state.bookings.create_booking(&booking).await {
            Ok(()) => return Ok(booking),
            Err(e) if e.is_conflict_on(constraints::BOOKING_CODE) => {
                warn!(attempt, code = %booking.booking_code, "booking code collision");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(AppError::ConflictError(
        "Gagal membuat kode booking. Silakan coba lagi.".to_string(),
    ))
}

async fn participant_step(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ParticipantStep>, AppError> {
    claims.require(Capability::ManageOwnBookings)?;
    let booking = owned_booking(&state, &claims, id).await?;
    booking.ensure_roster_editable()?;

    let participants = state.bookings.list_participants(id).await?;
    let total = usize::try_from(booking.num_participants).unwrap_or(0);
    let roster_complete = participants.len() >= total;

    Ok(Json(ParticipantStep {
        booking: listing(&state, id).await?,
        current: (participants.len() + 1).min(total),
        total,
        roster_complete,
        next: if roster_complete { payment_url(id) } else { participants_url(id) },
        participants,
    }))
}

fn participant_form(form: &MultipartForm) -> ParticipantForm {
    let mut participant = ParticipantForm::default();
    for (name, value) in form.texts() {
        participant.set(name, value.to_string());
    }
    participant
}

async fn add_participant(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ParticipantSaved>), AppError> {
    claims.require(Capability::ManageOwnBookings)?;
    let booking = owned_booking(&state, &claims, id).await?;
    let roster = state.bookings.list_participants(id).await?;
    booking.ensure_can_add_participant(roster.len())?;

    let mut form = MultipartForm::read(multipart).await?;
    let profile = participant_form(&form).validate(&state.wizard_rules(), Utc::now().date_naive())?;
    let certificate = store_file(
        &state.media,
        UploadKind::HealthCertificate,
        "health_certificate",
        form.take_file("health_certificate"),
    )
    .await?;

    let participant = Participant::new(id, profile, certificate);
    state.bookings.add_participant(&participant).await?;

    let roster_size = roster.len() + 1;
    let total = usize::try_from(booking.num_participants).unwrap_or(0);
    info!(booking_id = %id, roster_size, total, "participant added");

    Ok((
        StatusCode::CREATED,
        Json(ParticipantSaved {
            participant,
            roster_size,
            total,
            next: if roster_size >= total { payment_url(id) } else { participants_url(id) },
        }),
    ))
}

async fn payment_step(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentStep>, AppError> {
    claims.require(Capability::ManageOwnBookings)?;
    let booking = owned_booking(&state, &claims, id).await?;
    let participants = state.bookings.list_participants(id).await?;
    booking.ensure_payment_open(participants.len())?;

    let payment_methods = [PaymentMethod::Transfer, PaymentMethod::Ewallet, PaymentMethod::CreditCard]
        .into_iter()
        .map(|m| PaymentOption {
            value: m.as_str(),
            label: m.label(),
        })
        .collect();

    Ok(Json(PaymentStep {
        total_price: booking.total_price(),
        booking: listing(&state, id).await?,
        participants,
        payment_methods,
    }))
}

async fn submit_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<WizardStep>, AppError> {
    claims.require(Capability::ManageOwnBookings)?;
    let mut booking = owned_booking(&state, &claims, id).await?;
    let roster_size = state.bookings.list_participants(id).await?.len();
    booking.ensure_payment_open(roster_size)?;

    let mut form = MultipartForm::read(multipart).await?;
    let mut errors = FieldErrors::new();
    let method = form
        .text("payment_method")
        .parse::<PaymentMethod>()
        .map_err(|e| errors.add("payment_method", e.to_string()))
        .ok();
    let proof_file = form.take_file("payment_proof");
    if proof_file.is_none() {
        errors.add("payment_proof", "Bukti pembayaran wajib diupload.");
    }
    errors.into_result()?;

    let proof = store_file(&state.media, UploadKind::PaymentProof, "payment_proof", proof_file)
        .await?
        .unwrap_or_default();
    let method = method.unwrap_or(PaymentMethod::Transfer);

    let from = booking.apply(
        BookingEvent::SubmitPayment {
            method,
            proof,
            roster_size,
        },
        Utc::now(),
    )?;
    state.bookings.update_booking(&booking).await?;
    log_transition(&booking, from, Actor::Climber, claims.sub);

    Ok(Json(WizardStep {
        booking: listing(&state, id).await?,
        next: detail_url(id),
    }))
}

async fn booking_detail(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingDetail>, AppError> {
    claims.require(Capability::ManageOwnBookings)?;
    let booking = owned_booking(&state, &claims, id).await?;

    let mut participants = Vec::new();
    for participant in state.bookings.list_participants(id).await? {
        let checkin = state.checkins.find_by_participant(participant.id).await?;
        participants.push(ParticipantCheckIn { participant, checkin });
    }

    Ok(Json(BookingDetail {
        booking: listing(&state, id).await?,
        participants,
        status_label: booking.status.label(),
        can_edit: booking.can_edit(),
        can_cancel: booking.can_cancel(),
    }))
}

async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<BookingListing>>, AppError> {
    claims.require(Capability::ManageOwnBookings)?;
    let mut filter = BookingFilter::for_user(claims.sub);
    if let Some(status) = status_param(query.status.as_deref())? {
        filter = filter.with_status(status);
    }
    Ok(Json(state.bookings.list_bookings(&filter).await?))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(form): Json<CancelForm>,
) -> Result<Json<BookingListing>, AppError> {
    claims.require(Capability::ManageOwnBookings)?;
    let mut booking = owned_booking(&state, &claims, id).await?;

    let from = booking.apply(BookingEvent::Cancel { reason: form.reason }, Utc::now())?;
    state.bookings.update_booking(&booking).await?;
    log_transition(&booking, from, Actor::Climber, claims.sub);

    Ok(Json(listing(&state, id).await?))
}

async fn owned_participant(state: &AppState, claims: &Claims, id: Uuid) -> Result<(Participant, Booking), AppError> {
    let participant = state
        .bookings
        .get_participant(id)
        .await?
        .ok_or_else(|| AppError::not_found("Peserta tidak ditemukan."))?;
    let booking = owned_booking(state, claims, participant.booking_id).await?;
    Ok((participant, booking))
}

async fn update_participant(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Participant>, AppError> {
    claims.require(Capability::ManageOwnBookings)?;
    let (mut participant, booking) = owned_participant(&state, &claims, id).await?;
    booking.ensure_roster_editable()?;

    let mut form = MultipartForm::read(multipart).await?;
    let profile = participant_form(&form).validate(&state.wizard_rules(), Utc::now().date_naive())?;
    let certificate = store_file(
        &state.media,
        UploadKind::HealthCertificate,
        "health_certificate",
        form.take_file("health_certificate"),
    )
    .await?;

    participant.update(profile, certificate);
    state.bookings.update_participant(&participant).await?;
    info!(participant_id = %id, booking_id = %booking.id, "participant updated");

    Ok(Json(participant))
}

async fn delete_participant(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardStep>, AppError> {
    claims.require(Capability::ManageOwnBookings)?;
    let (participant, mut booking) = owned_participant(&state, &claims, id).await?;
    let roster_size = state.bookings.list_participants(booking.id).await?.len();
    booking.ensure_can_remove_participant(roster_size)?;

    booking.sync_participant_count(roster_size - 1);
    state.bookings.remove_participant(participant.id, &booking).await?;
    info!(
        participant_id = %id,
        booking_id = %booking.id,
        participants = booking.num_participants,
        "participant removed"
    );

    Ok(Json(WizardStep {
        booking: listing(&state, booking.id).await?,
        next: detail_url(booking.id),
    }))
}
