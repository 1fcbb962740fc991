use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use summit_booking::dashboard::CheckInTotals;
use summit_booking::qr::{credential_payload, qr_filename, render_png};
use summit_booking::{Booking, BookingListing, BookingStatus, CheckIn, CheckInError, CheckInListing, Participant};
use summit_core::{constraints, Capability};
use summit_shared::UploadKind;

use crate::bookings::{listing, owned_booking};
use crate::error::AppError;
use crate::middleware::Claims;
use crate::state::AppState;
use crate::upload::{check_file, discard, store_file, MultipartForm};

#[derive(Debug, Serialize)]
struct ParticipantEntry {
    participant: Participant,
    checkin: Option<CheckIn>,
}

#[derive(Debug, Serialize)]
struct CheckInForm {
    booking: BookingListing,
    participants: Vec<ParticipantEntry>,
}

#[derive(Debug, Serialize)]
struct CheckInCreated {
    checkin: CheckIn,
    qr_url: Option<String>,
    next: String,
}

#[derive(Debug, Serialize)]
struct CheckInSuccess {
    checkin: CheckInListing,
    qr_url: Option<String>,
    download_url: String,
}

#[derive(Debug, Serialize)]
struct GroupStatus {
    booking: BookingListing,
    participants: Vec<ParticipantEntry>,
    totals: CheckInTotals,
    not_checked_in: usize,
    all_verified: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScanRequest {
    qr_data: String,
}

#[derive(Debug, Serialize)]
struct ScanResult {
    valid: bool,
    status_label: &'static str,
    checkin: CheckInListing,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/checkins/scan", post(scan))
        .route("/checkins/{id}/form", get(checkin_form).post(submit_checkin))
        .route("/checkins/{id}/success", get(success))
        .route("/checkins/{id}/download-qr", get(download_qr))
        .route("/checkins/{id}/group-status", get(group_status))
}

fn media_url(path: &Option<String>) -> Option<String> {
    path.as_ref().map(|p| format!("/media/{}", p))
}

async fn roster_with_checkins(state: &AppState, booking_id: Uuid) -> Result<Vec<ParticipantEntry>, AppError> {
    let mut entries = Vec::new();
    for participant in state.bookings.list_participants(booking_id).await? {
        let checkin = state.checkins.find_by_participant(participant.id).await?;
        entries.push(ParticipantEntry { participant, checkin });
    }
    Ok(entries)
}

fn ensure_confirmed(booking: &Booking) -> Result<(), CheckInError> {
    if booking.status == BookingStatus::Confirmed {
        Ok(())
    } else {
        Err(CheckInError::BookingNotConfirmed(booking.status))
    }
}

async fn checkin_form(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<CheckInForm>, AppError> {
    claims.require(Capability::SubmitCheckIn)?;
    let booking = owned_booking(&state, &claims, booking_id).await?;
    ensure_confirmed(&booking)?;

    Ok(Json(CheckInForm {
        booking: listing(&state, booking_id).await?,
        participants: roster_with_checkins(&state, booking_id).await?,
    }))
}

async fn submit_checkin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CheckInCreated>), AppError> {
    claims.require(Capability::SubmitCheckIn)?;
    let booking = owned_booking(&state, &claims, booking_id).await?;
    ensure_confirmed(&booking)?;

    let mut form = MultipartForm::read(multipart).await?;
    let participant_id = form
        .text("participant_id")
        .parse::<Uuid>()
        .map_err(|_| AppError::field("participant_id", "Pilih peserta yang akan check-in."))?;
    let participant = state
        .bookings
        .get_participant(participant_id)
        .await?
        .filter(|p| p.booking_id == booking.id)
        .ok_or(CheckInError::ForeignParticipant)?;

    if state.checkins.find_by_participant(participant.id).await?.is_some() {
        return Err(AppError::ConflictError("Peserta ini sudah melakukan check-in.".to_string()));
    }

    let id_card = form.take_file("id_card_photo");
    if id_card.is_none() {
        return Err(AppError::field("id_card_photo", CheckInError::MissingIdCard.to_string()));
    }
    let selfie = form.take_file("selfie_photo");
    check_file(UploadKind::IdCard, "id_card_photo", id_card.as_ref())?;
    check_file(UploadKind::Selfie, "selfie_photo", selfie.as_ref())?;

    let id_card_photo = store_file(&state.media, UploadKind::IdCard, "id_card_photo", id_card)
        .await?
        .unwrap_or_default();
    let selfie_photo = match store_file(&state.media, UploadKind::Selfie, "selfie_photo", selfie).await {
        Ok(path) => path,
        Err(e) => {
            discard(&state.media, &[Some(id_card_photo.as_str())]).await;
            return Err(e);
        }
    };
    let notes = form.text("notes").trim().to_string();

    let inserted = insert_checkin(
        &state,
        &booking,
        &participant,
        id_card_photo.clone(),
        selfie_photo.clone(),
        notes,
    )
    .await;
    let mut checkin = match inserted {
        Ok(checkin) => checkin,
        Err(e) => {
            discard(&state.media, &[Some(id_card_photo.as_str()), selfie_photo.as_deref()]).await;
            return Err(e);
        }
    };
    attach_qr(&state, &booking, &mut checkin).await;
    info!(
        checkin_id = %checkin.id,
        booking_code = %booking.booking_code,
        participant_id = %participant.id,
        "check-in submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(CheckInCreated {
            qr_url: media_url(&checkin.qr_code),
            next: format!("/checkins/{}/success", checkin.id),
            checkin,
        }),
    ))
}

/// Creates the check-in with a fresh credential, redrawing the payload when
/// it collides with an existing one.
async fn insert_checkin(
    state: &AppState,
    booking: &Booking,
    participant: &Participant,
    id_card_photo: String,
    selfie_photo: Option<String>,
    notes: String,
) -> Result<CheckIn, AppError> {
    for attempt in 1..=state.rules.code_retry_attempts.max(1) {
        let payload = credential_payload(&booking.booking_code, participant.id_number());
        let mut checkin = CheckIn::new(
            booking,
            participant,
            id_card_photo.clone(),
            selfie_photo.clone(),
            payload,
        )?;
        checkin.notes = notes.clone();

        match state.checkins.create_checkin(&checkin).await {
            Ok(()) => return Ok(checkin),
            Err(e) if e.is_conflict_on(constraints::CHECKIN_QR_DATA) => {
                warn!(attempt, participant_id = %participant.id, "check-in payload collision");
            }
            Err(e) if e.is_conflict_on(constraints::CHECKIN_PARTICIPANT) => {
                return Err(AppError::ConflictError("Peserta ini sudah melakukan check-in.".to_string()));
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(AppError::ConflictError(
        "Gagal membuat QR code. Silakan coba lagi.".to_string(),
    ))
}

/// Writes the QR image for a stored check-in. Without it the download
/// renders the code on the fly, so a failure here only logs.
async fn attach_qr(state: &AppState, booking: &Booking, checkin: &mut CheckIn) {
    let filename = qr_filename(&booking.booking_code, checkin.participant_id);
    let stored = match render_png(&checkin.qr_data) {
        Ok(png) => state
            .media
            .save_generated(UploadKind::QrCode, &filename, &png)
            .await
            .map_err(anyhow::Error::from),
        Err(e) => Err(e.into()),
    };
    let path = match stored {
        Ok(path) => path,
        Err(e) => {
            warn!(checkin_id = %checkin.id, error = %e, "could not store QR image");
            return;
        }
    };

    checkin.qr_code = Some(path);
    if let Err(e) = state.checkins.update_checkin(checkin).await {
        warn!(checkin_id = %checkin.id, error = %e, "could not record QR image path");
        checkin.qr_code = None;
    }
}

async fn owned_checkin(state: &AppState, claims: &Claims, id: Uuid) -> Result<CheckIn, AppError> {
    let checkin = state
        .checkins
        .get_checkin(id)
        .await?
        .ok_or_else(|| AppError::not_found("Check-in tidak ditemukan."))?;
    owned_booking(state, claims, checkin.booking_id).await?;
    Ok(checkin)
}

async fn success(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckInSuccess>, AppError> {
    claims.require(Capability::SubmitCheckIn)?;
    let checkin = owned_checkin(&state, &claims, id).await?;
    let listing = state
        .checkins
        .get_checkin_listing(checkin.id)
        .await?
        .ok_or_else(|| AppError::not_found("Check-in tidak ditemukan."))?;

    Ok(Json(CheckInSuccess {
        qr_url: media_url(&checkin.qr_code),
        download_url: format!("/checkins/{}/download-qr", checkin.id),
        checkin: listing,
    }))
}

async fn download_qr(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::SubmitCheckIn)?;
    let checkin = owned_checkin(&state, &claims, id).await?;
    let booking = state
        .bookings
        .get_booking(checkin.booking_id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking tidak ditemukan."))?;

    let png = match &checkin.qr_code {
        Some(path) => state.media.read(path).await?,
        // Older records without a stored image: render on the fly.
        None => render_png(&checkin.qr_data)?,
    };
    let disposition = format!(
        "attachment; filename=\"{}\"",
        qr_filename(&booking.booking_code, checkin.participant_id)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        png,
    ))
}

async fn group_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<GroupStatus>, AppError> {
    claims.require(Capability::SubmitCheckIn)?;
    owned_booking(&state, &claims, booking_id).await?;

    let participants = roster_with_checkins(&state, booking_id).await?;
    let totals = CheckInTotals::tally(participants.iter().filter_map(|p| p.checkin.as_ref().map(|c| &c.status)));
    let not_checked_in = participants.len() - totals.total;

    Ok(Json(GroupStatus {
        booking: listing(&state, booking_id).await?,
        all_verified: !participants.is_empty() && totals.verified == participants.len(),
        not_checked_in,
        totals,
        participants,
    }))
}

async fn scan(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ScanRequest>,
) -> Result<Json<ScanResult>, AppError> {
    claims.require(Capability::ScanCredentials)?;
    let checkin = state
        .checkins
        .find_by_qr_data(req.qr_data.trim())
        .await?
        .ok_or_else(|| AppError::not_found("QR code tidak valid."))?;
    let listing = state
        .checkins
        .get_checkin_listing(checkin.id)
        .await?
        .ok_or_else(|| AppError::not_found("QR code tidak valid."))?;
    info!(checkin_id = %checkin.id, scanned_by = %claims.sub, "credential scanned");

    Ok(Json(ScanResult {
        valid: true,
        status_label: checkin.status.label(),
        checkin: listing,
    }))
}
