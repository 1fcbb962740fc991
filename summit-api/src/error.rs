use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use summit_booking::qr::QrError;
use summit_booking::{BookingError, CheckInError};
use summit_core::{constraints, IdentityError, RepoError};
use summit_shared::FieldErrors;
use summit_store::MediaError;

const FORM_INVALID: &str = "Periksa kembali data yang diisi.";
const INTERNAL: &str = "Internal Server Error";

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(FieldErrors),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        AppError::ValidationError(FieldErrors::single(field, message))
    }

    pub fn not_found(message: &str) -> Self {
        AppError::NotFoundError(message.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, fields) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::ValidationError(errors) => (StatusCode::BAD_REQUEST, FORM_INVALID.to_string(), Some(errors)),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string(), None)
            }
            AppError::Anyhow(err) => classify(err),
        };

        let body = match fields {
            Some(fields) => json!({ "error": error_message, "fields": fields }),
            None => json!({ "error": error_message }),
        };

        (status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}

/// Maps a propagated domain error onto a status and a user-facing message.
fn classify(err: anyhow::Error) -> (StatusCode, String, Option<FieldErrors>) {
    if let Some(errors) = err.downcast_ref::<FieldErrors>() {
        return (StatusCode::BAD_REQUEST, FORM_INVALID.to_string(), Some(errors.clone()));
    }

    if let Some(e) = err.downcast_ref::<BookingError>() {
        let status = match e {
            BookingError::ReasonRequired
            | BookingError::MissingPaymentProof
            | BookingError::UnknownStatus(_)
            | BookingError::UnknownPaymentMethod(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::CONFLICT,
        };
        tracing::warn!("booking refused: {}", e);
        return (status, e.to_string(), None);
    }

    if let Some(e) = err.downcast_ref::<CheckInError>() {
        let status = match e {
            CheckInError::BookingNotConfirmed(_) | CheckInError::InvalidTransition { .. } => StatusCode::CONFLICT,
            CheckInError::ForeignParticipant => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
        tracing::warn!("check-in refused: {}", e);
        return (status, e.to_string(), None);
    }

    if let Some(e) = err.downcast_ref::<IdentityError>() {
        let status = match e {
            IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            IdentityError::EmailTaken => StatusCode::CONFLICT,
            IdentityError::UnknownRole(_) => StatusCode::BAD_REQUEST,
            IdentityError::Hashing(_) => {
                tracing::error!("Internal Server Error: {}", e);
                return (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string(), None);
            }
        };
        return (status, e.to_string(), None);
    }

    if let Some(e) = err.downcast_ref::<RepoError>() {
        match e {
            RepoError::Conflict(constraint) => return (StatusCode::CONFLICT, conflict_message(constraint), None),
            RepoError::NotFound => return (StatusCode::NOT_FOUND, "Data tidak ditemukan.".to_string(), None),
            RepoError::Invalid(msg) => return (StatusCode::BAD_REQUEST, msg.clone(), None),
            RepoError::Backend(_) => {}
        }
    }

    if let Some(e) = err.downcast_ref::<MediaError>() {
        match e {
            MediaError::Rejected(upload) => return (StatusCode::BAD_REQUEST, upload.to_string(), None),
            MediaError::BadPath(_) => return (StatusCode::NOT_FOUND, "File tidak ditemukan.".to_string(), None),
            MediaError::Io(_) => {}
        }
    }

    if let Some(e) = err.downcast_ref::<MultipartError>() {
        return (StatusCode::BAD_REQUEST, e.body_text(), None);
    }

    if err.downcast_ref::<QrError>().is_some() {
        tracing::error!("QR rendering failed: {:#}", err);
        return (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string(), None);
    }

    tracing::error!("Internal Server Error: {:#}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string(), None)
}

fn conflict_message(constraint: &str) -> String {
    match constraint {
        constraints::USER_EMAIL => IdentityError::EmailTaken.to_string(),
        constraints::CHECKIN_PARTICIPANT => "Peserta ini sudah melakukan check-in.".to_string(),
        _ => "Data sudah ada.".to_string(),
    }
}
