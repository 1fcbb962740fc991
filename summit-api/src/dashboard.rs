use axum::{
    extract::{Multipart, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use summit_booking::dashboard::{climb_history, climber_overview, ClimbHistory, ClimberOverview};
use summit_booking::{status_param, BookingFilter, BookingListing, BookingStatus};
use summit_core::identity::ProfileUpdate;
use summit_core::{Capability, User};
use summit_shared::UploadKind;

use crate::error::AppError;
use crate::middleware::Claims;
use crate::state::AppState;
use crate::upload::{store_file, MultipartForm};

#[derive(Debug, Serialize)]
struct ClimberDashboard {
    user: User,
    #[serde(flatten)]
    overview: ClimberOverview,
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    status: Option<String>,
}

#[derive(Debug, Serialize)]
struct BookingList {
    bookings: Vec<BookingListing>,
    status_filter: Option<BookingStatus>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/pendaki", get(overview))
        .route("/dashboard/pendaki/bookings", get(bookings))
        .route("/dashboard/pendaki/history", get(history))
        .route("/dashboard/pendaki/profile/edit", post(edit_profile))
}

async fn current_user(state: &AppState, claims: &Claims) -> Result<User, AppError> {
    state
        .users
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::not_found("Akun tidak ditemukan."))
}

async fn overview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ClimberDashboard>, AppError> {
    claims.require(Capability::ViewClimberDashboard)?;
    let user = current_user(&state, &claims).await?;
    let bookings = state.bookings.list_bookings(&BookingFilter::for_user(claims.sub)).await?;

    Ok(Json(ClimberDashboard {
        user,
        overview: climber_overview(&bookings, Utc::now().date_naive()),
    }))
}

async fn bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<BookingList>, AppError> {
    claims.require(Capability::ViewClimberDashboard)?;
    let status = status_param(query.status.as_deref())?;
    let mut filter = BookingFilter::for_user(claims.sub);
    if let Some(status) = status {
        filter = filter.with_status(status);
    }

    Ok(Json(BookingList {
        bookings: state.bookings.list_bookings(&filter).await?,
        status_filter: status,
    }))
}

async fn history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ClimbHistory>, AppError> {
    claims.require(Capability::ViewClimberDashboard)?;
    let filter = BookingFilter::for_user(claims.sub).with_status(BookingStatus::Completed);
    let bookings = state.bookings.list_bookings(&filter).await?;
    Ok(Json(climb_history(&bookings)))
}

async fn edit_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<Json<User>, AppError> {
    claims.require(Capability::EditOwnProfile)?;
    let mut user = current_user(&state, &claims).await?;

    let mut form = MultipartForm::read(multipart).await?;
    let edit = ProfileUpdate {
        first_name: form.text("first_name").to_string(),
        last_name: form.text("last_name").to_string(),
        phone_number: form.text("phone_number").to_string(),
    };
    edit.validate()?;

    let picture = store_file(
        &state.media,
        UploadKind::ProfilePicture,
        "profile_picture",
        form.take_file("profile_picture"),
    )
    .await?;

    user.apply_profile(edit.trimmed(), picture);
    state.users.update_user(&user).await?;
    info!(user_id = %user.id, "profile updated");

    Ok(Json(user))
}
