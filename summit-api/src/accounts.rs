use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use summit_core::identity::{authenticate, ClimberRegistration, LoginForm, PendingUser, StaffRegistration};
use summit_core::{constraints, Capability, IdentityError, Role, User};

use crate::error::AppError;
use crate::middleware::{issue_token, Claims};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user: User,
    redirect_to: String,
}

#[derive(Debug, Serialize)]
struct ProfileResponse {
    #[serde(flatten)]
    user: User,
    full_name: String,
    age: Option<i32>,
    role_label: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/register/pendaki", post(register_climber))
        .route("/accounts/register/admin", post(register_staff))
        .route("/accounts/login", post(login))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/accounts/profile", get(profile))
}

async fn register_climber(
    State(state): State<AppState>,
    Json(form): Json<ClimberRegistration>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let today = Utc::now().date_naive();
    let pending = form.validate(&state.registration_rules(), today)?;
    let user = create_account(&state, pending).await?;
    info!(user_id = %user.id, "climber registered");

    let token = issue_token(&state.auth, &user, false)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            redirect_to: user.role.home().to_string(),
            user,
        }),
    ))
}

async fn register_staff(
    State(state): State<AppState>,
    Json(form): Json<StaffRegistration>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let pending = form.validate(&state.registration_rules())?;
    let user = create_account(&state, pending).await?;
    info!(user_id = %user.id, "staff account registered");

    let token = issue_token(&state.auth, &user, false)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            redirect_to: user.role.home().to_string(),
            user,
        }),
    ))
}

async fn create_account(state: &AppState, pending: PendingUser) -> Result<User, AppError> {
    if state.users.find_by_email(&pending.user.email).await?.is_some() {
        return Err(IdentityError::EmailTaken.into());
    }

    let cost = state.auth.password_cost;
    let user = tokio::task::spawn_blocking(move || pending.into_user(cost)).await??;

    match state.users.create_user(&user).await {
        Ok(()) => Ok(user),
        Err(e) if e.is_conflict_on(constraints::USER_EMAIL) => Err(IdentityError::EmailTaken.into()),
        Err(e) => Err(e.into()),
    }
}

async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = form.email.trim().to_lowercase();
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(IdentityError::InvalidCredentials)?;

    let password = form.password.clone();
    let user = tokio::task::spawn_blocking(move || authenticate(&user, &password).map(|()| user)).await??;

    let redirect_to = match user.role {
        Role::Staff => user.role.home().to_string(),
        Role::Climber => form
            .next
            .as_deref()
            .filter(|next| is_local_path(next))
            .unwrap_or(user.role.home())
            .to_string(),
    };

    let token = issue_token(&state.auth, &user, form.remember_me)?;
    info!(user_id = %user.id, role = %user.role, "user logged in");

    Ok(Json(AuthResponse { token, user, redirect_to }))
}

/// Only same-site paths are honoured as post-login redirects.
fn is_local_path(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//")
}

async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProfileResponse>, AppError> {
    claims.require(Capability::ViewProfile)?;
    let user = state
        .users
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::not_found("Akun tidak ditemukan."))?;

    Ok(Json(ProfileResponse {
        full_name: user.full_name(),
        age: user.age(Utc::now().date_naive()),
        role_label: user.role.label(),
        user,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_must_stay_on_site() {
        assert!(is_local_path("/bookings/create"));
        assert!(!is_local_path("//evil.example"));
        assert!(!is_local_path("https://evil.example"));
    }
}
