use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use summit_core::{Capability, Role, User};

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    /// Refuses the request unless the caller's role grants `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.role.can(capability) {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.sub, role = %self.role, ?capability, "capability denied");
            Err(AppError::AuthorizationError(
                "Anda tidak memiliki akses ke halaman ini.".to_string(),
            ))
        }
    }
}

/// Signs a bearer token for `user`. `remember_me` selects the long lifetime.
pub fn issue_token(auth: &AuthConfig, user: &User, remember_me: bool) -> Result<String, AppError> {
    let lifetime = if remember_me { auth.remember_me } else { auth.expiration };
    let lifetime = i64::try_from(lifetime).unwrap_or(i64::MAX / 1000);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role,
        exp: (Utc::now() + Duration::seconds(lifetime)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::AuthenticationError("Silakan login terlebih dahulu.".to_string()))?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("rejected bearer token: {}", e);
        AppError::AuthenticationError("Sesi tidak valid. Silakan login kembali.".to_string())
    })?;

    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}
