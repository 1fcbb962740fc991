use axum::{extract::DefaultBodyLimit, http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod accounts;
pub mod admin;
pub mod bookings;
pub mod checkins;
pub mod dashboard;
pub mod error;
pub mod home;
pub mod middleware;
pub mod mountains;
pub mod state;
pub mod upload;

pub use state::AppState;

/// Largest request body accepted; uploads are capped per kind below this.
const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let protected = Router::new()
        .merge(accounts::protected_routes())
        .merge(bookings::routes())
        .merge(checkins::routes())
        .merge(dashboard::routes())
        .merge(admin::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(home::routes())
        .merge(accounts::routes())
        .merge(mountains::routes())
        .merge(protected)
        .nest_service("/media", ServeDir::new(state.media.root()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
