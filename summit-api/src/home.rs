use axum::{extract::State, routing::get, Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use summit_catalog::RouteListing;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct Landing {
    today: NaiveDate,
    mountains_count: usize,
    routes: Vec<RouteListing>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(landing))
}

async fn landing(State(state): State<AppState>) -> Result<Json<Landing>, AppError> {
    let mountains = state.catalog.list_mountains().await?;
    let routes = state.catalog.list_route_listings().await?;
    Ok(Json(Landing {
        today: Utc::now().date_naive(),
        mountains_count: mountains.len(),
        routes,
    }))
}
