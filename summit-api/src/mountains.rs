use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use summit_catalog::{sort_gallery, GalleryImage, Mountain, Route};

use crate::error::AppError;
use crate::state::AppState;

const RINJANI: &str = "gunung-rinjani";
const SENARU: &str = "jalur-senaru";

#[derive(Debug, Serialize)]
struct MountainCard {
    #[serde(flatten)]
    mountain: Mountain,
    difficulty_label: &'static str,
    routes: Vec<Route>,
}

#[derive(Debug, Serialize)]
struct MountainDetail {
    #[serde(flatten)]
    mountain: Mountain,
    difficulty_label: &'static str,
    routes: Vec<Route>,
    gallery: Vec<GalleryImage>,
}

#[derive(Debug, Serialize)]
struct RouteDetail {
    #[serde(flatten)]
    route: Route,
    mountain: Mountain,
    duration_text: String,
    facilities_list: Vec<String>,
    requirements_list: Vec<String>,
    gallery: Vec<GalleryImage>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/mountains", get(list_mountains))
        .route("/mountains/rinjani-senaru", get(rinjani_senaru))
        .route("/mountains/{slug}", get(mountain_detail))
        .route("/mountains/{slug}/{route_slug}", get(route_detail))
}

async fn list_mountains(State(state): State<AppState>) -> Result<Json<Vec<MountainCard>>, AppError> {
    let mut cards = Vec::new();
    for mountain in state.catalog.list_mountains().await? {
        let routes = state.catalog.list_routes(mountain.id).await?;
        cards.push(MountainCard {
            difficulty_label: mountain.difficulty_level.label(),
            mountain,
            routes,
        });
    }
    Ok(Json(cards))
}

async fn mountain_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<MountainDetail>, AppError> {
    let mountain = find_mountain(&state, &slug).await?;
    let routes = state.catalog.list_routes(mountain.id).await?;
    let mut gallery = state.catalog.list_gallery(mountain.id, None).await?;
    sort_gallery(&mut gallery);

    Ok(Json(MountainDetail {
        difficulty_label: mountain.difficulty_level.label(),
        mountain,
        routes,
        gallery,
    }))
}

async fn route_detail(
    State(state): State<AppState>,
    Path((slug, route_slug)): Path<(String, String)>,
) -> Result<Json<RouteDetail>, AppError> {
    Ok(Json(load_route(&state, &slug, &route_slug).await?))
}

/// The featured Senaru page.
async fn rinjani_senaru(State(state): State<AppState>) -> Result<Json<RouteDetail>, AppError> {
    Ok(Json(load_route(&state, RINJANI, SENARU).await?))
}

async fn find_mountain(state: &AppState, slug: &str) -> Result<Mountain, AppError> {
    state
        .catalog
        .get_mountain_by_slug(slug)
        .await?
        .filter(|m| m.is_active)
        .ok_or_else(|| AppError::not_found("Gunung tidak ditemukan."))
}

async fn load_route(state: &AppState, slug: &str, route_slug: &str) -> Result<RouteDetail, AppError> {
    let mountain = find_mountain(state, slug).await?;
    let route = state
        .catalog
        .get_route_by_slug(mountain.id, route_slug)
        .await?
        .filter(|r| r.is_active)
        .ok_or_else(|| AppError::not_found("Jalur pendakian tidak ditemukan."))?;
    let mut gallery = state.catalog.list_gallery(mountain.id, Some(route.id)).await?;
    sort_gallery(&mut gallery);

    Ok(RouteDetail {
        duration_text: route.duration_text(),
        facilities_list: route.facilities_list(),
        requirements_list: route.requirements_list(),
        route,
        mountain,
        gallery,
    })
}
