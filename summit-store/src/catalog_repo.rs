use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use summit_catalog::{Difficulty, GalleryImage, Mountain, Route, RouteListing};
use summit_core::repository::CatalogRepository;
use summit_core::RepoResult;

use crate::database::{corrupt, repo_err};

pub struct StoreCatalogRepository {
    pool: PgPool,
}

impl StoreCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MountainRow {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    height: i32,
    location: String,
    province: String,
    difficulty_level: String,
    image: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MountainRow {
    fn into_mountain(self) -> RepoResult<Mountain> {
        Ok(Mountain {
            id: self.id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            height: self.height,
            location: self.location,
            province: self.province,
            difficulty_level: self.difficulty_level.parse::<Difficulty>().map_err(corrupt)?,
            image: self.image,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RouteRow {
    id: Uuid,
    mountain_id: Uuid,
    name: String,
    slug: String,
    description: String,
    starting_point: String,
    duration_days: i32,
    duration_nights: i32,
    distance_km: f64,
    difficulty_level: String,
    price_per_person: i64,
    max_participants: i32,
    facilities: String,
    requirements: String,
    gpx_file: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RouteRow {
    fn into_route(self) -> RepoResult<Route> {
        Ok(Route {
            id: self.id,
            mountain_id: self.mountain_id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            starting_point: self.starting_point,
            duration_days: self.duration_days,
            duration_nights: self.duration_nights,
            distance_km: self.distance_km,
            difficulty_level: self.difficulty_level.parse::<Difficulty>().map_err(corrupt)?,
            price_per_person: self.price_per_person,
            max_participants: self.max_participants,
            facilities: self.facilities,
            requirements: self.requirements,
            gpx_file: self.gpx_file,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RouteListingRow {
    #[sqlx(flatten)]
    route: RouteRow,
    mountain_name: String,
    mountain_slug: String,
}

impl RouteListingRow {
    fn into_listing(self) -> RepoResult<RouteListing> {
        Ok(RouteListing {
            route: self.route.into_route()?,
            mountain_name: self.mountain_name,
            mountain_slug: self.mountain_slug,
        })
    }
}

#[derive(sqlx::FromRow)]
struct GalleryRow {
    id: Uuid,
    mountain_id: Uuid,
    route_id: Option<Uuid>,
    title: String,
    image: String,
    description: String,
    photographer: String,
    taken_date: Option<NaiveDate>,
    is_featured: bool,
    display_order: i32,
    created_at: DateTime<Utc>,
}

impl From<GalleryRow> for GalleryImage {
    fn from(row: GalleryRow) -> Self {
        GalleryImage {
            id: row.id,
            mountain_id: row.mountain_id,
            route_id: row.route_id,
            title: row.title,
            image: row.image,
            description: row.description,
            photographer: row.photographer,
            taken_date: row.taken_date,
            is_featured: row.is_featured,
            order: row.display_order,
            created_at: row.created_at,
        }
    }
}

const MOUNTAIN_COLUMNS: &str = "id, name, slug, description, height, location, province, \
    difficulty_level, image, is_active, created_at, updated_at";

const ROUTE_LISTING_SELECT: &str = r#"
    SELECT r.id, r.mountain_id, r.name, r.slug, r.description, r.starting_point,
           r.duration_days, r.duration_nights, r.distance_km, r.difficulty_level,
           r.price_per_person, r.max_participants, r.facilities, r.requirements,
           r.gpx_file, r.is_active, r.created_at, r.updated_at,
           m.name AS mountain_name, m.slug AS mountain_slug
    FROM routes r
    JOIN mountains m ON m.id = r.mountain_id
"#;

fn listings(rows: Vec<RouteListingRow>) -> RepoResult<Vec<RouteListing>> {
    rows.into_iter().map(RouteListingRow::into_listing).collect()
}

#[async_trait]
impl CatalogRepository for StoreCatalogRepository {
    async fn create_mountain(&self, mountain: &Mountain) -> RepoResult<()> {
        mountain.validate()?;
        sqlx::query(
            r#"
            INSERT INTO mountains (id, name, slug, description, height, location, province,
                difficulty_level, image, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(mountain.id)
        .bind(&mountain.name)
        .bind(&mountain.slug)
        .bind(&mountain.description)
        .bind(mountain.height)
        .bind(&mountain.location)
        .bind(&mountain.province)
        .bind(mountain.difficulty_level.as_str())
        .bind(&mountain.image)
        .bind(mountain.is_active)
        .bind(mountain.created_at)
        .bind(mountain.updated_at)
        .execute(&self.pool)
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn create_route(&self, route: &Route) -> RepoResult<()> {
        route.validate()?;
        sqlx::query(
            r#"
            INSERT INTO routes (id, mountain_id, name, slug, description, starting_point,
                duration_days, duration_nights, distance_km, difficulty_level, price_per_person,
                max_participants, facilities, requirements, gpx_file, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(route.id)
        .bind(route.mountain_id)
        .bind(&route.name)
        .bind(&route.slug)
        .bind(&route.description)
        .bind(&route.starting_point)
        .bind(route.duration_days)
        .bind(route.duration_nights)
        .bind(route.distance_km)
        .bind(route.difficulty_level.as_str())
        .bind(route.price_per_person)
        .bind(route.max_participants)
        .bind(&route.facilities)
        .bind(&route.requirements)
        .bind(&route.gpx_file)
        .bind(route.is_active)
        .bind(route.created_at)
        .bind(route.updated_at)
        .execute(&self.pool)
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn add_gallery_image(&self, image: &GalleryImage) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO gallery_images (id, mountain_id, route_id, title, image, description,
                photographer, taken_date, is_featured, display_order, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(image.id)
        .bind(image.mountain_id)
        .bind(image.route_id)
        .bind(&image.title)
        .bind(&image.image)
        .bind(&image.description)
        .bind(&image.photographer)
        .bind(image.taken_date)
        .bind(image.is_featured)
        .bind(image.order)
        .bind(image.created_at)
        .execute(&self.pool)
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn list_mountains(&self) -> RepoResult<Vec<Mountain>> {
        let rows: Vec<MountainRow> = sqlx::query_as(&format!(
            "SELECT {} FROM mountains WHERE is_active ORDER BY name",
            MOUNTAIN_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(repo_err)?;
        rows.into_iter().map(MountainRow::into_mountain).collect()
    }

    async fn get_mountain_by_slug(&self, slug: &str) -> RepoResult<Option<Mountain>> {
        let row: Option<MountainRow> = sqlx::query_as(&format!(
            "SELECT {} FROM mountains WHERE slug = $1 AND is_active",
            MOUNTAIN_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(repo_err)?;
        row.map(MountainRow::into_mountain).transpose()
    }

    async fn list_routes(&self, mountain_id: Uuid) -> RepoResult<Vec<Route>> {
        let rows: Vec<RouteRow> = sqlx::query_as(
            "SELECT * FROM routes WHERE mountain_id = $1 AND is_active ORDER BY price_per_person, name",
        )
        .bind(mountain_id)
        .fetch_all(&self.pool)
        .await
        .map_err(repo_err)?;
        rows.into_iter().map(RouteRow::into_route).collect()
    }

    async fn list_route_listings(&self) -> RepoResult<Vec<RouteListing>> {
        let rows: Vec<RouteListingRow> = sqlx::query_as(&format!(
            "{} WHERE r.is_active AND m.is_active ORDER BY m.name, r.price_per_person",
            ROUTE_LISTING_SELECT
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(repo_err)?;
        listings(rows)
    }

    async fn get_route(&self, id: Uuid) -> RepoResult<Option<RouteListing>> {
        let row: Option<RouteListingRow> = sqlx::query_as(&format!("{} WHERE r.id = $1", ROUTE_LISTING_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(repo_err)?;
        row.map(RouteListingRow::into_listing).transpose()
    }

    async fn get_route_by_slug(&self, mountain_id: Uuid, slug: &str) -> RepoResult<Option<Route>> {
        let row: Option<RouteRow> =
            sqlx::query_as("SELECT * FROM routes WHERE mountain_id = $1 AND slug = $2 AND is_active")
                .bind(mountain_id)
                .bind(slug)
                .fetch_optional(&self.pool)
                .await
                .map_err(repo_err)?;
        row.map(RouteRow::into_route).transpose()
    }

    async fn find_route_by_slug(&self, slug: &str) -> RepoResult<Option<RouteListing>> {
        let row: Option<RouteListingRow> = sqlx::query_as(&format!(
            "{} WHERE r.slug = $1 AND r.is_active ORDER BY r.created_at LIMIT 1",
            ROUTE_LISTING_SELECT
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(repo_err)?;
        row.map(RouteListingRow::into_listing).transpose()
    }

    async fn list_gallery(&self, mountain_id: Uuid, route_id: Option<Uuid>) -> RepoResult<Vec<GalleryImage>> {
        let rows: Vec<GalleryRow> = sqlx::query_as(
            r#"
            SELECT * FROM gallery_images
            WHERE mountain_id = $1 AND ($2::uuid IS NULL OR route_id = $2)
            ORDER BY display_order, created_at DESC
            "#,
        )
        .bind(mountain_id)
        .bind(route_id)
        .fetch_all(&self.pool)
        .await
        .map_err(repo_err)?;
        Ok(rows.into_iter().map(GalleryImage::from).collect())
    }
}

