use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mountain::Difficulty;
use crate::slug::slugify;
use crate::CatalogError;

/// A trekking package on one mountain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub mountain_id: Uuid,
    pub name: String,
    /// Unique within the owning mountain.
    pub slug: String,
    pub description: String,
    pub starting_point: String,
    pub duration_days: i32,
    pub duration_nights: i32,
    pub distance_km: f64,
    pub difficulty_level: Difficulty,
    /// Whole rupiah.
    pub price_per_person: i64,
    pub max_participants: i32,
    /// Newline separated.
    pub facilities: String,
    /// Newline separated.
    pub requirements: String,
    pub gpx_file: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Route {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mountain_id: Uuid,
        name: &str,
        description: &str,
        starting_point: &str,
        duration_days: i32,
        duration_nights: i32,
        distance_km: f64,
        price_per_person: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            mountain_id,
            name: name.to_string(),
            slug: slugify(name),
            description: description.to_string(),
            starting_point: starting_point.to_string(),
            duration_days,
            duration_nights,
            distance_km,
            difficulty_level: Difficulty::Medium,
            price_per_person,
            max_participants: 10,
            facilities: String::new(),
            requirements: String::new(),
            gpx_file: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.duration_days < 1 {
            return Err(CatalogError::Invalid("duration_days must be >= 1".into()));
        }
        if self.duration_nights < 0 {
            return Err(CatalogError::Invalid("duration_nights must be >= 0".into()));
        }
        if self.distance_km < 0.0 {
            return Err(CatalogError::Invalid("distance_km must be >= 0".into()));
        }
        if self.max_participants < 1 {
            return Err(CatalogError::Invalid("max_participants must be >= 1".into()));
        }
        if self.price_per_person < 0 {
            return Err(CatalogError::Invalid("price_per_person must be >= 0".into()));
        }
        Ok(())
    }

    pub fn facilities_list(&self) -> Vec<String> {
        split_lines(&self.facilities)
    }

    pub fn requirements_list(&self) -> Vec<String> {
        split_lines(&self.requirements)
    }

    /// e.g. "3 Hari 2 Malam"
    pub fn duration_text(&self) -> String {
        format!("{} Hari {} Malam", self.duration_days, self.duration_nights)
    }

    /// Last day of a climb starting on `start`.
    pub fn end_date_for(&self, start: NaiveDate) -> NaiveDate {
        start + Duration::days(i64::from(self.duration_days.max(1)) - 1)
    }
}

/// A route together with the mountain it belongs to, as listed in the
/// booking wizard and the dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteListing {
    #[serde(flatten)]
    pub route: Route,
    pub mountain_name: String,
    pub mountain_slug: String,
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Landing-page package shortcuts to route slugs.
pub fn package_route_slug(package: &str) -> Option<&'static str> {
    match package {
        "hemat" => Some("paket-hemat-2h1m"),
        "populer" => Some("jalur-senaru"),
        "premium" => Some("paket-premium-4h3m"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn senaru() -> Route {
        let mut route = Route::new(
            Uuid::new_v4(),
            "Jalur Senaru",
            "Rute paling populer",
            "Desa Senaru",
            3,
            2,
            22.5,
            1_800_000,
        );
        route.facilities = "Pemandu lokal\n\n  Porter  \nTenda".to_string();
        route
    }

    #[test]
    fn test_lists_skip_blank_lines() {
        let route = senaru();
        assert_eq!(route.facilities_list(), vec!["Pemandu lokal", "Porter", "Tenda"]);
        assert!(route.requirements_list().is_empty());
    }

    #[test]
    fn test_end_date_counts_start_day() {
        let route = senaru();
        let start = NaiveDate::from_ymd_opt(2026, 10, 30).unwrap();
        assert_eq!(route.end_date_for(start), NaiveDate::from_ymd_opt(2026, 11, 1).unwrap());
        assert_eq!(route.duration_text(), "3 Hari 2 Malam");
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut route = senaru();
        assert!(route.validate().is_ok());
        route.max_participants = 0;
        assert!(route.validate().is_err());
    }

    #[test]
    fn test_package_mapping() {
        assert_eq!(package_route_slug("populer"), Some("jalur-senaru"));
        assert_eq!(package_route_slug("vip"), None);
    }
}
