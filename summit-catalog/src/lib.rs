pub mod mountain;
pub mod route;
pub mod gallery;
pub mod slug;

pub use mountain::{Difficulty, Mountain};
pub use route::{package_route_slug, Route, RouteListing};
pub use gallery::{sort_gallery, GalleryImage};
pub use slug::slugify;

/// Catalog-related errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid catalog entry: {0}")]
    Invalid(String),
}
