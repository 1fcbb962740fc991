pub mod access;
pub mod identity;
pub mod repository;

pub use access::Capability;
pub use identity::{IdentityError, Role, User};

/// Names of the unique constraints the storage layer reports on conflict.
pub mod constraints {
    pub const USER_EMAIL: &str = "users_email_key";
    pub const MOUNTAIN_SLUG: &str = "mountains_slug_key";
    pub const ROUTE_SLUG: &str = "routes_mountain_id_slug_key";
    pub const BOOKING_CODE: &str = "bookings_booking_code_key";
    pub const CHECKIN_QR_DATA: &str = "checkins_qr_data_key";
    pub const CHECKIN_PARTICIPANT: &str = "checkins_booking_id_participant_id_key";
}

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A unique constraint rejected the write; carries the constraint name.
    #[error("duplicate value violates {0}")]
    Conflict(String),

    #[error("record not found")]
    NotFound,

    /// The record failed its own validation before reaching storage.
    #[error("invalid record: {0}")]
    Invalid(String),

    #[error("storage error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepoError {
    pub fn is_conflict_on(&self, constraint: &str) -> bool {
        matches!(self, RepoError::Conflict(name) if name == constraint)
    }
}

impl From<summit_catalog::CatalogError> for RepoError {
    fn from(err: summit_catalog::CatalogError) -> Self {
        RepoError::Invalid(err.to_string())
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
