use async_trait::async_trait;
use uuid::Uuid;

use summit_booking::{
    Booking, BookingFilter, BookingListing, CheckIn, CheckInFilter, CheckInListing, Participant,
};
use summit_catalog::{GalleryImage, Mountain, Route, RouteListing};

use crate::identity::User;
use crate::RepoResult;

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict(USER_EMAIL)` when the email is taken.
    async fn create_user(&self, user: &User) -> RepoResult<()>;

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;

    /// `email` is matched lower-cased.
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    async fn update_user(&self, user: &User) -> RepoResult<()>;
}

/// Repository trait for mountains, routes and gallery media
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn create_mountain(&self, mountain: &Mountain) -> RepoResult<()>;

    async fn create_route(&self, route: &Route) -> RepoResult<()>;

    async fn add_gallery_image(&self, image: &GalleryImage) -> RepoResult<()>;

    /// Active mountains ordered by name.
    async fn list_mountains(&self) -> RepoResult<Vec<Mountain>>;

    async fn get_mountain_by_slug(&self, slug: &str) -> RepoResult<Option<Mountain>>;

    /// Active routes of one mountain, cheapest first.
    async fn list_routes(&self, mountain_id: Uuid) -> RepoResult<Vec<Route>>;

    /// Every active route with its mountain, for the booking wizard.
    async fn list_route_listings(&self) -> RepoResult<Vec<RouteListing>>;

    async fn get_route(&self, id: Uuid) -> RepoResult<Option<RouteListing>>;

    async fn get_route_by_slug(&self, mountain_id: Uuid, slug: &str) -> RepoResult<Option<Route>>;

    /// First active route carrying `slug` on any mountain.
    async fn find_route_by_slug(&self, slug: &str) -> RepoResult<Option<RouteListing>>;

    /// Gallery of a mountain; with `route_id`, only that route's images.
    async fn list_gallery(&self, mountain_id: Uuid, route_id: Option<Uuid>) -> RepoResult<Vec<GalleryImage>>;
}

/// Repository trait for bookings and their participant rosters
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Fails with `Conflict(BOOKING_CODE)` when the code is taken.
    async fn create_booking(&self, booking: &Booking) -> RepoResult<()>;

    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>>;

    async fn update_booking(&self, booking: &Booking) -> RepoResult<()>;

    async fn get_listing(&self, id: Uuid) -> RepoResult<Option<BookingListing>>;

    /// Newest first.
    async fn list_bookings(&self, filter: &BookingFilter) -> RepoResult<Vec<BookingListing>>;

    /// Roster in the order participants were added.
    async fn list_participants(&self, booking_id: Uuid) -> RepoResult<Vec<Participant>>;

    async fn get_participant(&self, id: Uuid) -> RepoResult<Option<Participant>>;

    async fn add_participant(&self, participant: &Participant) -> RepoResult<()>;

    async fn update_participant(&self, participant: &Participant) -> RepoResult<()>;

    /// Deletes the participant and saves `booking` (already resynced to the
    /// smaller roster) in one step.
    async fn remove_participant(&self, participant_id: Uuid, booking: &Booking) -> RepoResult<()>;
}

/// Repository trait for day-of-climb check-ins
#[async_trait]
pub trait CheckInRepository: Send + Sync {
    /// Fails with `Conflict(CHECKIN_PARTICIPANT)` for a second check-in of the
    /// same participant and `Conflict(CHECKIN_QR_DATA)` for a reused payload.
    async fn create_checkin(&self, checkin: &CheckIn) -> RepoResult<()>;

    async fn get_checkin(&self, id: Uuid) -> RepoResult<Option<CheckIn>>;

    async fn update_checkin(&self, checkin: &CheckIn) -> RepoResult<()>;

    async fn find_by_participant(&self, participant_id: Uuid) -> RepoResult<Option<CheckIn>>;

    async fn find_by_qr_data(&self, qr_data: &str) -> RepoResult<Option<CheckIn>>;

    async fn get_checkin_listing(&self, id: Uuid) -> RepoResult<Option<CheckInListing>>;

    /// Newest first.
    async fn list_checkins(&self, filter: &CheckInFilter) -> RepoResult<Vec<CheckInListing>>;
}
