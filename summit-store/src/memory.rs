//! In-memory repositories with the same unique constraints as the Postgres
//! schema. One `MemoryStore` implements every repository trait so listings
//! can join across users, routes and bookings.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use summit_booking::{
    Booking, BookingFilter, BookingListing, CheckIn, CheckInFilter, CheckInListing, Participant,
};
use summit_catalog::{sort_gallery, GalleryImage, Mountain, Route, RouteListing};
use summit_core::constraints;
use summit_core::repository::{BookingRepository, CatalogRepository, CheckInRepository, UserRepository};
use summit_core::{RepoError, RepoResult, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    mountains: HashMap<Uuid, Mountain>,
    routes: HashMap<Uuid, Route>,
    gallery: Vec<GalleryImage>,
    bookings: HashMap<Uuid, Booking>,
    participants: Vec<Participant>,
    checkins: HashMap<Uuid, CheckIn>,
}

impl Tables {
    fn route_listing(&self, route: &Route) -> Option<RouteListing> {
        let mountain = self.mountains.get(&route.mountain_id)?;
        Some(RouteListing {
            route: route.clone(),
            mountain_name: mountain.name.clone(),
            mountain_slug: mountain.slug.clone(),
        })
    }

    fn booking_listing(&self, booking: &Booking) -> Option<BookingListing> {
        let route = self.routes.get(&booking.route_id)?;
        let mountain = self.mountains.get(&route.mountain_id)?;
        let user = self.users.get(&booking.user_id)?;
        Some(BookingListing::new(
            booking.clone(),
            route.name.clone(),
            route.slug.clone(),
            mountain.name.clone(),
            user.email.clone(),
            user.first_name.clone(),
            user.last_name.clone(),
        ))
    }

    fn checkin_listing(&self, checkin: &CheckIn) -> Option<CheckInListing> {
        let participant = self.participants.iter().find(|p| p.id == checkin.participant_id)?;
        let booking = self.bookings.get(&checkin.booking_id)?;
        let listing = self.booking_listing(booking)?;
        Some(CheckInListing {
            checkin: checkin.clone(),
            participant_name: participant.full_name().to_string(),
            participant_id_number: participant.id_number().to_string(),
            booking_code: booking.booking_code.clone(),
            booking_start_date: booking.start_date,
            mountain_name: listing.mountain_name,
            customer_email: listing.customer_email,
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn conflict(constraint: &str) -> RepoError {
    RepoError::Conflict(constraint.to_string())
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &User) -> RepoResult<()> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.email == user.email) {
            return Err(conflict(constraints::USER_EMAIL));
        }
        t.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: &User) -> RepoResult<()> {
        let mut t = self.tables.write().await;
        let slot = t.users.get_mut(&user.id).ok_or(RepoError::NotFound)?;
        *slot = user.clone();
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn create_mountain(&self, mountain: &Mountain) -> RepoResult<()> {
        mountain.validate()?;
        let mut t = self.tables.write().await;
        if t.mountains.values().any(|m| m.slug == mountain.slug) {
            return Err(conflict(constraints::MOUNTAIN_SLUG));
        }
        t.mountains.insert(mountain.id, mountain.clone());
        Ok(())
    }

    async fn create_route(&self, route: &Route) -> RepoResult<()> {
        route.validate()?;
        let mut t = self.tables.write().await;
        if !t.mountains.contains_key(&route.mountain_id) {
            return Err(RepoError::NotFound);
        }
        if t.routes
            .values()
            .any(|r| r.mountain_id == route.mountain_id && r.slug == route.slug)
        {
            return Err(conflict(constraints::ROUTE_SLUG));
        }
        t.routes.insert(route.id, route.clone());
        Ok(())
    }

    async fn add_gallery_image(&self, image: &GalleryImage) -> RepoResult<()> {
        self.tables.write().await.gallery.push(image.clone());
        Ok(())
    }

    async fn list_mountains(&self) -> RepoResult<Vec<Mountain>> {
        let t = self.tables.read().await;
        let mut mountains: Vec<Mountain> = t.mountains.values().filter(|m| m.is_active).cloned().collect();
        mountains.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(mountains)
    }

    async fn get_mountain_by_slug(&self, slug: &str) -> RepoResult<Option<Mountain>> {
        let t = self.tables.read().await;
        Ok(t.mountains.values().find(|m| m.slug == slug && m.is_active).cloned())
    }

    async fn list_routes(&self, mountain_id: Uuid) -> RepoResult<Vec<Route>> {
        let t = self.tables.read().await;
        let mut routes: Vec<Route> = t
            .routes
            .values()
            .filter(|r| r.mountain_id == mountain_id && r.is_active)
            .cloned()
            .collect();
        routes.sort_by(|a, b| a.price_per_person.cmp(&b.price_per_person).then_with(|| a.name.cmp(&b.name)));
        Ok(routes)
    }

    async fn list_route_listings(&self) -> RepoResult<Vec<RouteListing>> {
        let t = self.tables.read().await;
        let mut listings: Vec<RouteListing> = t
            .routes
            .values()
            .filter(|r| r.is_active)
            .filter_map(|r| t.route_listing(r))
            .collect();
        listings.sort_by(|a, b| {
            a.mountain_name
                .cmp(&b.mountain_name)
                .then(a.route.price_per_person.cmp(&b.route.price_per_person))
        });
        Ok(listings)
    }

    async fn get_route(&self, id: Uuid) -> RepoResult<Option<RouteListing>> {
        let t = self.tables.read().await;
        Ok(t.routes.get(&id).and_then(|r| t.route_listing(r)))
    }

    async fn get_route_by_slug(&self, mountain_id: Uuid, slug: &str) -> RepoResult<Option<Route>> {
        let t = self.tables.read().await;
        Ok(t.routes
            .values()
            .find(|r| r.mountain_id == mountain_id && r.slug == slug && r.is_active)
            .cloned())
    }

    async fn find_route_by_slug(&self, slug: &str) -> RepoResult<Option<RouteListing>> {
        let t = self.tables.read().await;
        Ok(t.routes
            .values()
            .filter(|r| r.slug == slug && r.is_active)
            .min_by_key(|r| r.created_at)
            .and_then(|r| t.route_listing(r)))
    }

    async fn list_gallery(&self, mountain_id: Uuid, route_id: Option<Uuid>) -> RepoResult<Vec<GalleryImage>> {
        let t = self.tables.read().await;
        let mut images: Vec<GalleryImage> = t
            .gallery
            .iter()
            .filter(|g| g.mountain_id == mountain_id)
            .filter(|g| route_id.is_none() || g.route_id == route_id)
            .cloned()
            .collect();
        sort_gallery(&mut images);
        Ok(images)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_booking(&self, booking: &Booking) -> RepoResult<()> {
        let mut t = self.tables.write().await;
        if t.bookings.values().any(|b| b.booking_code == booking.booking_code) {
            return Err(conflict(constraints::BOOKING_CODE));
        }
        t.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn update_booking(&self, booking: &Booking) -> RepoResult<()> {
        let mut t = self.tables.write().await;
        let slot = t.bookings.get_mut(&booking.id).ok_or(RepoError::NotFound)?;
        *slot = booking.clone();
        Ok(())
    }

    async fn get_listing(&self, id: Uuid) -> RepoResult<Option<BookingListing>> {
        let t = self.tables.read().await;
        Ok(t.bookings.get(&id).and_then(|b| t.booking_listing(b)))
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> RepoResult<Vec<BookingListing>> {
        let t = self.tables.read().await;
        let mut listings: Vec<BookingListing> = t
            .bookings
            .values()
            .filter_map(|b| t.booking_listing(b))
            .filter(|l| filter.matches(l))
            .collect();
        listings.sort_by(|a, b| b.booking.created_at.cmp(&a.booking.created_at));
        Ok(listings)
    }

    async fn list_participants(&self, booking_id: Uuid) -> RepoResult<Vec<Participant>> {
        let t = self.tables.read().await;
        Ok(t.participants
            .iter()
            .filter(|p| p.booking_id == booking_id)
            .cloned()
            .collect())
    }

    async fn get_participant(&self, id: Uuid) -> RepoResult<Option<Participant>> {
        let t = self.tables.read().await;
        Ok(t.participants.iter().find(|p| p.id == id).cloned())
    }

    async fn add_participant(&self, participant: &Participant) -> RepoResult<()> {
        let mut t = self.tables.write().await;
        if !t.bookings.contains_key(&participant.booking_id) {
            return Err(RepoError::NotFound);
        }
        t.participants.push(participant.clone());
        Ok(())
    }

    async fn update_participant(&self, participant: &Participant) -> RepoResult<()> {
        let mut t = self.tables.write().await;
        let slot = t
            .participants
            .iter_mut()
            .find(|p| p.id == participant.id)
            .ok_or(RepoError::NotFound)?;
        *slot = participant.clone();
        Ok(())
    }

    async fn remove_participant(&self, participant_id: Uuid, booking: &Booking) -> RepoResult<()> {
        let mut t = self.tables.write().await;
        let index = t
            .participants
            .iter()
            .position(|p| p.id == participant_id && p.booking_id == booking.id)
            .ok_or(RepoError::NotFound)?;
        let slot = t.bookings.get_mut(&booking.id).ok_or(RepoError::NotFound)?;
        *slot = booking.clone();
        t.participants.remove(index);
        Ok(())
    }
}

#[async_trait]
impl CheckInRepository for MemoryStore {
    async fn create_checkin(&self, checkin: &CheckIn) -> RepoResult<()> {
        let mut t = self.tables.write().await;
        if t.checkins
            .values()
            .any(|c| c.booking_id == checkin.booking_id && c.participant_id == checkin.participant_id)
        {
            return Err(conflict(constraints::CHECKIN_PARTICIPANT));
        }
        if t.checkins.values().any(|c| c.qr_data == checkin.qr_data) {
            return Err(conflict(constraints::CHECKIN_QR_DATA));
        }
        t.checkins.insert(checkin.id, checkin.clone());
        Ok(())
    }

    async fn get_checkin(&self, id: Uuid) -> RepoResult<Option<CheckIn>> {
        Ok(self.tables.read().await.checkins.get(&id).cloned())
    }

    async fn update_checkin(&self, checkin: &CheckIn) -> RepoResult<()> {
        let mut t = self.tables.write().await;
        let slot = t.checkins.get_mut(&checkin.id).ok_or(RepoError::NotFound)?;
        *slot = checkin.clone();
        Ok(())
    }

    async fn find_by_participant(&self, participant_id: Uuid) -> RepoResult<Option<CheckIn>> {
        let t = self.tables.read().await;
        Ok(t.checkins.values().find(|c| c.participant_id == participant_id).cloned())
    }

    async fn find_by_qr_data(&self, qr_data: &str) -> RepoResult<Option<CheckIn>> {
        let t = self.tables.read().await;
        Ok(t.checkins.values().find(|c| c.qr_data == qr_data).cloned())
    }

    async fn get_checkin_listing(&self, id: Uuid) -> RepoResult<Option<CheckInListing>> {
        let t = self.tables.read().await;
        Ok(t.checkins.get(&id).and_then(|c| t.checkin_listing(c)))
    }

    async fn list_checkins(&self, filter: &CheckInFilter) -> RepoResult<Vec<CheckInListing>> {
        let t = self.tables.read().await;
        let mut listings: Vec<CheckInListing> = t
            .checkins
            .values()
            .filter_map(|c| t.checkin_listing(c))
            .filter(|l| filter.matches(l))
            .collect();
        listings.sort_by(|a, b| b.checkin.created_at.cmp(&a.checkin.created_at));
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use summit_core::identity::{ClimberRegistration, RegistrationRules};

    async fn seeded() -> (MemoryStore, User, Route) {
        let store = MemoryStore::new();
        let rules = RegistrationRules {
            min_age: 17,
            max_age: 100,
            admin_secret_code: String::new(),
        };
        let user = ClimberRegistration {
            first_name: "Sari".into(),
            last_name: "Dewi".into(),
            email: "sari@example.com".into(),
            phone_number: "081234567890".into(),
            date_of_birth: "1995-01-01".into(),
            blood_type: "O".into(),
            emergency_contact_name: "Budi".into(),
            emergency_contact_phone: "081298765432".into(),
            password1: "rinjani2026".into(),
            password2: "rinjani2026".into(),
            agree_terms: true,
        }
        .validate(&rules, NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
        .unwrap()
        .user;
        store.create_user(&user).await.unwrap();

        let mountain = Mountain::new(
            "Gunung Rinjani",
            "",
            3726,
            "Lombok",
            "Nusa Tenggara Barat",
            summit_catalog::Difficulty::Hard,
        );
        store.create_mountain(&mountain).await.unwrap();
        let route = Route::new(mountain.id, "Jalur Senaru", "", "Desa Senaru", 3, 2, 22.5, 1_800_000);
        store.create_route(&route).await.unwrap();
        (store, user, route)
    }

    fn booking(user: &User, route: &Route, code: &str) -> Booking {
        Booking::new(
            code.into(),
            user.id,
            route,
            NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            2,
            String::new(),
        )
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let (store, user, _) = seeded().await;
        let mut twin = user.clone();
        twin.id = Uuid::new_v4();
        let err = store.create_user(&twin).await.unwrap_err();
        assert!(err.is_conflict_on(constraints::USER_EMAIL));
    }

    #[tokio::test]
    async fn test_duplicate_booking_code_conflicts() {
        let (store, user, route) = seeded().await;
        store.create_booking(&booking(&user, &route, "RNJ-20261016-AAAA")).await.unwrap();
        let err = store
            .create_booking(&booking(&user, &route, "RNJ-20261016-AAAA"))
            .await
            .unwrap_err();
        assert!(err.is_conflict_on(constraints::BOOKING_CODE));
    }

    #[tokio::test]
    async fn test_invalid_route_never_stored() {
        let (store, _, route) = seeded().await;
        let mut broken = Route::new(route.mountain_id, "Jalur Torean", "", "Torean", 0, 0, 18.0, 2_000_000);
        broken.slug = "jalur-torean".into();
        assert!(matches!(store.create_route(&broken).await, Err(RepoError::Invalid(_))));
        assert_eq!(store.list_routes(route.mountain_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_listing_joins_route_and_customer() {
        let (store, user, route) = seeded().await;
        let b = booking(&user, &route, "RNJ-20261016-BBBB");
        store.create_booking(&b).await.unwrap();

        let listings = store.list_bookings(&BookingFilter::for_user(user.id)).await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].mountain_name, "Gunung Rinjani");
        assert_eq!(listings[0].customer_email, "sari@example.com");
        assert_eq!(listings[0].total_price, 3_600_000);

        let found = store.find_route_by_slug("jalur-senaru").await.unwrap().unwrap();
        assert_eq!(found.mountain_slug, "gunung-rinjani");
    }
}
