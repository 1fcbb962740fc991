pub mod app_config;
pub mod database;
pub mod user_repo;
pub mod catalog_repo;
pub mod booking_repo;
pub mod checkin_repo;
pub mod memory;
pub mod media;
pub mod seed;

pub use app_config::{BookingRules, Config};
pub use database::DbClient;
pub use user_repo::StoreUserRepository;
pub use catalog_repo::StoreCatalogRepository;
pub use booking_repo::StoreBookingRepository;
pub use checkin_repo::StoreCheckInRepository;
pub use memory::MemoryStore;
pub use media::{LocalMedia, MediaError};
pub use seed::{setup_rinjani, SeedReport};
