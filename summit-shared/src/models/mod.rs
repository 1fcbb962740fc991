pub mod events;
pub mod person;

pub use events::{Actor, BookingStatusChanged, CheckInReviewed};
pub use person::{BloodType, Gender};
