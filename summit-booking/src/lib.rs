pub mod checkin;
pub mod code;
pub mod dashboard;
pub mod filters;
pub mod forms;
pub mod models;
pub mod participant;
pub mod qr;

pub use checkin::{CheckIn, CheckInError, CheckInEvent, CheckInStatus};
pub use code::generate_booking_code;
pub use filters::{status_param, BookingFilter, BookingListing, BookingQuery, CheckInFilter, CheckInListing};
pub use forms::{BookingForm, ParticipantForm, ScheduleSelection, WizardRules};
pub use models::{Booking, BookingError, BookingEvent, BookingStatus, PaymentMethod};
pub use participant::{Participant, ParticipantProfile};
