use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus};
use crate::participant::Participant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CheckInStatus {
    Pending,
    Verified,
    Rejected,
}

impl CheckInStatus {
    pub const ALL: [CheckInStatus; 3] = [
        CheckInStatus::Pending,
        CheckInStatus::Verified,
        CheckInStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInStatus::Pending => "pending",
            CheckInStatus::Verified => "verified",
            CheckInStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CheckInStatus::Pending => "Menunggu Verifikasi",
            CheckInStatus::Verified => "Terverifikasi",
            CheckInStatus::Rejected => "Ditolak",
        }
    }

    pub fn next(self, event: &CheckInEvent) -> Result<CheckInStatus, CheckInError> {
        match (self, event) {
            (CheckInStatus::Pending, CheckInEvent::Verify) => Ok(CheckInStatus::Verified),
            (CheckInStatus::Pending, CheckInEvent::Reject { .. }) => Ok(CheckInStatus::Rejected),
            (from, event) => Err(CheckInError::InvalidTransition {
                from,
                to: event.target(),
            }),
        }
    }
}

impl fmt::Display for CheckInStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckInStatus {
    type Err = CheckInError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckInStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CheckInError::UnknownStatus(s.to_string()))
    }
}

/// Staff decision on a check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInEvent {
    Verify,
    Reject { reason: String },
}

impl CheckInEvent {
    pub const DEFAULT_REJECTION: &'static str = "Dokumen tidak sesuai";

    pub fn target(&self) -> CheckInStatus {
        match self {
            CheckInEvent::Verify => CheckInStatus::Verified,
            CheckInEvent::Reject { .. } => CheckInStatus::Rejected,
        }
    }
}

/// Day-of-climb check-in for one participant of a confirmed booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub participant_id: Uuid,
    pub id_card_photo: String,
    pub selfie_photo: Option<String>,
    pub qr_code: Option<String>,
    /// Scannable credential; globally unique.
    pub qr_data: String,
    pub status: CheckInStatus,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub rejection_reason: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CheckIn {
    /// Opens a check-in for `participant`. The booking must be confirmed and
    /// the participant must be on its roster.
    pub fn new(
        booking: &Booking,
        participant: &Participant,
        id_card_photo: String,
        selfie_photo: Option<String>,
        qr_data: String,
    ) -> Result<Self, CheckInError> {
        if booking.status != BookingStatus::Confirmed {
            return Err(CheckInError::BookingNotConfirmed(booking.status));
        }
        if participant.booking_id != booking.id {
            return Err(CheckInError::ForeignParticipant);
        }
        if id_card_photo.trim().is_empty() {
            return Err(CheckInError::MissingIdCard);
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            participant_id: participant.id,
            id_card_photo,
            selfie_photo,
            qr_code: None,
            qr_data,
            status: CheckInStatus::Pending,
            verified_by: None,
            verified_at: None,
            rejection_reason: String::new(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Records a staff decision. The reviewer and time are stamped on both
    /// outcomes; a blank rejection reason falls back to the default.
    pub fn review(
        &mut self,
        event: CheckInEvent,
        reviewer: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CheckInStatus, CheckInError> {
        let from = self.status;
        let to = from.next(&event)?;

        if let CheckInEvent::Reject { reason } = event {
            let reason = reason.trim();
            self.rejection_reason = if reason.is_empty() {
                CheckInEvent::DEFAULT_REJECTION.to_string()
            } else {
                reason.to_string()
            };
        }

        self.status = to;
        self.verified_by = Some(reviewer);
        self.verified_at = Some(now);
        self.updated_at = now;
        Ok(from)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CheckInError {
    #[error("Check-in hanya dapat dilakukan untuk booking yang sudah dikonfirmasi (status saat ini: {0}).")]
    BookingNotConfirmed(BookingStatus),

    #[error("Peserta tidak terdaftar pada booking ini.")]
    ForeignParticipant,

    #[error("Foto KTP/identitas wajib diupload.")]
    MissingIdCard,

    #[error("Status check-in '{from}' tidak dapat diubah menjadi '{to}'.")]
    InvalidTransition { from: CheckInStatus, to: CheckInStatus },

    #[error("Status check-in tidak dikenal: {0}")]
    UnknownStatus(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingEvent, PaymentMethod};
    use crate::participant::ParticipantProfile;
    use chrono::NaiveDate;
    use summit_catalog::Route;
    use summit_shared::models::{BloodType, Gender};
    use summit_shared::Masked;

    fn booking() -> Booking {
        let route = Route::new(Uuid::new_v4(), "Jalur Senaru", "", "Desa Senaru", 3, 2, 22.5, 1_800_000);
        Booking::new(
            "RNJ-20261016-0A1B".into(),
            Uuid::new_v4(),
            &route,
            NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            1,
            String::new(),
        )
    }

    fn confirm(booking: &mut Booking) {
        booking
            .apply(
                BookingEvent::SubmitPayment {
                    method: PaymentMethod::Ewallet,
                    proof: "bookings/payments/p.png".into(),
                    roster_size: 1,
                },
                Utc::now(),
            )
            .unwrap();
        booking.apply(BookingEvent::Confirm, Utc::now()).unwrap();
    }

    fn participant(booking_id: Uuid) -> Participant {
        Participant::new(
            booking_id,
            ParticipantProfile {
                full_name: "Rudi".into(),
                id_number: Masked("5201000000000002".into()),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                gender: Gender::Male,
                blood_type: BloodType::A,
                phone_number: "081200000000".into(),
                email: "rudi@example.com".into(),
                address: String::new(),
                city: String::new(),
                province: String::new(),
                postal_code: String::new(),
                emergency_contact_name: "Ani".into(),
                emergency_contact_phone: "081200000001".into(),
                emergency_contact_relation: "Istri".into(),
                health_notes: String::new(),
            },
            None,
        )
    }

    fn open(booking: &Booking) -> Result<CheckIn, CheckInError> {
        let p = participant(booking.id);
        CheckIn::new(booking, &p, "checkins/id_cards/k.jpg".into(), None, "CHECKIN-x".into())
    }

    #[test]
    fn test_requires_confirmed_booking() {
        let mut b = booking();
        assert_eq!(
            open(&b).unwrap_err(),
            CheckInError::BookingNotConfirmed(BookingStatus::Pending)
        );
        confirm(&mut b);
        let checkin = open(&b).unwrap();
        assert_eq!(checkin.status, CheckInStatus::Pending);
    }

    #[test]
    fn test_rejects_participant_from_other_booking() {
        let mut b = booking();
        confirm(&mut b);
        let stranger = participant(Uuid::new_v4());
        let err = CheckIn::new(&b, &stranger, "k.jpg".into(), None, "CHECKIN-y".into()).unwrap_err();
        assert_eq!(err, CheckInError::ForeignParticipant);
    }

    #[test]
    fn test_review_stamps_reviewer() {
        let mut b = booking();
        confirm(&mut b);
        let staff = Uuid::new_v4();

        let mut verified = open(&b).unwrap();
        verified.review(CheckInEvent::Verify, staff, Utc::now()).unwrap();
        assert_eq!(verified.status, CheckInStatus::Verified);
        assert_eq!(verified.verified_by, Some(staff));

        let mut rejected = open(&b).unwrap();
        rejected
            .review(CheckInEvent::Reject { reason: "  ".into() }, staff, Utc::now())
            .unwrap();
        assert_eq!(rejected.status, CheckInStatus::Rejected);
        assert_eq!(rejected.rejection_reason, "Dokumen tidak sesuai");
        assert!(rejected.verified_at.is_some());
    }

    #[test]
    fn test_review_only_from_pending() {
        let mut b = booking();
        confirm(&mut b);
        let mut c = open(&b).unwrap();
        c.review(CheckInEvent::Verify, Uuid::new_v4(), Utc::now()).unwrap();
        let err = c
            .review(CheckInEvent::Reject { reason: "x".into() }, Uuid::new_v4(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CheckInError::InvalidTransition { .. }));
        assert_eq!(c.status, CheckInStatus::Verified);
    }
}
