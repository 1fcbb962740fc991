use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use summit_shared::forms::age_on;
use summit_shared::models::{BloodType, Gender};
use summit_shared::Masked;

/// Identity, contact and health details of one climber on a booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantProfile {
    pub full_name: String,
    /// National ID (NIK) or passport number.
    pub id_number: Masked<String>,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub blood_type: BloodType,
    pub phone_number: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub emergency_contact_relation: String,
    pub health_notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub booking_id: Uuid,
    #[serde(flatten)]
    pub profile: ParticipantProfile,
    pub health_certificate: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(booking_id: Uuid, profile: ParticipantProfile, health_certificate: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_id,
            profile,
            health_certificate,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the profile; a new certificate replaces the old one, `None`
    /// keeps whatever was uploaded before.
    pub fn update(&mut self, profile: ParticipantProfile, health_certificate: Option<String>) {
        self.profile = profile;
        if health_certificate.is_some() {
            self.health_certificate = health_certificate;
        }
        self.updated_at = Utc::now();
    }

    pub fn age(&self, today: NaiveDate) -> i32 {
        age_on(self.profile.date_of_birth, today)
    }

    pub fn full_name(&self) -> &str {
        &self.profile.full_name
    }

    pub fn id_number(&self) -> &str {
        self.profile.id_number.expose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn profile(name: &str) -> ParticipantProfile {
        ParticipantProfile {
            full_name: name.to_string(),
            id_number: Masked("5201234567890001".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1995, 3, 10).unwrap(),
            gender: Gender::Female,
            blood_type: BloodType::O,
            phone_number: "081234567890".into(),
            email: "sari@example.com".into(),
            address: String::new(),
            city: "Mataram".into(),
            province: "Nusa Tenggara Barat".into(),
            postal_code: String::new(),
            emergency_contact_name: "Budi".into(),
            emergency_contact_phone: "081298765432".into(),
            emergency_contact_relation: "Orang Tua".into(),
            health_notes: String::new(),
        }
    }

    #[test]
    fn test_update_keeps_certificate_when_none_given() {
        let mut p = Participant::new(
            Uuid::new_v4(),
            profile("Sari"),
            Some("participants/health_certificates/a.pdf".into()),
        );
        p.update(profile("Sari Dewi"), None);
        assert_eq!(p.full_name(), "Sari Dewi");
        assert_eq!(
            p.health_certificate.as_deref(),
            Some("participants/health_certificates/a.pdf")
        );
    }

    #[test]
    fn test_age_and_masked_debug() {
        let p = Participant::new(Uuid::new_v4(), profile("Sari"), None);
        assert_eq!(p.age(NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()), 30);
        assert_eq!(p.age(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()), 31);
        assert!(!format!("{:?}", p).contains("5201234567890001"));
        assert_eq!(p.id_number(), "5201234567890001");
    }
}
