use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use uuid::Uuid;

use summit_catalog::Route;
use summit_shared::forms::{age_on, is_valid_email, parse_date};
use summit_shared::models::{BloodType, Gender};
use summit_shared::{FieldErrors, Masked};

use crate::participant::ParticipantProfile;

/// Limits applied by the booking wizard.
#[derive(Debug, Clone)]
pub struct WizardRules {
    /// Earliest start date is today plus this many days.
    pub min_lead_days: i64,
    pub max_participants: i32,
    pub min_participant_age: i32,
}

impl Default for WizardRules {
    fn default() -> Self {
        Self {
            min_lead_days: 7,
            max_participants: 10,
            min_participant_age: 17,
        }
    }
}

/// Step 1: schedule and group size.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingForm {
    pub route_id: Uuid,
    pub start_date: String,
    pub num_participants: i32,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSelection {
    pub start_date: NaiveDate,
    pub num_participants: i32,
    pub notes: String,
}

impl BookingForm {
    pub fn validate(
        &self,
        route: &Route,
        rules: &WizardRules,
        today: NaiveDate,
    ) -> Result<ScheduleSelection, FieldErrors> {
        let mut errors = FieldErrors::new();

        if !route.is_active {
            errors.add("route_id", "Jalur yang dipilih tidak tersedia.");
        }

        let start_date = match parse_date(&self.start_date) {
            Some(date) => {
                if date < today + Duration::days(rules.min_lead_days) {
                    errors.add(
                        "start_date",
                        format!("Booking minimal H-{} dari tanggal keberangkatan", rules.min_lead_days),
                    );
                }
                Some(date)
            }
            None => {
                errors.add("start_date", "Masukkan tanggal yang valid.");
                None
            }
        };

        let limit = rules.max_participants.min(route.max_participants);
        if self.num_participants < 1 {
            errors.add("num_participants", "Minimal 1 peserta");
        } else if self.num_participants > limit {
            errors.add(
                "num_participants",
                format!("Maksimal {} peserta per booking", limit),
            );
        }

        errors.into_result()?;

        Ok(ScheduleSelection {
            start_date: start_date.unwrap_or(today),
            num_participants: self.num_participants,
            notes: self.notes.trim().to_string(),
        })
    }
}

/// Step 2: one participant's details, as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParticipantForm {
    pub full_name: String,
    pub id_number: String,
    pub date_of_birth: String,
    pub gender: String,
    pub blood_type: String,
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

impl ParticipantForm {
    /// Assigns a named text field, as read from a multipart body.
    /// Returns `false` for names the form does not know.
    pub fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "full_name" => &mut self.full_name,
            "id_number" => &mut self.id_number,
            "date_of_birth" => &mut self.date_of_birth,
            "gender" => &mut self.gender,
            "blood_type" => &mut self.blood_type,
            "phone_number" => &mut self.phone_number,
            "email" => &mut self.email,
            "address" => &mut self.address,
            "city" => &mut self.city,
            "province" => &mut self.province,
            "postal_code" => &mut self.postal_code,
            "emergency_contact_name" => &mut self.emergency_contact_name,
            "emergency_contact_phone" => &mut self.emergency_contact_phone,
            "emergency_contact_relation" => &mut self.emergency_contact_relation,
            "health_notes" => &mut self.health_notes,
            _ => return false,
        };
        *slot = value;
        true
    }

    pub fn validate(&self, rules: &WizardRules, today: NaiveDate) -> Result<ParticipantProfile, FieldErrors> {
        let mut errors = FieldErrors::new();

        for (field, value) in [
            ("full_name", &self.full_name),
            ("id_number", &self.id_number),
            ("phone_number", &self.phone_number),
            ("email", &self.email),
            ("emergency_contact_name", &self.emergency_contact_name),
            ("emergency_contact_phone", &self.emergency_contact_phone),
            ("emergency_contact_relation", &self.emergency_contact_relation),
        ] {
            errors.require(field, value);
        }

        if !self.email.trim().is_empty() && !is_valid_email(&self.email) {
            errors.add("email", "Masukkan alamat email yang valid.");
        }
        if self.id_number.trim().chars().count() > 50 {
            errors.add("id_number", "Maksimal 50 karakter.");
        }
        if self.postal_code.trim().chars().count() > 10 {
            errors.add("postal_code", "Maksimal 10 karakter.");
        }

        let date_of_birth = match parse_date(&self.date_of_birth) {
            Some(dob) if age_on(dob, today) < rules.min_participant_age => {
                errors.add(
                    "date_of_birth",
                    format!("Peserta harus berusia minimal {} tahun", rules.min_participant_age),
                );
                None
            }
            Some(dob) => Some(dob),
            None => {
                errors.add("date_of_birth", "Masukkan tanggal yang valid.");
                None
            }
        };

        let gender = self
            .gender
            .parse::<Gender>()
            .map_err(|msg| errors.add("gender", msg))
            .ok();
        let blood_type = self
            .blood_type
            .parse::<BloodType>()
            .map_err(|msg| errors.add("blood_type", msg))
            .ok();

        match (date_of_birth, gender, blood_type) {
            (Some(date_of_birth), Some(gender), Some(blood_type)) if errors.is_empty() => {
                Ok(ParticipantProfile {
                    full_name: self.full_name.trim().to_string(),
                    id_number: Masked(self.id_number.trim().to_string()),
                    date_of_birth,
                    gender,
                    blood_type,
                    phone_number: self.phone_number.trim().to_string(),
                    email: self.email.trim().to_string(),
                    address: self.address.trim().to_string(),
                    city: self.city.trim().to_string(),
                    province: self.province.trim().to_string(),
                    postal_code: self.postal_code.trim().to_string(),
                    emergency_contact_name: self.emergency_contact_name.trim().to_string(),
                    emergency_contact_phone: self.emergency_contact_phone.trim().to_string(),
                    emergency_contact_relation: self.emergency_contact_relation.trim().to_string(),
                    health_notes: self.health_notes.trim().to_string(),
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn route() -> Route {
        Route::new(Uuid::new_v4(), "Jalur Senaru", "", "Desa Senaru", 3, 2, 22.5, 1_800_000)
    }

    fn form(start: &str, n: i32) -> BookingForm {
        BookingForm {
            route_id: Uuid::new_v4(),
            start_date: start.to_string(),
            num_participants: n,
            notes: "  bawa porter  ".into(),
        }
    }

    fn participant(dob: &str) -> ParticipantForm {
        ParticipantForm {
            full_name: "Sari Dewi".into(),
            id_number: "5201234567890001".into(),
            date_of_birth: dob.into(),
            gender: "female".into(),
            blood_type: "O".into(),
            phone_number: "081234567890".into(),
            email: "sari@example.com".into(),
            emergency_contact_name: "Budi".into(),
            emergency_contact_phone: "081298765432".into(),
            emergency_contact_relation: "Orang Tua".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_start_date_needs_seven_days_lead() {
        let rules = WizardRules::default();
        let err = form("2026-10-22", 2).validate(&route(), &rules, today()).unwrap_err();
        assert_eq!(err.get("start_date"), Some("Booking minimal H-7 dari tanggal keberangkatan"));

        let ok = form("2026-10-23", 2).validate(&route(), &rules, today()).unwrap();
        assert_eq!(ok.start_date, NaiveDate::from_ymd_opt(2026, 10, 23).unwrap());
        assert_eq!(ok.notes, "bawa porter");
    }

    #[test]
    fn test_participant_count_bounds() {
        let rules = WizardRules::default();
        assert!(form("2026-12-01", 0).validate(&route(), &rules, today()).unwrap_err().has("num_participants"));
        assert!(form("2026-12-01", 11).validate(&route(), &rules, today()).unwrap_err().has("num_participants"));

        let mut small = route();
        small.max_participants = 4;
        let err = form("2026-12-01", 5).validate(&small, &rules, today()).unwrap_err();
        assert_eq!(err.get("num_participants"), Some("Maksimal 4 peserta per booking"));
    }

    #[test]
    fn test_malformed_date_rejected() {
        let err = form("20-10-2026", 1)
            .validate(&route(), &WizardRules::default(), today())
            .unwrap_err();
        assert_eq!(err.get("start_date"), Some("Masukkan tanggal yang valid."));
    }

    #[test]
    fn test_underage_participant_rejected() {
        let rules = WizardRules::default();
        let t = today();
        let sixteen = NaiveDate::from_ymd_opt(t.year() - 17, t.month(), t.day() + 1).unwrap();
        let err = participant(&sixteen.to_string()).validate(&rules, t).unwrap_err();
        assert_eq!(err.get("date_of_birth"), Some("Peserta harus berusia minimal 17 tahun"));

        let seventeen = NaiveDate::from_ymd_opt(t.year() - 17, t.month(), t.day()).unwrap();
        assert!(participant(&seventeen.to_string()).validate(&rules, t).is_ok());
    }

    #[test]
    fn test_participant_required_fields_and_choices() {
        let mut p = participant("1990-01-01");
        p.full_name = " ".into();
        p.gender = "other".into();
        p.blood_type = "C".into();
        p.email = "not-an-email".into();
        let err = p.validate(&WizardRules::default(), today()).unwrap_err();
        assert!(err.has("full_name"));
        assert!(err.has("gender"));
        assert!(err.has("blood_type"));
        assert!(err.has("email"));
    }

    #[test]
    fn test_set_assigns_known_fields_only() {
        let mut p = ParticipantForm::default();
        assert!(p.set("city", "Mataram".into()));
        assert!(!p.set("participant_id", "x".into()));
        assert_eq!(p.city, "Mataram");
    }
}
