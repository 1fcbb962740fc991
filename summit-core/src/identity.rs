use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use summit_shared::forms::{age_on, is_valid_email, is_valid_phone, parse_date};
use summit_shared::models::BloodType;
use summit_shared::FieldErrors;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    #[serde(rename = "pendaki")]
    Climber,
    #[serde(rename = "admin")]
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Climber => "pendaki",
            Role::Staff => "admin",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Climber => "Pendaki",
            Role::Staff => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendaki" => Ok(Role::Climber),
            "admin" => Ok(Role::Staff),
            other => Err(IdentityError::UnknownRole(other.to_string())),
        }
    }
}

/// A portal account. The role is fixed when the account is created.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub phone_number: String,
    pub date_of_birth: Option<NaiveDate>,
    pub profile_picture: Option<String>,
    #[serde(skip_serializing)]
    pub admin_code: Option<String>,
    pub position: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub blood_type: Option<BloodType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    fn blank(email: &str, role: Role, password_hash: String) -> Self {
        let now = Utc::now();
        let email = email.trim().to_lowercase();
        Self {
            id: Uuid::new_v4(),
            username: username_for(&email),
            email,
            password_hash,
            first_name: String::new(),
            last_name: String::new(),
            role,
            phone_number: String::new(),
            date_of_birth: None,
            profile_picture: None,
            admin_code: None,
            position: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            blood_type: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// "First Last", or the username when both names are blank.
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }

    pub fn age(&self, today: NaiveDate) -> Option<i32> {
        self.date_of_birth.map(|dob| age_on(dob, today))
    }

    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    /// Applies a validated profile edit.
    pub fn apply_profile(&mut self, edit: ProfileUpdate, profile_picture: Option<String>) {
        self.first_name = edit.first_name;
        self.last_name = edit.last_name;
        self.phone_number = edit.phone_number;
        if profile_picture.is_some() {
            self.profile_picture = profile_picture;
        }
        self.updated_at = Utc::now();
    }
}

/// Username derived from the local part of the email.
pub fn username_for(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// Limits and secrets applied at registration.
#[derive(Debug, Clone)]
pub struct RegistrationRules {
    pub min_age: i32,
    pub max_age: i32,
    pub admin_secret_code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClimberRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub date_of_birth: String,
    pub blood_type: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub password1: String,
    pub password2: String,
    pub agree_terms: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StaffRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub position: String,
    pub admin_secret_code: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PasswordPolicy {
    /// Must mix letters and digits.
    Mixed,
    /// Must not be digits only.
    NotNumeric,
}

fn check_password(errors: &mut FieldErrors, password1: &str, password2: &str, policy: PasswordPolicy) {
    if password1.chars().count() < 8 {
        errors.add("password1", "Password minimal 8 karakter.");
    } else if password1.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password1", "Password tidak boleh hanya angka.");
    } else if policy == PasswordPolicy::Mixed && password1.chars().all(char::is_alphabetic) {
        errors.add("password1", "Password harus mengandung kombinasi huruf dan angka.");
    }
    if password1 != password2 {
        errors.add("password2", "Konfirmasi password tidak sama.");
    }
}

fn check_common(errors: &mut FieldErrors, first: &str, last: &str, email: &str, phone: &str) {
    errors.require("first_name", first);
    errors.require("last_name", last);
    if email.trim().is_empty() {
        errors.require("email", email);
    } else if !is_valid_email(email) {
        errors.add("email", "Masukkan alamat email yang valid.");
    }
    if phone.trim().is_empty() {
        errors.require("phone_number", phone);
    } else if !is_valid_phone(phone.trim()) {
        errors.add("phone_number", "Format: '+999999999'. Maksimal 15 digit.");
    }
}

impl ClimberRegistration {
    /// Validates the form; on success returns the password to hash and a
    /// user waiting for its hash.
    pub fn validate(&self, rules: &RegistrationRules, today: NaiveDate) -> Result<PendingUser, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_common(&mut errors, &self.first_name, &self.last_name, &self.email, &self.phone_number);

        let date_of_birth = match parse_date(&self.date_of_birth) {
            Some(dob) => {
                let age = age_on(dob, today);
                if age < rules.min_age {
                    errors.add(
                        "date_of_birth",
                        format!("Anda harus berusia minimal {} tahun untuk mendaftar.", rules.min_age),
                    );
                } else if age > rules.max_age {
                    errors.add("date_of_birth", "Tanggal lahir tidak valid.");
                }
                Some(dob)
            }
            None => {
                errors.add("date_of_birth", "Masukkan tanggal yang valid.");
                None
            }
        };

        let blood_type = self
            .blood_type
            .parse::<BloodType>()
            .map_err(|msg| errors.add("blood_type", msg))
            .ok();
        errors.require("emergency_contact_name", &self.emergency_contact_name);
        errors.require("emergency_contact_phone", &self.emergency_contact_phone);
        check_password(&mut errors, &self.password1, &self.password2, PasswordPolicy::Mixed);
        if !self.agree_terms {
            errors.add("agree_terms", "Anda harus menyetujui syarat dan ketentuan.");
        }

        errors.into_result()?;

        let mut user = User::blank(&self.email, Role::Climber, String::new());
        user.first_name = self.first_name.trim().to_string();
        user.last_name = self.last_name.trim().to_string();
        user.phone_number = self.phone_number.trim().to_string();
        user.date_of_birth = date_of_birth;
        user.blood_type = blood_type;
        user.emergency_contact_name = Some(self.emergency_contact_name.trim().to_string());
        user.emergency_contact_phone = Some(self.emergency_contact_phone.trim().to_string());
        Ok(PendingUser {
            user,
            password: self.password1.clone(),
        })
    }
}

impl StaffRegistration {
    pub fn validate(&self, rules: &RegistrationRules) -> Result<PendingUser, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_common(&mut errors, &self.first_name, &self.last_name, &self.email, &self.phone_number);
        errors.require("position", &self.position);
        if rules.admin_secret_code.is_empty() || self.admin_secret_code != rules.admin_secret_code {
            errors.add(
                "admin_secret_code",
                "Kode admin tidak valid. Hubungi supervisor untuk mendapatkan kode yang benar.",
            );
        }
        check_password(&mut errors, &self.password1, &self.password2, PasswordPolicy::NotNumeric);

        errors.into_result()?;

        let mut user = User::blank(&self.email, Role::Staff, String::new());
        user.first_name = self.first_name.trim().to_string();
        user.last_name = self.last_name.trim().to_string();
        user.phone_number = self.phone_number.trim().to_string();
        user.position = Some(self.position.trim().to_string());
        user.admin_code = Some(self.admin_secret_code.clone());
        Ok(PendingUser {
            user,
            password: self.password1.clone(),
        })
    }
}

/// A validated registration whose password has not been hashed yet.
#[derive(Debug)]
pub struct PendingUser {
    pub user: User,
    pub password: String,
}

impl PendingUser {
    pub fn into_user(self, cost: u32) -> Result<User, IdentityError> {
        let mut user = self.user;
        user.password_hash = hash_password(&self.password, cost)?;
        Ok(user)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("first_name", &self.first_name);
        errors.require("last_name", &self.last_name);
        if !self.phone_number.trim().is_empty() && !is_valid_phone(self.phone_number.trim()) {
            errors.add("phone_number", "Format: '+999999999'. Maksimal 15 digit.");
        }
        errors.into_result()
    }

    pub fn trimmed(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
        }
    }
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, IdentityError> {
    bcrypt::hash(password, cost).map_err(|e| IdentityError::Hashing(e.to_string()))
}

/// Checks a login attempt against a stored account.
pub fn authenticate(user: &User, password: &str) -> Result<(), IdentityError> {
    match bcrypt::verify(password, &user.password_hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(IdentityError::InvalidCredentials),
        Err(e) => {
            tracing::warn!(user_id = %user.id, "unreadable password hash: {}", e);
            Err(IdentityError::InvalidCredentials)
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Email atau password salah.")]
    InvalidCredentials,

    #[error("Email sudah terdaftar. Silakan gunakan email lain atau login.")]
    EmailTaken,

    #[error("Role tidak dikenal: {0}")]
    UnknownRole(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    fn rules() -> RegistrationRules {
        RegistrationRules {
            min_age: 17,
            max_age: 100,
            admin_secret_code: "puncak-3726".into(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn climber() -> ClimberRegistration {
        ClimberRegistration {
            first_name: "Sari".into(),
            last_name: "Dewi".into(),
            email: "Sari.Dewi@Example.com".into(),
            phone_number: "081234567890".into(),
            date_of_birth: "1998-05-01".into(),
            blood_type: "AB".into(),
            emergency_contact_name: "Budi".into(),
            emergency_contact_phone: "081298765432".into(),
            password1: "rinjani2026".into(),
            password2: "rinjani2026".into(),
            agree_terms: true,
        }
    }

    fn staff() -> StaffRegistration {
        StaffRegistration {
            first_name: "Agus".into(),
            last_name: "Salim".into(),
            email: "agus@summitbook.id".into(),
            phone_number: "+6281234567890".into(),
            position: "Staff Operasional".into(),
            admin_secret_code: "puncak-3726".into(),
            password1: "operasional".into(),
            password2: "operasional".into(),
        }
    }

    #[test]
    fn test_climber_registration_normalizes_email() {
        let pending = climber().validate(&rules(), today()).unwrap();
        assert_eq!(pending.user.email, "sari.dewi@example.com");
        assert_eq!(pending.user.username, "sari.dewi");
        assert_eq!(pending.user.role, Role::Climber);
        assert_eq!(pending.user.blood_type, Some(BloodType::AB));
    }

    #[test]
    fn test_climber_password_rules() {
        let mut form = climber();
        form.password1 = "12345678".into();
        form.password2 = "12345678".into();
        assert_eq!(
            form.validate(&rules(), today()).unwrap_err().get("password1"),
            Some("Password tidak boleh hanya angka.")
        );

        form.password1 = "hanyahuruf".into();
        form.password2 = "hanyahuruf".into();
        assert!(form.validate(&rules(), today()).unwrap_err().has("password1"));

        form.password1 = "rinjani2026".into();
        form.password2 = "rinjani2027".into();
        assert!(form.validate(&rules(), today()).unwrap_err().has("password2"));
    }

    #[test]
    fn test_climber_age_window() {
        let mut form = climber();
        form.date_of_birth = "2010-01-01".into();
        assert!(form.validate(&rules(), today()).unwrap_err().has("date_of_birth"));
        form.date_of_birth = "1920-01-01".into();
        assert_eq!(
            form.validate(&rules(), today()).unwrap_err().get("date_of_birth"),
            Some("Tanggal lahir tidak valid.")
        );
    }

    #[test]
    fn test_terms_and_phone_required() {
        let mut form = climber();
        form.agree_terms = false;
        form.phone_number = "12ab".into();
        let err = form.validate(&rules(), today()).unwrap_err();
        assert!(err.has("agree_terms"));
        assert!(err.has("phone_number"));
    }

    #[test]
    fn test_staff_requires_configured_secret() {
        assert_eq!(staff().validate(&rules()).unwrap().user.role, Role::Staff);

        let mut wrong = staff();
        wrong.admin_secret_code = "RINJANI2025".into();
        assert!(wrong.validate(&rules()).unwrap_err().has("admin_secret_code"));

        let unset = RegistrationRules {
            admin_secret_code: String::new(),
            ..rules()
        };
        let mut blank = staff();
        blank.admin_secret_code = String::new();
        assert!(blank.validate(&unset).unwrap_err().has("admin_secret_code"));
    }

    #[test]
    fn test_staff_password_may_be_letters_only() {
        assert!(staff().validate(&rules()).is_ok());
    }

    #[test]
    fn test_hash_and_authenticate() {
        let user = climber()
            .validate(&rules(), today())
            .unwrap()
            .into_user(TEST_COST)
            .unwrap();
        assert_ne!(user.password_hash, "rinjani2026");
        assert!(authenticate(&user, "rinjani2026").is_ok());
        assert_eq!(authenticate(&user, "salah"), Err(IdentityError::InvalidCredentials));
    }

    #[test]
    fn test_full_name_falls_back_to_username() {
        let mut user = staff().validate(&rules()).unwrap().user;
        assert_eq!(user.full_name(), "Agus Salim");
        user.first_name.clear();
        user.last_name.clear();
        assert_eq!(user.full_name(), "agus");
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!("pendaki".parse::<Role>().unwrap(), Role::Climber);
        assert_eq!(Role::Staff.to_string(), "admin");
        assert!("root".parse::<Role>().is_err());
    }
}
