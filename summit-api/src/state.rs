use std::sync::Arc;

use summit_booking::WizardRules;
use summit_core::identity::RegistrationRules;
use summit_core::repository::{BookingRepository, CatalogRepository, CheckInRepository, UserRepository};
use summit_store::{app_config, BookingRules, LocalMedia, MemoryStore};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
    /// Token lifetime when the user ticks "remember me".
    pub remember_me: u64,
    pub admin_secret_code: String,
    pub password_cost: u32,
}

impl From<&app_config::AuthConfig> for AuthConfig {
    fn from(cfg: &app_config::AuthConfig) -> Self {
        Self {
            secret: cfg.jwt_secret.clone(),
            expiration: cfg.jwt_expiration_seconds,
            remember_me: cfg.remember_me_seconds,
            admin_secret_code: cfg.admin_secret_code.clone(),
            password_cost: cfg.password_cost,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub checkins: Arc<dyn CheckInRepository>,
    pub media: LocalMedia,
    pub auth: AuthConfig,
    pub rules: BookingRules,
}

impl AppState {
    /// Every repository backed by one in-memory store.
    pub fn in_memory(store: Arc<MemoryStore>, media: LocalMedia, auth: AuthConfig, rules: BookingRules) -> Self {
        Self {
            users: store.clone(),
            catalog: store.clone(),
            bookings: store.clone(),
            checkins: store,
            media,
            auth,
            rules,
        }
    }

    pub fn wizard_rules(&self) -> WizardRules {
        WizardRules {
            min_lead_days: self.rules.min_lead_days,
            max_participants: self.rules.max_participants,
            min_participant_age: self.rules.min_participant_age,
        }
    }

    pub fn registration_rules(&self) -> RegistrationRules {
        RegistrationRules {
            min_age: self.rules.min_participant_age,
            max_age: self.rules.max_registrant_age,
            admin_secret_code: self.auth.admin_secret_code.clone(),
        }
    }
}
