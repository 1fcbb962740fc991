use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    #[serde(default)]
    pub booking_rules: BookingRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    /// Token lifetime when "remember me" is ticked at login.
    #[serde(default = "default_remember_me")]
    pub remember_me_seconds: u64,
    /// Shared secret staff must present at registration. Empty disables
    /// staff registration.
    #[serde(default)]
    pub admin_secret_code: String,
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
}

fn default_remember_me() -> u64 {
    1_209_600
}

fn default_password_cost() -> u32 {
    12
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    pub root: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BookingRules {
    pub code_prefix: String,
    pub min_lead_days: i64,
    pub max_participants: i32,
    pub min_participant_age: i32,
    pub max_registrant_age: i32,
    /// Fresh booking codes / QR payloads drawn before giving up on a collision.
    pub code_retry_attempts: u32,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            code_prefix: "RNJ".into(),
            min_lead_days: 7,
            max_participants: 10,
            min_participant_age: 17,
            max_registrant_age: 100,
            code_retry_attempts: 3,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `SUMMIT__AUTH__ADMIN_SECRET_CODE=...`
            .add_source(config::Environment::with_prefix("SUMMIT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_fall_back_to_defaults() {
        let s = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                port = 8080
                [database]
                url = "postgres://localhost/summit"
                [auth]
                jwt_secret = "s"
                jwt_expiration_seconds = 3600
                [media]
                root = "media"
                [booking_rules]
                min_lead_days = 3
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let cfg: Config = s.try_deserialize().unwrap();

        assert_eq!(cfg.booking_rules.min_lead_days, 3);
        assert_eq!(cfg.booking_rules.code_prefix, "RNJ");
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.auth.remember_me_seconds, 1_209_600);
        assert!(cfg.auth.admin_secret_code.is_empty());
    }
}
