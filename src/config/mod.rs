use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub checkin: CheckinConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub session_duration_days: i64,
}

/// Check-in policy knobs.
#[derive(Debug, Deserialize, Clone)]
pub struct CheckinConfig {
    /// Points credited to the owning member for each granted scan.
    pub points_per_scan: i64,
    /// Event label recorded when the scanner does not send one.
    pub default_event_name: String,
    /// Window in which a repeat granted scan of the same code awards nothing.
    /// Zero disables the check.
    pub repeat_scan_cooldown_seconds: i64,
}

impl Default for CheckinConfig {
    fn default() -> Self {
        Self {
            points_per_scan: 10,
            default_event_name: "General Access".to_string(),
            repeat_scan_cooldown_seconds: 0,
        }
    }
}

/// One year.
const MAX_COOLDOWN_SECONDS: i64 = 365 * 24 * 60 * 60;
const MAX_SESSION_DAYS: i64 = 3650;

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("database.url", "sqlite://membership.db")?
            .set_default("database.max_connections", 10)?
            .set_default("auth.session_duration_days", 30)?
            .set_default("checkin.points_per_scan", 10)?
            .set_default("checkin.default_event_name", "General Access")?
            .set_default("checkin.repeat_scan_cooldown_seconds", 0)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with KLUB__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("KLUB").separator("__"))

            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checkin.points_per_scan < 0 {
            return Err(ConfigError::Message(
                "checkin.points_per_scan must not be negative".to_string(),
            ));
        }
        if !(0..=MAX_COOLDOWN_SECONDS).contains(&self.checkin.repeat_scan_cooldown_seconds) {
            return Err(ConfigError::Message(format!(
                "checkin.repeat_scan_cooldown_seconds must be between 0 and {}",
                MAX_COOLDOWN_SECONDS
            )));
        }
        if !(1..=MAX_SESSION_DAYS).contains(&self.auth.session_duration_days) {
            return Err(ConfigError::Message(format!(
                "auth.session_duration_days must be between 1 and {}",
                MAX_SESSION_DAYS
            )));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: "sqlite://membership.db".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                session_duration_days: 30,
            },
            checkin: CheckinConfig::default(),
        }
    }
}
