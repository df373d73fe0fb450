use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub geocoder: GeocoderSettings,
    #[serde(default)]
    pub mail: MailSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

/// Which `ProfileStore` implementation backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderSettings {
    #[serde(default = "default_geocoder_enabled")]
    pub enabled: bool,
    #[serde(default = "default_geocoder_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_geocoder_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_geocoder_cache_size")]
    pub cache_size: u64,
    #[serde(default = "default_geocoder_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Re-resolve donation coordinates when the pickup address is edited
    #[serde(default)]
    pub regeocode_on_edit: bool,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            enabled: default_geocoder_enabled(),
            base_url: default_geocoder_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_geocoder_timeout(),
            cache_size: default_geocoder_cache_size(),
            cache_ttl_secs: default_geocoder_cache_ttl(),
            regeocode_on_edit: false,
        }
    }
}

fn default_geocoder_enabled() -> bool { true }
fn default_geocoder_url() -> String { "https://nominatim.openstreetmap.org".to_string() }
fn default_user_agent() -> String { "sharehub-match".to_string() }
fn default_geocoder_timeout() -> u64 { 10 }
fn default_geocoder_cache_size() -> u64 { 10_000 }
fn default_geocoder_cache_ttl() -> u64 { 86_400 }

#[derive(Debug, Clone, Deserialize)]
pub struct MailSettings {
    /// HTTP relay endpoint; mail is only logged when unset
    pub relay_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_from_address")]
    pub from_address: String,
    #[serde(default = "default_reply_to")]
    pub reply_to: String,
    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_site_name")]
    pub site_name: String,
    #[serde(default = "default_site_url")]
    pub site_url: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            relay_url: None,
            api_key: None,
            from_address: default_from_address(),
            reply_to: default_reply_to(),
            timeout_secs: default_mail_timeout(),
            site_name: default_site_name(),
            site_url: default_site_url(),
        }
    }
}

fn default_from_address() -> String { "notifications@sharehub.local".to_string() }
fn default_reply_to() -> String { "support@sharehub.local".to_string() }
fn default_mail_timeout() -> u64 { 10 }
fn default_site_name() -> String { "UHV ShareHub".to_string() }
fn default_site_url() -> String { "http://127.0.0.1:8080".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_radius_km")]
    pub default_radius_km: f64,
    #[serde(default = "default_max_radius_km")]
    pub max_radius_km: f64,
    #[serde(default = "default_penalty_per_km")]
    pub penalty_per_km: f64,
    #[serde(default = "default_preference_bonus")]
    pub preference_bonus: f64,
    #[serde(default = "default_neutral_score")]
    pub neutral_score: f64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_radius_km: default_radius_km(),
            max_radius_km: default_max_radius_km(),
            penalty_per_km: default_penalty_per_km(),
            preference_bonus: default_preference_bonus(),
            neutral_score: default_neutral_score(),
        }
    }
}

fn default_radius_km() -> f64 { 50.0 }
fn default_max_radius_km() -> f64 { 200.0 }
fn default_penalty_per_km() -> f64 { 2.0 }
fn default_preference_bonus() -> f64 { 20.0 }
fn default_neutral_score() -> f64 { 50.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub issuer: Option<String>,
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

fn default_leeway() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Later sources override earlier ones:
    /// 1. `config/default.toml`
    /// 2. `config/local.toml` (development overrides)
    /// 3. Environment variables prefixed with `SHAREHUB__`,
    ///    e.g. `SHAREHUB__SERVER__PORT` -> server.port
    /// 4. `DATABASE_URL` for the database URL
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("SHAREHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_database_url(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("SHAREHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn scoring_rules(&self) -> crate::models::ScoringRules {
        crate::models::ScoringRules {
            penalty_per_km: self.matching.penalty_per_km,
            preference_bonus: self.matching.preference_bonus,
            neutral_score: self.matching.neutral_score,
        }
    }
}

/// `DATABASE_URL` wins over the layered value when set
fn apply_database_url(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        _ => Ok(settings),
    }
}
