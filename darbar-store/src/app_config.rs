use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    pub auth: AuthConfig,
    #[serde(default)]
    pub stripe: StripeConfig,
    #[serde(default)]
    pub pushy: PushyConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub gateways: GatewayConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Keep documents in process memory instead of Postgres.
    #[serde(default)]
    pub in_memory: bool,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub refresh_secret: String,
    #[serde(default = "default_access_ttl")]
    pub access_token_seconds: u64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_seconds: u64,
}

fn default_access_ttl() -> u64 {
    7 * 24 * 3600
}

fn default_refresh_ttl() -> u64 {
    30 * 24 * 3600
}

#[derive(Debug, Deserialize, Clone)]
pub struct StripeConfig {
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "default_stripe_url")]
    pub api_url: String,
}

fn default_stripe_url() -> String {
    "https://api.stripe.com".to_string()
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            api_url: default_stripe_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PushyConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_pushy_url")]
    pub api_url: String,
}

fn default_pushy_url() -> String {
    "https://api.pushy.me".to_string()
}

impl Default for PushyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: default_pushy_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    #[serde(default)]
    pub api_key: String,
    /// OAuth token of a service account; only account deletion needs it.
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_identity_url")]
    pub api_url: String,
}

fn default_identity_url() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            access_token: String::new(),
            api_url: default_identity_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_storage_api")]
    pub api_url: String,
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

fn default_storage_api() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_public_url() -> String {
    "https://storage.googleapis.com".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            access_token: String::new(),
            api_url: default_storage_api(),
            public_url: default_public_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorsConfig {
    /// Empty means any origin.
    #[serde(default)]
    pub origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GatewayConfig {
    /// Use in-process identity, payment, push and storage services.
    #[serde(default)]
    pub use_mocks: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_rate_limit")]
    pub rate_limit_requests: i64,
    #[serde(default = "default_rate_window")]
    pub rate_limit_window_seconds: i64,
    #[serde(default = "default_max_games")]
    pub max_mini_games: usize,
    #[serde(default = "default_max_images")]
    pub max_upload_images: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_content_types")]
    pub allowed_image_types: Vec<String>,
    #[serde(default = "default_currency")]
    pub default_currency: String,
    #[serde(default = "default_breaker_threshold")]
    pub circuit_breaker_threshold: u32,
    #[serde(default = "default_breaker_timeout")]
    pub circuit_breaker_timeout_seconds: u64,
}

fn default_rate_limit() -> i64 {
    100
}
fn default_rate_window() -> i64 {
    60
}
fn default_max_games() -> usize {
    6
}
fn default_max_images() -> usize {
    50
}
fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}
fn default_content_types() -> Vec<String> {
    ["image/jpeg", "image/png", "image/webp", "image/gif"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_currency() -> String {
    "usd".to_string()
}
fn default_breaker_threshold() -> u32 {
    5
}
fn default_breaker_timeout() -> u64 {
    30
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            rate_limit_requests: default_rate_limit(),
            rate_limit_window_seconds: default_rate_window(),
            max_mini_games: default_max_games(),
            max_upload_images: default_max_images(),
            max_upload_bytes: default_max_upload_bytes(),
            allowed_image_types: default_content_types(),
            default_currency: default_currency(),
            circuit_breaker_threshold: default_breaker_threshold(),
            circuit_breaker_timeout_seconds: default_breaker_timeout(),
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
            // Untracked developer overrides
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `DARBAR__AUTH__JWT_SECRET=...`
            .add_source(config::Environment::with_prefix("DARBAR").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Self-contained configuration: in-memory documents, mock gateways, no Redis.
    pub fn for_tests() -> Self {
        Self {
            server: ServerConfig { port: 0 },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: default_max_connections(),
                in_memory: true,
            },
            redis: None,
            auth: AuthConfig {
                jwt_secret: "test-access-secret".to_string(),
                refresh_secret: "test-refresh-secret".to_string(),
                access_token_seconds: 3600,
                refresh_token_seconds: 7200,
            },
            stripe: StripeConfig::default(),
            pushy: PushyConfig::default(),
            identity: IdentityConfig::default(),
            storage: StorageConfig {
                bucket: "darbar-test".to_string(),
                ..StorageConfig::default()
            },
            cors: CorsConfig::default(),
            gateways: GatewayConfig { use_mocks: true },
            business_rules: BusinessRules::default(),
        }
    }
}
