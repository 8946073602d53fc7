//! Service configuration.

use serde::Deserialize;
use std::path::Path;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to the `RocksDB` data directory (default: "/data/aislepay").
    pub data_dir: String,

    /// JWT validation base URL; JWKS is fetched from
    /// `<base>/.well-known/jwks.json`.
    pub auth_base_url: String,

    /// Expected JWT audience (default: "aislepay").
    pub auth_audience: String,

    /// Admin API key for operator requests via `x-admin-key`.
    pub admin_api_key: Option<String>,

    /// Razorpay key id (reference only; the service never calls out).
    pub razorpay_key_id: Option<String>,

    /// Razorpay webhook signing secret. When unset, signature
    /// verification is skipped (development mode).
    pub razorpay_webhook_secret: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Seconds between auto-release sweeps; 0 disables the sweeper.
    pub auto_release_interval_seconds: u64,
}

/// Razorpay secrets file structure.
#[derive(Debug, Deserialize)]
struct RazorpaySecrets {
    key_id: String,
    #[serde(default)]
    webhook_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        // Try to load Razorpay secrets from file first, then fall back to
        // env vars
        let (razorpay_key_id, razorpay_webhook_secret) = load_razorpay_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/aislepay".into()),
            auth_base_url: std::env::var("AUTH_BASE_URL")
                .unwrap_or_else(|_| "https://id.aislepay.in".into()),
            auth_audience: std::env::var("AUTH_AUDIENCE").unwrap_or_else(|_| "aislepay".into()),
            admin_api_key: std::env::var("ADMIN_API_KEY").ok(),
            razorpay_key_id,
            razorpay_webhook_secret,
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            auto_release_interval_seconds: std::env::var("AUTO_RELEASE_INTERVAL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
        }
    }
}

/// Load Razorpay secrets from file or environment.
fn load_razorpay_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/razorpay.json",
        "aislepay/.secrets/razorpay.json",
        "../.secrets/razorpay.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<RazorpaySecrets>(path) {
            tracing::info!(path = %path, "Loaded Razorpay secrets from file");
            return (Some(secrets.key_id), secrets.webhook_secret);
        }
    }

    // Fall back to environment variables
    tracing::debug!("Razorpay secrets file not found, using environment variables");
    (
        std::env::var("RAZORPAY_KEY_ID").ok(),
        std::env::var("RAZORPAY_WEBHOOK_SECRET").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/aislepay".into(),
            auth_base_url: "https://id.aislepay.in".into(),
            auth_audience: "aislepay".into(),
            admin_api_key: None,
            razorpay_key_id: None,
            razorpay_webhook_secret: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            auto_release_interval_seconds: 60,
        }
    }
}
