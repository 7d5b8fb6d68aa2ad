use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Lost & Found listing server
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(name = "lostfound-server", version, about = "Lost & Found listing server")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "LOSTFOUND_PORT", default_value = "5000")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "LOSTFOUND_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./lostfound.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "LOSTFOUND_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Data directory for persistent state (DB, signing key)
    #[arg(long, env = "LOSTFOUND_DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Mark session cookies Secure with SameSite=None (required behind HTTPS
    /// when the web client is served from another origin)
    #[arg(long, env = "LOSTFOUND_SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Browser origins allowed to call the API with credentials
    /// (loaded from cors_origins in TOML)
    #[arg(skip)]
    #[serde(default)]
    pub cors_origins: Option<Vec<String>>,
}

/// Origins used when the TOML file does not set cors_origins.
pub fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            bind_address: "0.0.0.0".to_string(),
            config: "./lostfound.toml".to_string(),
            json_logs: false,
            generate_config: false,
            data_dir: "./data".to_string(),
            secure_cookies: false,
            cors_origins: None,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (LOSTFOUND_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("LOSTFOUND_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# Lost & Found Server Configuration
# Place this file at ./lostfound.toml or specify with --config <path>
# All settings can be overridden via environment variables (LOSTFOUND_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 5000)
# port = 5000

# Bind address (default: 0.0.0.0 — all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Data directory for the SQLite database and JWT signing key
# data_dir = "./data"

# Mark session cookies Secure with SameSite=None.
# Required when the web client is served over HTTPS from another origin.
# secure_cookies = false

# Browser origins allowed to call the API with credentials.
# cors_origins = [
#     "http://localhost:5173",
#     "https://lost-and-found-web.example.app",
# ]
"#
    .to_string()
}
