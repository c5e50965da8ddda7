use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub streaming: StreamingConfig,

    #[serde(default)]
    pub views: ViewsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Require a session token on progress and asset routes.
    /// When disabled every request acts as the default profile.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Lifetime of tokens minted with `reelmark issue-token` (default: 720)
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: i64,
}

fn default_true() -> bool {
    true
}

fn default_token_ttl() -> i64 {
    24 * 30
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            token_ttl_hours: default_token_ttl(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding the SQLite database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory preview images are written to and deleted from.
    #[serde(default = "default_preview_dir")]
    pub preview_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_preview_dir() -> PathBuf {
    PathBuf::from("./data/previews")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            preview_dir: default_preview_dir(),
        }
    }
}

impl StorageConfig {
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("reelmark.db")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamingConfig {
    /// Content-Type sent with every partial response.
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    "video/mp4".to_string()
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            content_type: default_content_type(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewsConfig {
    /// Run the monthly views reset task.
    #[serde(default = "default_true")]
    pub reset_enabled: bool,

    /// How often the task checks for a month rollover (default: 3600)
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
}

fn default_check_interval() -> u64 {
    3600
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            reset_enabled: default_true(),
            check_interval_secs: default_check_interval(),
        }
    }
}
