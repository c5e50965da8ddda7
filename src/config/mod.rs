mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./reelmark.toml",
        "~/.config/reelmark/config.toml",
        "/etc/reelmark/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.server.auth.token_ttl_hours <= 0 {
        anyhow::bail!("Token TTL must be positive");
    }

    if config.views.reset_enabled && config.views.check_interval_secs == 0 {
        anyhow::bail!("Views check interval cannot be 0");
    }

    if config.streaming.content_type.trim().is_empty() {
        anyhow::bail!("Streaming content type cannot be empty");
    }

    if !config.storage.preview_dir.exists() {
        tracing::warn!(
            "Preview directory does not exist yet: {:?}",
            config.storage.preview_dir
        );
    }

    Ok(())
}
