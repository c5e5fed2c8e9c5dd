pub mod ask;
pub mod doctor;
pub mod init;
pub mod serve;
pub mod status;

use std::path::{Path, PathBuf};

use clinicchat_config::AppConfig;

/// The config file a command operates on.
pub fn config_file(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Load config (file, then env overrides) or fail with a readable message.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let path = config_file(explicit);
    AppConfig::load_with_env(&path)
        .map_err(|e| format!("Failed to load config: {e}").into())
}
