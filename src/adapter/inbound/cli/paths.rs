//! Path utilities for wheelhouse.
//!
//! All data lives under `~/.wheelhouse/`:
//! - `~/.wheelhouse/config.toml` - main configuration
//! - `~/.wheelhouse/wheelhouse.db` - position ledger database

use std::path::PathBuf;

/// Returns the wheelhouse home directory (`~/.wheelhouse/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".wheelhouse")
}

/// Returns the default config file path (`~/.wheelhouse/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

/// Returns the default database path (`~/.wheelhouse/wheelhouse.db`).
pub fn default_database() -> PathBuf {
    home_dir().join("wheelhouse.db")
}
