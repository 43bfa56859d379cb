//! Tool configuration module.
//!
//! Handles loading, validating, and merging `panotour.toml`. A config file is
//! sparse: it is merged key by key over the stock defaults, so it only needs
//! the values it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [export]
//! title = "Virtual tour"       # Page title of exported sites
//! show_title = true            # Show the title as a heading
//! show_scene_bar = true        # Show the slide-out scene menu
//! image_quality = "optimized"  # native | optimized (1 MiB) | reduced (256 KiB)
//! url_images = "keep"          # External panoramas stay as URLs
//!
//! [assets]
//! dir = "assets"               # Holds marzipano.min.js and icons.css
//!
//! [storage]
//! snapshot = ".panotour/snapshot.json"
//! autosave_delay_ms = 2000
//!
//! [publish]
//! endpoint = ""                # Full URL of the publish API
//!
//! [processing]
//! max_processes = 4            # Max parallel transcodes (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::generate::{ExportOptions, UrlImages};
use crate::imaging::ImageQuality;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "panotour.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `panotour.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Defaults for `export`.
    pub export: ExportConfig,
    /// Static viewer assets shipped with every export.
    pub assets: AssetsConfig,
    /// Snapshot location and auto-save timing.
    pub storage: StorageConfig,
    /// Remote publishing.
    pub publish: PublishConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assets.dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("assets.dir must not be empty".into()));
        }
        if self.storage.snapshot.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage.snapshot must not be empty".into(),
            ));
        }
        let endpoint = &self.publish.endpoint;
        if !endpoint.is_empty()
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ConfigError::Validation(
                "publish.endpoint must be an http(s) URL".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Export defaults; CLI flags override them per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub title: String,
    pub show_title: bool,
    pub show_scene_bar: bool,
    pub image_quality: ImageQuality,
    pub url_images: UrlImages,
}

impl Default for ExportConfig {
    fn default() -> Self {
        let options = ExportOptions::default();
        Self {
            title: options.title,
            show_title: options.show_title,
            show_scene_bar: options.show_scene_bar,
            image_quality: options.image_quality,
            url_images: options.url_images,
        }
    }
}

impl ExportConfig {
    pub fn to_options(&self) -> ExportOptions {
        ExportOptions {
            title: self.title.clone(),
            show_title: self.show_title,
            show_scene_bar: self.show_scene_bar,
            image_quality: self.image_quality,
            url_images: self.url_images,
            autorotate: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    /// Directory containing `marzipano.min.js` and `icons.css`.
    pub dir: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// File holding the last auto-saved snapshot.
    pub snapshot: PathBuf,
    /// Quiet period after the last edit before the snapshot is written.
    pub autosave_delay_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot: PathBuf::from(".panotour/snapshot.json"),
            autosave_delay_ms: 2000,
        }
    }
}

impl StorageConfig {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Full URL of the publish API. Empty disables publishing unless
    /// `--endpoint` is given.
    pub endpoint: String,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of scenes transcoded in parallel.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when the file is
/// missing.
pub fn load_config(path: &Path) -> Result<ToolConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `panotour.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# panotour configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Export defaults (overridable with `panotour export` flags)
# ---------------------------------------------------------------------------
[export]
# Page title of the exported site.
title = "Virtual tour"

# Show the title as a heading above the viewer.
show_title = true

# Show the slide-out scene menu.
show_scene_bar = true

# Embedded panorama size budget:
#   native    -> keep images as imported
#   optimized -> re-encode as JPEG under 1 MiB
#   reduced   -> re-encode as JPEG under 256 KiB
image_quality = "optimized"

# Scenes pointing at external URLs. Only "keep" is supported.
url_images = "keep"

# ---------------------------------------------------------------------------
# Static viewer assets
# ---------------------------------------------------------------------------
[assets]
# Directory containing marzipano.min.js and icons.css, copied into every
# export unchanged.
dir = "assets"

# ---------------------------------------------------------------------------
# Snapshots
# ---------------------------------------------------------------------------
[storage]
# Where the last auto-saved project is kept. `panotour restore` reads it.
snapshot = ".panotour/snapshot.json"

# Quiet period after the last edit before the snapshot is written.
autosave_delay_ms = 2000

# ---------------------------------------------------------------------------
# Publishing
# ---------------------------------------------------------------------------
[publish]
# Full URL of the publish API, e.g. "https://forge.example.org/api/publish".
endpoint = ""

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum scenes transcoded in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
