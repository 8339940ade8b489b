//! Image configuration module.
//!
//! Handles loading, validating, and merging `fedimage.toml`. Stock defaults are
//! overridden by whatever keys the user file sets; everything else keeps its
//! default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [quality]
//! png_compression = 8   # PNG compression level (0-9)
//! jpeg_quality = 100    # JPEG/WebP quality (0-100)
//!
//! [backend]
//! animation = true      # Allow the multi-frame (animation-aware) backend
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! The values are resolved once into
//! [`EncodeSettings`](crate::imaging::EncodeSettings) and handed to every
//! [`ImageHandle`](crate::imaging::ImageHandle) at construction.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Image configuration loaded from `fedimage.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageConfig {
    /// Encoder quality settings.
    pub quality: QualityConfig,
    /// Backend availability.
    pub backend: BackendConfig,
}

impl ImageConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quality.png_compression > 9 {
            return Err(ConfigError::Validation(
                "quality.png_compression must be 0-9".into(),
            ));
        }
        if self.quality.jpeg_quality > 100 {
            return Err(ConfigError::Validation(
                "quality.jpeg_quality must be 0-100".into(),
            ));
        }
        Ok(())
    }
}

/// Encoder quality settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityConfig {
    /// PNG compression level on the zlib 0-9 scale.
    pub png_compression: u8,
    /// Lossy quality for JPEG and WebP output, 0-100.
    pub jpeg_quality: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            png_compression: 8,
            jpeg_quality: 100,
        }
    }
}

/// Which backends this host may use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// When false every image is decoded single-frame and animated WebP is
    /// rejected.
    pub animation: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { animation: true }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ImageConfig::default()).expect("default config must serialize")
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

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ImageConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ImageConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path`.
///
/// A missing file yields the stock defaults; a file with invalid TOML,
/// unknown keys or out-of-range values is an error.
pub fn load_config(path: &Path) -> Result<ImageConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `fedimage.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# fedimage configuration
# ======================
#
# All keys are optional. Anything left out keeps the value shown here.

# ---------------------------------------------------------------------------
# Quality
# ---------------------------------------------------------------------------
[quality]
# PNG compression level, 0 (fastest) to 9 (smallest).
png_compression = 8
# JPEG and WebP quality, 0-100.
jpeg_quality = 100

# ---------------------------------------------------------------------------
# Backends
# ---------------------------------------------------------------------------
[backend]
# Use the animation-aware backend for PNG output and animated GIF/WebP input.
# When disabled, animated WebP uploads are rejected.
animation = true
"##
}
