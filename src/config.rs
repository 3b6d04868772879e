//! Host configuration read from `SLIDESCOPE_*` environment variables.
//!
//! Every value has a default, so an empty environment yields a working
//! configuration that loads `./output.json` and resolves images next to it.

use std::collections::HashMap;
use std::env::VarError;
use std::str::FromStr;

use serde::Serialize;
use viewer::consts::{
    DEFAULT_BASE_HEIGHT, DEFAULT_BASE_WIDTH, DEFAULT_INDICATOR_MIN_HEIGHT, DEFAULT_INDICATOR_MIN_WIDTH,
    DEFAULT_MINIMAP_HEIGHT, DEFAULT_MINIMAP_WIDTH,
};
use viewer::engine::ViewerConfig;
use viewer::geometry::{DisplayMetrics, MinimapGeometry};

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

pub const DEFAULT_PAYLOAD_SOURCE: &str = "./output.json";
pub const DEFAULT_IMAGE_BASE: &str = ".";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Every variable `Config::from_env` reads.
pub const ENV_KEYS: [&str; 12] = [
    "SLIDESCOPE_PAYLOAD",
    "SLIDESCOPE_IMAGE_BASE",
    "SLIDESCOPE_THUMBNAIL_BASE",
    "SLIDESCOPE_BASE_WIDTH",
    "SLIDESCOPE_BASE_HEIGHT",
    "SLIDESCOPE_MINIMAP_WIDTH",
    "SLIDESCOPE_MINIMAP_HEIGHT",
    "SLIDESCOPE_INDICATOR_MIN_WIDTH",
    "SLIDESCOPE_INDICATOR_MIN_HEIGHT",
    "SLIDESCOPE_PROBE_IMAGE",
    "SLIDESCOPE_REQUEST_TIMEOUT_SECS",
    "SLIDESCOPE_CONNECT_TIMEOUT_SECS",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Parse { key: String, value: String },

    #[error("{key} must be a positive number, got {value}")]
    NonPositive { key: String, value: String },

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// HTTP timeouts for remote payload and image sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// Where the primary image and its minimap thumbnail live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageLocations {
    pub primary: String,
    pub thumbnail: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Payload path or `http(s)` URL.
    pub payload_source: String,
    pub image_base: String,
    pub thumbnail_base: String,
    pub viewer: ViewerConfig,
    /// Read the primary image header to learn its natural size.
    pub probe_image: bool,
    pub timeouts: Timeouts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            payload_source: DEFAULT_PAYLOAD_SOURCE.into(),
            image_base: DEFAULT_IMAGE_BASE.into(),
            thumbnail_base: DEFAULT_IMAGE_BASE.into(),
            viewer: ViewerConfig::default(),
            probe_image: true,
            timeouts: Timeouts::default(),
        }
    }
}

impl Config {
    /// Build a configuration from process environment variables.
    ///
    /// - `SLIDESCOPE_PAYLOAD`: payload path or URL (default `./output.json`)
    /// - `SLIDESCOPE_IMAGE_BASE` / `SLIDESCOPE_THUMBNAIL_BASE`: image roots (default `.`)
    /// - `SLIDESCOPE_BASE_WIDTH` / `_HEIGHT`: displayed size at scale 1 (default 800x500)
    /// - `SLIDESCOPE_MINIMAP_WIDTH` / `_HEIGHT`: minimap size (default 200x125)
    /// - `SLIDESCOPE_INDICATOR_MIN_WIDTH` / `_HEIGHT`: indicator floor (default 50x30)
    /// - `SLIDESCOPE_PROBE_IMAGE`: `true` (default) or `false`
    /// - `SLIDESCOPE_REQUEST_TIMEOUT_SECS` / `SLIDESCOPE_CONNECT_TIMEOUT_SECS`: 30 / 10
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but unparseable (including
    /// non-UTF-8 values), or if a geometry value is not a positive finite number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for key in ENV_KEYS {
            if let Some(value) = env_value(key, std::env::var(key))? {
                values.insert(key, value);
            }
        }
        Self::from_lookup(|key| values.get(key).cloned())
    }

    /// Build a configuration from any key lookup. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let text = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_owned());

        let base = DisplayMetrics::new(
            positive(get("SLIDESCOPE_BASE_WIDTH"), "SLIDESCOPE_BASE_WIDTH", DEFAULT_BASE_WIDTH)?,
            positive(get("SLIDESCOPE_BASE_HEIGHT"), "SLIDESCOPE_BASE_HEIGHT", DEFAULT_BASE_HEIGHT)?,
        );
        let minimap = MinimapGeometry::new(
            positive(get("SLIDESCOPE_MINIMAP_WIDTH"), "SLIDESCOPE_MINIMAP_WIDTH", DEFAULT_MINIMAP_WIDTH)?,
            positive(get("SLIDESCOPE_MINIMAP_HEIGHT"), "SLIDESCOPE_MINIMAP_HEIGHT", DEFAULT_MINIMAP_HEIGHT)?,
        );
        let viewer = ViewerConfig {
            base,
            minimap,
            indicator_min_width: positive(
                get("SLIDESCOPE_INDICATOR_MIN_WIDTH"),
                "SLIDESCOPE_INDICATOR_MIN_WIDTH",
                DEFAULT_INDICATOR_MIN_WIDTH,
            )?,
            indicator_min_height: positive(
                get("SLIDESCOPE_INDICATOR_MIN_HEIGHT"),
                "SLIDESCOPE_INDICATOR_MIN_HEIGHT",
                DEFAULT_INDICATOR_MIN_HEIGHT,
            )?,
        };

        let timeouts = Timeouts {
            request_secs: parse_or(
                get("SLIDESCOPE_REQUEST_TIMEOUT_SECS"),
                "SLIDESCOPE_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            connect_secs: parse_or(
                get("SLIDESCOPE_CONNECT_TIMEOUT_SECS"),
                "SLIDESCOPE_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?,
        };

        Ok(Self {
            payload_source: text("SLIDESCOPE_PAYLOAD", DEFAULT_PAYLOAD_SOURCE),
            image_base: text("SLIDESCOPE_IMAGE_BASE", DEFAULT_IMAGE_BASE),
            thumbnail_base: text("SLIDESCOPE_THUMBNAIL_BASE", DEFAULT_IMAGE_BASE),
            viewer,
            probe_image: flag(get("SLIDESCOPE_PROBE_IMAGE"), "SLIDESCOPE_PROBE_IMAGE", true)?,
            timeouts,
        })
    }

    /// Resolve the payload's image filename against both image roots.
    #[must_use]
    pub fn image_locations(&self, filename: &str) -> ImageLocations {
        ImageLocations {
            primary: join_location(&self.image_base, filename),
            thumbnail: join_location(&self.thumbnail_base, filename),
        }
    }
}

// =============================================================================
// PARSING HELPERS
// =============================================================================

/// Join a base path or URL prefix with a filename, with exactly one `/` between.
/// A base of `/` yields a root-relative location.
#[must_use]
pub fn join_location(base: &str, filename: &str) -> String {
    let base = base.trim_end_matches('/');
    let name = filename.trim_start_matches("./").trim_start_matches('/');
    format!("{base}/{name}")
}

/// Unset is `None`; a value that is not valid UTF-8 is a parse error rather
/// than silently falling back to the default.
fn env_value(key: &str, var: Result<String, VarError>) -> Result<Option<String>, ConfigError> {
    match var {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => {
            Err(ConfigError::Parse { key: key.into(), value: raw.to_string_lossy().into_owned() })
        }
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Parse { key: key.into(), value }),
    }
}

fn positive(raw: Option<String>, key: &str, default: f64) -> Result<f64, ConfigError> {
    let value = parse_or(raw, key, default)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { key: key.into(), value: value.to_string() })
    }
}

fn flag(raw: Option<String>, key: &str, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Parse { key: key.into(), value }),
    }
}
