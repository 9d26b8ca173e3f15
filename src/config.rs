//! Service configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. User values are
//! layered over stock defaults, so a config file only needs the keys it
//! wants to change. The result is read once at startup; nothing here is
//! consulted again while requests are being served.
//!
//! ## Config File Location
//!
//! By default `config.toml` is read from the content root. The `--config`
//! flag points at any other file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! content_root = "content"      # Path to content directory
//!
//! [imgapi]
//! endpoint = "imgapi/"          # Path prefix of transform URLs
//! absolute = false              # Absolute URLs from the request host/scheme
//! site_url = "/"                # Base URL of the site
//! data_endpoint = "imgapidata/" # Path prefix of JSON descriptor requests
//!
//! [imageapi]
//! absolute = true               # Same as imgapi.absolute; wins when present
//!
//! [images]
//! quality = 90                  # Quality when a request gives none (1-100)
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Quality;
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
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Characters with meaning in route patterns or that end a URL path.
const ROUTE_RESERVED: &[char] = &['{', '}', '*', ':', '?', '#', '%', '\\', ' '];

/// Service configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Path to the content root directory.
    #[serde(default = "default_content_root")]
    pub content_root: String,
    /// Endpoint and URL settings.
    pub imgapi: ImgApiConfig,
    /// Alternate spelling of the `absolute` switch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imageapi: Option<ImageApiConfig>,
    /// Transform defaults.
    pub images: ImagesConfig,
    /// HTTP listener settings.
    pub server: ServerConfig,
}

fn default_content_root() -> String {
    "content".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_root: default_content_root(),
            imgapi: ImgApiConfig::default(),
            imageapi: None,
            images: ImagesConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = normalize_prefix(&self.imgapi.endpoint);
        let data_endpoint = normalize_prefix(&self.imgapi.data_endpoint);
        if endpoint.is_empty() {
            return Err(ConfigError::Validation(
                "imgapi.endpoint must not be empty".into(),
            ));
        }
        if data_endpoint.is_empty() {
            return Err(ConfigError::Validation(
                "imgapi.data_endpoint must not be empty".into(),
            ));
        }
        for (key, prefix) in [("endpoint", &endpoint), ("data_endpoint", &data_endpoint)] {
            if let Some(c) = prefix.chars().find(|c| ROUTE_RESERVED.contains(c)) {
                return Err(ConfigError::Validation(format!(
                    "imgapi.{key} ({prefix}) must not contain {c:?}"
                )));
            }
        }
        if endpoint.starts_with(&data_endpoint) || data_endpoint.starts_with(&endpoint) {
            return Err(ConfigError::Validation(format!(
                "imgapi.endpoint ({endpoint}) and imgapi.data_endpoint ({data_endpoint}) must not overlap"
            )));
        }
        if self.imgapi.site_url.is_empty() {
            return Err(ConfigError::Validation(
                "imgapi.site_url must not be empty (use \"/\" for the site root)".into(),
            ));
        }
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        Ok(())
    }

    /// Whether URLs should be made absolute from the request.
    ///
    /// `[imageapi] absolute` takes precedence over `[imgapi] absolute`.
    pub fn absolute(&self) -> bool {
        self.imageapi
            .as_ref()
            .map_or(self.imgapi.absolute, |legacy| legacy.absolute)
    }
}

/// Endpoint and URL settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImgApiConfig {
    /// Path prefix that routes a request to the transform endpoint.
    pub endpoint: String,
    /// Build absolute URLs from the request's host and scheme when the site
    /// lives at `/`.
    pub absolute: bool,
    /// Base URL of the site. `/` means "wherever we are served from".
    pub site_url: String,
    /// Path prefix of the JSON descriptor endpoint.
    pub data_endpoint: String,
}

impl Default for ImgApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "imgapi/".to_string(),
            absolute: false,
            site_url: "/".to_string(),
            data_endpoint: "imgapidata/".to_string(),
        }
    }
}

/// The `[imageapi]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageApiConfig {
    pub absolute: bool,
}

/// Transform defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Encoding quality used when a request has no `quality` (1-100).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Strip leading slashes and guarantee one trailing slash.
///
/// `"/img"`, `"img/"` and `"img"` all become `"img/"`; an empty or
/// slash-only prefix stays empty.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

/// The resolved, read-only endpoint settings shared by the URL builder and
/// the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Normalized transform prefix, e.g. `imgapi/`.
    pub prefix: String,
    /// Normalized descriptor prefix, e.g. `imgapidata/`.
    pub data_prefix: String,
    pub absolute: bool,
    pub site_url: String,
    pub default_quality: Quality,
}

impl EndpointConfig {
    pub fn from_site_config(config: &SiteConfig) -> Self {
        Self {
            prefix: normalize_prefix(&config.imgapi.endpoint),
            data_prefix: normalize_prefix(&config.imgapi.data_endpoint),
            absolute: config.absolute(),
            site_url: config.imgapi.site_url.clone(),
            default_quality: Quality::new(config.images.quality),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::from_site_config(&SiteConfig::default())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
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

/// Load a TOML file as a raw value.
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

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    load_config_file(&root.join("config.toml"))
}

/// Load config from an explicit file path.
///
/// A missing file yields the stock defaults.
pub fn load_config_file(path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Image API Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# Path to the content directory
content_root = "content"

# ---------------------------------------------------------------------------
# Endpoint
# ---------------------------------------------------------------------------
[imgapi]
# Path prefix that routes requests to the transform endpoint:
#   /imgapi/blog/post-1/cover.jpg?width=200
endpoint = "imgapi/"

# Build absolute URLs (scheme + host of the current request) when the site
# is served from "/". Has no effect when site_url is a full URL.
absolute = false

# Base URL of the site. "/" produces host-relative URLs.
site_url = "/"

# Path prefix of the JSON descriptor endpoint:
#   /imgapidata/blog/post-1/cover.jpg?width=200
data_endpoint = "imgapidata/"

# ---------------------------------------------------------------------------
# Alternate spelling of imgapi.absolute; takes precedence when present.
# ---------------------------------------------------------------------------
# [imageapi]
# absolute = true

# ---------------------------------------------------------------------------
# Transform defaults
# ---------------------------------------------------------------------------
[images]
# Encoding quality when a request does not pass ?quality= (1 = worst, 100 = best).
quality = 90

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
host = "127.0.0.1"
port = 8080
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_endpoint_settings() {
        let config = SiteConfig::default();
        assert_eq!(config.content_root, "content");
        assert_eq!(config.imgapi.endpoint, "imgapi/");
        assert!(!config.imgapi.absolute);
        assert_eq!(config.imgapi.site_url, "/");
        assert_eq!(config.images.quality, 90);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[imgapi]
endpoint = "img/"
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.imgapi.endpoint, "img/");
        // Defaults preserved
        assert!(!config.imgapi.absolute);
        assert_eq!(config.images.quality, 90);
    }

    #[test]
    fn normalize_prefix_variants() {
        assert_eq!(normalize_prefix("imgapi/"), "imgapi/");
        assert_eq!(normalize_prefix("/imgapi"), "imgapi/");
        assert_eq!(normalize_prefix("media/img"), "media/img/");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix(""), "");
    }

    #[test]
    fn endpoint_config_from_defaults() {
        let endpoint = EndpointConfig::default();
        assert_eq!(endpoint.prefix, "imgapi/");
        assert_eq!(endpoint.data_prefix, "imgapidata/");
        assert!(!endpoint.absolute);
        assert_eq!(endpoint.site_url, "/");
        assert_eq!(endpoint.default_quality, Quality::new(90));
    }

    #[test]
    fn imageapi_absolute_takes_precedence() {
        let toml = r#"
[imgapi]
absolute = false

[imageapi]
absolute = true
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert!(config.absolute());
        assert!(EndpointConfig::from_site_config(&config).absolute);
    }

    #[test]
    fn imgapi_absolute_used_without_imageapi() {
        let toml = r#"
[imgapi]
absolute = true
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert!(config.absolute());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.imgapi.endpoint, "imgapi/");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[imgapi]
endpoint = "thumbs/"
site_url = "https://example.org"

[images]
quality = 70
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.imgapi.endpoint, "thumbs/");
        assert_eq!(config.imgapi.site_url, "https://example.org");
        assert_eq!(config.images.quality, 70);
        // Unspecified values should be defaults
        assert_eq!(config.imgapi.data_endpoint, "imgapidata/");
    }

    #[test]
    fn load_config_file_from_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("imgapi.toml");
        fs::write(&path, "[server]\nport = 9000\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"quality = 90"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"quality = 70"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("quality").unwrap().as_integer(), Some(70));
    }

    #[test]
    fn merge_toml_table_merge_preserves_siblings() {
        let base: toml::Value = toml::from_str(
            r#"
[imgapi]
endpoint = "imgapi/"
absolute = false
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[imgapi]
absolute = true
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let imgapi = merged.get("imgapi").unwrap();
        assert_eq!(imgapi.get("absolute").unwrap().as_bool(), Some(true));
        assert_eq!(imgapi.get("endpoint").unwrap().as_str(), Some("imgapi/"));
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[imgapi]
endpiont = "img/"
"#;
        let result: Result<SiteConfig, _> = toml::from_str(toml_str);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[imgapix]\nendpoint = \"a/\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[server]\nprot = 1\n").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_quality_bounds() {
        let mut config = SiteConfig::default();
        config.images.quality = 100;
        assert!(config.validate().is_ok());
        config.images.quality = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.images.quality = 101;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_empty_endpoint() {
        let mut config = SiteConfig::default();
        config.imgapi.endpoint = "/".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_overlapping_endpoints() {
        let mut config = SiteConfig::default();
        config.imgapi.endpoint = "img/".into();
        config.imgapi.data_endpoint = "img/data/".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_route_metacharacters() {
        for bad in ["img{x}/", "img/*rest", "media:id/", "img?/", "img api/"] {
            let mut config = SiteConfig::default();
            config.imgapi.endpoint = bad.into();
            assert!(
                matches!(config.validate(), Err(ConfigError::Validation(_))),
                "{bad} should be rejected"
            );
        }
        let mut config = SiteConfig::default();
        config.imgapi.data_endpoint = "{data}/".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_accepts_nested_endpoint() {
        let mut config = SiteConfig::default();
        config.imgapi.endpoint = "media/img-api_v2.1/".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_distinct_endpoints_sharing_letters() {
        // "img/" vs "imgdata/" share a string prefix but not a path prefix
        let mut config = SiteConfig::default();
        config.imgapi.endpoint = "img".into();
        config.imgapi.data_endpoint = "imgdata".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[images]\nquality = 150\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // stock config tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(config.imgapi.endpoint, defaults.imgapi.endpoint);
        assert_eq!(config.imgapi.absolute, defaults.imgapi.absolute);
        assert_eq!(config.imgapi.site_url, defaults.imgapi.site_url);
        assert_eq!(config.imgapi.data_endpoint, defaults.imgapi.data_endpoint);
        assert_eq!(config.images.quality, defaults.images.quality);
        assert_eq!(config.server.port, defaults.server.port);
        assert!(config.imageapi.is_none());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        assert!(val.is_table());
        assert!(val.get("imgapi").is_some());
        assert!(val.get("images").is_some());
        assert!(val.get("server").is_some());
        assert!(val.get("imageapi").is_none());
    }
}
