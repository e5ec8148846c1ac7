//! Gate configuration. Native callers build it from CLI flags; browser builds take
//! build-time values and apply runtime overrides from `window.AUDITGATE_CONFIG`
//! (if present) so static deployments can move endpoints without rebuilding.
//! Configuration values are public; do not store secrets here.

use crate::fingerprint::DigestAlgorithm;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_VALIDATE_PATH: &str = "/validate_fingerprint";
pub const DEFAULT_REJECTION_PATH: &str = "/fingerprint_error";
pub const FINGERPRINT_FIELD: &str = "browser_fingerprint";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid endpoint url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct GateConfig {
    /// Origin of the dashboard. Empty means same-origin (browser only).
    pub base_url: String,
    pub validate_path: String,
    /// Where rejected clients are sent.
    pub rejection_path: String,
    /// Hidden form field carrying the fingerprint.
    pub field_name: String,
    /// Session storage key holding the accepted fingerprint.
    pub session_key: String,
    pub timeout: Duration,
    pub digest: DigestAlgorithm,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            validate_path: DEFAULT_VALIDATE_PATH.to_string(),
            rejection_path: DEFAULT_REJECTION_PATH.to_string(),
            field_name: FINGERPRINT_FIELD.to_string(),
            session_key: FINGERPRINT_FIELD.to_string(),
            timeout: DEFAULT_TIMEOUT,
            digest: DigestAlgorithm::default(),
        }
    }
}

impl GateConfig {
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validation endpoint, relative when no base URL is configured.
    #[must_use]
    pub fn validate_endpoint(&self) -> String {
        build_url_with_base(&self.base_url, &self.validate_path)
    }

    /// Absolute validation endpoint, required outside the browser.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL and path do not form an absolute URL.
    pub fn validate_url(&self) -> Result<Url, ConfigError> {
        parse_absolute(&self.validate_endpoint())
    }

    /// Loads config from build-time environment variables and applies runtime overrides.
    #[must_use]
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Some(base_url) = option_env!("AUDITGATE_BASE_URL") {
            config.base_url = base_url.to_string();
        }
        if let Some(rejection_path) = option_env!("AUDITGATE_REJECTION_PATH") {
            config.rejection_path = rejection_path.to_string();
        }

        if let Some(runtime) = runtime_config() {
            apply_runtime_overrides(&mut config, runtime);
        }

        config
    }
}

/// Joins a base URL and a path with exactly one slash between them.
#[must_use]
pub fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// # Errors
///
/// Returns an error if `url` is not an absolute http(s) URL.
pub fn parse_absolute(url: &str) -> Result<Url, ConfigError> {
    let parsed = Url::parse(url).map_err(|err| ConfigError::InvalidUrl {
        url: url.to_string(),
        reason: err.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(ConfigError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {scheme}"),
        }),
    }
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
#[derive(Default)]
struct RuntimeConfig {
    base_url: Option<String>,
    validate_path: Option<String>,
    rejection_path: Option<String>,
    timeout_ms: Option<u64>,
    digest: Option<String>,
}

fn apply_runtime_overrides(config: &mut GateConfig, runtime: RuntimeConfig) {
    if let Some(value) = runtime.base_url {
        config.base_url = value;
    }
    if let Some(value) = runtime.validate_path {
        config.validate_path = value;
    }
    if let Some(value) = runtime.rejection_path {
        config.rejection_path = value;
    }
    if let Some(value) = runtime.timeout_ms.filter(|ms| *ms > 0) {
        config.timeout = Duration::from_millis(value);
    }
    if let Some(value) = runtime.digest {
        config.digest = DigestAlgorithm::negotiate(&value);
    }
}

#[cfg(target_arch = "wasm32")]
fn runtime_config() -> Option<RuntimeConfig> {
    use js_sys::{Object, Reflect};
    use wasm_bindgen::JsValue;

    let window = web_sys::window()?;
    let config = Reflect::get(&window, &JsValue::from_str("AUDITGATE_CONFIG")).ok()?;
    if config.is_null() || config.is_undefined() {
        return None;
    }
    let object = Object::from(config);

    Some(RuntimeConfig {
        base_url: read_runtime_value(&object, "base_url"),
        validate_path: read_runtime_value(&object, "validate_path"),
        rejection_path: read_runtime_value(&object, "rejection_path"),
        timeout_ms: js_sys::Reflect::get(&object, &JsValue::from_str("timeout_ms"))
            .ok()
            .and_then(|value| value.as_f64())
            .filter(|value| value.is_finite() && *value > 0.0)
            .map(|value| value as u64),
        digest: read_runtime_value(&object, "digest"),
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn runtime_config() -> Option<RuntimeConfig> {
    None
}

#[cfg(target_arch = "wasm32")]
fn read_runtime_value(object: &js_sys::Object, key: &str) -> Option<String> {
    let value = js_sys::Reflect::get(object, &wasm_bindgen::JsValue::from_str(key))
        .ok()?
        .as_string()?;
    normalize_runtime_value(&value)
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn normalize_runtime_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
