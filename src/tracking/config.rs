use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::platform::environment::{default_tracking_config_json, env_override};
use crate::tracking::constants::{
    DEFAULT_CONFIG_GLOBAL, DEFAULT_DIGITAL_DATA_GLOBAL, DEFAULT_VENDOR_GLOBAL,
};
use crate::tracking::error::{invalid_argument, TrackingResult};
use crate::tracking::logger::LOGGER;

pub const ANALYTICS_KEY_ENV: &str = "PLATYPUS_ANALYTICS_KEY";
pub const SCRIPT_URL_ENV: &str = "PLATYPUS_ANALYTICS_SCRIPT_URL";

/// Configuration object read by the vendor script. Written by the installer, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsConfig {
    pub key: String,
    #[serde(flatten)]
    pub flags: TrackingFlags,
}

impl AnalyticsConfig {
    pub fn new(key: impl Into<String>, flags: TrackingFlags) -> Self {
        Self {
            key: key.into(),
            flags,
        }
    }
}

/// Vendor sub-modules toggled through the configuration object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackingFlags {
    /// Page views are forwarded explicitly through `trackPage`, so the vendor's own automatic
    /// page view stays off unless the host asks for it.
    pub auto_page_view: bool,
    pub auto_click_tracking: bool,
    pub form_tracking: bool,
    pub session_replay: bool,
    pub error_tracking: bool,
}

impl Default for TrackingFlags {
    fn default() -> Self {
        Self {
            auto_page_view: false,
            auto_click_tracking: false,
            form_tracking: false,
            session_replay: false,
            error_tracking: true,
        }
    }
}

/// Names of the page globals shared with the vendor script and the host page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalNames {
    pub config: String,
    pub digital_data: String,
    pub vendor: String,
}

impl Default for GlobalNames {
    fn default() -> Self {
        Self {
            config: DEFAULT_CONFIG_GLOBAL.to_string(),
            digital_data: DEFAULT_DIGITAL_DATA_GLOBAL.to_string(),
            vendor: DEFAULT_VENDOR_GLOBAL.to_string(),
        }
    }
}

/// Host initialization parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackingOptions {
    pub analytics_key: Option<String>,
    pub script_url: Option<String>,
    pub flags: TrackingFlags,
    pub globals: GlobalNames,
}

impl TrackingOptions {
    pub fn new(analytics_key: impl Into<String>, script_url: impl Into<String>) -> Self {
        Self {
            analytics_key: Some(analytics_key.into()),
            script_url: Some(script_url.into()),
            ..Default::default()
        }
    }

    pub fn with_flags(mut self, flags: TrackingFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_globals(mut self, globals: GlobalNames) -> Self {
        self.globals = globals;
        self
    }

    /// Parses options from a JSON object. Unknown keys are ignored.
    pub fn from_json(value: Value) -> TrackingResult<Self> {
        serde_json::from_value(value)
            .map_err(|err| invalid_argument(format!("Invalid tracking options: {err}")))
    }

    /// Resolves options from the host environment: the JSON configuration source first, then
    /// the individual key and URL overrides.
    pub fn from_environment() -> TrackingResult<Self> {
        let mut options = match default_tracking_config_json() {
            Some(value) => Self::from_json(value)?,
            None => Self::default(),
        };
        if let Some(key) = env_override(ANALYTICS_KEY_ENV) {
            options.analytics_key = Some(key);
        }
        if let Some(url) = env_override(SCRIPT_URL_ENV) {
            options.script_url = Some(url);
        }
        Ok(options)
    }

    /// Checks the script URL and returns the initialization parameters. The key is handed
    /// back exactly as supplied; an empty key only produces a warning.
    pub fn validate(&self) -> TrackingResult<(&str, &str)> {
        let key = self.analytics_key.as_deref().unwrap_or_default();
        if key.trim().is_empty() {
            LOGGER.warn("Analytics key is empty; the vendor will not attribute events");
        }
        let script_url = self
            .script_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| invalid_argument("Vendor script URL must not be empty"))?;
        validate_script_url(script_url)?;
        Ok((key, script_url))
    }
}

fn validate_script_url(raw: &str) -> TrackingResult<()> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(invalid_argument(format!(
            "Vendor script URL must use http or https, got `{}`",
            url.scheme()
        ))),
        // Scheme-relative and path-relative URLs resolve against the page.
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            LOGGER.debug(format!("Vendor script URL `{raw}` is relative to the page"));
            Ok(())
        }
        Err(err) => Err(invalid_argument(format!(
            "Vendor script URL `{raw}` is invalid: {err}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::error::TrackingErrorCode;
    use serde_json::json;

    #[test]
    fn analytics_config_flattens_flags() {
        let config = AnalyticsConfig::new("abc", TrackingFlags::default());
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            json!({
                "key": "abc",
                "autoPageView": false,
                "autoClickTracking": false,
                "formTracking": false,
                "sessionReplay": false,
                "errorTracking": true
            })
        );
    }

    #[test]
    fn options_parse_from_camel_case_json() {
        let options = TrackingOptions::from_json(json!({
            "analyticsKey": "key-1",
            "scriptUrl": "https://cdn.example.com/tracker.js",
            "flags": { "sessionReplay": true },
            "globals": { "vendor": "tracker" }
        }))
        .unwrap();
        assert_eq!(options.analytics_key.as_deref(), Some("key-1"));
        assert!(options.flags.session_replay);
        assert!(options.flags.error_tracking);
        assert_eq!(options.globals.vendor, "tracker");
        assert_eq!(options.globals.digital_data, "digitalData");
    }

    #[test]
    fn validate_rejects_missing_url() {
        let err = TrackingOptions::default().validate().unwrap_err();
        assert_eq!(err.code, TrackingErrorCode::InvalidArgument);

        let err = TrackingOptions::new("key", "  ").validate().unwrap_err();
        assert!(err.message().contains("script URL"));
    }

    #[test]
    fn validate_passes_the_key_through_unchanged() {
        const URL: &str = "https://cdn.example.com/t.js";
        let padded = TrackingOptions::new("  site-key ", URL);
        assert_eq!(padded.validate().unwrap(), ("  site-key ", URL));

        let empty = TrackingOptions::new("", URL);
        assert_eq!(empty.validate().unwrap(), ("", URL));

        let missing = TrackingOptions {
            script_url: Some(URL.to_string()),
            ..TrackingOptions::default()
        };
        assert_eq!(missing.validate().unwrap().0, "");
    }

    #[test]
    fn validate_checks_url_scheme() {
        let err = TrackingOptions::new("key", "javascript:alert(1)")
            .validate()
            .unwrap_err();
        assert_eq!(err.code_str(), "tracking/invalid-argument");

        let options = TrackingOptions::new("key", "https://cdn.example.com/t.js");
        let (key, url) = options.validate().unwrap();
        assert_eq!(key, "key");
        assert_eq!(url, "https://cdn.example.com/t.js");

        assert!(TrackingOptions::new("key", "/static/tracker.js")
            .validate()
            .is_ok());
        assert!(TrackingOptions::new("key", "//cdn.example.com/t.js")
            .validate()
            .is_ok());
    }
}
