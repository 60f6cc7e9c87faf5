//! Host environment detection and initialization parameter sources.

use std::env;
use std::fs;
#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

use serde_json::{Map, Value};

/// Inline JSON or a path to a JSON file holding the tracking options.
pub const TRACKING_CONFIG_ENV: &str = "PLATYPUS_ANALYTICS_CONFIG";
/// Page global the host may set before the crate initializes.
pub const TRACKING_CONFIG_GLOBAL: &str = "__PLATYPUS_ANALYTICS__";

/// Returns the tracking options object from the first source that provides one: the
/// environment variable, then the page global.
pub fn default_tracking_config_json() -> Option<Value> {
    config_from_env().or_else(config_from_global)
}

/// Reads a single non-empty environment override.
pub fn env_override(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn config_from_env() -> Option<Value> {
    let raw = env::var(TRACKING_CONFIG_ENV).ok()?;
    parse_config_source(&raw)
}

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
fn config_from_global() -> Option<Value> {
    use wasm_bindgen::JsValue;

    let global = js_sys::global();
    let value = js_sys::Reflect::get(&global, &JsValue::from_str(TRACKING_CONFIG_GLOBAL)).ok()?;
    if value.is_null() || value.is_undefined() {
        return None;
    }
    let serialized = js_sys::JSON::stringify(&value).ok()?.as_string()?;
    parse_object(&serialized)
}

#[cfg(not(all(target_arch = "wasm32", feature = "wasm-web")))]
fn config_from_global() -> Option<Value> {
    None
}

fn parse_config_source(raw: &str) -> Option<Value> {
    if let Some(json) = parse_object(raw) {
        return Some(json);
    }

    let path = treat_as_path(raw)?;
    let contents = fs::read_to_string(path).ok()?;
    parse_object(&contents)
}

fn parse_object(raw: &str) -> Option<Value> {
    serde_json::from_str::<Map<String, Value>>(raw)
        .ok()
        .map(Value::Object)
}

#[cfg(not(target_arch = "wasm32"))]
fn treat_as_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if Path::new(trimmed).exists() {
        Some(trimmed.to_string())
    } else {
        None
    }
}

#[cfg(target_arch = "wasm32")]
fn treat_as_path(_raw: &str) -> Option<String> {
    None
}

/// Returns `true` when running inside a browser window.
pub fn is_browser() -> bool {
    #[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
    {
        use wasm_bindgen::JsCast;
        js_sys::global().dyn_into::<web_sys::Window>().is_ok()
    }

    #[cfg(not(all(target_arch = "wasm32", feature = "wasm-web")))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_source_accepts_inline_json() {
        let json = parse_config_source("{\"analyticsKey\":\"abc\"}").unwrap();
        assert_eq!(json["analyticsKey"], "abc");
    }

    #[test]
    fn parse_config_source_rejects_non_objects() {
        assert!(parse_config_source("[1,2,3]").is_none());
        assert!(parse_config_source("definitely-not-a-file.json").is_none());
    }

    #[test]
    fn parse_config_source_reads_files() {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "platypus_analytics_test_{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::write(&path, "{\"scriptUrl\":\"https://cdn.example.com/t.js\"}").unwrap();
        let path_str = path.to_string_lossy().to_string();
        let file_json = parse_config_source(&path_str).unwrap();
        assert_eq!(file_json["scriptUrl"], "https://cdn.example.com/t.js");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn native_targets_are_not_browsers() {
        assert!(!is_browser());
    }
}
