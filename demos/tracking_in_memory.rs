//! Runs the tracking plugin against the in-memory environment and prints what the vendor
//! receives. Set `PLATYPUS_ANALYTICS_KEY` and `PLATYPUS_ANALYTICS_SCRIPT_URL` to try the
//! environment-driven configuration.

use std::sync::Arc;

use platypus_analytics::logger::{set_log_level, LogLevel};
use platypus_analytics::tracking::{
    MemberRegistry, MemoryEnvironment, MemoryScriptInjector, PageMetadata, ScriptLoader,
    TrackingContext, TrackingOptions, TrackingPlugin, TrackingResult, VendorTracker,
};
use serde_json::{json, Value};

struct PrintingVendor;

impl VendorTracker for PrintingVendor {
    fn page_event(&self, category: &str, route: &str, options: &Value) -> TrackingResult<()> {
        println!("pageEvent({category:?}, {route:?}, {options})");
        Ok(())
    }

    fn track_event(&self, name: &str, payload: &Value) -> TrackingResult<()> {
        println!("trackEvent({name:?}, {payload})");
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    set_log_level(LogLevel::Debug);

    let mut options = TrackingOptions::from_environment()?;
    options
        .analytics_key
        .get_or_insert_with(|| "demo-key".to_string());
    options
        .script_url
        .get_or_insert_with(|| "https://cdn.example.com/tracker.js".to_string());

    let environment = Arc::new(MemoryEnvironment::new());
    let injector = Arc::new(MemoryScriptInjector::new());
    let context = TrackingContext::with_script_loader(
        environment.clone(),
        Arc::new(ScriptLoader::new(injector.clone())),
    );

    let mut members = MemberRegistry::new();
    let signal = TrackingPlugin::new(options).install(&mut members, &context)?;
    for tag in injector.tags() {
        println!("head: {}", tag.to_html());
    }

    injector.complete(signal.url());
    futures::executor::block_on(signal.wait())?;
    environment.set_vendor(Some(Arc::new(PrintingVendor)));
    environment.set_page_metadata(Some(PageMetadata::new("Platypus Docs", "Documentation")));

    members.call("trackPage", &[json!("Getting started")])?;
    members.call("trackClickEvent", &[json!("{\"action\":\"Download\"}")])?;
    members.call("trackSearchTerm", &[json!("header"), json!("async traits")])?;
    Ok(())
}
