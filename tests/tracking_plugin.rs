#![cfg(not(target_arch = "wasm32"))]

use platypus_analytics::tracking::{
    configure_analytics, ensure_vendor_script_loaded, track_click_event, track_page,
    track_search_term, ClickEventParams, MemberRegistry, MemoryEnvironment, MemoryScriptInjector,
    PageMetadata, ScriptLoadState, ScriptLoader, TrackingContext, TrackingErrorCode,
    TrackingOptions, TrackingPlugin, TrackingResult, VendorTracker,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const SCRIPT_URL: &str = "https://cdn.example.com/platypus/tracker.js";

#[derive(Clone, Default)]
struct CapturingVendor {
    page_events: Arc<Mutex<Vec<(String, String, Value)>>>,
    events: Arc<Mutex<Vec<(String, Value)>>>,
}

impl VendorTracker for CapturingVendor {
    fn page_event(&self, category: &str, route: &str, options: &Value) -> TrackingResult<()> {
        self.page_events.lock().unwrap().push((
            category.to_string(),
            route.to_string(),
            options.clone(),
        ));
        Ok(())
    }

    fn track_event(&self, name: &str, payload: &Value) -> TrackingResult<()> {
        self.events
            .lock()
            .unwrap()
            .push((name.to_string(), payload.clone()));
        Ok(())
    }
}

fn memory_context() -> (
    Arc<MemoryEnvironment>,
    Arc<MemoryScriptInjector>,
    TrackingContext,
) {
    let environment = Arc::new(MemoryEnvironment::new());
    let injector = Arc::new(MemoryScriptInjector::new());
    let context = TrackingContext::with_script_loader(
        environment.clone(),
        Arc::new(ScriptLoader::new(injector.clone())),
    );
    (environment, injector, context)
}

#[tokio::test(flavor = "current_thread")]
async fn page_lifecycle_from_install_to_tracking() {
    let (environment, injector, context) = memory_context();
    let mut members = MemberRegistry::new();
    let signal = TrackingPlugin::new(TrackingOptions::new("site-key", SCRIPT_URL))
        .install(&mut members, &context)
        .expect("install plugin");

    // Before the vendor script arrives every call is a silent no-op.
    members.call("trackPage", &[json!("Home")]).unwrap();

    let vendor = CapturingVendor::default();
    injector.complete(SCRIPT_URL);
    signal.clone().await.expect("script loaded");
    environment.set_vendor(Some(Arc::new(vendor.clone())));
    environment.set_page_metadata(Some(PageMetadata::new("Platypus Docs", "Documentation")));

    members.call("trackPage", &[json!("Home")]).unwrap();
    members
        .call("trackClickEvent", &[json!({ "action": "Sign up" })])
        .unwrap();
    members
        .call("trackSearchTerm", &[json!("header"), json!("borrow checker")])
        .unwrap();

    assert_eq!(
        vendor.page_events.lock().unwrap().as_slice(),
        &[(
            "Documentation".to_string(),
            "project-platypus".to_string(),
            json!({
                "navigationType": "pushState",
                "productTitle": "Platypus Docs",
                "title": "Home"
            })
        )]
    );
    let events = vendor.events.lock().unwrap().clone();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].0, "CTA Clicked");
    assert_eq!(events[0].1["CTA"], "Sign up");
    assert_eq!(events[1].0, "Searched Term");
    assert_eq!(events[1].1["location"], "header");
    assert_eq!(events[1].1["text"], "borrow checker");
    assert_eq!(signal.state(), ScriptLoadState::Resolved);
}

#[tokio::test(flavor = "current_thread")]
async fn failed_script_load_is_observable_but_not_fatal() {
    let (environment, injector, context) = memory_context();
    let signal = context.ensure_vendor_script_loaded(SCRIPT_URL);
    injector.fail(SCRIPT_URL, "blocked by content policy");

    let err = signal.wait().await.unwrap_err();
    assert_eq!(err.code, TrackingErrorCode::ScriptLoadFailure);

    configure_analytics(&context, "site-key");
    assert_eq!(environment.analytics_config().unwrap().key, "site-key");
    track_page(&context, "Home").unwrap();
    track_click_event(&context, "not-json").unwrap();
}

#[test]
fn missing_category_is_reported_once_vendor_is_present() {
    let (environment, _, context) = memory_context();
    let vendor = CapturingVendor::default();
    environment.set_vendor(Some(Arc::new(vendor.clone())));
    environment.set_page_metadata(Some(PageMetadata::default().with_product_title("Docs")));

    let err = track_search_term(&context, "header", "traits").unwrap_err();
    assert_eq!(err.code_str(), "tracking/missing-configuration-field");
    let err = track_click_event(&context, ClickEventParams::action("Buy")).unwrap_err();
    assert!(err.message().contains("category"));
    assert!(vendor.events.lock().unwrap().is_empty());
}

#[test]
fn process_wide_loader_injects_once() {
    let first = ensure_vendor_script_loaded(SCRIPT_URL);
    let second = ensure_vendor_script_loaded("");
    assert!(first.ptr_eq(&second));
    assert!(Arc::ptr_eq(&ScriptLoader::shared(), &ScriptLoader::shared()));

    // Native builds have no document, so the single injection attempt rejects the signal.
    let err = second.outcome().expect("settled").unwrap_err();
    assert_eq!(err.code, TrackingErrorCode::ScriptLoadFailure);
    assert_eq!(first.url(), SCRIPT_URL);
}
