//! # Tracking module
//!
//! Configures the analytics vendor's page script and forwards page views, call-to-action
//! clicks and search terms to the vendor's tracking object.
//!
//! Initialization writes the configuration object, resets the page metadata to its stub and
//! requests the vendor script exactly once per process. Forwarders read the vendor object and
//! the page metadata through an explicit [`TrackingContext`]; they do nothing while either is
//! absent and fail with `MissingConfigurationField` when the vendor is present but the
//! metadata lacks `productTitle` or `category`.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use platypus_analytics::tracking::{
//!     track_page, MemberRegistry, MemoryEnvironment, MemoryScriptInjector, ScriptLoader,
//!     TrackingContext, TrackingOptions, TrackingPlugin,
//! };
//!
//! let environment = Arc::new(MemoryEnvironment::new());
//! let injector = Arc::new(MemoryScriptInjector::new());
//! let context = TrackingContext::with_script_loader(
//!     environment.clone(),
//!     Arc::new(ScriptLoader::new(injector.clone())),
//! );
//!
//! let mut members = MemberRegistry::new();
//! let signal = TrackingPlugin::new(TrackingOptions::new(
//!     "demo-key",
//!     "https://cdn.example.com/tracker.js",
//! ))
//! .install(&mut members, &context)
//! .expect("valid options");
//!
//! assert_eq!(injector.injection_count(), 1);
//! assert!(!signal.is_settled());
//! // No vendor object yet, so tracking is a silent no-op.
//! track_page(&context, "Getting started").unwrap();
//! ```

mod api;
mod config;
mod constants;
mod context;
mod environment;
pub mod error;
mod logger;
mod metadata;
mod plugin;
mod script;
#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
mod web;

pub use api::{
    track_click_event, track_page, track_search_term, ClickEventParams, CtaPayload,
    PageViewOptions, SearchTermPayload,
};
pub use config::{
    AnalyticsConfig, GlobalNames, TrackingFlags, TrackingOptions, ANALYTICS_KEY_ENV,
    SCRIPT_URL_ENV,
};
pub use constants::{CTA_CLICKED_EVENT, ROUTE_NAME, SEARCHED_TERM_EVENT};
pub use context::{configure_analytics, configure_analytics_with_flags, TrackingContext};
pub use environment::{MemoryEnvironment, TrackingEnvironment, VendorTracker};
pub use error::{TrackingError, TrackingErrorCode, TrackingResult};
pub use metadata::{
    extract_required_field, PageAnalytics, PageInfo, PageMetadata, PageSection,
    RequiredPageFields,
};
pub use plugin::{tracking_members, MemberRegistry, PluginHost, TrackingMember, TrackingPlugin};
#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
pub use script::UnsupportedScriptInjector;
pub use script::{
    ensure_vendor_script_loaded, MemoryScriptInjector, ScriptInjector, ScriptLoadSignal,
    ScriptLoadState, ScriptLoadWait, ScriptLoader, ScriptTag,
};
#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub use web::{install_tracking, ObjectPluginHost, WebEnvironment, WebScriptInjector};
