use std::fmt;
use std::sync::Arc;

use crate::tracking::config::{AnalyticsConfig, TrackingFlags};
use crate::tracking::environment::TrackingEnvironment;
use crate::tracking::logger::LOGGER;
use crate::tracking::metadata::PageMetadata;
use crate::tracking::script::{ScriptLoadSignal, ScriptLoader};

/// Process-wide tracking context, built once at startup and passed to every forwarder.
#[derive(Clone)]
pub struct TrackingContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    environment: Arc<dyn TrackingEnvironment>,
    scripts: Arc<ScriptLoader>,
}

impl fmt::Debug for TrackingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingContext")
            .field("scripts", &self.inner.scripts)
            .finish()
    }
}

impl TrackingContext {
    /// Creates a context backed by the process-wide script loader.
    pub fn new(environment: Arc<dyn TrackingEnvironment>) -> Self {
        Self::with_script_loader(environment, ScriptLoader::shared())
    }

    pub fn with_script_loader(
        environment: Arc<dyn TrackingEnvironment>,
        scripts: Arc<ScriptLoader>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                environment,
                scripts,
            }),
        }
    }

    /// Context bound to the current page's globals.
    #[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
    pub fn browser(globals: crate::tracking::config::GlobalNames) -> Self {
        Self::new(Arc::new(crate::tracking::web::WebEnvironment::new(globals)))
    }

    pub fn environment(&self) -> &Arc<dyn TrackingEnvironment> {
        &self.inner.environment
    }

    pub fn scripts(&self) -> &Arc<ScriptLoader> {
        &self.inner.scripts
    }

    /// Requests the vendor script through this context's loader.
    pub fn ensure_vendor_script_loaded(&self, url: &str) -> ScriptLoadSignal {
        self.inner.scripts.ensure_loaded(url)
    }
}

/// Writes the configuration object for `key` with the default flags and resets the page
/// metadata to its stub. Every call overwrites what a previous call wrote.
pub fn configure_analytics(context: &TrackingContext, key: &str) -> AnalyticsConfig {
    configure_analytics_with_flags(context, key, TrackingFlags::default())
}

pub fn configure_analytics_with_flags(
    context: &TrackingContext,
    key: &str,
    flags: TrackingFlags,
) -> AnalyticsConfig {
    let config = AnalyticsConfig::new(key, flags);
    if let Err(err) = context
        .environment()
        .publish(&config, &PageMetadata::stub())
    {
        LOGGER.warn(format!("Failed to publish analytics configuration: {err}"));
    }
    config
}
