use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use crate::tracking::config::AnalyticsConfig;
use crate::tracking::error::TrackingResult;
use crate::tracking::metadata::PageMetadata;

/// Event-reporting surface exposed by the vendor script.
pub trait VendorTracker: Send + Sync {
    fn page_event(&self, category: &str, route: &str, options: &Value) -> TrackingResult<()>;

    fn track_event(&self, name: &str, payload: &Value) -> TrackingResult<()>;
}

/// Page state the forwarders depend on. Implementations are queried on every call because the
/// vendor object appears only after its script has loaded and the host may replace the page
/// metadata at any time.
pub trait TrackingEnvironment: Send + Sync {
    fn vendor(&self) -> Option<Arc<dyn VendorTracker>>;

    fn page_metadata(&self) -> Option<PageMetadata>;

    /// Overwrites the configuration object and the page metadata seen by the vendor script.
    fn publish(&self, config: &AnalyticsConfig, metadata: &PageMetadata) -> TrackingResult<()>;
}

/// In-process environment for native hosts and tests.
#[derive(Default)]
pub struct MemoryEnvironment {
    vendor: RwLock<Option<Arc<dyn VendorTracker>>>,
    page_metadata: RwLock<Option<PageMetadata>>,
    config: RwLock<Option<AnalyticsConfig>>,
}

impl fmt::Debug for MemoryEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryEnvironment")
            .field("vendor_present", &read(&self.vendor).is_some())
            .field("page_metadata", &*read(&self.page_metadata))
            .field("config", &*read(&self.config))
            .finish()
    }
}

impl MemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vendor(self, vendor: Arc<dyn VendorTracker>) -> Self {
        self.set_vendor(Some(vendor));
        self
    }

    pub fn with_page_metadata(self, metadata: PageMetadata) -> Self {
        self.set_page_metadata(Some(metadata));
        self
    }

    pub fn set_vendor(&self, vendor: Option<Arc<dyn VendorTracker>>) {
        *write(&self.vendor) = vendor;
    }

    /// Replaces the page metadata, as the host page does once real page information is known.
    pub fn set_page_metadata(&self, metadata: Option<PageMetadata>) {
        *write(&self.page_metadata) = metadata;
    }

    /// Last configuration object written by the installer.
    pub fn analytics_config(&self) -> Option<AnalyticsConfig> {
        read(&self.config).clone()
    }
}

impl TrackingEnvironment for MemoryEnvironment {
    fn vendor(&self) -> Option<Arc<dyn VendorTracker>> {
        read(&self.vendor).clone()
    }

    fn page_metadata(&self) -> Option<PageMetadata> {
        read(&self.page_metadata).clone()
    }

    fn publish(&self, config: &AnalyticsConfig, metadata: &PageMetadata) -> TrackingResult<()> {
        *write(&self.config) = Some(config.clone());
        *write(&self.page_metadata) = Some(metadata.clone());
        Ok(())
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poison| poison.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poison| poison.into_inner())
}
