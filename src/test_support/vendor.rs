use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::tracking::VendorTracker;
use crate::tracking::error::{vendor_call_error, TrackingResult};

#[derive(Clone, Debug, PartialEq)]
pub enum VendorCall {
    PageEvent {
        category: String,
        route: String,
        options: Value,
    },
    TrackEvent {
        name: String,
        payload: Value,
    },
}

/// Vendor double that records every call it receives.
#[derive(Clone, Default)]
pub struct RecordingVendor {
    calls: Arc<Mutex<Vec<VendorCall>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingVendor {
    pub fn calls(&self) -> Vec<VendorCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Makes every subsequent call return an error after being recorded.
    pub fn fail_calls(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn record(&self, call: VendorCall) -> TrackingResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(vendor_call_error("vendor rejected the call"));
        }
        Ok(())
    }
}

impl VendorTracker for RecordingVendor {
    fn page_event(&self, category: &str, route: &str, options: &Value) -> TrackingResult<()> {
        self.record(VendorCall::PageEvent {
            category: category.to_string(),
            route: route.to_string(),
            options: options.clone(),
        })
    }

    fn track_event(&self, name: &str, payload: &Value) -> TrackingResult<()> {
        self.record(VendorCall::TrackEvent {
            name: name.to_string(),
            payload: payload.clone(),
        })
    }
}
