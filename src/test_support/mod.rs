//! Test utilities shared across crate-level unit tests.

pub mod vendor;

pub use vendor::{RecordingVendor, VendorCall};
