use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrackingErrorCode {
    MissingConfigurationField,
    ScriptLoadFailure,
    InvalidArgument,
    VendorCall,
    Internal,
}

impl TrackingErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingErrorCode::MissingConfigurationField => "tracking/missing-configuration-field",
            TrackingErrorCode::ScriptLoadFailure => "tracking/script-load-failure",
            TrackingErrorCode::InvalidArgument => "tracking/invalid-argument",
            TrackingErrorCode::VendorCall => "tracking/vendor-call",
            TrackingErrorCode::Internal => "tracking/internal",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackingError {
    pub code: TrackingErrorCode,
    message: String,
}

impl TrackingError {
    pub fn new(code: TrackingErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` for the only error class that forwarders hand back to their caller.
    pub fn is_missing_configuration(&self) -> bool {
        self.code == TrackingErrorCode::MissingConfigurationField
    }
}

impl Display for TrackingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for TrackingError {}

pub type TrackingResult<T> = Result<T, TrackingError>;

pub fn missing_configuration_field(message: impl Into<String>) -> TrackingError {
    TrackingError::new(TrackingErrorCode::MissingConfigurationField, message)
}

pub fn script_load_failure(message: impl Into<String>) -> TrackingError {
    TrackingError::new(TrackingErrorCode::ScriptLoadFailure, message)
}

pub fn invalid_argument(message: impl Into<String>) -> TrackingError {
    TrackingError::new(TrackingErrorCode::InvalidArgument, message)
}

pub fn vendor_call_error(message: impl Into<String>) -> TrackingError {
    TrackingError::new(TrackingErrorCode::VendorCall, message)
}

pub fn internal_error(message: impl Into<String>) -> TrackingError {
    TrackingError::new(TrackingErrorCode::Internal, message)
}
