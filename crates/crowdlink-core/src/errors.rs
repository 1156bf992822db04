//! Error types for the CrowdLink proximity engine
//!
//! Radio faults are the only failures surfaced to callers, and only from the
//! imperative entry points (start/stop discovery and advertising). The scan
//! event path never produces an error; malformed input degrades to a sentinel
//! value or a logged drop.

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Faults reported by the radio subsystem
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RadioError {
    #[error("Bluetooth adapter not available")]
    AdapterUnavailable,
    #[error("Bluetooth permission denied")]
    PermissionDenied,
    #[error("Scan failed: {reason}")]
    ScanFailed { reason: String },
    #[error("Advertising failed: {reason}")]
    AdvertiseFailed { reason: String },
    #[error("Advertisement payload too large: {size} bytes (max: {max_size})")]
    PayloadTooLarge { size: usize, max_size: usize },
    #[error("Operation not supported on this platform: {operation}")]
    Unsupported { operation: String },
}

impl RadioError {
    /// Stable reason code for presentation ("discovery did not start: <code>")
    pub fn reason_code(&self) -> &'static str {
        match self {
            RadioError::AdapterUnavailable => "adapter_unavailable",
            RadioError::PermissionDenied => "permission_denied",
            RadioError::ScanFailed { .. } => "scan_failed",
            RadioError::AdvertiseFailed { .. } => "advertise_failed",
            RadioError::PayloadTooLarge { .. } => "payload_too_large",
            RadioError::Unsupported { .. } => "unsupported",
        }
    }
}

// ----------------------------------------------------------------------------
// Main Error Type
// ----------------------------------------------------------------------------

/// Core error type for the CrowdLink engine
#[derive(Debug, thiserror::Error)]
pub enum CrowdlinkError {
    #[error("Radio error: {0}")]
    Radio(#[from] RadioError),

    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("Engine channel closed: {reason}")]
    Channel { reason: String },

    #[error("Peer registry error: {reason}")]
    Registry { reason: String },
}

impl CrowdlinkError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn channel(reason: impl Into<String>) -> Self {
        Self::Channel {
            reason: reason.into(),
        }
    }

    /// Reason code for "did not start" style reporting
    pub fn reason_code(&self) -> &'static str {
        match self {
            CrowdlinkError::Radio(e) => e.reason_code(),
            CrowdlinkError::Configuration { .. } => "invalid_configuration",
            CrowdlinkError::Channel { .. } => "engine_stopped",
            CrowdlinkError::Registry { .. } => "registry_error",
        }
    }
}

pub type Result<T> = core::result::Result<T, CrowdlinkError>;
