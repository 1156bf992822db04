//! BLE radio configuration

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Settings for the platform scanner and advertiser
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BleRadioConfig {
    /// Index into the host's adapter list
    pub adapter_index: usize,
    /// Ask the OS to filter scans by the CrowdLink service UUID
    pub filter_by_service: bool,
    /// List the service UUID in our own advertisement
    ///
    /// A 128-bit UUID plus a 16-byte identity does not fit a legacy frame,
    /// so this only works on controllers with extended advertising.
    pub advertise_service_uuid: bool,
    /// Local name used when settings ask for the device name
    pub local_name: String,
}

impl Default for BleRadioConfig {
    fn default() -> Self {
        Self {
            adapter_index: 0,
            filter_by_service: false,
            advertise_service_uuid: false,
            local_name: "CrowdLink".to_string(),
        }
    }
}

impl BleRadioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set which adapter to use
    pub fn with_adapter_index(mut self, index: usize) -> Self {
        self.adapter_index = index;
        self
    }

    /// Enable or disable OS-level service filtering
    pub fn with_filter_by_service(mut self, enabled: bool) -> Self {
        self.filter_by_service = enabled;
        self
    }

    /// Enable or disable the service UUID in advertisements
    pub fn with_advertise_service_uuid(mut self, enabled: bool) -> Self {
        self.advertise_service_uuid = enabled;
        self
    }

    /// Set the advertised local name
    pub fn with_local_name(mut self, name: impl Into<String>) -> Self {
        self.local_name = name.into();
        self
    }
}
