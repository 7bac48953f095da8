use crate::domain::model::{Connectivity, ConnectivitySet, Device};
use crate::utils::error::{EditorError, Result};
use std::str::FromStr;

const DEFAULT_PROVIDER: &str = "SKY";

const DEFAULT_DEVICES: [(&str, &str); 12] = [
    ("SETTOPBOX", "AMIDALA"),
    ("MOBILE", "IOS"),
    ("MOBILE", "ANDROID"),
    ("COMPUTER", "PC"),
    ("COMPUTER", "MAC"),
    ("TABLET", "IOS"),
    ("TABLET", "ANDROID"),
    ("CONSOLE", "XBOX"),
    ("CONSOLE", "PLAYSTATION"),
    ("TV", "LG"),
    ("TV", "SAMSUNG"),
    ("IPSETTOPBOX", "APPLETV"),
];

/// Preset applied to every template device before a new bouquet is added.
///
/// `Keep` leaves each device with the connectivity the template gives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Autofill {
    #[default]
    Keep,
    None,
    Iptv,
    Satellite,
    Both,
}

impl Autofill {
    pub fn connectivity(&self) -> Option<ConnectivitySet> {
        match self {
            Autofill::Keep => None,
            Autofill::None => Some(ConnectivitySet::new()),
            Autofill::Iptv => Some([Connectivity::Iptv].into_iter().collect()),
            Autofill::Satellite => Some([Connectivity::Satellite].into_iter().collect()),
            Autofill::Both => Some(ConnectivitySet::all()),
        }
    }
}

impl FromStr for Autofill {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" | "" => Ok(Autofill::Keep),
            "none" => Ok(Autofill::None),
            "iptv" => Ok(Autofill::Iptv),
            "satellite" => Ok(Autofill::Satellite),
            "both" | "satellite,iptv" | "iptv,satellite" => Ok(Autofill::Both),
            _ => Err(EditorError::InvalidConfigValueError {
                field: "fill".to_string(),
                value: s.to_string(),
                reason: "Expected one of: keep, none, iptv, satellite, both".to_string(),
            }),
        }
    }
}

/// Device set cloned into every newly added bouquet.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceTemplate {
    devices: Vec<Device>,
}

impl Default for DeviceTemplate {
    fn default() -> Self {
        let devices = DEFAULT_DEVICES
            .iter()
            .map(|(device_type, platform)| Device::new(Some(DEFAULT_PROVIDER), device_type, platform))
            .collect();
        Self { devices }
    }
}

impl DeviceTemplate {
    pub fn from_devices(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Returns a copy of the template with every device set to `fill`; `Keep` copies it as is.
    pub fn autofilled(&self, fill: Autofill) -> Vec<Device> {
        let Some(connectivity) = fill.connectivity() else {
            return self.devices.clone();
        };
        self.devices
            .iter()
            .cloned()
            .map(|mut device| {
                device.device_connectivity = connectivity.clone();
                device
            })
            .collect()
    }
}
