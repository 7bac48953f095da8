use crate::utils::error::{EditorError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Delivery method a device can be served with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connectivity {
    Iptv,
    Satellite,
}

impl Connectivity {
    pub const ALL: [Connectivity; 2] = [Connectivity::Iptv, Connectivity::Satellite];

    pub fn as_str(&self) -> &'static str {
        match self {
            Connectivity::Iptv => "IPTV",
            Connectivity::Satellite => "SATELLITE",
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Connectivity {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IPTV" => Ok(Connectivity::Iptv),
            "SATELLITE" => Ok(Connectivity::Satellite),
            _ => Err(EditorError::UnknownConnectivityError {
                value: s.to_string(),
            }),
        }
    }
}

/// Unordered set of connectivity flags.
///
/// Serialized as a JSON array in canonical order, so `["SATELLITE", "IPTV"]`
/// and `["IPTV", "SATELLITE"]` load as the same value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectivitySet(BTreeSet<Connectivity>);

impl ConnectivitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Connectivity::ALL.into_iter().collect()
    }

    /// Parses flags given as free text, e.g. from the command line.
    pub fn parse_flags<S: AsRef<str>>(flags: &[S]) -> Result<Self> {
        flags
            .iter()
            .flat_map(|flag| flag.as_ref().split(','))
            .filter(|flag| !flag.trim().is_empty())
            .map(Connectivity::from_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Connectivity> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Connectivity> for ConnectivitySet {
    fn from_iter<I: IntoIterator<Item = Connectivity>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ConnectivitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .iter()
            .map(|flag| flag.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&joined)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_type: String,
    pub device_platform: String,
    pub device_connectivity: ConnectivitySet,
    // provider 等其他欄位原樣保留，讓輸出與輸入一致
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    pub fn new(provider: Option<&str>, device_type: &str, device_platform: &str) -> Self {
        let mut extra = Map::new();
        if let Some(provider) = provider {
            extra.insert("provider".to_string(), Value::from(provider));
        }
        Self {
            device_type: device_type.to_string(),
            device_platform: device_platform.to_string(),
            device_connectivity: ConnectivitySet::new(),
            extra,
        }
    }

    pub fn provider(&self) -> Option<&str> {
        self.extra.get("provider").and_then(Value::as_str)
    }

    pub fn is(&self, device_type: &str, device_platform: &str) -> bool {
        self.device_type == device_type && self.device_platform == device_platform
    }

    pub fn label(&self) -> String {
        format!("{} - {}", self.device_type, self.device_platform)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bouquet {
    pub bouquet_id: Value,
    pub sub_bouquet_id: Value,
    pub service_key: String,
    pub devices: Vec<Device>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Bouquet {
    pub fn find_device(&self, device_type: &str, device_platform: &str) -> Option<&Device> {
        self.devices
            .iter()
            .find(|d| d.is(device_type, device_platform))
    }

    pub fn find_device_mut(
        &mut self,
        device_type: &str,
        device_platform: &str,
    ) -> Option<&mut Device> {
        self.devices
            .iter_mut()
            .find(|d| d.is(device_type, device_platform))
    }
}
