use crate::domain::model::{Bouquet, ConnectivitySet, Device};
use crate::utils::error::{EditorError, Result};
use std::collections::HashSet;

/// Baseline and working copies of a bouquet document.
///
/// The baseline is fixed at `load` time; every edit goes to the working copy.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    baseline: Vec<Bouquet>,
    working: Vec<Bouquet>,
}

impl DocumentStore {
    pub fn load(document: Vec<Bouquet>) -> Result<Self> {
        validate_document(&document)?;
        tracing::debug!("Loaded document with {} bouquets", document.len());
        Ok(Self {
            baseline: document.clone(),
            working: document,
        })
    }

    /// Parses a raw JSON upload. Nothing is kept if any record is malformed.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(data)?;
        let serde_json::Value::Array(items) = value else {
            return Err(EditorError::InvalidDocumentError {
                message: "expected a JSON array of bouquets".to_string(),
            });
        };

        let mut document = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let bouquet: Bouquet =
                serde_json::from_value(item).map_err(|e| EditorError::InvalidDocumentError {
                    message: format!("bouquet #{}: {}", index, e),
                })?;
            document.push(bouquet);
        }

        Self::load(document)
    }

    /// Starts from an existing baseline with an already-edited working copy.
    pub fn resume(baseline: Vec<Bouquet>, working: Vec<Bouquet>) -> Result<Self> {
        validate_document(&baseline)?;
        validate_document(&working)?;
        Ok(Self { baseline, working })
    }

    pub fn baseline(&self) -> &[Bouquet] {
        &self.baseline
    }

    pub fn working(&self) -> &[Bouquet] {
        &self.working
    }

    pub fn into_document(self) -> Vec<Bouquet> {
        self.working
    }

    pub fn find_bouquet(&self, key: &str) -> Option<&Bouquet> {
        self.working.iter().find(|b| b.service_key == key)
    }

    pub fn find_baseline(&self, key: &str) -> Option<&Bouquet> {
        self.baseline.iter().find(|b| b.service_key == key)
    }

    pub fn service_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.working.iter().map(|b| b.service_key.as_str()).collect();
        keys.sort_unstable();
        keys
    }

    pub fn add_bouquet(&mut self, key: &str, template_devices: &[Device]) -> Result<&Bouquet> {
        let key = key.trim();
        if key.is_empty() {
            return Err(EditorError::InvalidConfigValueError {
                field: "service_key".to_string(),
                value: key.to_string(),
                reason: "Service key cannot be empty".to_string(),
            });
        }
        if self.find_bouquet(key).is_some() {
            tracing::warn!("⚠️ Service Key {} already exists", key);
            return Err(EditorError::DuplicateServiceKeyError {
                key: key.to_string(),
            });
        }

        // 新項目的 bouquetId / subBouquetId 從第一筆記錄複製
        let reference = self
            .working
            .first()
            .ok_or_else(|| EditorError::NoReferenceBouquetError {
                key: key.to_string(),
            })?;

        let bouquet = Bouquet {
            bouquet_id: reference.bouquet_id.clone(),
            sub_bouquet_id: reference.sub_bouquet_id.clone(),
            service_key: key.to_string(),
            devices: template_devices.to_vec(),
            extra: Default::default(),
        };
        validate_devices(&bouquet)?;

        tracing::info!(
            "➕ Added service key {} with {} devices",
            key,
            bouquet.devices.len()
        );
        self.working.push(bouquet);
        Ok(&self.working[self.working.len() - 1])
    }

    /// Idempotent: returns `false` when the key was not present.
    pub fn remove_bouquet(&mut self, key: &str) -> bool {
        let before = self.working.len();
        self.working.retain(|b| b.service_key != key);
        let removed = self.working.len() != before;
        if removed {
            tracing::info!("🗑️ Removed service key {}", key);
        } else {
            tracing::debug!("Service key {} not present, nothing to remove", key);
        }
        removed
    }

    pub fn set_device_connectivity(
        &mut self,
        key: &str,
        device_type: &str,
        device_platform: &str,
        connectivity: ConnectivitySet,
    ) -> Result<()> {
        let bouquet = self
            .working
            .iter_mut()
            .find(|b| b.service_key == key)
            .ok_or_else(|| EditorError::BouquetNotFoundError {
                key: key.to_string(),
            })?;

        let device = bouquet
            .find_device_mut(device_type, device_platform)
            .ok_or_else(|| EditorError::DeviceNotFoundError {
                key: key.to_string(),
                device_type: device_type.to_string(),
                device_platform: device_platform.to_string(),
            })?;

        tracing::debug!(
            "{} {}/{}: [{}] -> [{}]",
            key,
            device_type,
            device_platform,
            device.device_connectivity,
            connectivity
        );
        device.device_connectivity = connectivity;
        Ok(())
    }
}

fn validate_document(document: &[Bouquet]) -> Result<()> {
    let mut keys = HashSet::new();
    for bouquet in document {
        if bouquet.service_key.trim().is_empty() {
            return Err(EditorError::InvalidDocumentError {
                message: "bouquet with an empty serviceKey".to_string(),
            });
        }
        if !keys.insert(bouquet.service_key.as_str()) {
            return Err(EditorError::InvalidDocumentError {
                message: format!("serviceKey '{}' appears more than once", bouquet.service_key),
            });
        }
        validate_devices(bouquet)?;
    }
    Ok(())
}

fn validate_devices(bouquet: &Bouquet) -> Result<()> {
    let mut seen = HashSet::new();
    for device in &bouquet.devices {
        if !seen.insert((device.device_type.as_str(), device.device_platform.as_str())) {
            return Err(EditorError::DuplicateDeviceError {
                key: bouquet.service_key.clone(),
                device_type: device.device_type.clone(),
                device_platform: device.device_platform.clone(),
            });
        }
    }
    Ok(())
}
