use crate::core::names::NameMapping;
use crate::core::report;
use crate::core::store::DocumentStore;
use crate::core::template::{Autofill, DeviceTemplate};
use crate::core::tracker::{ChangeLog, ChangeTracker};
use crate::core::{ConfigProvider, Storage};
use crate::domain::model::{Bouquet, ConnectivitySet};
use crate::utils::error::{EditorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Working copy written after every edit so a session survives restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub source: Option<String>,
    pub saved_at: DateTime<Utc>,
    pub bouquets: Vec<Bouquet>,
}

/// A discrete user action.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SetConnectivity {
        key: String,
        device_type: String,
        device_platform: String,
        connectivity: ConnectivitySet,
    },
    AddBouquet {
        key: String,
        fill: Autofill,
    },
    RemoveBouquet {
        key: String,
    },
    Save,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Updated,
    Added { key: String, devices: usize },
    Removed { key: String, existed: bool },
    Saved { output_path: String, change_log: ChangeLog },
}

/// One editing session over one document.
pub struct EditorSession<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    store: DocumentStore,
    names: NameMapping,
    template: DeviceTemplate,
    source: Option<String>,
}

impl<S: Storage, C: ConfigProvider> EditorSession<S, C> {
    pub async fn open(storage: S, config: C) -> Result<Self> {
        let names = load_names(&storage, config.name_mapping_path()).await?;
        let snapshot = load_snapshot(&storage, config.autosave_path()).await;

        let (store, source) = match config.input_path() {
            Some(input) => {
                tracing::info!("📁 Loading bouquet document from: {}", input);
                let baseline = DocumentStore::from_json(&storage.read_file(input).await?)?;

                match snapshot {
                    Some(snapshot) if snapshot.source.as_deref() == Some(input) => {
                        tracing::info!(
                            "♻️ Resuming edits autosaved at {}",
                            snapshot.saved_at.to_rfc3339()
                        );
                        let store = DocumentStore::resume(
                            baseline.baseline().to_vec(),
                            snapshot.bouquets,
                        )?;
                        (store, Some(input.to_string()))
                    }
                    Some(_) => {
                        // 換了新檔案，舊的自動存檔作廢
                        tracing::info!("New document loaded, discarding previous autosave");
                        storage.remove_file(config.autosave_path()).await?;
                        (baseline, Some(input.to_string()))
                    }
                    None => (baseline, Some(input.to_string())),
                }
            }
            None => {
                let snapshot = snapshot.ok_or_else(|| EditorError::NoDocumentError {
                    message: "no input document given and no autosave found".to_string(),
                })?;
                tracing::info!("Restored session from autosave (no input document given)");
                restore(&storage, snapshot).await?
            }
        };

        let template = config
            .template_devices()
            .map(|devices| DeviceTemplate::from_devices(devices.to_vec()))
            .unwrap_or_default();

        tracing::info!(
            "✅ Session opened with {} bouquets ({} service names)",
            store.working().len(),
            names.len()
        );

        Ok(Self {
            storage,
            config,
            store,
            names,
            template,
            source,
        })
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn names(&self) -> &NameMapping {
        &self.names
    }

    pub fn template(&self) -> &DeviceTemplate {
        &self.template
    }

    pub fn service_name(&self, key: &str) -> &str {
        self.names.label(key)
    }

    pub fn change_log(&self) -> ChangeLog {
        ChangeTracker::new(&self.names)
            .track_removals(self.config.track_removals())
            .diff(self.store.baseline(), self.store.working())
    }

    pub async fn handle(&mut self, event: SessionEvent) -> Result<Outcome> {
        let outcome = match event {
            SessionEvent::SetConnectivity {
                key,
                device_type,
                device_platform,
                connectivity,
            } => {
                self.store
                    .set_device_connectivity(&key, &device_type, &device_platform, connectivity)?;
                Outcome::Updated
            }
            SessionEvent::AddBouquet { key, fill } => {
                let devices = self.template.autofilled(fill);
                let added = self.store.add_bouquet(&key, &devices)?;
                Outcome::Added {
                    key: added.service_key.clone(),
                    devices: added.devices.len(),
                }
            }
            SessionEvent::RemoveBouquet { key } => {
                let existed = self.store.remove_bouquet(&key);
                Outcome::Removed { key, existed }
            }
            SessionEvent::Save => {
                let change_log = self.save().await?;
                return Ok(Outcome::Saved {
                    output_path: self.config.output_path().to_string(),
                    change_log,
                });
            }
        };

        self.autosave().await;
        Ok(outcome)
    }

    /// Persists the working document and returns what changed against the baseline.
    ///
    /// On failure nothing in memory changes, so the caller can retry.
    pub async fn save(&mut self) -> Result<ChangeLog> {
        let change_log = self.change_log();
        let data = serde_json::to_vec_pretty(self.store.working())?;

        self.storage
            .write_file(self.config.output_path(), &data)
            .await?;
        tracing::info!(
            "💾 Saved {} bouquets to {} ({} changed devices)",
            self.store.working().len(),
            self.config.output_path(),
            change_log.len()
        );

        self.autosave().await;
        Ok(change_log)
    }

    pub async fn export_change_log(&self, path: &str, change_log: &ChangeLog) -> Result<()> {
        let csv_output = report::to_csv(change_log)?;
        self.storage.write_file(path, csv_output.as_bytes()).await?;
        tracing::info!("📝 Change log written to {}", path);
        Ok(())
    }

    /// Flushes the snapshot and ends the session.
    pub async fn close(self) -> Result<()> {
        self.write_snapshot().await?;
        tracing::debug!("Session closed");
        Ok(())
    }

    /// Ends the session and forgets any unsaved edits.
    pub async fn discard(self) -> Result<()> {
        self.storage.remove_file(self.config.autosave_path()).await?;
        tracing::info!("🗑️ Autosave discarded");
        Ok(())
    }

    async fn autosave(&self) {
        if let Err(e) = self.write_snapshot().await {
            tracing::warn!("⚠️ Autosave failed: {}", e);
        }
    }

    async fn write_snapshot(&self) -> Result<()> {
        let snapshot = SessionSnapshot {
            source: self.source.clone(),
            saved_at: Utc::now(),
            bouquets: self.store.working().to_vec(),
        };
        let data = serde_json::to_vec_pretty(&snapshot)?;
        self.storage
            .write_file(self.config.autosave_path(), &data)
            .await
    }
}

async fn load_names<S: Storage>(storage: &S, path: &str) -> Result<NameMapping> {
    if !storage.exists(path).await {
        tracing::error!("❌ Could not find name mapping file: {}", path);
        return Err(EditorError::MissingNameMappingError {
            path: path.to_string(),
        });
    }
    NameMapping::from_json(&storage.read_file(path).await?)
}

async fn load_snapshot<S: Storage>(storage: &S, path: &str) -> Option<SessionSnapshot> {
    if !storage.exists(path).await {
        return None;
    }
    let parsed = match storage.read_file(path).await {
        Ok(data) => serde_json::from_slice::<SessionSnapshot>(&data).map_err(EditorError::from),
        Err(e) => Err(e),
    };
    match parsed {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!("⚠️ Failed to load autosave: {}", e);
            None
        }
    }
}

/// Rebuilds a session from the snapshot alone. The original document becomes
/// the baseline again when it is still readable.
async fn restore<S: Storage>(
    storage: &S,
    snapshot: SessionSnapshot,
) -> Result<(DocumentStore, Option<String>)> {
    if let Some(source) = snapshot.source.as_deref() {
        if storage.exists(source).await {
            let baseline = DocumentStore::from_json(&storage.read_file(source).await?)?;
            let store = DocumentStore::resume(baseline.baseline().to_vec(), snapshot.bouquets)?;
            return Ok((store, snapshot.source));
        }
        tracing::warn!(
            "⚠️ Original document {} is gone, using the autosave as baseline",
            source
        );
    }
    Ok((DocumentStore::load(snapshot.bouquets)?, snapshot.source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Connectivity, Device};
    use crate::core::tracker::ChangeKind;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        fail_writes: Arc<Mutex<bool>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &[u8]) {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }

        async fn set_fail_writes(&self, fail: bool) {
            *self.fail_writes.lock().await = fail;
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EditorError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            if *self.fail_writes.lock().await {
                return Err(EditorError::IoError(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )));
            }
            self.files.lock().await.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn exists(&self, path: &str) -> bool {
            self.files.lock().await.contains_key(path)
        }

        async fn remove_file(&self, path: &str) -> Result<()> {
            self.files.lock().await.remove(path);
            Ok(())
        }
    }

    struct MockConfig {
        input: Option<String>,
        track_removals: bool,
        template: Option<Vec<Device>>,
    }

    impl MockConfig {
        fn new(input: Option<&str>) -> Self {
            Self {
                input: input.map(str::to_string),
                track_removals: true,
                template: None,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> Option<&str> {
            self.input.as_deref()
        }

        fn output_path(&self) -> &str {
            "updated_output.json"
        }

        fn name_mapping_path(&self) -> &str {
            "name_mapping.json"
        }

        fn autosave_path(&self) -> &str {
            "autosave.json"
        }

        fn track_removals(&self) -> bool {
            self.track_removals
        }

        fn template_devices(&self) -> Option<&[Device]> {
            self.template.as_deref()
        }
    }

    const DOCUMENT: &str = r#"[
        {"bouquetId": 4101, "subBouquetId": 1, "serviceKey": "K1", "devices": [
            {"provider": "SKY", "deviceType": "TV", "devicePlatform": "LG", "deviceConnectivity": ["IPTV"]}
        ]},
        {"bouquetId": 4101, "subBouquetId": 1, "serviceKey": "K2", "devices": [
            {"provider": "SKY", "deviceType": "TV", "devicePlatform": "LG", "deviceConnectivity": []}
        ]}
    ]"#;

    async fn storage_with_inputs() -> MockStorage {
        let storage = MockStorage::default();
        storage.put("bouquets.json", DOCUMENT.as_bytes()).await;
        storage
            .put(
                "name_mapping.json",
                br#"{"services": [{"sid": "K1", "t": "Sky One"}]}"#,
            )
            .await;
        storage
    }

    fn satellite() -> ConnectivitySet {
        [Connectivity::Satellite].into_iter().collect()
    }

    #[tokio::test]
    async fn test_open_requires_name_mapping() {
        let storage = MockStorage::default();
        storage.put("bouquets.json", DOCUMENT.as_bytes()).await;

        let result = EditorSession::open(storage, MockConfig::new(Some("bouquets.json"))).await;
        assert!(matches!(
            result.err(),
            Some(EditorError::MissingNameMappingError { .. })
        ));
    }

    #[tokio::test]
    async fn test_open_without_input_or_autosave_fails() {
        let storage = storage_with_inputs().await;
        let result = EditorSession::open(storage, MockConfig::new(None)).await;
        assert!(matches!(result.err(), Some(EditorError::NoDocumentError { .. })));
    }

    #[tokio::test]
    async fn test_edit_is_autosaved_and_resumed() {
        let storage = storage_with_inputs().await;
        let mut session = EditorSession::open(storage.clone(), MockConfig::new(Some("bouquets.json")))
            .await
            .unwrap();
        let outcome = session
            .handle(SessionEvent::SetConnectivity {
                key: "K2".to_string(),
                device_type: "TV".to_string(),
                device_platform: "LG".to_string(),
                connectivity: satellite(),
            })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Updated);
        assert!(storage.get_file("autosave.json").await.is_some());
        session.close().await.unwrap();

        let resumed = EditorSession::open(storage.clone(), MockConfig::new(Some("bouquets.json")))
            .await
            .unwrap();
        let log = resumed.change_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].service_key, "K2");
        assert_eq!(log.entries()[0].service_name, "Unknown");
    }

    #[tokio::test]
    async fn test_new_input_discards_stale_autosave() {
        let storage = storage_with_inputs().await;
        let mut session = EditorSession::open(storage.clone(), MockConfig::new(Some("bouquets.json")))
            .await
            .unwrap();
        session
            .handle(SessionEvent::RemoveBouquet {
                key: "K1".to_string(),
            })
            .await
            .unwrap();

        storage.put("other.json", DOCUMENT.as_bytes()).await;
        let fresh = EditorSession::open(storage.clone(), MockConfig::new(Some("other.json")))
            .await
            .unwrap();
        assert!(fresh.change_log().is_empty());
        assert!(storage.get_file("autosave.json").await.is_none());
    }

    #[tokio::test]
    async fn test_restore_from_autosave_keeps_original_baseline() {
        let storage = storage_with_inputs().await;
        let mut session = EditorSession::open(storage.clone(), MockConfig::new(Some("bouquets.json")))
            .await
            .unwrap();
        session
            .handle(SessionEvent::AddBouquet {
                key: "K9999".to_string(),
                fill: Autofill::Iptv,
            })
            .await
            .unwrap();

        let restored = EditorSession::open(storage.clone(), MockConfig::new(None))
            .await
            .unwrap();
        assert_eq!(restored.change_log().count(ChangeKind::Added), 12);

        // 原始檔不在時，自動存檔本身就是基準
        storage.files.lock().await.remove("bouquets.json");
        let restored = EditorSession::open(storage, MockConfig::new(None)).await.unwrap();
        assert!(restored.change_log().is_empty());
        assert!(restored.store().find_bouquet("K9999").is_some());
    }

    #[tokio::test]
    async fn test_duplicate_add_leaves_state_unchanged() {
        let storage = storage_with_inputs().await;
        let mut session = EditorSession::open(storage, MockConfig::new(Some("bouquets.json")))
            .await
            .unwrap();
        let err = session
            .handle(SessionEvent::AddBouquet {
                key: "K1".to_string(),
                fill: Autofill::None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::DuplicateServiceKeyError { .. }));
        assert!(session.change_log().is_empty());
    }

    #[tokio::test]
    async fn test_custom_template_is_used_for_add() {
        let storage = storage_with_inputs().await;
        let mut config = MockConfig::new(Some("bouquets.json"));
        config.template = Some(vec![Device::new(None, "TV", "SAMSUNG")]);
        let mut session = EditorSession::open(storage, config).await.unwrap();

        let outcome = session
            .handle(SessionEvent::AddBouquet {
                key: "K3".to_string(),
                fill: Autofill::Both,
            })
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Added {
                key: "K3".to_string(),
                devices: 1
            }
        );
    }

    #[tokio::test]
    async fn test_add_without_fill_keeps_template_connectivity() {
        let storage = storage_with_inputs().await;
        let mut preset = Device::new(None, "TV", "SAMSUNG");
        preset.device_connectivity = [Connectivity::Iptv].into_iter().collect();
        let mut config = MockConfig::new(Some("bouquets.json"));
        config.template = Some(vec![preset, Device::new(None, "TV", "LG")]);
        let mut session = EditorSession::open(storage, config).await.unwrap();

        session
            .handle(SessionEvent::AddBouquet {
                key: "K3".to_string(),
                fill: Autofill::default(),
            })
            .await
            .unwrap();

        let added = session.store().find_bouquet("K3").unwrap();
        assert_eq!(
            added.find_device("TV", "SAMSUNG").unwrap().device_connectivity,
            [Connectivity::Iptv].into_iter().collect::<ConnectivitySet>()
        );
        assert!(added
            .find_device("TV", "LG")
            .unwrap()
            .device_connectivity
            .is_empty());
    }

    #[tokio::test]
    async fn test_save_writes_document_and_reports_changes() {
        let storage = storage_with_inputs().await;
        let mut session = EditorSession::open(storage.clone(), MockConfig::new(Some("bouquets.json")))
            .await
            .unwrap();
        session
            .handle(SessionEvent::RemoveBouquet {
                key: "K1".to_string(),
            })
            .await
            .unwrap();

        let outcome = session.handle(SessionEvent::Save).await.unwrap();
        let Outcome::Saved {
            output_path,
            change_log,
        } = outcome
        else {
            panic!("expected a save outcome");
        };
        assert_eq!(output_path, "updated_output.json");
        assert_eq!(change_log.count(ChangeKind::Removed), 1);
        assert_eq!(change_log.entries()[0].service_name, "Sky One");

        let written: serde_json::Value =
            serde_json::from_slice(&storage.get_file("updated_output.json").await.unwrap()).unwrap();
        let keys: Vec<&str> = written
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["serviceKey"].as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["K2"]);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_edits_for_retry() {
        let storage = storage_with_inputs().await;
        let mut session = EditorSession::open(storage.clone(), MockConfig::new(Some("bouquets.json")))
            .await
            .unwrap();
        session
            .handle(SessionEvent::SetConnectivity {
                key: "K1".to_string(),
                device_type: "TV".to_string(),
                device_platform: "LG".to_string(),
                connectivity: satellite(),
            })
            .await
            .unwrap();

        storage.set_fail_writes(true).await;
        assert!(session.save().await.is_err());
        assert!(storage.get_file("updated_output.json").await.is_none());
        assert_eq!(session.change_log().len(), 1);

        storage.set_fail_writes(false).await;
        let log = session.save().await.unwrap();
        assert_eq!(log.len(), 1);
        assert!(storage.get_file("updated_output.json").await.is_some());
    }

    #[tokio::test]
    async fn test_export_change_log_and_discard() {
        let storage = storage_with_inputs().await;
        let mut session = EditorSession::open(storage.clone(), MockConfig::new(Some("bouquets.json")))
            .await
            .unwrap();
        session
            .handle(SessionEvent::RemoveBouquet {
                key: "K2".to_string(),
            })
            .await
            .unwrap();

        let log = session.save().await.unwrap();
        session.export_change_log("changes.csv", &log).await.unwrap();
        let csv_output = String::from_utf8(storage.get_file("changes.csv").await.unwrap()).unwrap();
        assert_eq!(csv_output.lines().count(), 2);
        assert!(csv_output.contains("K2,Unknown,TV,LG,,N/A"));

        session.discard().await.unwrap();
        assert!(storage.get_file("autosave.json").await.is_none());
    }
}
