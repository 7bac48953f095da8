use crate::core::names::NameMapping;
use crate::domain::model::{Bouquet, ConnectivitySet, Device};
use std::collections::HashSet;

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Modified,
    Added,
    Removed,
}

/// One device whose connectivity differs between baseline and working copy.
///
/// A `None` side means the device does not exist there (new or removed bouquet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    pub kind: ChangeKind,
    pub service_key: String,
    pub service_name: String,
    pub device_type: String,
    pub device_platform: String,
    pub old_connectivity: Option<ConnectivitySet>,
    pub new_connectivity: Option<ConnectivitySet>,
}

impl ChangeEntry {
    pub fn old_display(&self) -> String {
        display_side(&self.old_connectivity)
    }

    pub fn new_display(&self) -> String {
        display_side(&self.new_connectivity)
    }
}

fn display_side(side: &Option<ConnectivitySet>) -> String {
    side.as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeLog {
    entries: Vec<ChangeEntry>,
}

impl ChangeLog {
    pub fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChangeEntry> {
        self.entries.iter()
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }
}

impl<'a> IntoIterator for &'a ChangeLog {
    type Item = &'a ChangeEntry;
    type IntoIter = std::slice::Iter<'a, ChangeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Compares a working copy against its baseline.
pub struct ChangeTracker<'a> {
    names: &'a NameMapping,
    track_removals: bool,
}

impl<'a> ChangeTracker<'a> {
    pub fn new(names: &'a NameMapping) -> Self {
        Self {
            names,
            track_removals: true,
        }
    }

    pub fn track_removals(mut self, enabled: bool) -> Self {
        self.track_removals = enabled;
        self
    }

    pub fn diff(&self, baseline: &[Bouquet], working: &[Bouquet]) -> ChangeLog {
        let mut entries = Vec::new();

        // 先依 baseline 順序比對
        for original in baseline {
            match working
                .iter()
                .find(|b| b.service_key == original.service_key)
            {
                Some(edited) => self.diff_bouquet(original, edited, &mut entries),
                None if self.track_removals => {
                    for device in &original.devices {
                        entries.push(self.entry(
                            ChangeKind::Removed,
                            original,
                            device,
                            Some(device.device_connectivity.clone()),
                            None,
                        ));
                    }
                }
                None => {}
            }
        }

        // 再處理新增的 bouquet
        let known: HashSet<&str> = baseline.iter().map(|b| b.service_key.as_str()).collect();
        for added in working
            .iter()
            .filter(|b| !known.contains(b.service_key.as_str()))
        {
            for device in &added.devices {
                entries.push(self.entry(
                    ChangeKind::Added,
                    added,
                    device,
                    None,
                    Some(device.device_connectivity.clone()),
                ));
            }
        }

        tracing::debug!("Change tracker found {} changed devices", entries.len());
        ChangeLog { entries }
    }

    fn diff_bouquet(&self, original: &Bouquet, edited: &Bouquet, entries: &mut Vec<ChangeEntry>) {
        for device in &original.devices {
            let Some(current) = edited.find_device(&device.device_type, &device.device_platform)
            else {
                continue;
            };
            if current.device_connectivity != device.device_connectivity {
                entries.push(self.entry(
                    ChangeKind::Modified,
                    original,
                    device,
                    Some(device.device_connectivity.clone()),
                    Some(current.device_connectivity.clone()),
                ));
            }
        }
    }

    fn entry(
        &self,
        kind: ChangeKind,
        bouquet: &Bouquet,
        device: &Device,
        old_connectivity: Option<ConnectivitySet>,
        new_connectivity: Option<ConnectivitySet>,
    ) -> ChangeEntry {
        ChangeEntry {
            kind,
            service_key: bouquet.service_key.clone(),
            service_name: self.names.label(&bouquet.service_key).to_string(),
            device_type: device.device_type.clone(),
            device_platform: device.device_platform.clone(),
            old_connectivity,
            new_connectivity,
        }
    }
}
