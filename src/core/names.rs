use crate::utils::error::{EditorError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

pub const UNKNOWN_SERVICE: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct MappingFile {
    services: Vec<ServiceEntry>,
}

#[derive(Debug, Deserialize)]
struct ServiceEntry {
    sid: Value,
    t: String,
}

/// Service key to human readable label, used only to annotate output.
#[derive(Debug, Clone, Default)]
pub struct NameMapping {
    names: HashMap<String, String>,
}

impl NameMapping {
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let file: MappingFile = serde_json::from_slice(data)?;
        let mut names = HashMap::with_capacity(file.services.len());

        for entry in file.services {
            // sid 可能是數字或字串
            let sid = match entry.sid {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(EditorError::InvalidDocumentError {
                        message: format!("name mapping sid must be a string or number, got {}", other),
                    })
                }
            };
            names.insert(sid, entry.t);
        }

        tracing::debug!("Loaded {} service names", names.len());
        Ok(Self { names })
    }

    pub fn label(&self, key: &str) -> &str {
        self.names
            .get(key)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_SERVICE)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for NameMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
