use crate::core::tracker::{ChangeEntry, ChangeLog};
use crate::utils::error::{EditorError, Result};
use serde::Serialize;

pub const HEADERS: [&str; 6] = [
    "Service Key",
    "Service Name",
    "Device Type",
    "Platform",
    "Old Connectivity",
    "New Connectivity",
];

#[derive(Debug, Serialize)]
struct ChangeRow<'a> {
    #[serde(rename = "Service Key")]
    service_key: &'a str,
    #[serde(rename = "Service Name")]
    service_name: &'a str,
    #[serde(rename = "Device Type")]
    device_type: &'a str,
    #[serde(rename = "Platform")]
    platform: &'a str,
    #[serde(rename = "Old Connectivity")]
    old_connectivity: String,
    #[serde(rename = "New Connectivity")]
    new_connectivity: String,
}

impl<'a> From<&'a ChangeEntry> for ChangeRow<'a> {
    fn from(entry: &'a ChangeEntry) -> Self {
        Self {
            service_key: &entry.service_key,
            service_name: &entry.service_name,
            device_type: &entry.device_type,
            platform: &entry.device_platform,
            old_connectivity: entry.old_display(),
            new_connectivity: entry.new_display(),
        }
    }
}

pub fn to_csv(log: &ChangeLog) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if log.is_empty() {
        writer.write_record(HEADERS)?;
    }
    for entry in log {
        writer.serialize(ChangeRow::from(entry))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| EditorError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| EditorError::InvalidDocumentError {
        message: format!("change log is not valid UTF-8: {}", e),
    })
}

/// Renders the change log as an aligned plain-text table.
pub fn to_table(log: &ChangeLog) -> String {
    let rows: Vec<[String; 6]> = log
        .iter()
        .map(|e| {
            [
                e.service_key.clone(),
                e.service_name.clone(),
                e.device_type.clone(),
                e.device_platform.clone(),
                e.old_display(),
                e.new_display(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_row(&HEADERS.map(str::to_string), &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &rows {
        lines.push(format_row(row, &widths));
    }
    lines.join("\n")
}

fn format_row(cells: &[String; 6], widths: &[usize; 6]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}
