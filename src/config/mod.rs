pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::toml_config::EditorConfig;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "bouquet-editor")]
#[command(about = "Edit per-device connectivity in a bouquet JSON document")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Bouquet JSON document to edit (omit to resume from the autosave)
    #[arg(short, long)]
    pub input: Option<String>,

    /// Where the edited document is written
    #[arg(short, long)]
    pub output: Option<String>,

    /// Service name mapping JSON
    #[arg(long)]
    pub names: Option<String>,

    /// Session snapshot used to carry edits between runs
    #[arg(long)]
    pub autosave: Option<String>,

    /// Do not list removed service keys in the change log
    #[arg(long)]
    pub ignore_removals: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: EditorCommand,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum EditorCommand {
    /// List service keys in the working document
    Keys,
    /// Show the devices of one service key
    Show { key: String },
    /// Replace the connectivity of one device (no flags clears it)
    Set {
        key: String,
        device_type: String,
        device_platform: String,
        /// IPTV and/or SATELLITE, space or comma separated
        flags: Vec<String>,
    },
    /// Add a service key from the device template
    Add {
        key: String,
        /// Autofill every template device: keep, none, iptv, satellite, both
        #[arg(long, default_value = "keep")]
        fill: String,
    },
    /// Delete a service key
    Remove { key: String },
    /// Print the change log without saving
    Diff {
        /// Print as CSV instead of a table
        #[arg(long)]
        csv: bool,
    },
    /// Write the edited document and print the change log
    Save {
        /// Also write the change log as CSV
        #[arg(long)]
        change_log: Option<String>,
    },
    /// Drop the autosave snapshot
    Discard,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the TOML file (if any) and applies command line overrides on top.
    pub fn to_editor_config(&self) -> Result<EditorConfig> {
        let mut config = match &self.config {
            Some(path) => EditorConfig::from_file(path)?,
            None => EditorConfig::default(),
        };

        if let Some(input) = &self.input {
            config.paths.input = Some(input.clone());
        }
        if let Some(output) = &self.output {
            config.paths.output = output.clone();
        }
        if let Some(names) = &self.names {
            config.paths.name_mapping = names.clone();
        }
        if let Some(autosave) = &self.autosave {
            config.paths.autosave = autosave.clone();
        }
        if self.ignore_removals {
            config.tracking.track_removals = false;
        }
        if let EditorCommand::Save {
            change_log: Some(path),
        } = &self.command
        {
            config.paths.change_log = Some(path.clone());
        }

        Ok(config)
    }

    pub fn verbose(&self, config: &EditorConfig) -> bool {
        self.verbose || config.logging.verbose.unwrap_or(false)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::core::template::Autofill;
    use crate::core::ConfigProvider;

    #[test]
    fn test_flags_override_defaults() {
        let cli = CliConfig::parse_from([
            "bouquet-editor",
            "--input",
            "bouquets.json",
            "--output",
            "edited.json",
            "--ignore-removals",
            "save",
            "--change-log",
            "changes.csv",
        ]);
        let config = cli.to_editor_config().unwrap();

        assert_eq!(config.input_path(), Some("bouquets.json"));
        assert_eq!(config.output_path(), "edited.json");
        assert_eq!(config.change_log_path(), Some("changes.csv"));
        assert!(!config.track_removals());
    }

    #[test]
    fn test_set_collects_flags() {
        let cli = CliConfig::parse_from(["bouquet-editor", "set", "K1", "TV", "LG", "IPTV", "SATELLITE"]);
        match cli.command {
            EditorCommand::Set {
                key,
                device_type,
                device_platform,
                flags,
            } => {
                assert_eq!(key, "K1");
                assert_eq!(device_type, "TV");
                assert_eq!(device_platform, "LG");
                assert_eq!(flags, vec!["IPTV", "SATELLITE"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_add_defaults_to_keeping_template_connectivity() {
        let cli = CliConfig::parse_from(["bouquet-editor", "add", "K9"]);
        match cli.command {
            EditorCommand::Add { key, fill } => {
                assert_eq!(key, "K9");
                assert_eq!(fill.parse::<Autofill>().unwrap(), Autofill::Keep);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
