use crate::core::ConfigProvider;
use crate::domain::model::Device;
use crate::utils::error::{EditorError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_OUTPUT_FILE: &str = "updated_output.json";
pub const DEFAULT_NAME_MAPPING: &str = "name_mapping.json";
pub const DEFAULT_AUTOSAVE_FILE: &str = "autosave.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub template: Option<TemplateConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub input: Option<String>,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_name_mapping")]
    pub name_mapping: String,
    #[serde(default = "default_autosave")]
    pub autosave: String,
    pub change_log: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: default_output(),
            name_mapping: default_name_mapping(),
            autosave: default_autosave(),
            change_log: None,
        }
    }
}

fn default_output() -> String {
    DEFAULT_OUTPUT_FILE.to_string()
}

fn default_name_mapping() -> String {
    DEFAULT_NAME_MAPPING.to_string()
}

fn default_autosave() -> String {
    DEFAULT_AUTOSAVE_FILE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_true")]
    pub track_removals: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            track_removals: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: Option<String>,
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub devices: Vec<Device>,
}

impl EditorConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EditorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EditorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BOUQUET_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EditorError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(input) = &self.paths.input {
            validation::validate_json_path("paths.input", input)?;
        }
        validation::validate_json_path("paths.output", &self.paths.output)?;
        validation::validate_json_path("paths.name_mapping", &self.paths.name_mapping)?;
        validation::validate_json_path("paths.autosave", &self.paths.autosave)?;

        if let Some(change_log) = &self.paths.change_log {
            validation::validate_path("paths.change_log", change_log)?;
            validation::validate_file_extension("paths.change_log", change_log, &["csv"])?;
        }

        if let Some(format) = &self.logging.format {
            if LogFormat::parse(format).is_none() {
                return Err(EditorError::InvalidConfigValueError {
                    field: "logging.format".to_string(),
                    value: format.clone(),
                    reason: "Unsupported format. Valid formats: compact, json".to_string(),
                });
            }
        }

        if let Some(template) = &self.template {
            if template.devices.is_empty() {
                return Err(EditorError::ConfigValidationError {
                    field: "template.devices".to_string(),
                    message: "template must list at least one device".to_string(),
                });
            }
            let mut seen = HashSet::new();
            for device in &template.devices {
                validation::validate_non_empty_string("template.devices.deviceType", &device.device_type)?;
                validation::validate_non_empty_string(
                    "template.devices.devicePlatform",
                    &device.device_platform,
                )?;
                if !seen.insert((device.device_type.as_str(), device.device_platform.as_str())) {
                    return Err(EditorError::ConfigValidationError {
                        field: "template.devices".to_string(),
                        message: format!("device {} is listed more than once", device.label()),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn log_format(&self) -> LogFormat {
        self.logging
            .format
            .as_deref()
            .and_then(LogFormat::parse)
            .unwrap_or_default()
    }

    pub fn change_log_path(&self) -> Option<&str> {
        self.paths.change_log.as_deref()
    }
}

impl ConfigProvider for EditorConfig {
    fn input_path(&self) -> Option<&str> {
        self.paths.input.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.paths.output
    }

    fn name_mapping_path(&self) -> &str {
        &self.paths.name_mapping
    }

    fn autosave_path(&self) -> &str {
        &self.paths.autosave
    }

    fn track_removals(&self) -> bool {
        self.tracking.track_removals
    }

    fn template_devices(&self) -> Option<&[Device]> {
        self.template.as_ref().map(|t| t.devices.as_slice())
    }
}

impl Validate for EditorConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
