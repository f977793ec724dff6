use crate::config::MAX_FIELDER_SLOTS;
use crate::core::sequence::DEFAULT_SEQUENCE_LENGTH;
use crate::core::ConfigProvider;
use crate::domain::model::{CleaningOptions, FielderColumns, ParseErrorPolicy};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_OUTPUT_FILENAME: &str = "cleaned_ball_by_ball.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub clean: Option<CleanConfig>,
    pub load: LoadConfig,
    pub sequence: Option<SequenceConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub input_dir: String,
    pub extension: Option<String>,
    pub on_parse_error: Option<ParseErrorPolicy>,
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanConfig {
    pub dedup_by_innings: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub filename: Option<String>,
    pub format: Option<String>,
    pub fielder_slots: Option<usize>,
    pub bundle: Option<BundleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleConfig {
    pub enabled: bool,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceConfig {
    pub enabled: bool,
    pub length: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validation::validate_existing_dir("source.input_dir", &self.source.input_dir)?;
        validation::validate_extension("source.extension", self.file_extension())?;
        validation::validate_positive_number("source.concurrency", self.concurrency(), 1)?;
        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_file_name("load.filename", self.output_filename())?;

        if let Some(format) = &self.load.format {
            let valid_formats = ["csv", "tsv"];
            if !valid_formats.contains(&format.as_str()) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "load.format".to_string(),
                    value: format.clone(),
                    reason: format!(
                        "Unsupported format. Valid formats: {}",
                        valid_formats.join(", ")
                    ),
                });
            }
        }

        if let Some(slots) = self.load.fielder_slots {
            validation::validate_range("load.fielder_slots", slots, 0, MAX_FIELDER_SLOTS)?;
        }

        if let Some(bundle) = &self.load.bundle {
            if bundle.enabled {
                validation::validate_file_name("load.bundle.filename", &bundle.filename)?;
            }
        }

        if let Some(length) = self.sequence_length() {
            validation::validate_positive_number("sequence.length", length, 1)?;
        }

        Ok(())
    }

    pub fn input_dir(&self) -> &str {
        &self.source.input_dir
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }
}

impl ConfigProvider for TomlConfig {
    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_filename(&self) -> &str {
        self.load
            .filename
            .as_deref()
            .unwrap_or(DEFAULT_OUTPUT_FILENAME)
    }

    fn file_extension(&self) -> &str {
        self.source.extension.as_deref().unwrap_or("json")
    }

    fn parse_error_policy(&self) -> ParseErrorPolicy {
        self.source.on_parse_error.unwrap_or_default()
    }

    fn concurrency(&self) -> usize {
        self.source.concurrency.unwrap_or(4)
    }

    fn cleaning_options(&self) -> CleaningOptions {
        CleaningOptions {
            dedup_by_innings: self
                .clean
                .as_ref()
                .and_then(|c| c.dedup_by_innings)
                .unwrap_or(false),
        }
    }

    fn fielder_columns(&self) -> FielderColumns {
        self.load
            .fielder_slots
            .map_or(FielderColumns::Dynamic, FielderColumns::Fixed)
    }

    fn delimiter(&self) -> u8 {
        match self.load.format.as_deref() {
            Some("tsv") => b'\t',
            _ => b',',
        }
    }

    fn sequence_length(&self) -> Option<usize> {
        self.sequence
            .as_ref()
            .filter(|s| s.enabled)
            .map(|s| s.length.unwrap_or(DEFAULT_SEQUENCE_LENGTH))
    }

    fn bundle_filename(&self) -> Option<&str> {
        self.load
            .bundle
            .as_ref()
            .filter(|b| b.enabled)
            .map(|b| b.filename.as_str())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
