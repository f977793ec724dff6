pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::{CleaningOptions, FielderColumns, ParseErrorPolicy};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

/// Upper bound for fixed fielder slots; no dismissal involves more fielders than this.
pub const MAX_FIELDER_SLOTS: usize = 11;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "cricket-etl")]
#[command(about = "Flatten, clean and export ball-by-ball cricket match records")]
pub struct CliConfig {
    #[arg(long, default_value = "ipl_male_json", help = "Directory of match JSON files")]
    pub input_dir: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "cleaned_ball_by_ball.csv")]
    pub output_file: String,

    #[arg(long, default_value = "json", help = "Extension of match files")]
    pub extension: String,

    #[arg(long, help = "Skip match files that fail to parse instead of aborting")]
    pub skip_invalid: bool,

    #[arg(long, default_value = "4", help = "Match files flattened at once")]
    pub concurrency: usize,

    #[arg(long, help = "Export exactly this many fielder columns")]
    pub fielder_slots: Option<usize>,

    #[arg(long, help = "Include the innings in the duplicate delivery key")]
    pub dedup_by_innings: bool,

    #[arg(long, help = "Write tab separated output")]
    pub tsv: bool,

    #[arg(long, help = "Also write next-ball sequence windows of this length")]
    pub sequence_length: Option<usize>,

    #[arg(long, help = "Bundle every output into this ZIP file")]
    pub bundle: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log stage timings and memory usage")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_filename(&self) -> &str {
        &self.output_file
    }

    fn file_extension(&self) -> &str {
        &self.extension
    }

    fn parse_error_policy(&self) -> ParseErrorPolicy {
        if self.skip_invalid {
            ParseErrorPolicy::Skip
        } else {
            ParseErrorPolicy::Abort
        }
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn cleaning_options(&self) -> CleaningOptions {
        CleaningOptions {
            dedup_by_innings: self.dedup_by_innings,
        }
    }

    fn fielder_columns(&self) -> FielderColumns {
        self.fielder_slots
            .map_or(FielderColumns::Dynamic, FielderColumns::Fixed)
    }

    fn delimiter(&self) -> u8 {
        if self.tsv {
            b'\t'
        } else {
            b','
        }
    }

    fn sequence_length(&self) -> Option<usize> {
        self.sequence_length
    }

    fn bundle_filename(&self) -> Option<&str> {
        self.bundle.as_deref()
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_existing_dir("input_dir", &self.input_dir)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_file_name("output_file", &self.output_file)?;
        validation::validate_extension("extension", &self.extension)?;
        validation::validate_positive_number("concurrency", self.concurrency, 1)?;

        if let Some(slots) = self.fielder_slots {
            validation::validate_range("fielder_slots", slots, 0, MAX_FIELDER_SLOTS)?;
        }
        if let Some(length) = self.sequence_length {
            validation::validate_positive_number("sequence_length", length, 1)?;
        }
        if let Some(bundle) = &self.bundle {
            validation::validate_file_name("bundle", bundle)?;
        }

        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::parse_from(["cricket-etl"]);
        assert_eq!(config.input_dir, "ipl_male_json");
        assert_eq!(config.output_file, "cleaned_ball_by_ball.csv");
        assert_eq!(config.parse_error_policy(), ParseErrorPolicy::Abort);
        assert_eq!(config.fielder_columns(), FielderColumns::Dynamic);
        assert_eq!(config.delimiter(), b',');
        assert!(!config.cleaning_options().dedup_by_innings);
        assert_eq!(config.sequence_length(), None);
    }

    #[test]
    fn test_flags_map_onto_provider() {
        let config = CliConfig::parse_from([
            "cricket-etl",
            "--skip-invalid",
            "--fielder-slots",
            "3",
            "--tsv",
            "--sequence-length",
            "50",
            "--bundle",
            "run.zip",
        ]);
        assert_eq!(config.parse_error_policy(), ParseErrorPolicy::Skip);
        assert_eq!(config.fielder_columns(), FielderColumns::Fixed(3));
        assert_eq!(config.delimiter(), b'\t');
        assert_eq!(config.sequence_length(), Some(50));
        assert_eq!(config.bundle_filename(), Some("run.zip"));
    }

    #[test]
    fn test_validation() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().to_str().unwrap();

        let ok = CliConfig::parse_from(["cricket-etl", "--input-dir", input]);
        assert!(ok.validate().is_ok());

        let zero = CliConfig::parse_from(["cricket-etl", "--input-dir", input, "--concurrency", "0"]);
        assert!(zero.validate().is_err());

        let missing = CliConfig::parse_from(["cricket-etl", "--input-dir", "/no/such/dir"]);
        assert!(missing.validate().is_err());

        let window = CliConfig::parse_from([
            "cricket-etl",
            "--input-dir",
            input,
            "--sequence-length",
            "0",
        ]);
        assert!(window.validate().is_err());
    }
}
