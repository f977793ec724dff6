use crate::core::aggregate::Aggregator;
use crate::core::clean::{Cleaner, CleaningReport};
use crate::core::export::{ExportOptions, Exporter};
use crate::core::options::CategoryOptions;
use crate::core::sequence::{build_windows, to_json_lines};
use crate::core::{ConfigProvider, Corpus, Pipeline, Storage, TransformResult};
use crate::domain::model::{FileSummary, SkippedFile};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const OPTIONS_FILENAME: &str = "category_options.json";
pub const REPORT_FILENAME: &str = "run_report.json";
pub const SEQUENCES_FILENAME: &str = "sequences.jsonl";

/// Written next to the table so a run can be audited without rerunning it.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub files: Vec<FileSummary>,
    pub skipped: Vec<SkippedFile>,
    pub cleaning: CleaningReport,
    pub columns: Vec<String>,
    pub sequence_windows: Option<usize>,
}

/// Match directory → cleaned delivery table.
pub struct MatchPipeline<S: Storage, C: ConfigProvider> {
    input: S,
    output: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> MatchPipeline<S, C> {
    /// `input` is rooted at the match directory, `output` at the output path.
    pub fn new(input: S, output: S, config: C) -> Self {
        Self {
            input,
            output,
            config,
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn output_location(&self, name: &str) -> String {
        format!("{}/{}", self.config.output_path().trim_end_matches('/'), name)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for MatchPipeline<S, C> {
    async fn extract(&self) -> Result<Corpus> {
        Aggregator::new(&self.input)
            .with_extension(self.config.file_extension())
            .with_policy(self.config.parse_error_policy())
            .with_concurrency(self.config.concurrency())
            .collect()
            .await
    }

    async fn transform(&self, corpus: Corpus) -> Result<TransformResult> {
        let Corpus {
            rows,
            files,
            skipped,
        } = corpus;

        let (rows, report) = Cleaner::new(self.config.cleaning_options()).run(rows);

        let exporter = Exporter::new(ExportOptions {
            fielder_columns: self.config.fielder_columns(),
            delimiter: self.config.delimiter(),
        });
        let (table_output, columns) = exporter.to_bytes(&rows)?;

        let sequences = self
            .config
            .sequence_length()
            .map(|length| build_windows(&rows, length))
            .transpose()?;

        Ok(TransformResult {
            options: CategoryOptions::from_rows(&rows),
            rows,
            report,
            columns,
            table_output,
            sequences,
            files,
            skipped,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let run_report = RunReport {
            generated_at: Utc::now(),
            files: result.files,
            skipped: result.skipped,
            cleaning: result.report,
            columns: result.columns,
            sequence_windows: result.sequences.as_ref().map(Vec::len),
        };

        let mut outputs: Vec<(String, Vec<u8>)> = vec![
            (self.config.output_filename().to_string(), result.table_output),
            (
                OPTIONS_FILENAME.to_string(),
                serde_json::to_vec_pretty(&result.options)?,
            ),
            (
                REPORT_FILENAME.to_string(),
                serde_json::to_vec_pretty(&run_report)?,
            ),
        ];
        if let Some(windows) = &result.sequences {
            outputs.push((SEQUENCES_FILENAME.to_string(), to_json_lines(windows)?));
        }

        if let Some(bundle) = self.config.bundle_filename() {
            tracing::debug!("Creating ZIP bundle with {} files", outputs.len());

            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for (name, data) in &outputs {
                    zip.start_file(name.as_str(), SimpleFileOptions::default())?;
                    zip.write_all(data)?;
                }
                zip.finish()?.into_inner()
            };

            self.output.write_file(bundle, &zip_data).await?;
            tracing::debug!("Wrote {} ({} bytes)", bundle, zip_data.len());
            return Ok(self.output_location(bundle));
        }

        for (name, data) in &outputs {
            self.output.write_file(name, data).await?;
            tracing::debug!("Wrote {} ({} bytes)", name, data.len());
        }

        Ok(self.output_location(self.config.output_filename()))
    }
}
