use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor_enabled: bool,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor_enabled,
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        let mut monitor = RunMonitor::new(self.monitor_enabled);
        tracing::info!("Starting ETL process...");

        tracing::info!("Extracting deliveries...");
        let corpus = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} deliveries from {} files",
            corpus.rows.len(),
            corpus.files.len()
        );
        monitor.finish_stage("extract", corpus.rows.len());

        tracing::info!("Cleaning deliveries...");
        let result = self.pipeline.transform(corpus).await?;
        tracing::info!(
            "Cleaned data: {} rows, {} columns ({} rows dropped)",
            result.rows.len(),
            result.columns.len(),
            result.report.input_rows - result.report.output_rows
        );
        monitor.finish_stage("transform", result.rows.len());

        tracing::info!("Loading data...");
        let rows = result.rows.len();
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Output saved to: {}", output_path);
        monitor.finish_stage("load", rows);

        monitor.log_final_stats();
        Ok(output_path)
    }
}
