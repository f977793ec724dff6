use crate::domain::model::{
    CleaningOptions, Corpus, FielderColumns, ParseErrorPolicy, TransformResult,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    /// Plain files directly under `dir`, by name. Subdirectories are not descended into.
    fn list_files(&self, dir: &str)
        -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn output_filename(&self) -> &str;
    fn file_extension(&self) -> &str;
    fn parse_error_policy(&self) -> ParseErrorPolicy;
    fn concurrency(&self) -> usize;
    fn cleaning_options(&self) -> CleaningOptions;
    fn fielder_columns(&self) -> FielderColumns;
    fn delimiter(&self) -> u8;
    fn sequence_length(&self) -> Option<usize>;
    fn bundle_filename(&self) -> Option<&str>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Corpus>;
    async fn transform(&self, corpus: Corpus) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
