use crate::core::flatten::flatten_match;
use crate::core::record::parse_match;
use crate::domain::model::{Corpus, FileSummary, ParseErrorPolicy, RawDeliveryRow, SkippedFile};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use tokio::task::JoinSet;

/// Flattens every match file of one directory into a single table.
///
/// Files are processed in sorted name order so the concatenated table does not depend on
/// how the file system lists the directory. Up to `concurrency` files are flattened at
/// once on blocking worker tasks; their rows are still appended in file order.
pub struct Aggregator<'a, S: Storage> {
    storage: &'a S,
    dir: String,
    extension: String,
    policy: ParseErrorPolicy,
    concurrency: usize,
}

impl<'a, S: Storage> Aggregator<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self {
            storage,
            dir: String::new(),
            extension: "json".to_string(),
            policy: ParseErrorPolicy::Abort,
            concurrency: 1,
        }
    }

    pub fn with_dir(mut self, dir: &str) -> Self {
        self.dir = dir.to_string();
        self
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self
    }

    pub fn with_policy(mut self, policy: ParseErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    fn is_match_file(&self, name: &str) -> bool {
        name.to_ascii_lowercase()
            .strip_suffix(&self.extension)
            .is_some_and(|stem| stem.ends_with('.'))
    }

    fn path_of(&self, name: &str) -> String {
        if self.dir.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.dir.trim_end_matches('/'), name)
        }
    }

    /// Match file names in processing order.
    pub async fn match_files(&self) -> Result<Vec<String>> {
        let mut files: Vec<String> = self
            .storage
            .list_files(&self.dir)
            .await?
            .into_iter()
            .filter(|name| self.is_match_file(name))
            .collect();
        files.sort();
        Ok(files)
    }

    async fn flatten_all(&self, files: &[String]) -> Result<Vec<Result<Vec<RawDeliveryRow>>>> {
        let mut outcomes: Vec<Option<Result<Vec<RawDeliveryRow>>>> =
            files.iter().map(|_| None).collect();

        for (batch_no, batch) in files.chunks(self.concurrency).enumerate() {
            let mut tasks = JoinSet::new();

            for (offset, name) in batch.iter().enumerate() {
                let index = batch_no * self.concurrency + offset;
                let bytes = self.storage.read_file(&self.path_of(name)).await?;
                let source = name.clone();
                tasks.spawn_blocking(move || {
                    let outcome = parse_match(&source, &bytes).map(|record| flatten_match(&record));
                    (index, outcome)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                let (index, outcome) = joined?;
                outcomes[index] = Some(outcome);
            }
        }

        outcomes
            .into_iter()
            .zip(files)
            .map(|(outcome, name)| {
                outcome.ok_or_else(|| EtlError::ProcessingError {
                    message: format!("No flatten result for {}", name),
                })
            })
            .collect()
    }

    pub async fn collect(&self) -> Result<Corpus> {
        let files = self.match_files().await?;
        tracing::info!("Found {} match files", files.len());

        let outcomes = self.flatten_all(&files).await?;

        let mut corpus = Corpus::default();
        for (name, outcome) in files.into_iter().zip(outcomes) {
            match outcome {
                Ok(rows) => {
                    corpus.files.push(FileSummary {
                        file: name,
                        rows: rows.len(),
                    });
                    corpus.rows.extend(rows);
                }
                Err(e @ EtlError::ParseError { .. }) if self.policy == ParseErrorPolicy::Skip => {
                    tracing::warn!("Skipping {}: {}", name, e);
                    corpus.skipped.push(SkippedFile {
                        file: name,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "Raw records: {} deliveries from {} files ({} skipped)",
            corpus.rows.len(),
            corpus.files.len(),
            corpus.skipped.len()
        );
        Ok(corpus)
    }
}
