pub mod aggregate;
pub mod clean;
pub mod etl;
pub mod export;
pub mod flatten;
pub mod options;
pub mod pipeline;
pub mod record;
pub mod sequence;

pub use crate::domain::model::{Corpus, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
