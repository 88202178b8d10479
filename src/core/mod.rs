pub mod annotator;
pub mod etl;
pub mod matcher;
pub mod pipeline;
pub mod tabular;

pub use crate::domain::model::{
    AnnotatedRecord, Dataset, InputRecord, InputTable, ReferenceRecord, RunSummary, StreetFlag,
    TransformResult,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
