pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::cli::LocalStorage;
pub use config::toml_config::LayoutConfig;
pub use crate::core::{
    annotator::annotate, etl::EtlEngine, matcher::matches, matcher::ReferenceIndex,
    pipeline::StreetCheckPipeline,
};
pub use domain::model::{AnnotatedRecord, InputRecord, ReferenceRecord, RunSummary, StreetFlag};
pub use utils::error::{EtlError, Result};
