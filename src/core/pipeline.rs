use crate::core::annotator::annotate;
use crate::core::matcher::ReferenceIndex;
use crate::core::tabular::{read_input_table, read_reference, write_annotated, CsvOptions};
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{Dataset, RunSummary, StreetFlag, TransformResult};
use crate::utils::error::Result;
use chrono::Utc;

/// Reads the input and address base files, flags each input row and writes the annotated CSV.
pub struct StreetCheckPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> StreetCheckPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for StreetCheckPipeline<S, C> {
    async fn extract(&self) -> Result<Dataset> {
        let layout = self.config.layout();
        let options = CsvOptions::from_layout(layout)?;

        let input_path = self.config.input_path();
        let reference_path = self.config.reference_path();
        tracing::debug!("Loading input from: {}", input_path);
        tracing::debug!("Loading address base from: {}", reference_path);

        let (input_bytes, reference_bytes) = tokio::try_join!(
            self.storage.read_file(input_path),
            self.storage.read_file(reference_path)
        )?;

        let input = read_input_table(&input_bytes, input_path, &layout.input, &options)?;
        let reference = read_reference(&reference_bytes, reference_path, &layout.reference, &options)?;

        Ok(Dataset { input, reference })
    }

    async fn transform(&self, data: Dataset) -> Result<TransformResult> {
        let index = ReferenceIndex::build(&data.reference);
        tracing::debug!(
            "Indexed {} reference records across {} postcodes",
            index.record_count(),
            index.postcode_count()
        );

        let annotated = annotate(&data.input.records, &index);

        let matched = annotated
            .iter()
            .filter(|a| a.street_in_postcode == StreetFlag::Yes)
            .count();
        let missing_postcode = data
            .input
            .records
            .iter()
            .filter(|r| r.postcode.is_none())
            .count();
        if missing_postcode > 0 {
            tracing::warn!("{} input records have no postcode and were flagged No", missing_postcode);
        }

        let summary = RunSummary {
            input_records: annotated.len(),
            reference_records: index.record_count(),
            postcodes_indexed: index.postcode_count(),
            matched,
            unmatched: annotated.len() - matched,
            missing_postcode,
            generated_at: Utc::now(),
        };

        Ok(TransformResult {
            headers: data.input.headers,
            annotated,
            summary,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let layout = self.config.layout();
        let delimiter = layout.parsing.delimiter_byte()?;
        let output_path = self.config.output_path();

        let csv_data = write_annotated(&result.headers, &result.annotated, &layout.output, delimiter)?;
        tracing::debug!("Writing annotated CSV ({} bytes)", csv_data.len());
        self.storage.write_file(output_path, &csv_data).await?;

        if let Some(summary_path) = self.config.summary_path() {
            let json_data = serde_json::to_string_pretty(&result.summary)?;
            self.storage.write_file(summary_path, json_data.as_bytes()).await?;
            tracing::debug!("Run summary saved to: {}", summary_path);
        }

        tracing::info!(
            "Flagged {} records: {} Yes, {} No",
            result.summary.input_records,
            result.summary.matched,
            result.summary.unmatched
        );

        Ok(output_path.to_string())
    }
}
