use crate::core::{GeocodeSummary, Pipeline};
use crate::utils::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct EtlOutcome {
    pub output_path: String,
    pub summary: GeocodeSummary,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<EtlOutcome> {
        tracing::info!("Starting geocoding run");

        // Extract
        tracing::info!("Extracting rows...");
        let input = self.pipeline.extract().await?;
        tracing::info!("Extracted {} rows", input.rows.len());

        // Transform
        tracing::info!("Geocoding rows...");
        let report = self.pipeline.transform(input).await?;
        tracing::info!("{}", report.summary);

        // Load
        tracing::info!("Writing results...");
        let output_path = self.pipeline.load(&report).await?;
        tracing::info!("Wrote results to {}", output_path);

        Ok(EtlOutcome {
            output_path,
            summary: report.summary,
        })
    }
}
