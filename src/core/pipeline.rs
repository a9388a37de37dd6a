use crate::core::address::FieldMapping;
use crate::core::geocode::geocode_rows;
use crate::domain::model::{GeocodeReport, InputRow, InputTable, OUTPUT_COLUMNS};
use crate::domain::ports::{Geocoder, Pipeline, RateLimiter, Storage};
use crate::utils::error::{GeocodeError, Result};
use crate::utils::logger;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;

/// Where to read, where to write and how to read addresses.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub source: String,
    pub destination: String,
    pub mapping: FieldMapping,
    pub overwrite: bool,
    pub show_progress: bool,
}

/// Reads a CSV of addresses, geocodes every row and writes the augmented CSV.
pub struct GeocodePipeline<S: Storage, G: Geocoder, R: RateLimiter> {
    storage: S,
    geocoder: G,
    limiter: R,
    settings: PipelineSettings,
}

impl<S: Storage, G: Geocoder, R: RateLimiter> GeocodePipeline<S, G, R> {
    pub fn new(storage: S, geocoder: G, limiter: R, settings: PipelineSettings) -> Self {
        Self {
            storage,
            geocoder,
            limiter,
            settings,
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.settings.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
        )
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar
    }
}

/// Parses CSV bytes with a header row. Short rows simply lack their trailing columns.
///
/// Cells that are not valid UTF-8 are decoded lossily instead of failing the run.
pub fn parse_input(data: &[u8]) -> Result<InputTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader.byte_headers()?.iter().map(decode_lossy).collect();

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        let row: InputRow = headers
            .iter()
            .zip(record.iter().map(decode_lossy))
            .map(|(h, v)| (h.as_str(), v))
            .collect();
        rows.push(row);
    }

    Ok(InputTable { headers, rows })
}

fn decode_lossy(field: &[u8]) -> String {
    String::from_utf8_lossy(field).into_owned()
}

/// Serialises the report with the output columns appended to the input header.
pub fn render_output(report: &GeocodeReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let header: Vec<&str> = report
        .headers
        .iter()
        .map(String::as_str)
        .chain(OUTPUT_COLUMNS)
        .collect();
    writer.write_record(&header)?;

    for row in &report.rows {
        writer.write_record(row.to_record(&report.headers))?;
    }

    writer
        .into_inner()
        .map_err(|e| GeocodeError::IoError(e.into_error()))
}

/// Rows are keyed by header name, so every header must be unique and distinct
/// from the columns we append.
fn check_headers(headers: &[String]) -> Result<()> {
    if let Some(column) = headers.iter().find(|h| OUTPUT_COLUMNS.contains(&h.as_str())) {
        return Err(GeocodeError::ColumnCollision {
            column: column.clone(),
        });
    }

    let mut seen = HashSet::new();
    for column in headers {
        if !seen.insert(column.as_str()) {
            return Err(GeocodeError::DuplicateColumn {
                column: column.clone(),
            });
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl<S: Storage, G: Geocoder, R: RateLimiter> Pipeline for GeocodePipeline<S, G, R> {
    async fn extract(&self) -> Result<InputTable> {
        // Must fail before the first request is sent.
        if self.storage.exists(&self.settings.destination).await? {
            if !self.settings.overwrite {
                return Err(GeocodeError::OutputExists {
                    path: self.settings.destination.clone(),
                });
            }
            tracing::warn!(
                "Output file {} already exists and will be overwritten",
                self.settings.destination
            );
        }

        tracing::info!("Importing from {}", self.settings.source);
        let data = self.storage.read_file(&self.settings.source).await?;
        let table = parse_input(&data)?;
        check_headers(&table.headers)?;

        for column in self.settings.mapping.columns() {
            if !table.headers.iter().any(|h| h == column) {
                tracing::warn!("Configured column '{}' is not in the input header", column);
            }
        }

        tracing::debug!(
            "Read {} rows with columns {:?}",
            table.rows.len(),
            table.headers
        );
        Ok(table)
    }

    async fn transform(&self, input: InputTable) -> Result<GeocodeReport> {
        let bar = self.progress_bar(input.rows.len());
        if self.settings.show_progress {
            logger::set_progress_bar(Some(bar.clone()));
        }

        let result = geocode_rows(
            input.rows,
            &self.settings.mapping,
            &self.geocoder,
            &self.limiter,
            |_| bar.inc(1),
        )
        .await;
        bar.finish_and_clear();
        if self.settings.show_progress {
            logger::set_progress_bar(None);
        }

        let (rows, summary) = result?;
        Ok(GeocodeReport {
            headers: input.headers,
            rows,
            summary,
        })
    }

    async fn load(&self, report: &GeocodeReport) -> Result<String> {
        let data = render_output(report)?;

        tracing::debug!(
            "Writing {} rows ({} bytes) to {}",
            report.rows.len(),
            data.len(),
            self.settings.destination
        );
        self.storage
            .write_file(&self.settings.destination, &data)
            .await?;

        Ok(self.settings.destination.clone())
    }
}
