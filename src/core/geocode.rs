use crate::core::address::FieldMapping;
use crate::domain::model::{GeocodeSummary, InputRow, OutputRow};
use crate::domain::ports::{Geocoder, RateLimiter};
use crate::utils::error::{GeocodeError, Result};

/// Address for the 1-based `row_number`, or the fatal error naming that row.
pub fn extract_address(mapping: &FieldMapping, row_number: usize, row: &InputRow) -> Result<String> {
    mapping
        .extract(row)
        .map_err(|missing| GeocodeError::MissingField {
            row: row_number,
            column: missing.0,
            record: format!("{:?}", row.fields),
        })
}

/// Geocodes rows one after another, waiting on `limiter` before each request.
///
/// A row without a required address column aborts the whole run before its
/// request is sent. Service failures only mark the affected row as not geocodable.
/// `on_row` is called after each processed row.
pub async fn geocode_rows<G, R, F>(
    rows: Vec<InputRow>,
    mapping: &FieldMapping,
    geocoder: &G,
    limiter: &R,
    mut on_row: F,
) -> Result<(Vec<OutputRow>, GeocodeSummary)>
where
    G: Geocoder + ?Sized,
    R: RateLimiter + ?Sized,
    F: FnMut(&OutputRow),
{
    let mut output = Vec::with_capacity(rows.len());
    let mut summary = GeocodeSummary::default();

    for (index, row) in rows.into_iter().enumerate() {
        let address = extract_address(mapping, index + 1, &row)?;

        limiter.acquire().await;
        let processed = geocode_row(row, &address, geocoder).await;

        summary.record(processed.geocodable);
        on_row(&processed);
        output.push(processed);
    }

    Ok((output, summary))
}

async fn geocode_row<G: Geocoder + ?Sized>(row: InputRow, address: &str, geocoder: &G) -> OutputRow {
    tracing::debug!("Geocoding '{}'", address);

    match geocoder.geocode(address).await {
        Ok(result) if result.valid => OutputRow::geocoded(row, result),
        Ok(result) => {
            tracing::debug!(
                "Best match for '{}' is not a street address: {:?}",
                address,
                result.formatted_address
            );
            OutputRow::not_geocodable(row)
        }
        Err(e) => {
            tracing::warn!("Geocoder {} for '{}'", e, address);
            OutputRow::not_geocodable(row)
        }
    }
}
