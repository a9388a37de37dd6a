use std::collections::BTreeMap;
use std::fmt;

/// Output columns appended to every input row, in output order.
pub const OUTPUT_COLUMNS: [&str; 13] = [
    "geocodable",
    "g_latitude",
    "g_longitude",
    "g_street_num",
    "g_street",
    "g_city",
    "g_county",
    "g_neighborhood",
    "g_state",
    "g_province",
    "g_postal_code",
    "g_country",
    "g_formatted_address",
];

/// One CSV record keyed by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRow {
    pub fields: BTreeMap<String, String>,
}

impl InputRow {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for InputRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputTable {
    pub headers: Vec<String>,
    pub rows: Vec<InputRow>,
}

/// Best match returned by the geocoding service for one address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodeResult {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub street_number: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub neighborhood: Option<String>,
    pub state: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub formatted_address: Option<String>,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub input: InputRow,
    pub geocodable: bool,
    /// Only set when `geocodable` is true.
    pub geocode: Option<GeocodeResult>,
}

impl OutputRow {
    pub fn geocoded(input: InputRow, result: GeocodeResult) -> Self {
        Self {
            input,
            geocodable: true,
            geocode: Some(result),
        }
    }

    pub fn not_geocodable(input: InputRow) -> Self {
        Self {
            input,
            geocodable: false,
            geocode: None,
        }
    }

    /// The `g_*` attribute columns. Same keys whether or not the row was geocoded.
    pub fn geocode_fields(&self) -> [(&'static str, Option<String>); 12] {
        let g = self.geocode.as_ref();
        [
            ("g_latitude", g.and_then(|r| r.latitude).map(|v| v.to_string())),
            ("g_longitude", g.and_then(|r| r.longitude).map(|v| v.to_string())),
            ("g_street_num", g.and_then(|r| r.street_number.clone())),
            ("g_street", g.and_then(|r| r.street.clone())),
            ("g_city", g.and_then(|r| r.city.clone())),
            ("g_county", g.and_then(|r| r.county.clone())),
            ("g_neighborhood", g.and_then(|r| r.neighborhood.clone())),
            ("g_state", g.and_then(|r| r.state.clone())),
            ("g_province", g.and_then(|r| r.province.clone())),
            ("g_postal_code", g.and_then(|r| r.postal_code.clone())),
            ("g_country", g.and_then(|r| r.country.clone())),
            ("g_formatted_address", g.and_then(|r| r.formatted_address.clone())),
        ]
    }

    /// Cell values in `headers` order followed by the output columns.
    pub fn to_record(&self, headers: &[String]) -> Vec<String> {
        let mut record: Vec<String> = headers
            .iter()
            .map(|h| self.input.get(h).unwrap_or_default().to_string())
            .collect();
        record.push(self.geocodable.to_string());
        record.extend(
            self.geocode_fields()
                .into_iter()
                .map(|(_, value)| value.unwrap_or_default()),
        );
        record
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeocodeSummary {
    pub total: usize,
    pub geocodable: usize,
}

impl GeocodeSummary {
    pub fn record(&mut self, geocodable: bool) {
        self.total += 1;
        if geocodable {
            self.geocodable += 1;
        }
    }

    /// Percentage of geocodable rows; 0 for an empty run.
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.geocodable as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for GeocodeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Imported {} records. {} ({:.2}%) were geocodable.",
            self.total,
            self.geocodable,
            self.rate()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeReport {
    pub headers: Vec<String>,
    pub rows: Vec<OutputRow>,
    pub summary: GeocodeSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> GeocodeResult {
        GeocodeResult {
            latitude: Some(42.3601),
            longitude: Some(-71.0942),
            street_number: Some("77".into()),
            street: Some("Massachusetts Avenue".into()),
            city: Some("Cambridge".into()),
            county: Some("Middlesex County".into()),
            neighborhood: Some("MIT".into()),
            state: Some("Massachusetts".into()),
            province: Some("Massachusetts".into()),
            postal_code: Some("02139".into()),
            country: Some("United States".into()),
            formatted_address: Some("77 Massachusetts Ave, Cambridge, MA 02139, USA".into()),
            valid: true,
        }
    }

    #[test]
    fn test_output_row_key_set_is_uniform() {
        let input: InputRow = [("street", "77 Massachusetts Avenue")].into_iter().collect();
        let ok = OutputRow::geocoded(input.clone(), sample_result());
        let failed = OutputRow::not_geocodable(input);

        let ok_keys: Vec<_> = ok.geocode_fields().iter().map(|(k, _)| *k).collect();
        let failed_keys: Vec<_> = failed.geocode_fields().iter().map(|(k, _)| *k).collect();
        assert_eq!(ok_keys, failed_keys);
        assert_eq!(ok_keys, OUTPUT_COLUMNS[1..].to_vec());

        assert!(ok.geocode_fields().iter().all(|(_, v)| v.is_some()));
        assert!(failed.geocode_fields().iter().all(|(_, v)| v.is_none()));
    }

    #[test]
    fn test_to_record_follows_header_order() {
        let input: InputRow = [("city", "Cambridge"), ("street", "77 Mass Ave")]
            .into_iter()
            .collect();
        let headers = vec!["street".to_string(), "city".to_string(), "note".to_string()];

        let record = OutputRow::geocoded(input.clone(), sample_result()).to_record(&headers);
        assert_eq!(record.len(), headers.len() + OUTPUT_COLUMNS.len());
        assert_eq!(&record[..5], &["77 Mass Ave", "Cambridge", "", "true", "42.3601"]);
        assert_eq!(record[5], "-71.0942");

        let record = OutputRow::not_geocodable(input).to_record(&headers);
        assert_eq!(record[3], "false");
        assert!(record[4..].iter().all(String::is_empty));
    }

    #[test]
    fn test_summary_rate_and_display() {
        let mut summary = GeocodeSummary::default();
        for i in 0..10 {
            summary.record(i < 7);
        }
        assert_eq!(summary.total, 10);
        assert_eq!(summary.geocodable, 7);
        assert!((summary.rate() - 70.0).abs() < 1e-9);
        assert_eq!(
            summary.to_string(),
            "Imported 10 records. 7 (70.00%) were geocodable."
        );
    }

    #[test]
    fn test_summary_of_empty_run() {
        let summary = GeocodeSummary::default();
        assert_eq!(summary.rate(), 0.0);
        assert_eq!(
            summary.to_string(),
            "Imported 0 records. 0 (0.00%) were geocodable."
        );
    }
}
