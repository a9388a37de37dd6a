use crate::adapters::google::{GeocoderSettings, API_KEY_ENV, DEFAULT_ENDPOINT};
use crate::core::address::FieldMapping;
use crate::utils::error::{GeocodeError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Requests closer together than this would exceed the provider's 10 per second.
pub const MIN_DELAY_MS: u64 = 100;
const MAX_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    pub input: FieldMapping,
    pub geocoder: GeocoderConfig,
    pub rate_limit: RateLimitConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub region: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            region: None,
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub delay_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { delay_ms: 200 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub suffix: String,
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: "_geocoded.csv".to_string(),
            overwrite: true,
        }
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

impl GeocodeConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| GeocodeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value. Unset variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit.delay_ms)
    }

    /// API key from the file, else from `GOOGLE_API_KEY`. An unresolved
    /// `${...}` placeholder counts as unset.
    pub fn api_key(&self) -> Option<String> {
        self.geocoder
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty() && !env_var_pattern().is_match(key))
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn geocoder_settings(&self) -> GeocoderSettings {
        GeocoderSettings {
            endpoint: self.geocoder.endpoint.clone(),
            api_key: self.api_key(),
            region: self.geocoder.region.clone(),
            timeout: Duration::from_secs(self.geocoder.timeout_seconds),
        }
    }

    /// `data/in.csv` becomes `data/in<suffix>`.
    pub fn output_path_for(&self, source: &str) -> Result<String> {
        validation::validate_path("source", source)?;
        validation::validate_file_extension("source", source, &["csv"])?;

        let path = Path::new(source);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| GeocodeError::InvalidConfigValueError {
                field: "source".to_string(),
                value: source.to_string(),
                reason: "File name is not valid UTF-8".to_string(),
            })?;
        let file_name = format!("{}{}", stem, self.output.suffix);

        Ok(path.with_file_name(file_name).to_string_lossy().into_owned())
    }
}

impl Validate for GeocodeConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("geocoder.endpoint", &self.geocoder.endpoint)?;
        validation::validate_range("geocoder.timeout_seconds", self.geocoder.timeout_seconds, 1, 300)?;
        validation::validate_range("rate_limit.delay_ms", self.rate_limit.delay_ms, MIN_DELAY_MS, MAX_DELAY_MS)?;

        validation::validate_non_empty_string("input.street_key", &self.input.street_key)?;
        validation::validate_non_empty_string("input.city_key", &self.input.city_key)?;
        validation::validate_non_empty_string("input.state_key", &self.input.state_key)?;
        for (field, key) in [
            ("input.street_number_key", &self.input.street_number_key),
            ("input.postal_key", &self.input.postal_key),
            ("input.country_key", &self.input.country_key),
        ] {
            if let Some(key) = key {
                validation::validate_non_empty_string(field, key)?;
            }
        }

        validation::validate_non_empty_string("output.suffix", &self.output.suffix)?;
        if !self.output.suffix.ends_with(".csv") {
            return Err(GeocodeError::InvalidConfigValueError {
                field: "output.suffix".to_string(),
                value: self.output.suffix.clone(),
                reason: "Suffix must end with .csv".to_string(),
            });
        }

        Ok(())
    }
}
