pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{google::GoogleGeocoder, storage::LocalStorage};
pub use config::toml_config::GeocodeConfig;
pub use crate::core::{
    address::FieldMapping,
    etl::{EtlEngine, EtlOutcome},
    pipeline::{GeocodePipeline, PipelineSettings},
    rate_limit::FixedIntervalGate,
};
pub use utils::error::{GeocodeError, Result, ServiceError};
