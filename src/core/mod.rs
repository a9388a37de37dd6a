pub mod address;
pub mod etl;
pub mod geocode;
pub mod pipeline;
pub mod rate_limit;

pub use crate::domain::model::{GeocodeReport, GeocodeSummary, InputRow, InputTable, OutputRow};
pub use crate::domain::ports::{Clock, Geocoder, Pipeline, RateLimiter, Storage};
pub use crate::utils::error::Result;
