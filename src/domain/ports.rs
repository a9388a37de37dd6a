use crate::domain::model::{GeocodeReport, GeocodeResult, InputTable};
use crate::utils::error::{Result, ServiceError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
}

pub type GeocodeOutcome = std::result::Result<GeocodeResult, ServiceError>;

/// Forward geocoding of one free-text address. Only the best match is returned.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> GeocodeOutcome;
}

#[async_trait]
impl<G: Geocoder + ?Sized> Geocoder for Arc<G> {
    async fn geocode(&self, address: &str) -> GeocodeOutcome {
        (**self).geocode(address).await
    }
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Resolves once the next request may be sent.
    async fn acquire(&self);
}

#[async_trait]
impl<R: RateLimiter + ?Sized> RateLimiter for Arc<R> {
    async fn acquire(&self) {
        (**self).acquire().await
    }
}

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<InputTable>;
    async fn transform(&self, input: InputTable) -> Result<GeocodeReport>;
    async fn load(&self, report: &GeocodeReport) -> Result<String>;
}
