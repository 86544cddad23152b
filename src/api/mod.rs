mod backend;
mod cache;
mod client;
mod endpoints;
mod envelope;
mod error;

pub use backend::{PlantBackend, PlantCatalog};
pub use cache::{QueryCache, QueryKey};
pub use client::{ApiClient, IDEMPOTENCY_HEADER};
pub use envelope::{EnvelopeStatus, ResponseEnvelope};
pub use error::ApiError;
