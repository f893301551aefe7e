/// Image URL resolution for property listings
///
/// Given a property identifier and a set of storage keys, this crate
/// resolves each key to a time-limited access URL via the platform
/// backend, tracks loading/error state, and re-resolves whenever the
/// inputs change. Stale in-flight results are discarded so the exposed
/// URL map always matches the latest observed inputs.

pub mod config;
pub mod fetch;
pub mod service;
pub mod state;

pub use config::{ConfigError, ImageServiceConfig};
pub use fetch::PropertyImages;
pub use service::http::HttpImageService;
pub use service::memory::StaticImageService;
pub use service::{PropertyImageService, ServiceError};
pub use state::data::{ResolutionState, UrlMap};
pub use state::resolver::{ImageUrlResolver, ResolveRequest, ResolveToken};
