//! Client-side chart cache and the HTTP transport for the chart API.
//!
//! [`ChartClient`] wraps every mutation so that the local [`QueryCache`]
//! either converges on what the server returned or is put back exactly as it
//! was before the request went out.

pub mod api;
pub mod cache;
pub mod guard;
pub mod keys;
pub mod mutations;

pub use api::{ChartApi, ClientError, HttpChartApi};
pub use cache::{CacheEntry, CachedData, QueryCache};
pub use guard::MutationGuard;
pub use keys::QueryKey;
pub use mutations::ChartClient;
