pub mod fetch;
pub mod normalize;
pub mod types;

pub use fetch::{default_endpoints, Endpoint, ItemFetcher};
pub use normalize::{normalize_items, parse_timestamp};
pub use types::{IntegrationItem, ItemType};
