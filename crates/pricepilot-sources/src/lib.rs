pub mod client;
pub mod error;
pub mod labels;
pub mod normalize;
pub mod price;
pub mod types;

pub use client::SerpApiClient;
pub use error::{FetchError, ItemParseError, SourceParseError};
pub use normalize::{normalize_all, normalize_source, NormalizedBatch};
pub use price::{extract_price, ExtractedPrice};
pub use types::{PriceField, RawResultSet, RawSourceResult};
