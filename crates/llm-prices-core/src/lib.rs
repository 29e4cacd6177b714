pub mod align;
#[cfg(feature = "network")]
pub mod api;
#[cfg(feature = "network")]
pub mod batch;
pub mod error;
pub mod mock;
pub mod model;
pub mod price;
pub mod provider;
pub mod source;

pub use align::{align, AlignedRow, DateRange, PriceField};
pub use error::PriceError;
pub use mock::MockSource;
pub use model::ModelInfo;
pub use price::{PriceHistory, PricePoint, PriceQuote};
pub use provider::Provider;
pub use source::{PriceSource, ALL_PROVIDERS};
