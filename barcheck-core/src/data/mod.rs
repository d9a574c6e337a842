//! Data loading: providers, file ingestion, universe resolution, and the series store.

pub mod bin_dir;
pub mod ingest;
pub mod provider;
pub mod schema;
pub mod store;
pub mod universe;

pub use bin_dir::BinDirProvider;
pub use ingest::LoadError;
pub use provider::{MarketDataProvider, ProviderError, ProviderFrame};
pub use store::{SeriesStore, SeriesStoreBuilder, StoreSource};
pub use universe::{MarketFallback, ResolvedUniverse};
