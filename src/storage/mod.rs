pub mod cache;
pub mod persistence;
pub mod seed;

pub use cache::{CacheStore, Collection, PersistenceHealth};
pub use persistence::{CollectionCounts, DataFile, Dataset, FileState};
pub use seed::SeedSource;
