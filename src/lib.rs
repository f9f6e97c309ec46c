//! # listing-store
//!
//! Persistence and live merging for real-estate listings. A fixed built-in
//! catalog is combined with administrator-edited records stored either in a
//! local JSON file or in a hosted table, and subscribers are told whenever
//! the merged listing may have changed.

pub mod backends;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod store;

pub use backends::{connect, BackendKind, LocalBackend, PropertyBackend, RemoteBackend};
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use models::{Availability, Property, PropertyMedia, Source};
pub use query::{ListingStats, PropertyQuery, VisibilityFilter};
pub use store::{merge_properties, PropertyStore, Subscription};
