//! Orbis Storage Layer
//!
//! Persistence for merged countries, keyed case-insensitively by name.
//!
//! # Architecture
//!
//! - **Repository traits**: Define the storage interface (ports)
//! - **In-memory store**: Fast implementation for testing and development
//! - **PostgreSQL store**: Production implementation (feature `postgres`)
//!
//! Every single create/update/delete is atomic; nothing spans several records.
//!
//! # Usage
//!
//! ```rust
//! use orbis_store::{MemoryStore, Store};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new();
//!     let total = store.countries().count().await.unwrap();
//!     assert_eq!(total, 0);
//! }
//! ```

#![warn(clippy::all)]

// Modules
mod error;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod repository;

// Re-exports
pub use error::StoreError;
pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;
pub use repository::{CountryRepository, Store};
