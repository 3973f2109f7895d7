//! Data layer: the BarStore trait and its implementations.
//!
//! The engine only ever sees `&dyn BarStore`. Concrete stores:
//! - [`YahooStore`] — live daily/intraday fetches from Yahoo's chart API
//! - [`CsvStore`] — offline fixtures, one CSV per symbol
//! - [`SyntheticStore`] — seeded random walks for benches and smoke runs
//! - [`MemoryStore`] — pre-loaded maps, used heavily in tests
//! - [`CachingStore`] — Parquet persistence decorator over any of the above

pub mod cache;
pub mod csv_store;
pub mod memory;
pub mod store;
pub mod synthetic;
pub mod yahoo;

pub use cache::{CacheMeta, CachingStore};
pub use csv_store::CsvStore;
pub use memory::MemoryStore;
pub use store::{BarInterval, BarStore, DataError};
pub use synthetic::SyntheticStore;
pub use yahoo::YahooStore;
