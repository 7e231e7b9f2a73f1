//! Row store interface and helpers.
//!
//! The columnar store itself is an external collaborator; this crate defines
//! the [`RowStore`] trait both paths consume, an in-process
//! [`MemoryRowStore`] used by tests and local runs, and the batching
//! [`RowWriter`] that the encode path appends through.

mod memory;
mod row_store;
mod writer;

pub use memory::MemoryRowStore;
pub use row_store::{RowStore, StoreMetrics};
pub use writer::{RowWriter, WriterConfig};
