//! Collections: the index-management handle, the in-memory store and
//! the typed, alias-aware view.

mod filter;
mod handle;
mod memory;
mod typed;

pub use filter::Filter;
pub use handle::IndexManager;
pub use memory::{MemoryCollection, MemoryDatabase};
pub use typed::Collection;
