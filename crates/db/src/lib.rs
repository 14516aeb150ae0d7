//! Document store facade for the Local Library.
//!
//! Handlers talk to a [`DocumentStore`] through typed [`Collection`] handles.
//! The store itself only knows about JSON documents grouped by collection name.

pub mod document;
pub mod memory;
pub mod query;
pub mod store;

pub use document::{Document, RecordId};
pub use memory::MemoryStore;
pub use query::{Filter, Sort, SortOrder};
pub use store::{Collection, DocumentStore, StoreError};
