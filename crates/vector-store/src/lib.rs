//! Exact in-memory vector store.
//!
//! Every search is a full scan over the stored entries with one of the
//! [`similarity`] kernels; there is no approximate index. Texts are turned
//! into vectors through an [`embedding::EmbeddingProvider`] bound to the
//! store.

mod error;
mod query;
mod shared;
mod store;
mod text;

#[cfg(test)]
mod proptest_tests;

pub use error::{Result, StoreError};
pub use query::{SearchHits, TextQuery};
pub use shared::SharedVectorStore;
pub use store::VectorStore;
pub use text::{CharacterTextSplitter, format_context};

pub use core_types::{Metadata, MetadataFilter, MetadataValue, SearchResult, Vector, metadata};
pub use similarity::Metric;
