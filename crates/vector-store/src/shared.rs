use crate::error::{Result, StoreError};
use crate::query::{SearchHits, TextQuery};
use crate::store::{VectorStore, check_metadata_len, embed_query, embed_texts};
use core_types::{Metadata, MetadataFilter, SearchResult, Vector};
use embedding::{EmbeddingError, EmbeddingProvider};
use parking_lot::RwLock;
use similarity::Metric;
use std::sync::Arc;

/// A [`VectorStore`] behind one coarse reader/writer lock, cloneable across
/// tasks.
///
/// Embedding runs with no lock held; the lock is taken only to scan or to
/// commit, so a slow provider never blocks readers.
#[derive(Debug, Clone, Default)]
pub struct SharedVectorStore {
    inner: Arc<RwLock<VectorStore>>,
}

impl SharedVectorStore {
    pub fn new(store: VectorStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    fn embedder(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        self.inner
            .read()
            .embedder()
            .cloned()
            .ok_or_else(|| StoreError::from(EmbeddingError::NotConfigured))
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn insert(
        &self,
        key: impl Into<String>,
        vector: Vector,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        self.inner.write().insert(key, vector, metadata)
    }

    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        metric: Metric,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        self.inner.read().search(query, k, metric, filter)
    }

    pub async fn search_by_text(&self, query: &TextQuery) -> Result<SearchHits> {
        let embedder = self.embedder()?;
        let vector = embed_query(embedder.as_ref(), &query.text).await?;
        self.inner.read().search_hits(&vector, query)
    }

    pub async fn search_by_metric_name(
        &self,
        query: &TextQuery,
        metric_name: &str,
    ) -> Result<SearchHits> {
        let metric = similarity::resolve_metric(metric_name)?;
        self.search_by_text(&query.clone().with_metric(metric)).await
    }

    /// Owned copy, since the entry lives behind the lock.
    pub fn retrieve(&self, key: &str) -> Option<Vector> {
        self.inner.read().retrieve(key).map(<[f32]>::to_vec)
    }

    pub fn get_metadata(&self, key: &str) -> Option<Metadata> {
        self.inner.read().get_metadata(key).cloned()
    }

    pub fn update_metadata(&self, key: &str, metadata: Metadata) -> Result<()> {
        self.inner.write().update_metadata(key, metadata)
    }

    pub fn filter_by_metadata(&self, filter: &MetadataFilter) -> Vec<String> {
        self.inner.read().filter_by_metadata(filter)
    }

    /// Same contract as [`VectorStore::build_from_texts`]. Readers keep
    /// seeing the previous contents until the whole batch commits.
    pub async fn build_from_texts(
        &self,
        texts: &[String],
        metadata: Option<Vec<Metadata>>,
    ) -> Result<usize> {
        check_metadata_len(texts.len(), metadata.as_ref())?;
        let embedder = self.embedder()?;
        let vectors = embed_texts(embedder.as_ref(), texts).await?;
        self.inner.write().commit_batch(texts, vectors, metadata)
    }
}

impl From<VectorStore> for SharedVectorStore {
    fn from(store: VectorStore) -> Self {
        Self::new(store)
    }
}
