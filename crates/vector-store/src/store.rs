use crate::error::{Result, StoreError};
use crate::query::{SearchHits, TextQuery};
use core_types::{Metadata, MetadataFilter, SearchResult, Vector};
use embedding::{EmbeddingError, EmbeddingProvider};
use indexmap::IndexMap;
use similarity::{Metric, resolve_metric};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct Entry {
    vector: Vector,
    metadata: Metadata,
}

/// In-memory store of keyed vectors with exact full-scan search.
///
/// Entries keep insertion order; overwriting a key keeps its original
/// position. All vectors share the dimension fixed by the first insert.
#[derive(Default)]
pub struct VectorStore {
    entries: IndexMap<String, Entry>,
    dimension: Option<usize>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
}

impl fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorStore")
            .field("len", &self.entries.len())
            .field("dimension", &self.dimension)
            .field("embedder", &self.embedder.as_ref().map(|e| e.name()))
            .finish()
    }
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the provider used by text search and batch builds.
    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn embedder(&self) -> Option<&Arc<dyn EmbeddingProvider>> {
        self.embedder.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector width, fixed by the first insert.
    pub const fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Store `vector` under `key`.
    ///
    /// An existing key has its vector replaced and `metadata` merged into
    /// what it already carries.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        vector: Vector,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        self.check_vector(&vector)?;
        self.commit(key.into(), vector, metadata);
        Ok(())
    }

    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        check_width(self.dimension, vector.len())
    }

    fn commit(&mut self, key: String, vector: Vector, metadata: Option<Metadata>) {
        self.dimension.get_or_insert(vector.len());
        let entry = self.entries.entry(key).or_insert_with(|| Entry {
            vector: Vec::new(),
            metadata: Metadata::new(),
        });
        entry.vector = vector;
        if let Some(metadata) = metadata {
            entry.metadata.extend(metadata);
        }
    }

    /// Top `k` entries by `metric` against `query`, best first.
    ///
    /// Ties keep insertion order. When `filter` is given, only entries it
    /// matches are scored.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        metric: Metric,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(expected) = self.dimension
            && expected != query.len()
        {
            return Err(StoreError::ShapeMismatch {
                expected,
                got: query.len(),
            });
        }

        let mut scored = Vec::new();
        for (idx, entry) in self.entries.values().enumerate() {
            if filter.is_some_and(|f| !f.matches(&entry.metadata)) {
                continue;
            }
            scored.push((idx, metric.score(query, &entry.vector)?));
        }
        let matched = scored.len();
        scored.sort_by(|a, b| descending(a.1, b.1));
        scored.truncate(k);

        let results: Vec<SearchResult> = scored
            .into_iter()
            .filter_map(|(idx, score)| {
                self.entries
                    .get_index(idx)
                    .map(|(key, _)| SearchResult::new(key.clone(), score))
            })
            .collect();
        debug!(
            metric = metric.name(),
            scanned = self.entries.len(),
            matched,
            returned = results.len(),
            "vector search"
        );
        Ok(results)
    }

    /// Embed `query.text` with the bound provider, then [`search`](Self::search).
    pub async fn search_by_text(&self, query: &TextQuery) -> Result<SearchHits> {
        let embedder = self.embedder.as_ref().ok_or(EmbeddingError::NotConfigured)?;
        let vector = embed_query(embedder.as_ref(), &query.text).await?;
        self.search_hits(&vector, query)
    }

    /// Like [`search_by_text`](Self::search_by_text), with the metric given
    /// by its registry name.
    pub async fn search_by_metric_name(
        &self,
        query: &TextQuery,
        metric_name: &str,
    ) -> Result<SearchHits> {
        let metric = resolve_metric(metric_name)?;
        let query = query.clone().with_metric(metric);
        self.search_by_text(&query).await
    }

    pub(crate) fn search_hits(&self, vector: &[f32], query: &TextQuery) -> Result<SearchHits> {
        let results = self.search(vector, query.k, query.metric, query.filter.as_ref())?;
        Ok(SearchHits::from_results(results, query.keys_only))
    }

    /// Stored vector for `key`. `None` means the key was never inserted.
    pub fn retrieve(&self, key: &str) -> Option<&[f32]> {
        self.entries.get(key).map(|e| e.vector.as_slice())
    }

    pub fn get_metadata(&self, key: &str) -> Option<&Metadata> {
        self.entries.get(key).map(|e| &e.metadata)
    }

    /// Merge `metadata` into an existing entry.
    pub fn update_metadata(&mut self, key: &str, metadata: Metadata) -> Result<()> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))?;
        entry.metadata.extend(metadata);
        Ok(())
    }

    /// Keys whose metadata satisfies `filter`, in insertion order.
    pub fn filter_by_metadata(&self, filter: &MetadataFilter) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, e)| filter.matches(&e.metadata))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Embed `texts` in one batch and insert each under its own text.
    ///
    /// `metadata[i]` goes with `texts[i]`; texts past the end of the list get
    /// none. Nothing is inserted unless every embedding arrived and fits the
    /// store. Returns the number of texts written.
    pub async fn build_from_texts(
        &mut self,
        texts: &[String],
        metadata: Option<Vec<Metadata>>,
    ) -> Result<usize> {
        check_metadata_len(texts.len(), metadata.as_ref())?;
        let embedder = self.embedder.clone().ok_or(EmbeddingError::NotConfigured)?;
        let vectors = embed_texts(embedder.as_ref(), texts).await?;
        self.commit_batch(texts, vectors, metadata)
    }

    pub(crate) fn commit_batch(
        &mut self,
        texts: &[String],
        vectors: Vec<Vector>,
        metadata: Option<Vec<Metadata>>,
    ) -> Result<usize> {
        check_metadata_len(texts.len(), metadata.as_ref())?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                got: vectors.len(),
            }
            .into());
        }
        let mut dimension = self.dimension;
        for v in &vectors {
            check_width(dimension, v.len())?;
            dimension.get_or_insert(v.len());
        }

        let mut metadata = metadata.unwrap_or_default().into_iter();
        for (text, vector) in texts.iter().zip(vectors) {
            self.commit(text.clone(), vector, metadata.next());
        }
        info!(
            written = texts.len(),
            total = self.entries.len(),
            dimension = ?self.dimension,
            "built store from texts"
        );
        Ok(texts.len())
    }
}

fn check_width(dimension: Option<usize>, got: usize) -> Result<()> {
    if got == 0 {
        return Err(StoreError::InvalidArgument(
            "vector must not be empty".to_string(),
        ));
    }
    match dimension {
        Some(expected) if expected != got => Err(StoreError::ShapeMismatch { expected, got }),
        _ => Ok(()),
    }
}

pub(crate) fn check_metadata_len(texts: usize, metadata: Option<&Vec<Metadata>>) -> Result<()> {
    match metadata {
        Some(list) if list.len() > texts => Err(StoreError::InvalidArgument(format!(
            "{} metadata entries for {texts} texts",
            list.len()
        ))),
        _ => Ok(()),
    }
}

pub(crate) async fn embed_query(embedder: &dyn EmbeddingProvider, text: &str) -> Result<Vector> {
    embedder.embed(text).await.map_err(|err| {
        warn!(provider = embedder.name(), error = %err, "query embedding failed");
        StoreError::from(err)
    })
}

pub(crate) async fn embed_texts(
    embedder: &dyn EmbeddingProvider,
    texts: &[String],
) -> Result<Vec<Vector>> {
    let vectors = embedder.embed_batch(texts).await.map_err(|err| {
        warn!(provider = embedder.name(), texts = texts.len(), error = %err, "batch embedding failed");
        StoreError::from(err)
    })?;
    if vectors.len() != texts.len() {
        warn!(
            provider = embedder.name(),
            expected = texts.len(),
            got = vectors.len(),
            "provider returned wrong number of embeddings"
        );
        return Err(EmbeddingError::CountMismatch {
            expected: texts.len(),
            got: vectors.len(),
        }
        .into());
    }
    Ok(vectors)
}

/// Score descending; NaN sorts last. `0.0` and `-0.0` tie.
fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}
