use core_types::{MetadataFilter, SearchResult};
use serde::Serialize;
use similarity::Metric;

/// A text search request.
#[derive(Debug, Clone, PartialEq)]
pub struct TextQuery {
    pub text: String,
    pub k: usize,
    pub metric: Metric,
    pub filter: Option<MetadataFilter>,
    pub keys_only: bool,
}

impl TextQuery {
    /// Cosine, unfiltered, scored results.
    pub fn new(text: impl Into<String>, k: usize) -> Self {
        Self {
            text: text.into(),
            k,
            metric: Metric::default(),
            filter: None,
            keys_only: false,
        }
    }

    #[must_use]
    pub const fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// An empty filter is dropped: it would match everything anyway.
    #[must_use]
    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = (!filter.is_empty()).then_some(filter);
        self
    }

    /// Return ordered keys instead of `(key, score)` pairs.
    #[must_use]
    pub const fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }
}

/// Ranked output of a text search, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchHits {
    Scored(Vec<SearchResult>),
    Keys(Vec<String>),
}

impl SearchHits {
    pub(crate) fn from_results(results: Vec<SearchResult>, keys_only: bool) -> Self {
        if keys_only {
            Self::Keys(results.into_iter().map(|r| r.key).collect())
        } else {
            Self::Scored(results)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Scored(v) => v.len(),
            Self::Keys(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<&str> {
        match self {
            Self::Scored(v) => v.iter().map(|r| r.key.as_str()).collect(),
            Self::Keys(v) => v.iter().map(String::as_str).collect(),
        }
    }

    pub fn into_keys(self) -> Vec<String> {
        match self {
            Self::Scored(v) => v.into_iter().map(|r| r.key).collect(),
            Self::Keys(v) => v,
        }
    }

    /// Scores, if they were kept.
    pub fn scored(&self) -> Option<&[SearchResult]> {
        match self {
            Self::Scored(v) => Some(v),
            Self::Keys(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results() -> Vec<SearchResult> {
        vec![SearchResult::new("a", 0.9), SearchResult::new("b", 0.5)]
    }

    #[test]
    fn defaults_are_cosine_scored_unfiltered() {
        let q = TextQuery::new("hello", 3);
        assert_eq!(q.metric, Metric::Cosine);
        assert!(q.filter.is_none());
        assert!(!q.keys_only);
    }

    #[test]
    fn empty_filter_is_dropped() {
        let q = TextQuery::new("x", 1).with_filter(MetadataFilter::new());
        assert!(q.filter.is_none());
        let q = TextQuery::new("x", 1).with_filter(MetadataFilter::new().with("lang", "en"));
        assert_eq!(q.filter.map(|f| f.len()), Some(1));
    }

    #[test]
    fn keys_only_drops_scores_but_keeps_order() {
        let hits = SearchHits::from_results(results(), true);
        assert_eq!(hits, SearchHits::Keys(vec!["a".into(), "b".into()]));
        assert!(hits.scored().is_none());

        let hits = SearchHits::from_results(results(), false);
        assert_eq!(hits.keys(), vec!["a", "b"]);
        assert_eq!(hits.scored().map(<[SearchResult]>::len), Some(2));
        assert_eq!(hits.into_keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn hits_serialize_untagged() {
        let keys = SearchHits::Keys(vec!["a".into()]);
        assert_eq!(serde_json::to_string(&keys).unwrap(), r#"["a"]"#);
    }
}
