//! Similarity kernels: pure functions mapping two equal-length vectors to a
//! single score where higher always means "more similar".
//!
//! The kernel set is closed. Callers pick one through [`Metric`], either
//! directly or by name via [`resolve_metric`]; there is no open-ended string
//! dispatch beyond the static name table below.

mod kernels;


pub use kernels::{cosine, dot_product, euclidean, jaccard, manhattan};

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised by the kernels and the metric registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error("shape mismatch: left vector has {left} dims, right vector has {right} dims")]
    ShapeMismatch { left: usize, right: usize },
    #[error("unknown metric '{name}'; available metrics: {}", METRIC_NAMES.join(", "))]
    UnknownMetric { name: String },
}

/// Registered kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
    Manhattan,
    DotProduct,
    Jaccard,
}

/// Name table used for lookup and for error messages. Order is the
/// registration order reported to users.
const REGISTRY: [(&str, Metric); 5] = [
    ("cosine", Metric::Cosine),
    ("euclidean", Metric::Euclidean),
    ("manhattan", Metric::Manhattan),
    ("dot_product", Metric::DotProduct),
    ("jaccard", Metric::Jaccard),
];

pub const METRIC_NAMES: [&str; 5] = [
    REGISTRY[0].0,
    REGISTRY[1].0,
    REGISTRY[2].0,
    REGISTRY[3].0,
    REGISTRY[4].0,
];

impl Metric {
    pub const ALL: [Self; 5] = [
        Self::Cosine,
        Self::Euclidean,
        Self::Manhattan,
        Self::DotProduct,
        Self::Jaccard,
    ];

    /// Registry name of the kernel.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::Manhattan => "manhattan",
            Self::DotProduct => "dot_product",
            Self::Jaccard => "jaccard",
        }
    }

    /// Score `a` against `b` with this kernel.
    pub fn score(self, a: &[f32], b: &[f32]) -> Result<f32, KernelError> {
        match self {
            Self::Cosine => cosine(a, b),
            Self::Euclidean => euclidean(a, b),
            Self::Manhattan => manhattan(a, b),
            Self::DotProduct => dot_product(a, b),
            Self::Jaccard => jaccard(a, b),
        }
    }

    /// Whether scores are confined to a fixed interval. Only `dot_product`
    /// grows with vector magnitude.
    pub const fn is_bounded(self) -> bool {
        !matches!(self, Self::DotProduct)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve_metric(s)
    }
}

/// Registered metric names, in registration order.
pub const fn metric_names() -> &'static [&'static str] {
    &METRIC_NAMES
}

/// Look a kernel up by its registry name.
pub fn resolve_metric(name: &str) -> Result<Metric, KernelError> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == name)
        .map(|(_, metric)| *metric)
        .ok_or_else(|| KernelError::UnknownMetric {
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_round_trips_every_metric() {
        for metric in Metric::ALL {
            assert_eq!(resolve_metric(metric.name()).unwrap(), metric);
            assert_eq!(metric.to_string().parse::<Metric>().unwrap(), metric);
        }
        assert_eq!(METRIC_NAMES.len(), Metric::ALL.len());
    }

    #[test]
    fn unknown_metric_lists_valid_names() {
        let err = resolve_metric("bm25").unwrap_err();
        assert_eq!(
            err,
            KernelError::UnknownMetric {
                name: "bm25".into()
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("bm25"));
        for name in METRIC_NAMES {
            assert!(msg.contains(name), "message should list {name}: {msg}");
        }
    }

    #[test]
    fn lookup_is_exact() {
        assert!(resolve_metric("Cosine").is_err());
        assert!(resolve_metric(" cosine").is_err());
        assert!(resolve_metric("dot-product").is_err());
    }

    #[test]
    fn default_is_cosine() {
        assert_eq!(Metric::default(), Metric::Cosine);
    }

    #[test]
    fn score_dispatches_to_kernel() {
        let a = [1.0, 2.0, 0.0];
        let b = [2.0, 0.0, 1.0];
        assert_eq!(Metric::DotProduct.score(&a, &b).unwrap(), 2.0);
        assert_eq!(Metric::Jaccard.score(&a, &b).unwrap(), 1.0 / 3.0);
        assert!(matches!(
            Metric::Manhattan.score(&a, &b[..2]),
            Err(KernelError::ShapeMismatch { left: 3, right: 2 })
        ));
    }
}
