use embedding::EmbeddingError;
use similarity::{KernelError, METRIC_NAMES};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("shape mismatch: store holds {expected}-dim vectors, got {got}")]
    ShapeMismatch { expected: usize, got: usize },
    #[error("unknown metric '{name}'; available metrics: {}", METRIC_NAMES.join(", "))]
    UnknownMetric { name: String },
    #[error("key not found: '{0}'")]
    KeyNotFound(String),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Kernels are always called as `(query, stored)`, so the right-hand length
/// is the store's.
impl From<KernelError> for StoreError {
    fn from(err: KernelError) -> Self {
        match err {
            KernelError::ShapeMismatch { left, right } => Self::ShapeMismatch {
                expected: right,
                got: left,
            },
            KernelError::UnknownMetric { name } => Self::UnknownMetric { name },
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
