//! Chunking documents before they are embedded, and stitching ranked chunks
//! back into a prompt context.

use crate::error::{Result, StoreError};
use core_types::config::ChunkingConfig;

/// Fixed-width character windows with overlap.
///
/// Windows start every `chunk_size - chunk_overlap` characters, so the tail
/// of a text may appear in several trailing windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for CharacterTextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl CharacterTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(StoreError::InvalidArgument(
                "chunk_size must be positive".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(StoreError::InvalidArgument(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(cfg: &ChunkingConfig) -> Result<Self> {
        Self::new(cfg.chunk_size, cfg.chunk_overlap)
    }

    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub const fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split on `char` boundaries. An empty text yields no chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;
        (0..chars.len())
            .step_by(step)
            .map(|start| {
                let end = (start + self.chunk_size).min(chars.len());
                chars[start..end].iter().collect()
            })
            .collect()
    }

    pub fn split_texts<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        texts.iter().flat_map(|t| self.split(t.as_ref())).collect()
    }
}

/// Join ranked chunks with a blank line between them.
pub fn format_context<'a>(chunks: impl IntoIterator<Item = &'a str>) -> String {
    chunks.into_iter().collect::<Vec<_>>().join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_overlap_by_configured_amount() {
        let splitter = CharacterTextSplitter::new(4, 2).unwrap();
        assert_eq!(
            splitter.split("abcdefghij"),
            vec!["abcd", "cdef", "efgh", "ghij", "ij"]
        );
    }

    #[test]
    fn no_overlap_partitions_text() {
        let splitter = CharacterTextSplitter::new(3, 0).unwrap();
        assert_eq!(splitter.split("abcdefg"), vec!["abc", "def", "g"]);
        assert!(splitter.split("").is_empty());
    }

    #[test]
    fn splits_on_char_boundaries() {
        let splitter = CharacterTextSplitter::new(2, 0).unwrap();
        assert_eq!(splitter.split("héllo"), vec!["hé", "ll", "o"]);
    }

    #[test]
    fn rejects_degenerate_settings() {
        assert!(CharacterTextSplitter::new(0, 0).is_err());
        assert!(CharacterTextSplitter::new(10, 10).is_err());
        assert!(CharacterTextSplitter::new(10, 11).is_err());
    }

    #[test]
    fn default_matches_config_default() {
        let from_cfg = CharacterTextSplitter::from_config(&ChunkingConfig::default()).unwrap();
        assert_eq!(from_cfg, CharacterTextSplitter::default());
        assert_eq!(from_cfg.chunk_size(), 1000);
        assert_eq!(from_cfg.chunk_overlap(), 200);
    }

    #[test]
    fn split_texts_flattens_in_order() {
        let splitter = CharacterTextSplitter::new(2, 0).unwrap();
        assert_eq!(splitter.split_texts(&["abc", "de"]), vec!["ab", "c", "de"]);
    }

    #[test]
    fn context_joins_with_blank_line() {
        assert_eq!(format_context(["one", "two"]), "one\n\ntwo");
        assert_eq!(format_context(Vec::<&str>::new()), "");
    }
}
