//! Shared helpers for the `vectorbase` binary: corpus loading, `--where`
//! parsing, and output formatting.

pub mod logging;

pub use logging::init_tracing_with_config;

use anyhow::{Context, Result, bail};
use core_types::config::AppConfig;
use core_types::{Metadata, MetadataFilter, MetadataValue, metadata};
use similarity::{Metric, resolve_metric};
use std::fs;
use std::path::{Path, PathBuf};
use vector_store::CharacterTextSplitter;

/// Sample corpus used by `vectorbase demo`.
pub const DEMO_SENTENCES: [&str; 5] = [
    "I like to eat broccoli and bananas.",
    "I ate a banana and spinach smoothie for breakfast.",
    "Chinchillas and kittens are cute.",
    "My sister adopted a kitten yesterday.",
    "Look at this cute hamster munching on a piece of broccoli.",
];

pub const DEMO_QUERY: &str = "I think fruit is awesome!";

/// Chunked corpus ready for a batch build. `metadata[i]` describes
/// `chunks[i]`.
#[derive(Debug, Default)]
pub struct Corpus {
    pub chunks: Vec<String>,
    pub metadata: Vec<Metadata>,
    pub files: usize,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Read a text file, or every `.txt` file directly under a directory, and
/// split it into chunks tagged with `source` and `chunk` metadata.
pub fn load_corpus(path: &Path, splitter: &CharacterTextSplitter) -> Result<Corpus> {
    let files = corpus_files(path)?;
    let mut corpus = Corpus::default();
    for file in &files {
        let text = fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let source = file.display().to_string();
        for (i, chunk) in splitter.split(&text).into_iter().enumerate() {
            corpus.metadata.push(metadata([
                ("source", MetadataValue::from(source.as_str())),
                ("chunk", MetadataValue::from(i)),
            ]));
            corpus.chunks.push(chunk);
        }
    }
    corpus.files = files.len();
    tracing::debug!(
        path = %path.display(),
        files = corpus.files,
        chunks = corpus.len(),
        "loaded corpus"
    );
    Ok(corpus)
}

fn corpus_files(path: &Path) -> Result<Vec<PathBuf>> {
    let meta =
        fs::metadata(path).with_context(|| format!("cannot access {}", path.display()))?;
    if !meta.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in
        fs::read_dir(path).with_context(|| format!("failed to list {}", path.display()))?
    {
        let p = entry?.path();
        if p.is_file() && p.extension().is_some_and(|ext| ext == "txt") {
            files.push(p);
        }
    }
    if files.is_empty() {
        bail!("no .txt files found in {}", path.display());
    }
    files.sort();
    Ok(files)
}

/// Parse one `--where key=value` clause. The value is typed the way a
/// human would read it: `true`/`false`, then numbers, else a string.
pub fn parse_where(raw: &str) -> Result<(String, MetadataValue)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected KEY=VALUE, got '{raw}'");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in '{raw}'");
    }
    Ok((key.to_string(), MetadataValue::infer(value.trim())))
}

pub fn build_filter<S: AsRef<str>>(clauses: &[S]) -> Result<MetadataFilter> {
    clauses
        .iter()
        .map(|c| parse_where(c.as_ref()))
        .collect::<Result<Vec<_>>>()
        .map(|pairs| pairs.into_iter().collect())
}

/// One-line preview of a chunk: whitespace collapsed, cut to `max` chars.
pub fn preview(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let mut cut: String = flat.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Resolve `search.default_metric` against the metric registry.
pub fn default_metric(cfg: &AppConfig) -> Result<Metric> {
    resolve_metric(cfg.search.default_metric.trim()).context("search.default_metric")
}

/// Short description of a looked-up vector; a miss says so.
pub fn describe_vector(vector: Option<&[f32]>) -> String {
    match vector {
        Some(v) => {
            let head: Vec<String> = v.iter().take(4).map(|x| format!("{x:.3}")).collect();
            let more = if v.len() > 4 { ", …" } else { "" };
            format!("{}-dim [{}{more}]", v.len(), head.join(", "))
        }
        None => "not found".to_string(),
    }
}

/// System message for answering a question from retrieved context.
pub fn system_prompt(context: &str) -> String {
    format!(
        "You are a helpful assistant that answers questions using only the \
         context below. If the answer is not in the context, say that you \
         don't know.\n\nContext:\n{context}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn where_clauses_infer_types() {
        assert_eq!(
            parse_where("lang=en").unwrap(),
            ("lang".to_string(), MetadataValue::from("en"))
        );
        assert_eq!(
            parse_where(" page = 3 ").unwrap(),
            ("page".to_string(), MetadataValue::from(3_i32))
        );
        assert_eq!(parse_where("draft=true").unwrap().1, MetadataValue::from(true));
        assert_eq!(parse_where("note=a=b").unwrap().1, MetadataValue::from("a=b"));
    }

    #[test]
    fn malformed_where_clauses_fail() {
        assert!(parse_where("novalue").is_err());
        assert!(parse_where("=x").is_err());
    }

    #[test]
    fn filter_collects_every_clause() {
        let filter = build_filter(&["source=a.txt", "chunk=0"]).unwrap();
        assert_eq!(filter.len(), 2);
        assert!(build_filter(&["ok=1", "broken"]).is_err());
        assert!(build_filter::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn preview_flattens_and_truncates() {
        assert_eq!(preview("a\n  b\tc", 10), "a b c");
        assert_eq!(preview("abcdefghij", 5), "abcd…");
        assert_eq!(preview("héllo", 5), "héllo");
    }

    #[test]
    fn corpus_from_single_file_tags_chunks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "abcdefgh").unwrap();
        let splitter = CharacterTextSplitter::new(4, 0).unwrap();

        let corpus = load_corpus(file.path(), &splitter).unwrap();
        assert_eq!(corpus.chunks, vec!["abcd", "efgh"]);
        assert_eq!(corpus.files, 1);
        assert_eq!(
            corpus.metadata[1].get("chunk"),
            Some(&MetadataValue::from(1_usize))
        );
        assert_eq!(
            corpus.metadata[0].get("source"),
            Some(&MetadataValue::from(file.path().display().to_string()))
        );
    }

    #[test]
    fn corpus_directory_reads_txt_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "second").unwrap();
        fs::write(dir.path().join("a.txt"), "first").unwrap();
        fs::write(dir.path().join("skip.md"), "ignored").unwrap();

        let corpus = load_corpus(dir.path(), &CharacterTextSplitter::default()).unwrap();
        assert_eq!(corpus.chunks, vec!["first", "second"]);
        assert_eq!(corpus.files, 2);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_corpus(dir.path(), &CharacterTextSplitter::default()).is_err());
    }

    #[test]
    fn configured_metric_must_be_registered() {
        let mut cfg = AppConfig::default();
        assert_eq!(default_metric(&cfg).unwrap(), Metric::Cosine);
        cfg.search.default_metric = "dot_product".into();
        assert_eq!(default_metric(&cfg).unwrap(), Metric::DotProduct);
        cfg.search.default_metric = "bm25".into();
        let err = default_metric(&cfg).unwrap_err();
        assert!(format!("{err:#}").contains("bm25"));
    }

    #[test]
    fn missing_vector_is_reported_not_defaulted() {
        assert_eq!(describe_vector(None), "not found");
        assert_eq!(describe_vector(Some(&[1.0, 0.5])), "2-dim [1.000, 0.500]");
        assert_eq!(
            describe_vector(Some(&[0.0; 6])),
            "6-dim [0.000, 0.000, 0.000, 0.000, …]"
        );
    }

    #[test]
    fn prompt_embeds_context() {
        let prompt = system_prompt("one\n\ntwo");
        assert!(prompt.ends_with("Context:\none\n\ntwo"));
    }
}
