use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cli::{
    DEMO_QUERY, DEMO_SENTENCES, build_filter, default_metric, describe_vector,
    init_tracing_with_config, load_corpus, preview, system_prompt,
};
use console::style;
use core_types::config::{AppConfig, load_or_create_config};
use core_types::metadata;
use embedding::provider_from_config;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use similarity::{Metric, resolve_metric};
use vector_store::{
    CharacterTextSplitter, MetadataFilter, SearchHits, TextQuery, VectorStore, format_context,
};

const PREVIEW_CHARS: usize = 96;

/// Exact in-memory vector search over text corpora.
#[derive(Parser, Debug)]
#[command(name = "vectorbase", version, about = "Exact in-memory vector search over text")]
struct Cli {
    /// Config file (default: ./vectorbase.toml, created if missing).
    #[arg(long, global = true, env = "VECTORBASE_CONFIG")]
    config: Option<PathBuf>,
    /// Print machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chunk and embed a corpus, then rank its chunks against a query.
    Search {
        /// Text file, or directory of .txt files.
        corpus: PathBuf,
        query: String,
        /// Number of results (default from config).
        #[arg(short, long)]
        k: Option<usize>,
        /// Similarity metric (default from config).
        #[arg(short, long)]
        metric: Option<String>,
        /// Only rank chunks whose metadata has KEY=VALUE (repeatable).
        #[arg(long = "where", value_name = "KEY=VALUE")]
        filters: Vec<String>,
        /// Print chunk keys without scores.
        #[arg(long)]
        keys_only: bool,
    },
    /// List the registered similarity metrics.
    Metrics,
    /// Build the built-in sample corpus and run a few queries against it.
    Demo,
    /// Print the retrieved context block for a question.
    Context {
        corpus: PathBuf,
        query: String,
        #[arg(short, long, default_value_t = 3)]
        k: usize,
        /// Wrap the context in an answering prompt.
        #[arg(long)]
        prompt: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let loaded = load_or_create_config(cli.config.as_deref())?;
    let cfg = loaded.config;
    init_tracing_with_config(&cfg.logging)?;
    if loaded.created {
        tracing::info!(path = %loaded.path.display(), "wrote default configuration");
    }
    let configured_metric = default_metric(&cfg)?;

    match cli.command {
        Commands::Search {
            corpus,
            query,
            k,
            metric,
            filters,
            keys_only,
        } => {
            let metric = match metric {
                Some(name) => resolve_metric(&name)?,
                None => configured_metric,
            };
            let mut text_query = TextQuery::new(query, k.unwrap_or(cfg.search.default_k))
                .with_metric(metric)
                .with_filter(build_filter(filters.as_slice())?);
            if keys_only {
                text_query = text_query.keys_only();
            }

            let store = build_store(&cfg, &corpus, cli.json).await?;
            let hits = store.search_by_text(&text_query).await?;
            print_hits(&hits, metric, cli.json)?;
        }
        Commands::Metrics => print_metrics(cli.json)?,
        Commands::Demo => run_demo(&cfg, cli.json).await?,
        Commands::Context {
            corpus,
            query,
            k,
            prompt,
        } => {
            let store = build_store(&cfg, &corpus, cli.json).await?;
            let hits = store
                .search_by_text(&TextQuery::new(query.as_str(), k).keys_only())
                .await?;
            let context = format_context(hits.keys());
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "query": query,
                        "chunks": hits,
                        "context": context,
                    }))?
                );
            } else if prompt {
                println!("{}", system_prompt(&context));
            } else {
                println!("{context}");
            }
        }
    }
    Ok(())
}

fn spinner(message: String, hidden: bool) -> ProgressBar {
    let pb = if hidden {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn build_store(cfg: &AppConfig, path: &Path, quiet: bool) -> Result<VectorStore> {
    let splitter = CharacterTextSplitter::from_config(&cfg.chunking)?;
    let corpus = load_corpus(path, &splitter)?;
    let embedder = provider_from_config(&cfg.embedding)?;

    let pb = spinner(
        format!(
            "embedding {} chunks from {} file(s) with {}",
            corpus.len(),
            corpus.files,
            embedder.name()
        ),
        quiet,
    );
    let mut store = VectorStore::new().with_embedder(embedder);
    let built = store
        .build_from_texts(&corpus.chunks, Some(corpus.metadata))
        .await
        .with_context(|| format!("failed to build store from {}", path.display()));
    pb.finish_and_clear();
    built?;
    Ok(store)
}

fn print_hits(hits: &SearchHits, metric: Metric, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("{}", style("no results").yellow());
        return Ok(());
    }
    match hits {
        SearchHits::Scored(results) => {
            println!("{}", style(format!("top {} by {metric}", results.len())).cyan());
            for (rank, hit) in results.iter().enumerate() {
                println!(
                    "{:>3}. {}  {}",
                    rank + 1,
                    style(format!("{:>8.4}", hit.score)).green(),
                    preview(&hit.key, PREVIEW_CHARS)
                );
            }
        }
        SearchHits::Keys(keys) => {
            for key in keys {
                println!("{}", preview(key, PREVIEW_CHARS));
            }
        }
    }
    Ok(())
}

fn print_metrics(json: bool) -> Result<()> {
    if json {
        let rows: Vec<_> = Metric::ALL
            .iter()
            .map(|m| json!({ "name": m.name(), "bounded": m.is_bounded() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for metric in Metric::ALL {
        let range = if metric.is_bounded() {
            style("bounded").dim()
        } else {
            style("unbounded").yellow()
        };
        println!("{:<12} {range}", metric.name());
    }
    Ok(())
}

async fn run_demo(cfg: &AppConfig, json: bool) -> Result<()> {
    let embedder = provider_from_config(&cfg.embedding)?;
    let mut store = VectorStore::new().with_embedder(embedder);
    let texts: Vec<String> = DEMO_SENTENCES.iter().map(ToString::to_string).collect();
    let tags = (0..texts.len())
        .map(|i| metadata([("index", i)]))
        .collect();
    store.build_from_texts(&texts, Some(tags)).await?;

    let scored = store
        .search_by_text(&TextQuery::new(DEMO_QUERY, 2))
        .await?;
    let keys = store
        .search_by_text(&TextQuery::new(DEMO_QUERY, 2).keys_only())
        .await?;
    let euclidean = store
        .search_by_metric_name(&TextQuery::new(DEMO_QUERY, 2), "euclidean")
        .await?;
    let first = store.retrieve(DEMO_SENTENCES[0]);
    let tagged = store.filter_by_metadata(&MetadataFilter::new().with("index", 0_usize));

    if json {
        let out = json!({
            "query": DEMO_QUERY,
            "cosine": scored,
            "keys_only": keys,
            "euclidean": euclidean,
            "retrieved_dimension": first.map(<[f32]>::len),
            "index_0": tagged,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{} {}", style("query:").bold(), DEMO_QUERY);
    print_hits(&scored, Metric::Cosine, false)?;
    println!("{}", style("keys only").cyan());
    print_hits(&keys, Metric::Cosine, false)?;
    print_hits(&euclidean, Metric::Euclidean, false)?;
    println!("{} {}", style("retrieve:").bold(), describe_vector(first));
    println!("{} {:?}", style("index=0:").bold(), tagged);
    Ok(())
}
