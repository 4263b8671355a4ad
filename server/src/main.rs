//! vidsearch entry point
//!
//! - `import`: load JSON Lines records into the record store
//! - `build`: embed stored records into an index artifact
//! - `search`: one-shot query against an artifact
//! - `serve`: MCP server over stdio for AI clients

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidsearch_core::{
    write_index, BuilderConfig, IndexBuilder, RecordStore, SearchConfig, SearchService,
    VectorEngine,
};
use vidsearch_server::{ingest, mcp::McpServer, IndexWatcher, RetrievalManager};

#[derive(Parser)]
#[command(name = "vidsearch")]
#[command(about = "Embedding-based video search")]
#[command(version)]
struct Args {
    /// Embedding model cache directory (overridden by VIDSEARCH_MODELS_PATH)
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import JSON Lines video records into the record store
    Import {
        /// Record store directory
        #[arg(long)]
        records: PathBuf,
        /// JSON Lines file with one {"video_id", "title", "transcript"} per line
        #[arg(long)]
        input: PathBuf,
    },
    /// Build an index artifact from the record store
    Build {
        #[arg(long)]
        records: PathBuf,
        /// Artifact path; replaced atomically
        #[arg(long)]
        output: PathBuf,
        /// Texts per embedding call
        #[arg(long, default_value_t = 64)]
        batch_size: usize,
    },
    /// Run a single query and print the results as JSON
    Search {
        #[arg(long)]
        index: PathBuf,
        /// Maximum results (default: VIDSEARCH_LIMIT or 10)
        #[arg(long, short = 'k')]
        limit: Option<usize>,
        /// Distance cutoff (default: VIDSEARCH_MAX_DISTANCE or 15.0)
        #[arg(long)]
        max_distance: Option<f32>,
        /// Include distances and the matching field
        #[arg(long)]
        scores: bool,
        query: String,
    },
    /// Serve the Model Context Protocol over stdio
    Serve {
        #[arg(long)]
        index: PathBuf,
        /// Reload the artifact when it is replaced on disk
        #[arg(long)]
        watch: bool,
        #[arg(long)]
        max_distance: Option<f32>,
    },
}

fn search_config(limit: Option<usize>, max_distance: Option<f32>) -> anyhow::Result<SearchConfig> {
    let mut config = SearchConfig::from_env()?;
    if let Some(limit) = limit {
        config = config.with_limit(limit);
    }
    if let Some(max_distance) = max_distance {
        config = config.with_max_distance(max_distance);
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries MCP traffic and search output, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidsearch_server=info,vidsearch_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let models_dir = args.models_dir;

    match args.command {
        Command::Import { records, input } => {
            let store = RecordStore::open(&records)
                .with_context(|| format!("opening record store {:?}", records))?;
            let report = ingest::import_file(&store, &input)
                .with_context(|| format!("importing {:?}", input))?;
            for skipped in &report.skipped {
                tracing::warn!("line {}: {}", skipped.line, skipped.reason);
            }
            println!(
                "imported {} records, skipped {}",
                report.imported,
                report.skipped.len()
            );
        }

        Command::Build {
            records,
            output,
            batch_size,
        } => {
            let store = RecordStore::open(&records)
                .with_context(|| format!("opening record store {:?}", records))?;
            let records = store.load_records()?;
            tracing::info!("Building index from {} records", records.len());

            let engine = Arc::new(VectorEngine::new(models_dir.as_deref())?);
            let builder = IndexBuilder::with_config(engine, BuilderConfig { batch_size });
            let built = tokio::task::spawn_blocking(move || builder.build(records)).await??;

            for rejected in &built.report.rejected {
                tracing::warn!("record {}: {}", rejected.position, rejected.reason);
            }
            write_index(&built.index, &output)
                .with_context(|| format!("writing index {:?}", output))?;
            println!(
                "indexed {} videos ({} without transcript, {} rejected) into {}",
                built.report.indexed,
                built.report.without_transcript,
                built.report.rejected.len(),
                output.display()
            );
        }

        Command::Search {
            index,
            limit,
            max_distance,
            scores,
            query,
        } => {
            let config = search_config(limit, max_distance)?;
            let k = config.limit;
            let engine = Arc::new(VectorEngine::new(models_dir.as_deref())?);
            let service = SearchService::new(engine, config)?;
            service
                .load_index(&index)
                .with_context(|| format!("loading index {:?}", index))?;

            let output = if scores {
                serde_json::to_string_pretty(&service.search_scored(&query, k)?)?
            } else {
                serde_json::to_string_pretty(&service.search(&query, k)?)?
            };
            println!("{}", output);
        }

        Command::Serve {
            index,
            watch,
            max_distance,
        } => {
            let config = search_config(None, max_distance)?;
            tracing::info!("Starting vidsearch MCP server");
            tracing::info!("Index: {:?}", index);

            let manager = Arc::new(RetrievalManager::new(models_dir, config));
            manager
                .initialize(&index)
                .await
                .with_context(|| format!("loading index {:?}", index))?;

            let _watcher = if watch {
                Some(IndexWatcher::new(Arc::clone(&manager), &index)?)
            } else {
                None
            };

            let server = McpServer::new(manager);
            if let Err(e) = server.run_stdio().await {
                tracing::error!("MCP server error: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
