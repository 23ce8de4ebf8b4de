use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use charter_rag::api::{self, AppState};
use charter_rag::config::Config;
use charter_rag::context::RagContext;
use charter_rag::embedder::Embedder;
use charter_rag::embedder::download::{all_files_present, download_model_files};
use charter_rag::embedder::mock::MockEmbedder;
use charter_rag::embedder::onnx::OnnxEmbedder;
use charter_rag::generator::chat::ChatCompletionsGenerator;
use charter_rag::indexer::{build_index, load_sections, write_section_dump};
use charter_rag::retriever::retrieve;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "charter-rag",
    version,
    about = "Question answering over the EU Charter of Fundamental Rights"
)]
struct Cli {
    /// Path to the JSON config file.
    #[arg(long, short, default_value = "config.json")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index the document and serve the HTTP API (default).
    Serve {
        /// Override the bind address (host:port).
        #[arg(long)]
        bind: Option<String>,
    },
    /// Extract and clean sections, print a summary and optionally dump them.
    Sections {
        /// Write the cleaned sections to this file.
        #[arg(long)]
        dump: Option<PathBuf>,
    },
    /// Index the document and print the snippets retrieved for a question.
    Query {
        question: String,

        /// Number of snippets to retrieve.
        #[arg(long, short)]
        k: Option<usize>,
    },
    /// Download the embedding model files.
    DownloadModel,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            config.validate()?;
            serve(config).await
        }
        Command::Sections { dump } => {
            config.validate()?;
            let sections = load_sections(Path::new(&config.pdf_path), config.skip_pages);
            for section in &sections {
                let preview: String = section.cleaned_text.chars().take(80).collect();
                println!("{:>3}  {preview}", section.index);
            }
            if let Some(path) = dump.or_else(|| config.section_dump_path.as_ref().map(PathBuf::from)) {
                write_section_dump(&path, &sections)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            Ok(())
        }
        Command::Query { question, k } => {
            config.validate()?;
            let k = k.unwrap_or(config.search_top_k);
            anyhow::ensure!(k > 0, "-k must be at least 1");
            let ctx = index(&config).await?;
            for (rank, snippet) in retrieve(&ctx, &question, k).await?.iter().enumerate() {
                println!("[{}] {snippet}\n", rank + 1);
            }
            Ok(())
        }
        Command::DownloadModel => {
            let dir = config.model_dir();
            tokio::task::spawn_blocking(move || download_model_files(&dir)).await??;
            Ok(())
        }
    }
}

/// Build the index, then start accepting connections.
async fn serve(config: Config) -> Result<()> {
    let rag = index(&config).await?;
    let generator = ChatCompletionsGenerator::from_config(&config.generation)
        .context("failed to create answer generator")?;

    let state = AppState {
        rag,
        generator: Arc::new(generator),
        top_k: config.search_top_k,
    };
    api::serve(state, &config.bind).await
}

/// Create the context and index the document once.
///
/// Document and embedding failures are logged; the index is then left empty.
async fn index(config: &Config) -> Result<RagContext> {
    let embedder = load_embedder(config).await;
    let ctx = RagContext::new(embedder, config.embed_timeout()).context("failed to open vector index")?;

    let sections = load_sections(Path::new(&config.pdf_path), config.skip_pages);
    if let Some(path) = &config.section_dump_path {
        if let Err(e) = write_section_dump(Path::new(path), &sections) {
            warn!("Failed to write section dump {path}: {e}");
        }
    }

    match build_index(&ctx, &sections).await {
        Ok(n) => info!("Embeddings successfully stored ({n} sections)"),
        Err(e) => error!("Error during indexing: {e}"),
    }
    Ok(ctx)
}

/// Load the ONNX embedder, downloading model files first if needed.
///
/// Falls back to the hashing mock embedder when the model is unavailable.
async fn load_embedder(config: &Config) -> Arc<dyn Embedder> {
    let dir = config.model_dir();
    let dimensions = config.model.dimensions;
    let max_tokens = config.model.max_tokens;
    info!("Loading embedding model {} from {}", config.model.name, dir.display());

    let loaded = tokio::task::spawn_blocking(move || -> Result<OnnxEmbedder> {
        if !all_files_present(&dir) {
            download_model_files(&dir)?;
        }
        Ok(OnnxEmbedder::new(&dir, dimensions, max_tokens)?)
    })
    .await;

    match loaded {
        Ok(Ok(embedder)) => Arc::new(embedder),
        Ok(Err(e)) => {
            warn!("Embedding model unavailable ({e:#}); falling back to mock embedder");
            Arc::new(MockEmbedder::new(dimensions))
        }
        Err(e) => {
            warn!("Embedding model loader panicked ({e}); falling back to mock embedder");
            Arc::new(MockEmbedder::new(dimensions))
        }
    }
}
