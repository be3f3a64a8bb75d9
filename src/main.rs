// Command-line entry point for LegacyGraph.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use legacy_graph::api::server;
use legacy_graph::application::{AnalyzeUsecase, GraphSession};
use legacy_graph::config::EngineConfig;
use legacy_graph::infrastructure::concurrency::init_thread_pool;
use legacy_graph::infrastructure::{
    DotExporter, JsonExporter, SourceLoader, TextExporter, TreeSitterCppExtractor,
};
use legacy_graph::ports::GraphExporter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Dot,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input source file path (can specify multiple)
    #[arg(short, long)]
    input: Vec<String>,

    /// Input source folder(s), scanned recursively for C/C++ files
    #[arg(short = 'd', long)]
    folder: Vec<String>,

    /// Output file path (writes to stdout if not specified)
    #[arg(short, long)]
    output: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Stop cycle enumeration past this many cycles (0 = unbounded)
    #[arg(long, default_value_t = legacy_graph::config::DEFAULT_MAX_CYCLES)]
    max_cycles: usize,

    /// Run the JSON API server on this port instead of a one-shot analysis
    #[arg(long)]
    serve: Option<u16>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so reports on stdout stay clean for piping.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("legacy_graph=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = EngineConfig::default().with_max_cycles(cli.max_cycles);

    if let Some(port) = cli.serve {
        let session = GraphSession::cpp(config).context("Failed to initialize C++ parser")?;
        return server::start_server(port, Arc::new(session));
    }

    let mut sources = SourceLoader::load_files(&cli.input);
    for folder in &cli.folder {
        sources.extend(SourceLoader::load_folder(folder)?);
    }
    if sources.is_empty() {
        anyhow::bail!("Please provide at least one --input <file> or --folder <dir>");
    }
    info!(files = sources.len(), "sources collected");

    if sources.len() > 1 {
        if let Err(e) = init_thread_pool() {
            warn!(error = %e, "using default thread pool");
        }
    }

    let exporter: Box<dyn GraphExporter> = match cli.format {
        Format::Text => Box::new(TextExporter { config }),
        Format::Dot => Box::new(DotExporter { config }),
        Format::Json => Box::new(JsonExporter { config }),
    };
    let usecase = AnalyzeUsecase {
        extractor_factory: TreeSitterCppExtractor::new,
        exporter: exporter.as_ref(),
    };

    match &cli.output {
        Some(path) => {
            usecase.run(&sources, path)?;
            info!(output = %path, format = ?cli.format, "analysis written");
        }
        None => print!("{}", usecase.render(&sources)?),
    }

    Ok(())
}
