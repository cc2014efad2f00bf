use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use cograph_analysis::{detect, CommunityAlgorithm, CommunityParams};
use cograph_api::RestApi;
use cograph_core::{BuildConfig, Identity, Labeler, PrettyLabels, Topology, TracingProgress};
use cograph_storage::{fingerprint_file, GraphCache, GraphStore, JsonLinesSource};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Tag co-occurrence graph engine
#[derive(Parser, Debug)]
#[command(name = "cograph")]
#[command(about = "Build and analyze tag co-occurrence graphs", long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a graph from a JSON-lines file
    Build(BuildArgs),
    /// Serve graphs for the files in a data directory over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct GraphArgs {
    /// Graph topology: tag_cooccurrence or shared_tags
    #[arg(long, default_value = "tag_cooccurrence")]
    topology: Topology,

    /// JSON build configuration; overrides --topology
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum link weight
    #[arg(long)]
    min_weight: Option<u32>,

    /// Keep at most this many nodes (0 = uncapped)
    #[arg(long)]
    max_nodes: Option<usize>,

    /// Keep at most this many links (0 = uncapped)
    #[arg(long)]
    max_edges: Option<usize>,
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Input file, one record per line
    #[arg(short, long)]
    input: PathBuf,

    #[command(flatten)]
    graph: GraphArgs,

    /// Annotate points with communities from this algorithm
    #[arg(long)]
    detect: Option<CommunityAlgorithm>,

    /// Seed for community detection
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Clique size for k_clique
    #[arg(long)]
    k: Option<usize>,

    /// Title-case tag labels
    #[arg(long)]
    pretty_labels: bool,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Reuse and populate a graph cache in this directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Rebuild even when the cache holds the graph
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Directory holding the .jsonl data files
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Graph cache directory
    #[arg(long, default_value = "./cache")]
    cache_dir: PathBuf,

    /// HTTP API port
    #[arg(long, default_value_t = 8080)]
    http_port: u16,

    #[command(flatten)]
    graph: GraphArgs,
}

impl GraphArgs {
    fn build_config(&self) -> anyhow::Result<BuildConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))?
            }
            None => BuildConfig::from(self.topology),
        };
        let limits = match &mut config {
            BuildConfig::TagCooccurrence(c) => &mut c.limits,
            BuildConfig::SharedTags(c) => &mut c.limits,
        };
        if let Some(w) = self.min_weight {
            limits.min_weight = w;
        }
        if let Some(n) = self.max_nodes {
            limits.max_nodes = n;
        }
        if let Some(n) = self.max_edges {
            limits.max_edges = n;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Build(args) => run_build(args),
        Command::Serve(args) => run_serve(args).await,
    }
}

fn run_build(args: BuildArgs) -> anyhow::Result<()> {
    let config = args.graph.build_config()?;
    info!("Building {} graph from {:?}", config.topology(), args.input);

    let source = JsonLinesSource::new(&args.input);
    let labeler: &dyn Labeler = if args.pretty_labels { &PrettyLabels } else { &Identity };
    let progress = TracingProgress::default();
    let build = || config.build(&source, labeler, &progress);

    let mut graph = match &args.cache_dir {
        Some(dir) => {
            let cache = GraphCache::new(dir)?;
            let mut fingerprint = fingerprint_file(&args.input, &config)?;
            if args.pretty_labels {
                // Labels are part of the cached graph.
                fingerprint = cograph_storage::fingerprint_bytes(fingerprint.as_bytes(), &config)?;
            }
            let cached = cache.load_or_build(&fingerprint, config.topology(), args.force, build)?;
            info!("Graph {} (fingerprint {})", if cached.from_cache { "loaded from cache" } else { "built" }, fingerprint);
            cached.graph
        }
        None => {
            let output = build()?;
            for warning in &output.report.warnings {
                info!("Build warning: {}", warning);
            }
            output.graph
        }
    };
    info!("Graph has {} points and {} links", graph.points.len(), graph.links.len());

    if let Some(algorithm) = args.detect {
        let params = CommunityParams {
            seed: args.seed,
            k: args.k,
            ..CommunityParams::default()
        };
        let detection = detect(&graph, algorithm, &params)?;
        info!("{} found {} communities", algorithm, detection.community_count);
        graph = graph.with_communities(&detection.assignments);
    }

    match &args.output {
        Some(path) => write_graph(path, &graph)?,
        None => {
            let stdout = std::io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            serde_json::to_writer(&mut out, &graph)?;
            writeln!(out)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn write_graph(path: &Path, graph: &cograph_core::Graph) -> anyhow::Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer(&mut out, graph)?;
    out.flush()?;
    info!("Graph written to {:?}", path);
    Ok(())
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.graph.build_config()?;

    info!("Starting cograph v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);
    info!("Cache directory: {:?}", args.cache_dir);
    info!("Topology: {}", config.topology());

    let store = Arc::new(GraphStore::new(&args.data_dir, &args.cache_dir, config)?);

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(store, http_port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
