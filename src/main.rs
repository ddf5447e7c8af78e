use liftgate::{
    config::{Config, ConfigSource},
    core::{
        cosine_similarity, find_match, preprocess, AuthOutcome, Authenticator,
        AuthorizedRegistry, EmbeddingProvider, OnnxEmbedder,
    },
    dev_mode::DevMode,
    server::{self, AppState},
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "liftgate")]
#[command(about = "Face-authenticated lift level control service")]
struct Cli {
    /// Configuration file (defaults to configs/liftgate.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable development mode (keeps a copy of every upload for debugging)
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the authorized faces and start the HTTP service
    Serve,
    /// List the authorized faces and their pairwise similarity
    Registry,
    /// Run the authentication pipeline on an image file
    Probe {
        #[arg(short, long)]
        image: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(cli.config.as_deref());
    let log_level = match &loaded {
        Ok((config, _)) => config.server.log_level.as_str(),
        Err(_) => "info",
    };
    setup_logging(log_level, cli.dev);

    let (config, source) = loaded?;
    match &source {
        ConfigSource::File(path) => tracing::info!("Loaded config from: {}", path.display()),
        ConfigSource::Defaults => tracing::warn!("No config file found, using built-in defaults"),
    }

    let dev_mode = DevMode::new(cli.dev)?;

    match cli.command {
        Commands::Serve => serve(config, dev_mode).await,
        Commands::Registry => show_registry(&config),
        Commands::Probe { image } => probe(&config, &image),
    }
}

async fn serve(config: Config, dev_mode: DevMode) -> Result<()> {
    tracing::info!("Starting liftgate (dev_mode: {})", dev_mode.is_enabled());

    let provider: Arc<dyn EmbeddingProvider> = Arc::new(OnnxEmbedder::new(&config.recognizer)?);

    let registry = {
        let provider = provider.clone();
        let dir = config.faces.authorized_dir.clone();
        tokio::task::spawn_blocking(move || AuthorizedRegistry::build(&dir, provider.as_ref()))
            .await??
    };

    let authenticator = Authenticator::new(&config, Arc::new(registry), provider, dev_mode);
    let state = Arc::new(AppState::new(config, authenticator));
    server::start_server(state).await?;
    Ok(())
}

fn show_registry(config: &Config) -> Result<()> {
    let provider = OnnxEmbedder::new(&config.recognizer)?;
    let registry = AuthorizedRegistry::build(&config.faces.authorized_dir, &provider)?;

    if registry.is_empty() {
        println!("No authorized faces in {}", config.faces.authorized_dir.display());
        return Ok(());
    }

    println!("{} authorized face(s), in match order:", registry.len());
    for (i, face) in registry.iter().enumerate() {
        println!("  {}. {} ({} dims)", i + 1, face.identifier, face.embedding.len());
    }

    let threshold = config.faces.similarity_threshold;
    println!("\nPairwise similarity (* = above threshold {:.2}):", threshold);
    let faces: Vec<_> = registry.iter().collect();
    for a in &faces {
        let row: Vec<String> = faces
            .iter()
            .map(|b| {
                let s = cosine_similarity(&a.embedding, &b.embedding);
                let flag = if a.identifier != b.identifier && s > threshold { "*" } else { " " };
                format!("{:>7.3}{}", s, flag)
            })
            .collect();
        println!("  {:<16} {}", a.identifier, row.join(" "));
    }
    Ok(())
}

fn probe(config: &Config, image_path: &Path) -> Result<()> {
    let provider = OnnxEmbedder::new(&config.recognizer)?;
    let registry = AuthorizedRegistry::build(&config.faces.authorized_dir, &provider)?;

    let image = image::open(image_path)?;
    let prepared = preprocess(&image, &config.preprocess);
    let embedding = provider.embed(&prepared)?;

    for face in registry.iter() {
        println!("Comparing with {}: similarity = {:.4}",
                 face.identifier,
                 cosine_similarity(&embedding, &face.embedding));
    }

    let outcome = find_match(
        &registry,
        &embedding,
        config.faces.similarity_threshold,
        config.faces.match_policy,
    );
    match outcome {
        AuthOutcome::Matched(m) => println!("MATCH: {} ({:.3})", m.identifier, m.similarity),
        AuthOutcome::NoMatch { .. } => println!("NO MATCH"),
    }
    Ok(())
}

fn setup_logging(log_level: &str, dev_mode: bool) {
    if dev_mode {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .init();
    } else {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(log_level));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
