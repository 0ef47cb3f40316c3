use anyhow::Context;
use clap::{Parser, Subcommand};
use edu_choropleth::config::AppConfig;
use edu_choropleth::fetch::Fetcher;
use edu_choropleth::render::Renderer;
use edu_choropleth::scene::MountPoints;
use edu_choropleth::server::{self, AppState};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the datasets and write the choropleth
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Overrides output.dir from the config
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
    /// Generate, then serve the output directory and the county query API
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn generate(config: &AppConfig) -> anyhow::Result<Renderer> {
    let fetcher = Fetcher::new(config.input.timeout_secs)?;
    let mut renderer = Renderer::new(config.clone(), MountPoints::default())?;
    renderer.run(&fetcher).await?;
    renderer.write_outputs(&config.output.dir)?;
    Ok(renderer)
}

fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    AppConfig::load_or_default(path).with_context(|| format!("Loading {:?}", path))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Generate { config, out } => {
            let mut app_config = load_config(config)?;
            if let Some(dir) = out {
                app_config.output.dir = dir.clone();
            }
            generate(&app_config).await?;
            info!("Generation complete!");
        }
        Commands::Serve { config } => {
            let app_config = load_config(config)?;
            let renderer = generate(&app_config).await?;

            let education = renderer
                .index()
                .cloned()
                .context("render produced no education index")?;
            let state = AppState::new(renderer.page().surface.shapes.clone(), education);
            server::start_server(&app_config, state).await?;
        }
    }

    Ok(())
}
