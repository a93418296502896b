mod commands;
mod site;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use site::Site;
use stacksite_core::{CmsSettings, SiteConfig, load_site_config};
use stacksite_delivery::{LiveUpdates, Resolver};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stacksite")]
#[command(version, about = "Marketing site rendered from a ContentStack stack", long_about = None)]
struct Cli {
    /// Site options file
    #[arg(short, long, global = true, default_value = "stacksite.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Serve the site, rendering pages from the CMS on each request
    ///
    /// With CONTENTSTACK_LIVE_PREVIEW=true the server accepts entry changes
    /// on POST /_live/change and reloads open pages.
    Serve {
        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Export every published route as static HTML
    Build {
        /// Output directory for generated site
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Check that published content matches what the site renders
    Validate,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stacksite=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_settings() -> anyhow::Result<Arc<CmsSettings>> {
    let settings = CmsSettings::from_env()
        .context("CMS settings incomplete; set them in the environment or a .env file")?;
    Ok(Arc::new(settings))
}

fn load_config(path: &Path) -> anyhow::Result<SiteConfig> {
    load_site_config(path).with_context(|| format!("Failed to load {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port } => {
            let settings = load_settings()?;
            let config = load_config(&cli.config)?;
            let live = LiveUpdates::new(settings.live_preview);
            let app_host = settings.app_host.clone();
            let site =
                Site::from_settings(settings, config).context("Failed to create CMS client")?;
            commands::serve::run(site, live, app_host, port).await
        }
        Command::Build { output } => {
            let settings = load_settings()?;
            let config = load_config(&cli.config)?;
            let site =
                Site::from_settings(settings, config).context("Failed to create CMS client")?;
            commands::build::run(site, &output).await
        }
        Command::Validate => {
            let settings = load_settings()?;
            let resolver =
                Resolver::from_settings(settings.clone()).context("Failed to create CMS client")?;
            commands::validate::run(&resolver, &settings.environment).await
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "stacksite", &mut io::stdout());
            Ok(())
        }
    }
}
