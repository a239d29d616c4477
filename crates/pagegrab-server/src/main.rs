use anyhow::Result;
use clap::Parser;
use pagegrab_core::{Config, RunMode};

#[derive(Debug, Parser)]
#[command(name = "pagegrab-server")]
#[command(about = "Forward element change requests to a local OpenCode server (development only)")]
struct Args {
    /// Enable the change endpoints (same as PAGEGRAB_MODE=development)
    #[arg(long)]
    dev: bool,
    /// Address to listen on
    #[arg(long)]
    listen: Option<String>,
    /// Base URL of the OpenCode server
    #[arg(long)]
    assistant_url: Option<String>,
    /// Repository the assistant should edit
    #[arg(long)]
    project_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut config = Config::load()?;
    if args.dev {
        config.mode = RunMode::Development;
    }
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(url) = args.assistant_url {
        config.assistant_url = url;
    }
    if let Some(dir) = args.project_dir {
        config.project_dir = Some(dir);
    }

    pagegrab_server::run_server(&config).await
}
