use anyhow::Context;
use clap::Parser;
use episode_ratings::server::{AppState, serve};
use episode_ratings::{PageFetcher, ScraperArgs, ScraperConfig, Session};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Serve episode ratings as JSON over HTTP
#[derive(Parser, Debug)]
#[command(name = "ratings-server", version)]
struct Args {
    /// Address to bind
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "SERVER_PORT", default_value_t = 3000)]
    port: u16,

    #[command(flatten)]
    scraper: ScraperArgs,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "episode_ratings=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;

    let config = ScraperConfig::from(args.scraper);

    // The blocking client owns its own runtime, so it is built and dropped
    // outside of the async one.
    let session: Arc<dyn PageFetcher + Send + Sync> =
        Arc::new(Session::new(&config).context("Failed to create HTTP session")?);
    let state = AppState::new(Arc::clone(&session), config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let result = runtime.block_on(serve(addr, state));
    drop(runtime);
    drop(session);

    result.with_context(|| format!("Server on {} stopped", addr))
}
