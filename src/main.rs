use anyhow::Result;
use clap::Parser;
use recforge::api::create_router;
use recforge::{init_tracing, AppState, Config};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Recommendation engine builder server", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file {} not found, using defaults", args.config);
        Config::default()
    };
    info!("Starting recforge server with config: {:?}", config.server);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.worker_threads())
        .enable_all()
        .build()?;
    runtime.block_on(serve(config))
}

async fn serve(config: Config) -> Result<()> {
    let state = AppState::new(config.clone());

    let sweeper = state.service.clone();
    let sweep_every = Duration::from_secs(config.sessions.sweep_interval_seconds.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            let evicted = sweeper.sweep_expired();
            debug!("Session sweep evicted {}, {} live", evicted, sweeper.session_count());
        }
    });

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
