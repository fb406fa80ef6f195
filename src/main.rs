use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use votereport::{ReportConfig, ReportService};

#[derive(Parser, Debug)]
#[command(name = "votereport", about = "Periodic vote-count aggregation service")]
struct Args {
    /// Base address of the reverse proxy / gateway
    #[arg(long, env = "VOTEREPORT_GATEWAY")]
    gateway: String,

    /// Base address of the partition directory service
    #[arg(long, env = "VOTEREPORT_DIRECTORY")]
    directory: String,

    /// Path of the source vote service relative to the gateway base
    #[arg(
        long,
        env = "VOTEREPORT_SERVICE_PATH",
        default_value = "/VotingApplication/VotingData"
    )]
    service_path: String,

    /// Seconds between aggregation cycles
    #[arg(long, default_value_t = 60)]
    poll_secs: u64,

    /// Directory lookup timeout in seconds
    #[arg(long, default_value_t = 10)]
    directory_timeout_secs: u64,

    /// Address the read API listens on
    #[arg(long, env = "VOTEREPORT_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Snapshot directory for the report store (in-memory only when unset)
    #[arg(long, env = "VOTEREPORT_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut config = ReportConfig::new(args.gateway, args.directory, args.service_path)
        .poll_interval(Duration::from_secs(args.poll_secs))
        .directory_timeout(Duration::from_secs(args.directory_timeout_secs))
        .listen_addr(args.listen);
    if let Some(dir) = args.data_dir {
        config = config.data_dir(dir);
    }

    let listen_addr = config.listen_addr;
    let service = ReportService::new(config)?;
    let loop_handle = service.spawn();

    let signal_token = service.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            signal_token.cancel();
        }
    });

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!("Read API listening on http://{}", listen_addr);

    let shutdown_token = service.cancellation_token();
    axum::serve(listener, service.router())
        .with_graceful_shutdown(async move { shutdown_token.cancelled().await })
        .await?;

    service.cancel();
    loop_handle.await?;

    Ok(())
}
