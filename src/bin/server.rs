//! walkv Server Binary
//!
//! Starts the WAL service and the TCP server.

use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use walkv::config::parse_size;
use walkv::network::Server;
use walkv::wal::{SegmentWriter, WalService};
use walkv::{shutdown, Config, Engine, Router};

/// walkv Server
#[derive(Parser, Debug)]
#[command(name = "walkv-server")]
#[command(about = "In-memory key-value store with a batched write-ahead log")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:3223")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "100")]
    max_connections: usize,

    /// Maximum request size, e.g. 4KB
    #[arg(long, default_value = "4KB")]
    max_message_size: String,

    /// Idle timeout in seconds (0 disables it)
    #[arg(short, long, default_value = "300")]
    idle_timeout: u64,

    /// Data directory for WAL segments
    #[arg(short, long, default_value = "./walkv_data")]
    data_dir: String,

    /// Segment size before rotation, e.g. 10MB
    #[arg(long, default_value = "10MB")]
    max_segment_size: String,

    /// Records per WAL batch
    #[arg(long, default_value = "100")]
    flush_batch_size: usize,

    /// WAL batch flush timeout in milliseconds
    #[arg(long, default_value = "10")]
    flush_timeout_ms: u64,

    /// Capacity of the WAL ingestion queue
    #[arg(long, default_value = "1024")]
    wal_queue_capacity: usize,

    /// Do not bound socket writes by the idle timeout
    #[arg(long)]
    no_write_deadline: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,walkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("walkv Server v{}", walkv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let (trigger, shutdown) = shutdown::channel();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received termination signal, initiating shutdown...");
        trigger.trigger();
    }) {
        tracing::error!("Failed to install signal handler: {}", e);
        process::exit(1);
    }

    let segments = match SegmentWriter::open(config.wal_path(), config.max_segment_size) {
        Ok(writer) => writer,
        Err(e) => {
            tracing::error!("Failed to open WAL segment: {}", e);
            process::exit(1);
        }
    };

    let wal = match WalService::start(segments, &config, shutdown.clone()) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to start WAL service: {}", e);
            process::exit(1);
        }
    };

    let engine = Arc::new(Engine::new());
    let router = Arc::new(Router::new(engine, wal.handle()));

    let server = match Server::bind(config, router) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind listener: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = server.run(shutdown) {
        tracing::error!("Server error: {}", e);
        process::exit(1);
    }

    wal.join();
    tracing::info!("Server stopped");
}

fn build_config(args: &Args) -> walkv::Result<Config> {
    let max_message_size = usize::try_from(parse_size(&args.max_message_size)?)
        .map_err(|_| walkv::KvError::Config("max message size too large".into()))?;

    let idle_timeout = match args.idle_timeout {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .max_message_size(max_message_size)
        .idle_timeout(idle_timeout)
        .write_deadline(!args.no_write_deadline)
        .data_dir(&args.data_dir)
        .max_segment_size(parse_size(&args.max_segment_size)?)
        .flush_batch_size(args.flush_batch_size)
        .flush_batch_timeout(Duration::from_millis(args.flush_timeout_ms))
        .wal_queue_capacity(args.wal_queue_capacity)
        .build();

    config.validate()?;
    Ok(config)
}
