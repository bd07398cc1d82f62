mod cmd;
mod output;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "relay",
    about = "Relay service up/down/restart directives from a queue and HTTP to an executor queue",
    version,
    propagate_version = true
)]
struct Cli {
    /// Projects file: a JSON array of project descriptors
    #[arg(long, global = true, env = "CONFIG_FILE", default_value = "projects.json")]
    config_file: PathBuf,

    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume directives and serve HTTP until SIGINT/SIGTERM (default)
    Serve,

    /// Load the projects file and report problems without connecting anywhere
    Validate {
        /// Output as JSON
        #[arg(long, short = 'j')]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Redis address (host:port)
    #[arg(long, global = true, env = "REDIS_ADDR", default_value = "localhost:6379")]
    pub redis_addr: String,

    /// Redis password
    #[arg(long, global = true, env = "REDIS_PASSWORD", hide_env_values = true)]
    pub redis_password: Option<String>,

    /// List that directives are consumed from
    #[arg(long, global = true, env = "SOURCE_LIST", default_value = "service:commands")]
    pub source_list: String,

    /// Default list that work orders are appended to
    #[arg(long, global = true, env = "TARGET_QUEUE", default_value = "poppit:notifications")]
    pub target_queue: String,

    /// HTTP port
    #[arg(long, global = true, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Bounded wait for one blocking read from the source list
    #[arg(long, global = true, env = "POLL_TIMEOUT_SECS", default_value = "5")]
    pub poll_timeout_secs: u64,

    /// Time allowed for in-flight HTTP requests on shutdown
    #[arg(long, global = true, env = "SHUTDOWN_GRACE_SECS", default_value = "5")]
    pub shutdown_grace_secs: u64,
}

/// INFO unless `RUST_LOG` says otherwise. Unparseable directives are skipped.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives.unwrap_or_default())
}

fn main() {
    let cli = Cli::parse();

    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_target(false)
        .init();

    let result = match cli.command {
        Some(Commands::Validate { json }) => cmd::validate::run(&cli.config_file, json),
        Some(Commands::Serve) | None => cmd::serve::run(&cli.config_file, &cli.serve),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
