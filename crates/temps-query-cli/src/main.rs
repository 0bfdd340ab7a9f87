//! temps-query CLI
//!
//! Runs Azure Resource Graph query batches from the command line: list the
//! supported clouds, preview the requests a batch turns into, or send it.

mod commands;

use clap::{Parser, Subcommand};
use commands::{BuildCommand, CloudsCommand, RunCommand};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "TEMPS_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log format: compact, full
    #[arg(
        long,
        default_value = "compact",
        env = "TEMPS_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported clouds and their endpoints
    Clouds(CloudsCommand),
    /// Interpolate a batch and print the requests without sending them
    Build(BuildCommand),
    /// Send a batch and print the normalized responses
    Run(RunCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // If RUST_LOG is set, use it as-is; otherwise our crates log at the
    // requested level and dependencies at warn
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()?
    } else {
        tracing_subscriber::EnvFilter::new(format!(
            "temps_query_cli={level},\
             temps_query={level},\
             temps_query_resource_graph={level},\
             hyper=warn,\
             reqwest=warn,\
             rustls=warn",
            level = cli.log_level
        ))
    };

    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer() // "compact" or any other value
            .with_writer(std::io::stderr)
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Clouds(cmd) => cmd.execute(),
        Commands::Build(cmd) => cmd.execute(),
        Commands::Run(cmd) => cmd.execute(),
    }
}
