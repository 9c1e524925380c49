use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

use commands::{Assignment, parse_assignment, run_graph, run_once, run_serve};

#[derive(Parser, Debug)]
#[command(name = "flowmesh", version)]
#[command(about = "Flowmesh CLI - build and drive publish/subscribe dataflow graphs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP adapter
    Serve {
        /// Bind address (overrides FLOWMESH_HTTP_HOST)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides FLOWMESH_HTTP_PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Mailbox slots per agent (overrides FLOWMESH_MAILBOX_CAPACITY)
        #[arg(long)]
        mailbox_capacity: Option<usize>,
        /// Configuration file to install at startup
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Load a configuration, publish values and print the resulting topics
    Run {
        /// Configuration file
        config: PathBuf,
        /// Value to publish, as TOPIC=VALUE (repeatable, published in order)
        #[arg(long = "publish", value_parser = parse_assignment)]
        publish: Vec<Assignment>,
        /// Milliseconds to wait for the graph to settle before printing
        #[arg(long, default_value_t = 200)]
        settle_ms: u64,
        /// Mailbox slots per agent
        #[arg(long)]
        mailbox_capacity: Option<usize>,
    },
    /// Print the topology of a configuration
    Graph {
        /// Configuration file
        config: PathBuf,
        /// Exit with an error when the graph contains a cycle
        #[arg(long)]
        deny_cycles: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize JSON logging once; stdout is reserved for command output.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter, // fallback to default if parsing fails
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .json()
        .try_init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            host,
            port,
            mailbox_capacity,
            config,
        } => run_serve(host, port, mailbox_capacity, config).await,
        Commands::Run {
            config,
            publish,
            settle_ms,
            mailbox_capacity,
        } => run_once(&config, &publish, settle_ms, mailbox_capacity).await,
        Commands::Graph {
            config,
            deny_cycles,
        } => run_graph(&config, deny_cycles).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
