use allocation_graph::app::service::EngineService;
use allocation_graph::cli::{self, PolicyArg};
use allocation_graph::server::{http, mcp::AllocationMcpServer};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "agtool",
    version,
    about = "Detect and resolve deadlocks in resource-allocation graphs"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run exact deadlock detection on a scenario
    Detect { scenario: PathBuf },

    /// Detect, then terminate victims until no cycle remains
    Resolve {
        scenario: PathBuf,
        /// Victim policy (defaults to the scenario's configured policy)
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
        /// Terminate a single victim only
        #[arg(long)]
        once: bool,
    },

    /// Print the advisory risk score
    Risk { scenario: PathBuf },

    /// Print processes, resources and wait-for edges
    Graph { scenario: PathBuf },

    /// Serve the HTTP JSON API
    Serve {
        /// Optional scenario to start from
        scenario: Option<PathBuf>,
        #[arg(long, default_value = "127.0.0.1:8787")]
        addr: SocketAddr,
    },

    /// Serve MCP tools over stdio
    Mcp {
        /// Optional scenario to start from
        scenario: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(scenario: Option<&Path>) -> Result<EngineService> {
    match scenario {
        Some(path) => EngineService::load_from_json(path),
        None => Ok(EngineService::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Detect { scenario } => {
            cli::display_detection(&load(Some(scenario.as_path()))?, args.json)
        }
        Command::Resolve {
            scenario,
            policy,
            once,
        } => cli::run_resolution(
            &load(Some(scenario.as_path()))?,
            policy.map(Into::into),
            !once,
            args.json,
        ),
        Command::Risk { scenario } => cli::display_risk(&load(Some(scenario.as_path()))?, args.json),
        Command::Graph { scenario } => cli::display_graph(&load(Some(scenario.as_path()))?, args.json),
        Command::Serve { scenario, addr } => {
            http::serve(load(scenario.as_deref())?, addr).await
        }
        Command::Mcp { scenario } => {
            AllocationMcpServer::new(load(scenario.as_deref())?)
                .serve_stdio()
                .await
        }
    }
}
