use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod cmd;
mod error;
mod format;
mod io;

pub use cli::{Cli, Command, OutputFormat, PathOrStdin};

use agentmap_core::SankeyConfig;
use cmd::visible::ExpansionRequest;
use error::CliError;
use io::read_snapshot;

fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_new(cli.log_directive()).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let max = cli.max_file_size;
    let format = cli.format;
    match &cli.command {
        Command::Inspect { file } => cmd::inspect::run(read_snapshot(file, max)?, format),
        Command::Classify { file } => cmd::classify::run(read_snapshot(file, max)?, format),
        Command::Tree { file } => cmd::tree::run(read_snapshot(file, max)?, format),
        Command::Visible {
            file,
            expand,
            expand_all,
            reveal,
        } => {
            let request = ExpansionRequest {
                expand,
                expand_all: *expand_all,
                reveal,
            };
            cmd::visible::run(read_snapshot(file, max)?, format, &request)
        }
        Command::Path { file, node_id } => {
            cmd::path::run(read_snapshot(file, max)?, node_id, format)
        }
        Command::Sankey {
            file,
            from_topology,
            keep_duplicates,
            no_trace_loops,
        } => {
            let response = cmd::sankey::read_response(file, max, *from_topology)?;
            let config = SankeyConfig {
                merge_duplicate_links: !keep_duplicates,
                detect_trace_loops: !no_trace_loops,
            };
            cmd::sankey::run(&response, &config, format)
        }
        Command::Fingerprint { file } => cmd::fingerprint::run(read_snapshot(file, max)?, format),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(&cli) {
        eprintln!("{e}");
        std::process::exit(e.exit_code());
    }
}
