//! Clap CLI definition: root struct, subcommands, and shared argument types.
use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// A CLI argument that is either a filesystem path or the stdin sentinel `"-"`.
#[derive(Clone, Debug)]
pub enum PathOrStdin {
    /// Read from standard input.
    Stdin,
    /// Read from the given filesystem path.
    Path(PathBuf),
}

impl std::str::FromStr for PathOrStdin {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(PathOrStdin::Stdin)
        } else {
            Ok(PathOrStdin::Path(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for PathOrStdin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathOrStdin::Stdin => f.write_str("-"),
            PathOrStdin::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Output format for CLI commands.
///
/// `Human` prints aligned text to stdout. `Json` prints one pretty-printed
/// JSON object to stdout.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default).
    Human,
    /// Structured JSON.
    Json,
}

/// All top-level subcommands exposed by the `agentmap` binary.
#[derive(Subcommand)]
pub enum Command {
    /// Print summary statistics and build diagnostics for a snapshot.
    Inspect {
        /// Path to a topology snapshot, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
    },

    /// Split the edges of a snapshot into forward and back edges.
    Classify {
        /// Path to a topology snapshot, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
    },

    /// Print the disclosure hierarchy as an indented tree.
    Tree {
        /// Path to a topology snapshot, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
    },

    /// Show the nodes and edges visible for an expansion state.
    Visible {
        /// Path to a topology snapshot, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
        /// Expand this node (repeatable).
        #[arg(long, value_name = "ID")]
        expand: Vec<String>,
        /// Expand every node that has children.
        #[arg(long)]
        expand_all: bool,
        /// Expand the ancestors of this node so it becomes visible (repeatable).
        #[arg(long, value_name = "ID")]
        reveal: Vec<String>,
    },

    /// Print the highlighted ancestor chain of a node.
    Path {
        /// Path to a topology snapshot, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
        /// The selected node ID.
        #[arg(value_name = "NODE_ID")]
        node_id: String,
    },

    /// Remove cycle-closing links from Sankey flow data.
    Sankey {
        /// Path to a Sankey response (or a snapshot with `--from-topology`),
        /// or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
        /// Read a topology snapshot and derive the Sankey links from its edges.
        #[arg(long)]
        from_topology: bool,
        /// Keep repeated (source, target) links instead of summing them.
        #[arg(long)]
        keep_duplicates: bool,
        /// Skip loop detection over raw traces.
        #[arg(long)]
        no_trace_loops: bool,
    },

    /// Print the structural fingerprint of a snapshot.
    Fingerprint {
        /// Path to a topology snapshot, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
    },
}

/// Root CLI struct for the `agentmap` binary.
///
/// All global flags are marked `global = true` so that clap propagates them
/// to every subcommand.
#[derive(Parser)]
#[command(
    name = "agentmap",
    version,
    about = "Multi-agent execution topology analyser",
    long_about = "Analyses execution topology snapshots of multi-agent AI workloads.\n\
                  Classifies retry loops, builds the disclosure hierarchy, resolves\n\
                  visible subgraphs, highlights paths and projects Sankey flows."
)]
pub struct Cli {
    /// Active subcommand.
    #[command(subcommand)]
    pub command: Command,

    /// Output format: human (default) or json.
    #[arg(long, short = 'f', default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Only log errors to stderr (incompatible with `--verbose`).
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log analysis details to stderr (incompatible with `--quiet`).
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Maximum input file size in bytes.
    ///
    /// Can also be set via the `AGENTMAP_MAX_FILE_SIZE` environment variable.
    /// Default: 268435456 (256 MB).
    #[arg(
        long,
        global = true,
        env = "AGENTMAP_MAX_FILE_SIZE",
        default_value = "268435456"
    )]
    pub max_file_size: u64,

    /// Log filter directive, e.g. `debug` or `agentmap_core=trace`.
    ///
    /// Overrides `--quiet`/`--verbose`. Can also be set via `AGENTMAP_LOG`.
    #[arg(long, global = true, env = "AGENTMAP_LOG")]
    pub log_level: Option<String>,
}

impl Cli {
    /// The log filter directive implied by the flags.
    pub fn log_directive(&self) -> String {
        if let Some(level) = &self.log_level {
            return level.clone();
        }
        if self.quiet {
            "error".to_owned()
        } else if self.verbose {
            "debug".to_owned()
        } else {
            "warn".to_owned()
        }
    }
}
