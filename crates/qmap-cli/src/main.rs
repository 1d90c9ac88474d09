//! qmap Command-Line Interface
//!
//! Maps quantum kernels onto a platform and inspects platform topologies.
//!
//! ```text
//! qmap map --platform s7.json --input program.json -O maplookahead=all
//! qmap topology --platform s7.json
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{map, topology, version};

/// qmap - qubit mapping for connectivity-constrained quantum devices
#[derive(Parser)]
#[command(name = "qmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map every kernel of a program onto a platform
    Map {
        /// Platform description (JSON or YAML)
        #[arg(short, long)]
        platform: String,

        /// Program or kernel (JSON)
        #[arg(short, long)]
        input: String,

        /// Output file for the mapped program
        #[arg(short, long)]
        output: Option<String>,

        /// Mapper option as key=value, repeatable
        #[arg(short = 'O', long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,

        /// Start each kernel from the previous kernel's final mapping
        #[arg(long)]
        chain: bool,

        /// Write the per-kernel reports as JSON to this file
        #[arg(long)]
        report: Option<String>,
    },

    /// Show a platform's connectivity and distances
    Topology {
        /// Platform description (JSON or YAML)
        #[arg(short, long)]
        platform: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Map {
            platform,
            input,
            output,
            options,
            chain,
            report,
        } => {
            map::execute(
                &platform,
                &input,
                output.as_deref(),
                &options,
                chain,
                report.as_deref(),
            )
            .await
        }

        Commands::Topology { platform } => topology::execute(&platform),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
