mod cmd;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{BuildArgs, ListArgs, cmd_build, cmd_list};

/// shifter - build YUI-style component modules from build.json
#[derive(Parser)]
#[command(name = "shifter")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the modules and rollups of a build.json
  Build(BuildArgs),

  /// List the modules and rollups of a build.json in build order
  List(ListArgs),
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match cli.command {
    Commands::Build(args) => cmd_build(args),
    Commands::List(args) => cmd_list(args),
  }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();
}
