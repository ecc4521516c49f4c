use clap::Parser;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use heapscope::{
    common::{
        constants::{DEFAULT_BATCH_SIZE, DEFAULT_SNAPSHOT_INTERVAL},
        dump::{dump_line, summarize},
    },
    engine::replay::ReplayEngine,
    Options, OptionsBuilder, SnapshotStream,
};

/// Replay recorded engine event traces and print snapshots of the object graph.
#[derive(Parser)]
#[command(about)]
pub struct Args {
    /// Number of engine steps run before yielding between snapshots
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Minimum time between printed snapshots, in milliseconds
    #[arg(long)]
    pub interval: Option<u64>,

    /// Never collect unreachable values at call boundaries
    #[arg(long, default_value_t = false)]
    pub no_gc: bool,

    /// Print each snapshot as JSON instead of a summary line
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Log debug output to stderr. Overridden by RUST_LOG.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    #[arg(required = true)]
    pub files: Vec<String>,
}

trait FromArgs {
    /// Create new options from command line arguments.
    fn new_from_args(args: &Args) -> Self;
}

impl FromArgs for OptionsBuilder {
    fn new_from_args(args: &Args) -> Self {
        OptionsBuilder::new()
            .batch_size(args.batch_size.unwrap_or(DEFAULT_BATCH_SIZE))
            .snapshot_interval(args.interval.unwrap_or(DEFAULT_SNAPSHOT_INTERVAL))
            .collect_garbage(!args.no_gc)
    }
}

pub fn print_error_message_and_exit(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn replay(file: &str, options: &Options, json: bool) -> Result<(), String> {
    let source = std::fs::read_to_string(file).map_err(|err| format!("{file}: {err}"))?;
    let stream = SnapshotStream::new(&mut ReplayEngine::new(), &source, options);

    for item in stream {
        let snapshot = item.map_err(|err| format!("{file}: {err}"))?;
        let line = if json {
            snapshot.to_json().map_err(|err| format!("{file}: {err}"))?
        } else {
            summarize(&snapshot)
        };

        dump_line(options, &line);
    }

    debug!(file, "replay finished");
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let options = OptionsBuilder::new_from_args(&args).build();

    for file in &args.files {
        if let Err(message) = replay(file, &options, args.json) {
            print_error_message_and_exit(&message);
        }
    }
}
