//! cogmorph CLI - command-line interface for morphological segmentation.
//!
//! This is the main entry point for the `cogmorph` command-line tool.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use commands::{ExtractMapsCommand, MergeListsCommand, SegmentCommand, TrainCommand};
use env_logger::Env;

#[derive(Parser)]
#[command(name = "cogmorph")]
#[command(about = "Unsupervised morphological segmentation of words and cognate pairs", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (-q warn, -qq error)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model on a corpus or an existing segmentation
    Train(TrainCommand),
    /// Segment a corpus with a saved model
    Segment(SegmentCommand),
    /// Split a cognate segmentation into per-side morph lists and links
    ExtractMaps(ExtractMapsCommand),
    /// Build a cognate corpus from two word lists and candidate pairs
    MergeLists(MergeListsCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Train(cmd) => commands::train::run(cmd)?,
        Commands::Segment(cmd) => commands::segment::run(cmd)?,
        Commands::ExtractMaps(cmd) => commands::maps::run(cmd)?,
        Commands::MergeLists(cmd) => commands::merge::run(cmd)?,
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    let level = match (quiet, verbose) {
        (0, 0) => LevelFilter::Info,
        (0, 1) => LevelFilter::Debug,
        (0, _) => LevelFilter::Trace,
        (1, _) => LevelFilter::Warn,
        _ => LevelFilter::Error,
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}
