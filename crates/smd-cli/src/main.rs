//! smd CLI - Convert smd documents to HTML
//!
//! Usage:
//!   smd [OPTIONS] [FILE]
//!
//! Commands:
//!   render    Convert to HTML (default)
//!   stats     Show conversion statistics
//!
//! FILE may be omitted or `-` to read standard input.

mod settings;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use smd_core::{Converter, Options, RenderStats};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "smd", version, about = "Convert smd documents to HTML")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    render: RenderArgs,

    /// Configuration file layered over the defaults and `smd.toml`
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Longest accepted input line in bytes
    #[arg(long, global = true, value_name = "BYTES")]
    max_line_length: Option<usize>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a document to HTML (default)
    Render(RenderArgs),
    /// Convert a document and print conversion statistics
    Stats(StatsArgs),
}

#[derive(Debug, Args)]
struct RenderArgs {
    /// Input file, `-` for standard input
    file: Option<PathBuf>,

    /// Write HTML to this file instead of standard output
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct StatsArgs {
    /// Input file, `-` for standard input
    file: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let options = settings::load(cli.config.as_deref(), cli.max_line_length)
        .context("failed to load configuration")?;
    debug!(?options, "configuration loaded");

    match cli.command {
        Some(Command::Render(args)) => cmd_render(&args, &options),
        Some(Command::Stats(args)) => cmd_stats(&args, &options),
        None => cmd_render(&cli.render, &options),
    }
}

fn open_input(file: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match file {
        None => Ok(Box::new(io::stdin().lock())),
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdin().lock())),
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

// =============================================================================
// Render Command
// =============================================================================

fn cmd_render(args: &RenderArgs, options: &Options) -> Result<()> {
    let input = open_input(args.file.as_deref())?;
    let output: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create '{}'", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    // On failure the writer is dropped here, flushing what was already
    // rendered.
    let (_, stats) = Converter::with_options(input, output, options).run()?;
    info!(lines = stats.lines, blocks = stats.blocks, "rendered");
    Ok(())
}

// =============================================================================
// Stats Command
// =============================================================================

fn cmd_stats(args: &StatsArgs, options: &Options) -> Result<()> {
    let input = open_input(args.file.as_deref())?;
    let (_, stats) = Converter::with_options(input, io::sink(), options).run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats);
    }
    Ok(())
}

fn print_stats(stats: &RenderStats) {
    println!("Conversion Statistics");
    println!("---------------------");
    println!("Lines:          {}", stats.lines);
    println!("Blocks:         {}", stats.blocks);
    println!("Containers:     {}", stats.containers);
    println!("Max depth:      {}", stats.max_depth);
}
