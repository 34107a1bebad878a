use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fxcache", version)]
struct Cli {
    /// Log cache decisions to stderr (repeat for more detail).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a frame trace and print one JSON report per frame.
    Replay(ReplayArgs),
    /// Validate a filter cache options file.
    CheckOpts(CheckOptsArgs),
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// Input trace JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Filter cache options JSON. Defaults apply when omitted.
    #[arg(long)]
    opts: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CheckOptsArgs {
    /// Filter cache options JSON.
    #[arg(long)]
    opts: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Replay(args) => cmd_replay(args),
        Command::CheckOpts(args) => cmd_check_opts(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let trace = fxcache::Trace::from_path(&args.in_path)
        .with_context(|| format!("load trace '{}'", args.in_path.display()))?;
    let opts = match &args.opts {
        Some(p) => fxcache::FilterCacheOpts::from_path(p)
            .with_context(|| format!("load opts '{}'", p.display()))?,
        None => fxcache::FilterCacheOpts::default(),
    };

    let reports = fxcache::replay(&trace, opts)?;
    let mut out = std::io::stdout().lock();
    for r in &reports {
        serde_json::to_writer(&mut out, r).context("serialize frame report")?;
        writeln!(out).context("write frame report")?;
    }
    eprintln!("replayed {} frames", reports.len());
    Ok(())
}

fn cmd_check_opts(args: CheckOptsArgs) -> anyhow::Result<()> {
    let opts = fxcache::FilterCacheOpts::from_path(&args.opts)
        .with_context(|| format!("load opts '{}'", args.opts.display()))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&opts).context("serialize opts")?
    );
    eprintln!("{} ok", args.opts.display());
    Ok(())
}
