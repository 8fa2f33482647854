use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use facelapse::{
    FacelapseConfig, FailurePolicy, FsArtifactCache, ImageOutcome, Pipeline, RunOutcome,
    RunReport, Stage, VideoStatus,
};

#[derive(Parser, Debug)]
#[command(name = "facelapse", version, about = "Eye-aligned portrait timelapse")]
struct Cli {
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Align every photo in the input directory, write numbered frames, and assemble the video.
    Run(RunArgs),
    /// Delete the stage cache directory.
    ClearCache(ConfigArgs),
    /// Print the effective configuration as JSON.
    PrintConfig(ConfigArgs),
}

#[derive(Parser, Debug)]
struct ConfigArgs {
    /// JSON config file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Override `paths.input`.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Override `paths.frames`.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Skip failing images instead of aborting the run.
    #[arg(long, default_value_t = false)]
    skip_failures: bool,

    /// Ignore and do not populate the stage cache.
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Write frames only; do not invoke ffmpeg.
    #[arg(long, default_value_t = false)]
    no_video: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::ClearCache(args) => cmd_clear_cache(args),
        Command::PrintConfig(args) => cmd_print_config(args),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load(args: &ConfigArgs) -> anyhow::Result<FacelapseConfig> {
    match &args.config {
        Some(path) => Ok(facelapse::load_config(path)?),
        None => Ok(FacelapseConfig::default()),
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = load(&args.config)?;
    if let Some(input) = args.input {
        config.paths.input = input;
    }
    if let Some(frames) = args.frames {
        config.paths.frames = frames;
    }
    if args.skip_failures {
        config.pipeline.on_failure = FailurePolicy::Skip;
    }
    if args.no_cache {
        config.cache.enabled = false;
    }
    if let Some(threads) = args.threads {
        config.pipeline.threads = threads;
    }
    if args.no_video {
        config.video.enabled = false;
    }

    let pipeline = Pipeline::from_config(config)?;
    let report = pipeline.run()?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("serialize run report")?;
        println!("{json}");
    }
    print_summary(&report);

    match &report.outcome {
        RunOutcome::Completed => {}
        RunOutcome::Aborted { file, kind } => {
            anyhow::bail!("run aborted by '{file}' ({kind})");
        }
        RunOutcome::Cancelled => anyhow::bail!("run cancelled"),
    }
    if let VideoStatus::Failed { failure } = &report.video {
        anyhow::bail!("video encoding failed: {}", failure.message);
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    eprintln!(
        "{} frame(s) written, {} failure(s), {} not processed, {} detector call(s)",
        report.frame_count(),
        report.failures().count(),
        report.not_processed().count(),
        report.detections
    );
    for image in &report.images {
        match &image.outcome {
            ImageOutcome::Skipped { failure, .. } | ImageOutcome::Aborted { failure, .. } => {
                eprintln!("  {}: {} - {}", image.file, failure.kind, failure.message);
                if let Some(path) = &failure.diagnostic {
                    eprintln!("    diagnostic: {}", path.display());
                }
            }
            ImageOutcome::Written { .. } | ImageOutcome::NotProcessed => {}
        }
    }
    for stage in Stage::ALL {
        let s = report.cache.stage(stage);
        eprintln!(
            "  cache {stage}: {} hit(s), {} miss(es), {} write(s), {} corrupt",
            s.hits, s.misses, s.writes, s.corrupt
        );
    }
    match &report.video {
        VideoStatus::Disabled => {}
        VideoStatus::NotEncoded { reason } => eprintln!("video not encoded: {reason}"),
        VideoStatus::Written { path } => eprintln!("wrote {}", path.display()),
        VideoStatus::Failed { failure } => eprintln!("video failed: {}", failure.message),
    }
}

fn cmd_clear_cache(args: ConfigArgs) -> anyhow::Result<()> {
    let config = load(&args)?;
    let cache = FsArtifactCache::new(config.paths.cache.clone());
    cache.clear()?;
    eprintln!("removed {}", cache.root().display());
    Ok(())
}

fn cmd_print_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = load(&args)?;
    config.validate()?;
    let json = serde_json::to_string_pretty(&config).context("serialize configuration")?;
    println!("{json}");
    Ok(())
}
