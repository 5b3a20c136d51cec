use std::{
    fs::File,
    io::{BufReader, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scrawl", version)]
struct Cli {
    /// Log at debug level.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay an input trace and write the drawing as a PNG.
    Render(RenderArgs),
    /// Replay an input trace and print the resulting segments as JSON.
    Segments(SegmentsArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input trace JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Image stretched under the drawing.
    #[arg(long, conflicts_with = "color")]
    background: Option<PathBuf>,

    /// Solid background as `RRGGBB` or `RRGGBBAA` hex.
    #[arg(long, value_parser = parse_hex_color)]
    color: Option<scrawl::Rgba8>,

    /// Output width (defaults to the trace canvas).
    #[arg(long)]
    width: Option<u32>,

    /// Output height (defaults to the trace canvas).
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Parser, Debug)]
struct SegmentsArgs {
    /// Input trace JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Segments(args) => cmd_segments(args),
    }
}

/// `info` by default; with `--verbose`, `debug` unless `RUST_LOG` says otherwise.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_trace(path: &Path) -> anyhow::Result<scrawl::Trace> {
    let f = File::open(path).with_context(|| format!("open trace '{}'", path.display()))?;
    let trace = scrawl::Trace::from_reader(BufReader::new(f)).context("parse trace JSON")?;
    Ok(trace)
}

fn parse_hex_color(s: &str) -> Result<scrawl::Rgba8, String> {
    let hex = s.trim_start_matches('#');
    let byte = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| format!("invalid hex color '{s}'"))
    };
    match hex.len() {
        6 => Ok(scrawl::Rgba8::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Ok(scrawl::Rgba8::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => Err(format!("expected RRGGBB or RRGGBBAA, got '{s}'")),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let trace = read_trace(&args.in_path)?;
    let session = trace.play()?;

    let output = scrawl::CanvasSize::new(
        args.width.unwrap_or(trace.canvas.width),
        args.height.unwrap_or(trace.canvas.height),
    )?;

    let surface = match (&args.background, args.color) {
        (Some(path), _) => {
            let bg = image::open(path)
                .with_context(|| format!("open background '{}'", path.display()))?
                .to_rgba8();
            session.render_onto(Some(&bg), output)?
        }
        (None, Some(color)) => session.render_onto_color(color, output)?,
        (None, None) => session.render_onto(None, output)?,
    };

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    surface
        .to_rgba_image()?
        .save(&args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    tracing::info!(
        segments = session.segments().len(),
        strokes = session.stroke_count(),
        out = %args.out.display(),
        "rendered"
    );
    Ok(())
}

fn cmd_segments(args: SegmentsArgs) -> anyhow::Result<()> {
    let trace = read_trace(&args.in_path)?;
    let session = trace.play()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, session.segments()).context("write segments JSON")?;
    writeln!(out)?;
    Ok(())
}
