//! boardscan CLI: board detection and still capture on image files.

use boardscan::capture::{CaptureSurface, JpegStillEncoder, PacedClock, PassOutcome};
use boardscan::{scan, DisplaySize, ImageFileSource, PixelRect, Scanner, ScannerConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::fs;
use std::path::PathBuf;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "boardscan")]
#[command(about = "Find circuit boards in camera frames and capture them")]
#[command(version)]
struct Cli {
    /// Log level for stderr output.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Emit logs as JSON (needs the `tracing` feature).
    #[arg(long, global = true)]
    tracing_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the board in an image and print the region as JSON.
    Detect(DetectArgs),

    /// Write a JPEG still of a region (or of the whole image).
    Capture(CaptureArgs),

    /// Run continuous detection over images as a looping feed.
    Watch(WatchArgs),
}

#[derive(Debug, Clone, Args)]
struct SharedArgs {
    /// Display size `WxH` the feed is shown at; regions use this space.
    #[arg(long, value_parser = parse_display)]
    display: Option<DisplaySize>,

    /// Scanner config (JSON). Missing fields use defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl SharedArgs {
    fn load_config(&self) -> CliResult<ScannerConfig> {
        let mut config = match &self.config {
            Some(path) => ScannerConfig::load_json(path)?,
            None => ScannerConfig::default(),
        };
        if self.display.is_some() {
            config.display = self.display;
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, Args)]
struct DetectArgs {
    /// Input image.
    image: PathBuf,

    /// Also write the raw edge map to this PNG.
    #[arg(long)]
    edges: Option<PathBuf>,

    #[command(flatten)]
    shared: SharedArgs,
}

#[derive(Debug, Clone, Args)]
struct CaptureArgs {
    /// Input image.
    image: PathBuf,

    /// Region `x,y,w,h` in display space; whole frame when omitted.
    #[arg(long, value_parser = parse_rect)]
    region: Option<PixelRect>,

    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    shared: SharedArgs,
}

#[derive(Debug, Clone, Args)]
struct WatchArgs {
    /// Input images, played in order and looped.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Number of frames to process.
    #[arg(long, default_value_t = 10)]
    frames: usize,

    /// Pass rate; overrides the config.
    #[arg(long)]
    fps: Option<f64>,

    #[command(flatten)]
    shared: SharedArgs,
}

fn parse_display(s: &str) -> Result<DisplaySize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got {s:?}"))?;
    let w: f32 = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h: f32 = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    let size = DisplaySize::new(w, h);
    if size.is_empty() {
        return Err(format!("display size must be positive, got {s:?}"));
    }
    Ok(size)
}

fn parse_rect(s: &str) -> Result<PixelRect, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("bad region {s:?}: {e}"))?;
    let [x, y, w, h] = parts[..] else {
        return Err(format!("expected x,y,w,h, got {s:?}"));
    };
    Ok(PixelRect::new(x, y, w, h))
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    boardscan::init_logging(cli.log_level.into(), cli.tracing_json);

    match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::Capture(args) => run_capture(&args),
        Commands::Watch(args) => run_watch(&args),
    }
}

// ── detect ────────────────────────────────────────────────────────────

fn run_detect(args: &DetectArgs) -> CliResult<()> {
    let config = args.shared.load_config()?;
    log::info!("loading image: {}", args.image.display());
    let img = image::open(&args.image)?;
    log::info!("image size: {}x{}", img.width(), img.height());

    let region = scan::detect_board(&img, config.detector.clone(), config.display)?;
    match &region {
        Some(r) => log::info!(
            "board at {:?} (confidence {:.2})",
            r.bounding_box,
            r.confidence
        ),
        None => log::info!("no board detected"),
    }
    println!("{}", serde_json::to_string_pretty(&region)?);

    if let Some(path) = &args.edges {
        match scan::edge_map(&img, config.detector)? {
            Some(edges) => {
                edges.save(path)?;
                log::info!("edge map written to {}", path.display());
            }
            None => log::warn!("no edge map for an empty image"),
        }
    }
    Ok(())
}

// ── capture ───────────────────────────────────────────────────────────

fn run_capture(args: &CaptureArgs) -> CliResult<()> {
    let config = args.shared.load_config()?;
    let mut source = ImageFileSource::open(std::slice::from_ref(&args.image))?;
    if let Some(display) = config.display {
        source.set_display(display);
    }
    let encoder = JpegStillEncoder::from_config(&config.capture);
    let mut surface = CaptureSurface::with_encoder(source, encoder);

    let still = match args.region {
        Some(rect) => surface.capture_region(rect)?,
        None => surface.capture_full_frame()?,
    };
    let Some(still) = still else {
        return Err("nothing to capture (empty image or degenerate region)".into());
    };
    fs::write(&args.out, &still.bytes)?;
    println!(
        "wrote {}x{} still to {}",
        still.width,
        still.height,
        args.out.display()
    );
    Ok(())
}

// ── watch ─────────────────────────────────────────────────────────────

fn run_watch(args: &WatchArgs) -> CliResult<()> {
    let mut config = args.shared.load_config()?;
    if let Some(fps) = args.fps {
        config.detection_fps = fps;
    }
    let mut source = ImageFileSource::open(&args.images[..])?;
    if let Some(display) = config.display {
        source.set_display(display);
    }
    let mut clock = PacedClock::new(config.detection_fps)?;
    let mut scanner = Scanner::new(source, &config);
    scanner.start_continuous(&mut clock)?;

    for frame in 0..args.frames {
        let Some(fired) = clock.wait_next() else {
            log::warn!("detection loop halted after {frame} frame(s)");
            break;
        };
        if scanner.on_frame(&mut clock, fired) == Some(PassOutcome::Published) {
            if let Some(region) = scanner.latest_region() {
                let line = serde_json::json!({ "frame": frame, "region": &*region });
                println!("{line}");
            }
        }
    }
    scanner.stop_continuous(&mut clock);
    Ok(())
}
