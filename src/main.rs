use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};

use screenframer::{
    composition::{CancelToken, ExportEngine},
    config::{Config, OutputFormat},
    frame::{FrameImage, PresetRegistry},
    geometry::FitMode,
};

#[derive(Parser)]
#[command(
    name = "screenframer",
    version,
    about = "Composite screen recordings into device-frame artwork",
    long_about = "Screenframer places a finished screen recording behind device-frame artwork, locating the transparent screen region automatically and exporting an encoded video with the footage realistically inset."
)]
struct Cli {
    /// Source video file (a finished, closed recording)
    #[arg(short, long)]
    input: PathBuf,

    /// Output video file path
    #[arg(short, long)]
    output: PathBuf,

    /// Frame artwork PNG with a transparent screen hole
    #[arg(short, long)]
    frame: Option<PathBuf>,

    /// Frame preset id (see --list-presets)
    #[arg(short, long)]
    preset: Option<String>,

    /// List available frame presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Fit policy for the video inside the screen region
    #[arg(long, value_enum)]
    fit: Option<FitMode>,

    /// Zoom percentage (100 = nominal fit)
    #[arg(long)]
    zoom: Option<f64>,

    /// Horizontal offset in percent of half the screen width (-100..100)
    #[arg(long)]
    offset_x: Option<f64>,

    /// Vertical offset in percent of half the screen height (-100..100)
    #[arg(long)]
    offset_y: Option<f64>,

    /// Trim start in seconds
    #[arg(long)]
    trim_start: Option<f64>,

    /// Trim end in seconds
    #[arg(long)]
    trim_end: Option<f64>,

    /// Output container format (inferred from the output extension when omitted)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Canvas width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Canvas height in pixels (used only when no frame artwork is set)
    #[arg(long)]
    height: Option<u32>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    let registry = PresetRegistry::builtin();

    if cli.list_presets {
        for preset in registry.iter() {
            println!("{:<18} {}", preset.id, preset.display_label);
        }
        return Ok(());
    }

    info!("Starting Screenframer v{}", env!("CARGO_PKG_VERSION"));
    info!("Input: {:?}", cli.input);
    info!("Output: {:?}", cli.output);

    // Load configuration and apply CLI overrides
    let mut config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path)?
        }
        None => Config::default(),
    };

    if let Some(fit) = cli.fit {
        config.placement.fit_mode = fit;
    }
    if let Some(zoom) = cli.zoom {
        config.placement.zoom_percent = zoom;
    }
    if let Some(x) = cli.offset_x {
        config.placement.offset_x_percent = x;
    }
    if let Some(y) = cli.offset_y {
        config.placement.offset_y_percent = y;
    }
    if let Some(start) = cli.trim_start {
        config.trim.start_seconds = Some(start);
    }
    if let Some(end) = cli.trim_end {
        config.trim.end_seconds = Some(end);
    }
    if let Some(width) = cli.width {
        config.output.canvas_width = width;
    }
    if let Some(height) = cli.height {
        config.output.canvas_height = height;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    } else {
        match cli.output.extension().and_then(|e| e.to_str()) {
            Some("mov") => config.output.format = OutputFormat::Mov,
            Some("mp4") => config.output.format = OutputFormat::Mp4,
            _ => {}
        }
    }
    config.validate()?;

    // Resolve frame artwork: explicit path, then preset artwork, then none.
    let frame_path = registry.resolve_image_path(cli.frame.as_deref(), cli.preset.as_deref())?;
    let frame = match &frame_path {
        Some(path) => {
            info!("Frame artwork: {:?}", path);
            Some(FrameImage::load(path)?)
        }
        None => None,
    };

    // Detection runs once per frame selection; failure keeps the fallback.
    let detected = frame.as_ref().and_then(|f| {
        let rect = f.detect_screen_rect();
        if rect.is_none() {
            warn!("No screen hole detected in frame artwork; using the preset rect");
        }
        rect
    });
    let fallback_rect = registry.default_screen_rect(cli.preset.as_deref())?;

    let metadata = screenframer::video::probe(&cli.input).await?;
    let composition = config.resolve(metadata.duration, detected, fallback_rect)?;

    // Ctrl-C cancels the export and removes partial output.
    let cancel = CancelToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Cancellation requested, stopping export...");
            signal_token.cancel();
        }
    });

    let mut engine = ExportEngine::new();
    let encoded = engine
        .export(&cli.input, frame.as_ref(), &composition, &cli.output, &cancel)
        .await
        .map_err(|e| {
            // Surface the user-facing message; the debug chain stays in logs.
            tracing::debug!("Export failed: {:?}", e);
            anyhow::anyhow!(e.user_message())
        })?;

    info!(
        "Done: {:?} ({:.1}s, {} frames)",
        encoded.path, encoded.duration, encoded.frame_count
    );
    Ok(())
}
