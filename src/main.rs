use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use travcam::config::LoggingConfig;
use travcam::{
    CameraController, ChannelListener, Collaborators, FileMediaStore, GrantedPermissions,
    HeadlessSurface, Rotation, ShutdownReason, SimulatedBackend, SimulatedRecorder,
    TravcamConfig, TravcamError,
};

#[derive(Parser, Debug)]
#[command(name = "travcam")]
#[command(about = "Camera session orchestrator with preview, stills and bounded recording")]
#[command(version)]
#[command(long_about = "Drives one camera through preview, still capture and time-bounded \
video recording against a simulated device stack. Host notifications are printed to stdout \
as JSON lines.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "travcam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Render surface width in pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Render surface height in pixels
    #[arg(long, default_value_t = 720)]
    height: u32,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Capture still images
    Photo {
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Record a video, stopped early after the given seconds
    Record {
        #[arg(long, default_value_t = 5)]
        seconds: u64,
    },
    /// Capture a still, rotate the display, record a short clip
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        println!("# Travcam Configuration File");
        println!("# This is the default configuration with all available options");
        println!();
        println!("{}", TravcamConfig::default().to_toml()?);
        return Ok(());
    }

    let config = TravcamConfig::load_from_file(&args.config)?;
    let _guard = init_logging(&args, &config.logging)?;

    info!("Starting Travcam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }
    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let (listener, mut notifications) = ChannelListener::channel();
    let printer = tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            match serde_json::to_string(&notification) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to render notification: {}", e),
            }
        }
    });

    let collaborators = Collaborators {
        backend: Arc::new(SimulatedBackend::default()),
        surface: Arc::new(HeadlessSurface::new()),
        recorder: Box::new(SimulatedRecorder::new()),
        store: Arc::new(FileMediaStore::from_config(&config.storage)),
        listener: Arc::new(listener),
        shutter: None,
    };

    let controller = CameraController::new(config, collaborators, Arc::new(GrantedPermissions))
        .await
        .map_err(|e| {
            error!("Failed to create camera controller: {}", e);
            e
        })?;

    let command = args.command.clone().unwrap_or(Command::Demo);
    let reason = controller
        .run_until(run_command(&controller, &command, args.width, args.height))
        .await;

    let mut exit_code = controller.shutdown().await;
    drop(controller);

    if tokio::time::timeout(Duration::from_secs(1), printer).await.is_err() {
        warn!("Notification printer did not finish");
    }

    if let ShutdownReason::Error(message) = &reason {
        error!("Travcam failed: {}", message);
        exit_code = 1;
    }

    info!("Travcam exited with code: {}", exit_code);
    std::process::exit(exit_code);
}

async fn run_command(
    controller: &CameraController,
    command: &Command,
    width: u32,
    height: u32,
) -> travcam::Result<()> {
    let stream = controller.surface_available(width, height).await?;
    controller.settle().await?;
    info!(
        "Preview running at {} (video {}, sensor {} deg)",
        stream.preview_size, stream.video_size, stream.sensor_orientation
    );

    match command {
        Command::Photo { count } => {
            for n in 1..=*count {
                capture_one(controller, n).await?;
            }
        }
        Command::Record { seconds } => record(controller, Duration::from_secs(*seconds)).await?,
        Command::Demo => {
            capture_one(controller, 1).await?;
            controller.orientation_changed(95);
            controller.set_display_rotation(Rotation::Rotation90).await?;
            capture_one(controller, 2).await?;
            record(controller, Duration::from_secs(3)).await?;
        }
    }

    let status = serde_json::to_string(&controller.status())
        .map_err(|e| TravcamError::system(format!("Failed to render status: {}", e)))?;
    println!("{}", status);
    Ok(())
}

async fn capture_one(controller: &CameraController, n: u32) -> travcam::Result<()> {
    if controller.capture_image().await? {
        info!("Capture {} requested", n);
    } else {
        warn!("Capture {} was not accepted", n);
    }
    controller.settle().await
}

async fn record(controller: &CameraController, length: Duration) -> travcam::Result<()> {
    if !controller.start_video_recording().await? {
        return Err(TravcamError::recorder("recording did not start"));
    }
    controller.settle().await?;

    tokio::time::sleep(length).await;
    if controller.is_video_recording_running() {
        controller.stop_video_recording().await?;
    }
    controller.settle().await
}

fn init_logging(args: &Args, logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("travcam={}", log_level)));

    // Logs go to stderr; stdout carries the JSON notification stream
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .boxed()
        }
    };

    let (file_layer, guard) = match &logging.file {
        Some(file) => {
            let path = Path::new(file);
            let directory = path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Log file path '{}' has no file name", file))?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}
