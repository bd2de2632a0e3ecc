use anyhow::Result;
use clap::Parser;
use picamviewer::capture::{CallLog, MockCaptureStack};
use picamviewer::config::PreviewOverrides;
use picamviewer::environment::check_display;
use picamviewer::logging::{init_logging, LogArgs};
use picamviewer::render::MockGraphicsStack;
use picamviewer::{
    install_signal_handlers, CaptureBackend, Rotation, ShutdownFlag, ViewerConfig,
    ViewerOrchestrator,
};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "picamviewer")]
#[command(about = "Full-screen Raspberry Pi camera preview")]
#[command(version)]
#[command(long_about = "Shows a live preview of the Raspberry Pi camera. Uses GPU-accelerated \
rendering when an OpenGL context can be created and falls back to software rendering otherwise. \
On the legacy camera stack the driver's own overlay preview is used. Stops cleanly on SIGINT/SIGTERM.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "picamviewer.toml", help = "Path to TOML configuration file")]
    config: String,

    #[arg(long, help = "Capture width in pixels")]
    width: Option<u32>,

    #[arg(long, help = "Capture height in pixels")]
    height: Option<u32>,

    #[arg(long, help = "Capture frame rate")]
    framerate: Option<u32>,

    #[arg(long, overrides_with = "no_fullscreen", help = "Show the preview full screen")]
    fullscreen: bool,

    #[arg(long, overrides_with = "fullscreen", help = "Show the preview in a window")]
    no_fullscreen: bool,

    #[arg(long, value_parser = parse_rotation, help = "Rotation in degrees: 0, 90, 180 or 270")]
    rotation: Option<Rotation>,

    /// X display, e.g. ":0"
    #[arg(long, value_name = "DISPLAY", help = "X display to render on (sets DISPLAY)")]
    display: Option<String>,

    /// Run against mock camera and graphics stacks
    #[arg(long, help = "Use simulated camera and display (no hardware required)")]
    simulate: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the preview")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    #[command(flatten)]
    log: LogArgs,
}

impl Args {
    fn overrides(&self) -> PreviewOverrides {
        let fullscreen = match (self.fullscreen, self.no_fullscreen) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };

        PreviewOverrides {
            width: self.width,
            height: self.height,
            framerate: self.framerate,
            rotation: self.rotation,
            fullscreen,
        }
    }
}

fn parse_rotation(value: &str) -> std::result::Result<Rotation, String> {
    let degrees: u16 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number of degrees", value))?;
    Rotation::try_from(degrees).map_err(|e| e.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        println!("# PiCamViewer Configuration File");
        println!("# This is the default configuration with all available options");
        println!();
        println!("{}", ViewerConfig::default_toml()?);
        return Ok(());
    }

    init_logging(&args.log);

    info!("Starting PiCamViewer v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    match run(&args).await {
        Ok(exit_code) => {
            info!("PiCamViewer exited with code: {}", exit_code);
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("PiCamViewer failed: {}", e);
            eprintln!("{}", e.user_message());
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(args: &Args) -> picamviewer::Result<i32> {
    let mut config = ViewerConfig::load_from_file(&args.config)?;
    config.preview.apply(&args.overrides());

    if args.validate_config {
        config.validate()?;
        println!("✓ Configuration is valid");
        return Ok(0);
    }

    let shutdown = ShutdownFlag::new();
    install_signal_handlers(&shutdown)?;

    if args.simulate {
        info!("Simulation mode - using mock camera and graphics stacks");
        let log = CallLog::bounded(64);
        let capture = MockCaptureStack::new(CaptureBackend::Libcamera, log.clone());
        let graphics = MockGraphicsStack::new(log);
        let mut orchestrator = ViewerOrchestrator::new(config, capture, graphics, shutdown)?;
        return orchestrator.run().await;
    }

    let display = args.display.as_deref().or(config.display.name.as_deref());
    check_display(display)?;

    run_hardware(config, shutdown).await
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
async fn run_hardware(config: ViewerConfig, shutdown: ShutdownFlag) -> picamviewer::Result<i32> {
    use picamviewer::detect_capture_stack;
    use picamviewer::render::GstGraphicsStack;

    let capture = detect_capture_stack()?;
    let mut orchestrator =
        ViewerOrchestrator::new(config, capture, GstGraphicsStack::new(), shutdown)?;
    info!("Capture stack: {}", orchestrator.backend());
    orchestrator.run().await
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
async fn run_hardware(_config: ViewerConfig, _shutdown: ShutdownFlag) -> picamviewer::Result<i32> {
    picamviewer::detect_capture_stack().map(|_| 0)
}
