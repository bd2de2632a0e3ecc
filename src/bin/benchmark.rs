use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use picamviewer::benchmark::{default_output_path, write_summary, RunProgress};
use picamviewer::capture::{CallLog, MockCaptureStack};
use picamviewer::config::PreviewOverrides;
use picamviewer::environment::check_display;
use picamviewer::logging::{init_logging, LogArgs};
use picamviewer::render::MockGraphicsStack;
use picamviewer::{
    install_signal_handlers, BenchmarkOrchestrator, BenchmarkSummary, CaptureBackend,
    CaptureStack, GraphicsStack, ProcessSampler, ShutdownFlag, ViewerConfig,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "picamviewer-bench")]
#[command(about = "Measure PiCamViewer display FPS, CPU and memory over repeated runs")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "picamviewer.toml", help = "Path to TOML configuration file")]
    config: String,

    #[arg(long, help = "Number of benchmark runs")]
    runs: Option<u32>,

    #[arg(long, value_name = "SECONDS", help = "Warm-up seconds before each measurement")]
    warmup: Option<u32>,

    #[arg(long, value_name = "SECONDS", help = "Measurement seconds per run")]
    duration: Option<u32>,

    #[arg(long, help = "Capture width in pixels")]
    width: Option<u32>,

    #[arg(long, help = "Capture height in pixels")]
    height: Option<u32>,

    #[arg(long, help = "Capture frame rate")]
    framerate: Option<u32>,

    /// Defaults to benchmark-YYYYMMDDTHHMM.json in the working directory
    #[arg(short, long, help = "Path of the JSON results file")]
    output: Option<PathBuf>,

    #[arg(long, help = "Use simulated camera and display (no hardware required)")]
    simulate: bool,

    #[command(flatten)]
    log: LogArgs,
}

impl Args {
    fn apply(&self, config: &mut ViewerConfig) {
        config.preview.apply(&PreviewOverrides {
            width: self.width,
            height: self.height,
            framerate: self.framerate,
            ..PreviewOverrides::default()
        });

        if let Some(runs) = self.runs {
            config.benchmark.runs = runs;
        }
        if let Some(warmup) = self.warmup {
            config.benchmark.warmup_seconds = warmup;
        }
        if let Some(duration) = self.duration {
            config.benchmark.duration_seconds = duration;
        }
    }

    fn output_path(&self, config: &ViewerConfig) -> PathBuf {
        self.output
            .clone()
            .or_else(|| config.benchmark.output.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| default_output_path(Utc::now()))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log);

    info!("Starting PiCamViewer benchmark v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args).await {
        error!("Benchmark failed: {}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(e.exit_code());
    }

    Ok(())
}

async fn run(args: &Args) -> picamviewer::Result<()> {
    let mut config = ViewerConfig::load_from_file(&args.config)?;
    args.apply(&mut config);
    config.validate()?;

    let shutdown = ShutdownFlag::new();
    install_signal_handlers(&shutdown)?;

    let summary = if args.simulate {
        info!("Simulation mode - using mock camera and graphics stacks");
        let log = CallLog::bounded(64);
        let capture = MockCaptureStack::new(CaptureBackend::Libcamera, log.clone());
        let graphics = MockGraphicsStack::new(log);
        benchmark(&config, capture, graphics, shutdown).await?
    } else {
        check_display(config.display.name.as_deref())?;
        benchmark_hardware(&config, shutdown).await?
    };

    print_summary(&summary);

    let path = args.output_path(&config);
    write_summary(&summary, &path)?;
    println!("\nResults written to {}", path.display());
    Ok(())
}

async fn benchmark<C, G>(
    config: &ViewerConfig,
    capture: C,
    graphics: G,
    shutdown: ShutdownFlag,
) -> picamviewer::Result<BenchmarkSummary>
where
    C: CaptureStack,
    G: GraphicsStack,
{
    let sampler = ProcessSampler::new()?;
    let mut orchestrator = BenchmarkOrchestrator::new(config, capture, graphics, sampler, shutdown)?;

    println!(
        "Benchmarking {}x{} @ {} fps: {} run(s), {}s warm-up, {}s measurement",
        config.preview.width,
        config.preview.height,
        config.preview.framerate,
        config.benchmark.runs,
        config.benchmark.warmup_seconds,
        config.benchmark.duration_seconds
    );

    orchestrator.run_all_with(print_progress).await
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
async fn benchmark_hardware(
    config: &ViewerConfig,
    shutdown: ShutdownFlag,
) -> picamviewer::Result<BenchmarkSummary> {
    use picamviewer::detect_capture_stack;
    use picamviewer::render::GstGraphicsStack;

    let capture = detect_capture_stack()?;
    benchmark(config, capture, GstGraphicsStack::new(), shutdown).await
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
async fn benchmark_hardware(
    _config: &ViewerConfig,
    _shutdown: ShutdownFlag,
) -> picamviewer::Result<BenchmarkSummary> {
    Err(picamviewer::ViewerError::CaptureStackUnavailable {
        details: "built without the `hardware` feature (use --simulate to run without a camera)"
            .to_string(),
    })
}

fn print_progress(progress: RunProgress<'_>) {
    match progress {
        RunProgress::Started { run_id, total } => println!("Run {}/{} …", run_id, total),
        RunProgress::Finished(metrics) => println!(
            "  FPS={:.2}  CPU={:.1}%  MEM={:.1} MB",
            metrics.fps_display, metrics.cpu_percent_one_core, metrics.mem_rss_megabytes
        ),
    }
}

fn print_summary(summary: &BenchmarkSummary) {
    println!("\n=== Summary ===");
    println!("Mean FPS:   {:.2}", summary.fps_mean);
    println!("Median FPS: {:.2}", summary.fps_median);
    println!("Stddev FPS: {:.2}", summary.fps_stddev);
    println!("P95 FPS:    {:.2}", summary.fps_p95);
    println!("P99 FPS:    {:.2}", summary.fps_p99);
}
