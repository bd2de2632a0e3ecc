use super::metrics::RunMetrics;
use super::report::{BenchmarkSummary, ConfigSnapshot};
use super::run::{BenchmarkRun, RunEvent, RunOutcome};
use super::sampler::{ResourceSampler, ResourceSnapshot};
use crate::app::{start_preview, PreviewSession};
use crate::capture::CaptureStack;
use crate::config::{BenchmarkConfig, PreviewConfig, ViewerConfig};
use crate::error::{Result, ViewerError};
use crate::event_loop::EventLoop;
use crate::lifecycle::{LifecycleController, LifecycleState, ShutdownFlag};
use crate::render::GraphicsStack;
use chrono::Utc;
use tokio::time::Instant;
use tracing::{info, warn};

/// Progress reported by [`BenchmarkOrchestrator::run_all_with`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunProgress<'a> {
    /// Run `run_id` of `total` is about to open the camera
    Started { run_id: u32, total: u32 },
    Finished(&'a RunMetrics),
}

/// Runs the preview repeatedly and measures display FPS, CPU and memory
pub struct BenchmarkOrchestrator<C: CaptureStack, G: GraphicsStack, R: ResourceSampler> {
    preview: PreviewConfig,
    benchmark: BenchmarkConfig,
    capture: C,
    graphics: G,
    sampler: R,
    lifecycle: LifecycleController,
}

impl<C, G, R> BenchmarkOrchestrator<C, G, R>
where
    C: CaptureStack,
    G: GraphicsStack,
    R: ResourceSampler,
{
    pub fn new(
        config: &ViewerConfig,
        capture: C,
        graphics: G,
        sampler: R,
        shutdown: ShutdownFlag,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            preview: config.preview,
            benchmark: config.benchmark.clone(),
            capture,
            graphics,
            sampler,
            lifecycle: LifecycleController::new(shutdown, config.lifecycle.poll_interval()),
        })
    }

    pub fn config_snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(&self.preview, &self.benchmark)
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// One warm-up plus measurement window on a fresh camera and surface
    pub async fn run_once(&mut self, run_id: u32) -> Result<RunMetrics> {
        if self.lifecycle.state() != LifecycleState::Running {
            return Err(ViewerError::Interrupted {
                completed_runs: run_id.saturating_sub(1),
            });
        }

        let (camera, surface) = start_preview(&self.capture, &self.graphics, &self.preview)?;
        let surface = surface.instrument();

        let mut event_loop = EventLoop::new();
        let ctx = event_loop.context_mut();
        ctx.schedule_now(RunEvent::RenderFrame);
        ctx.schedule_after(self.benchmark.warmup(), RunEvent::WarmupElapsed);
        ctx.schedule_after(self.lifecycle.poll_interval(), RunEvent::ShutdownPoll);

        let frame_interval = self.preview.frame_interval();
        let measurement = self.benchmark.duration();
        let session = PreviewSession::new(camera, surface, &mut self.lifecycle, frame_interval);
        let mut run = BenchmarkRun::new(run_id, session, &mut self.sampler, measurement);
        event_loop.run(&mut run).await;
        let outcome = run.finish();

        match outcome {
            Some(RunOutcome::Completed(metrics)) => Ok(metrics),
            Some(RunOutcome::Cancelled) => {
                self.lifecycle.mark_stopped();
                Err(ViewerError::Interrupted {
                    completed_runs: run_id.saturating_sub(1),
                })
            }
            Some(RunOutcome::Failed(e)) => Err(e),
            None => Err(ViewerError::system(format!(
                "run {} ended without a result",
                run_id
            ))),
        }
    }

    /// Execute every configured run in order and aggregate the results.
    /// `on_progress` is called before each run starts and after it completes.
    pub async fn run_all_with<F>(&mut self, mut on_progress: F) -> Result<BenchmarkSummary>
    where
        F: FnMut(RunProgress<'_>),
    {
        // Sampling must work before any camera or surface is acquired
        ResourceSnapshot::take(&mut self.sampler, Instant::now())?;

        let total = self.benchmark.runs;
        let mut runs = Vec::with_capacity(total as usize);

        for run_id in 1..=total {
            info!("Run {}/{}", run_id, total);
            on_progress(RunProgress::Started { run_id, total });
            match self.run_once(run_id).await {
                Ok(metrics) => {
                    info!(
                        "Run {}: {:.2} fps, {:.1}% CPU, {:.1} MB RSS",
                        run_id,
                        metrics.fps_display,
                        metrics.cpu_percent_one_core,
                        metrics.mem_rss_megabytes
                    );
                    on_progress(RunProgress::Finished(&metrics));
                    runs.push(metrics);
                }
                Err(e) => {
                    warn!("Benchmark stopped during run {}: {}", run_id, e);
                    return Err(e);
                }
            }
        }

        Ok(BenchmarkSummary::new(Utc::now(), self.config_snapshot(), runs))
    }

    pub async fn run_all(&mut self) -> Result<BenchmarkSummary> {
        self.run_all_with(|_| {}).await
    }
}
