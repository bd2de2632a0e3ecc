use super::metrics::RunMetrics;
use super::phase::{PhaseEvent, RunPhase};
use super::sampler::{ResourceSampler, ResourceSnapshot};
use crate::app::PreviewSession;
use crate::error::ViewerError;
use crate::event_loop::{LoopContext, LoopHandler};
use crate::render::{InstrumentedSurface, PreviewSurface, PreviewSurfaceHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Events of one benchmark run's loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    RenderFrame,
    ShutdownPoll,
    WarmupElapsed,
    MeasurementElapsed,
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunMetrics),
    /// Shutdown was requested; in-flight measurements are discarded
    Cancelled,
    Failed(ViewerError),
}

/// Warm-up then measure one preview session, sampling resources at the
/// window boundaries.
pub struct BenchmarkRun<'a, R: ResourceSampler> {
    run_id: u32,
    session: PreviewSession<'a, InstrumentedSurface<PreviewSurfaceHandle>>,
    sampler: &'a mut R,
    measurement: Duration,
    phase: RunPhase,
    window_start: Option<ResourceSnapshot>,
    outcome: Option<RunOutcome>,
}

impl<'a, R: ResourceSampler> BenchmarkRun<'a, R> {
    pub fn new(
        run_id: u32,
        session: PreviewSession<'a, InstrumentedSurface<PreviewSurfaceHandle>>,
        sampler: &'a mut R,
        measurement: Duration,
    ) -> Self {
        Self {
            run_id,
            session,
            sampler,
            measurement,
            phase: RunPhase::Warmup,
            window_start: None,
            outcome: None,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Close the preview surface and hand back the run's outcome
    pub fn finish(mut self) -> Option<RunOutcome> {
        self.session.surface_mut().close();
        self.outcome
    }

    fn begin_measuring(&mut self, ctx: &mut LoopContext<RunEvent>) {
        let Some(next) = self.phase.advance(PhaseEvent::WarmupElapsed) else {
            warn!("Ignoring warm-up timer in {:?} phase", self.phase);
            return;
        };

        match ResourceSnapshot::take(self.sampler, ctx.now()) {
            Ok(snapshot) => {
                self.window_start = Some(snapshot);
                self.session.surface_mut().start_measuring();
                self.phase = next;
                ctx.schedule_after(self.measurement, RunEvent::MeasurementElapsed);
                debug!("Run {}: warm-up complete, measuring", self.run_id);
            }
            Err(e) => self.fail(e, ctx),
        }
    }

    fn finish_measuring(&mut self, ctx: &mut LoopContext<RunEvent>) {
        let Some(next) = self.phase.advance(PhaseEvent::MeasurementElapsed) else {
            warn!("Ignoring measurement timer in {:?} phase", self.phase);
            return;
        };
        self.phase = next;

        let frames = self.session.surface_mut().stop_measuring();
        let outcome = match (
            self.window_start.take(),
            ResourceSnapshot::take(self.sampler, ctx.now()),
        ) {
            (Some(start), Ok(end)) => {
                RunOutcome::Completed(RunMetrics::from_window(self.run_id, &start, &end, frames))
            }
            (None, _) => RunOutcome::Failed(ViewerError::system("measurement window never started")),
            (_, Err(e)) => RunOutcome::Failed(e),
        };

        self.release_capture();
        self.outcome = Some(outcome);
        ctx.quit();
    }

    fn fail(&mut self, error: ViewerError, ctx: &mut LoopContext<RunEvent>) {
        warn!("Run {} failed: {}", self.run_id, error);
        self.phase = RunPhase::Done;
        self.release_capture();
        self.outcome = Some(RunOutcome::Failed(error));
        ctx.quit();
    }

    fn release_capture(&mut self) {
        let camera = self.session.camera_mut();
        if let Err(e) = camera.stop() {
            warn!("Error stopping camera: {}", e);
        }
        if let Err(e) = camera.close() {
            warn!("Error closing camera: {}", e);
        }
    }
}

impl<R: ResourceSampler> LoopHandler for BenchmarkRun<'_, R> {
    type Event = RunEvent;

    fn handle(&mut self, event: RunEvent, ctx: &mut LoopContext<RunEvent>) {
        match event {
            RunEvent::RenderFrame => {
                if self.phase.is_done() || !self.session.is_running() {
                    return;
                }
                self.session.render_tick();
                ctx.schedule_after(self.session.frame_interval(), RunEvent::RenderFrame);
            }
            RunEvent::ShutdownPoll => {
                if self.phase.is_done() {
                    return;
                }
                if self.session.poll_shutdown() {
                    if self.session.surface_mut().is_measuring() {
                        self.session.surface_mut().stop_measuring();
                    }
                    info!("Run {} cancelled, discarding measurements", self.run_id);
                    self.window_start = None;
                    self.outcome = Some(RunOutcome::Cancelled);
                    ctx.quit();
                } else {
                    ctx.schedule_after(self.session.poll_interval(), RunEvent::ShutdownPoll);
                }
            }
            RunEvent::WarmupElapsed => self.begin_measuring(ctx),
            RunEvent::MeasurementElapsed => self.finish_measuring(ctx),
        }
    }
}
