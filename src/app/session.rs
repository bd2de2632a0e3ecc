use super::types::{PreviewEvent, PreviewStats};
use crate::capture::{Camera, CameraHandle};
use crate::event_loop::{LoopContext, LoopHandler};
use crate::lifecycle::{LifecycleController, LifecycleState};
use crate::render::PreviewSurface;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// A started camera bound to its preview surface.
///
/// Each render tick pulls the newest camera frame and presents it; the
/// shutdown poll hands the camera to the lifecycle controller for teardown.
pub struct PreviewSession<'a, S: PreviewSurface> {
    camera: CameraHandle,
    surface: S,
    lifecycle: &'a mut LifecycleController,
    frame_interval: Duration,
    stats: PreviewStats,
}

impl<'a, S: PreviewSurface> PreviewSession<'a, S> {
    pub fn new(
        camera: CameraHandle,
        surface: S,
        lifecycle: &'a mut LifecycleController,
        frame_interval: Duration,
    ) -> Self {
        Self {
            camera,
            surface,
            lifecycle,
            frame_interval,
            stats: PreviewStats::default(),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn poll_interval(&self) -> Duration {
        self.lifecycle.poll_interval()
    }

    /// False once teardown has begun
    pub fn is_running(&self) -> bool {
        self.lifecycle.state() == LifecycleState::Running
    }

    /// Render the newest camera frame, if any
    pub fn render_tick(&mut self) {
        if !self.is_running() {
            return;
        }

        match self.camera.next_frame() {
            Ok(Some(frame)) => match self.surface.render(&frame) {
                Ok(()) => {
                    self.stats.record_frame_render();
                    trace!("Rendered frame {}", frame.sequence);
                }
                Err(e) => {
                    self.stats.record_render_error();
                    if self.stats.render_errors == 1 {
                        warn!("Failed to render frame {}: {}", frame.sequence, e);
                    } else {
                        debug!("Failed to render frame {}: {}", frame.sequence, e);
                    }
                }
            },
            Ok(None) => self.stats.record_missed_frame(),
            Err(e) => {
                self.stats.record_capture_error();
                if self.stats.capture_errors == 1 {
                    warn!("Failed to read camera frame: {}", e);
                }
            }
        }
    }

    /// Check for a shutdown request; returns true if teardown ran
    pub fn poll_shutdown(&mut self) -> bool {
        let mut exit_requested = false;
        self.lifecycle
            .poll(self.camera.as_mut(), || exit_requested = true);
        exit_requested
    }

    pub fn camera_mut(&mut self) -> &mut dyn Camera {
        self.camera.as_mut()
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn stats(&self) -> &PreviewStats {
        &self.stats
    }

    pub fn into_parts(self) -> (CameraHandle, S, PreviewStats) {
        (self.camera, self.surface, self.stats)
    }
}

impl<S: PreviewSurface> LoopHandler for PreviewSession<'_, S> {
    type Event = PreviewEvent;

    fn handle(&mut self, event: PreviewEvent, ctx: &mut LoopContext<PreviewEvent>) {
        match event {
            PreviewEvent::RenderFrame => {
                if !self.is_running() {
                    return;
                }
                self.render_tick();
                ctx.schedule_after(self.frame_interval, PreviewEvent::RenderFrame);
            }
            PreviewEvent::ShutdownPoll => {
                if self.poll_shutdown() {
                    ctx.quit();
                } else {
                    ctx.schedule_after(self.poll_interval(), PreviewEvent::ShutdownPoll);
                }
            }
        }
    }
}
