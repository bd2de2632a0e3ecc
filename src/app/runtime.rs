use super::session::PreviewSession;
use super::startup::start_preview;
use super::types::{PreviewEvent, PreviewStats};
use super::ViewerOrchestrator;
use crate::capture::{CaptureBackend, CaptureStack};
use crate::error::Result;
use crate::event_loop::{EventLoop, LoopExit};
use crate::render::{GraphicsStack, PreviewSurface};
use tracing::{debug, info, warn};

impl<C: CaptureStack, G: GraphicsStack> ViewerOrchestrator<C, G> {
    /// Run the preview until a shutdown signal, returning the exit code
    pub async fn run(&mut self) -> Result<i32> {
        let preview = self.config.preview;
        info!(
            "Starting {} preview: {}x{} @ {}fps, rotation {}°, fullscreen {}",
            self.capture.backend(),
            preview.width,
            preview.height,
            preview.framerate,
            preview.rotation.degrees(),
            preview.fullscreen
        );

        match self.capture.backend() {
            CaptureBackend::Libcamera => {
                let stats = self.run_render_loop().await?;
                info!(
                    "Preview stopped after {} frames ({} render errors)",
                    stats.frames_rendered, stats.render_errors
                );
            }
            CaptureBackend::Legacy => self.run_overlay_preview().await?,
        }

        Ok(0)
    }

    /// Drive the preview from the event loop until teardown
    async fn run_render_loop(&mut self) -> Result<PreviewStats> {
        let preview = self.config.preview;
        let (camera, surface) = start_preview(&self.capture, &self.graphics, &preview)?;
        info!("Preview running. Press Ctrl-C to stop.");

        let mut event_loop = EventLoop::new();
        let ctx = event_loop.context_mut();
        ctx.schedule_now(PreviewEvent::RenderFrame);
        ctx.schedule_after(self.lifecycle.poll_interval(), PreviewEvent::ShutdownPoll);

        let mut session = PreviewSession::new(
            camera,
            surface,
            &mut self.lifecycle,
            preview.frame_interval(),
        );
        let exit = event_loop.run(&mut session).await;
        if exit == LoopExit::Drained {
            warn!("Preview loop ran out of events");
        }

        let (_camera, mut surface, stats) = session.into_parts();
        surface.close();
        self.lifecycle.mark_stopped();
        debug!("Render success rate: {:.3}", stats.render_success_rate());

        Ok(stats)
    }
}
