use super::startup::{open_camera, release_camera};
use super::ViewerOrchestrator;
use crate::capture::CaptureStack;
use crate::error::Result;
use crate::render::GraphicsStack;
use tracing::info;

impl<C: CaptureStack, G: GraphicsStack> ViewerOrchestrator<C, G> {
    /// The legacy stack draws its own overlay preview; this side only waits
    /// for the shutdown flag and then tears the camera down.
    pub(super) async fn run_overlay_preview(&mut self) -> Result<()> {
        let preview = self.config.preview;
        let mut camera = open_camera(&self.capture, &preview)?;

        if let Err(e) = camera.start_overlay_preview(preview.fullscreen) {
            release_camera(camera.as_mut());
            return Err(e.into());
        }
        info!("Legacy preview running. Press Ctrl-C to stop.");

        let interval = self.config.lifecycle.legacy_poll_interval();
        self.lifecycle
            .wait_for_shutdown(camera.as_mut(), interval)
            .await;

        info!("Legacy preview stopped");
        Ok(())
    }
}
