use crate::capture::{CaptureBackend, CaptureStack};
use crate::config::ViewerConfig;
use crate::error::Result;
use crate::lifecycle::{LifecycleController, LifecycleState, ShutdownFlag};
use crate::render::GraphicsStack;

/// Interactive preview application: one camera, one surface, run until signalled
pub struct ViewerOrchestrator<C: CaptureStack, G: GraphicsStack> {
    pub(super) config: ViewerConfig,
    pub(super) capture: C,
    pub(super) graphics: G,
    pub(super) lifecycle: LifecycleController,
}

impl<C: CaptureStack, G: GraphicsStack> ViewerOrchestrator<C, G> {
    /// Create a new orchestrator with the given configuration
    pub fn new(config: ViewerConfig, capture: C, graphics: G, shutdown: ShutdownFlag) -> Result<Self> {
        config.validate()?;
        let lifecycle = LifecycleController::new(shutdown, config.lifecycle.poll_interval());

        Ok(Self {
            config,
            capture,
            graphics,
            lifecycle,
        })
    }

    pub fn backend(&self) -> CaptureBackend {
        self.capture.backend()
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }
}
