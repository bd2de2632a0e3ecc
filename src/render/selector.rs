use super::probe::CapabilityProbe;
use super::stack::GraphicsStack;
use super::surface::{PreviewSurfaceHandle, RenderPath, SurfaceOptions};
use crate::config::PreviewConfig;
use crate::error::Result;
use tracing::{info, warn};

/// Picks the render path for a preview, falling back to software
pub struct RendererSelector<'a, G: GraphicsStack> {
    stack: &'a G,
}

impl<'a, G: GraphicsStack> RendererSelector<'a, G> {
    pub fn new(stack: &'a G) -> Self {
        Self { stack }
    }

    /// Build the preview surface.
    ///
    /// The accelerated surface is used when the probe succeeds and the
    /// surface constructs; otherwise the software surface is built. Only a
    /// software construction failure is returned as an error.
    pub fn select(&self, preview: &PreviewConfig) -> Result<PreviewSurfaceHandle> {
        let options = SurfaceOptions::from_preview(preview);
        let capability = CapabilityProbe::new(self.stack).probe();

        if capability.accelerated {
            match self.stack.create_accelerated_surface(&options) {
                Ok(surface) => {
                    info!("Using accelerated (OpenGL/GPU) renderer");
                    return Ok(PreviewSurfaceHandle::new(RenderPath::Accelerated, surface));
                }
                Err(e) => {
                    warn!(
                        "Accelerated preview init failed ({}), falling back to software renderer",
                        e
                    );
                }
            }
        }

        let surface = self.stack.create_software_surface(&options)?;
        info!("Using software renderer");
        Ok(PreviewSurfaceHandle::new(RenderPath::Software, surface))
    }
}
