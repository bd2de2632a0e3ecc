use super::surface::{PreviewSurface, SurfaceOptions};
use crate::error::RenderError;

/// Platform graphics layer.
///
/// The first group of operations backs the capability probe: an offscreen
/// surface and a context that are never shown. The second group builds the
/// visible preview surfaces for each render path.
pub trait GraphicsStack {
    type Surface;
    type Context;

    fn create_offscreen_surface(&self) -> Result<Self::Surface, RenderError>;

    fn create_context(&self, surface: &Self::Surface) -> Result<Self::Context, RenderError>;

    fn make_current(&self, context: &Self::Context, surface: &Self::Surface) -> Result<(), RenderError>;

    fn done_current(&self, context: &Self::Context);

    fn destroy_context(&self, context: Self::Context);

    fn destroy_surface(&self, surface: Self::Surface);

    fn create_accelerated_surface(
        &self,
        options: &SurfaceOptions,
    ) -> Result<Box<dyn PreviewSurface>, RenderError>;

    fn create_software_surface(
        &self,
        options: &SurfaceOptions,
    ) -> Result<Box<dyn PreviewSurface>, RenderError>;
}
