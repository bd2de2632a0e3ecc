use crate::capture::{Camera, CameraHandle, CaptureSettings, CaptureStack};
use crate::config::PreviewConfig;
use crate::error::Result;
use crate::render::{GraphicsStack, PreviewSurface, PreviewSurfaceHandle, RendererSelector, WINDOW_TITLE};
use scopeguard::ScopeGuard;
use tracing::{debug, info, warn};

/// Open the camera and apply size, buffering, frame timing and rotation
pub fn open_camera<C: CaptureStack + ?Sized>(
    capture: &C,
    preview: &PreviewConfig,
) -> Result<CameraHandle> {
    let mut camera = scopeguard::guard(capture.open()?, |mut camera| {
        release_camera(camera.as_mut())
    });

    camera.configure(&CaptureSettings::from_preview(preview))?;
    camera.set_transform(preview.transform())?;
    debug!(
        "Camera configured: {}x{} @ {}fps, rotation {}",
        preview.width,
        preview.height,
        preview.framerate,
        preview.rotation.degrees()
    );

    Ok(ScopeGuard::into_inner(camera))
}

/// Close a camera, logging instead of propagating failures
pub fn release_camera(camera: &mut dyn Camera) {
    if let Err(e) = camera.close() {
        warn!("Error closing camera: {}", e);
    }
}

/// Show the surface full-screen, or as a titled window
pub fn show_preview<S: PreviewSurface + ?Sized>(surface: &mut S, fullscreen: bool) -> Result<()> {
    if !fullscreen {
        surface.set_title(WINDOW_TITLE);
    }
    surface.show(fullscreen)?;
    Ok(())
}

/// Open and configure the camera, pick a renderer, show it, start capture.
///
/// On failure everything acquired so far is released before returning.
pub fn start_preview<C, G>(
    capture: &C,
    graphics: &G,
    preview: &PreviewConfig,
) -> Result<(CameraHandle, PreviewSurfaceHandle)>
where
    C: CaptureStack + ?Sized,
    G: GraphicsStack,
{
    let mut camera = scopeguard::guard(open_camera(capture, preview)?, |mut camera| {
        release_camera(camera.as_mut())
    });
    let mut surface = scopeguard::guard(
        RendererSelector::new(graphics).select(preview)?,
        |mut surface| surface.close(),
    );

    show_preview(&mut *surface, preview.fullscreen)?;
    camera.start()?;
    info!(
        "Preview started on {} path ({}x{} @ {}fps)",
        surface.path(),
        preview.width,
        preview.height,
        preview.framerate
    );

    Ok((ScopeGuard::into_inner(camera), ScopeGuard::into_inner(surface)))
}
