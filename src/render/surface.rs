use super::instrument::InstrumentedSurface;
use crate::config::PreviewConfig;
use crate::error::RenderError;
use crate::frame::Frame;
use serde::Serialize;
use std::fmt;

/// Rendering technique chosen for the preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPath {
    /// OpenGL/GPU-backed surface
    Accelerated,
    /// CPU-rendered surface
    Software,
}

impl fmt::Display for RenderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderPath::Accelerated => write!(f, "accelerated"),
            RenderPath::Software => write!(f, "software"),
        }
    }
}

/// Geometry and pacing of a preview surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceOptions {
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
    pub keep_aspect_ratio: bool,
}

impl SurfaceOptions {
    pub fn from_preview(preview: &PreviewConfig) -> Self {
        Self {
            width: preview.width,
            height: preview.height,
            framerate: preview.framerate,
            keep_aspect_ratio: true,
        }
    }
}

/// Something the preview can draw camera frames onto
pub trait PreviewSurface {
    fn show(&mut self, fullscreen: bool) -> Result<(), RenderError>;

    fn set_title(&mut self, title: &str);

    /// Present one frame. Returns only after the frame was handed to the display.
    fn render(&mut self, frame: &Frame) -> Result<(), RenderError>;

    fn close(&mut self);
}

impl<S: PreviewSurface + ?Sized> PreviewSurface for Box<S> {
    fn show(&mut self, fullscreen: bool) -> Result<(), RenderError> {
        (**self).show(fullscreen)
    }

    fn set_title(&mut self, title: &str) {
        (**self).set_title(title)
    }

    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        (**self).render(frame)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Preview surface together with the path it was built for
pub struct PreviewSurfaceHandle {
    path: RenderPath,
    surface: Box<dyn PreviewSurface>,
}

impl PreviewSurfaceHandle {
    pub fn new(path: RenderPath, surface: Box<dyn PreviewSurface>) -> Self {
        Self { path, surface }
    }

    pub fn path(&self) -> RenderPath {
        self.path
    }

    /// Wrap in a frame-counting proxy
    pub fn instrument(self) -> InstrumentedSurface<Self> {
        InstrumentedSurface::new(self)
    }
}

impl fmt::Debug for PreviewSurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewSurfaceHandle")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl PreviewSurface for PreviewSurfaceHandle {
    fn show(&mut self, fullscreen: bool) -> Result<(), RenderError> {
        self.surface.show(fullscreen)
    }

    fn set_title(&mut self, title: &str) {
        self.surface.set_title(title)
    }

    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        self.surface.render(frame)
    }

    fn close(&mut self) {
        self.surface.close()
    }
}
