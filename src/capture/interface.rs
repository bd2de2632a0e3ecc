use crate::config::PreviewConfig;
use crate::error::CaptureError;
use crate::frame::Frame;
use crate::transform::RenderTransform;
use std::fmt;

/// Camera software stack present on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureBackend {
    /// libcamera (Bullseye and later)
    Libcamera,
    /// Legacy V4L2/MMAL camera driver (Buster)
    Legacy,
}

impl fmt::Display for CaptureBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureBackend::Libcamera => write!(f, "libcamera"),
            CaptureBackend::Legacy => write!(f, "legacy"),
        }
    }
}

/// Preview stream configuration handed to the camera before start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub size: (u32, u32),
    pub buffer_count: u32,
    /// Minimum and maximum frame duration in microseconds
    pub frame_duration_limits: (u64, u64),
}

impl CaptureSettings {
    pub fn from_preview(preview: &PreviewConfig) -> Self {
        Self {
            size: (preview.width, preview.height),
            buffer_count: preview.buffer_count,
            frame_duration_limits: preview.frame_duration_limits(),
        }
    }
}

/// Placement of the legacy stack's own overlay preview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayWindow {
    Fullscreen,
    /// Top-left corner and size, in screen pixels
    Window { x: i32, y: i32, width: u32, height: u32 },
}

impl OverlayWindow {
    /// Full screen, or a window at the origin sized to the capture
    pub fn new(fullscreen: bool, size: (u32, u32)) -> Self {
        if fullscreen {
            OverlayWindow::Fullscreen
        } else {
            OverlayWindow::Window {
                x: 0,
                y: 0,
                width: size.0,
                height: size.1,
            }
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        matches!(self, OverlayWindow::Fullscreen)
    }
}

impl fmt::Display for OverlayWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayWindow::Fullscreen => write!(f, "fullscreen"),
            OverlayWindow::Window {
                x,
                y,
                width,
                height,
            } => write!(f, "window={},{},{}x{}", x, y, width, height),
        }
    }
}

/// An opened camera.
///
/// Implementations are driven from the preview loop only: frames are pulled
/// with [`Camera::next_frame`] on each render tick, never pushed from another
/// thread.
pub trait Camera {
    fn configure(&mut self, settings: &CaptureSettings) -> Result<(), CaptureError>;

    fn set_transform(&mut self, transform: RenderTransform) -> Result<(), CaptureError>;

    fn start(&mut self) -> Result<(), CaptureError>;

    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Release the underlying device. The handle is unusable afterwards.
    fn close(&mut self) -> Result<(), CaptureError>;

    /// Latest frame, `None` when nothing new is ready yet
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError>;

    fn is_capturing(&self) -> bool;

    /// Start the stack's own overlay preview; only the legacy stack has one.
    /// Requires `configure`; a windowed preview is sized to the capture.
    fn start_overlay_preview(&mut self, _fullscreen: bool) -> Result<(), CaptureError> {
        Err(CaptureError::Unsupported {
            backend: CaptureBackend::Libcamera.to_string(),
        })
    }
}

pub type CameraHandle = Box<dyn Camera>;

/// Factory for camera handles of one backend
pub trait CaptureStack {
    fn backend(&self) -> CaptureBackend;

    fn open(&self) -> Result<CameraHandle, CaptureError>;
}

impl<T: CaptureStack + ?Sized> CaptureStack for Box<T> {
    fn backend(&self) -> CaptureBackend {
        (**self).backend()
    }

    fn open(&self) -> Result<CameraHandle, CaptureError> {
        (**self).open()
    }
}
