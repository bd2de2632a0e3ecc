mod detect;
#[cfg(all(feature = "hardware", target_os = "linux"))]
mod gst;
mod interface;
pub mod mock;
#[cfg(test)]
mod tests;

pub use detect::{detect_capture_stack, select_backend};
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gst::GstCaptureStack;
pub use interface::{
    Camera, CameraHandle, CaptureBackend, CaptureSettings, CaptureStack, OverlayWindow,
};
pub use mock::{CallLog, MockCamera, MockCaptureStack};
