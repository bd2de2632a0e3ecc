use super::interface::{CaptureBackend, CaptureStack};
use crate::error::{Result, ViewerError};
use tracing::info;

/// Choose the capture backend, preferring libcamera over the legacy stack
pub fn select_backend(libcamera_available: bool, legacy_available: bool) -> Result<CaptureBackend> {
    if libcamera_available {
        info!("libcamera stack detected");
        Ok(CaptureBackend::Libcamera)
    } else if legacy_available {
        info!("Legacy V4L2 camera stack detected");
        Ok(CaptureBackend::Legacy)
    } else {
        Err(ViewerError::CaptureStackUnavailable {
            details: "neither the libcamera nor the legacy camera stack was found".to_string(),
        })
    }
}

/// Probe the device for an installed capture stack
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn detect_capture_stack() -> Result<Box<dyn CaptureStack>> {
    use super::gst::GstCaptureStack;

    let backend = select_backend(
        GstCaptureStack::is_available(CaptureBackend::Libcamera),
        GstCaptureStack::is_available(CaptureBackend::Legacy),
    )?;

    Ok(Box::new(GstCaptureStack::new(backend)))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn detect_capture_stack() -> Result<Box<dyn CaptureStack>> {
    Err(ViewerError::CaptureStackUnavailable {
        details: "built without the `hardware` feature (use --simulate to run without a camera)"
            .to_string(),
    })
}
