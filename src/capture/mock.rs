use super::interface::{
    Camera, CameraHandle, CaptureBackend, CaptureSettings, CaptureStack, OverlayWindow,
};
use crate::error::CaptureError;
use crate::frame::{Frame, PixelFormat};
use crate::transform::RenderTransform;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Shared, ordered journal of calls made on mock devices
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<VecDeque<String>>>,
    limit: Option<usize>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Journal that keeps only the most recent `limit` entries
    pub fn bounded(limit: usize) -> Self {
        Self {
            entries: Arc::default(),
            limit: Some(limit.max(1)),
        }
    }

    pub fn record(&self, entry: impl Into<String>) {
        let mut entries = self.entries.lock();
        if let Some(limit) = self.limit {
            while entries.len() >= limit {
                entries.pop_front();
            }
        }
        entries.push_back(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Index of the first entry equal to `entry`
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.lock().iter().position(|e| e == entry)
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.position(entry).is_some()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == entry).count()
    }
}

/// Capture stack that hands out [`MockCamera`]s producing blank frames
#[derive(Debug, Clone)]
pub struct MockCaptureStack {
    backend: CaptureBackend,
    log: CallLog,
    fail_open: bool,
    fail_stop: bool,
}

impl MockCaptureStack {
    pub fn new(backend: CaptureBackend, log: CallLog) -> Self {
        Self {
            backend,
            log,
            fail_open: false,
            fail_stop: false,
        }
    }

    pub fn with_failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn with_failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }
}

impl CaptureStack for MockCaptureStack {
    fn backend(&self) -> CaptureBackend {
        self.backend
    }

    fn open(&self) -> Result<CameraHandle, CaptureError> {
        self.log.record("camera.open");
        if self.fail_open {
            return Err(CaptureError::DeviceOpen {
                details: "mock camera is configured to fail".to_string(),
            });
        }

        let mut camera = MockCamera::new(self.backend, self.log.clone());
        camera.fail_stop = self.fail_stop;
        Ok(Box::new(camera))
    }
}

#[derive(Debug)]
pub struct MockCamera {
    backend: CaptureBackend,
    log: CallLog,
    settings: Option<CaptureSettings>,
    transform: RenderTransform,
    // one shared pixel buffer, reused by every frame
    pixels: Arc<Vec<u8>>,
    sequence: u64,
    capturing: bool,
    closed: bool,
    fail_stop: bool,
}

impl MockCamera {
    pub fn new(backend: CaptureBackend, log: CallLog) -> Self {
        Self {
            backend,
            log,
            settings: None,
            transform: RenderTransform::IDENTITY,
            pixels: Arc::new(Vec::new()),
            sequence: 0,
            capturing: false,
            closed: false,
            fail_stop: false,
        }
    }

    fn output_size(&self) -> (u32, u32) {
        let (width, height) = self.settings.map(|s| s.size).unwrap_or((0, 0));
        if self.transform.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    fn ensure_open(&self, operation: &str) -> Result<(), CaptureError> {
        if self.closed {
            self.log.record(format!("camera.{}_after_close", operation));
            return Err(CaptureError::Closed);
        }
        Ok(())
    }
}

impl Camera for MockCamera {
    fn configure(&mut self, settings: &CaptureSettings) -> Result<(), CaptureError> {
        self.ensure_open("configure")?;
        let (width, height) = settings.size;
        if width == 0 || height == 0 || settings.frame_duration_limits.0 == 0 {
            return Err(CaptureError::Configuration {
                details: format!("unsupported mode {}x{}", width, height),
            });
        }

        self.log.record(format!("camera.configure {}x{}", width, height));
        self.settings = Some(*settings);
        Ok(())
    }

    fn set_transform(&mut self, transform: RenderTransform) -> Result<(), CaptureError> {
        self.ensure_open("set_transform")?;
        self.log.record(format!(
            "camera.set_transform hflip={} vflip={} transpose={}",
            transform.hflip, transform.vflip, transform.transpose
        ));
        self.transform = transform;
        Ok(())
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        self.ensure_open("start")?;
        if self.settings.is_none() {
            return Err(CaptureError::Configuration {
                details: "camera started before configure".to_string(),
            });
        }

        let (width, height) = self.output_size();
        self.pixels = Arc::new(vec![
            0u8;
            width as usize * height as usize * PixelFormat::Rgbx.bytes_per_pixel()
        ]);
        self.capturing = true;
        self.log.record("camera.start");
        debug!("Mock camera started ({}x{})", width, height);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.log.record("camera.stop");
        self.capturing = false;
        if self.fail_stop {
            return Err(CaptureError::Stream {
                details: "mock camera stop failure".to_string(),
            });
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        self.log.record("camera.close");
        self.capturing = false;
        self.closed = true;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        self.ensure_open("next_frame")?;
        if !self.capturing {
            return Ok(None);
        }

        self.sequence += 1;
        let (width, height) = self.output_size();
        Ok(Some(Frame {
            sequence: self.sequence,
            data: Arc::clone(&self.pixels),
            width,
            height,
            format: PixelFormat::Rgbx,
        }))
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn start_overlay_preview(&mut self, fullscreen: bool) -> Result<(), CaptureError> {
        self.ensure_open("start_preview")?;
        if self.backend != CaptureBackend::Legacy {
            return Err(CaptureError::Unsupported {
                backend: self.backend.to_string(),
            });
        }

        let size = self.settings.map(|s| s.size).ok_or_else(|| CaptureError::Configuration {
            details: "overlay preview started before configure".to_string(),
        })?;

        self.capturing = true;
        self.log
            .record(format!("camera.start_preview {}", OverlayWindow::new(fullscreen, size)));
        Ok(())
    }
}
