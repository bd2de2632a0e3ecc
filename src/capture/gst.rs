use super::interface::{
    Camera, CameraHandle, CaptureBackend, CaptureSettings, CaptureStack, OverlayWindow,
};
use crate::error::CaptureError;
use crate::frame::{Frame, PixelFormat};
use crate::transform::RenderTransform;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use gstreamer_video::prelude::*;
use gstreamer_video::{VideoInfo, VideoOverlay};
use std::path::Path;
use tracing::{debug, info, trace, warn};

const LEGACY_DEVICE: &str = "/dev/video0";

/// Capture stack backed by GStreamer camera sources
#[derive(Debug, Clone)]
pub struct GstCaptureStack {
    backend: CaptureBackend,
}

impl GstCaptureStack {
    pub fn new(backend: CaptureBackend) -> Self {
        Self { backend }
    }

    /// Whether the source element for `backend` is installed
    pub fn is_available(backend: CaptureBackend) -> bool {
        if gstreamer::init().is_err() {
            return false;
        }

        let installed = gstreamer::ElementFactory::find(source_element(backend)).is_some();
        match backend {
            CaptureBackend::Libcamera => installed,
            CaptureBackend::Legacy => installed && Path::new(LEGACY_DEVICE).exists(),
        }
    }
}

fn source_element(backend: CaptureBackend) -> &'static str {
    match backend {
        CaptureBackend::Libcamera => "libcamerasrc",
        CaptureBackend::Legacy => "v4l2src",
    }
}

impl CaptureStack for GstCaptureStack {
    fn backend(&self) -> CaptureBackend {
        self.backend
    }

    fn open(&self) -> Result<CameraHandle, CaptureError> {
        gstreamer::init().map_err(|e| CaptureError::DeviceOpen {
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;

        if gstreamer::ElementFactory::find(source_element(self.backend)).is_none() {
            return Err(CaptureError::DeviceOpen {
                details: format!("GStreamer element {} is not installed", source_element(self.backend)),
            });
        }

        info!("Opened {} camera", self.backend);
        Ok(Box::new(GstCamera::new(self.backend)))
    }
}

struct GstCamera {
    backend: CaptureBackend,
    settings: Option<CaptureSettings>,
    transform: RenderTransform,
    pipeline: Option<Pipeline>,
    appsink: Option<AppSink>,
    sequence: u64,
    capturing: bool,
    closed: bool,
}

impl GstCamera {
    fn new(backend: CaptureBackend) -> Self {
        Self {
            backend,
            settings: None,
            transform: RenderTransform::IDENTITY,
            pipeline: None,
            appsink: None,
            sequence: 0,
            capturing: false,
            closed: false,
        }
    }

    fn source_description(&self) -> String {
        match self.backend {
            CaptureBackend::Libcamera => "libcamerasrc".to_string(),
            CaptureBackend::Legacy => format!("v4l2src device={} io-mode=mmap", LEGACY_DEVICE),
        }
    }

    fn build_pipeline_string(&self, sink: &str) -> Result<String, CaptureError> {
        let settings = self.settings.as_ref().ok_or_else(|| CaptureError::Configuration {
            details: "camera not configured".to_string(),
        })?;
        let (width, height) = settings.size;
        let (frame_us, _) = settings.frame_duration_limits;

        Ok(format!(
            "{} ! video/x-raw,width={},height={},framerate=1000000/{} ! \
             queue max-size-buffers={} leaky=downstream ! \
             videoconvert ! videoflip method={} ! {}",
            self.source_description(),
            width,
            height,
            frame_us,
            settings.buffer_count,
            self.transform.videoflip_method(),
            sink
        ))
    }

    fn launch(&mut self, sink: &str) -> Result<Pipeline, CaptureError> {
        let description = self.build_pipeline_string(sink)?;
        info!("Creating GStreamer pipeline: {}", description);

        gstreamer::parse::launch(&description)
            .map_err(|e| CaptureError::Configuration {
                details: format!("Failed to create pipeline: {}", e),
            })?
            .downcast::<Pipeline>()
            .map_err(|_| CaptureError::Configuration {
                details: "Failed to downcast to Pipeline".to_string(),
            })
    }

    fn play(&mut self, pipeline: Pipeline) -> Result<(), CaptureError> {
        pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| CaptureError::Stream {
                details: format!("Failed to start pipeline: {}", e),
            })?;
        self.pipeline = Some(pipeline);
        self.capturing = true;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), CaptureError> {
        if self.closed {
            Err(CaptureError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Camera for GstCamera {
    fn configure(&mut self, settings: &CaptureSettings) -> Result<(), CaptureError> {
        self.ensure_open()?;
        debug!(
            "Configuring {} camera: {}x{}, {} buffers, frame duration {:?} us",
            self.backend, settings.size.0, settings.size.1, settings.buffer_count, settings.frame_duration_limits
        );
        self.settings = Some(*settings);
        Ok(())
    }

    fn set_transform(&mut self, transform: RenderTransform) -> Result<(), CaptureError> {
        self.ensure_open()?;
        self.transform = transform;
        Ok(())
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        self.ensure_open()?;
        if self.capturing {
            warn!("Camera capture is already running");
            return Ok(());
        }

        let buffers = self.settings.map(|s| s.buffer_count).unwrap_or(2);
        let sink = format!(
            "videoconvert ! video/x-raw,format=RGBx ! \
             appsink name=sink sync=false max-buffers={} drop=true emit-signals=false",
            buffers
        );
        let pipeline = self.launch(&sink)?;

        let appsink = pipeline
            .by_name("sink")
            .and_then(|element| element.downcast::<AppSink>().ok())
            .ok_or_else(|| CaptureError::Configuration {
                details: "Failed to get appsink from pipeline".to_string(),
            })?;

        self.appsink = Some(appsink);
        self.play(pipeline)
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.capturing = false;
        self.appsink = None;
        if let Some(pipeline) = self.pipeline.take() {
            pipeline
                .set_state(gstreamer::State::Null)
                .map_err(|e| CaptureError::Stream {
                    details: format!("Failed to stop pipeline: {}", e),
                })?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        let result = self.stop();
        self.closed = true;
        result
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        self.ensure_open()?;
        let Some(appsink) = &self.appsink else {
            return Ok(None);
        };

        let Some(sample) = appsink.try_pull_sample(gstreamer::ClockTime::ZERO) else {
            return Ok(None);
        };

        let buffer = sample.buffer().ok_or_else(|| CaptureError::Stream {
            details: "No buffer in sample".to_string(),
        })?;
        let caps = sample.caps().ok_or_else(|| CaptureError::Stream {
            details: "No caps in sample".to_string(),
        })?;
        let video_info = VideoInfo::from_caps(caps).map_err(|e| CaptureError::Stream {
            details: format!("Failed to get video info: {}", e),
        })?;
        let map = buffer.map_readable().map_err(|e| CaptureError::Stream {
            details: format!("Failed to map buffer: {}", e),
        })?;

        self.sequence += 1;
        trace!(
            "Captured frame {} ({}x{}, {} bytes)",
            self.sequence,
            video_info.width(),
            video_info.height(),
            map.len()
        );

        Ok(Some(Frame::new(
            self.sequence,
            map.as_slice().to_vec(),
            video_info.width(),
            video_info.height(),
            PixelFormat::Rgbx,
        )))
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn start_overlay_preview(&mut self, fullscreen: bool) -> Result<(), CaptureError> {
        self.ensure_open()?;
        if self.backend != CaptureBackend::Legacy {
            return Err(CaptureError::Unsupported {
                backend: self.backend.to_string(),
            });
        }

        let size = self.settings.map(|s| s.size).ok_or_else(|| CaptureError::Configuration {
            details: "overlay preview started before configure".to_string(),
        })?;
        let window = OverlayWindow::new(fullscreen, size);

        let pipeline = self.launch("autovideosink name=overlay sync=false")?;
        // autovideosink only creates its real sink on the way to READY
        pipeline
            .set_state(gstreamer::State::Ready)
            .map_err(|e| CaptureError::Stream {
                details: format!("Failed to prepare overlay preview: {}", e),
            })?;

        match overlay_sink(&pipeline) {
            Some(sink) => apply_overlay_window(&sink, window),
            None => warn!("No overlay sink found, preview placement left to the sink"),
        }

        info!("Starting overlay preview ({})", window);
        self.play(pipeline)
    }
}

fn overlay_sink(pipeline: &Pipeline) -> Option<gstreamer::Element> {
    let sink = pipeline.by_name("overlay")?;
    match sink.downcast_ref::<gstreamer::Bin>() {
        Some(bin) => bin.children().into_iter().next(),
        None => Some(sink),
    }
}

fn apply_overlay_window(sink: &gstreamer::Element, window: OverlayWindow) {
    match window {
        OverlayWindow::Fullscreen => {
            if sink.find_property("fullscreen").is_some() {
                sink.set_property("fullscreen", true);
            } else {
                debug!("{} has no fullscreen property", sink.name());
            }
        }
        OverlayWindow::Window {
            x,
            y,
            width,
            height,
        } => match sink.dynamic_cast_ref::<VideoOverlay>() {
            Some(overlay) => {
                if let Err(e) = overlay.set_render_rectangle(x, y, width as i32, height as i32) {
                    debug!("{} rejected render rectangle: {}", sink.name(), e);
                }
            }
            None => debug!("{} cannot be positioned", sink.name()),
        },
    }
}
