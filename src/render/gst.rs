use super::stack::GraphicsStack;
use super::surface::{PreviewSurface, RenderPath, SurfaceOptions};
use crate::error::RenderError;
use crate::frame::Frame;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSrc;
use gstreamer_gl::prelude::*;
use gstreamer_gl::{GLContext, GLDisplay, GLDisplayType};
use gstreamer_video::{VideoFormat, VideoInfo};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// GStreamer graphics stack: GL probe plus `glimagesink`/`ximagesink` surfaces
#[derive(Debug, Clone, Default)]
pub struct GstGraphicsStack;

impl GstGraphicsStack {
    pub fn new() -> Self {
        Self
    }

    fn init() -> Result<(), RenderError> {
        gstreamer::init().map_err(|e| RenderError::Unsupported {
            details: format!("Failed to initialize GStreamer: {}", e),
        })
    }
}

impl GraphicsStack for GstGraphicsStack {
    type Surface = GLDisplay;
    type Context = GLContext;

    fn create_offscreen_surface(&self) -> Result<GLDisplay, RenderError> {
        Self::init()?;
        let display = GLDisplay::new();
        if display.handle_type() == GLDisplayType::NONE {
            return Err(RenderError::SurfaceCreation {
                details: "no GL display connection".to_string(),
            });
        }
        Ok(display)
    }

    fn create_context(&self, display: &GLDisplay) -> Result<GLContext, RenderError> {
        let context = GLContext::new(display);
        context
            .create(None::<&GLContext>)
            .map_err(|e| RenderError::ContextCreation {
                details: e.to_string(),
            })?;
        Ok(context)
    }

    // `create` makes the context current on GStreamer's own GL thread, and
    // EGL/GLX refuse to bind it a second time from this thread. A created
    // context that reports a GL API has therefore already been made current.
    fn make_current(&self, context: &GLContext, _display: &GLDisplay) -> Result<(), RenderError> {
        let api = context.gl_api();
        if api.is_empty() {
            return Err(RenderError::MakeCurrent {
                details: "GL context reports no usable API".to_string(),
            });
        }
        debug!("GL context current on its render thread ({:?})", api);
        Ok(())
    }

    fn done_current(&self, _context: &GLContext) {
        debug!("Probe GL context released from its render thread on drop");
    }

    fn destroy_context(&self, context: GLContext) {
        drop(context);
        debug!("Probe GL context released");
    }

    fn destroy_surface(&self, display: GLDisplay) {
        drop(display);
        debug!("Probe GL display released");
    }

    fn create_accelerated_surface(
        &self,
        options: &SurfaceOptions,
    ) -> Result<Box<dyn PreviewSurface>, RenderError> {
        Self::init()?;
        let surface = GstPreviewSurface::new(
            RenderPath::Accelerated,
            "glupload ! glcolorconvert ! glimagesink name=sink sync=false",
            options,
        )?;
        Ok(Box::new(surface))
    }

    fn create_software_surface(
        &self,
        options: &SurfaceOptions,
    ) -> Result<Box<dyn PreviewSurface>, RenderError> {
        Self::init()?;
        let surface = GstPreviewSurface::new(
            RenderPath::Software,
            "videoconvert ! videoscale ! ximagesink name=sink sync=false",
            options,
        )?;
        Ok(Box::new(surface))
    }
}

// Lets a shared frame buffer back a GStreamer buffer without copying
struct SharedPixels(Arc<Vec<u8>>);

impl AsRef<[u8]> for SharedPixels {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

struct GstPreviewSurface {
    path: RenderPath,
    pipeline: Pipeline,
    appsrc: AppSrc,
    sink: gstreamer::Element,
    framerate: u32,
    negotiated: Option<(u32, u32)>,
}

impl GstPreviewSurface {
    fn new(path: RenderPath, sink: &str, options: &SurfaceOptions) -> Result<Self, RenderError> {
        let description = format!(
            "appsrc name=src is-live=true format=time do-timestamp=true ! \
             queue max-size-buffers=2 leaky=downstream ! {}",
            sink
        );
        info!("Creating {} preview pipeline: {}", path, description);

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| RenderError::Initialization {
                details: format!("Failed to create pipeline: {}", e),
            })?
            .downcast::<Pipeline>()
            .map_err(|_| RenderError::Initialization {
                details: "Failed to downcast to Pipeline".to_string(),
            })?;

        let appsrc = pipeline
            .by_name("src")
            .and_then(|element| element.downcast::<AppSrc>().ok())
            .ok_or_else(|| RenderError::Initialization {
                details: "Failed to get appsrc from pipeline".to_string(),
            })?;
        let sink = pipeline.by_name("sink").ok_or_else(|| RenderError::Initialization {
            details: "Failed to get video sink from pipeline".to_string(),
        })?;

        if sink.find_property("force-aspect-ratio").is_some() {
            sink.set_property("force-aspect-ratio", options.keep_aspect_ratio);
        }

        // READY opens the display connection, surfacing missing GL/X support now
        pipeline
            .set_state(gstreamer::State::Ready)
            .map_err(|e| RenderError::Initialization {
                details: format!("{} sink failed to initialize: {}", path, e),
            })?;

        Ok(Self {
            path,
            pipeline,
            appsrc,
            sink,
            framerate: options.framerate,
            negotiated: None,
        })
    }

    fn negotiate(&mut self, frame: &Frame) -> Result<(), RenderError> {
        if self.negotiated == Some((frame.width, frame.height)) {
            return Ok(());
        }

        let caps = VideoInfo::builder(VideoFormat::Rgbx, frame.width, frame.height)
            .fps(gstreamer::Fraction::new(self.framerate as i32, 1))
            .build()
            .and_then(|info| info.to_caps())
            .map_err(|e| RenderError::Presentation {
                details: format!("Failed to build caps: {}", e),
            })?;

        debug!("Negotiating {} preview caps: {}", self.path, caps);
        self.appsrc.set_caps(Some(&caps));
        self.negotiated = Some((frame.width, frame.height));
        Ok(())
    }

    fn check_bus(&self) -> Result<(), RenderError> {
        let Some(bus) = self.pipeline.bus() else {
            return Ok(());
        };

        if let Some(message) = bus.pop_filtered(&[gstreamer::MessageType::Error]) {
            if let gstreamer::MessageView::Error(err) = message.view() {
                return Err(RenderError::Presentation {
                    details: err.error().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl PreviewSurface for GstPreviewSurface {
    fn show(&mut self, fullscreen: bool) -> Result<(), RenderError> {
        if self.sink.find_property("fullscreen").is_some() {
            self.sink.set_property("fullscreen", fullscreen);
        } else if fullscreen {
            debug!("{} sink has no fullscreen property", self.path);
        }

        self.pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| RenderError::Initialization {
                details: format!("Failed to show preview: {}", e),
            })?;
        Ok(())
    }

    fn set_title(&mut self, title: &str) {
        let mut tags = gstreamer::TagList::new();
        if let Some(tags) = tags.get_mut() {
            tags.add::<gstreamer::tags::Title>(&title, gstreamer::TagMergeMode::Replace);
        }
        if !self.appsrc.send_event(gstreamer::event::Tag::new(tags)) {
            debug!("Preview sink ignored window title");
        }
    }

    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        if !frame.validate_size() {
            return Err(RenderError::Presentation {
                details: format!(
                    "frame {} has {} bytes, expected {}",
                    frame.sequence,
                    frame.data.len(),
                    frame.expected_size()
                ),
            });
        }
        self.negotiate(frame)?;

        let buffer = gstreamer::Buffer::from_slice(SharedPixels(Arc::clone(&frame.data)));
        self.appsrc
            .push_buffer(buffer)
            .map_err(|e| RenderError::Presentation {
                details: format!("Failed to push frame {}: {:?}", frame.sequence, e),
            })?;

        self.check_bus()
    }

    fn close(&mut self) {
        if let Err(e) = self.appsrc.end_of_stream() {
            debug!("Failed to send end of stream to {} preview: {:?}", self.path, e);
        }
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!("Failed to stop {} preview pipeline: {}", self.path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelFormat;

    fn options() -> SurfaceOptions {
        SurfaceOptions {
            width: 4,
            height: 4,
            framerate: 30,
            keep_aspect_ratio: true,
        }
    }

    #[test]
    fn test_created_context_counts_as_current() {
        let stack = GstGraphicsStack::new();
        // Machines without a GL display cannot get further than this
        let Ok(display) = stack.create_offscreen_surface() else {
            return;
        };
        let Ok(context) = stack.create_context(&display) else {
            return;
        };

        assert!(stack.make_current(&context, &display).is_ok());
        stack.done_current(&context);
        stack.destroy_context(context);
        stack.destroy_surface(display);
    }

    #[test]
    fn test_surface_rejects_bad_frames_and_closes_twice() {
        GstGraphicsStack::init().unwrap();
        let mut surface =
            GstPreviewSurface::new(RenderPath::Software, "fakesink name=sink", &options()).unwrap();
        surface.show(false).unwrap();

        surface
            .render(&Frame::blank(1, 4, 4, PixelFormat::Rgbx))
            .unwrap();
        let short = Frame::new(2, vec![0u8; 8], 4, 4, PixelFormat::Rgbx);
        assert!(matches!(
            surface.render(&short),
            Err(RenderError::Presentation { .. })
        ));

        surface.close();
        surface.close();
    }
}
