use super::stack::GraphicsStack;
use super::surface::{PreviewSurface, RenderPath, SurfaceOptions};
use crate::capture::CallLog;
use crate::error::RenderError;
use crate::frame::Frame;
use tracing::debug;

/// Probe step a [`MockGraphicsStack`] can be told to fail at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStep {
    Surface,
    Context,
    MakeCurrent,
}

#[derive(Debug)]
pub struct MockOffscreenSurface;

#[derive(Debug)]
pub struct MockContext;

/// Graphics stack recording every call into a [`CallLog`]
#[derive(Debug, Clone)]
pub struct MockGraphicsStack {
    log: CallLog,
    fail_probe_at: Option<ProbeStep>,
    fail_accelerated: bool,
    fail_software: bool,
    fail_renders: bool,
}

impl MockGraphicsStack {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail_probe_at: None,
            fail_accelerated: false,
            fail_software: false,
            fail_renders: false,
        }
    }

    pub fn failing_probe_at(mut self, step: ProbeStep) -> Self {
        self.fail_probe_at = Some(step);
        self
    }

    pub fn with_failing_accelerated_surface(mut self) -> Self {
        self.fail_accelerated = true;
        self
    }

    pub fn with_failing_software_surface(mut self) -> Self {
        self.fail_software = true;
        self
    }

    /// Surfaces built by this stack reject every frame
    pub fn with_failing_renders(mut self) -> Self {
        self.fail_renders = true;
        self
    }

    fn probe_step(&self, step: ProbeStep, entry: &str) -> Result<(), RenderError> {
        self.log.record(entry);
        if self.fail_probe_at != Some(step) {
            return Ok(());
        }

        let details = format!("mock failure at {}", entry);
        Err(match step {
            ProbeStep::Surface => RenderError::SurfaceCreation { details },
            ProbeStep::Context => RenderError::ContextCreation { details },
            ProbeStep::MakeCurrent => RenderError::MakeCurrent { details },
        })
    }

    fn build_surface(&self, path: RenderPath) -> Box<dyn PreviewSurface> {
        Box::new(MockSurface {
            path,
            log: self.log.clone(),
            fail_renders: self.fail_renders,
            frames: 0,
        })
    }
}

impl GraphicsStack for MockGraphicsStack {
    type Surface = MockOffscreenSurface;
    type Context = MockContext;

    fn create_offscreen_surface(&self) -> Result<MockOffscreenSurface, RenderError> {
        self.probe_step(ProbeStep::Surface, "gl.surface.create")?;
        Ok(MockOffscreenSurface)
    }

    fn create_context(&self, _surface: &MockOffscreenSurface) -> Result<MockContext, RenderError> {
        self.probe_step(ProbeStep::Context, "gl.context.create")?;
        Ok(MockContext)
    }

    fn make_current(
        &self,
        _context: &MockContext,
        _surface: &MockOffscreenSurface,
    ) -> Result<(), RenderError> {
        self.probe_step(ProbeStep::MakeCurrent, "gl.make_current")
    }

    fn done_current(&self, _context: &MockContext) {
        self.log.record("gl.done_current");
    }

    fn destroy_context(&self, _context: MockContext) {
        self.log.record("gl.context.destroy");
    }

    fn destroy_surface(&self, _surface: MockOffscreenSurface) {
        self.log.record("gl.surface.destroy");
    }

    fn create_accelerated_surface(
        &self,
        options: &SurfaceOptions,
    ) -> Result<Box<dyn PreviewSurface>, RenderError> {
        self.log.record("surface.accelerated.create");
        if self.fail_accelerated {
            return Err(RenderError::Initialization {
                details: "mock accelerated surface failure".to_string(),
            });
        }
        debug!("Mock accelerated surface {}x{}", options.width, options.height);
        Ok(self.build_surface(RenderPath::Accelerated))
    }

    fn create_software_surface(
        &self,
        options: &SurfaceOptions,
    ) -> Result<Box<dyn PreviewSurface>, RenderError> {
        self.log.record("surface.software.create");
        if self.fail_software {
            return Err(RenderError::Initialization {
                details: "mock software surface failure".to_string(),
            });
        }
        debug!("Mock software surface {}x{}", options.width, options.height);
        Ok(self.build_surface(RenderPath::Software))
    }
}

/// Preview surface that draws nothing
#[derive(Debug)]
pub struct MockSurface {
    path: RenderPath,
    log: CallLog,
    fail_renders: bool,
    frames: u64,
}

impl MockSurface {
    pub fn new(path: RenderPath, log: CallLog) -> Self {
        Self {
            path,
            log,
            fail_renders: false,
            frames: 0,
        }
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames
    }
}

impl PreviewSurface for MockSurface {
    fn show(&mut self, fullscreen: bool) -> Result<(), RenderError> {
        self.log
            .record(format!("surface.show fullscreen={}", fullscreen));
        Ok(())
    }

    fn set_title(&mut self, title: &str) {
        self.log.record(format!("surface.title {}", title));
    }

    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        if self.fail_renders {
            return Err(RenderError::Presentation {
                details: format!("mock {} surface dropped frame {}", self.path, frame.sequence),
            });
        }
        self.frames += 1;
        self.log.record("surface.render");
        Ok(())
    }

    fn close(&mut self) {
        self.log.record("surface.close");
    }
}
