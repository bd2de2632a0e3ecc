use super::surface::PreviewSurface;
use crate::error::RenderError;
use crate::frame::Frame;

/// Surface proxy counting completed renders inside a measurement window
#[derive(Debug)]
pub struct InstrumentedSurface<S> {
    inner: S,
    frames: u64,
    measuring: bool,
}

impl<S: PreviewSurface> InstrumentedSurface<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            frames: 0,
            measuring: false,
        }
    }

    /// Reset the counter and begin counting renders
    pub fn start_measuring(&mut self) {
        self.frames = 0;
        self.measuring = true;
    }

    /// Stop counting and return the number of renders since `start_measuring`
    pub fn stop_measuring(&mut self) -> u64 {
        self.measuring = false;
        self.frames
    }

    pub fn is_measuring(&self) -> bool {
        self.measuring
    }

    pub fn frames_counted(&self) -> u64 {
        self.frames
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: PreviewSurface> PreviewSurface for InstrumentedSurface<S> {
    fn show(&mut self, fullscreen: bool) -> Result<(), RenderError> {
        self.inner.show(fullscreen)
    }

    fn set_title(&mut self, title: &str) {
        self.inner.set_title(title)
    }

    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        self.inner.render(frame)?;
        if self.measuring {
            self.frames += 1;
        }
        Ok(())
    }

    fn close(&mut self) {
        self.inner.close()
    }
}
