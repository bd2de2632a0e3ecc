/// Events driving the interactive preview loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewEvent {
    RenderFrame,
    ShutdownPoll,
}

/// Preview loop statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewStats {
    pub frames_rendered: u64,
    pub render_errors: u64,
    /// Ticks where the camera had no new frame ready
    pub frames_missed: u64,
    pub capture_errors: u64,
}

impl PreviewStats {
    pub fn record_frame_render(&mut self) {
        self.frames_rendered += 1;
    }

    pub fn record_render_error(&mut self) {
        self.render_errors += 1;
    }

    pub fn record_missed_frame(&mut self) {
        self.frames_missed += 1;
    }

    pub fn record_capture_error(&mut self) {
        self.capture_errors += 1;
    }

    pub fn render_success_rate(&self) -> f64 {
        let attempts = self.frames_rendered + self.render_errors;
        if attempts == 0 {
            0.0
        } else {
            self.frames_rendered as f64 / attempts as f64
        }
    }
}
