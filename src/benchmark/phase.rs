/// Phase of a single benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Rendering, nothing counted yet
    Warmup,
    /// Frames and resources are being measured
    Measuring,
    /// Measurement finished; capture is being released
    Done,
}

/// Timer events that advance a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    WarmupElapsed,
    MeasurementElapsed,
}

impl RunPhase {
    /// Next phase for `event`, or `None` if the event does not apply here
    pub fn advance(self, event: PhaseEvent) -> Option<RunPhase> {
        match (self, event) {
            (RunPhase::Warmup, PhaseEvent::WarmupElapsed) => Some(RunPhase::Measuring),
            (RunPhase::Measuring, PhaseEvent::MeasurementElapsed) => Some(RunPhase::Done),
            _ => None,
        }
    }

    pub fn is_done(self) -> bool {
        self == RunPhase::Done
    }
}
