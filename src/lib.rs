pub mod app;
pub mod benchmark;
pub mod capture;
pub mod config;
pub mod environment;
pub mod error;
pub mod event_loop;
pub mod frame;
pub mod lifecycle;
pub mod logging;
pub mod render;
pub mod transform;

pub use app::ViewerOrchestrator;
pub use benchmark::{BenchmarkOrchestrator, BenchmarkSummary, ProcessSampler, RunMetrics};
pub use capture::{detect_capture_stack, CaptureBackend, CaptureStack};
pub use config::{BenchmarkConfig, PreviewConfig, ViewerConfig};
pub use error::{Result, ViewerError};
pub use lifecycle::{install_signal_handlers, LifecycleState, ShutdownFlag};
pub use render::{GraphicsStack, RenderPath};
pub use transform::{RenderTransform, Rotation};
