#[cfg(all(feature = "hardware", target_os = "linux"))]
mod gst;
mod instrument;
pub mod mock;
mod probe;
mod selector;
mod stack;
mod surface;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gst::GstGraphicsStack;
pub use instrument::InstrumentedSurface;
pub use mock::{MockGraphicsStack, MockSurface, ProbeStep};
pub use probe::{CapabilityProbe, CapabilityResult};
pub use selector::RendererSelector;
pub use stack::GraphicsStack;
pub use surface::{PreviewSurface, PreviewSurfaceHandle, RenderPath, SurfaceOptions};

/// Title of the windowed preview
pub const WINDOW_TITLE: &str = "PiCamViewer";
