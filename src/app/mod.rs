mod legacy;
mod orchestrator;
mod runtime;
mod session;
mod startup;
mod types;

#[cfg(test)]
mod tests;

pub use orchestrator::ViewerOrchestrator;
pub use session::PreviewSession;
pub use startup::{open_camera, release_camera, show_preview, start_preview};
pub use types::{PreviewEvent, PreviewStats};
