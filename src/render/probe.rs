use super::stack::GraphicsStack;
use crate::error::RenderError;
use tracing::{debug, info};

/// Outcome of the accelerated-rendering probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityResult {
    pub accelerated: bool,
}

/// Checks whether an accelerated context can be created and made current.
///
/// Any failure, including an unsupported platform, yields
/// `accelerated: false`. The offscreen surface and the context are released
/// on every path and the surface is never shown.
pub struct CapabilityProbe<'a, G: GraphicsStack> {
    stack: &'a G,
}

impl<'a, G: GraphicsStack> CapabilityProbe<'a, G> {
    pub fn new(stack: &'a G) -> Self {
        Self { stack }
    }

    pub fn probe(&self) -> CapabilityResult {
        match self.try_make_current() {
            Ok(()) => {
                debug!("Accelerated context probe succeeded");
                CapabilityResult { accelerated: true }
            }
            Err(e) => {
                info!("Accelerated rendering unavailable: {}", e);
                CapabilityResult { accelerated: false }
            }
        }
    }

    fn try_make_current(&self) -> Result<(), RenderError> {
        let stack = self.stack;

        // Guards drop in reverse order: context first, then surface
        let surface = scopeguard::guard(stack.create_offscreen_surface()?, |surface| {
            stack.destroy_surface(surface)
        });
        let context = scopeguard::guard(stack.create_context(&surface)?, |context| {
            stack.done_current(&context);
            stack.destroy_context(context)
        });

        stack.make_current(&context, &surface)
    }
}
