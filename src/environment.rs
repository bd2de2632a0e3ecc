use crate::error::{Result, ViewerError};
use tracing::info;

/// Pick the X display: an explicit choice wins over the inherited `DISPLAY`
pub fn resolve_display(explicit: Option<&str>, inherited: Option<&str>) -> Result<String> {
    let display = explicit.or(inherited).map(str::trim).unwrap_or_default();
    if display.is_empty() {
        return Err(ViewerError::DisplayUnavailable {
            details: "DISPLAY is not set".to_string(),
        });
    }
    Ok(display.to_string())
}

/// Ensure a display is available, exporting `DISPLAY` when one was given
pub fn check_display(explicit: Option<&str>) -> Result<String> {
    let inherited = std::env::var("DISPLAY").ok();
    let name = resolve_display(explicit, inherited.as_deref())?;

    if explicit.is_some() {
        std::env::set_var("DISPLAY", &name);
    }
    info!("Using display: {}", name);
    Ok(name)
}
