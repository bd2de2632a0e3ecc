use thiserror::Error;

/// Exit status for generic failures
pub const EXIT_FAILURE: i32 = 1;

/// Exit status when neither capture stack is installed
pub const EXIT_CAPTURE_STACK_UNAVAILABLE: i32 = 2;

/// Exit status for a benchmark cancelled by SIGINT/SIGTERM
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Camera error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("No supported capture stack available: {details}")]
    CaptureStackUnavailable { details: String },

    #[error("Resource sampling unavailable: {details}")]
    ResourceSampling { details: String },

    #[error("No display available: {details}")]
    DisplayUnavailable { details: String },

    #[error("Benchmark interrupted after {completed_runs} completed run(s)")]
    Interrupted { completed_runs: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("System error: {message}")]
    System { message: String },
}

/// Errors raised by a capture stack
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Failed to open camera: {details}")]
    DeviceOpen { details: String },

    #[error("Invalid capture configuration: {details}")]
    Configuration { details: String },

    #[error("Operation not supported by the {backend} stack")]
    Unsupported { backend: String },

    #[error("Camera handle is closed")]
    Closed,

    #[error("Capture stream failed: {details}")]
    Stream { details: String },
}

/// Errors raised by a graphics stack
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Accelerated rendering unsupported: {details}")]
    Unsupported { details: String },

    #[error("Failed to create offscreen surface: {details}")]
    SurfaceCreation { details: String },

    #[error("Failed to create render context: {details}")]
    ContextCreation { details: String },

    #[error("Failed to make render context current: {details}")]
    MakeCurrent { details: String },

    #[error("Preview surface initialization failed: {details}")]
    Initialization { details: String },

    #[error("Frame presentation failed: {details}")]
    Presentation { details: String },
}

impl ViewerError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn sampling<S: Into<String>>(details: S) -> Self {
        Self::ResourceSampling {
            details: details.into(),
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CaptureStackUnavailable { .. } => EXIT_CAPTURE_STACK_UNAVAILABLE,
            Self::Interrupted { .. } => EXIT_INTERRUPTED,
            _ => EXIT_FAILURE,
        }
    }

    /// Error text followed by the remedy, if any
    pub fn user_message(&self) -> String {
        match self.remedy() {
            Some(remedy) => format!("{}\n{}", self, remedy),
            None => self.to_string(),
        }
    }

    /// Actionable hint shown to the user alongside the error
    pub fn remedy(&self) -> Option<&'static str> {
        match self {
            Self::CaptureStackUnavailable { .. } => Some(
                "Install one of:\n  \
                 sudo apt install -y gstreamer1.0-libcamera      # libcamera stack (Bullseye/Bookworm)\n  \
                 sudo modprobe bcm2835-v4l2                       # legacy V4L2 camera driver (Buster)",
            ),
            Self::DisplayUnavailable { .. } => Some(
                "Run under X11 or pass --display :0. \
                 For headless (no-X) setups use a DRM/KMS sink instead.",
            ),
            Self::Config(_) | Self::InvalidConfig { .. } => {
                Some("Check the configuration file, PICAMVIEWER_* variables and command line flags.")
            }
            Self::ResourceSampling { .. } => {
                Some("Process CPU/memory sampling requires a Linux /proc filesystem.")
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
