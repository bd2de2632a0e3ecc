use crate::error::ViewerError;
use serde::{Deserialize, Serialize};

/// Camera rotation in degrees clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    /// Get rotation angle in degrees
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::Rotate0 => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }

    /// Flip/transpose triple applied by the capture stack for this rotation
    pub fn transform(&self) -> RenderTransform {
        match self {
            Rotation::Rotate0 => RenderTransform::IDENTITY,
            Rotation::Rotate90 => RenderTransform {
                hflip: true,
                vflip: false,
                transpose: true,
            },
            Rotation::Rotate180 => RenderTransform {
                hflip: true,
                vflip: true,
                transpose: false,
            },
            Rotation::Rotate270 => RenderTransform {
                hflip: false,
                vflip: true,
                transpose: true,
            },
        }
    }
}

impl TryFrom<u16> for Rotation {
    type Error = ViewerError;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::Rotate0),
            90 => Ok(Rotation::Rotate90),
            180 => Ok(Rotation::Rotate180),
            270 => Ok(Rotation::Rotate270),
            other => Err(ViewerError::config(format!(
                "Rotation must be one of 0, 90, 180, 270 (got {})",
                other
            ))),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// libcamera-style image transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderTransform {
    pub hflip: bool,
    pub vflip: bool,
    pub transpose: bool,
}

impl RenderTransform {
    pub const IDENTITY: RenderTransform = RenderTransform {
        hflip: false,
        vflip: false,
        transpose: false,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Whether output width and height are swapped
    pub fn swaps_dimensions(&self) -> bool {
        self.transpose
    }

    /// Equivalent GStreamer `videoflip` method name
    pub fn videoflip_method(&self) -> &'static str {
        match (self.hflip, self.vflip, self.transpose) {
            (false, false, false) => "none",
            (true, false, false) => "horizontal-flip",
            (false, true, false) => "vertical-flip",
            (true, true, false) => "rotate-180",
            (false, false, true) => "upper-left-diagonal",
            (true, false, true) => "clockwise",
            (false, true, true) => "counterclockwise",
            (true, true, true) => "upper-right-diagonal",
        }
    }
}
