use std::sync::Arc;

/// Pixel layout of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 32-bit RGB with padding byte
    Rgbx,
    /// 24-bit RGB
    Rgb24,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgbx => 4,
            PixelFormat::Rgb24 => 3,
        }
    }
}

/// A frame delivered by the capture stack to the preview surface
#[derive(Debug, Clone)]
pub struct Frame {
    /// Monotonic frame sequence number from the camera
    pub sequence: u64,
    /// Raw pixel data (shared ownership so rendering never copies)
    pub data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl Frame {
    pub fn new(sequence: u64, data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            sequence,
            data: Arc::new(data),
            width,
            height,
            format,
        }
    }

    /// A black frame of the given size
    pub fn blank(sequence: u64, width: u32, height: u32, format: PixelFormat) -> Self {
        let size = width as usize * height as usize * format.bytes_per_pixel();
        Self::new(sequence, vec![0u8; size], width, height, format)
    }

    pub fn expected_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Validate frame data size against its geometry
    pub fn validate_size(&self) -> bool {
        self.data.len() == self.expected_size()
    }
}
