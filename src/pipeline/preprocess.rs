use std::io::Cursor;

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType};
use tracing::{debug, warn};

/// Image normalization ahead of classifier dispatch.
///
/// Implementations must never fail the pipeline: on any internal error the
/// original bytes are returned unmodified.
pub trait PreprocessStage: Send + Sync {
    fn optimize(&self, bytes: &[u8]) -> Vec<u8>;
}

/// Bounds the longest edge and re-encodes to JPEG to cut encoding latency and
/// request cost. Idempotent: an already-small image passes through untouched.
#[derive(Debug, Clone, Copy)]
pub struct ImagePreprocessStage {
    max_edge: u32,
    jpeg_quality: u8,
}

impl ImagePreprocessStage {
    #[must_use]
    pub fn new(max_edge: u32, jpeg_quality: u8) -> Self {
        Self {
            max_edge,
            jpeg_quality,
        }
    }

    fn resize_and_encode(&self, bytes: &[u8]) -> Option<Vec<u8>> {
        let decoded = image::load_from_memory(bytes).ok()?;
        let (width, height) = (decoded.width(), decoded.height());

        if width <= self.max_edge && height <= self.max_edge {
            return Some(bytes.to_vec());
        }

        let resized = decoded.resize(self.max_edge, self.max_edge, FilterType::Lanczos3);
        let mut output = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut output, self.jpeg_quality);
        resized.to_rgb8().write_with_encoder(encoder).ok()?;

        debug!(
            from_width = width,
            from_height = height,
            to_width = resized.width(),
            to_height = resized.height(),
            "image resized for dispatch"
        );
        Some(output.into_inner())
    }
}

impl Default for ImagePreprocessStage {
    fn default() -> Self {
        Self::new(512, 85)
    }
}

impl PreprocessStage for ImagePreprocessStage {
    fn optimize(&self, bytes: &[u8]) -> Vec<u8> {
        match self.resize_and_encode(bytes) {
            Some(optimized) => optimized,
            None => {
                warn!("image optimization failed, dispatching original bytes");
                bytes.to_vec()
            }
        }
    }
}
