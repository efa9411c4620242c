//! Frame capture to PNG.

use std::path::Path;

use compute::{ComputeBackend, ComputeError, TextureData, TextureHandle};
use image::{Rgba, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to read back frame: {0}")]
    Readback(#[from] ComputeError),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
}

/// Converts linear RGBA32F pixels to 8-bit, clamping to `[0, 1]`.
#[must_use]
pub fn to_rgba8(data: &TextureData) -> RgbaImage {
    RgbaImage::from_fn(data.width, data.height, |x, y| {
        let pixel = data.pixel(x, y).unwrap_or([0.0; 4]);
        Rgba(pixel.map(to_byte))
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Reads `texture` back and writes it to `path` as PNG.
///
/// # Errors
///
/// Fails if the readback or the encode fails.
pub fn save_png(
    backend: &dyn ComputeBackend,
    texture: TextureHandle,
    path: &Path,
) -> Result<(), CaptureError> {
    let data = backend.read_texture(texture)?;
    to_rgba8(&data).save_with_format(path, image::ImageFormat::Png)?;
    tracing::info!(path = %path.display(), width = data.width, height = data.height, "saved frame");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_are_clamped_and_rounded() {
        let data = TextureData::from_fn(2, 1, |x, _| {
            if x == 0 {
                [-1.0, 0.5, 2.0, 1.0]
            } else {
                [0.2, 0.0, 1.0, 0.0]
            }
        });
        let img = to_rgba8(&data);
        assert_eq!(img.get_pixel(0, 0), &Rgba([0, 128, 255, 255]));
        assert_eq!(img.get_pixel(1, 0), &Rgba([51, 0, 255, 0]));
    }
}
