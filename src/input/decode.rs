use std::path::Path;

use image::ImageDecoder as _;

use crate::foundation::{
    core::FrameRGBA,
    error::{FacelapseError, FacelapseResult},
};

/// Decode a photo from disk with its EXIF orientation applied, as straight-alpha RGBA8.
///
/// Decode failures are reported as detection failures: an undecodable photo can never yield
/// landmarks.
pub fn decode_image_file(path: &Path) -> FacelapseResult<FrameRGBA> {
    let fail = |what: &str, e: &dyn std::fmt::Display| {
        FacelapseError::detection(format!("{what} '{}': {e}", path.display()))
    };

    let reader = image::ImageReader::open(path)
        .map_err(|e| fail("open image", &e))?
        .with_guessed_format()
        .map_err(|e| fail("sniff image format", &e))?;
    let mut decoder = reader
        .into_decoder()
        .map_err(|e| fail("create decoder for", &e))?;
    let orientation = decoder
        .orientation()
        .unwrap_or(image::metadata::Orientation::NoTransforms);
    let mut img =
        image::DynamicImage::from_decoder(decoder).map_err(|e| fail("decode image", &e))?;
    img.apply_orientation(orientation);

    Ok(FrameRGBA::from_rgba_image(img.to_rgba8()))
}

/// Decode an encoded frame (cached artifact) from memory.
pub fn decode_image_bytes(bytes: &[u8]) -> FacelapseResult<FrameRGBA> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| FacelapseError::render(format!("decode frame bytes: {e}")))?;
    Ok(FrameRGBA::from_rgba_image(img.to_rgba8()))
}

#[cfg(test)]
#[path = "../../tests/unit/input/decode.rs"]
mod tests;
