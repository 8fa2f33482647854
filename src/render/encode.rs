use image::ImageEncoder as _;

use crate::foundation::{
    core::FrameRGBA,
    error::{FacelapseError, FacelapseResult},
};

/// On-disk frame format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Encode `frame` deterministically. Opaque frames are written without an alpha channel.
pub fn encode_frame(
    frame: FrameRGBA,
    format: OutputFormat,
    jpeg_quality: u8,
) -> FacelapseResult<Vec<u8>> {
    let frame = frame.into_straight();
    let opaque = frame.data.chunks_exact(4).all(|px| px[3] == 255);
    let (w, h) = (frame.width, frame.height);
    let mut out = Vec::new();

    let res = match format {
        OutputFormat::Png => {
            let encoder = image::codecs::png::PngEncoder::new(&mut out);
            if opaque {
                let rgb = rgba_to_rgb(&frame.data);
                encoder.write_image(&rgb, w, h, image::ExtendedColorType::Rgb8)
            } else {
                encoder.write_image(&frame.data, w, h, image::ExtendedColorType::Rgba8)
            }
        }
        OutputFormat::Jpeg => {
            if !opaque {
                return Err(FacelapseError::render(
                    "jpeg output requires an opaque frame; use an opaque background colour",
                ));
            }
            let rgb = rgba_to_rgb(&frame.data);
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, jpeg_quality)
                .write_image(&rgb, w, h, image::ExtendedColorType::Rgb8)
        }
    };
    res.map_err(|e| FacelapseError::render(format!("encode {format:?} frame: {e}")))?;

    Ok(out)
}

fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    rgb
}

#[cfg(test)]
#[path = "../../tests/unit/render/encode.rs"]
mod tests;
