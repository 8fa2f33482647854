use std::path::{Path, PathBuf};

use imageproc::{
    drawing::{draw_filled_circle_mut, draw_hollow_rect_mut},
    rect::Rect,
};

use crate::{
    detect::FaceCandidate,
    foundation::{
        core::FrameRGBA,
        error::{FacelapseError, FacelapseResult},
    },
};

/// Draw every candidate's bounding box (red) and eye centers (yellow) onto a copy of `frame` and
/// save it as `<error_dir>/<file_name>`.
///
/// The coordinates are those the detector reported against the oriented frame, so the operator
/// sees exactly what the selector saw.
pub fn write_selection_diagnostic(
    frame: &FrameRGBA,
    candidates: &[FaceCandidate],
    error_dir: &Path,
    file_name: &str,
) -> FacelapseResult<PathBuf> {
    let rgba = frame.clone().into_rgba_image()?;
    let mut img = image::DynamicImage::ImageRgba8(rgba).into_rgb8();
    let (w, h) = img.dimensions();

    let red = image::Rgb([255u8, 0, 0]);
    let yellow = image::Rgb([255u8, 220, 0]);
    let thickness = (w.min(h) / 250).max(2) as i32;
    let eye_radius = thickness * 2;

    for face in candidates {
        let b = &face.bbox;
        let x0 = b.left().round() as i32;
        let y0 = b.top().round() as i32;
        let bw = b.width.round().max(1.0) as u32;
        let bh = b.height.round().max(1.0) as u32;
        for offset in 0..thickness {
            let rect = Rect::at(x0 - offset, y0 - offset)
                .of_size(bw + (offset * 2) as u32, bh + (offset * 2) as u32);
            draw_hollow_rect_mut(&mut img, rect, red);
        }
        for eye in [face.left_eye, face.right_eye] {
            draw_filled_circle_mut(
                &mut img,
                (eye.x.round() as i32, eye.y.round() as i32),
                eye_radius,
                yellow,
            );
        }
    }

    std::fs::create_dir_all(error_dir).map_err(|e| {
        FacelapseError::render(format!(
            "create error directory '{}': {e}",
            error_dir.display()
        ))
    })?;
    let out = error_dir.join(file_name);
    let format = image::ImageFormat::from_path(&out).unwrap_or(image::ImageFormat::Png);
    img.save_with_format(&out, format).map_err(|e| {
        FacelapseError::render(format!(
            "write selection diagnostic '{}': {e}",
            out.display()
        ))
    })?;
    tracing::info!(path = %out.display(), faces = candidates.len(), "wrote selection diagnostic");
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/select/diagnostic.rs"]
mod tests;
