use std::{path::PathBuf, sync::Arc};

use crate::{
    foundation::{
        core::{Canvas, FrameRGBA},
        error::{FacelapseError, FacelapseResult},
        math::{blend_over_premul, premultiply_rgba8_in_place},
    },
    render::{CaptionStyle, FrameRenderer, caption},
    transform::solver::AlignmentTransform,
};

/// CPU renderer: `vello_cpu` for the affine warp, `usvg`/`resvg` for caption text.
pub struct CpuRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl CpuRenderer {
    /// System fonts plus any `.ttf`/`.otf`/`.ttc` found directly in `font_dirs`.
    pub fn new(font_dirs: &[PathBuf]) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        for dir in font_dirs {
            caption::load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.faces().count(), "font database ready");
        Self {
            fontdb: Arc::new(db),
        }
    }

    pub fn font_count(&self) -> usize {
        self.fontdb.faces().count()
    }
}

impl FrameRenderer for CpuRenderer {
    fn warp(
        &self,
        source: &FrameRGBA,
        transform: &AlignmentTransform,
        canvas: Canvas,
        background: [u8; 4],
    ) -> FacelapseResult<FrameRGBA> {
        warp_frame(source, transform, canvas, background)
    }

    fn caption(
        &self,
        frame: FrameRGBA,
        text: &str,
        style: &CaptionStyle,
    ) -> FacelapseResult<FrameRGBA> {
        caption::draw_caption(frame, text, style, Arc::clone(&self.fontdb))
    }
}

pub(crate) fn warp_frame(
    source: &FrameRGBA,
    transform: &AlignmentTransform,
    canvas: Canvas,
    background: [u8; 4],
) -> FacelapseResult<FrameRGBA> {
    let cw = to_u16(canvas.width, "canvas width")?;
    let ch = to_u16(canvas.height, "canvas height")?;

    let src = source.clone().into_premultiplied();
    let pixmap = premul_bytes_to_pixmap(&src.data, src.width, src.height)?;
    let paint = vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    };

    let mut warped = vello_cpu::Pixmap::new(cw, ch);
    let mut ctx = vello_cpu::RenderContext::new(cw, ch);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(vello_cpu::kurbo::Affine::new(
        transform.to_affine().as_coeffs(),
    ));
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(src.width),
        f64::from(src.height),
    ));
    ctx.flush();
    ctx.render_to_pixmap(&mut warped);

    let mut bg = background;
    premultiply_rgba8_in_place(&mut bg);
    let mut out = Vec::with_capacity(canvas.pixel_len() * 4);
    for _ in 0..canvas.pixel_len() {
        out.extend_from_slice(&bg);
    }
    blend_over_premul(&mut out, warped.data_as_u8_slice());

    FrameRGBA::new(canvas.width, canvas.height, out, true)
}

fn to_u16(v: u32, what: &str) -> FacelapseResult<u16> {
    v.try_into()
        .map_err(|_| FacelapseError::render(format!("{what} {v} exceeds {}", u16::MAX)))
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> FacelapseResult<vello_cpu::Pixmap> {
    let w = to_u16(width, "image width")?;
    let h = to_u16(height, "image height")?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(FacelapseError::render("source image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
