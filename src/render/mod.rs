//! Render collaborator: warp a photo onto the output canvas, overlay its caption, encode it.

pub(crate) mod caption;
pub(crate) mod cpu;
pub(crate) mod encode;

use crate::{
    foundation::{
        core::{Canvas, FrameRGBA},
        error::FacelapseResult,
    },
    transform::solver::AlignmentTransform,
};

pub use caption::CaptionStyle;

/// Pixel operations the pipeline needs. Both calls must be deterministic for identical inputs;
/// the frame cache and the byte-identical rerun guarantee depend on it.
pub trait FrameRenderer: Send + Sync {
    /// Resample `source` through `transform` into a `canvas`-sized frame, in a single pass,
    /// composited over `background` (straight RGBA). Returns a premultiplied frame.
    fn warp(
        &self,
        source: &FrameRGBA,
        transform: &AlignmentTransform,
        canvas: Canvas,
        background: [u8; 4],
    ) -> FacelapseResult<FrameRGBA>;

    /// Draw `text` onto `frame` (premultiplied) using `style`.
    fn caption(&self, frame: FrameRGBA, text: &str, style: &CaptionStyle)
    -> FacelapseResult<FrameRGBA>;
}
