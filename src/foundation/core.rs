use crate::foundation::error::{FacelapseError, FacelapseResult};
use crate::foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Output canvas size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> FacelapseResult<Self> {
        if width == 0 || height == 0 {
            return Err(FacelapseError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        Ok(Self { width, height })
    }

    pub fn pixel_len(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Axis-aligned face bounding box, in source-image pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.left(), self.top(), self.right(), self.bottom())
    }
}

/// RGBA8 pixel buffer.
///
/// Renderers work in premultiplied alpha; decoded inputs and encoded outputs are straight alpha.
/// `premultiplied` records which one `data` currently holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    pub fn new(width: u32, height: u32, data: Vec<u8>, premultiplied: bool) -> FacelapseResult<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(FacelapseError::validation(format!(
                "frame data length {} does not match {width}x{height} rgba8",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            premultiplied,
        })
    }

    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
            premultiplied: false,
        }
    }

    pub fn into_premultiplied(mut self) -> Self {
        if !self.premultiplied {
            premultiply_rgba8_in_place(&mut self.data);
            self.premultiplied = true;
        }
        self
    }

    pub fn into_straight(mut self) -> Self {
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut self.data);
            self.premultiplied = false;
        }
        self
    }

    /// Straight-alpha `image` buffer view of this frame.
    pub fn into_rgba_image(self) -> FacelapseResult<image::RgbaImage> {
        let straight = self.into_straight();
        image::RgbaImage::from_raw(straight.width, straight.height, straight.data)
            .ok_or_else(|| FacelapseError::render("frame buffer size mismatch"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
