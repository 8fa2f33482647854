use crate::foundation::{
    core::{Affine, Canvas, Point, Vec2},
    error::{FacelapseError, FacelapseResult},
};

/// Eye separations shorter than this (in source pixels) are treated as coincident eyes.
pub const MIN_EYE_SEPARATION: f64 = 1e-6;

/// Where the eyes should land in the output canvas.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AlignmentTarget {
    /// Desired distance between eye centers, in output pixels.
    pub eye_separation: f64,
    /// Desired eye midpoint, in output canvas coordinates.
    pub eye_midpoint: Point,
    pub canvas: Canvas,
    /// Extra rotation applied after levelling, in degrees (positive is clockwise on screen).
    pub tilt_degrees: f64,
    /// Levelling rotations beyond this magnitude are rejected.
    pub max_rotation_degrees: f64,
    /// Levelling rotations beyond this magnitude are logged.
    pub warn_rotation_degrees: f64,
}

/// Similarity transform from source-image to canvas coordinates:
/// `p' = scale * R(rotation) * p + translation`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AlignmentTransform {
    /// Radians, in image coordinates (y down), so positive turns clockwise on screen.
    pub rotation_rad: f64,
    pub scale: f64,
    pub translation: Vec2,
}

impl AlignmentTransform {
    /// Single combined matrix, suitable for one resampling pass.
    pub fn to_affine(&self) -> Affine {
        let (sin, cos) = self.rotation_rad.sin_cos();
        let s = self.scale;
        Affine::new([
            s * cos,
            s * sin,
            -s * sin,
            s * cos,
            self.translation.x,
            self.translation.y,
        ])
    }

    pub fn apply(&self, p: Point) -> Point {
        self.to_affine() * p
    }

    pub fn rotation_degrees(&self) -> f64 {
        self.rotation_rad.to_degrees()
    }
}

/// Compute the transform that levels the eye line, scales the eye distance to
/// `target.eye_separation`, and moves the eye midpoint onto `target.eye_midpoint`.
pub fn solve_alignment(
    left_eye: Point,
    right_eye: Point,
    target: &AlignmentTarget,
) -> FacelapseResult<AlignmentTransform> {
    if !(left_eye.is_finite() && right_eye.is_finite()) {
        return Err(FacelapseError::degenerate(format!(
            "eye centers are not finite: {left_eye:?}, {right_eye:?}"
        )));
    }

    let v = right_eye - left_eye;
    let d_source = v.hypot();
    if d_source < MIN_EYE_SEPARATION {
        return Err(FacelapseError::degenerate(format!(
            "eye centers coincide at ({:.2}, {:.2})",
            left_eye.x, left_eye.y
        )));
    }

    let level = -v.y.atan2(v.x);
    let level_degrees = level.to_degrees().abs();
    if level_degrees >= target.max_rotation_degrees {
        return Err(FacelapseError::ExcessiveRotation {
            degrees: level_degrees,
            limit: target.max_rotation_degrees,
        });
    }
    if level_degrees > target.warn_rotation_degrees {
        tracing::warn!(
            degrees = level_degrees,
            "large levelling rotation; consider straightening the photo by hand"
        );
    }

    let rotation_rad = level + target.tilt_degrees.to_radians();
    let scale = target.eye_separation / d_source;

    let mid_source = left_eye.midpoint(right_eye);
    let linear = AlignmentTransform {
        rotation_rad,
        scale,
        translation: Vec2::ZERO,
    };
    let mapped = linear.apply(mid_source);
    let translation = target.eye_midpoint - mapped;

    Ok(AlignmentTransform {
        rotation_rad,
        scale,
        translation,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/transform/solver.rs"]
mod tests;
