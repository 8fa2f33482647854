use super::*;
use crate::foundation::core::Vec2;

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> FrameRGBA {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for _ in 0..w * h {
        data.extend_from_slice(&rgba);
    }
    FrameRGBA::new(w, h, data, false).unwrap()
}

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [frame.data[i], frame.data[i + 1], frame.data[i + 2], frame.data[i + 3]]
}

fn near(a: [u8; 4], b: [u8; 4], tol: u8) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= tol)
}

fn shift(dx: f64, dy: f64) -> AlignmentTransform {
    AlignmentTransform {
        rotation_rad: 0.0,
        scale: 1.0,
        translation: Vec2::new(dx, dy),
    }
}

#[test]
fn uncovered_canvas_shows_background() {
    let src = solid(8, 8, [200, 10, 10, 255]);
    let canvas = Canvas::new(24, 8).unwrap();
    let out = warp_frame(&src, &shift(8.0, 0.0), canvas, [0, 0, 255, 255]).unwrap();
    assert_eq!((out.width, out.height), (24, 8));
    assert!(out.premultiplied);
    assert_eq!(px(&out, 2, 4), [0, 0, 255, 255]);
    assert_eq!(px(&out, 21, 4), [0, 0, 255, 255]);
    assert!(near(px(&out, 12, 4), [200, 10, 10, 255], 2));
}

#[test]
fn scaling_covers_more_of_the_canvas() {
    let src = solid(4, 4, [10, 200, 10, 255]);
    let t = AlignmentTransform {
        rotation_rad: 0.0,
        scale: 4.0,
        translation: Vec2::ZERO,
    };
    let out = warp_frame(&src, &t, Canvas::new(20, 20).unwrap(), [0, 0, 0, 255]).unwrap();
    assert!(near(px(&out, 8, 8), [10, 200, 10, 255], 2));
    assert_eq!(px(&out, 18, 18), [0, 0, 0, 255]);
}

#[test]
fn warp_is_deterministic() {
    let mut data = Vec::new();
    for i in 0..16u32 * 16 {
        data.extend_from_slice(&[(i % 251) as u8, (i * 7 % 253) as u8, (i * 13 % 255) as u8, 255]);
    }
    let src = FrameRGBA::new(16, 16, data, false).unwrap();
    let t = AlignmentTransform {
        rotation_rad: 0.3,
        scale: 1.7,
        translation: Vec2::new(3.5, -2.25),
    };
    let canvas = Canvas::new(32, 32).unwrap();
    let a = warp_frame(&src, &t, canvas, [20, 20, 20, 255]).unwrap();
    let b = warp_frame(&src, &t, canvas, [20, 20, 20, 255]).unwrap();
    assert_eq!(a, b);
}

#[test]
fn oversized_canvas_is_rejected() {
    let src = solid(1, 1, [0, 0, 0, 255]);
    let canvas = Canvas::new(70_000, 1).unwrap();
    let err = warp_frame(&src, &shift(0.0, 0.0), canvas, [0, 0, 0, 255]).unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::Render);
}

#[test]
fn renderer_trait_delegates() {
    let r = CpuRenderer::new(&[]);
    let src = solid(4, 4, [1, 2, 3, 255]);
    let out = r
        .warp(&src, &shift(0.0, 0.0), Canvas::new(4, 4).unwrap(), [0, 0, 0, 255])
        .unwrap();
    let same = r.caption(out.clone(), "  ", &CaptionStyle::default()).unwrap();
    assert_eq!(out, same);
}
