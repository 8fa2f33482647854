use super::*;

fn frame(alpha: u8) -> FrameRGBA {
    let mut data = Vec::new();
    for i in 0..6u8 * 4 {
        data.extend_from_slice(&[i * 10, 255 - i * 10, i, alpha]);
    }
    FrameRGBA::new(6, 4, data, false).unwrap()
}

#[test]
fn png_round_trips_opaque_pixels_as_rgb() {
    let bytes = encode_frame(frame(255), OutputFormat::Png, 90).unwrap();
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!(img.color(), image::ColorType::Rgb8);
    let rgba = img.into_rgba8();
    assert_eq!(rgba.into_raw(), frame(255).data);
}

#[test]
fn png_keeps_alpha_when_translucent() {
    let bytes = encode_frame(frame(128), OutputFormat::Png, 90).unwrap();
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!(img.color(), image::ColorType::Rgba8);
}

#[test]
fn jpeg_requires_opaque_frames() {
    let bytes = encode_frame(frame(255), OutputFormat::Jpeg, 90).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    let err = encode_frame(frame(10), OutputFormat::Jpeg, 90).unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::Render);
}

#[test]
fn encoding_is_byte_stable() {
    for format in [OutputFormat::Png, OutputFormat::Jpeg] {
        let a = encode_frame(frame(255), format, 85).unwrap();
        let b = encode_frame(frame(255), format, 85).unwrap();
        assert_eq!(a, b);
    }
    assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
}
