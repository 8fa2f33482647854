use super::*;

fn dark(w: u32, h: u32) -> FrameRGBA {
    FrameRGBA::new(w, h, [10u8, 10, 10, 255].repeat((w * h) as usize), true).unwrap()
}

fn system_fonts() -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    Arc::new(db)
}

#[test]
fn svg_escapes_text_and_scales_with_canvas() {
    let style = CaptionStyle::default();
    let svg = caption_svg(400, 200, "Tom & <Jerry> \"2024\"", &style);
    assert!(svg.contains("Tom &amp; &lt;Jerry&gt; &quot;2024&quot;"));
    assert!(svg.contains(r#"font-size="10.000""#));
    assert!(svg.contains(r#"x="20.000" y="190.000""#));
    assert!(svg.contains(r#"text-anchor="start""#));
    assert!(svg.contains(r#"paint-order="stroke""#));
}

#[test]
fn generic_families_stay_unquoted() {
    let list = font_family_list(&["DejaVu Sans".to_string(), "sans-serif".to_string()]);
    assert_eq!(list, "'DejaVu Sans', sans-serif");
}

#[test]
fn empty_caption_leaves_frame_untouched() {
    let frame = dark(32, 16);
    let out = draw_caption(frame.clone(), "", &CaptionStyle::default(), system_fonts()).unwrap();
    assert_eq!(out, frame);
}

#[test]
fn caption_keeps_dimensions_and_is_deterministic() {
    let style = CaptionStyle {
        font_size: 0.3,
        ..CaptionStyle::default()
    };
    let fonts = system_fonts();
    let a = draw_caption(dark(120, 60), "2024-01-31", &style, Arc::clone(&fonts)).unwrap();
    let b = draw_caption(dark(120, 60), "2024-01-31", &style, fonts).unwrap();
    assert_eq!((a.width, a.height), (120, 60));
    assert!(a.premultiplied);
    assert_eq!(a, b);
}

#[test]
fn style_validation() {
    assert!(CaptionStyle::default().validate().is_ok());
    let bad = CaptionStyle {
        font_size: 0.0,
        ..CaptionStyle::default()
    };
    assert!(bad.validate().is_err());
    let bad = CaptionStyle {
        stroke_width: -1.0,
        ..CaptionStyle::default()
    };
    assert!(bad.validate().is_err());
}
