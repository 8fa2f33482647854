use std::{fmt::Write as _, path::Path, sync::Arc};

use crate::foundation::{
    core::FrameRGBA,
    error::{FacelapseError, FacelapseResult},
    math::blend_over_premul,
};

/// Horizontal alignment of the caption relative to its position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

impl TextAnchor {
    fn as_svg(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// Caption appearance. Sizes and positions are ratios of the canvas so one style works for any
/// output resolution.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionStyle {
    /// Baseline anchor point as `[x, y]` fractions of the canvas.
    pub position: [f64; 2],
    pub anchor: TextAnchor,
    /// Font size as a fraction of the canvas height.
    pub font_size: f64,
    /// Straight RGBA.
    pub fill_rgba: [u8; 4],
    /// Straight RGBA of the outline drawn behind the fill.
    pub stroke_rgba: [u8; 4],
    /// Outline width as a fraction of the font size.
    pub stroke_width: f64,
    /// CSS-style family list, most preferred first.
    pub font_families: Vec<String>,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            position: [0.05, 0.95],
            anchor: TextAnchor::Start,
            font_size: 0.05,
            fill_rgba: [255, 255, 255, 255],
            stroke_rgba: [0, 0, 0, 255],
            stroke_width: 0.2,
            font_families: vec!["DejaVu Sans".to_string(), "sans-serif".to_string()],
        }
    }
}

impl CaptionStyle {
    pub fn validate(&self) -> FacelapseResult<()> {
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(FacelapseError::validation(
                "caption.style.font_size must be > 0",
            ));
        }
        if !(self.stroke_width.is_finite() && self.stroke_width >= 0.0) {
            return Err(FacelapseError::validation(
                "caption.style.stroke_width must be >= 0",
            ));
        }
        if !self.position.iter().all(|v| v.is_finite()) {
            return Err(FacelapseError::validation(
                "caption.style.position must be finite",
            ));
        }
        Ok(())
    }
}

/// Render `text` with `style` and composite it over the premultiplied `frame`.
pub(crate) fn draw_caption(
    frame: FrameRGBA,
    text: &str,
    style: &CaptionStyle,
    fontdb: Arc<usvg::fontdb::Database>,
) -> FacelapseResult<FrameRGBA> {
    if text.trim().is_empty() {
        return Ok(frame);
    }
    let mut frame = frame.into_premultiplied();

    let svg = caption_svg(frame.width, frame.height, text, style);
    let opts = usvg::Options {
        fontdb,
        ..Default::default()
    };
    let tree = usvg::Tree::from_data(svg.as_bytes(), &opts)
        .map_err(|e| FacelapseError::render(format!("build caption: {e}")))?;
    if tree.root().children().is_empty() {
        tracing::warn!(
            families = ?style.font_families,
            "no installed font matched the caption style; caption skipped"
        );
        return Ok(frame);
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(frame.width, frame.height)
        .ok_or_else(|| FacelapseError::render("failed to allocate caption pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );
    blend_over_premul(&mut frame.data, pixmap.data());
    Ok(frame)
}

fn caption_svg(width: u32, height: u32, text: &str, style: &CaptionStyle) -> String {
    let h = f64::from(height);
    let font_px = style.font_size * h;
    let x = style.position[0] * f64::from(width);
    let y = style.position[1] * h;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = write!(
        svg,
        r#"<text x="{x:.3}" y="{y:.3}" text-anchor="{}" font-family="{}" font-size="{font_px:.3}" {} {} stroke-width="{:.3}" stroke-linejoin="round" paint-order="stroke">{}</text></svg>"#,
        style.anchor.as_svg(),
        escape_xml(&font_family_list(&style.font_families)),
        paint_attr("fill", style.fill_rgba),
        paint_attr("stroke", style.stroke_rgba),
        style.stroke_width * font_px,
        escape_xml(text),
    );
    svg
}

fn paint_attr(name: &str, rgba: [u8; 4]) -> String {
    format!(
        r#"{name}="rgb({},{},{})" {name}-opacity="{:.4}""#,
        rgba[0],
        rgba[1],
        rgba[2],
        f64::from(rgba[3]) / 255.0
    )
}

fn font_family_list(families: &[String]) -> String {
    const GENERIC: &[&str] = &["serif", "sans-serif", "monospace", "cursive", "fantasy"];
    families
        .iter()
        .map(|f| {
            if GENERIC.contains(&f.as_str()) {
                f.clone()
            } else {
                format!("'{}'", f.replace('\'', ""))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

pub(crate) fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "font directory is not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to load font");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/caption.rs"]
mod tests;
