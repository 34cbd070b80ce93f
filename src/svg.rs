//! SVG document serialization.
//!
//! Pure string assembly with no I/O: the same paths and styling always
//! produce byte-identical output. Coordinates are written with fixed
//! 2-decimal precision; downstream renderers rely on the stable format.

use std::fmt::Write;

use crate::vectorize::{Path, Segment};

/// Styling applied to every emitted `<path>` element.
#[derive(Debug, Clone)]
pub struct SvgStyle {
    pub fill: String,
    pub stroke: String,
    /// 0 suppresses the stroke attributes entirely.
    pub stroke_width: f64,
}

impl Default for SvgStyle {
    fn default() -> Self {
        SvgStyle {
            fill: "#000000".to_string(),
            stroke: "#000000".to_string(),
            stroke_width: 0.0,
        }
    }
}

/// Render paths into a complete SVG document sized to the source bitmap.
///
/// The viewport equals the bitmap dimensions (one document unit per pixel,
/// origin top-left, y down). Each path becomes its own `<path>` element:
/// a move-to, two line-tos per corner segment, one curve-to per curve
/// segment, and a close.
pub fn render(paths: &[Path], width: u32, height: u32, style: &SvgStyle) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#,
        w = width,
        h = height,
    );

    let stroke_attr = if style.stroke_width > 0.0 {
        format!(
            r#"stroke="{}" stroke-width="{}""#,
            style.stroke, style.stroke_width
        )
    } else {
        r#"stroke="none""#.to_string()
    };

    for path in paths {
        if path.segments.is_empty() {
            continue;
        }
        let mut d = String::new();
        let _ = write!(d, "M {:.2} {:.2} ", path.start.x, path.start.y);
        for segment in &path.segments {
            match *segment {
                Segment::Corner { corner, end } => {
                    let _ = write!(
                        d,
                        "L {:.2} {:.2} L {:.2} {:.2} ",
                        corner.x, corner.y, end.x, end.y
                    );
                }
                Segment::Curve { c1, c2, end } => {
                    let _ = write!(
                        d,
                        "C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} ",
                        c1.x, c1.y, c2.x, c2.y, end.x, end.y
                    );
                }
            }
        }
        d.push('Z');
        let _ = writeln!(out, r#"<path d="{}" fill="{}" {}/>"#, d, style.fill, stroke_attr);
    }

    out.push_str("</svg>\n");
    out
}
