//! img2svg: raster images → stylable SVG outlines.
//!
//! Binarizes an image, traces closed contours of the foreground regions,
//! reduces each pixel boundary to an optimal polygon, fits corners and
//! cubic Béziers, and serializes the result as an SVG document.
//!
//! # Example
//!
//! ```no_run
//! use img2svg::Config;
//! use std::path::Path;
//!
//! let svg = img2svg::convert(Path::new("logo.png"), &Config::default())?;
//! # Ok::<(), img2svg::TraceError>(())
//! ```
//!
//! The tracing core is also usable directly on an in-memory bitmap:
//! [`trace`] turns a [`Bitmap`] into [`Path`]s, and [`render`] turns
//! paths into the final document string.

#![forbid(unsafe_code)]

mod bitmap;
mod config;
mod geom;
mod svg;
mod vectorize;

pub mod error;

// Re-export kurbo so downstream users get the same Point type used by
// Path and Segment.
pub use kurbo;

pub use bitmap::{binarize, load_and_binarize, Bitmap};
pub use config::{Config, TurnPolicy};
pub use error::TraceError;
pub use svg::{render, SvgStyle};
pub use vectorize::{trace, ContourKind, Path, Segment};

use std::time::Instant;

/// Full pipeline: image file → SVG document string.
///
/// Binarization follows the config's blur/block/C settings; tracing and
/// serialization follow its tracing and styling settings. Progress is
/// reported on stderr.
pub fn convert(image_path: &std::path::Path, config: &Config) -> Result<String, TraceError> {
    let t_start = Instant::now();
    config.validate()?;

    // ── Load & binarize ───────────────────────────────────
    let bm = bitmap::load_and_binarize(image_path, config)?;
    eprintln!(
        "  Load        {}x{} px, blur {} \u{00b7} block {} \u{00b7} C {}",
        bm.width(),
        bm.height(),
        config.blur_size,
        config.block_size,
        config.c_value,
    );

    // ── Trace ─────────────────────────────────────────────
    let paths = vectorize::trace(&bm, config)?;
    let (curves, corners) = count_segments(&paths);
    eprintln!(
        "  Trace       {} contours \u{2192} {} curves + {} corners  ({}ms)",
        paths.len(),
        curves,
        corners,
        t_start.elapsed().as_millis(),
    );

    // ── Serialize ─────────────────────────────────────────
    let style = SvgStyle {
        fill: config.fill.clone(),
        stroke: config.stroke.clone(),
        stroke_width: config.stroke_width,
    };
    Ok(svg::render(&paths, bm.width(), bm.height(), &style))
}

/// Count (curve, corner) segments across a set of paths.
fn count_segments(paths: &[Path]) -> (usize, usize) {
    let mut curves = 0;
    let mut corners = 0;
    for path in paths {
        for segment in &path.segments {
            if segment.is_corner() {
                corners += 1;
            } else {
                curves += 1;
            }
        }
    }
    (curves, corners)
}
