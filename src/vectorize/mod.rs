//! Vectorization pipeline: binary bitmap → closed corner/curve paths.
//!
//! 1. Pixel-edge contour extraction with turn-policy disambiguation
//! 2. Optimal polygon approximation
//! 3. Corner classification and Bézier control-point synthesis
//! 4. Curve-run merging (optional)

pub mod curve;
pub mod decompose;
pub mod polygon;

use rayon::prelude::*;

use crate::bitmap::Bitmap;
use crate::config::Config;
use crate::error::TraceError;

pub use curve::{Path, Segment};
pub use decompose::ContourKind;

/// Trace every foreground region of `bitmap` into a closed path.
///
/// Contours are extracted sequentially in raster-scan order; the
/// per-contour fitting stages are independent and run in parallel, with
/// the output preserving discovery order. Contours that reduce to fewer
/// than 3 polygon vertices are visually negligible and dropped.
pub fn trace(bitmap: &Bitmap, config: &Config) -> Result<Vec<Path>, TraceError> {
    config.validate()?;
    if bitmap.width() == 0 || bitmap.height() == 0 {
        return Err(TraceError::InvalidBitmap {
            width: bitmap.width(),
            height: bitmap.height(),
        });
    }

    let contours = decompose::decompose(bitmap, config.turdsize, config.turnpolicy);
    let opttolerance = config.opticurve.then_some(config.opttolerance);

    let paths: Vec<Path> = contours
        .par_iter()
        .filter_map(|contour| {
            let poly = polygon::optimal_polygon(contour);
            curve::fit(&poly, config.alphamax, opttolerance)
        })
        .collect();

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TurnPolicy;

    fn config(turdsize: i64, alphamax: f64) -> Config {
        Config {
            turdsize,
            alphamax,
            ..Config::default()
        }
    }

    fn square_bitmap(canvas: u32, origin: u32, side: u32) -> Bitmap {
        let mut bm = Bitmap::new(canvas, canvas);
        for y in origin..origin + side {
            for x in origin..origin + side {
                bm.set(x, y, true);
            }
        }
        bm
    }

    fn disc_bitmap(canvas: u32, radius: f64) -> Bitmap {
        let mut bm = Bitmap::new(canvas, canvas);
        let c = canvas as f64 / 2.0;
        for y in 0..canvas {
            for x in 0..canvas {
                let dx = x as f64 + 0.5 - c;
                let dy = y as f64 + 0.5 - c;
                if dx * dx + dy * dy <= radius * radius {
                    bm.set(x, y, true);
                }
            }
        }
        bm
    }

    #[test]
    fn zero_dimension_bitmap_is_rejected() {
        let bm = Bitmap::new(0, 8);
        assert!(matches!(
            trace(&bm, &config(0, 0.5)),
            Err(TraceError::InvalidBitmap { width: 0, height: 8 })
        ));
    }

    #[test]
    fn invalid_parameters_abort_before_tracing() {
        let bm = square_bitmap(8, 2, 4);
        assert!(trace(&bm, &config(-1, 0.5)).is_err());
        assert!(trace(&bm, &config(0, 3.0)).is_err());
    }

    #[test]
    fn all_background_yields_no_paths() {
        let bm = Bitmap::new(8, 8);
        let paths = trace(&bm, &config(0, 0.5)).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn square_traces_to_four_corner_segments() {
        // 10x10 filled square, turdsize 0, alphamax 0: one path of exactly
        // four corner segments on the square's boundary.
        let bm = square_bitmap(14, 2, 10);
        let paths = trace(&bm, &config(0, 0.0)).unwrap();
        assert_eq!(paths.len(), 1);

        let path = &paths[0];
        assert_eq!(path.segments.len(), 4);
        assert!(path.segments.iter().all(|s| s.is_corner()));

        // Corner points land on the square's lattice corners, within the
        // one-pixel containment guarantee.
        let expected = [(2.0, 2.0), (2.0, 12.0), (12.0, 12.0), (12.0, 2.0)];
        for seg in &path.segments {
            let Segment::Corner { corner, .. } = seg else {
                unreachable!();
            };
            assert!(
                expected
                    .iter()
                    .any(|&(ex, ey)| (corner.x - ex).abs().max((corner.y - ey).abs()) <= 1.0),
                "corner {corner:?} not near any square corner"
            );
        }
    }

    #[test]
    fn turdsize_above_area_drops_the_square() {
        let bm = square_bitmap(14, 2, 10);
        let paths = trace(&bm, &config(200, 0.0)).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn disc_traces_to_few_curve_segments() {
        // Radius-20 disc on a 50x50 grid at alphamax 1.0: one path, mostly
        // curves, fewer than 8 segments once runs are merged.
        let bm = disc_bitmap(50, 20.0);
        let paths = trace(&bm, &config(0, 1.0)).unwrap();
        assert_eq!(paths.len(), 1);

        let path = &paths[0];
        assert!(
            path.segments.len() < 8,
            "expected < 8 segments, got {}",
            path.segments.len()
        );
        let curves = path.segments.iter().filter(|s| !s.is_corner()).count();
        assert!(curves > path.segments.len() / 2);

        // Endpoints stay near the circle.
        for seg in &path.segments {
            let r = seg.end().distance(kurbo::Point::new(25.0, 25.0));
            assert!((17.0..=22.0).contains(&r), "endpoint radius {r}");
        }
    }

    #[test]
    fn every_path_closes() {
        let mut bm = disc_bitmap(50, 20.0);
        // Punch a square hole so both contour kinds are covered.
        for y in 20..30 {
            for x in 20..30 {
                bm.set(x, y, false);
            }
        }
        let paths = trace(&bm, &config(0, 0.5)).unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].kind, ContourKind::Outer);
        assert_eq!(paths[1].kind, ContourKind::Hole);
        for path in &paths {
            let last = path.segments.last().unwrap().end();
            assert!(last.distance(path.start) < 1e-9);
        }
    }

    #[test]
    fn saddle_policies_change_the_output() {
        let mut bm = Bitmap::new(4, 4);
        bm.set(1, 1, true);
        bm.set(2, 2, true);

        let left = trace(
            &bm,
            &Config {
                turdsize: 0,
                turnpolicy: TurnPolicy::Left,
                ..Config::default()
            },
        )
        .unwrap();
        let right = trace(
            &bm,
            &Config {
                turdsize: 0,
                turnpolicy: TurnPolicy::Right,
                ..Config::default()
            },
        )
        .unwrap();
        assert_ne!(left.len(), right.len());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let bm = disc_bitmap(40, 15.0);
        let config = config(0, 1.0);
        let a = trace(&bm, &config).unwrap();
        let b = trace(&bm, &config).unwrap();
        assert_eq!(a.len(), b.len());
        for (pa, pb) in a.iter().zip(&b) {
            assert_eq!(pa.start, pb.start);
            assert_eq!(pa.segments, pb.segments);
        }
    }
}
