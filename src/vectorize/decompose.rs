//! Closed-contour extraction on the pixel-corner grid.
//!
//! Boundaries are walked between pixels rather than through pixel centers,
//! one lattice corner per unit step. Each traced region is removed from a
//! working copy by XOR-filling its interior, which makes enclosed holes
//! reappear as fresh foreground on a later scan line.

use crate::bitmap::Bitmap;
use crate::config::TurnPolicy;

/// Whether a contour bounds foreground or a hole inside it.
///
/// Outer boundaries come out counter-clockwise as the image is viewed,
/// holes clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContourKind {
    Outer,
    Hole,
}

/// A closed loop of pixel-corner lattice points.
#[derive(Debug, Clone)]
pub struct RawContour {
    /// Corner coordinates. (0,0) is the top-left corner of the image,
    /// (w,h) the bottom-right.
    pub points: Vec<(i32, i32)>,
    pub kind: ContourKind,
    /// Enclosed pixel area (absolute shoelace value).
    pub area: i64,
}

/// Extract every region boundary from `bitmap`, in raster-scan discovery
/// order, dropping contours whose enclosed area is below `turdsize`.
pub fn decompose(bitmap: &Bitmap, turdsize: i64, policy: TurnPolicy) -> Vec<RawContour> {
    let mut work = bitmap.clone();
    let mut contours = Vec::new();
    let w = bitmap.width() as i32;
    let h = bitmap.height() as i32;

    for y in 0..h {
        for x in 0..w {
            if !work.get(x, y) {
                continue;
            }
            // The original bitmap tells outer from hole: a region that only
            // exists in the XOR'd working copy is a hole boundary.
            let kind = if bitmap.get(x, y) {
                ContourKind::Outer
            } else {
                ContourKind::Hole
            };
            let mut contour = walk_boundary(&work, x, y, kind, policy);
            xor_fill(&mut work, &contour.points);
            // The walk always keeps its region on the left, so every raw
            // loop shares one handedness; flipping holes gives them the
            // opposite winding from outer boundaries.
            if contour.kind == ContourKind::Hole {
                contour.points.reverse();
            }
            if contour.area >= turdsize {
                contours.push(contour);
            }
        }
    }

    contours
}

/// Walk one boundary starting at the top-left corner of pixel (x0, y0),
/// which the raster scan guarantees is the first working-foreground pixel
/// of its region. The walk keeps foreground on its left, so it heads down
/// along the pixel's left edge and returns to the start after one loop.
fn walk_boundary(
    work: &Bitmap,
    x0: i32,
    y0: i32,
    kind: ContourKind,
    policy: TurnPolicy,
) -> RawContour {
    let mut points = Vec::new();
    let (mut x, mut y) = (x0, y0);
    let (mut dx, mut dy) = (0i32, 1i32);

    loop {
        points.push((x, y));
        x += dx;
        y += dy;
        if (x, y) == (x0, y0) {
            break;
        }

        // The two pixels flanking the edge ahead of (x, y). The offset
        // expressions map each cardinal direction to the pixel on the
        // walk's left and right (integer division truncates toward zero,
        // matching the table below):
        //
        //   dir (dx,dy)  │ left pixel          right pixel
        //   ─────────────┼──────────────────────────────────
        //   Down  (0, 1) │ (x,   y  )          (x-1, y  )
        //   Up    (0,-1) │ (x-1, y-1)          (x,   y-1)
        //   East  (1, 0) │ (x,   y-1)          (x,   y  )
        //   West  (-1,0) │ (x-1, y  )          (x-1, y-1)
        let left = work.get(x + (dx + dy - 1) / 2, y + (dy - dx - 1) / 2);
        let right = work.get(x + (dx - dy - 1) / 2, y + (dy + dx - 1) / 2);

        if right && !left {
            // Saddle: the policy picks a side.
            if turns_right(policy, work, x, y, kind) {
                (dx, dy) = (-dy, dx);
            } else {
                (dx, dy) = (dy, -dx);
            }
        } else if right {
            // Both ahead: turn right to keep foreground on the left.
            (dx, dy) = (-dy, dx);
        } else if !left {
            // Neither ahead: turn left around the convex corner.
            (dx, dy) = (dy, -dx);
        }
    }

    let area = shoelace_area(&points).abs();
    RawContour { points, kind, area }
}

/// Resolve the ambiguous saddle turn at corner (x, y). true = turn right.
fn turns_right(policy: TurnPolicy, work: &Bitmap, x: i32, y: i32, kind: ContourKind) -> bool {
    match policy {
        TurnPolicy::Right => true,
        TurnPolicy::Left => false,
        TurnPolicy::Black => kind == ContourKind::Outer,
        TurnPolicy::White => kind == ContourKind::Hole,
        TurnPolicy::Majority => majority(work, x, y),
        TurnPolicy::Minority => !majority(work, x, y),
        TurnPolicy::Random => detrand(x, y),
    }
}

/// Foreground majority around corner (x, y).
///
/// Votes over a ring of pixels at half-width 2 (the pixels bordering the
/// 3x3 corner neighborhood); ties widen the ring to half-widths 3 and 4
/// before defaulting to false.
fn majority(work: &Bitmap, x: i32, y: i32) -> bool {
    for half in 2..5 {
        let mut vote = 0i32;
        for a in -half + 1..half {
            vote += if work.get(x + a, y + half - 1) { 1 } else { -1 };
            vote += if work.get(x + half - 1, y + a - 1) { 1 } else { -1 };
            vote += if work.get(x + a - 1, y - half) { 1 } else { -1 };
            vote += if work.get(x - half, y + a) { 1 } else { -1 };
        }
        if vote > 0 {
            return true;
        }
        if vote < 0 {
            return false;
        }
    }
    false
}

/// Deterministic pseudo-random bit from a lattice position. Keeps the
/// `random` policy reproducible across runs and platforms.
fn detrand(x: i32, y: i32) -> bool {
    let mut z = (x as u32).wrapping_mul(0x04b3_e375) ^ (y as u32);
    z = z.wrapping_mul(0x05a8_ef93);
    z ^= z >> 16;
    z ^= z >> 8;
    (z & 1) != 0
}

/// Remove a traced region from the working bitmap.
///
/// For every vertical boundary step, toggle the pixel row from that column
/// to the right edge. Toggles cancel pairwise outside the region and flip
/// exactly its interior.
fn xor_fill(work: &mut Bitmap, points: &[(i32, i32)]) {
    let n = points.len();
    if n == 0 {
        return;
    }
    let mut y_prev = points[n - 1].1;
    for &(x, y) in points {
        if y != y_prev {
            work.xor_row_from(x, y.min(y_prev));
        }
        y_prev = y;
    }
}

/// Signed shoelace sum over a closed lattice loop, halved.
fn shoelace_area(points: &[(i32, i32)]) -> i64 {
    let n = points.len();
    if n < 3 {
        return 0;
    }
    let mut sum = 0i64;
    for i in 0..n {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % n];
        sum += x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64;
    }
    sum / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap_from(rows: &[&str]) -> Bitmap {
        let h = rows.len() as u32;
        let w = rows[0].len() as u32;
        let mut bm = Bitmap::new(w, h);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' {
                    bm.set(x as u32, y as u32, true);
                }
            }
        }
        bm
    }

    #[test]
    fn empty_bitmap_yields_no_contours() {
        let bm = Bitmap::new(8, 8);
        assert!(decompose(&bm, 0, TurnPolicy::Majority).is_empty());
    }

    #[test]
    fn single_pixel_traces_unit_square() {
        let bm = bitmap_from(&["#"]);
        let contours = decompose(&bm, 0, TurnPolicy::Majority);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        assert_eq!(c.kind, ContourKind::Outer);
        assert_eq!(c.area, 1);
        assert_eq!(c.points, vec![(0, 0), (0, 1), (1, 1), (1, 0)]);
    }

    #[test]
    fn filled_square_has_matching_area() {
        let bm = bitmap_from(&[
            "....",
            ".##.",
            ".##.",
            "....",
        ]);
        let contours = decompose(&bm, 0, TurnPolicy::Majority);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].area, 4);
        // One lattice corner per unit step: point count equals perimeter.
        assert_eq!(contours[0].points.len(), 8);
    }

    #[test]
    fn turdsize_drops_small_contours_keeps_equal() {
        let bm = bitmap_from(&[
            "#....",
            "..###",
            "..###",
        ]);
        // Area 1 speckle and area 6 block.
        let all = decompose(&bm, 0, TurnPolicy::Majority);
        assert_eq!(all.len(), 2);

        let filtered = decompose(&bm, 2, TurnPolicy::Majority);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].area, 6);

        // Threshold equal to the area keeps the contour.
        let at_threshold = decompose(&bm, 6, TurnPolicy::Majority);
        assert_eq!(at_threshold.len(), 1);

        let above = decompose(&bm, 7, TurnPolicy::Majority);
        assert!(above.is_empty());
    }

    #[test]
    fn ring_produces_outer_and_hole() {
        let bm = bitmap_from(&[
            "###",
            "#.#",
            "###",
        ]);
        let contours = decompose(&bm, 0, TurnPolicy::Majority);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].kind, ContourKind::Outer);
        assert_eq!(contours[0].area, 9);
        assert_eq!(contours[1].kind, ContourKind::Hole);
        assert_eq!(contours[1].area, 1);
    }

    #[test]
    fn saddle_policies_differ() {
        // Two diagonal pixels meet at corner (1,1): left keeps them apart,
        // right joins them into one region.
        let bm = bitmap_from(&[
            "#.",
            ".#",
        ]);
        let split = decompose(&bm, 0, TurnPolicy::Left);
        assert_eq!(split.len(), 2);
        assert!(split.iter().all(|c| c.area == 1));

        let joined = decompose(&bm, 0, TurnPolicy::Right);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].area, 2);
    }

    #[test]
    fn black_joins_diagonals_on_outer_boundaries() {
        let bm = bitmap_from(&[
            "#.",
            ".#",
        ]);
        let contours = decompose(&bm, 0, TurnPolicy::Black);
        assert_eq!(contours.len(), 1);
        let contours = decompose(&bm, 0, TurnPolicy::White);
        assert_eq!(contours.len(), 2);
    }

    #[test]
    fn majority_follows_sparse_neighborhood() {
        // Around the saddle the neighborhood is mostly background, so the
        // majority vote splits the diagonal like `left` does.
        let bm = bitmap_from(&[
            "#.",
            ".#",
        ]);
        let contours = decompose(&bm, 0, TurnPolicy::Majority);
        assert_eq!(contours.len(), 2);
    }

    #[test]
    fn random_policy_is_deterministic() {
        let bm = bitmap_from(&[
            "##..",
            "#.#.",
            ".###",
            "..##",
        ]);
        let a = decompose(&bm, 0, TurnPolicy::Random);
        let b = decompose(&bm, 0, TurnPolicy::Random);
        assert_eq!(a.len(), b.len());
        for (ca, cb) in a.iter().zip(&b) {
            assert_eq!(ca.points, cb.points);
        }
    }

    #[test]
    fn extractor_does_not_mutate_input() {
        let bm = bitmap_from(&[
            "##",
            "##",
        ]);
        let before: Vec<bool> = (0..2)
            .flat_map(|y| (0..2).map(move |x| (x, y)))
            .map(|(x, y)| bm.get(x, y))
            .collect();
        let _ = decompose(&bm, 0, TurnPolicy::Majority);
        let after: Vec<bool> = (0..2)
            .flat_map(|y| (0..2).map(move |x| (x, y)))
            .map(|(x, y)| bm.get(x, y))
            .collect();
        assert_eq!(before, after);
    }
}
