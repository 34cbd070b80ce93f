//! Minimal-vertex polygon approximation.
//!
//! Reduces a dense pixel-boundary loop to the fewest vertices whose spans
//! each stay within half a pixel of the boundary, then nudges every vertex
//! to the sub-pixel position that best fits its two adjacent spans.
//!
//! Four phases:
//! 1. cyclic prefix sums for O(1) line-fit statistics over any sub-range
//! 2. per-vertex longest straight span, by constraint propagation
//! 3. minimum-segment cyclic cover via shortest-path DP, ties broken by
//!    the summed RMS deviation of the chosen spans
//! 4. sub-pixel vertex refinement, constrained to ±0.5 of the lattice

use kurbo::Point;

use super::decompose::{ContourKind, RawContour};

/// Optimal polygon derived from a raw contour.
#[derive(Debug, Clone)]
pub struct Polygon {
    /// Sub-pixel-refined vertex positions, in boundary order.
    pub vertices: Vec<Point>,
    pub kind: ContourKind,
}

/// Compute the optimal polygon for a raw contour.
pub fn optimal_polygon(contour: &RawContour) -> Polygon {
    let pt = &contour.points;
    let n = pt.len();
    if n < 4 {
        // Too small for the span machinery; keep the lattice loop as-is.
        let vertices = pt.iter().map(|&(x, y)| Point::new(x as f64, y as f64)).collect();
        return Polygon {
            vertices,
            kind: contour.kind,
        };
    }

    let table = SumTable::build(pt);
    let reach = straight_reach(pt);
    let chosen = select_vertices(pt, &reach, &table);
    let vertices = refine_vertices(pt, &chosen, &table);

    Polygon {
        vertices,
        kind: contour.kind,
    }
}

// ── Prefix sums ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
struct Sums {
    x: f64,
    y: f64,
    x2: f64,
    xy: f64,
    y2: f64,
}

struct RangeSums {
    x: f64,
    y: f64,
    x2: f64,
    xy: f64,
    y2: f64,
    count: usize,
}

/// Prefix sums of x, y, x², xy, y² relative to the first boundary point.
/// Any cyclic sub-range's statistics come out in O(1), which is what makes
/// the quadratic DP below affordable.
struct SumTable {
    sums: Vec<Sums>,
    origin: (i32, i32),
}

impl SumTable {
    fn build(pt: &[(i32, i32)]) -> Self {
        let n = pt.len();
        let origin = pt[0];
        let mut sums = vec![Sums::default(); n + 1];
        for i in 0..n {
            let x = (pt[i].0 - origin.0) as f64;
            let y = (pt[i].1 - origin.1) as f64;
            sums[i + 1] = Sums {
                x: sums[i].x + x,
                y: sums[i].y + y,
                x2: sums[i].x2 + x * x,
                xy: sums[i].xy + x * y,
                y2: sums[i].y2 + y * y,
            };
        }
        SumTable { sums, origin }
    }

    fn n(&self) -> usize {
        self.sums.len() - 1
    }

    /// Statistics over the cyclic range [i..j]; j may exceed n.
    fn range(&self, i: usize, j: usize) -> RangeSums {
        let n = self.n();
        let jn = j % n;
        let (wrap, count) = if jn >= i {
            (0.0, jn - i)
        } else {
            (1.0, jn + n - i)
        };
        let s = &self.sums;
        RangeSums {
            x: s[jn + 1].x - s[i].x + wrap * s[n].x,
            y: s[jn + 1].y - s[i].y + wrap * s[n].y,
            x2: s[jn + 1].x2 - s[i].x2 + wrap * s[n].x2,
            xy: s[jn + 1].xy - s[i].xy + wrap * s[n].xy,
            y2: s[jn + 1].y2 - s[i].y2 + wrap * s[n].y2,
            count,
        }
    }
}

/// RMS perpendicular deviation of boundary points [i..j] from the chord
/// i→j. This is the DP tie-break: among equal-count covers, prefer spans
/// that hug the boundary.
fn span_penalty(pt: &[(i32, i32)], table: &SumTable, i: usize, j: usize) -> f64 {
    let n = pt.len();
    let jn = j % n;
    let r = table.range(i, j);
    if r.count == 0 {
        return 0.0;
    }
    let k = r.count as f64;

    let x0 = table.origin.0 as f64;
    let y0 = table.origin.1 as f64;
    let px = (pt[i].0 + pt[jn].0) as f64 / 2.0 - x0;
    let py = (pt[i].1 + pt[jn].1) as f64 / 2.0 - y0;
    let ey = (pt[jn].0 - pt[i].0) as f64;
    let ex = -((pt[jn].1 - pt[i].1) as f64);

    let a = (r.x2 - 2.0 * r.x * px) / k + px * px;
    let b = (r.xy - r.x * py - r.y * px) / k + px * py;
    let c = (r.y2 - 2.0 * r.y * py) / k + py * py;

    (ex * ex * a + 2.0 * ex * ey * b + ey * ey * c).max(0.0).sqrt()
}

// ── Longest straight span ────────────────────────────────

/// For each vertex i, the farthest vertex reachable by a chord that keeps
/// every intermediate lattice point within half a pixel per axis.
///
/// Walks forward from i maintaining two constraint vectors that bound the
/// corridor of admissible chord directions. A vertex outside the corridor,
/// or a sub-path that has stepped in all four cardinal directions, ends
/// the span. Only direction changes (`next_corner`) are visited, so the
/// inner walk skips collinear runs.
#[allow(clippy::needless_range_loop)]
fn straight_reach(pt: &[(i32, i32)]) -> Vec<usize> {
    let n = pt.len();
    let mut reach = vec![0usize; n];

    // next_corner[i]: index of the first direction change after i.
    let mut next_corner = vec![0usize; n];
    {
        let mut k = 0usize;
        for i in (0..n).rev() {
            if pt[i].0 != pt[k % n].0 && pt[i].1 != pt[k % n].1 {
                k = i + 1;
            }
            next_corner[i] = k;
        }
    }

    let mut pivot = vec![0usize; n];

    for i in (0..n).rev() {
        let mut dir_count = [0i32; 4];
        let mut constraint = [(0i32, 0i32); 2];

        // The step from i to i+1 seeds the direction histogram. The index
        // expression (3 + 3*dx + dy) / 2 maps each cardinal step to 0..3.
        let i1 = (i + 1) % n;
        let dir0 = ((3 + 3 * (pt[i1].0 - pt[i].0) + (pt[i1].1 - pt[i].1)) / 2) as usize;
        dir_count[dir0] += 1;

        let mut k = next_corner[i];
        let mut k1 = i;

        loop {
            let dkx = sign(pt[k % n].0 - pt[k1 % n].0);
            let dky = sign(pt[k % n].1 - pt[k1 % n].1);
            let dir_idx = ((3 + 3 * dkx + dky) / 2) as usize;
            dir_count[dir_idx] += 1;

            // All four cardinal directions seen: no chord can stay straight.
            if dir_count.iter().all(|&c| c != 0) {
                pivot[i] = k1 % n;
                break;
            }

            let cur = (pt[k % n].0 - pt[i].0, pt[k % n].1 - pt[i].1);

            if xprod(constraint[0], cur) < 0 || xprod(constraint[1], cur) > 0 {
                pivot[i] = violation_pivot(pt, &constraint, k, k1, i, n);
                break;
            }

            // Points within one unit of i impose no constraint; farther
            // points narrow the corridor by half a pixel on their side.
            if !(cur.0.abs() <= 1 && cur.1.abs() <= 1) {
                let off0 = (
                    cur.0 + if cur.1 >= 0 && (cur.1 > 0 || cur.0 < 0) { 1 } else { -1 },
                    cur.1 + if cur.0 <= 0 && (cur.0 < 0 || cur.1 < 0) { 1 } else { -1 },
                );
                if xprod(constraint[0], off0) >= 0 {
                    constraint[0] = off0;
                }
                let off1 = (
                    cur.0 + if cur.1 <= 0 && (cur.1 < 0 || cur.0 < 0) { 1 } else { -1 },
                    cur.1 + if cur.0 >= 0 && (cur.0 > 0 || cur.1 < 0) { 1 } else { -1 },
                );
                if xprod(constraint[1], off1) <= 0 {
                    constraint[1] = off1;
                }
            }

            k1 = k;
            k = next_corner[k1 % n];

            if !cyclic(k % n, i, k1 % n) {
                pivot[i] = violation_pivot(pt, &constraint, k, k1, i, n);
                break;
            }
        }
    }

    // pivot → reach, kept cyclically monotone.
    let mut j = pivot[n - 1];
    reach[n - 1] = j;
    for i in (0..=n - 2).rev() {
        if cyclic(i + 1, pivot[i], j) {
            j = pivot[i];
        }
        reach[i] = j;
    }

    let mut i = n - 1;
    while cyclic((i + 1) % n, j, reach[i]) {
        reach[i] = j;
        if i == 0 {
            break;
        }
        i -= 1;
    }

    reach
}

/// Exact span end when a constraint is violated: interpolate along the
/// straight run from the last valid corner `k1` toward the violating
/// corner `k` to find the final lattice step still inside the corridor.
fn violation_pivot(
    pt: &[(i32, i32)],
    constraint: &[(i32, i32); 2],
    k: usize,
    k1: usize,
    i: usize,
    n: usize,
) -> usize {
    let dk = (
        sign(pt[k % n].0 - pt[k1 % n].0),
        sign(pt[k % n].1 - pt[k1 % n].1),
    );
    let cur = (pt[k1 % n].0 - pt[i].0, pt[k1 % n].1 - pt[i].1);
    let a = xprod(constraint[0], cur);
    let b = xprod(constraint[0], dk);
    let c = xprod(constraint[1], cur);
    let d = xprod(constraint[1], dk);

    let mut j = 10_000_000i64;
    if b < 0 {
        j = floordiv(a, -b);
    }
    if d > 0 {
        j = j.min(floordiv(-c, d));
    }
    pmod((k1 % n) as isize + j as isize, n as isize)
}

// ── Minimum-segment cover ────────────────────────────────

/// Shortest-path DP over the implicit span graph: fewest spans covering
/// the cycle, then least summed span penalty. Returns the chosen vertex
/// indices into the boundary.
#[allow(clippy::needless_range_loop)]
fn select_vertices(pt: &[(i32, i32)], reach: &[usize], table: &SumTable) -> Vec<usize> {
    let n = pt.len();

    // clip0[i]: farthest vertex a single span from i may end at.
    let mut clip0 = vec![0usize; n];
    for i in 0..n {
        let prev_i = if i == 0 { n - 1 } else { i - 1 };
        let mut c = pmod(reach[prev_i] as isize - 1, n as isize);
        if c == i {
            c = (i + 1) % n;
        }
        clip0[i] = if c < i { n } else { c };
    }

    // clip1[j]: earliest vertex from which j is reachable.
    let mut clip1 = vec![0usize; n + 1];
    {
        let mut j = 1usize;
        for i in 0..n {
            while j <= clip0[i] {
                clip1[j] = i;
                j += 1;
            }
        }
    }

    // Greedy forward walk gives the minimum span count m...
    let mut seg0 = vec![0usize; n + 1];
    let m;
    {
        let mut i = 0usize;
        let mut j = 0usize;
        while i < n {
            seg0[j] = i;
            i = clip0[i];
            j += 1;
        }
        seg0[j] = n;
        m = j;
    }

    // ...and the backward walk bounds each span's start window.
    let mut seg1 = vec![0usize; m + 1];
    {
        let mut i = n;
        let mut j = m;
        while j > 0 {
            seg1[j] = i;
            i = clip1[i];
            j -= 1;
        }
        seg1[0] = 0;
    }

    // Within the fixed span count, minimize total penalty.
    let mut pen = vec![-1.0f64; n + 1];
    let mut prev = vec![0usize; n + 1];
    pen[0] = 0.0;

    for j in 1..=m {
        for i in seg1[j]..=seg0[j] {
            let mut best = -1.0f64;
            let k_start = seg0[j - 1];
            let k_end = clip1[i];
            if k_start >= k_end {
                let mut k = k_start;
                loop {
                    let total = span_penalty(pt, table, k, i) + pen[k];
                    if pen[k] >= 0.0 && (best < 0.0 || total < best) {
                        prev[i] = k;
                        best = total;
                    }
                    if k == k_end {
                        break;
                    }
                    k -= 1;
                }
            }
            pen[i] = best;
        }
    }

    let mut chosen = vec![0usize; m];
    {
        let mut i = n;
        let mut j = m;
        while j > 0 {
            j -= 1;
            i = prev[i];
            chosen[j] = i;
        }
    }

    chosen
}

// ── Vertex refinement ────────────────────────────────────

/// Shift each chosen vertex to the sub-pixel position minimizing squared
/// distance to the best-fit lines of its two adjacent spans, constrained
/// to ±0.5 of the lattice corner so the polygon stays inside the
/// one-pixel containment guarantee.
fn refine_vertices(
    pt: &[(i32, i32)],
    chosen: &[usize],
    table: &SumTable,
) -> Vec<Point> {
    let m = chosen.len();
    let mut vertices = vec![Point::ZERO; m];
    if m == 0 {
        return vertices;
    }

    for i in 0..m {
        let i_prev = if i == 0 { m - 1 } else { i - 1 };
        let seg_in = (chosen[i_prev], chosen[i]);
        let seg_out = (chosen[i], chosen[(i + 1) % m]);

        let (ctr_in, dir_in) = line_fit(pt, table, seg_in.0, seg_in.1);
        let (ctr_out, dir_out) = line_fit(pt, table, seg_out.0, seg_out.1);

        // Sum the two lines' squared-distance quadratic forms and minimize.
        let q = add_quadform(&quadform(ctr_in, dir_in), &quadform(ctr_out, dir_out));
        let corner = Point::new(pt[chosen[i]].0 as f64, pt[chosen[i]].1 as f64);

        let det = q[0][0] * q[1][1] - q[0][1] * q[1][0];
        if det.abs() < 1e-10 {
            // Parallel spans: the lattice corner is as good as anything.
            vertices[i] = corner;
            continue;
        }

        let wx = (-q[0][2] * q[1][1] + q[1][2] * q[0][1]) / det;
        let wy = (q[0][2] * q[1][0] - q[1][2] * q[0][0]) / det;

        if (wx - corner.x).abs() <= 0.5 && (wy - corner.y).abs() <= 0.5 {
            vertices[i] = Point::new(wx, wy);
        } else {
            vertices[i] = constrain_to_box(&q, corner);
        }
    }

    vertices
}

/// Best-fit line through boundary points [a..b]: (centroid, unit
/// direction). The direction is the principal axis of the range's
/// covariance, from the closed-form 2×2 eigendecomposition.
fn line_fit(
    pt: &[(i32, i32)],
    table: &SumTable,
    a: usize,
    b: usize,
) -> (Point, (f64, f64)) {
    let n = pt.len();
    let r = table.range(a, b);
    if r.count == 0 {
        return (Point::new(pt[a % n].0 as f64, pt[a % n].1 as f64), (1.0, 0.0));
    }
    let k = r.count as f64;

    let x0 = table.origin.0 as f64;
    let y0 = table.origin.1 as f64;
    let ctr = Point::new(r.x / k + x0, r.y / k + y0);

    let cov_a = (r.x2 - r.x * r.x / k) / k;
    let cov_b = (r.xy - r.x * r.y / k) / k;
    let cov_c = (r.y2 - r.y * r.y / k) / k;

    let lambda = (cov_a + cov_c + ((cov_a - cov_c).powi(2) + 4.0 * cov_b * cov_b).sqrt()) / 2.0;
    let a2 = cov_a - lambda;
    let c2 = cov_c - lambda;

    let dir = if a2.abs() >= c2.abs() {
        let len = (cov_b * cov_b + a2 * a2).sqrt();
        if len > 1e-10 {
            (-cov_b / len, a2 / len)
        } else {
            (1.0, 0.0)
        }
    } else {
        let len = (c2 * c2 + cov_b * cov_b).sqrt();
        if len > 1e-10 {
            (-c2 / len, cov_b / len)
        } else {
            (1.0, 0.0)
        }
    };

    (ctr, dir)
}

/// 3×3 quadratic form Q with [x, y, 1]·Q·[x, y, 1]ᵀ = squared distance
/// from the line through `ctr` with direction `dir`.
fn quadform(ctr: Point, dir: (f64, f64)) -> [[f64; 3]; 3] {
    let v = [dir.1, -dir.0, -(dir.1 * ctr.x - dir.0 * ctr.y)];
    let d = dir.0 * dir.0 + dir.1 * dir.1;
    let mut q = [[0.0f64; 3]; 3];
    if d < 1e-10 {
        return q;
    }
    for l in 0..3 {
        for k in 0..3 {
            q[l][k] = v[l] * v[k] / d;
        }
    }
    q
}

fn add_quadform(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut q = [[0.0f64; 3]; 3];
    for l in 0..3 {
        for k in 0..3 {
            q[l][k] = a[l][k] + b[l][k];
        }
    }
    q
}

fn eval_quadform(q: &[[f64; 3]; 3], x: f64, y: f64) -> f64 {
    let p = [x, y, 1.0];
    let mut val = 0.0;
    for l in 0..3 {
        for k in 0..3 {
            val += p[l] * q[l][k] * p[k];
        }
    }
    val
}

/// Minimum of the quadratic form over the ±0.5 box around `center`:
/// check the box edges (each a 1D quadratic) and corners.
fn constrain_to_box(q: &[[f64; 3]; 3], center: Point) -> Point {
    let lo_x = center.x - 0.5;
    let hi_x = center.x + 0.5;
    let lo_y = center.y - 0.5;
    let hi_y = center.y + 0.5;

    let mut best = center;
    let mut best_val = eval_quadform(q, center.x, center.y);
    let check = |x: f64, y: f64, best: &mut Point, best_val: &mut f64| {
        let v = eval_quadform(q, x, y);
        if v < *best_val {
            *best_val = v;
            *best = Point::new(x, y);
        }
    };

    for &x in &[lo_x, hi_x] {
        if q[1][1].abs() > 1e-10 {
            let y = (-(q[1][0] * x + q[1][2]) / q[1][1]).clamp(lo_y, hi_y);
            check(x, y, &mut best, &mut best_val);
        }
        check(x, lo_y, &mut best, &mut best_val);
        check(x, hi_y, &mut best, &mut best_val);
    }
    for &y in &[lo_y, hi_y] {
        if q[0][0].abs() > 1e-10 {
            let x = (-(q[0][1] * y + q[0][2]) / q[0][0]).clamp(lo_x, hi_x);
            check(x, y, &mut best, &mut best_val);
        }
    }

    best
}

// ── Helpers ──────────────────────────────────────────────

fn xprod(a: (i32, i32), b: (i32, i32)) -> i64 {
    a.0 as i64 * b.1 as i64 - a.1 as i64 * b.0 as i64
}

fn sign(x: i32) -> i32 {
    match x {
        x if x > 0 => 1,
        x if x < 0 => -1,
        _ => 0,
    }
}

/// Proper modulo for signed values (always non-negative result).
fn pmod(a: isize, n: isize) -> usize {
    (((a % n) + n) % n) as usize
}

/// Floor division (rounds toward negative infinity).
fn floordiv(a: i64, b: i64) -> i64 {
    if a >= 0 {
        a / b
    } else {
        -1 - (-1 - a) / b
    }
}

/// Is b in the cyclic interval [a, c)?
fn cyclic(a: usize, b: usize, c: usize) -> bool {
    if a <= c {
        a <= b && b < c
    } else {
        a <= b || b < c
    }
}

#[cfg(test)]
mod tests {
    use super::super::decompose::{decompose, ContourKind, RawContour};
    use super::*;
    use crate::bitmap::Bitmap;
    use crate::config::TurnPolicy;

    fn square_contour(side: i32) -> RawContour {
        let mut points = Vec::new();
        for y in 0..side {
            points.push((0, y));
        }
        for x in 0..side {
            points.push((x, side));
        }
        for y in (1..=side).rev() {
            points.push((side, y));
        }
        for x in (1..=side).rev() {
            points.push((x, 0));
        }
        RawContour {
            points,
            kind: ContourKind::Outer,
            area: (side as i64) * (side as i64),
        }
    }

    #[test]
    fn square_reduces_to_its_corners() {
        let poly = optimal_polygon(&square_contour(10));
        assert_eq!(poly.vertices.len(), 4);
        for v in &poly.vertices {
            let near_corner = [0.0, 10.0].contains(&v.x.round())
                && [0.0, 10.0].contains(&v.y.round());
            assert!(near_corner, "vertex {v:?} should sit at a square corner");
            assert!((v.x - v.x.round()).abs() <= 0.5);
            assert!((v.y - v.y.round()).abs() <= 0.5);
        }
    }

    #[test]
    fn small_rectangle_stays_small() {
        // Tiny loops may pick up one extra vertex from lattice effects.
        let poly = optimal_polygon(&square_contour(4));
        assert!(
            (4..=5).contains(&poly.vertices.len()),
            "expected 4-5 vertices, got {}",
            poly.vertices.len()
        );
    }

    #[test]
    fn degenerate_contour_passes_through() {
        let contour = RawContour {
            points: vec![(0, 0), (0, 1), (1, 1)],
            kind: ContourKind::Outer,
            area: 0,
        };
        let poly = optimal_polygon(&contour);
        assert_eq!(poly.vertices.len(), 3);
    }

    #[test]
    fn vertices_stay_within_one_pixel_of_boundary() {
        // Rasterized disc: every polygon vertex must stay within one pixel
        // (Chebyshev) of some lattice point of the source boundary.
        let mut bm = Bitmap::new(50, 50);
        for y in 0..50 {
            for x in 0..50 {
                let dx = x as f64 + 0.5 - 25.0;
                let dy = y as f64 + 0.5 - 25.0;
                if dx * dx + dy * dy <= 400.0 {
                    bm.set(x, y, true);
                }
            }
        }
        let contours = decompose(&bm, 0, TurnPolicy::Majority);
        assert_eq!(contours.len(), 1);
        let poly = optimal_polygon(&contours[0]);
        assert!(poly.vertices.len() >= 8);
        assert!(poly.vertices.len() < contours[0].points.len());

        for v in &poly.vertices {
            let cheb = contours[0]
                .points
                .iter()
                .map(|&(px, py)| {
                    (v.x - px as f64).abs().max((v.y - py as f64).abs())
                })
                .fold(f64::INFINITY, f64::min);
            assert!(cheb <= 1.0, "vertex {v:?} is {cheb} from the boundary");
        }
    }

    #[test]
    fn polygon_is_much_smaller_than_boundary() {
        let contour = square_contour(30);
        let poly = optimal_polygon(&contour);
        assert_eq!(poly.vertices.len(), 4);
        assert_eq!(contour.points.len(), 120);
    }
}
