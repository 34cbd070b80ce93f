//! Corner classification and cubic Bézier synthesis from an optimal
//! polygon, plus optional merging of curve runs.
//!
//! Segment anchors sit at the midpoints of polygon edges; each polygon
//! vertex contributes one segment ending at the midpoint of its outgoing
//! edge, so the loop closes by construction.

use kurbo::{CubicBez, ParamCurve, Point};

use super::decompose::ContourKind;
use super::polygon::Polygon;
use crate::geom::{cprod, dpara, fsign, iprod, iprod1};

/// One leg of a traced path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    /// Two straight legs meeting at the polygon vertex.
    Corner { corner: Point, end: Point },
    /// One cubic Bézier leg.
    Curve { c1: Point, c2: Point, end: Point },
}

impl Segment {
    pub fn end(&self) -> Point {
        match *self {
            Segment::Corner { end, .. } | Segment::Curve { end, .. } => end,
        }
    }

    pub fn is_corner(&self) -> bool {
        matches!(self, Segment::Corner { .. })
    }
}

/// A closed traced contour. `start` equals the last segment's endpoint.
#[derive(Debug, Clone)]
pub struct Path {
    pub start: Point,
    pub segments: Vec<Segment>,
    pub kind: ContourKind,
}

/// Fit a polygon with corner and curve segments.
///
/// `opttolerance` of `Some(tol)` enables curve merging. Polygons with
/// fewer than 3 vertices are visually negligible and produce no path.
pub fn fit(poly: &Polygon, alphamax: f64, opttolerance: Option<f64>) -> Option<Path> {
    if poly.vertices.len() < 3 {
        return None;
    }
    let mut curve = smooth(poly, alphamax);
    if let Some(tol) = opttolerance {
        curve = opticurve(&curve, tol);
    }
    Some(curve.into_path())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tag {
    Corner,
    CurveTo,
}

/// Working curve during fitting: per slot the source polygon vertex, its
/// (clamped) alpha, the tag, and three control points, c[2] being the
/// segment endpoint.
#[derive(Clone)]
struct FittedCurve {
    tag: Vec<Tag>,
    c: Vec<[Point; 3]>,
    vertex: Vec<Point>,
    alpha: Vec<f64>,
    kind: ContourKind,
}

impl FittedCurve {
    fn with_len(m: usize, kind: ContourKind) -> Self {
        FittedCurve {
            tag: vec![Tag::Corner; m],
            c: vec![[Point::ZERO; 3]; m],
            vertex: vec![Point::ZERO; m],
            alpha: vec![0.0; m],
            kind,
        }
    }

    fn len(&self) -> usize {
        self.tag.len()
    }

    fn into_path(self) -> Path {
        let start = self.c[self.len() - 1][2];
        let segments = self
            .tag
            .iter()
            .zip(&self.c)
            .map(|(tag, c)| match tag {
                Tag::Corner => Segment::Corner {
                    corner: c[1],
                    end: c[2],
                },
                Tag::CurveTo => Segment::Curve {
                    c1: c[0],
                    c2: c[1],
                    end: c[2],
                },
            })
            .collect();
        Path {
            start,
            segments,
            kind: self.kind,
        }
    }
}

/// Classify each polygon vertex and synthesize its control points.
///
/// The smoothness measure alpha lives in [0, 4/3]: 0 is a perfectly
/// straight continuation, larger is sharper. A vertex with
/// alpha >= alphamax becomes a corner; otherwise its two control points
/// are placed along the adjacent edges at fraction 0.5 + 0.5*alpha
/// (alpha clamped to [0.55, 1]), which makes the curve tangent to both
/// edges at the anchors.
fn smooth(poly: &Polygon, alphamax: f64) -> FittedCurve {
    let v = &poly.vertices;
    let m = v.len();
    let mut curve = FittedCurve::with_len(m, poly.kind);

    for i in 0..m {
        let j = (i + 1) % m;
        let k = (i + 2) % m;
        let anchor = v[j].midpoint(v[k]);

        let denom = ddenom(v[i], v[k]);
        let alpha = if denom != 0.0 {
            let dd = (dpara(v[i], v[j], v[k]) / denom).abs();
            let raw = if dd > 1.0 { 1.0 - 1.0 / dd } else { 0.0 };
            raw / 0.75
        } else {
            4.0 / 3.0
        };

        curve.vertex[j] = v[j];
        if alpha >= alphamax {
            curve.tag[j] = Tag::Corner;
            curve.c[j][1] = v[j];
            curve.c[j][2] = anchor;
            curve.alpha[j] = alpha;
        } else {
            let a = alpha.clamp(0.55, 1.0);
            curve.tag[j] = Tag::CurveTo;
            curve.c[j][0] = v[i].lerp(v[j], 0.5 + 0.5 * a);
            curve.c[j][1] = v[k].lerp(v[j], 0.5 + 0.5 * a);
            curve.c[j][2] = anchor;
            curve.alpha[j] = a;
        }
    }

    curve
}

/// Perpendicular reference length for the smoothness measure: the L1 width
/// of the chord i→k under a cardinal-snapped normal.
fn ddenom(p0: Point, p2: Point) -> f64 {
    let rx = -fsign(p2.y - p0.y);
    let ry = fsign(p2.x - p0.x);
    ry * (p2.x - p0.x) - rx * (p2.y - p0.y)
}

// ── Curve optimization ───────────────────────────────────

const COS_179: f64 = -0.999_847_695_156;

/// A viable replacement of a segment run by one cubic.
#[derive(Clone)]
struct Candidate {
    pen: f64,
    c0: Point,
    c1: Point,
    s: f64,
    alpha: f64,
}

#[derive(Clone)]
enum Link {
    Copy,
    Merge(Candidate),
}

/// Merge runs of curve segments wherever a single cubic stays within
/// `tolerance` of the originals: shortest-path DP over segment
/// boundaries, minimizing segment count and then accumulated penalty.
fn opticurve(curve: &FittedCurve, tolerance: f64) -> FittedCurve {
    let m = curve.len();

    // Turn direction at each curve vertex; corners get 0 and never merge.
    let conv: Vec<i32> = (0..m)
        .map(|i| match curve.tag[i] {
            Tag::CurveTo => fsign(dpara(
                curve.vertex[(i + m - 1) % m],
                curve.vertex[i],
                curve.vertex[(i + 1) % m],
            )) as i32,
            Tag::Corner => 0,
        })
        .collect();

    // Cumulative signed area between the curve and vertex[0], used to pick
    // each candidate's alpha so the replacement preserves enclosed area.
    let mut area_cache = vec![0.0f64; m + 1];
    {
        let origin = curve.vertex[0];
        let mut area = 0.0;
        for i in 0..m {
            let i1 = (i + 1) % m;
            if curve.tag[i1] == Tag::CurveTo {
                let alpha = curve.alpha[i1];
                area += 0.3 * alpha * (4.0 - alpha)
                    * dpara(curve.c[i][2], curve.vertex[i1], curve.c[i1][2])
                    / 2.0;
                area += dpara(origin, curve.c[i][2], curve.c[i1][2]) / 2.0;
            }
            area_cache[i + 1] = area;
        }
    }

    let mut pt = vec![0usize; m + 1];
    let mut pen = vec![0.0f64; m + 1];
    let mut len = vec![0usize; m + 1];
    let mut link: Vec<Link> = vec![Link::Copy; m + 1];

    for j in 1..=m {
        pt[j] = j - 1;
        pen[j] = pen[j - 1];
        len[j] = len[j - 1] + 1;
        link[j] = Link::Copy;

        if j < 2 {
            continue;
        }
        for i in (0..=j - 2).rev() {
            let Some(cand) = penalty(curve, i, j % m, tolerance, &conv, &area_cache) else {
                break;
            };
            if len[j] > len[i] + 1 || (len[j] == len[i] + 1 && pen[j] > pen[i] + cand.pen) {
                pt[j] = i;
                pen[j] = pen[i] + cand.pen;
                len[j] = len[i] + 1;
                link[j] = Link::Merge(cand);
            }
        }
    }

    let om = len[m];
    let mut out = FittedCurve::with_len(om, curve.kind);
    let mut j = m;
    for i in (0..om).rev() {
        let jm = j % m;
        match &link[j] {
            Link::Copy => {
                out.tag[i] = curve.tag[jm];
                out.c[i] = curve.c[jm];
                out.vertex[i] = curve.vertex[jm];
                out.alpha[i] = curve.alpha[jm];
            }
            Link::Merge(cand) => {
                out.tag[i] = Tag::CurveTo;
                out.c[i] = [cand.c0, cand.c1, curve.c[jm][2]];
                out.vertex[i] = curve.c[jm][2].lerp(curve.vertex[jm], cand.s);
                out.alpha[i] = cand.alpha;
            }
        }
        j = pt[j];
    }

    out
}

/// Can segments (i..j] collapse into one cubic? Returns the candidate
/// with its accumulated squared-deviation penalty, or None when the run
/// is blocked by a corner, mixed convexity, a near-reversal, or any
/// deviation beyond `tolerance`.
fn penalty(
    curve: &FittedCurve,
    i: usize,
    j: usize,
    tolerance: f64,
    conv: &[i32],
    area_cache: &[f64],
) -> Option<Candidate> {
    let m = curve.len();
    if i == j {
        return None;
    }

    let i1 = (i + 1) % m;
    let convexity = conv[i1];
    if convexity == 0 {
        return None;
    }
    let d = curve.vertex[i].distance(curve.vertex[i1]);
    let mut k = i1;
    while k != j {
        let k1 = (k + 1) % m;
        let k2 = (k + 2) % m;
        if conv[k1] != convexity {
            return None;
        }
        if fsign(cprod(
            curve.vertex[i],
            curve.vertex[i1],
            curve.vertex[k1],
            curve.vertex[k2],
        )) as i32
            != convexity
        {
            return None;
        }
        if iprod1(
            curve.vertex[i],
            curve.vertex[i1],
            curve.vertex[k1],
            curve.vertex[k2],
        ) < d * curve.vertex[k1].distance(curve.vertex[k2]) * COS_179
        {
            return None;
        }
        k = k1;
    }

    // Candidate endpoints and tangent handles.
    let p0 = curve.c[i][2];
    let p1 = curve.vertex[i1];
    let p2 = curve.vertex[j];
    let p3 = curve.c[j][2];

    let mut area = area_cache[j] - area_cache[i];
    area -= dpara(curve.vertex[0], curve.c[i][2], curve.c[j][2]) / 2.0;
    if i >= j {
        area += area_cache[m];
    }

    // Intersection of the end tangents spans a triangle with the chord;
    // alpha scales the handles so the cubic encloses the same area.
    let a1 = dpara(p0, p1, p2);
    let a2 = dpara(p0, p1, p3);
    let a3 = dpara(p0, p2, p3);
    if a2 == a1 {
        return None;
    }
    let a4 = a1 + a3 - a2;
    let t = a3 / (a3 - a4);
    let s = a2 / (a2 - a1);
    let a = a2 * t / 2.0;
    if a == 0.0 {
        return None;
    }
    let relative = area / a;
    let alpha = 2.0 - (4.0 - relative / 0.3).sqrt();
    if !alpha.is_finite() {
        return None;
    }

    let c0 = p0.lerp(p1, t * alpha);
    let c1 = p3.lerp(p2, s * alpha);
    let bez = CubicBez::new(p0, c0, c1, p3);
    let mut pen = 0.0;

    // The candidate must brush each polygon edge near its parallel-tangent
    // point, staying inside the tolerance corridor.
    let mut k = i1;
    while k != j {
        let k1 = (k + 1) % m;
        let t = parallel_tangent(bez, curve.vertex[k], curve.vertex[k1]);
        if t < -0.5 {
            return None;
        }
        let hit = bez.eval(t);
        let d = curve.vertex[k].distance(curve.vertex[k1]);
        if d == 0.0 {
            return None;
        }
        let d1 = dpara(curve.vertex[k], curve.vertex[k1], hit) / d;
        if d1.abs() > tolerance {
            return None;
        }
        if iprod(curve.vertex[k], curve.vertex[k1], hit) < 0.0
            || iprod(curve.vertex[k1], curve.vertex[k], hit) < 0.0
        {
            return None;
        }
        pen += d1 * d1;
        k = k1;
    }

    // And it must not cut inside the original curve at the old anchors.
    let mut k = i;
    while k != j {
        let k1 = (k + 1) % m;
        let t = parallel_tangent(bez, curve.c[k][2], curve.c[k1][2]);
        if t < -0.5 {
            return None;
        }
        let hit = bez.eval(t);
        let d = curve.c[k][2].distance(curve.c[k1][2]);
        if d == 0.0 {
            return None;
        }
        let mut d1 = dpara(curve.c[k][2], curve.c[k1][2], hit) / d;
        let mut d2 = dpara(curve.c[k][2], curve.c[k1][2], curve.vertex[k1]) / d;
        d2 *= 0.75 * curve.alpha[k1];
        if d2 < 0.0 {
            d1 = -d1;
            d2 = -d2;
        }
        if d1 < d2 - tolerance {
            return None;
        }
        if d1 < d2 {
            pen += (d1 - d2) * (d1 - d2);
        }
        k = k1;
    }

    Some(Candidate {
        pen,
        c0,
        c1,
        s,
        alpha,
    })
}

/// Parameter t in [0, 1] where the cubic's tangent is parallel to q0→q1,
/// or -1.0 when no such point exists.
fn parallel_tangent(bez: CubicBez, q0: Point, q1: Point) -> f64 {
    let big_a = cprod(bez.p0, bez.p1, q0, q1);
    let big_b = cprod(bez.p1, bez.p2, q0, q1);
    let big_c = cprod(bez.p2, bez.p3, q0, q1);

    let a = big_a - 2.0 * big_b + big_c;
    let b = -2.0 * big_a + 2.0 * big_b;
    let c = big_a;

    let disc = b * b - 4.0 * a * c;
    if a == 0.0 || disc < 0.0 {
        return -1.0;
    }
    let s = disc.sqrt();
    let r1 = (-b + s) / (2.0 * a);
    let r2 = (-b - s) / (2.0 * a);
    if (0.0..=1.0).contains(&r1) {
        r1
    } else if (0.0..=1.0).contains(&r2) {
        r2
    } else {
        -1.0
    }
}
