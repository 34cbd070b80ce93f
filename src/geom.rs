//! Shared float geometry for the fitting stages.

use kurbo::Point;

/// Twice the signed area of the triangle (p0, p1, p2).
pub fn dpara(p0: Point, p1: Point, p2: Point) -> f64 {
    (p1.x - p0.x) * (p2.y - p0.y) - (p1.y - p0.y) * (p2.x - p0.x)
}

/// Cross product (p1 - p0) × (p3 - p2).
pub fn cprod(p0: Point, p1: Point, p2: Point, p3: Point) -> f64 {
    (p1.x - p0.x) * (p3.y - p2.y) - (p1.y - p0.y) * (p3.x - p2.x)
}

/// Dot product (p1 - p0) · (p2 - p0).
pub fn iprod(p0: Point, p1: Point, p2: Point) -> f64 {
    (p1.x - p0.x) * (p2.x - p0.x) + (p1.y - p0.y) * (p2.y - p0.y)
}

/// Dot product (p1 - p0) · (p3 - p2).
pub fn iprod1(p0: Point, p1: Point, p2: Point, p3: Point) -> f64 {
    (p1.x - p0.x) * (p3.x - p2.x) + (p1.y - p0.y) * (p3.y - p2.y)
}

/// Sign with an exact zero: -1.0, 0.0, or 1.0.
pub fn fsign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
