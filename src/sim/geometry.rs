//! Geometry for path collision and click hit-testing
//!
//! Paths are polylines between point centres. The only collision the rules
//! care about is a *proper* crossing: two segments passing through each
//! other's interiors. Touching at an endpoint or running along the same line
//! never counts.

use glam::Vec2;

/// Check whether segment `a1..a2` properly crosses segment `b1..b2`
///
/// Solves `a1 + ua (a2 - a1) = b1 + ub (b2 - b1)` with cross products.
/// Parallel and collinear segments (zero denominator) never intersect, and
/// both parameters must lie strictly inside (0, 1).
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let da = a2 - a1;
    let db = b2 - b1;
    let denominator = da.perp_dot(db);
    if denominator == 0.0 {
        return false;
    }

    let offset = a1 - b1;
    let ua = db.perp_dot(offset) / denominator;
    let ub = da.perp_dot(offset) / denominator;

    (ua > 0.0 && ua < 1.0) && (ub > 0.0 && ub < 1.0)
}

/// Find the first point whose centre lies within `radius` of `pos`
///
/// Points are scanned in index order, so overlapping hit circles resolve to
/// the lower index.
pub fn point_at(centres: impl IntoIterator<Item = Vec2>, pos: Vec2, radius: f32) -> Option<usize> {
    centres
        .into_iter()
        .position(|centre| centre.distance_squared(pos) <= radius * radius)
}
