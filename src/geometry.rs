// Coordinate projection and shape line-cutting stop short of a real geodesy/reprojection stack
// (e.g. `proj` with well-known EPSG definitions). What's here is a planar approximation, good
// enough for distance work over a single transit network's extent, not a general-purpose
// projection library. Reconstruction only ever uses it for optional geometry enrichment; every
// caller has a straight-line fallback and journey correctness never depends on it.

use geo::{Coord, LineString};

/// A point projected onto a local planar approximation of an equal-area system, in meters,
/// relative to a [`Projector`]'s reference point. Suitable for small-extent distance work
/// (a single transit agency's service area), not for continental-scale accuracy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

impl ProjectedPoint {
    pub fn distance(self, other: ProjectedPoint) -> f64 {
        let (dx, dy) = (other.x - self.x, other.y - self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Projects (lat, lon) pairs onto a shared local tangent plane, centered on a reference point,
/// using an equirectangular approximation. This stands in for a true equal-area coordinate system
/// (nominally EPSG:5070); a real implementation would reproject through `proj`, which this repo
/// does not depend on since the feed view only needs *a* consistent local metric for distance
/// work, not geodetic accuracy.
pub struct Projector {
    ref_lat_rad: f64,
    ref_lon_rad: f64,
}

const EARTH_RADIUS_M: f64 = 6_371_000.0;

impl Projector {
    /// Builds a projector centered on the centroid of the given stop coordinates.
    pub fn centered_on(points: impl Iterator<Item = (f64, f64)>) -> Self {
        let mut sum_lat = 0.0;
        let mut sum_lon = 0.0;
        let mut count = 0usize;
        for (lat, lon) in points {
            sum_lat += lat;
            sum_lon += lon;
            count += 1;
        }
        let (lat, lon) = if count == 0 {
            (0.0, 0.0)
        } else {
            (sum_lat / count as f64, sum_lon / count as f64)
        };
        Self {
            ref_lat_rad: lat.to_radians(),
            ref_lon_rad: lon.to_radians(),
        }
    }

    pub fn project(&self, lat: f64, lon: f64) -> ProjectedPoint {
        let lat_rad = lat.to_radians();
        let lon_rad = lon.to_radians();
        let x = (lon_rad - self.ref_lon_rad) * ((lat_rad + self.ref_lat_rad) * 0.5).cos() * EARTH_RADIUS_M;
        let y = (lat_rad - self.ref_lat_rad) * EARTH_RADIUS_M;
        ProjectedPoint { x, y }
    }
}

/// Cumulative planar length at each vertex of a polyline (`lengths[0] == 0.0`).
fn cumulative_lengths(points: &[ProjectedPoint]) -> Vec<f64> {
    let mut lengths = Vec::with_capacity(points.len());
    let mut total = 0.0;
    lengths.push(0.0);
    for pair in points.windows(2) {
        total += pair[0].distance(pair[1]);
        lengths.push(total);
    }
    lengths
}

fn interpolate_at(points: &[ProjectedPoint], cumulative: &[f64], dist: f64) -> Coord<f64> {
    let total = *cumulative.last().unwrap_or(&0.0);
    let dist = dist.clamp(0.0, total);
    for i in 1..cumulative.len() {
        if dist <= cumulative[i] {
            let seg_len = cumulative[i] - cumulative[i - 1];
            let t = if seg_len > 0.0 { (dist - cumulative[i - 1]) / seg_len } else { 0.0 };
            let a = points[i - 1];
            let b = points[i];
            return Coord { x: a.x + (b.x - a.x) * t, y: a.y + (b.y - a.y) * t };
        }
    }
    points.last().map(|p| Coord { x: p.x, y: p.y }).unwrap_or(Coord { x: 0.0, y: 0.0 })
}

/// Cuts the sub-polyline of `shape` spanning `[from_dist, to_dist]` (in the same units as
/// `shape_dist_traveled`), returning `None` on any anomaly (empty shape, non-finite distances,
/// a span the shape is too short for). Callers fall back to a straight line on `None`, and
/// should log a warning (see `journey::leg_geometry`).
pub fn cut_shape(shape: &[ProjectedPoint], from_dist: f64, to_dist: f64) -> Option<LineString<f64>> {
    if shape.len() < 2 || !from_dist.is_finite() || !to_dist.is_finite() || from_dist > to_dist {
        return None;
    }
    let cumulative = cumulative_lengths(shape);
    let total = *cumulative.last().unwrap_or(&0.0);
    if total <= 0.0 {
        return None;
    }

    let start = interpolate_at(shape, &cumulative, from_dist);
    let end = interpolate_at(shape, &cumulative, to_dist);

    let mut coords = vec![start];
    for (i, &len) in cumulative.iter().enumerate() {
        if len > from_dist && len < to_dist {
            coords.push(Coord { x: shape[i].x, y: shape[i].y });
        }
    }
    coords.push(end);
    coords.dedup_by(|a, b| (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9);
    if coords.len() < 2 {
        return None;
    }
    Some(LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projector_round_trips_reference_point_to_origin() {
        let proj = Projector::centered_on(std::iter::once((40.0, -105.0)));
        let p = proj.project(40.0, -105.0);
        assert!(p.x.abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
    }

    #[test]
    fn cut_shape_returns_subsegment() {
        let shape = vec![
            ProjectedPoint { x: 0.0, y: 0.0 },
            ProjectedPoint { x: 10.0, y: 0.0 },
            ProjectedPoint { x: 20.0, y: 0.0 },
        ];
        let cut = cut_shape(&shape, 5.0, 15.0).unwrap();
        assert_eq!(cut.0.first().unwrap().x, 5.0);
        assert_eq!(cut.0.last().unwrap().x, 15.0);
    }

    #[test]
    fn cut_shape_rejects_degenerate_input() {
        assert!(cut_shape(&[], 0.0, 10.0).is_none());
        assert!(cut_shape(&[ProjectedPoint { x: 0.0, y: 0.0 }], 0.0, 10.0).is_none());
    }
}
