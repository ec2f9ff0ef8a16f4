//! Geometry for namespace overlays: convex hulls and the closed cardinal
//! spline drawn through them.

use std::cmp::Ordering;
use std::fmt::Write;

use super::types::Point;

fn cross(o: Point, a: Point, b: Point) -> f64 {
	(a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

fn lexicographic(a: &Point, b: &Point) -> Ordering {
	a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1]))
}

/// Convex hull of `points` (monotone chain), counter-clockwise in a y-up
/// frame, starting from the lowest-x point.
///
/// Returns `None` unless the points span an area: fewer than three distinct
/// finite points, or all of them collinear.
pub fn convex_hull(points: &[Point]) -> Option<Vec<Point>> {
	let mut sorted: Vec<Point> = points
		.iter()
		.copied()
		.filter(|p| p[0].is_finite() && p[1].is_finite())
		.collect();
	sorted.sort_by(lexicographic);
	sorted.dedup();
	if sorted.len() < 3 {
		return None;
	}

	// Lower chain, then upper chain; collinear points are dropped.
	let mut hull: Vec<Point> = Vec::with_capacity(sorted.len() + 1);
	for &p in &sorted {
		while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
			hull.pop();
		}
		hull.push(p);
	}
	let lower_len = hull.len() + 1;
	for &p in sorted.iter().rev().skip(1) {
		while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
		{
			hull.pop();
		}
		hull.push(p);
	}
	// The last point repeats the first.
	hull.pop();

	(hull.len() >= 3).then_some(hull)
}

/// SVG path data for a closed cardinal spline through `points`.
///
/// `tension` 1 gives straight segments, 0 a Catmull-Rom curve. Returns `None`
/// for fewer than three points.
pub fn cardinal_closed_path(points: &[Point], tension: f64) -> Option<String> {
	let n = points.len();
	if n < 3 {
		return None;
	}
	let k = (1.0 - tension) / 6.0;

	let mut d = String::with_capacity(n * 48);
	let _ = write!(d, "M{},{}", points[0][0], points[0][1]);
	for i in 0..n {
		let prev = points[(i + n - 1) % n];
		let cur = points[i];
		let next = points[(i + 1) % n];
		let after = points[(i + 2) % n];
		let c1 = [cur[0] + k * (next[0] - prev[0]), cur[1] + k * (next[1] - prev[1])];
		let c2 = [next[0] - k * (after[0] - cur[0]), next[1] - k * (after[1] - cur[1])];
		let _ = write!(
			d,
			"C{},{},{},{},{},{}",
			c1[0], c1[1], c2[0], c2[1], next[0], next[1]
		);
	}
	d.push('Z');
	Some(d)
}
