use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A point (or displacement) in world or screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate, growing downwards.
	pub y: f64,
}

impl Point {
	/// The origin.
	pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

	/// Point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Unit vector at `angle` radians, scaled by `length`.
	pub fn polar(angle: f64, length: f64) -> Self {
		Self::new(angle.cos() * length, angle.sin() * length)
	}

	/// Euclidean norm.
	pub fn length(self) -> f64 {
		self.x.hypot(self.y)
	}

	/// Euclidean distance to `other`.
	pub fn distance(self, other: Self) -> f64 {
		(self - other).length()
	}

	/// Linear interpolation; `t = 0` is `self`.
	pub fn lerp(self, target: Self, t: f64) -> Self {
		self + (target - self) * t
	}

	/// Neither coordinate is NaN or infinite.
	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

impl Add for Point {
	type Output = Self;

	fn add(self, rhs: Self) -> Self {
		Self::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl AddAssign for Point {
	fn add_assign(&mut self, rhs: Self) {
		self.x += rhs.x;
		self.y += rhs.y;
	}
}

impl Sub for Point {
	type Output = Self;

	fn sub(self, rhs: Self) -> Self {
		Self::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Point {
	type Output = Self;

	fn mul(self, rhs: f64) -> Self {
		Self::new(self.x * rhs, self.y * rhs)
	}
}

/// Shortest distance from `point` to the segment `start..end`.
///
/// A zero-length segment degrades to the distance to `start`.
pub fn distance_to_segment(point: Point, start: Point, end: Point) -> f64 {
	let along = end - start;
	let len_sq = along.x * along.x + along.y * along.y;
	if len_sq <= f64::EPSILON {
		return point.distance(start);
	}

	let rel = point - start;
	let t = (rel.x * along.x + rel.y * along.y) / len_sq;
	let closest = if t < 0.0 {
		start
	} else if t > 1.0 {
		end
	} else {
		start + along * t
	};
	point.distance(closest)
}

/// Unit normal of `start..end`, oriented towards the side `point` lies on.
///
/// Returns [`Point::ZERO`] for a zero-length segment. Points exactly on the
/// line are pushed to the negative-normal side.
pub fn perpendicular_away(point: Point, start: Point, end: Point) -> Point {
	let along = end - start;
	let len = along.length();
	if len <= f64::EPSILON {
		return Point::ZERO;
	}

	let normal = Point::new(-along.y / len, along.x / len);
	let rel = point - start;
	let side = if rel.x * normal.x + rel.y * normal.y > 0.0 {
		1.0
	} else {
		-1.0
	};
	normal * side
}
