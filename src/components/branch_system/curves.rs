use rand::Rng;

use super::geometry::Point;
use super::types::{Branch, Node};

/// Perpendicular offset for hierarchical curves before scaling.
const HIERARCHY_OFFSET: f64 = 15.0;
const HIERARCHY_NEAR_SCALE: f64 = 0.3;
const HIERARCHY_FAR_SCALE: f64 = 0.1;
/// Full width of the uniform jitter box around each hierarchical control point.
const HIERARCHY_JITTER: f64 = 5.0;

/// `hash * 31 + unit` over UTF-16 code units, where only the shift wraps to
/// 32 bits; the subtraction and addition run on the unwrapped value.
pub fn string_hash(text: &str) -> i64 {
	text.encode_utf16().fold(0i64, |hash, unit| {
		i64::from((hash as i32).wrapping_shl(5)) - hash + i64::from(unit)
	})
}

/// Control points for a cross-link; deterministic for a given id pair.
pub fn cross_link_points(from: Point, to: Point, from_id: &str, to_id: &str) -> [Point; 2] {
	let hash = string_hash(&format!("{from_id}{to_id}"));
	let direction = if hash % 2 == 0 { 1.0 } else { -1.0 };
	let amount = 0.3 + (hash.unsigned_abs() % 3) as f64 * 0.1;

	let delta = to - from;
	let mid = from.lerp(to, 0.5);
	// Normal scaled by the segment length, so a zero-length edge has no offset.
	let offset = Point::new(-delta.y, delta.x) * (amount * direction);
	[mid + offset, mid + offset * 0.5]
}

/// Control points for a parent/child edge: slight bow plus random jitter.
pub fn hierarchical_points<R: Rng + ?Sized>(from: Point, to: Point, rng: &mut R) -> [Point; 2] {
	let delta = to - from;
	let distance = delta.length();
	let mid = from.lerp(to, 0.5);
	let normal = if distance > f64::EPSILON {
		Point::new(-delta.y / distance, delta.x / distance) * HIERARCHY_OFFSET
	} else {
		Point::ZERO
	};

	let mut jitter = || {
		Point::new(
			rng.gen_range(-0.5f64..0.5) * HIERARCHY_JITTER,
			rng.gen_range(-0.5f64..0.5) * HIERARCHY_JITTER,
		)
	};
	[
		mid + normal * HIERARCHY_NEAR_SCALE + jitter(),
		mid + normal * HIERARCHY_FAR_SCALE + jitter(),
	]
}

/// Regenerates control points for `branch` from the nodes' current positions.
pub fn control_points_for<R: Rng + ?Sized>(nodes: &[Node], branch: &Branch, rng: &mut R) -> [Point; 2] {
	let from = &nodes[branch.from.0];
	let to = &nodes[branch.to.0];
	if branch.is_cross_link {
		cross_link_points(from.position, to.position, &from.id, &to.id)
	} else {
		hierarchical_points(from.position, to.position, rng)
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;

	#[test]
	fn string_hash_matches_known_values() {
		assert_eq!(string_hash(""), 0);
		assert_eq!(string_hash("a"), 97);
		assert_eq!(string_hash("ab"), 97 * 31 + 98);
		assert_eq!(string_hash("hello"), 99_162_322);
	}

	#[test]
	fn string_hash_does_not_wrap_outside_the_shift() {
		let hash = string_hash("utilitarianismea");
		assert_eq!(hash, -9_925_125_273);
		assert_eq!(hash.unsigned_abs() % 3, 0);
		assert_eq!(string_hash("eaphilosophy"), 1_075_550_477);
	}

	#[test]
	fn cross_link_points_are_stable_per_pair() {
		let from = Point::new(0.0, 0.0);
		let to = Point::new(100.0, 0.0);
		let first = cross_link_points(from, to, "ea", "longtermism");
		let second = cross_link_points(from, to, "ea", "longtermism");
		assert_eq!(first, second);
		// Second point sits halfway between the midpoint and the first.
		let mid = Point::new(50.0, 0.0);
		let half = mid.lerp(first[0], 0.5);
		assert!(half.distance(first[1]) < 1e-9);
	}

	#[test]
	fn cross_link_offset_follows_hash() {
		let from = Point::new(0.0, 0.0);
		let to = Point::new(0.0, 100.0);
		let hash = string_hash("ab");
		let amount = 0.3 + (hash.unsigned_abs() % 3) as f64 * 0.1;
		let [near, _] = cross_link_points(from, to, "a", "b");
		assert!((near.distance(Point::new(0.0, 50.0)) - 100.0 * amount).abs() < 1e-9);
	}

	#[test]
	fn zero_length_edges_stay_finite() {
		let p = Point::new(12.0, -4.0);
		let mut rng = StdRng::seed_from_u64(3);
		for cp in hierarchical_points(p, p, &mut rng) {
			assert!(cp.is_finite());
			assert!(cp.distance(p) <= HIERARCHY_JITTER);
		}
		assert_eq!(cross_link_points(p, p, "a", "b"), [p, p]);
	}

	proptest! {
		#[test]
		fn control_points_stay_in_envelope(
			fx in -1000.0f64..1000.0, fy in -1000.0f64..1000.0,
			dx in -1.0f64..1.0, dy in -1.0f64..1.0,
			scale in prop_oneof![Just(0.0), Just(1e-9), 1e-6f64..1.0, 1.0f64..500.0],
			seed in any::<u64>(),
		) {
			let from = Point::new(fx, fy);
			let to = from + Point::new(dx, dy) * scale;
			let d = from.distance(to);
			let mid = from.lerp(to, 0.5);
			let mut rng = StdRng::seed_from_u64(seed);

			let hier_max = HIERARCHY_OFFSET * HIERARCHY_NEAR_SCALE + HIERARCHY_JITTER * 0.5 * 2f64.sqrt() + 1e-9;
			for cp in hierarchical_points(from, to, &mut rng) {
				prop_assert!(cp.is_finite());
				prop_assert!(cp.distance(mid) <= hier_max);
			}
			for cp in cross_link_points(from, to, "from", "to") {
				prop_assert!(cp.is_finite());
				prop_assert!(cp.distance(mid) <= 0.5 * d + 1e-9);
			}
		}
	}
}
