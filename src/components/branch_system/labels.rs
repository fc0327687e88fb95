//! Greedy per-node label placement.
//!
//! Each visible node scores six anchor candidates against nearby nodes, the
//! default label spot of every other node, and nearby branches, then keeps the
//! cheapest. Dense clusters can still end up with overlapping labels.

use super::geometry::{Point, distance_to_segment};
use super::interaction::ViewState;
use super::types::{Branch, Node};

const NODE_PENALTY: f64 = 100.0;
const NODE_CLEARANCE: f64 = 20.0;
const LABEL_PENALTY: f64 = 50.0;
const LABEL_CLEARANCE: f64 = 20.0;
const BRANCH_PENALTY: f64 = 30.0;
const BRANCH_CLEARANCE: f64 = 15.0;
const ANGLE_WEIGHT: f64 = 0.1;
const PREFERRED_GAP: f64 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelAnchor {
	Top,
	Bottom,
	Left,
	Right,
	TopLeft,
	TopRight,
}

impl LabelAnchor {
	/// Scan order; earlier anchors win ties.
	pub const ALL: [Self; 6] = [
		Self::Top,
		Self::Bottom,
		Self::Left,
		Self::Right,
		Self::TopLeft,
		Self::TopRight,
	];

	/// Text baseline centre relative to the node centre.
	pub fn offset(self, radius: f64) -> Point {
		match self {
			Self::Top => Point::new(0.0, -radius - 12.0),
			Self::Bottom => Point::new(0.0, radius + 18.0),
			Self::Left => Point::new(-radius - 30.0, 0.0),
			Self::Right => Point::new(radius + 30.0, 0.0),
			Self::TopLeft => Point::new(-radius * 0.7, -radius * 0.7 - 10.0),
			Self::TopRight => Point::new(radius * 0.7, -radius * 0.7 - 10.0),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelPlacement {
	pub anchor: LabelAnchor,
	pub position: Point,
	pub score: f64,
}

/// Candidate label positions for `node`, in scan order.
pub fn candidates(node: &Node) -> [(LabelAnchor, Point); 6] {
	LabelAnchor::ALL.map(|anchor| (anchor, node.position + anchor.offset(node.radius)))
}

/// Picks the lowest scoring anchor for `nodes[index]`.
///
/// Other labels are approximated by their owner's `Top` anchor, not by the
/// anchor actually chosen for them.
pub fn best_label_position(
	nodes: &[Node],
	branches: &[Branch],
	view: &ViewState,
	index: usize,
	text_width: f64,
) -> LabelPlacement {
	let node = &nodes[index];
	let preferred = node
		.angle
		.map(|angle| node.position + Point::polar(angle, node.radius + PREFERRED_GAP));

	let mut best: Option<LabelPlacement> = None;
	for (anchor, position) in candidates(node) {
		let mut score = 0.0;

		for (other_index, other) in nodes.iter().enumerate() {
			if other_index == index || view.is_hidden(&other.kind) {
				continue;
			}
			if position.distance(other.position) < other.radius + NODE_CLEARANCE {
				score += NODE_PENALTY;
			}
			let other_label = other.position + LabelAnchor::Top.offset(other.radius);
			if position.distance(other_label) < text_width / 2.0 + LABEL_CLEARANCE {
				score += LABEL_PENALTY;
			}
		}

		for branch in branches {
			let from = &nodes[branch.from.0];
			let to = &nodes[branch.to.0];
			if view.is_hidden(&from.kind) || view.is_hidden(&to.kind) {
				continue;
			}
			if distance_to_segment(position, from.position, to.position) < BRANCH_CLEARANCE {
				score += BRANCH_PENALTY;
			}
		}

		if let Some(preferred) = preferred {
			score += position.distance(preferred) * ANGLE_WEIGHT;
		}

		if best.is_none_or(|best| score < best.score) {
			best = Some(LabelPlacement {
				anchor,
				position,
				score,
			});
		}
	}

	best.unwrap_or(LabelPlacement {
		anchor: LabelAnchor::Top,
		position: node.position + LabelAnchor::Top.offset(node.radius),
		score: 0.0,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::branch_system::types::NodeId;

	fn node(id: &str, kind: &str, at: Point, angle: Option<f64>) -> Node {
		Node {
			id: id.into(),
			label: id.into(),
			kind: kind.into(),
			parent: None,
			description: None,
			tags: Vec::new(),
			position: at,
			base_position: at,
			velocity: Point::ZERO,
			radius: 14.0,
			mass: 1.0,
			angle,
			depth: 1,
			fixed: false,
			children: Vec::new(),
		}
	}

	#[test]
	fn isolated_node_without_angle_takes_top() {
		let nodes = vec![
			node("solo", "root", Point::new(0.0, 0.0), None),
			node("far", "concept", Point::new(5000.0, 5000.0), None),
		];
		let placement = best_label_position(&nodes, &[], &ViewState::default(), 0, 60.0);
		assert_eq!(placement.anchor, LabelAnchor::Top);
		assert_eq!(placement.score, 0.0);
		assert_eq!(placement.position, Point::new(0.0, -26.0));
	}

	#[test]
	fn angle_preference_radiates_outward() {
		let nodes = vec![node("a", "concept", Point::new(0.0, 0.0), Some(0.0))];
		let placement = best_label_position(&nodes, &[], &ViewState::default(), 0, 60.0);
		assert_eq!(placement.anchor, LabelAnchor::Right);
		assert!((placement.score - 1.0).abs() < 1e-9);
	}

	#[test]
	fn blocked_top_moves_label() {
		let nodes = vec![
			node("a", "concept", Point::new(0.0, 0.0), None),
			node("above", "concept", Point::new(0.0, -40.0), None),
		];
		let placement = best_label_position(&nodes, &[], &ViewState::default(), 0, 10.0);
		assert_eq!(placement.anchor, LabelAnchor::Bottom);

		let mut view = ViewState::default();
		view.toggle_type("concept");
		let nodes = vec![
			node("a", "root", Point::new(0.0, 0.0), None),
			node("above", "concept", Point::new(0.0, -40.0), None),
		];
		let placement = best_label_position(&nodes, &[], &view, 0, 10.0);
		assert_eq!(placement.anchor, LabelAnchor::Top);
	}

	#[test]
	fn branches_through_candidates_are_penalised() {
		let nodes = vec![
			node("a", "root", Point::new(0.0, 0.0), None),
			node("l", "concept", Point::new(-500.0, -26.0), None),
			node("r", "concept", Point::new(500.0, -26.0), None),
		];
		let branches = vec![Branch {
			from: NodeId(1),
			to: NodeId(2),
			strength: 1.0,
			is_cross_link: true,
			control_points: [Point::ZERO; 2],
		}];
		let placement = best_label_position(&nodes, &branches, &ViewState::default(), 0, 10.0);
		assert_eq!(placement.anchor, LabelAnchor::Bottom);
		assert_eq!(placement.score, 0.0);
	}
}
