use super::config::PhysicsConfig;
use super::geometry::{Point, distance_to_segment, perpendicular_away};
use super::interaction::ViewState;
use super::types::{Branch, Node, NodeId};

/// One simulation tick for every non-fixed node, then for every control point.
///
/// Nodes are integrated in order and later nodes see the updated positions of
/// earlier ones.
pub fn step(nodes: &mut [Node], branches: &mut [Branch], view: &ViewState, config: &PhysicsConfig) {
	for index in 0..nodes.len() {
		if nodes[index].fixed {
			continue;
		}
		let velocity = node_velocity(nodes, branches, index, view, config);
		let node = &mut nodes[index];
		node.velocity = velocity;
		node.position += velocity;
	}
	step_control_points(nodes, branches, view, config);
}

fn node_velocity(
	nodes: &[Node],
	branches: &[Branch],
	index: usize,
	view: &ViewState,
	config: &PhysicsConfig,
) -> Point {
	let node = &nodes[index];
	let here = node.position;
	let mut velocity = node.velocity + (node.base_position - here) * config.spring;

	for (other_index, other) in nodes.iter().enumerate() {
		if other_index == index {
			continue;
		}
		let delta = here - other.position;
		let distance = delta.length();
		if distance > 0.0 && distance < config.repulsion_radius {
			let force = (config.repulsion_radius - distance) / distance * config.repulsion_strength;
			velocity += delta * force;
		}
	}

	let id = NodeId(index);
	for branch in branches {
		if branch.touches(id) {
			continue;
		}
		let start = nodes[branch.from.0].position;
		let end = nodes[branch.to.0].position;
		let distance = distance_to_segment(here, start, end);
		if distance < config.line_radius {
			let strength = (config.line_radius - distance) / config.line_radius * config.line_strength;
			velocity += perpendicular_away(here, start, end) * strength;
		}
	}

	if !view.is_hidden(&node.kind) {
		velocity += Point::new(
			(view.time + here.x * 0.01).sin(),
			(view.time + here.y * 0.01).cos(),
		) * config.oscillation;
	}

	let velocity = velocity * config.damping;
	if velocity.is_finite() { velocity } else { Point::ZERO }
}

/// Drifts control points and pushes them off neighbouring branches.
pub fn step_control_points(nodes: &[Node], branches: &mut [Branch], view: &ViewState, config: &PhysicsConfig) {
	let time = view.time * config.control_time_scale;
	for index in 0..branches.len() {
		for slot in 0..2 {
			let point = branches[index].control_points[slot];
			let mut drift = Point::new(
				(time + point.x * 0.01).sin(),
				(time + point.y * 0.01).cos(),
			) * config.control_oscillation;

			for (other_index, other) in branches.iter().enumerate() {
				if other_index == index {
					continue;
				}
				let start = nodes[other.from.0].position;
				let end = nodes[other.to.0].position;
				let distance = distance_to_segment(point, start, end);
				if distance < config.control_line_radius {
					let strength = (config.control_line_radius - distance) / config.control_line_radius
						* config.control_line_strength;
					drift += perpendicular_away(point, start, end) * strength;
				}
			}

			if drift.is_finite() {
				branches[index].control_points[slot] = point + drift;
			}
		}
	}
}

/// Physics-off behaviour: glide each free node towards its base position.
pub fn settle(nodes: &mut [Node], config: &PhysicsConfig) {
	for node in nodes.iter_mut().filter(|node| !node.fixed) {
		node.position = node.position.lerp(node.base_position, config.settle_rate);
		node.velocity = Point::ZERO;
	}
}
