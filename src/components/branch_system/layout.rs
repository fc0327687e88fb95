use std::collections::{HashMap, VecDeque};
use std::f64::consts::PI;

use log::warn;

use super::config::{LayoutConfig, OrphanPolicy, SizingConfig};
use super::error::DatasetError;
use super::geometry::Point;
use super::types::{Dataset, Node, NodeId, ROOT_TYPE};

/// Nodes with parent links resolved, before placement.
#[derive(Debug)]
pub struct Hierarchy {
	pub nodes: Vec<Node>,
	pub root: NodeId,
	/// Nodes whose parent is missing, placed as extra main branches.
	pub detached: Vec<NodeId>,
}

/// Resolves parent ids into child lists and validates the tree shape.
pub fn build_hierarchy(
	dataset: &Dataset,
	sizing: &SizingConfig,
	policy: OrphanPolicy,
) -> Result<Hierarchy, DatasetError> {
	let mut index_by_id = HashMap::with_capacity(dataset.nodes.len());
	let mut root: Option<usize> = None;
	for (index, record) in dataset.nodes.iter().enumerate() {
		if index_by_id.insert(record.id.as_str(), index).is_some() {
			return Err(DatasetError::DuplicateId(record.id.clone()));
		}
		if record.kind == ROOT_TYPE {
			if let Some(first) = root {
				return Err(DatasetError::MultipleRoots {
					first: dataset.nodes[first].id.clone(),
					second: record.id.clone(),
				});
			}
			root = Some(index);
		}
	}
	let root = root.ok_or(DatasetError::MissingRoot)?;

	let mut nodes = dataset
		.nodes
		.iter()
		.enumerate()
		.map(|(index, record)| {
			let is_root = index == root;
			Node {
				id: record.id.clone(),
				label: record.label.clone(),
				kind: record.kind.clone(),
				parent: None,
				description: record.description.clone(),
				tags: record.tags.clone(),
				position: Point::ZERO,
				base_position: Point::ZERO,
				velocity: Point::ZERO,
				radius: sizing.radius_for(&record.id, &record.kind, is_root),
				mass: sizing.mass_for(is_root),
				angle: None,
				depth: 0,
				fixed: is_root,
				children: Vec::new(),
			}
		})
		.collect::<Vec<_>>();

	let mut detached = Vec::new();
	for (index, record) in dataset.nodes.iter().enumerate() {
		if index == root {
			continue;
		}
		let parent_index = record
			.parent
			.as_deref()
			.and_then(|parent| index_by_id.get(parent).copied());
		match parent_index {
			Some(parent_index) => {
				nodes[index].parent = Some(NodeId(parent_index));
				nodes[parent_index].children.push(NodeId(index));
			}
			None => {
				let parent = record.parent.clone().unwrap_or_default();
				if policy == OrphanPolicy::Reject {
					return Err(DatasetError::UnknownParent {
						node: record.id.clone(),
						parent,
					});
				}
				warn!(
					"node `{}` has unknown parent `{}`; placing it as a detached branch",
					record.id, parent
				);
				detached.push(NodeId(index));
			}
		}
	}

	let mut reached = vec![false; nodes.len()];
	let mut queue = VecDeque::from([NodeId(root)]);
	queue.extend(detached.iter().copied());
	while let Some(NodeId(index)) = queue.pop_front() {
		if std::mem::replace(&mut reached[index], true) {
			continue;
		}
		queue.extend(nodes[index].children.iter().copied());
	}
	if let Some(index) = reached.iter().position(|seen| !seen) {
		return Err(DatasetError::ParentCycle(nodes[index].id.clone()));
	}

	Ok(Hierarchy {
		nodes,
		root: NodeId(root),
		detached,
	})
}

impl Hierarchy {
	/// Assigns base positions, angles and depths radiating out from `center`.
	pub fn layout(&mut self, center: Point, config: &LayoutConfig) {
		let root = self.root.0;
		self.nodes[root].base_position = center;
		self.nodes[root].position = center;
		self.nodes[root].depth = 0;
		self.nodes[root].angle = None;

		let main_branches = self.nodes[root].children.clone();
		let count = main_branches.len().max(1) as f64;
		for (index, NodeId(branch)) in main_branches.into_iter().enumerate() {
			let overrides = config.main_branches.get(&self.nodes[branch].id);
			let angle = overrides
				.and_then(|o| o.angle)
				.unwrap_or_else(|| index as f64 * (2.0 * PI / count) - PI / 2.0);
			let distance = overrides
				.and_then(|o| o.distance)
				.unwrap_or(config.main_distance);
			self.place(branch, center + Point::polar(angle, distance), angle, 1);
			self.place_children(branch, 2, config);
		}

		for NodeId(orphan) in self.detached.clone() {
			let angle = -PI / 2.0;
			self.place(orphan, center + Point::polar(angle, config.main_distance), angle, 1);
			self.place_children(orphan, 2, config);
		}
	}

	fn place(&mut self, index: usize, at: Point, angle: f64, depth: usize) {
		let node = &mut self.nodes[index];
		node.position = at;
		node.base_position = at;
		node.velocity = Point::ZERO;
		node.angle = Some(angle);
		node.depth = depth;
	}

	fn place_children(&mut self, parent: usize, depth: usize, config: &LayoutConfig) {
		let count = self.nodes[parent].children.len();
		if count == 0 {
			return;
		}

		let origin = self.nodes[parent].base_position;
		let parent_angle = self.nodes[parent].angle.unwrap_or(-PI / 2.0);
		let rule = config.parents.get(&self.nodes[parent].id);

		let crowded = count > config.crowded_threshold;
		let very_crowded = count > config.very_crowded_threshold;
		let spread = if crowded {
			(PI * 0.8).min(PI / 3.0 * (1.0 + count as f64 * 0.15))
		} else {
			PI / 4.0 + count as f64 * 0.1
		};
		let start_angle = parent_angle - spread / 2.0;
		let angle_step = if count > 1 {
			spread / (count - 1) as f64
		} else {
			0.0
		};

		let mut children = self.nodes[parent].children.clone();
		children.sort_by_key(|NodeId(child)| type_rank(&config.type_priority, &self.nodes[*child].kind));

		for (index, NodeId(child)) in children.into_iter().enumerate() {
			let spread_angle = if count == 1 {
				parent_angle
			} else {
				start_angle + index as f64 * angle_step
			};
			let depth_f = depth as f64;
			let band_distance = if very_crowded {
				180.0 + (index % 3) as f64 * 40.0 + depth_f * 20.0
			} else if crowded {
				150.0 + (index % 2) as f64 * 30.0 + depth_f * 15.0
			} else {
				120.0 + (index % 2) as f64 * 20.0 + depth_f * 10.0
			};

			let (angle, distance) = match rule {
				None => (spread_angle, band_distance),
				Some(rule) => match (rule.children.get(&self.nodes[child].id), rule.fan) {
					(Some(over), _) => (
						over.angle_offset
							.map(|offset| parent_angle + offset)
							.unwrap_or(spread_angle),
						over.distance
							.map(|d| d.apply(band_distance))
							.unwrap_or(band_distance + rule.extra_distance),
					),
					(None, Some(fan)) => (
						parent_angle + fan.start_offset + index as f64 * fan.angle_step,
						fan.base_distance + index as f64 * fan.distance_step,
					),
					(None, None) => (spread_angle, band_distance + rule.extra_distance),
				},
			};

			self.place(child, origin + Point::polar(angle, distance), angle, depth);
			self.place_children(child, depth + 1, config);
		}
	}
}

fn type_rank(priority: &[String], kind: &str) -> usize {
	priority
		.iter()
		.position(|p| p == kind)
		.unwrap_or(priority.len())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::branch_system::config::{
		ChildOverride, DistanceOverride, FanOverride, MainBranchOverride, ParentOverride,
	};
	use crate::components::branch_system::types::NodeRecord;

	fn record(id: &str, kind: &str, parent: Option<&str>) -> NodeRecord {
		NodeRecord {
			id: id.into(),
			label: id.to_uppercase(),
			kind: kind.into(),
			parent: parent.map(String::from),
			description: None,
			tags: Vec::new(),
		}
	}

	fn dataset(nodes: Vec<NodeRecord>) -> Dataset {
		Dataset {
			nodes,
			..Dataset::default()
		}
	}

	fn laid_out(data: &Dataset, config: &LayoutConfig) -> Hierarchy {
		let mut hierarchy =
			build_hierarchy(data, &SizingConfig::default(), config.orphan_policy).unwrap();
		hierarchy.layout(Point::new(400.0, 300.0), config);
		hierarchy
	}

	fn by_id<'a>(h: &'a Hierarchy, id: &str) -> &'a Node {
		h.nodes.iter().find(|n| n.id == id).unwrap()
	}

	#[test]
	fn main_branches_are_evenly_spaced_at_default_distance() {
		let data = dataset(vec![
			record("r", "root", None),
			record("a", "concept", Some("r")),
			record("b", "concept", Some("r")),
			record("c", "concept", Some("r")),
		]);
		let h = laid_out(&data, &LayoutConfig::default());
		let center = Point::new(400.0, 300.0);

		let expected = [-PI / 2.0, -PI / 2.0 + 2.0 * PI / 3.0, -PI / 2.0 + 4.0 * PI / 3.0];
		for (id, angle) in ["a", "b", "c"].into_iter().zip(expected) {
			let node = by_id(&h, id);
			assert!((node.angle.unwrap() - angle).abs() < 1e-9);
			assert!((node.base_position.distance(center) - 200.0).abs() < 1e-9);
			assert_eq!(node.depth, 1);
		}
		let root = by_id(&h, "r");
		assert!(root.fixed);
		assert_eq!(root.base_position, center);
	}

	#[test]
	fn main_branch_overrides_replace_angle_and_distance() {
		let data = dataset(vec![record("r", "root", None), record("ea", "movement", Some("r"))]);
		let mut config = LayoutConfig::default();
		config.main_branches.insert(
			"ea".into(),
			MainBranchOverride {
				angle: Some(-PI * 0.3),
				distance: Some(250.0),
			},
		);
		let h = laid_out(&data, &config);
		let ea = by_id(&h, "ea");
		assert!((ea.angle.unwrap() + PI * 0.3).abs() < 1e-12);
		assert!((ea.base_position.distance(Point::new(400.0, 300.0)) - 250.0).abs() < 1e-9);
	}

	#[test]
	fn children_sorted_by_type_priority() {
		let data = dataset(vec![
			record("r", "root", None),
			record("m", "concept", Some("r")),
			record("x", "movement", Some("m")),
			record("c", "concept", Some("m")),
			record("t", "thinker", Some("m")),
		]);
		let h = laid_out(&data, &LayoutConfig::default());
		let t = by_id(&h, "t").angle.unwrap();
		let c = by_id(&h, "c").angle.unwrap();
		let x = by_id(&h, "x").angle.unwrap();
		assert!(t < c && c < x, "expected thinker < concept < other: {t} {c} {x}");
	}

	#[test]
	fn crowded_children_use_wider_spread_and_staggered_bands() {
		let mut nodes = vec![record("r", "root", None), record("m", "concept", Some("r"))];
		for i in 0..7 {
			nodes.push(record(&format!("k{i}"), "concept", Some("m")));
		}
		let h = laid_out(&dataset(nodes), &LayoutConfig::default());
		let parent = by_id(&h, "m");
		let first = by_id(&h, "k0");
		let last = by_id(&h, "k6");

		let spread = last.angle.unwrap() - first.angle.unwrap();
		assert!((spread - (PI * 0.8).min(PI / 3.0 * (1.0 + 7.0 * 0.15))).abs() < 1e-9);
		let d0 = first.base_position.distance(parent.base_position);
		let d1 = by_id(&h, "k1").base_position.distance(parent.base_position);
		assert!((d0 - (180.0 + 2.0 * 20.0)).abs() < 1e-9);
		assert!((d1 - (220.0 + 2.0 * 20.0)).abs() < 1e-9);
		assert_eq!(first.depth, 2);
	}

	#[test]
	fn single_child_continues_parent_angle() {
		let data = dataset(vec![
			record("r", "root", None),
			record("m", "concept", Some("r")),
			record("k", "book", Some("m")),
		]);
		let h = laid_out(&data, &LayoutConfig::default());
		assert_eq!(by_id(&h, "k").angle, by_id(&h, "m").angle);
		let d = by_id(&h, "k").base_position.distance(by_id(&h, "m").base_position);
		assert!((d - 140.0).abs() < 1e-9);
	}

	#[test]
	fn parent_rules_apply_child_overrides_extra_distance_and_fans() {
		let data = dataset(vec![
			record("r", "root", None),
			record("lt", "concept", Some("r")),
			record("ai", "concept", Some("lt")),
			record("other", "concept", Some("lt")),
			record("f0", "concept", Some("ai")),
			record("f1", "concept", Some("ai")),
		]);
		let mut config = LayoutConfig::default();
		config.parents.insert(
			"lt".into(),
			ParentOverride {
				extra_distance: 30.0,
				fan: None,
				children: [(
					"ai".to_owned(),
					ChildOverride {
						angle_offset: Some(-0.6),
						distance: Some(DistanceOverride::Absolute(200.0)),
					},
				)]
				.into(),
			},
		);
		config.parents.insert(
			"ai".into(),
			ParentOverride {
				fan: Some(FanOverride {
					start_offset: -0.3,
					angle_step: 0.2,
					base_distance: 150.0,
					distance_step: 20.0,
				}),
				..ParentOverride::default()
			},
		);
		let h = laid_out(&data, &config);
		let lt = by_id(&h, "lt");
		let ai = by_id(&h, "ai");
		let other = by_id(&h, "other");

		assert!((ai.angle.unwrap() - (lt.angle.unwrap() - 0.6)).abs() < 1e-12);
		assert!((ai.base_position.distance(lt.base_position) - 200.0).abs() < 1e-9);
		// Two children, index 1 band: 120 + 20 + 2*10, plus the parent's extra.
		assert!((other.base_position.distance(lt.base_position) - 190.0).abs() < 1e-9);

		let f1 = by_id(&h, "f1");
		assert!((f1.angle.unwrap() - (ai.angle.unwrap() - 0.1)).abs() < 1e-12);
		assert!((f1.base_position.distance(ai.base_position) - 170.0).abs() < 1e-9);
	}

	#[test]
	fn unknown_parent_is_rejected_by_default() {
		let data = dataset(vec![record("r", "root", None), record("a", "concept", Some("ghost"))]);
		let err = build_hierarchy(&data, &SizingConfig::default(), OrphanPolicy::Reject).unwrap_err();
		assert!(matches!(err, DatasetError::UnknownParent { ref node, ref parent } if node == "a" && parent == "ghost"));
	}

	#[test]
	fn unknown_parent_can_be_placed_in_slot_zero() {
		let data = dataset(vec![
			record("r", "root", None),
			record("a", "concept", Some("ghost")),
			record("b", "book", Some("a")),
		]);
		let config = LayoutConfig {
			orphan_policy: OrphanPolicy::DetachedRoot,
			..LayoutConfig::default()
		};
		let h = laid_out(&data, &config);
		let a = by_id(&h, "a");
		assert_eq!(a.parent, None);
		assert!((a.base_position.x - 400.0).abs() < 1e-9);
		assert!((a.base_position.y - 100.0).abs() < 1e-9);
		assert_eq!(by_id(&h, "b").depth, 2);
	}

	#[test]
	fn structural_errors() {
		let no_root = dataset(vec![record("a", "concept", None)]);
		assert!(matches!(
			build_hierarchy(&no_root, &SizingConfig::default(), OrphanPolicy::Reject),
			Err(DatasetError::MissingRoot)
		));

		let two_roots = dataset(vec![record("a", "root", None), record("b", "root", None)]);
		assert!(matches!(
			build_hierarchy(&two_roots, &SizingConfig::default(), OrphanPolicy::Reject),
			Err(DatasetError::MultipleRoots { .. })
		));

		let dup = dataset(vec![record("a", "root", None), record("a", "concept", Some("a"))]);
		assert!(matches!(
			build_hierarchy(&dup, &SizingConfig::default(), OrphanPolicy::Reject),
			Err(DatasetError::DuplicateId(id)) if id == "a"
		));

		let cycle = dataset(vec![
			record("r", "root", None),
			record("a", "concept", Some("b")),
			record("b", "concept", Some("a")),
		]);
		assert!(matches!(
			build_hierarchy(&cycle, &SizingConfig::default(), OrphanPolicy::Reject),
			Err(DatasetError::ParentCycle(_))
		));
	}
}
