//! Declarative tuning for the branch system.
//!
//! Every table here is keyed by dataset ids or type tags so the engine itself
//! never special-cases a particular node.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Everything tunable about one branch system.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchConfig {
	/// Radial placement rules.
	pub layout: LayoutConfig,
	/// Force constants for the live simulation.
	pub physics: PhysicsConfig,
	/// Zoom limits and hit testing.
	pub view: ViewConfig,
	/// Node radii, masses and highlights.
	pub sizing: SizingConfig,
	/// Seed for the organic jitter on hierarchical curves.
	pub seed: u64,
}

impl BranchConfig {
	/// Parses a config; missing sections keep their defaults.
	pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(raw)
	}
}

/// What to do with a node whose `parent` id is not in the dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
	/// Fail construction with [`super::DatasetError::UnknownParent`].
	#[default]
	Reject,
	/// Place the node as an extra main branch in radial slot 0.
	DetachedRoot,
}

/// Where nodes rest before physics perturbs them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
	/// Distance of main branches from the root.
	pub main_distance: f64,
	/// Sibling ordering by type; unlisted types sort last.
	pub type_priority: Vec<String>,
	/// More than this many children widens the spread and staggers distances.
	pub crowded_threshold: usize,
	/// More than this many children uses the widest distance stagger.
	pub very_crowded_threshold: usize,
	/// Angle and distance pins for main branches, by id.
	pub main_branches: HashMap<String, MainBranchOverride>,
	/// Overrides for the children of a given parent id.
	pub parents: HashMap<String, ParentOverride>,
	/// Handling of nodes whose parent id is missing.
	pub orphan_policy: OrphanPolicy,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			main_distance: 200.0,
			type_priority: ["thinker", "book", "concept", "experience", "community"]
				.into_iter()
				.map(String::from)
				.collect(),
			crowded_threshold: 4,
			very_crowded_threshold: 6,
			main_branches: HashMap::new(),
			parents: HashMap::new(),
			orphan_policy: OrphanPolicy::default(),
		}
	}
}

/// Pins a main branch instead of spacing it evenly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainBranchOverride {
	/// Absolute angle around the root, radians.
	pub angle: Option<f64>,
	/// Distance from the root, replacing `main_distance`.
	pub distance: Option<f64>,
}

/// Layout rules for the children of one parent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParentOverride {
	/// Added to every child distance that has no per-child distance override.
	pub extra_distance: f64,
	/// Lay all children out as an ordered fan instead of the default spread.
	pub fan: Option<FanOverride>,
	/// Per-child placement, by child id.
	pub children: HashMap<String, ChildOverride>,
}

/// Child `i` sits at `parent angle + start_offset + i * angle_step`, at
/// `base_distance + i * distance_step`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FanOverride {
	/// Angle offset of the first child, radians.
	pub start_offset: f64,
	/// Angle between consecutive children, radians.
	pub angle_step: f64,
	/// Distance of the first child.
	pub base_distance: f64,
	/// Extra distance per subsequent child.
	pub distance_step: f64,
}

/// Placement of a single child.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChildOverride {
	/// Offset from the parent's angle, radians.
	pub angle_offset: Option<f64>,
	/// Replaces or extends the computed distance.
	pub distance: Option<DistanceOverride>,
}

/// How a child override changes the computed distance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceOverride {
	/// Added to the computed band distance.
	Add(f64),
	/// Used as is.
	Absolute(f64),
}

impl DistanceOverride {
	/// Distance after the override.
	pub fn apply(self, computed: f64) -> f64 {
		match self {
			Self::Add(extra) => computed + extra,
			Self::Absolute(distance) => distance,
		}
	}
}

/// Per-tick force constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
	/// Pull towards the base position.
	pub spring: f64,
	/// Nodes closer than this push apart.
	pub repulsion_radius: f64,
	/// Scale of the node push.
	pub repulsion_strength: f64,
	/// Nodes closer than this to a foreign branch are pushed off it.
	pub line_radius: f64,
	/// Scale of the line push.
	pub line_strength: f64,
	/// Amplitude of the idle sway.
	pub oscillation: f64,
	/// Velocity kept after each tick.
	pub damping: f64,
	/// Clock advance per enabled tick.
	pub time_step: f64,
	/// Amplitude of control point drift.
	pub control_oscillation: f64,
	/// Clock multiplier for control point drift.
	pub control_time_scale: f64,
	/// Control points closer than this to another branch are pushed off it.
	pub control_line_radius: f64,
	/// Scale of the control point push.
	pub control_line_strength: f64,
	/// Fraction of the remaining distance covered per tick while physics is off.
	pub settle_rate: f64,
}

impl Default for PhysicsConfig {
	fn default() -> Self {
		Self {
			spring: 0.003,
			repulsion_radius: 35.0,
			repulsion_strength: 0.01,
			line_radius: 30.0,
			line_strength: 0.03,
			oscillation: 0.0005,
			damping: 0.3,
			time_step: 0.01,
			control_oscillation: 0.005,
			control_time_scale: 2.0,
			control_line_radius: 40.0,
			control_line_strength: 0.02,
			settle_rate: 0.1,
		}
	}
}

/// Zoom and pointer tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
	/// Lowest zoom scale.
	pub min_scale: f64,
	/// Highest zoom scale.
	pub max_scale: f64,
	/// Scale multiplier for a positive wheel delta.
	pub zoom_out_factor: f64,
	/// Scale multiplier for a negative wheel delta.
	pub zoom_in_factor: f64,
	/// Added to a node's radius when hit testing.
	pub hit_slop: f64,
}

impl Default for ViewConfig {
	fn default() -> Self {
		Self {
			min_scale: 0.3,
			max_scale: 3.0,
			zoom_out_factor: 0.9,
			zoom_in_factor: 1.1,
			hit_slop: 5.0,
		}
	}
}

/// Radius and mass per node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
	/// Radius when nothing more specific applies.
	pub default_radius: f64,
	/// Radius of the root.
	pub root_radius: f64,
	/// Radius by type tag.
	pub type_radius: HashMap<String, f64>,
	/// Radius by node id; wins over everything else.
	pub id_radius: HashMap<String, f64>,
	/// Mass of the root.
	pub root_mass: f64,
	/// Mass of every other node.
	pub node_mass: f64,
	/// Ids drawn with the pulsing highlight.
	pub featured: Vec<String>,
}

impl Default for SizingConfig {
	fn default() -> Self {
		Self {
			default_radius: 14.0,
			root_radius: 25.0,
			type_radius: HashMap::from([("branch".to_owned(), 18.0)]),
			id_radius: HashMap::new(),
			root_mass: 10.0,
			node_mass: 1.0,
			featured: Vec::new(),
		}
	}
}

impl SizingConfig {
	/// Id, then root, then type, then the default.
	pub fn radius_for(&self, id: &str, kind: &str, is_root: bool) -> f64 {
		if let Some(radius) = self.id_radius.get(id) {
			return *radius;
		}
		if is_root {
			return self.root_radius;
		}
		self.type_radius
			.get(kind)
			.copied()
			.unwrap_or(self.default_radius)
	}

	/// Root or regular mass.
	pub fn mass_for(&self, is_root: bool) -> f64 {
		if is_root { self.root_mass } else { self.node_mass }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let config = BranchConfig::from_json(
			r#"{
				"layout": {
					"main_branches": { "ea": { "angle": -0.94, "distance": 250 } },
					"parents": {
						"longtermism": {
							"extra_distance": 30,
							"children": { "ai-safety": { "angle_offset": -0.6, "distance": { "absolute": 200 } } }
						}
					}
				},
				"view": { "max_scale": 5 }
			}"#,
		)
		.unwrap();

		assert_eq!(config.layout.main_distance, 200.0);
		assert_eq!(config.layout.main_branches["ea"].distance, Some(250.0));
		let child = config.layout.parents["longtermism"].children["ai-safety"];
		assert_eq!(child.distance, Some(DistanceOverride::Absolute(200.0)));
		assert_eq!(config.view.max_scale, 5.0);
		assert_eq!(config.view.min_scale, 0.3);
		assert_eq!(config.physics, PhysicsConfig::default());
	}

	#[test]
	fn radius_prefers_id_then_root_then_type() {
		let mut sizing = SizingConfig::default();
		sizing.id_radius.insert("ea".into(), 20.0);
		assert_eq!(sizing.radius_for("ea", "movement", false), 20.0);
		assert_eq!(sizing.radius_for("root", "root", true), 25.0);
		assert_eq!(sizing.radius_for("x", "branch", false), 18.0);
		assert_eq!(sizing.radius_for("x", "book", false), 14.0);
	}
}
