use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::DatasetError;
use super::geometry::Point;

/// Node type reserved for the single anchored centre node.
pub const ROOT_TYPE: &str = "root";

const FALLBACK_COLOR: &str = "#8fbc8f";

/// One node as authored in the dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
	/// Unique key, referenced by `parent` and connections.
	pub id: String,
	/// Text drawn next to the node.
	pub label: String,
	#[serde(rename = "type")]
	/// Type tag; `root` marks the centre node.
	pub kind: String,
	#[serde(default, alias = "parentId")]
	/// Id of the parent node; absent only for the root.
	pub parent: Option<String>,
	#[serde(default)]
	/// Longer text for the detail panel.
	pub description: Option<String>,
	#[serde(default)]
	/// Free-form keywords.
	pub tags: Vec<String>,
}

/// A declared cross-link between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
	/// Source node id.
	pub from: String,
	/// Target node id.
	pub to: String,
	#[serde(default = "default_strength")]
	/// Link weight, 1.0 when omitted.
	pub strength: f64,
}

fn default_strength() -> f64 {
	1.0
}

/// Node type to CSS colour, with a `default` entry as fallback.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeColors(pub HashMap<String, String>);

impl NodeColors {
	/// Colour for `kind`, then the `default` entry, then a built-in green.
	pub fn color_for(&self, kind: &str) -> &str {
		self.0
			.get(kind)
			.or_else(|| self.0.get("default"))
			.map(String::as_str)
			.unwrap_or(FALLBACK_COLOR)
	}
}

/// The static input supplied once at construction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
	/// Every node, root included.
	pub nodes: Vec<NodeRecord>,
	#[serde(default)]
	/// Cross-links beyond the parent tree.
	pub connections: Vec<Connection>,
	#[serde(default, alias = "nodeColors")]
	/// Colour per type tag.
	pub node_colors: NodeColors,
}

impl Dataset {
	/// Parses the dataset JSON.
	pub fn from_json(raw: &str) -> Result<Self, DatasetError> {
		Ok(serde_json::from_str(raw)?)
	}
}

/// Index of a node inside a [`super::BranchSystem`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A laid-out, simulated node.
#[derive(Clone, Debug)]
pub struct Node {
	/// Dataset id.
	pub id: String,
	/// Display text.
	pub label: String,
	/// Type tag.
	pub kind: String,
	/// Parent index; `None` for the root and detached orphans.
	pub parent: Option<NodeId>,
	/// Copied from the record.
	pub description: Option<String>,
	/// Copied from the record.
	pub tags: Vec<String>,
	/// Live, physics-perturbed location.
	pub position: Point,
	/// Resting location assigned by the layout.
	pub base_position: Point,
	/// Per-tick displacement.
	pub velocity: Point,
	/// Drawn and hit-tested radius.
	pub radius: f64,
	/// Divides applied forces.
	pub mass: f64,
	/// Resolved placement angle; `None` for the root.
	pub angle: Option<f64>,
	/// Hops from the root.
	pub depth: usize,
	/// Fixed nodes never move.
	pub fixed: bool,
	/// Child indices in dataset order.
	pub children: Vec<NodeId>,
}

impl Node {
	/// Whether this is the centre node.
	pub fn is_root(&self) -> bool {
		self.kind == ROOT_TYPE
	}
}

/// An edge between two nodes, drawn as a cubic bezier.
#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
	/// Parent, or the source of a cross-link.
	pub from: NodeId,
	/// Child, or the target of a cross-link.
	pub to: NodeId,
	/// Link weight.
	pub strength: f64,
	/// Declared connection rather than a parent edge.
	pub is_cross_link: bool,
	/// Bezier control points, near `from` first.
	pub control_points: [Point; 2],
}

impl Branch {
	/// Whether either end is `id`.
	pub fn touches(&self, id: NodeId) -> bool {
		self.from == id || self.to == id
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_dataset_with_defaults() {
		let dataset = Dataset::from_json(
			r##"{
				"nodes": [
					{ "id": "root", "label": "MIND", "type": "root" },
					{ "id": "a", "label": "A", "type": "concept", "parentId": "root", "tags": ["x"] }
				],
				"connections": [{ "from": "a", "to": "root" }],
				"nodeColors": { "concept": "#abc", "default": "#fff" }
			}"##,
		)
		.unwrap();

		assert_eq!(dataset.nodes.len(), 2);
		assert_eq!(dataset.nodes[1].parent.as_deref(), Some("root"));
		assert_eq!(dataset.connections[0].strength, 1.0);
		assert_eq!(dataset.node_colors.color_for("concept"), "#abc");
		assert_eq!(dataset.node_colors.color_for("book"), "#fff");
	}

	#[test]
	fn colour_lookup_without_default_uses_fallback() {
		assert_eq!(NodeColors::default().color_for("book"), FALLBACK_COLOR);
	}

	#[test]
	fn malformed_json_is_a_parse_error() {
		let err = Dataset::from_json("{ nodes: ").unwrap_err();
		assert!(matches!(err, DatasetError::Parse(_)));
	}
}
