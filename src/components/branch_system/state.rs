use std::collections::HashMap;

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::config::BranchConfig;
use super::curves::control_points_for;
use super::error::DatasetError;
use super::geometry::Point;
use super::interaction::{Interaction, SelectionChanged, ViewState, hit_test};
use super::layout::build_hierarchy;
use super::physics;
use super::render::{Scene, Surface, draw};
use super::types::{Branch, Dataset, Node, NodeColors, NodeId};

/// One canvas worth of laid-out nodes, branches and view state.
pub struct BranchSystem {
	nodes: Vec<Node>,
	branches: Vec<Branch>,
	index_by_id: HashMap<String, NodeId>,
	colors: NodeColors,
	config: BranchConfig,
	view: ViewState,
	interaction: Interaction,
	rng: StdRng,
	width: f64,
	height: f64,
}

impl BranchSystem {
	/// Lays out `dataset` around the centre of a `width` x `height` canvas.
	pub fn new(dataset: &Dataset, config: BranchConfig, width: f64, height: f64) -> Result<Self, DatasetError> {
		let mut hierarchy = build_hierarchy(dataset, &config.sizing, config.layout.orphan_policy)?;
		hierarchy.layout(Point::new(width / 2.0, height / 2.0), &config.layout);
		let nodes = hierarchy.nodes;

		let index_by_id: HashMap<String, NodeId> = nodes
			.iter()
			.enumerate()
			.map(|(index, node)| (node.id.clone(), NodeId(index)))
			.collect();

		let mut branches: Vec<Branch> = nodes
			.iter()
			.enumerate()
			.filter_map(|(index, node)| {
				node.parent.map(|parent| Branch {
					from: parent,
					to: NodeId(index),
					strength: 1.0,
					is_cross_link: false,
					control_points: [Point::ZERO; 2],
				})
			})
			.collect();

		for connection in &dataset.connections {
			match (index_by_id.get(&connection.from), index_by_id.get(&connection.to)) {
				(Some(&from), Some(&to)) => branches.push(Branch {
					from,
					to,
					strength: connection.strength,
					is_cross_link: true,
					control_points: [Point::ZERO; 2],
				}),
				_ => debug!(
					"dropping connection `{}` -> `{}`: unknown endpoint",
					connection.from, connection.to
				),
			}
		}

		let mut system = Self {
			nodes,
			branches,
			index_by_id,
			colors: dataset.node_colors.clone(),
			rng: StdRng::seed_from_u64(config.seed),
			config,
			view: ViewState::default(),
			interaction: Interaction::default(),
			width,
			height,
		};
		system.regenerate_curves();

		info!(
			"branch system ready: {} nodes, {} branches",
			system.nodes.len(),
			system.branches.len()
		);
		Ok(system)
	}

	/// Parses the dataset, then builds as [`Self::new`].
	pub fn from_json(raw: &str, config: BranchConfig, width: f64, height: f64) -> Result<Self, DatasetError> {
		Self::new(&Dataset::from_json(raw)?, config, width, height)
	}

	fn regenerate_curves(&mut self) {
		for index in 0..self.branches.len() {
			let points = control_points_for(&self.nodes, &self.branches[index], &mut self.rng);
			self.branches[index].control_points = points;
		}
	}

	/// Advances one tick: a physics step while enabled, otherwise settling.
	pub fn update(&mut self) {
		if self.view.physics_enabled {
			self.view.time += self.config.physics.time_step;
			physics::step(&mut self.nodes, &mut self.branches, &self.view, &self.config.physics);
		} else {
			physics::settle(&mut self.nodes, &self.config.physics);
		}
	}

	/// Renders one frame.
	pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
		let scene = Scene {
			nodes: &self.nodes,
			branches: &self.branches,
			view: &self.view,
			colors: &self.colors,
			featured: &self.config.sizing.featured,
			width: self.width,
			height: self.height,
		};
		draw(&scene, surface);
	}

	/// Hit test in screen space.
	pub fn get_node_at(&self, screen: Point) -> Option<NodeId> {
		hit_test(&self.nodes, &self.view, screen, self.config.view.hit_slop)
	}

	/// One wheel notch around `cursor`; `false` when the scale is pinned or `delta` is 0.
	pub fn zoom(&mut self, delta: f64, cursor: Point) -> bool {
		self.view.zoom(delta, cursor, &self.config.view)
	}

	/// Begins a drag at `cursor`.
	pub fn start_pan(&mut self, cursor: Point) {
		self.interaction.start_pan(cursor);
	}

	/// Moves the pan by the drag since the last call.
	pub fn update_pan(&mut self, cursor: Point) {
		self.interaction.update_pan(&mut self.view, cursor);
	}

	/// Finishes the drag.
	pub fn end_pan(&mut self) {
		self.interaction.end_pan();
	}

	/// Whether a drag is in progress.
	pub fn is_panning(&self) -> bool {
		self.interaction.is_panning()
	}

	/// Arms a click over a node, otherwise starts panning.
	pub fn pointer_down(&mut self, cursor: Point) {
		self.interaction
			.pointer_down(&self.nodes, &self.view, cursor, &self.config.view);
	}

	/// Pans while dragging, otherwise updates hover.
	pub fn pointer_move(&mut self, cursor: Point) {
		self.interaction
			.pointer_move(&self.nodes, &mut self.view, cursor, &self.config.view);
	}

	/// Ends the gesture; a release over the pressed node selects it.
	pub fn pointer_up(&mut self, cursor: Point) -> Option<SelectionChanged> {
		self.interaction
			.pointer_up(&self.nodes, &mut self.view, cursor, &self.config.view)
	}

	/// Ends any drag and clears hover.
	pub fn pointer_leave(&mut self) {
		self.interaction.pointer_leave(&mut self.view);
	}

	/// Out-of-range ids clear the hover.
	pub fn set_hovered_node(&mut self, id: Option<NodeId>) {
		self.view.hovered = id.filter(|id| id.0 < self.nodes.len());
	}

	/// Returns whether the selection changed.
	pub fn set_selected_node(&mut self, id: Option<NodeId>) -> bool {
		let id = id.filter(|id| id.0 < self.nodes.len());
		let changed = self.view.selected != id;
		self.view.selected = id;
		changed
	}

	/// Selects by dataset id; unknown ids clear the selection.
	pub fn select_node_by_id(&mut self, id: Option<&str>) -> bool {
		let id = id.and_then(|id| self.node_by_id(id));
		self.set_selected_node(id)
	}

	/// The selected node, if any.
	pub fn selected_node(&self) -> Option<&Node> {
		self.view.selected.and_then(|id| self.node(id))
	}

	/// The hovered node, if any.
	pub fn hovered_node(&self) -> Option<&Node> {
		self.view.hovered.and_then(|id| self.node(id))
	}

	/// Flips visibility of `kind`; returns whether it is now hidden.
	pub fn toggle_node_type(&mut self, kind: &str) -> bool {
		let hidden = self.view.toggle_type(kind);
		self.drop_hidden_hover();
		hidden
	}

	/// Shows or hides every node of `kind`.
	pub fn set_type_hidden(&mut self, kind: &str, hidden: bool) {
		if hidden {
			self.view.hidden_types.insert(kind.to_owned());
		} else {
			self.view.hidden_types.remove(kind);
		}
		self.drop_hidden_hover();
	}

	fn drop_hidden_hover(&mut self) {
		if self
			.hovered_node()
			.is_some_and(|node| self.view.is_hidden(&node.kind))
		{
			self.view.hovered = None;
		}
	}

	/// Returns the new physics flag.
	pub fn toggle_physics(&mut self) -> bool {
		self.view.physics_enabled = !self.view.physics_enabled;
		self.view.physics_enabled
	}

	/// Switches between simulating and settling.
	pub fn set_physics_enabled(&mut self, enabled: bool) {
		self.view.physics_enabled = enabled;
	}

	/// Default pan and zoom, every free node back on its base position, and
	/// freshly rolled curves.
	pub fn reset(&mut self) {
		self.view.pan = Point::ZERO;
		self.view.scale = 1.0;
		for node in self.nodes.iter_mut().filter(|node| !node.fixed) {
			node.position = node.base_position;
			node.velocity = Point::ZERO;
		}
		self.regenerate_curves();
	}

	/// Moves the whole universe so the root stays at the new canvas centre.
	pub fn resize(&mut self, width: f64, height: f64) {
		let shift = Point::new((width - self.width) / 2.0, (height - self.height) / 2.0);
		self.width = width;
		self.height = height;
		if !shift.is_finite() || shift == Point::ZERO {
			return;
		}
		for node in &mut self.nodes {
			node.position += shift;
			node.base_position += shift;
		}
		for branch in &mut self.branches {
			for point in &mut branch.control_points {
				*point += shift;
			}
		}
		debug!("resized to {width}x{height}, shifted by ({}, {})", shift.x, shift.y);
	}

	/// Node at `id`.
	pub fn node(&self, id: NodeId) -> Option<&Node> {
		self.nodes.get(id.0)
	}

	/// Index of the node with dataset id `id`.
	pub fn node_by_id(&self, id: &str) -> Option<NodeId> {
		self.index_by_id.get(id).copied()
	}

	/// Every node in dataset order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Parent edges first, then cross-links.
	pub fn branches(&self) -> &[Branch] {
		&self.branches
	}

	/// Current view state.
	pub fn view(&self) -> &ViewState {
		&self.view
	}

	/// Canvas width and height.
	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}
}
