use std::collections::HashSet;

use super::config::ViewConfig;
use super::geometry::Point;
use super::types::{Node, NodeId};

/// Per-canvas view state consumed by update, hit testing and drawing.
///
/// Hover and selection are plain ids, resolved against the node list on use.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
	/// Screen offset of the world origin.
	pub pan: Point,
	/// Zoom factor.
	pub scale: f64,
	/// Node under the pointer.
	pub hovered: Option<NodeId>,
	/// Node last clicked.
	pub selected: Option<NodeId>,
	/// Type tags filtered out of drawing and hit tests.
	pub hidden_types: HashSet<String>,
	/// Simulate when set, settle otherwise.
	pub physics_enabled: bool,
	/// Animation clock, advanced only while physics runs.
	pub time: f64,
}

impl Default for ViewState {
	fn default() -> Self {
		Self {
			pan: Point::ZERO,
			scale: 1.0,
			hovered: None,
			selected: None,
			hidden_types: HashSet::new(),
			physics_enabled: true,
			time: 0.0,
		}
	}
}

impl ViewState {
	/// Whether nodes of `kind` are filtered out.
	pub fn is_hidden(&self, kind: &str) -> bool {
		self.hidden_types.contains(kind)
	}

	/// Undoes pan and zoom.
	pub fn screen_to_world(&self, screen: Point) -> Point {
		(screen - self.pan) * (1.0 / self.scale)
	}

	/// Applies pan and zoom.
	pub fn world_to_screen(&self, world: Point) -> Point {
		self.pan + world * self.scale
	}

	/// Zooms by one wheel notch around `cursor`, keeping the world point under
	/// it fixed. Returns `false` when the scale did not change.
	pub fn zoom(&mut self, delta: f64, cursor: Point, config: &ViewConfig) -> bool {
		let factor = if delta > 0.0 {
			config.zoom_out_factor
		} else if delta < 0.0 {
			config.zoom_in_factor
		} else {
			return false;
		};

		let world = self.screen_to_world(cursor);
		let scale = (self.scale * factor).clamp(config.min_scale, config.max_scale);
		if scale == self.scale {
			return false;
		}
		self.scale = scale;
		self.pan = cursor - world * scale;
		true
	}

	/// Flips visibility of a node type; returns whether it is now hidden.
	pub fn toggle_type(&mut self, kind: &str) -> bool {
		if self.hidden_types.remove(kind) {
			false
		} else {
			self.hidden_types.insert(kind.to_owned());
			true
		}
	}
}

/// First visible node whose centre is within `radius + slop` of the screen
/// point, in dataset order.
pub fn hit_test(nodes: &[Node], view: &ViewState, screen: Point, slop: f64) -> Option<NodeId> {
	let world = view.screen_to_world(screen);
	if !world.is_finite() {
		return None;
	}
	nodes
		.iter()
		.position(|node| !view.is_hidden(&node.kind) && node.position.distance(world) <= node.radius + slop)
		.map(NodeId)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PointerMode {
	#[default]
	Idle,
	Panning {
		last: Point,
	},
}

/// Selection after a pointer gesture, when it changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct SelectionChanged(pub Option<NodeId>);

/// Pointer state machine over idle and panning.
#[derive(Clone, Debug, Default)]
pub struct Interaction {
	pub mode: PointerMode,
	pressed: Option<NodeId>,
}

impl Interaction {
	pub fn is_panning(&self) -> bool {
		matches!(self.mode, PointerMode::Panning { .. })
	}

	pub fn start_pan(&mut self, cursor: Point) {
		self.mode = PointerMode::Panning { last: cursor };
	}

	pub fn update_pan(&mut self, view: &mut ViewState, cursor: Point) {
		if let PointerMode::Panning { last } = &mut self.mode {
			view.pan += cursor - *last;
			*last = cursor;
		}
	}

	pub fn end_pan(&mut self) {
		self.mode = PointerMode::Idle;
	}

	/// A press on a node arms a click; a press on empty space starts panning.
	pub fn pointer_down(&mut self, nodes: &[Node], view: &ViewState, cursor: Point, config: &ViewConfig) {
		match hit_test(nodes, view, cursor, config.hit_slop) {
			Some(id) => self.pressed = Some(id),
			None => {
				self.pressed = None;
				self.start_pan(cursor);
			}
		}
	}

	pub fn pointer_move(&mut self, nodes: &[Node], view: &mut ViewState, cursor: Point, config: &ViewConfig) {
		if self.is_panning() {
			self.update_pan(view, cursor);
		} else {
			view.hovered = hit_test(nodes, view, cursor, config.hit_slop);
		}
	}

	/// Ends a pan, or completes a click when released over the pressed node.
	pub fn pointer_up(
		&mut self,
		nodes: &[Node],
		view: &mut ViewState,
		cursor: Point,
		config: &ViewConfig,
	) -> Option<SelectionChanged> {
		if self.is_panning() {
			self.end_pan();
			return None;
		}

		let pressed = self.pressed.take()?;
		if hit_test(nodes, view, cursor, config.hit_slop) != Some(pressed) || view.selected == Some(pressed) {
			return None;
		}
		view.selected = Some(pressed);
		Some(SelectionChanged(view.selected))
	}

	pub fn pointer_leave(&mut self, view: &mut ViewState) {
		self.end_pan();
		self.pressed = None;
		view.hovered = None;
	}
}
