use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::{CanvasGradient, CanvasRenderingContext2d};

use super::geometry::Point;
use super::interaction::ViewState;
use super::labels::best_label_position;
use super::types::{Branch, Node, NodeColors};

const LABEL_PLATE: &str = "rgba(13, 31, 13, 0.85)";
const LABEL_PLATE_HEIGHT: f64 = 14.0;
const LABEL_PLATE_PAD: f64 = 3.0;

/// Gradient stroke for one branch curve, colours running from `from` to `to`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineStyle {
	/// Colour at the `from` end.
	pub start_color: &'static str,
	/// Colour at the `to` end.
	pub end_color: &'static str,
	/// Stroke width in world units.
	pub width: f64,
	/// Dash pattern; empty for a solid line.
	pub dash: &'static [f64],
}

/// The drawing operations the renderer needs, in world coordinates once a
/// transform has been pushed.
pub trait Surface {
	/// Wipes the whole surface.
	fn clear(&mut self, width: f64, height: f64);
	/// Saves state, then applies pan and zoom.
	fn push_transform(&mut self, pan: Point, scale: f64);
	/// Restores the state saved by `push_transform`.
	fn pop_transform(&mut self);
	/// Strokes a cubic curve with a gradient along it.
	fn stroke_bezier(&mut self, from: Point, controls: [Point; 2], to: Point, style: &LineStyle);
	/// Fills a square of half-width `radius` with a radial gradient centred on
	/// `center`; stops are `(offset, colour)` pairs.
	fn radial_glow(&mut self, center: Point, radius: f64, stops: &[(f64, String)]);
	/// Solid disc.
	fn fill_circle(&mut self, center: Point, radius: f64, color: &str);
	/// Circle outline.
	fn stroke_circle(&mut self, center: Point, radius: f64, color: &str, width: f64);
	/// Solid rectangle from its top-left corner.
	fn fill_rect(&mut self, origin: Point, width: f64, height: f64, color: &str);
	/// CSS font shorthand for later text calls.
	fn set_font(&mut self, font: &str);
	/// Width of `text` in the current font.
	fn measure_text(&mut self, text: &str) -> f64;
	/// Text centred on `at` both ways.
	fn fill_text_centered(&mut self, text: &str, at: Point, color: &str);
}

/// Everything one frame reads.
pub struct Scene<'a> {
	pub nodes: &'a [Node],
	pub branches: &'a [Branch],
	pub view: &'a ViewState,
	pub colors: &'a NodeColors,
	/// Ids drawn with the golden pulse.
	pub featured: &'a [String],
	pub width: f64,
	pub height: f64,
}

impl Scene<'_> {
	fn is_visible(&self, node: &Node) -> bool {
		!self.view.is_hidden(&node.kind)
	}

	fn branch_visible(&self, branch: &Branch) -> bool {
		self.is_visible(&self.nodes[branch.from.0]) && self.is_visible(&self.nodes[branch.to.0])
	}

	fn is_featured(&self, node: &Node) -> bool {
		self.featured.iter().any(|id| *id == node.id)
	}
}

/// Draws cross-links, then hierarchical branches, then nodes, then labels.
/// Anything touching a hidden type is skipped.
pub fn draw<S: Surface + ?Sized>(scene: &Scene<'_>, surface: &mut S) {
	surface.clear(scene.width, scene.height);
	surface.push_transform(scene.view.pan, scene.view.scale);

	for cross_link in [true, false] {
		for branch in scene
			.branches
			.iter()
			.filter(|branch| branch.is_cross_link == cross_link && scene.branch_visible(branch))
		{
			draw_branch(scene, branch, surface);
		}
	}

	for (index, node) in scene.nodes.iter().enumerate() {
		if scene.is_visible(node) {
			draw_node(scene, index, node, surface);
		}
	}

	for (index, node) in scene.nodes.iter().enumerate() {
		if scene.is_visible(node) {
			draw_label(scene, index, node, surface);
		}
	}

	surface.pop_transform();
}

fn draw_branch<S: Surface + ?Sized>(scene: &Scene<'_>, branch: &Branch, surface: &mut S) {
	let from = scene.nodes[branch.from.0].position;
	let to = scene.nodes[branch.to.0].position;
	let style = if branch.is_cross_link {
		LineStyle {
			start_color: "rgba(126, 179, 70, 0.08)",
			end_color: "rgba(74, 124, 46, 0.05)",
			width: 0.5 * branch.strength,
			dash: &[3.0, 12.0],
		}
	} else {
		LineStyle {
			start_color: "rgba(126, 179, 70, 0.6)",
			end_color: "rgba(74, 124, 46, 0.3)",
			width: 3.0,
			dash: &[],
		}
	};
	surface.stroke_bezier(from, branch.control_points, to, &style);
}

fn draw_node<S: Surface + ?Sized>(scene: &Scene<'_>, index: usize, node: &Node, surface: &mut S) {
	let t = scene.view.time;
	let hovered = scene.view.hovered.is_some_and(|id| id.0 == index);
	let selected = scene.view.selected.is_some_and(|id| id.0 == index);
	let featured = scene.is_featured(node);
	let root = node.is_root();
	let at = node.position;

	if featured {
		let (intensity, size) = if hovered {
			(
				0.6 + 0.4 * (t * 8.0).sin() + 0.2 * (t * 12.0).sin(),
				50.0 + 25.0 * (t * 6.0).sin() + 10.0 * (t * 15.0).sin(),
			)
		} else {
			(0.2 + 0.15 * (t * 1.5).sin(), 30.0 + 8.0 * (t * 1.2).sin())
		};
		let stops: &[(f64, &str, f64)] = if hovered {
			&[
				(0.0, "255, 215, 0", 0.8),
				(0.2, "255, 165, 0", 0.6),
				(0.5, "255, 105, 180", 0.4),
				(0.8, "126, 179, 70", 0.2),
			]
		} else {
			&[
				(0.0, "255, 215, 0", 0.3),
				(0.4, "255, 165, 0", 0.2),
				(0.8, "126, 179, 70", 0.1),
			]
		};
		surface.radial_glow(at, size, &fading_stops(stops, intensity));
	} else if root {
		let (intensity, size) = if hovered {
			(
				0.7 + 0.3 * (t * 7.0).sin() + 0.15 * (t * 11.0).sin(),
				60.0 + 30.0 * (t * 5.0).sin() + 15.0 * (t * 13.0).sin(),
			)
		} else {
			(0.25 + 0.12 * (t * 1.3).sin(), 40.0 + 10.0 * (t * 0.9).sin())
		};
		let stops: &[(f64, &str, f64)] = if hovered {
			&[
				(0.0, "70, 130, 180", 0.7),
				(0.2, "100, 149, 237", 0.5),
				(0.4, "138, 43, 226", 0.4),
				(0.7, "126, 179, 70", 0.2),
			]
		} else {
			&[
				(0.0, "70, 130, 180", 0.25),
				(0.3, "100, 149, 237", 0.18),
				(0.7, "126, 179, 70", 0.12),
			]
		};
		surface.radial_glow(at, size, &fading_stops(stops, intensity));
	} else if hovered || selected {
		let size = if selected { 40.0 } else { 30.0 };
		surface.radial_glow(
			at,
			size,
			&[(0.0, "rgba(126, 179, 70, 0.3)".to_owned()), (1.0, "rgba(126, 179, 70, 0)".to_owned())],
		);
	}

	surface.fill_circle(at, node.radius, scene.colors.color_for(&node.kind));

	if featured {
		let (width, opacity) = if hovered {
			(
				3.0 + 2.5 * (t * 10.0).sin() + (t * 18.0).sin(),
				0.9 + 0.1 * (t * 8.0).sin(),
			)
		} else {
			(2.0 + 0.8 * (t * 2.5).sin(), 0.6 + 0.15 * (t * 2.0).sin())
		};
		surface.stroke_circle(at, node.radius, &format!("rgba(255, 215, 0, {opacity})"), width);

		let inner = if hovered {
			0.8 + 0.2 * (t * 12.0).sin()
		} else {
			0.3 + 0.1 * (t * 3.0).sin()
		};
		surface.stroke_circle(
			at,
			node.radius * 0.7,
			&format!("rgba(255, 215, 0, {inner})"),
			if hovered { 2.0 } else { 1.0 },
		);
	} else if root {
		let (width, opacity) = if hovered {
			(
				3.0 + 2.0 * (t * 9.0).sin() + (t * 16.0).sin(),
				0.95 + 0.05 * (t * 7.0).sin(),
			)
		} else {
			(2.0 + 0.6 * (t * 1.8).sin(), 0.7 + 0.12 * (t * 1.6).sin())
		};
		surface.stroke_circle(at, node.radius, &format!("rgba(70, 130, 180, {opacity})"), width);
		surface.stroke_circle(
			at,
			node.radius * 0.6,
			&format!("rgba(70, 130, 180, {})", 0.5 + 0.08 * (t * 2.2).sin()),
			1.0,
		);
	} else if hovered {
		surface.stroke_circle(at, node.radius, "#ffffff", 3.0);
	} else {
		surface.stroke_circle(at, node.radius, "rgba(143, 188, 143, 0.5)", 2.0);
	}
}

/// Scales each stop's alpha by `intensity` and appends a transparent tail in
/// the colour of the last stop.
fn fading_stops(stops: &[(f64, &str, f64)], intensity: f64) -> Vec<(f64, String)> {
	let mut out: Vec<(f64, String)> = stops
		.iter()
		.map(|(offset, rgb, alpha)| (*offset, format!("rgba({rgb}, {})", alpha * intensity)))
		.collect();
	if let Some((_, rgb, _)) = stops.last() {
		out.push((1.0, format!("rgba({rgb}, 0)")));
	}
	out
}

fn draw_label<S: Surface + ?Sized>(scene: &Scene<'_>, index: usize, node: &Node, surface: &mut S) {
	let hovered = scene.view.hovered.is_some_and(|id| id.0 == index);
	let mut size = if node.is_root() { 10 } else { 8 };
	if hovered {
		size += 2;
	}
	surface.set_font(&format!("bold {size}px Courier New"));

	let text_width = surface.measure_text(&node.label);
	let placement = best_label_position(scene.nodes, scene.branches, scene.view, index, text_width);
	let at = placement.position;

	surface.fill_rect(
		Point::new(at.x - text_width / 2.0 - LABEL_PLATE_PAD, at.y - 10.0),
		text_width + LABEL_PLATE_PAD * 2.0,
		LABEL_PLATE_HEIGHT,
		LABEL_PLATE,
	);
	surface.fill_text_centered(
		&node.label,
		at,
		&format!("rgba(143, 188, 143, {})", label_opacity(node.depth, hovered)),
	);
}

pub fn label_opacity(depth: usize, hovered: bool) -> f64 {
	if hovered {
		1.0
	} else if depth == 0 {
		0.8
	} else {
		(1.0 - depth as f64 * 0.15).max(0.5)
	}
}

fn gradient_with_stops(gradient: &CanvasGradient, stops: &[(f64, &str)]) {
	for (offset, color) in stops {
		let _ = gradient.add_color_stop(*offset as f32, color);
	}
}

impl Surface for CanvasRenderingContext2d {
	fn clear(&mut self, width: f64, height: f64) {
		self.clear_rect(0.0, 0.0, width, height);
	}

	fn push_transform(&mut self, pan: Point, scale: f64) {
		self.save();
		let _ = self.translate(pan.x, pan.y);
		let _ = self.scale(scale, scale);
	}

	fn pop_transform(&mut self) {
		self.restore();
	}

	fn stroke_bezier(&mut self, from: Point, controls: [Point; 2], to: Point, style: &LineStyle) {
		let gradient = self.create_linear_gradient(from.x, from.y, to.x, to.y);
		gradient_with_stops(&gradient, &[(0.0, style.start_color), (1.0, style.end_color)]);
		self.set_stroke_style_canvas_gradient(&gradient);
		self.set_line_width(style.width);
		let dash = style.dash.iter().map(|d| JsValue::from_f64(*d)).collect::<js_sys::Array>();
		let _ = self.set_line_dash(&dash);

		self.begin_path();
		self.move_to(from.x, from.y);
		let [c1, c2] = controls;
		self.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, to.x, to.y);
		self.stroke();
		let _ = self.set_line_dash(&js_sys::Array::new());
	}

	fn radial_glow(&mut self, center: Point, radius: f64, stops: &[(f64, String)]) {
		let Ok(gradient) = self.create_radial_gradient(center.x, center.y, 0.0, center.x, center.y, radius.max(0.0))
		else {
			return;
		};
		let stops: Vec<(f64, &str)> = stops.iter().map(|(o, c)| (*o, c.as_str())).collect();
		gradient_with_stops(&gradient, &stops);
		self.set_fill_style_canvas_gradient(&gradient);
		CanvasRenderingContext2d::fill_rect(self, center.x - radius, center.y - radius, radius * 2.0, radius * 2.0);
	}

	fn fill_circle(&mut self, center: Point, radius: f64, color: &str) {
		self.begin_path();
		let _ = self.arc(center.x, center.y, radius, 0.0, 2.0 * PI);
		self.set_fill_style_str(color);
		self.fill();
	}

	fn stroke_circle(&mut self, center: Point, radius: f64, color: &str, width: f64) {
		self.begin_path();
		let _ = self.arc(center.x, center.y, radius, 0.0, 2.0 * PI);
		self.set_stroke_style_str(color);
		self.set_line_width(width);
		self.stroke();
	}

	fn fill_rect(&mut self, origin: Point, width: f64, height: f64, color: &str) {
		self.set_fill_style_str(color);
		CanvasRenderingContext2d::fill_rect(self, origin.x, origin.y, width, height);
	}

	fn set_font(&mut self, font: &str) {
		CanvasRenderingContext2d::set_font(self, font);
	}

	fn measure_text(&mut self, text: &str) -> f64 {
		CanvasRenderingContext2d::measure_text(self, text)
			.map(|metrics| metrics.width())
			.unwrap_or(0.0)
	}

	fn fill_text_centered(&mut self, text: &str, at: Point, color: &str) {
		self.set_fill_style_str(color);
		self.set_text_align("center");
		let _ = self.fill_text(text, at.x, at.y);
	}
}
