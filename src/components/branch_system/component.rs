use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use leptos::ev;
use leptos::prelude::*;
use log::{debug, error};
use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::geometry::Point;
use super::interaction::SelectionChanged;
use super::schedule::{FallingStarSchedule, StopToken};
use super::state::BranchSystem;

fn viewport_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn cursor(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<Point> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn selected_id(system: &BranchSystem, changed: SelectionChanged) -> Option<String> {
	changed.0.and_then(|id| system.node(id)).map(|node| node.id.clone())
}

/// Re-arms itself after every spawn until `stop` is set.
fn arm_falling_star(
	schedule: Rc<RefCell<(FallingStarSchedule, StdRng)>>,
	pending: Arc<Mutex<Option<TimeoutHandle>>>,
	stop: StopToken,
	on_fire: Callback<()>,
) {
	if stop.is_stopped() {
		return;
	}
	let delay = {
		let mut guard = schedule.borrow_mut();
		let (schedule, rng) = &mut *guard;
		schedule.next_delay(rng)
	};
	let next = (schedule.clone(), pending.clone(), stop.clone());
	let handle = set_timeout_with_handle(
		move || {
			let (schedule, pending, stop) = next;
			if stop.is_stopped() {
				return;
			}
			on_fire.run(());
			arm_falling_star(schedule, pending, stop, on_fire);
		},
		delay,
	);
	match handle {
		Ok(handle) => {
			if let Ok(mut slot) = pending.lock() {
				*slot = Some(handle);
			}
		}
		Err(err) => error!("could not schedule falling star: {err:?}"),
	}
}

/// Full-size canvas running a [`BranchSystem`] on every animation frame.
#[component]
pub fn BranchSystemCanvas(
	/// Built by the host, usually at size 0x0; the canvas resizes it on mount.
	system: BranchSystem,
	#[prop(default = true)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(into, default = Signal::stored(true))] physics: Signal<bool>,
	#[prop(into, default = Signal::stored(HashSet::new()))] hidden_types: Signal<HashSet<String>>,
	/// Every change of this counter resets pan, zoom and layout.
	#[prop(into, default = Signal::stored(0))]
	reset: Signal<u32>,
	/// Host-driven selection; setting it to `None` clears the engine's glow so
	/// the same node can be clicked again.
	#[prop(optional, into)]
	selected: Option<Signal<Option<String>>>,
	/// Selected node id, or `None` when the selection is cleared.
	#[prop(optional, into)]
	on_select: Option<Callback<Option<String>>>,
	#[prop(optional, into)] on_falling_star: Option<Callback<()>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state = Rc::new(RefCell::new(system));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let stop = StopToken::new();
	let frame = Arc::new(AtomicI32::new(0));
	let (state_init, animate_init, stop_init, frame_init) =
		(state.clone(), animate.clone(), stop.clone(), frame.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			error!("no window; branch system not started");
			return;
		};

		let (w, h) = if fullscreen {
			viewport_size(&window).unwrap_or((800.0, 600.0))
		} else {
			let parent = canvas.parent_element();
			(
				width.unwrap_or_else(|| parent.as_ref().map_or(800.0, |p| p.client_width() as f64)),
				height.unwrap_or_else(|| parent.as_ref().map_or(600.0, |p| p.client_height() as f64)),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok());
		let Some(mut ctx) = ctx else {
			error!("canvas has no 2d context; branch system not started");
			return;
		};
		state_init.borrow_mut().resize(w, h);

		let (state_anim, animate_inner, stop_anim, frame_anim) = (
			state_init.clone(),
			animate_init.clone(),
			stop_init.clone(),
			frame_init.clone(),
		);
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if stop_anim.is_stopped() {
				return;
			}
			{
				let mut s = state_anim.borrow_mut();
				s.update();
				s.draw(&mut ctx);
			}
			if let (Some(cb), Some(window)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
					frame_anim.store(id, Ordering::Relaxed);
				}
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
				frame_init.store(id, Ordering::Relaxed);
			}
		}
	});

	let state_physics = state.clone();
	Effect::new(move |_| {
		let enabled = physics.get();
		state_physics.borrow_mut().set_physics_enabled(enabled);
	});

	let state_hidden = state.clone();
	Effect::new(move |_| {
		let hidden = hidden_types.get();
		let mut s = state_hidden.borrow_mut();
		let shown: Vec<String> = s
			.view()
			.hidden_types
			.iter()
			.filter(|kind| !hidden.contains(*kind))
			.cloned()
			.collect();
		for kind in shown {
			s.set_type_hidden(&kind, false);
		}
		for kind in &hidden {
			s.set_type_hidden(kind, true);
		}
	});

	if let Some(selected) = selected {
		let state_selected = state.clone();
		Effect::new(move |_| {
			let wanted = selected.get();
			if state_selected.borrow_mut().select_node_by_id(wanted.as_deref()) {
				debug!("selection set by host: {wanted:?}");
			}
		});
	}

	let state_reset = state.clone();
	Effect::new(move |previous: Option<u32>| {
		let count = reset.get();
		if previous.is_some_and(|previous| previous != count) {
			debug!("resetting branch system");
			state_reset.borrow_mut().reset();
		}
		count
	});

	let resize_listener = fullscreen.then(|| {
		let state_resize = state.clone();
		window_event_listener(ev::resize, move |_| {
			let Some((w, h)) = web_sys::window().as_ref().and_then(viewport_size) else {
				return;
			};
			if let Some(canvas) = canvas_ref.get_untracked() {
				let canvas: HtmlCanvasElement = canvas.into();
				canvas.set_width(w as u32);
				canvas.set_height(h as u32);
			}
			state_resize.borrow_mut().resize(w, h);
		})
	});

	let state_key = state.clone();
	let key_listener = window_event_listener(ev::keydown, move |ev| {
		if ev.key() != "Escape" {
			return;
		}
		let changed = state_key.borrow_mut().set_selected_node(None);
		if let (true, Some(on_select)) = (changed, on_select) {
			on_select.run(None);
		}
	});

	let pending_star = Arc::new(Mutex::new(None));
	if let Some(on_fire) = on_falling_star {
		let schedule = Rc::new(RefCell::new((
			FallingStarSchedule::default(),
			StdRng::seed_from_u64(js_sys::Date::now() as u64),
		)));
		arm_falling_star(schedule, pending_star.clone(), stop.clone(), on_fire);
	}

	on_cleanup(move || {
		stop.stop();
		if let Some(window) = web_sys::window() {
			let _ = window.cancel_animation_frame(frame.load(Ordering::Relaxed));
		}
		if let Some(handle) = pending_star.lock().ok().and_then(|mut slot| slot.take()) {
			handle.clear();
		}
		if let Some(listener) = resize_listener {
			listener.remove();
		}
		key_listener.remove();
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some(p) = cursor(canvas_ref, &ev) {
			state_md.borrow_mut().pointer_down(p);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(p) = cursor(canvas_ref, &ev) {
			state_mm.borrow_mut().pointer_move(p);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some(p) = cursor(canvas_ref, &ev) else {
			state_mu.borrow_mut().end_pan();
			return;
		};
		let picked = {
			let mut s = state_mu.borrow_mut();
			s.pointer_up(p).map(|changed| selected_id(&s, changed))
		};
		if let (Some(picked), Some(on_select)) = (picked, on_select) {
			on_select.run(picked);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		state_ml.borrow_mut().pointer_leave();
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some(p) = cursor(canvas_ref, &ev) {
			let _ = state_wh.borrow_mut().zoom(ev.delta_y(), p);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="branch-system-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
