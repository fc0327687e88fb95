use std::collections::{BTreeSet, HashSet};

use leptos::prelude::*;
use log::info;

use crate::components::branch_system::{BranchConfig, BranchSystem, BranchSystemCanvas, Dataset, DatasetError};

const THOUGHTS: &str = include_str!("../../assets/thoughts.json");
const UNIVERSE_CONFIG: &str = include_str!("../../assets/universe.json");

/// Parses the bundled dataset and lays it out around the origin; the canvas
/// recentres it once it knows its size.
fn build_universe() -> Result<(Dataset, BranchSystem), DatasetError> {
	let dataset = Dataset::from_json(THOUGHTS)?;
	let mut config = BranchConfig::from_json(UNIVERSE_CONFIG)?;
	config.seed = js_sys::Date::now() as u64;
	let system = BranchSystem::new(&dataset, config, 0.0, 0.0)?;
	Ok((dataset, system))
}

fn toggleable_types(dataset: &Dataset) -> Vec<String> {
	dataset
		.nodes
		.iter()
		.filter(|node| node.parent.is_some())
		.map(|node| node.kind.clone())
		.collect::<BTreeSet<_>>()
		.into_iter()
		.collect()
}

#[component]
fn Universe(dataset: Dataset, system: BranchSystem) -> impl IntoView {
	let physics = RwSignal::new(true);
	let hidden = RwSignal::new(HashSet::<String>::new());
	let reset = RwSignal::new(0u32);
	let selected = RwSignal::new(None::<String>);
	let fallen = RwSignal::new(0u32);

	let types = toggleable_types(&dataset);
	let records = StoredValue::new(dataset);

	let on_select = Callback::new(move |id: Option<String>| selected.set(id));
	let on_falling_star = Callback::new(move |()| {
		fallen.update(|n| *n += 1);
		info!("a falling star crossed the sky");
	});

	let detail = move || {
		let id = selected.get()?;
		let record = records.with_value(|d| d.nodes.iter().find(|n| n.id == id).cloned())?;
		Some(view! {
			<aside class="node-detail">
				<button class="close" on:click=move |_| selected.set(None)>"×"</button>
				<h2>{record.label}</h2>
				<p class="node-type">{record.kind}</p>
				<p>{record.description.unwrap_or_default()}</p>
				<ul class="tags">
					{record.tags.into_iter().map(|tag| view! { <li>{tag}</li> }).collect_view()}
				</ul>
			</aside>
		})
	};

	view! {
		<div class="fullscreen-graph">
			<BranchSystemCanvas
				system=system
				physics=physics
				hidden_types=hidden
				reset=reset
				selected=selected
				on_select=on_select
				on_falling_star=on_falling_star
			/>
			<div class="graph-overlay">
				<h1>"Branches of a Mind"</h1>
				<p class="subtitle">"Drag to pan. Scroll to zoom. Click a thought to open it, Escape to close."</p>
				<nav class="toolbar">
					<button on:click=move |_| physics.update(|on| *on = !*on)>
						{move || if physics.get() { "Freeze" } else { "Drift" }}
					</button>
					<button on:click=move |_| reset.update(|n| *n += 1)>"Reset"</button>
					{types
						.into_iter()
						.map(|kind| {
							let label = kind.clone();
							let toggle = kind.clone();
							view! {
								<button
									class:hidden-type=move || hidden.with(|h| h.contains(&kind))
									on:click=move |_| {
										hidden
											.update(|h| {
												if !h.remove(&toggle) {
													h.insert(toggle.clone());
												}
											})
									}
								>
									{label}
								</button>
							}
						})
						.collect_view()}
				</nav>
				<p class="falling-stars">{move || format!("falling stars: {}", fallen.get())}</p>
			</div>
			{detail}
		</div>
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! The universe failed to form."</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			{build_universe().map(|(dataset, system)| view! { <Universe dataset=dataset system=system /> })}
		</ErrorBoundary>
	}
}
