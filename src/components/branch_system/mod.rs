//! Radial "mind map" engine: hierarchical layout, cosmetic physics, curved
//! branches, greedy label placement and pan/zoom interaction, drawn onto a 2d
//! canvas.

mod component;
mod config;
mod curves;
mod error;
mod geometry;
mod interaction;
mod labels;
mod layout;
mod physics;
mod render;
mod schedule;
mod state;
mod types;

pub use component::BranchSystemCanvas;
pub use config::{
	BranchConfig, ChildOverride, DistanceOverride, FanOverride, LayoutConfig, MainBranchOverride, OrphanPolicy,
	ParentOverride, PhysicsConfig, SizingConfig, ViewConfig,
};
pub use error::DatasetError;
pub use geometry::Point;
pub use interaction::{SelectionChanged, ViewState};
pub use render::{LineStyle, Surface};
pub use schedule::{FallingStarSchedule, StopToken};
pub use state::BranchSystem;
pub use types::{Branch, Connection, Dataset, Node, NodeColors, NodeId, NodeRecord};
