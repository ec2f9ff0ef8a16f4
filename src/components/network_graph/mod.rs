//! Force-directed network graph rendered as SVG, with namespace hulls.

mod component;
mod config;
mod elements;
mod hull;
mod namespace;
mod render;
pub mod scale;
mod simulation;
mod state;
mod types;

pub use component::NetworkGraph;
pub use config::{EnergyConfig, ForceConfig, GraphConfig, ZoomConfig};
pub use namespace::{DEFAULT_HULL_PADDING, build_namespaces};
pub use scale::{ColorScheme, OrdinalScale};
pub use simulation::{ForceSimulation, Simulation, TickHandler};
pub use types::{GraphData, GroupId, LinkData, NamespaceData, NodeData, Point};
