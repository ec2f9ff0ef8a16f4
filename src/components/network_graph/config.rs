use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};

use super::types::Point;

/// Force setup handed to [`Simulation::configure`](super::simulation::Simulation::configure).
///
/// `link_distance`, `charge_strength` and `center_strength` use the usual
/// d3 conventions (negative charge repels). The remaining fields tune the
/// `force_graph` integrator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
	pub link_distance: f64,
	pub charge_strength: f64,
	pub center_strength: f64,
	pub node_mass: f32,
	pub spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping: f32,
}

impl Default for ForceConfig {
	fn default() -> Self {
		Self {
			link_distance: 150.0,
			charge_strength: -500.0,
			center_strength: 0.1,
			node_mass: 10.0,
			spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping: 0.9,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
	/// The simulation stops once its energy falls below this.
	pub alpha_min: f64,
	/// Energy target held while at least one node is being dragged.
	pub drag_target: f64,
	pub rest_target: f64,
}

impl Default for EnergyConfig {
	fn default() -> Self {
		Self {
			alpha_min: 0.001,
			drag_target: 0.3,
			rest_target: 0.0,
		}
	}
}

impl EnergyConfig {
	/// Per-step decay that takes energy from 1 to `alpha_min` in 300 steps.
	pub fn alpha_decay(&self) -> f64 {
		1.0 - self.alpha_min.powf(1.0 / 300.0)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
	pub min_scale: f64,
	pub max_scale: f64,
	/// Scale factor applied per wheel notch.
	pub step: f64,
}

impl Default for ZoomConfig {
	fn default() -> Self {
		Self {
			min_scale: 0.1,
			max_scale: 10.0,
			step: 1.1,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
	pub forces: ForceConfig,
	pub energy: EnergyConfig,
	pub zoom: ZoomConfig,
	pub hull_padding: f64,
	pub hull_tension: f64,
	pub node_radius: f64,
	pub label_offset: Point,
	/// Simulation step per animation frame, in seconds.
	pub time_step: f32,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			forces: ForceConfig::default(),
			energy: EnergyConfig::default(),
			zoom: ZoomConfig::default(),
			hull_padding: super::namespace::DEFAULT_HULL_PADDING,
			hull_tension: 0.85,
			node_radius: 6.0,
			label_offset: [10.0, 4.0],
			time_step: 0.016,
		}
	}
}

impl GraphConfig {
	pub fn from_json(json: &str) -> GraphResult<Self> {
		serde_json::from_str(json).map_err(GraphError::Config)
	}
}
