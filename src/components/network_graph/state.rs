use std::collections::HashMap;

use log::{debug, warn};

use super::config::{GraphConfig, ZoomConfig};
use super::simulation::{ForceSimulation, Simulation, TickHandler};
use super::types::{GraphData, NodeData, Point, resolve_links};

/// Translate + scale applied to the root drawing group.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn screen_to_graph(&self, [sx, sy]: Point) -> Point {
		[(sx - self.x) / self.k, (sy - self.y) / self.k]
	}

	/// Zooms around the screen point `at`, which keeps its graph position.
	/// A positive `delta_y` (wheel down) zooms out; zero (horizontal scroll)
	/// leaves the view alone.
	pub fn zoom_at(&mut self, [x, y]: Point, delta_y: f64, zoom: &ZoomConfig) {
		if delta_y == 0.0 {
			return;
		}
		let factor = if delta_y > 0.0 {
			zoom.step.recip()
		} else {
			zoom.step
		};
		let new_k = (self.k * factor).clamp(zoom.min_scale, zoom.max_scale);
		let ratio = new_k / self.k;
		self.x = x - (x - self.x) * ratio;
		self.y = y - (y - self.y) * ratio;
		self.k = new_k;
	}

	pub fn to_svg(&self) -> String {
		format!("translate({},{}) scale({})", self.x, self.y, self.k)
	}
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Everything the graph container mutates: the position table, the
/// simulation it is lent to, and the interaction state.
pub struct GraphState<S: Simulation = ForceSimulation> {
	pub nodes: Vec<NodeData>,
	resolved: Vec<Option<(usize, usize)>>,
	pub simulation: S,
	pub transform: ViewTransform,
	pub pan: PanState,
	/// Pointer id -> index of the node it is dragging.
	drags: HashMap<i32, usize>,
	pub width: f64,
	pub height: f64,
	pub config: GraphConfig,
}

impl GraphState {
	pub fn new(data: &GraphData, config: GraphConfig, width: f64, height: f64) -> Self {
		let simulation =
			ForceSimulation::new(&config.forces, &config.energy, [width / 2.0, height / 2.0]);
		Self::with_simulation(data, config, width, height, simulation)
	}
}

impl<S: Simulation> GraphState<S> {
	pub fn with_simulation(
		data: &GraphData,
		config: GraphConfig,
		width: f64,
		height: f64,
		mut simulation: S,
	) -> Self {
		let resolved = resolve_links(&data.nodes, &data.links);
		for (link, ends) in data.links.iter().zip(&resolved) {
			if ends.is_none() {
				warn!(
					"skipping link {} -> {}: endpoint not among nodes",
					link.source, link.target
				);
			}
		}

		simulation.configure(&config.forces, [width / 2.0, height / 2.0]);
		simulation.bind(&data.nodes, &data.links);
		debug!(
			"bound {} nodes and {} links",
			data.nodes.len(),
			resolved.iter().flatten().count()
		);

		Self {
			nodes: data.nodes.clone(),
			resolved,
			simulation,
			transform: ViewTransform::default(),
			pan: PanState::default(),
			drags: HashMap::new(),
			width,
			height,
			config,
		}
	}

	/// Link endpoints as indices into [`nodes`](Self::nodes), in link order.
	pub fn resolved_links(&self) -> &[Option<(usize, usize)>] {
		&self.resolved
	}

	pub fn on_tick(&mut self, handler: TickHandler) {
		self.simulation.on_tick(handler);
	}

	/// Advances the simulation by one configured time step.
	pub fn tick(&mut self) -> bool {
		self.simulation
			.advance(self.config.time_step, &mut self.nodes)
	}

	/// Pins `node` where it currently is (or at `at`, in graph space, if it
	/// has no position yet). The first concurrent drag wakes the simulation.
	pub fn drag_start(&mut self, pointer: i32, node: usize, at: Point) -> bool {
		if node >= self.nodes.len() {
			return false;
		}
		if self.drags.contains_key(&pointer) {
			self.drag_end(pointer);
		}
		if self.drags.is_empty() {
			self.simulation
				.set_energy_target(self.config.energy.drag_target);
			self.simulation.restart();
		}
		self.drags.insert(pointer, node);

		let row = &mut self.nodes[node];
		let pin = row.position().unwrap_or(at);
		row.set_pin(pin);
		true
	}

	pub fn drag_move(&mut self, pointer: i32, at: Point) -> bool {
		let Some(&node) = self.drags.get(&pointer) else {
			return false;
		};
		self.nodes[node].set_pin(at);
		true
	}

	/// Releases the node held by `pointer`. The last drag to end lets the
	/// simulation cool back down.
	pub fn drag_end(&mut self, pointer: i32) -> bool {
		let Some(node) = self.drags.remove(&pointer) else {
			return false;
		};
		if self.drags.is_empty() {
			self.simulation
				.set_energy_target(self.config.energy.rest_target);
		}
		// Another pointer may still hold the same node.
		if !self.drags.values().any(|&held| held == node) {
			self.nodes[node].clear_pin();
		}
		true
	}

	pub fn release_all(&mut self) {
		let pointers: Vec<i32> = self.drags.keys().copied().collect();
		for pointer in pointers {
			self.drag_end(pointer);
		}
		self.pan.active = false;
	}

	pub fn pan_start(&mut self, [x, y]: Point) {
		self.pan = PanState {
			active: true,
			start_x: x,
			start_y: y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_move(&mut self, [x, y]: Point) -> bool {
		if !self.pan.active {
			return false;
		}
		self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
		self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		true
	}

	pub fn pan_end(&mut self) {
		self.pan.active = false;
	}

	pub fn zoom(&mut self, at: Point, delta_y: f64) {
		self.transform.zoom_at(at, delta_y, &self.config.zoom);
	}

	/// Moves the centering target to the middle of the new viewport.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.simulation
			.configure(&self.config.forces, [width / 2.0, height / 2.0]);
		self.simulation.restart();
	}

	/// Detaches tick handlers and drops any pins still held.
	pub fn teardown(&mut self) {
		self.release_all();
		self.simulation.clear_tick_handlers();
	}
}
