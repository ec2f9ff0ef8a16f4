use std::collections::HashSet;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData as Body, SimulationParameters};

use super::config::{EnergyConfig, ForceConfig};
use super::types::{LinkData, NodeData, Point, resolve_links};

/// Called after every simulation step with the updated position table.
pub type TickHandler = Box<dyn FnMut(&[NodeData])>;

/// A force-directed layout engine driven one step at a time.
///
/// The caller owns the position table and lends it to [`advance`]; nodes are
/// identified by their index in that table, fixed at [`bind`] time.
///
/// [`advance`]: Simulation::advance
/// [`bind`]: Simulation::bind
pub trait Simulation {
	fn configure(&mut self, forces: &ForceConfig, center: Point);
	fn bind(&mut self, nodes: &[NodeData], links: &[LinkData]);
	fn on_tick(&mut self, handler: TickHandler);
	fn clear_tick_handlers(&mut self);
	fn set_energy_target(&mut self, target: f64);
	fn restart(&mut self);
	fn energy(&self) -> f64;
	fn is_running(&self) -> bool;
	/// Runs one step if the simulation is running, writing new positions into
	/// `nodes` and notifying tick handlers. Returns whether a step ran.
	fn advance(&mut self, dt: f32, nodes: &mut [NodeData]) -> bool;
}

fn parameters(forces: &ForceConfig) -> SimulationParameters {
	SimulationParameters {
		force_charge: -forces.charge_strength as f32,
		force_spring: forces.spring,
		force_max: forces.force_max,
		node_speed: forces.node_speed,
		damping_factor: forces.damping,
	}
}

/// Initial placement for nodes without coordinates: a phyllotaxis spiral.
fn seed_position(i: usize, [cx, cy]: Point) -> Point {
	let radius = 10.0 * (0.5 + i as f64).sqrt();
	let angle = i as f64 * PI * (3.0 - 5.0_f64.sqrt());
	[cx + radius * angle.cos(), cy + radius * angle.sin()]
}

/// Distance a node is moved off a spot another node already occupies.
const JIGGLE: f32 = 1.0;

/// Deterministic offset for the `attempt`th move off an occupied spot.
fn jiggle(attempt: usize) -> (f32, f32) {
	let angle = attempt as f32 * std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
	(JIGGLE * angle.cos(), JIGGLE * angle.sin())
}

fn spot(x: f32, y: f32) -> (u32, u32) {
	// + 0.0 folds -0.0 into 0.0
	((x + 0.0).to_bits(), (y + 0.0).to_bits())
}

fn nudge(node: &mut NodeData, dx: f64, dy: f64) {
	if node.pin().is_some() {
		return;
	}
	if let Some([x, y]) = node.position() {
		node.x = Some(x + dx);
		node.y = Some(y + dy);
	}
}

/// [`Simulation`] backed by `force_graph`, which supplies charge repulsion
/// and integration. Link distance and centering are applied on top of each
/// engine step, scaled by the current energy.
pub struct ForceSimulation {
	graph: ForceGraph<usize, ()>,
	edges: Vec<(usize, usize)>,
	degree: Vec<usize>,
	forces: ForceConfig,
	center: Point,
	alpha: f64,
	alpha_target: f64,
	alpha_min: f64,
	alpha_decay: f64,
	running: bool,
	handlers: Vec<TickHandler>,
}

impl ForceSimulation {
	pub fn new(forces: &ForceConfig, energy: &EnergyConfig, center: Point) -> Self {
		Self {
			graph: ForceGraph::new(parameters(forces)),
			edges: Vec::new(),
			degree: Vec::new(),
			forces: forces.clone(),
			center,
			alpha: 1.0,
			alpha_target: energy.rest_target,
			alpha_min: energy.alpha_min,
			alpha_decay: energy.alpha_decay(),
			running: false,
			handlers: Vec::new(),
		}
	}

	fn apply_link_force(&self, nodes: &mut [NodeData]) {
		for &(s, t) in &self.edges {
			let (Some(a), Some(b)) = (nodes[s].position(), nodes[t].position()) else {
				continue;
			};
			let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
			let len = (dx * dx + dy * dy).sqrt().max(1e-6);
			let (deg_s, deg_t) = (self.degree[s], self.degree[t]);
			let strength = 1.0 / deg_s.min(deg_t).max(1) as f64;
			let k = (len - self.forces.link_distance) / len * self.alpha * strength;
			let bias = deg_s as f64 / (deg_s + deg_t) as f64;
			nudge(&mut nodes[t], -dx * k * bias, -dy * k * bias);
			nudge(&mut nodes[s], dx * k * (1.0 - bias), dy * k * (1.0 - bias));
		}
	}

	/// Moves free bodies off spots already taken by another body. Charge has
	/// no direction between coincident bodies, so they would never part.
	/// Anchors claim their spot first and are never moved.
	fn separate_coincident(&mut self) {
		let mut taken = HashSet::new();
		self.graph.visit_nodes(|body| {
			if body.data.is_anchor {
				taken.insert(spot(body.data.x, body.data.y));
			}
		});
		self.graph.visit_nodes_mut(|body| {
			if body.data.is_anchor || !(body.data.x.is_finite() && body.data.y.is_finite()) {
				return;
			}
			let first = body.data.user_data;
			let mut attempt = first;
			// Bounded: far from the origin a 1-unit step can round away.
			while !taken.insert(spot(body.data.x, body.data.y)) && attempt < first + 16 {
				let (dx, dy) = jiggle(attempt);
				body.data.x += dx;
				body.data.y += dy;
				attempt += 1;
			}
		});
	}

	fn apply_center_force(&self, nodes: &mut [NodeData]) {
		let k = self.forces.center_strength * self.alpha;
		let [cx, cy] = self.center;
		for node in nodes.iter_mut() {
			if let Some([x, y]) = node.position() {
				nudge(node, (cx - x) * k, (cy - y) * k);
			}
		}
	}
}

impl Simulation for ForceSimulation {
	fn configure(&mut self, forces: &ForceConfig, center: Point) {
		self.forces = forces.clone();
		self.center = center;
	}

	fn bind(&mut self, nodes: &[NodeData], links: &[LinkData]) {
		let mut graph = ForceGraph::new(parameters(&self.forces));
		let bodies: Vec<DefaultNodeIdx> = nodes
			.iter()
			.enumerate()
			.map(|(i, node)| {
				let [x, y] = node
					.pin()
					.or_else(|| node.position())
					.unwrap_or_else(|| seed_position(i, self.center));
				graph.add_node(Body {
					x: x as f32,
					y: y as f32,
					mass: self.forces.node_mass,
					is_anchor: node.pin().is_some(),
					user_data: i,
				})
			})
			.collect();

		self.degree = vec![0; nodes.len()];
		self.edges = resolve_links(nodes, links)
			.into_iter()
			.flatten()
			.filter(|(s, t)| s != t)
			.collect();
		for &(s, t) in &self.edges {
			graph.add_edge(bodies[s], bodies[t], EdgeData::default());
			self.degree[s] += 1;
			self.degree[t] += 1;
		}

		self.graph = graph;
		self.alpha = 1.0;
		self.running = true;
	}

	fn on_tick(&mut self, handler: TickHandler) {
		self.handlers.push(handler);
	}

	fn clear_tick_handlers(&mut self) {
		self.handlers.clear();
	}

	fn set_energy_target(&mut self, target: f64) {
		self.alpha_target = target;
	}

	fn restart(&mut self) {
		self.running = true;
	}

	fn energy(&self) -> f64 {
		self.alpha
	}

	fn is_running(&self) -> bool {
		self.running
	}

	fn advance(&mut self, dt: f32, nodes: &mut [NodeData]) -> bool {
		if !self.running {
			return false;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

		self.graph.visit_nodes_mut(|body| {
			let Some(node) = nodes.get(body.data.user_data) else {
				return;
			};
			match node.pin() {
				Some([x, y]) => {
					body.data.x = x as f32;
					body.data.y = y as f32;
					body.data.is_anchor = true;
				}
				None => body.data.is_anchor = false,
			}
		});
		self.separate_coincident();
		self.graph.update(dt);
		self.graph.visit_nodes(|body| {
			if let Some(node) = nodes.get_mut(body.data.user_data) {
				let [x, y] = node
					.pin()
					.unwrap_or([body.x() as f64, body.y() as f64]);
				node.x = Some(x);
				node.y = Some(y);
			}
		});

		self.apply_link_force(nodes);
		self.apply_center_force(nodes);
		self.graph.visit_nodes_mut(|body| {
			if let Some([x, y]) = nodes.get(body.data.user_data).and_then(NodeData::position) {
				body.data.x = x as f32;
				body.data.y = y as f32;
			}
		});

		for handler in self.handlers.iter_mut() {
			handler(&*nodes);
		}
		if self.alpha < self.alpha_min {
			self.running = false;
		}
		true
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::rc::Rc;

	use super::*;

	fn simulation(center: Point) -> ForceSimulation {
		ForceSimulation::new(&ForceConfig::default(), &EnergyConfig::default(), center)
	}

	fn distance(a: &NodeData, b: &NodeData) -> f64 {
		let ([ax, ay], [bx, by]) = (a.position().unwrap(), b.position().unwrap());
		((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
	}

	#[test]
	fn seeds_positions_on_first_step() {
		let mut nodes: Vec<_> = (0..5).map(|i| NodeData::new(format!("n{i}"), 1)).collect();
		let mut sim = simulation([400.0, 300.0]);
		sim.bind(&nodes, &[]);
		assert!(nodes.iter().all(|n| n.position().is_none()));

		assert!(sim.advance(0.016, &mut nodes));
		assert!(nodes.iter().all(|n| n.position().is_some()));
	}

	#[test]
	fn cools_down_and_stops() {
		let mut nodes = vec![NodeData::new("a", 1), NodeData::new("b", 1)];
		let mut sim = simulation([0.0, 0.0]);
		sim.bind(&nodes, &[LinkData::new("a", "b", 1.0)]);

		let mut steps = 0;
		while sim.advance(0.016, &mut nodes) {
			steps += 1;
			assert!(steps < 1000, "simulation never settled");
		}
		assert!(!sim.is_running());
		assert!(sim.energy() < EnergyConfig::default().alpha_min);
		assert!(!sim.advance(0.016, &mut nodes));
	}

	#[test]
	fn energy_target_keeps_it_warm_until_lowered() {
		let mut nodes = vec![NodeData::new("a", 1)];
		let mut sim = simulation([0.0, 0.0]);
		sim.bind(&nodes, &[]);
		sim.set_energy_target(0.3);
		for _ in 0..2000 {
			assert!(sim.advance(0.016, &mut nodes));
		}
		assert!((sim.energy() - 0.3).abs() < 1e-3);

		sim.set_energy_target(0.0);
		while sim.advance(0.016, &mut nodes) {}
		assert!(!sim.is_running());

		sim.set_energy_target(0.3);
		sim.restart();
		assert!(sim.advance(0.016, &mut nodes));
	}

	#[test]
	fn pinned_node_stays_exactly_on_its_pin() {
		let mut nodes = vec![
			NodeData::new("a", 1).at(10.0, 10.0),
			NodeData::new("b", 1).at(30.0, 10.0),
		];
		nodes[0].set_pin([123.456, -78.9]);
		let mut sim = simulation([0.0, 0.0]);
		sim.bind(&nodes, &[LinkData::new("a", "b", 1.0)]);

		for _ in 0..20 {
			sim.advance(0.016, &mut nodes);
			assert_eq!(nodes[0].position(), Some([123.456, -78.9]));
		}
	}

	#[test]
	fn coincident_nodes_are_pushed_apart() {
		let mut nodes = vec![
			NodeData::new("a", 1).at(10.0, 10.0),
			NodeData::new("b", 1).at(10.0, 10.0),
			NodeData::new("c", 1).at(50.0, 50.0),
		];
		let mut sim = simulation([400.0, 300.0]);
		sim.bind(&nodes, &[]);
		while sim.advance(0.016, &mut nodes) {}

		assert!(distance(&nodes[0], &nodes[1]) > 1.0);
		assert!(distance(&nodes[1], &nodes[2]) > 1.0);
	}

	#[test]
	fn pin_dropped_onto_a_node_moves_the_free_one() {
		let mut nodes = vec![
			NodeData::new("a", 1).at(0.0, 0.0),
			NodeData::new("b", 1).at(100.0, 0.0),
		];
		let mut sim = simulation([50.0, 0.0]);
		sim.bind(&nodes, &[]);
		nodes[0].set_pin([100.0, 0.0]);
		sim.advance(0.016, &mut nodes);

		assert_eq!(nodes[0].position(), Some([100.0, 0.0]));
		assert_ne!(nodes[1].position(), Some([100.0, 0.0]));
		assert!(distance(&nodes[0], &nodes[1]) > 0.5);
	}

	#[test]
	fn link_force_pulls_far_nodes_toward_link_distance() {
		let forces = ForceConfig {
			charge_strength: 0.0,
			spring: 0.0,
			..ForceConfig::default()
		};
		let mut sim = ForceSimulation::new(&forces, &EnergyConfig::default(), [500.0, 0.0]);
		let mut nodes = vec![
			NodeData::new("a", 1).at(0.0, 0.0),
			NodeData::new("b", 1).at(1000.0, 0.0),
		];
		sim.bind(&nodes, &[LinkData::new("a", "b", 1.0)]);
		sim.advance(0.016, &mut nodes);

		let d = distance(&nodes[0], &nodes[1]);
		assert!((100.0..200.0).contains(&d), "distance {d}");
	}

	#[test]
	fn tick_handlers_run_per_step_until_cleared() {
		let calls = Rc::new(Cell::new(0));
		let mut nodes = vec![NodeData::new("a", 1)];
		let mut sim = simulation([0.0, 0.0]);
		sim.bind(&nodes, &[]);

		let seen = calls.clone();
		sim.on_tick(Box::new(move |nodes: &[NodeData]| {
			assert_eq!(nodes.len(), 1);
			seen.set(seen.get() + 1);
		}));
		sim.advance(0.016, &mut nodes);
		sim.advance(0.016, &mut nodes);
		assert_eq!(calls.get(), 2);

		sim.clear_tick_handlers();
		sim.advance(0.016, &mut nodes);
		assert_eq!(calls.get(), 2);
	}

	#[test]
	fn links_to_unknown_nodes_are_ignored() {
		let mut nodes = vec![NodeData::new("a", 1)];
		let mut sim = simulation([0.0, 0.0]);
		sim.bind(&nodes, &[LinkData::new("a", "ghost", 1.0)]);
		assert!(sim.advance(0.016, &mut nodes));
		assert!(nodes[0].position().is_some());
	}
}
