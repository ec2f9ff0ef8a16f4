use super::config::GraphConfig;
use super::hull::cardinal_closed_path;
use super::namespace::build_namespaces;
use super::types::{NamespaceData, NodeData, Point};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineGeometry {
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
}

/// On-screen geometry for one tick, one slot per link/node/label.
///
/// A slot is `None` until its element has had defined coordinates at least
/// once; afterwards it holds the last known geometry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
	pub links: Vec<Option<LineGeometry>>,
	pub nodes: Vec<Option<Point>>,
	pub labels: Vec<Option<Point>>,
	pub namespaces: Vec<NamespaceData>,
}

impl Frame {
	pub fn new(node_count: usize, link_count: usize) -> Self {
		Self {
			links: vec![None; link_count],
			nodes: vec![None; node_count],
			labels: vec![None; node_count],
			namespaces: Vec::new(),
		}
	}

	pub fn link(&self, i: usize) -> Option<LineGeometry> {
		self.links.get(i).copied().flatten()
	}

	pub fn node(&self, i: usize) -> Option<Point> {
		self.nodes.get(i).copied().flatten()
	}

	pub fn label(&self, i: usize) -> Option<Point> {
		self.labels.get(i).copied().flatten()
	}
}

pub fn label_anchor([x, y]: Point, [dx, dy]: Point) -> Point {
	[x + dx, y + dy]
}

pub fn line_between(source: Option<Point>, target: Option<Point>) -> Option<LineGeometry> {
	let ([x1, y1], [x2, y2]) = (source?, target?);
	Some(LineGeometry { x1, y1, x2, y2 })
}

/// Path data for a namespace overlay, or `None` when it has no hull.
pub fn namespace_path(namespace: &NamespaceData, tension: f64) -> Option<String> {
	cardinal_closed_path(namespace.hull.as_deref()?, tension)
}

/// What the tick handler needs to turn the position table into a [`Frame`].
#[derive(Clone, Debug)]
pub struct Projection {
	links: Vec<Option<(usize, usize)>>,
	label_offset: Point,
	hull_padding: f64,
}

impl Projection {
	pub fn new(links: Vec<Option<(usize, usize)>>, config: &GraphConfig) -> Self {
		Self {
			links,
			label_offset: config.label_offset,
			hull_padding: config.hull_padding,
		}
	}

	/// Writes the positions in `nodes` into `frame`. Elements whose
	/// coordinates are undefined keep their previous geometry.
	pub fn apply(&self, frame: &mut Frame, nodes: &[NodeData]) {
		for (slot, ends) in frame.links.iter_mut().zip(&self.links) {
			let line = ends.and_then(|(s, t)| {
				line_between(
					nodes.get(s).and_then(NodeData::position),
					nodes.get(t).and_then(NodeData::position),
				)
			});
			if line.is_some() {
				*slot = line;
			}
		}

		for ((node, marker), label) in nodes
			.iter()
			.zip(frame.nodes.iter_mut())
			.zip(frame.labels.iter_mut())
		{
			if let Some(pos) = node.position() {
				*marker = Some(pos);
				*label = Some(label_anchor(pos, self.label_offset));
			}
		}

		frame.namespaces = build_namespaces(nodes, self.hull_padding);
	}
}
