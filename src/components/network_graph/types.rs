use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};

/// A point in graph space, `[x, y]`.
pub type Point = [f64; 2];

/// Category a node belongs to. Each distinct value becomes one namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupId {
	Number(i64),
	Name(String),
}

impl fmt::Display for GroupId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			GroupId::Number(n) => write!(f, "{n}"),
			GroupId::Name(s) => f.write_str(s),
		}
	}
}

impl From<i64> for GroupId {
	fn from(n: i64) -> Self {
		GroupId::Number(n)
	}
}

impl From<i32> for GroupId {
	fn from(n: i32) -> Self {
		GroupId::Number(n.into())
	}
}

impl From<&str> for GroupId {
	fn from(s: &str) -> Self {
		GroupId::Name(s.to_owned())
	}
}

/// One row of the position table.
///
/// `x`/`y` are written by the simulation on every tick and stay `None` until
/// the first one. `fx`/`fy` pin the node while both are set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
	pub id: String,
	pub group: GroupId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub x: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub y: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fx: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fy: Option<f64>,
}

impl NodeData {
	pub fn new(id: impl Into<String>, group: impl Into<GroupId>) -> Self {
		Self {
			id: id.into(),
			group: group.into(),
			x: None,
			y: None,
			fx: None,
			fy: None,
		}
	}

	pub fn at(mut self, x: f64, y: f64) -> Self {
		self.x = Some(x);
		self.y = Some(y);
		self
	}

	/// Current position, if the simulation has produced one and it is finite.
	pub fn position(&self) -> Option<Point> {
		match (self.x, self.y) {
			(Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some([x, y]),
			_ => None,
		}
	}

	pub fn pin(&self) -> Option<Point> {
		self.fx.zip(self.fy).map(|(x, y)| [x, y])
	}

	pub fn set_pin(&mut self, [x, y]: Point) {
		self.fx = Some(x);
		self.fy = Some(y);
	}

	pub fn clear_pin(&mut self) {
		self.fx = None;
		self.fy = None;
	}
}

fn default_link_value() -> f64 {
	1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkData {
	pub source: String,
	pub target: String,
	#[serde(default = "default_link_value")]
	pub value: f64,
}

impl LinkData {
	pub fn new(source: impl Into<String>, target: impl Into<String>, value: f64) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			value,
		}
	}

	pub fn stroke_width(&self) -> f64 {
		self.value.max(0.0).sqrt()
	}
}

/// Full graph snapshot. The node and link sets are fixed once bound.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	pub nodes: Vec<NodeData>,
	pub links: Vec<LinkData>,
}

impl GraphData {
	pub fn from_json(json: &str) -> GraphResult<Self> {
		serde_json::from_str(json).map_err(GraphError::Data)
	}

	pub fn to_json(&self) -> GraphResult<String> {
		serde_json::to_string(self).map_err(GraphError::Data)
	}
}

/// Resolves each link's endpoint ids to indices into `nodes`, in link order.
/// Links naming an unknown node resolve to `None`.
pub fn resolve_links(nodes: &[NodeData], links: &[LinkData]) -> Vec<Option<(usize, usize)>> {
	let index: HashMap<&str, usize> = nodes
		.iter()
		.enumerate()
		.map(|(i, n)| (n.id.as_str(), i))
		.collect();
	links
		.iter()
		.map(|link| {
			index
				.get(link.source.as_str())
				.copied()
				.zip(index.get(link.target.as_str()).copied())
		})
		.collect()
}

/// Derived per tick, never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct NamespaceData {
	pub id: GroupId,
	pub name: String,
	/// Closed boundary polygon; `None` when the group has too few distinct
	/// points to enclose an area.
	pub hull: Option<Vec<Point>>,
}
