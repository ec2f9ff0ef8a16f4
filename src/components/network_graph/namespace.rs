use std::collections::HashMap;

use super::hull::convex_hull;
use super::types::{GroupId, NamespaceData, NodeData, Point};

/// Distance kept between a node and its namespace boundary.
pub const DEFAULT_HULL_PADDING: f64 = 15.0;

/// Groups `nodes` by `group` and computes one padded convex boundary per
/// group, in first-seen group order.
///
/// Every node contributes the four corners of a `2 * padding` square around
/// its position. Nodes without a position still register their group, which
/// then has no hull until they get one.
pub fn build_namespaces(nodes: &[NodeData], padding: f64) -> Vec<NamespaceData> {
	let padding = padding.max(0.0);
	let mut slots: HashMap<&GroupId, usize> = HashMap::new();
	let mut groups: Vec<(&GroupId, Vec<Point>)> = Vec::new();

	for node in nodes {
		let slot = *slots.entry(&node.group).or_insert_with(|| {
			groups.push((&node.group, Vec::new()));
			groups.len() - 1
		});
		if let Some([x, y]) = node.position() {
			groups[slot].1.extend([
				[x - padding, y - padding],
				[x - padding, y + padding],
				[x + padding, y - padding],
				[x + padding, y + padding],
			]);
		}
	}

	groups
		.into_iter()
		.map(|(group, points)| NamespaceData {
			id: group.clone(),
			name: group.to_string(),
			hull: convex_hull(&points),
		})
		.collect()
}
