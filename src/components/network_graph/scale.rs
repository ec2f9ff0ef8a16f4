//! Categorical color scale for groups.

use std::cell::RefCell;
use std::collections::HashMap;

use super::types::GroupId;

/// The ten-color categorical palette.
pub const CATEGORY10: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

pub type Color = &'static str;

/// Maps a group to a fill color. Implementations must return the same color
/// for the same group for as long as they live.
pub trait ColorScheme {
	fn color_for(&self, group: &GroupId) -> Color;
}

/// Ordinal scale: groups take palette slots in the order they are first
/// asked about, wrapping around once the palette runs out.
#[derive(Debug)]
pub struct OrdinalScale {
	palette: &'static [&'static str],
	domain: RefCell<HashMap<GroupId, usize>>,
}

impl OrdinalScale {
	/// An empty palette falls back to [`CATEGORY10`].
	pub fn new(palette: &'static [&'static str]) -> Self {
		Self {
			palette: if palette.is_empty() { CATEGORY10 } else { palette },
			domain: RefCell::new(HashMap::new()),
		}
	}

	pub fn category10() -> Self {
		Self::new(CATEGORY10)
	}
}

impl Default for OrdinalScale {
	fn default() -> Self {
		Self::category10()
	}
}

impl ColorScheme for OrdinalScale {
	fn color_for(&self, group: &GroupId) -> Color {
		let mut domain = self.domain.borrow_mut();
		let next = domain.len();
		let slot = *domain.entry(group.clone()).or_insert(next);
		self.palette[slot % self.palette.len()]
	}
}
