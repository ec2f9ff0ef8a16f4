use thiserror::Error;

/// Errors raised at the fallible edges of the viewer: loading data and
/// reaching browser globals. Per-frame rendering never produces one.
#[derive(Error, Debug)]
pub enum GraphError {
	/// Graph JSON did not match `{nodes, links}`.
	#[error("invalid graph data: {0}")]
	Data(#[source] serde_json::Error),

	/// Config JSON did not match [`GraphConfig`](crate::network_graph::GraphConfig).
	#[error("invalid graph config: {0}")]
	Config(#[source] serde_json::Error),

	/// NetworkPolicy YAML could not be parsed.
	#[error("invalid policy manifest: {0}")]
	Policy(#[source] serde_yaml::Error),

	/// A browser global (window, viewport size) was missing.
	#[error("browser api unavailable: {0}")]
	Browser(&'static str),
}

/// Result alias used across the crate.
pub type GraphResult<T> = Result<T, GraphError>;
