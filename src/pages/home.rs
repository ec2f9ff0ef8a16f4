use leptos::prelude::*;

use crate::components::network_graph::{GraphConfig, GraphData, NetworkGraph};
use crate::error::GraphResult;

const GRAPH_JSON: &str = include_str!("../../data/graph.json");
const CONFIG_JSON: &str = include_str!("../../data/config.json");

fn load() -> GraphResult<(GraphData, GraphConfig)> {
	let data = GraphData::from_json(GRAPH_JSON)?;
	let config = GraphConfig::from_json(CONFIG_JSON)?;
	log::info!(
		"loaded {} nodes and {} links",
		data.nodes.len(),
		data.links.len()
	);
	Ok((data, config))
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph = load().map(|(data, config)| {
		view! { <NetworkGraph data=data config=config fullscreen=true /> }
	});

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				{graph}
				<div class="graph-overlay">
					<h1>"XGress"</h1>
					<p class="subtitle">
						"Services grouped by namespace. Drag nodes to reposition, scroll to zoom, drag the background to pan."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
