use std::collections::HashMap;
use std::rc::Rc;

use leptos::prelude::*;
use web_sys::PointerEvent;

use super::render::{Frame, LineGeometry, namespace_path};
use super::scale::{CATEGORY10, Color};
use super::types::GroupId;

fn coordinate(value: Option<f64>) -> Option<String> {
	value.map(|v| v.to_string())
}

#[component]
pub fn LinkLine(index: usize, stroke_width: f64, frame: RwSignal<Frame>) -> impl IntoView {
	let end = move |pick: fn(&LineGeometry) -> f64| {
		move || frame.with(|f| coordinate(f.link(index).map(|line| pick(&line))))
	};

	view! {
		<line
			class="link"
			stroke-width=stroke_width.to_string()
			x1=end(|l| l.x1)
			y1=end(|l| l.y1)
			x2=end(|l| l.x2)
			y2=end(|l| l.y2)
		/>
	}
}

#[component]
pub fn NodeMarker(
	index: usize,
	id: String,
	color: Color,
	radius: f64,
	frame: RwSignal<Frame>,
	on_grab: Rc<dyn Fn(PointerEvent, usize)>,
) -> impl IntoView {
	let axis = move |i: usize| move || frame.with(|f| coordinate(f.node(index).map(|p| p[i])));

	view! {
		<circle
			class="node"
			r=radius.to_string()
			fill=color
			cx=axis(0)
			cy=axis(1)
			on:pointerdown=move |ev| on_grab(ev, index)
		>
			<title>{id}</title>
		</circle>
	}
}

#[component]
pub fn NodeLabel(index: usize, text: String, frame: RwSignal<Frame>) -> impl IntoView {
	let axis = move |i: usize| move || frame.with(|f| coordinate(f.label(index).map(|p| p[i])));

	view! {
		<text class="label" x=axis(0) y=axis(1)>
			{text}
		</text>
	}
}

#[component]
pub fn NamespaceHull(path: String, color: Color, name: String) -> impl IntoView {
	view! {
		<path class="namespace" d=path fill=color>
			<title>{name}</title>
		</path>
	}
}

/// Overlay layer, rebuilt whenever the frame's namespaces change. Groups
/// without a hull are skipped.
#[component]
pub fn NamespaceLayer(
	frame: RwSignal<Frame>,
	colors: HashMap<GroupId, Color>,
	tension: f64,
) -> impl IntoView {
	move || {
		frame.with(|f| {
			f.namespaces
				.iter()
				.filter_map(|ns| {
					let path = namespace_path(ns, tension)?;
					let color = colors.get(&ns.id).copied().unwrap_or(CATEGORY10[0]);
					Some(view! { <NamespaceHull path=path color=color name=ns.name.clone() /> })
				})
				.collect_view()
		})
	}
}
