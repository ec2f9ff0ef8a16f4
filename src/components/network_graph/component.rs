use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{MouseEvent, PointerEvent, WheelEvent, Window};

use super::config::GraphConfig;
use super::elements::{LinkLine, NamespaceLayer, NodeLabel, NodeMarker};
use super::render::{Frame, Projection};
use super::scale::{Color, ColorScheme, OrdinalScale};
use super::simulation::Simulation;
use super::state::{GraphState, ViewTransform};
use super::types::{GraphData, GroupId, NodeData, Point};
use crate::error::{GraphError, GraphResult};

const DEFAULT_WIDTH: f64 = 800.0;
const DEFAULT_HEIGHT: f64 = 600.0;

fn window_size(window: &Window) -> GraphResult<(f64, f64)> {
	let width = window.inner_width().ok().and_then(|v| v.as_f64());
	let height = window.inner_height().ok().and_then(|v| v.as_f64());
	width
		.zip(height)
		.ok_or(GraphError::Browser("window.innerWidth/innerHeight"))
}

/// Owns the animation-frame loop and the resize listener. Dropping it (when
/// the component's owner is disposed) cancels the pending frame, removes the
/// listener and detaches every tick handler.
struct FrameLoop {
	window: Window,
	handle: Rc<Cell<Option<i32>>>,
	animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
	resize: Option<Closure<dyn FnMut()>>,
	state: Rc<RefCell<GraphState>>,
}

impl FrameLoop {
	fn start(window: Window, state: Rc<RefCell<GraphState>>) -> Self {
		let handle = Rc::new(Cell::new(None));
		let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
		let (state_anim, animate_inner, handle_inner) =
			(state.clone(), animate.clone(), handle.clone());

		*animate.borrow_mut() = Some(Closure::new(move || {
			{
				let mut s = state_anim.borrow_mut();
				if s.tick() && !s.simulation.is_running() {
					debug!(
						"simulation at rest (energy {:.4})",
						s.simulation.energy()
					);
				}
			}
			if let (Some(window), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref())
			{
				handle_inner.set(
					window
						.request_animation_frame(cb.as_ref().unchecked_ref())
						.ok(),
				);
			}
		}));
		if let Some(ref cb) = *animate.borrow() {
			handle.set(
				window
					.request_animation_frame(cb.as_ref().unchecked_ref())
					.ok(),
			);
		}

		Self {
			window,
			handle,
			animate,
			resize: None,
			state,
		}
	}

	fn follow_resize(&mut self, size: RwSignal<(f64, f64)>) {
		let state = self.state.clone();
		let cb = Closure::<dyn FnMut()>::new(move || {
			let Some(window) = web_sys::window() else {
				return;
			};
			match window_size(&window) {
				Ok((w, h)) => {
					size.set((w, h));
					state.borrow_mut().resize(w, h);
				}
				Err(err) => warn!("ignoring resize: {err}"),
			}
		});
		let _ = self
			.window
			.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		self.resize = Some(cb);
	}
}

impl Drop for FrameLoop {
	fn drop(&mut self) {
		if let Some(handle) = self.handle.take() {
			let _ = self.window.cancel_animation_frame(handle);
		}
		// The frame callback holds a handle to its own slot.
		self.animate.borrow_mut().take();
		if let Some(cb) = self.resize.take() {
			let _ = self
				.window
				.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
		self.state.borrow_mut().teardown();
		debug!("network graph detached");
	}
}

/// Interactive force-directed view of `data` with namespace hulls.
///
/// Nodes can be dragged, the background pans and the wheel zooms. With
/// `fullscreen` the SVG tracks the window size; otherwise it uses
/// `width`/`height` (800x600 by default).
#[component]
pub fn NetworkGraph(
	data: GraphData,
	#[prop(optional)] config: Option<GraphConfig>,
	#[prop(optional)] color_scheme: Option<Rc<dyn ColorScheme>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let Some(window) = web_sys::window() else {
		return Err(GraphError::Browser("window"));
	};
	let config = config.unwrap_or_default();
	let colors: Rc<dyn ColorScheme> =
		color_scheme.unwrap_or_else(|| Rc::new(OrdinalScale::category10()));

	let (w, h) = if fullscreen {
		window_size(&window).unwrap_or_else(|err| {
			warn!("{err}; falling back to {DEFAULT_WIDTH}x{DEFAULT_HEIGHT}");
			(DEFAULT_WIDTH, DEFAULT_HEIGHT)
		})
	} else {
		(
			width.unwrap_or(DEFAULT_WIDTH),
			height.unwrap_or(DEFAULT_HEIGHT),
		)
	};

	let size = RwSignal::new((w, h));
	let transform = RwSignal::new(ViewTransform::default());
	let frame = RwSignal::new(Frame::new(data.nodes.len(), data.links.len()));
	let state = Rc::new(RefCell::new(GraphState::new(&data, config.clone(), w, h)));

	let projection = Projection::new(state.borrow().resolved_links().to_vec(), &config);
	state.borrow_mut().on_tick(Box::new(move |nodes: &[NodeData]| {
		frame.try_update(|f| projection.apply(f, nodes));
	}));

	let mut frame_loop = FrameLoop::start(window, state.clone());
	if fullscreen {
		frame_loop.follow_resize(size);
	}
	let _frame_loop = StoredValue::new_local(frame_loop);
	debug!(
		"network graph mounted: {} nodes, {} links, {w}x{h}",
		data.nodes.len(),
		data.links.len()
	);

	let svg_ref = NodeRef::<leptos::svg::Svg>::new();
	let pointer = move |ev: &MouseEvent| -> Option<Point> {
		let svg = svg_ref.get()?;
		let el: &web_sys::Element = svg.as_ref();
		let rect = el.get_bounding_client_rect();
		Some([
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		])
	};

	let state_grab = state.clone();
	let on_grab: Rc<dyn Fn(PointerEvent, usize)> = Rc::new(move |ev: PointerEvent, idx: usize| {
		ev.stop_propagation();
		let Some(p) = pointer(&ev) else {
			return;
		};
		let mut s = state_grab.borrow_mut();
		let at = s.transform.screen_to_graph(p);
		s.drag_start(ev.pointer_id(), idx, at);
	});

	let state_pd = state.clone();
	let on_pointerdown = move |ev: PointerEvent| {
		if let Some(p) = pointer(&ev) {
			state_pd.borrow_mut().pan_start(p);
		}
	};

	let state_pm = state.clone();
	let on_pointermove = move |ev: PointerEvent| {
		let Some(p) = pointer(&ev) else {
			return;
		};
		let mut s = state_pm.borrow_mut();
		let at = s.transform.screen_to_graph(p);
		if !s.drag_move(ev.pointer_id(), at) && s.pan_move(p) {
			transform.set(s.transform.clone());
		}
	};

	let state_pu = state.clone();
	let end_gesture = Rc::new(move |ev: PointerEvent| {
		let mut s = state_pu.borrow_mut();
		s.drag_end(ev.pointer_id());
		s.pan_end();
	});
	let end_cancelled = end_gesture.clone();

	let state_pl = state.clone();
	let on_pointerleave = move |_: PointerEvent| state_pl.borrow_mut().release_all();

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(p) = pointer(&ev) else {
			return;
		};
		let mut s = state_wh.borrow_mut();
		s.zoom(p, ev.delta_y());
		transform.set(s.transform.clone());
	};

	let namespace_colors: HashMap<GroupId, Color> = data
		.nodes
		.iter()
		.map(|node| (node.group.clone(), colors.color_for(&node.group)))
		.collect();

	let links = data
		.links
		.iter()
		.enumerate()
		.map(|(index, link)| {
			view! { <LinkLine index=index stroke_width=link.stroke_width() frame=frame /> }
		})
		.collect_view();
	let nodes = data
		.nodes
		.iter()
		.enumerate()
		.map(|(index, node)| {
			view! {
				<NodeMarker
					index=index
					id=node.id.clone()
					color=colors.color_for(&node.group)
					radius=config.node_radius
					frame=frame
					on_grab=on_grab.clone()
				/>
			}
		})
		.collect_view();
	let labels = data
		.nodes
		.iter()
		.enumerate()
		.map(|(index, node)| view! { <NodeLabel index=index text=node.id.clone() frame=frame /> })
		.collect_view();

	Ok(view! {
		<svg
			node_ref=svg_ref
			class="network-graph"
			width=move || size.with(|(w, _)| w.to_string())
			height=move || size.with(|(_, h)| h.to_string())
			on:pointerdown=on_pointerdown
			on:pointermove=on_pointermove
			on:pointerup=move |ev| end_gesture(ev)
			on:pointercancel=move |ev| end_cancelled(ev)
			on:pointerleave=on_pointerleave
			on:wheel=on_wheel
			style="display: block; cursor: grab; touch-action: none;"
		>
			<g transform=move || transform.with(ViewTransform::to_svg)>
				<g class="namespaces">
					<NamespaceLayer
						frame=frame
						colors=namespace_colors
						tension=config.hull_tension
					/>
				</g>
				<g class="links">{links}</g>
				<g class="nodes">{nodes}</g>
				<g class="labels">{labels}</g>
			</g>
		</svg>
	})
}
