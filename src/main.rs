use leptos::prelude::*;
use xgress_view::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(App);
}
