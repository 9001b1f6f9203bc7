//! Navigation triggers: turn browser events into navigation requests.
//!
//! A trigger listens to some window event and dispatches the `go` router
//! event for it. The router activates [`default_triggers`] unless told
//! otherwise; [`Router::set_triggers`](super::Router::set_triggers)
//! replaces them. Triggers of the same kind share one window listener,
//! which stays attached while any of them is active.

use crate::dom::Element;
use crate::events::{self, NavigationDetail, RouterEvent};
use crate::window::{self, ClickEvent, IGNORE_STATE, ListenerHandle, PopStateEvent, WindowLocation};
use std::cell::{Cell, RefCell};
use std::thread::LocalKey;

/// A source of navigation requests.
pub trait NavigationTrigger {
	/// Starts listening. Activating an active trigger has no effect.
	fn activate(&mut self);

	/// Stops listening.
	fn inactivate(&mut self);

	/// Short name, for diagnostics.
	fn name(&self) -> &'static str;
}

/// One window listener for all active triggers of a kind, so a page with
/// several routers still dispatches a single `go` per browser event.
struct SharedListener {
	users: Cell<usize>,
	handle: RefCell<Option<ListenerHandle>>,
}

impl SharedListener {
	const fn new() -> Self {
		Self {
			users: Cell::new(0),
			handle: RefCell::new(None),
		}
	}

	fn acquire(&self, install: impl FnOnce() -> ListenerHandle) {
		if self.users.get() == 0 {
			*self.handle.borrow_mut() = Some(install());
		}
		self.users.set(self.users.get() + 1);
	}

	fn release(&self) {
		match self.users.get() {
			0 => {}
			1 => {
				self.users.set(0);
				let handle = self.handle.borrow_mut().take();
				drop(handle);
			}
			users => self.users.set(users - 1),
		}
	}
}

thread_local! {
	static CLICK_LISTENER: SharedListener = const { SharedListener::new() };
	static POPSTATE_LISTENER: SharedListener = const { SharedListener::new() };
}

/// Activation state of one trigger over a shared window listener.
#[derive(Debug, Default)]
struct Activation {
	active: bool,
}

impl Activation {
	fn activate(
		&mut self,
		listener: &'static LocalKey<SharedListener>,
		install: impl FnOnce() -> ListenerHandle,
	) {
		if !self.active {
			self.active = true;
			listener.with(|listener| listener.acquire(install));
		}
	}

	fn inactivate(&mut self, listener: &'static LocalKey<SharedListener>) {
		if self.active {
			self.active = false;
			// The listener may already be gone during thread teardown.
			let _ = listener.try_with(SharedListener::release);
		}
	}
}

/// Navigates on clicks on same-origin `<a>` links.
///
/// A click is left to the browser when it is not an unmodified primary
/// button click, when the link has a `target` other than `_self`, a
/// `download` or `router-ignore` attribute, when it points to a fragment
/// of the current page, or when it leaves the origin.
#[derive(Debug, Default)]
pub struct ClickTrigger {
	activation: Activation,
}

impl NavigationTrigger for ClickTrigger {
	fn activate(&mut self) {
		self.activation
			.activate(&CLICK_LISTENER, || window::on_click(handle_click));
	}

	fn inactivate(&mut self) {
		self.activation.inactivate(&CLICK_LISTENER);
	}

	fn name(&self) -> &'static str {
		"click"
	}
}

impl Drop for ClickTrigger {
	fn drop(&mut self) {
		self.inactivate();
	}
}

/// Navigates on back/forward, ignoring `popstate` events the router
/// dispatched itself.
#[derive(Debug, Default)]
pub struct PopstateTrigger {
	activation: Activation,
}

impl NavigationTrigger for PopstateTrigger {
	fn activate(&mut self) {
		self.activation
			.activate(&POPSTATE_LISTENER, || window::on_popstate(handle_popstate));
	}

	fn inactivate(&mut self) {
		self.activation.inactivate(&POPSTATE_LISTENER);
	}

	fn name(&self) -> &'static str {
		"popstate"
	}
}

impl Drop for PopstateTrigger {
	fn drop(&mut self) {
		self.inactivate();
	}
}

/// Click and popstate triggers.
pub fn default_triggers() -> Vec<Box<dyn NavigationTrigger>> {
	vec![
		Box::new(ClickTrigger::default()),
		Box::new(PopstateTrigger::default()),
	]
}

fn find_anchor(event: &ClickEvent) -> Option<Element> {
	if let Some(anchor) = event
		.composed_path()
		.into_iter()
		.find(|node| node.local_name() == "a")
	{
		return Some(anchor);
	}
	let mut candidate = event.target();
	while let Some(node) = candidate {
		if node.local_name() == "a" {
			return Some(node);
		}
		candidate = node.parent();
	}
	None
}

fn handle_click(event: &ClickEvent) {
	if event.default_prevented() || event.button() != 0 || event.has_modifier() {
		return;
	}
	let Some(anchor) = find_anchor(event) else {
		return;
	};

	let target = anchor.attribute("target").unwrap_or_default();
	if !target.is_empty() && !target.eq_ignore_ascii_case("_self") {
		return;
	}
	if anchor.has_attribute("download") || anchor.has_attribute("router-ignore") {
		return;
	}

	let Some(url) = anchor.anchor_url() else {
		return;
	};
	let current = window::location();
	let link = WindowLocation::from_url(&url);
	if link.pathname == current.pathname && !link.hash.is_empty() {
		return;
	}
	if link.origin != current.origin {
		return;
	}

	if events::dispatch(RouterEvent::Go(NavigationDetail::from(&link))) {
		event.prevent_default();
		window::scroll_to_top();
	}
}

fn handle_popstate(event: &PopStateEvent) {
	if event.state.as_deref() == Some(IGNORE_STATE) {
		return;
	}
	events::dispatch(RouterEvent::Go(NavigationDetail::from(&window::location())));
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use crate::window::memory;
	use rstest::rstest;
	use std::cell::RefCell;
	use std::rc::Rc;

	/// Records `go` requests and handles them when `handle` is set.
	fn record_go(handle: bool) -> (Rc<RefCell<Vec<NavigationDetail>>>, events::Subscription) {
		let requests = Rc::new(RefCell::new(Vec::new()));
		let recorder = Rc::clone(&requests);
		let subscription = events::subscribe(move |event| {
			if let RouterEvent::Go(detail) = event.event() {
				recorder.borrow_mut().push(detail.clone());
				if handle {
					event.prevent_default();
				}
			}
		});
		(requests, subscription)
	}

	fn link(href: &str) -> Element {
		let anchor = Element::create("a").unwrap();
		anchor.set_attribute("href", href).unwrap();
		anchor
	}

	#[rstest]
	fn test_click_on_nested_link_navigates() {
		// Arrange
		memory::reset();
		memory::scroll_to(0.0, 120.0);
		let (requests, _subscription) = record_go(true);
		let mut trigger = ClickTrigger::default();
		trigger.activate();
		let anchor = link("/users/1?tab=a");
		let label = Element::create("span").unwrap();
		anchor.append_child(&label).unwrap();
		let event = ClickEvent::new(&label);

		// Act
		memory::click(&event);

		// Assert
		assert_eq!(
			*requests.borrow(),
			vec![NavigationDetail {
				pathname: "/users/1".to_string(),
				search: "?tab=a".to_string(),
				hash: String::new(),
			}]
		);
		assert!(event.default_prevented());
		assert_eq!(memory::scroll_position(), (0.0, 0.0));
	}

	#[rstest]
	fn test_unhandled_click_keeps_default() {
		memory::reset();
		let (requests, _subscription) = record_go(false);
		let mut trigger = ClickTrigger::default();
		trigger.activate();
		let event = ClickEvent::new(&link("/a"));

		memory::click(&event);

		assert_eq!(requests.borrow().len(), 1);
		assert!(!event.default_prevented());
	}

	#[rstest]
	#[case::other_target(Some(("target", "_blank")), "/a")]
	#[case::download(Some(("download", "")), "/a")]
	#[case::opt_out(Some(("router-ignore", "")), "/a")]
	#[case::same_page_fragment(None, "/#section")]
	#[case::other_origin(None, "https://example.com/a")]
	fn test_ignored_links(#[case] attribute: Option<(&str, &str)>, #[case] href: &str) {
		// Arrange
		memory::reset();
		let (requests, _subscription) = record_go(true);
		let mut trigger = ClickTrigger::default();
		trigger.activate();
		let anchor = link(href);
		if let Some((name, value)) = attribute {
			anchor.set_attribute(name, value).unwrap();
		}

		// Act
		memory::click(&ClickEvent::new(&anchor));

		// Assert
		assert!(requests.borrow().is_empty());
	}

	#[rstest]
	fn test_self_target_is_followed() {
		memory::reset();
		let (requests, _subscription) = record_go(true);
		let mut trigger = ClickTrigger::default();
		trigger.activate();
		let anchor = link("/a");
		anchor.set_attribute("target", "_SELF").unwrap();

		memory::click(&ClickEvent::new(&anchor));

		assert_eq!(requests.borrow().len(), 1);
	}

	#[rstest]
	#[case::secondary_button(ClickEvent::new(&link("/a")).with_button(1))]
	#[case::modifier(ClickEvent::new(&link("/a")).with_modifier())]
	#[case::already_handled(ClickEvent::new(&link("/a")).with_default_prevented())]
	#[case::no_anchor(ClickEvent::new(&Element::create("button").unwrap()))]
	fn test_ignored_clicks(#[case] event: ClickEvent) {
		memory::reset();
		let (requests, _subscription) = record_go(true);
		let mut trigger = ClickTrigger::default();
		trigger.activate();

		memory::click(&event);

		assert!(requests.borrow().is_empty());
	}

	#[rstest]
	fn test_inactive_click_trigger_does_nothing() {
		// Arrange
		memory::reset();
		let (requests, _subscription) = record_go(true);
		let mut trigger = ClickTrigger::default();
		trigger.activate();

		// Act
		trigger.inactivate();
		memory::click(&ClickEvent::new(&link("/a")));

		// Assert
		assert!(requests.borrow().is_empty());
	}

	#[rstest]
	fn test_triggers_share_one_window_listener() {
		// Arrange
		memory::reset();
		let (requests, _subscription) = record_go(true);
		let mut first = ClickTrigger::default();
		let mut second = ClickTrigger::default();
		first.activate();
		second.activate();

		// Act
		memory::click(&ClickEvent::new(&link("/a")));
		first.inactivate();
		memory::click(&ClickEvent::new(&link("/b")));
		drop(second);
		memory::click(&ClickEvent::new(&link("/c")));

		// Assert
		let pathnames: Vec<String> = requests
			.borrow()
			.iter()
			.map(|detail| detail.pathname.clone())
			.collect();
		assert_eq!(pathnames, vec!["/a", "/b"]);
	}

	#[rstest]
	fn test_popstate_navigates_to_window_location() {
		// Arrange
		memory::reset();
		memory::set_location("/first").unwrap();
		memory::set_location("/second?q=1").unwrap();
		let (requests, _subscription) = record_go(true);
		let mut trigger = PopstateTrigger::default();
		trigger.activate();

		// Act
		memory::back();
		window::dispatch_popstate(Some(IGNORE_STATE));

		// Assert
		assert_eq!(
			*requests.borrow(),
			vec![NavigationDetail {
				pathname: "/first".to_string(),
				..Default::default()
			}]
		);
	}

	#[rstest]
	fn test_activate_twice_listens_once() {
		memory::reset();
		let (requests, _subscription) = record_go(true);
		let mut trigger = PopstateTrigger::default();
		trigger.activate();
		trigger.activate();

		window::dispatch_popstate(None);

		assert_eq!(requests.borrow().len(), 1);
	}
}
