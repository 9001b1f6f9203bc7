//! Window abstraction: location, session history, scrolling and the
//! `click` / `popstate` listeners the navigation triggers attach.
//!
//! On wasm32 every function forwards to the browser. On native targets the
//! window is an in-memory, per-thread simulation; the [`memory`] module
//! exposes the knobs tests use to drive it (setting the URL, clicking,
//! going back).

use crate::dom::Element;
use url::Url;
use wayfinder_urls::RouterError;

#[cfg(not(target_arch = "wasm32"))]
use std::cell::{Cell, RefCell};
#[cfg(not(target_arch = "wasm32"))]
use std::rc::Rc;

/// History state marking `popstate` events the router dispatched itself.
pub const IGNORE_STATE: &str = "wayfinder-router-ignore";

/// Parts of the window's current URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowLocation {
	/// Full URL.
	pub href: String,
	/// Serialized origin, e.g. `http://localhost`.
	pub origin: String,
	/// Pathname.
	pub pathname: String,
	/// Search string including `?`, empty when there is no query.
	pub search: String,
	/// Hash including `#`, empty when there is no fragment.
	pub hash: String,
}

impl WindowLocation {
	/// Splits `url` into location parts.
	pub fn from_url(url: &Url) -> Self {
		Self {
			href: url.as_str().to_string(),
			origin: url.origin().ascii_serialization(),
			pathname: url.path().to_string(),
			search: url
				.query()
				.filter(|query| !query.is_empty())
				.map(|query| format!("?{}", query))
				.unwrap_or_default(),
			hash: url
				.fragment()
				.filter(|fragment| !fragment.is_empty())
				.map(|fragment| format!("#{}", fragment))
				.unwrap_or_default(),
		}
	}
}

/// A `click` event seen by the document listener.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct ClickEvent {
	target: Element,
	button: i16,
	modifier: bool,
	default_prevented: Cell<bool>,
}

#[cfg(not(target_arch = "wasm32"))]
impl ClickEvent {
	/// Primary-button click without modifiers on `target`.
	pub fn new(target: &Element) -> Self {
		Self {
			target: target.clone(),
			button: 0,
			modifier: false,
			default_prevented: Cell::new(false),
		}
	}

	/// Sets the mouse button.
	pub fn with_button(mut self, button: i16) -> Self {
		self.button = button;
		self
	}

	/// Holds a shift, ctrl, alt or meta key during the click.
	pub fn with_modifier(mut self) -> Self {
		self.modifier = true;
		self
	}

	/// Marks the event as already handled by another listener.
	pub fn with_default_prevented(self) -> Self {
		self.default_prevented.set(true);
		self
	}

	/// Node the click was dispatched to.
	pub fn target(&self) -> Option<Element> {
		Some(self.target.clone())
	}

	/// Target followed by its ancestors.
	pub fn composed_path(&self) -> Vec<Element> {
		let mut path = Vec::new();
		let mut node = Some(self.target.clone());
		while let Some(current) = node {
			node = current.parent();
			path.push(current);
		}
		path
	}

	/// Mouse button, `0` for the primary one.
	pub fn button(&self) -> i16 {
		self.button
	}

	/// Whether a modifier key was held.
	pub fn has_modifier(&self) -> bool {
		self.modifier
	}

	/// Whether default handling was prevented.
	pub fn default_prevented(&self) -> bool {
		self.default_prevented.get()
	}

	/// Prevents the browser's own navigation.
	pub fn prevent_default(&self) {
		self.default_prevented.set(true);
	}
}

/// A `click` event seen by the document listener.
#[cfg(target_arch = "wasm32")]
#[derive(Debug)]
pub struct ClickEvent(web_sys::MouseEvent);

#[cfg(target_arch = "wasm32")]
impl ClickEvent {
	/// Node the click was dispatched to.
	pub fn target(&self) -> Option<Element> {
		use wasm_bindgen::JsCast;
		self.0
			.target()
			.and_then(|target| target.dyn_into::<web_sys::Node>().ok())
			.map(Element::from_node)
	}

	/// Event path, from the target outwards.
	pub fn composed_path(&self) -> Vec<Element> {
		use wasm_bindgen::JsCast;
		self.0
			.composed_path()
			.iter()
			.filter_map(|value| value.dyn_into::<web_sys::Node>().ok())
			.map(Element::from_node)
			.collect()
	}

	/// Mouse button, `0` for the primary one.
	pub fn button(&self) -> i16 {
		self.0.button()
	}

	/// Whether a modifier key was held.
	pub fn has_modifier(&self) -> bool {
		self.0.shift_key() || self.0.ctrl_key() || self.0.alt_key() || self.0.meta_key()
	}

	/// Whether default handling was prevented.
	pub fn default_prevented(&self) -> bool {
		self.0.default_prevented()
	}

	/// Prevents the browser's own navigation.
	pub fn prevent_default(&self) {
		self.0.prevent_default();
	}
}

/// A `popstate` event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopStateEvent {
	/// History state, when it is a string.
	pub state: Option<String>,
}

/// Keeps a window listener attached; dropping it detaches the listener.
#[must_use = "the listener is removed when the handle is dropped"]
pub struct ListenerHandle {
	#[cfg(not(target_arch = "wasm32"))]
	id: u64,
	#[cfg(target_arch = "wasm32")]
	target: Option<web_sys::EventTarget>,
	#[cfg(target_arch = "wasm32")]
	event: &'static str,
	#[cfg(target_arch = "wasm32")]
	closure: wasm_bindgen::closure::Closure<dyn FnMut(web_sys::Event)>,
}

impl std::fmt::Debug for ListenerHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ListenerHandle").finish_non_exhaustive()
	}
}

#[cfg(not(target_arch = "wasm32"))]
type ClickListener = Rc<dyn Fn(&ClickEvent)>;
#[cfg(not(target_arch = "wasm32"))]
type PopStateListener = Rc<dyn Fn(&PopStateEvent)>;

#[cfg(not(target_arch = "wasm32"))]
struct MemoryWindow {
	entries: Vec<String>,
	index: usize,
	base_href: Option<String>,
	scroll: (f64, f64),
	next_listener: u64,
	click_listeners: Vec<(u64, ClickListener)>,
	popstate_listeners: Vec<(u64, PopStateListener)>,
}

#[cfg(not(target_arch = "wasm32"))]
impl MemoryWindow {
	fn new() -> Self {
		Self {
			entries: vec![wayfinder_urls::DEFAULT_DOCUMENT_URL.to_string()],
			index: 0,
			base_href: None,
			scroll: (0.0, 0.0),
			next_listener: 0,
			click_listeners: Vec::new(),
			popstate_listeners: Vec::new(),
		}
	}

	fn current(&self) -> &str {
		&self.entries[self.index]
	}

	fn resolve(&self, url: &str) -> Result<String, RouterError> {
		Url::parse(self.current())
			.and_then(|base| base.join(url))
			.map(String::from)
			.map_err(|error| RouterError::Platform(format!("invalid URL \"{}\": {}", url, error)))
	}
}

#[cfg(not(target_arch = "wasm32"))]
thread_local! {
	static WINDOW: RefCell<MemoryWindow> = RefCell::new(MemoryWindow::new());
}

#[cfg(not(target_arch = "wasm32"))]
impl Drop for ListenerHandle {
	fn drop(&mut self) {
		let id = self.id;
		// The window may already be gone during thread teardown.
		let _ = WINDOW.try_with(|window| {
			let mut window = window.borrow_mut();
			window.click_listeners.retain(|(listener, _)| *listener != id);
			window.popstate_listeners.retain(|(listener, _)| *listener != id);
		});
	}
}

#[cfg(target_arch = "wasm32")]
impl Drop for ListenerHandle {
	fn drop(&mut self) {
		use wasm_bindgen::JsCast;
		if let Some(target) = &self.target {
			let _ = target
				.remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref());
		}
	}
}

/// Current window location.
#[cfg(not(target_arch = "wasm32"))]
pub fn location() -> WindowLocation {
	let href = WINDOW.with(|window| window.borrow().current().to_string());
	Url::parse(&href)
		.map(|url| WindowLocation::from_url(&url))
		.unwrap_or_default()
}

/// URL of the document.
#[cfg(not(target_arch = "wasm32"))]
pub fn document_url() -> String {
	location().href
}

/// `href` of the document's `<base>` element.
#[cfg(not(target_arch = "wasm32"))]
pub fn base_href() -> Option<String> {
	WINDOW.with(|window| window.borrow().base_href.clone())
}

/// Adds a history entry for `url`.
#[cfg(not(target_arch = "wasm32"))]
pub fn push_state(url: &str) -> Result<(), RouterError> {
	WINDOW.with(|window| {
		let mut window = window.borrow_mut();
		let url = window.resolve(url)?;
		let index = window.index + 1;
		window.entries.truncate(index);
		window.entries.push(url);
		window.index = index;
		Ok(())
	})
}

/// Replaces the current history entry with `url`.
#[cfg(not(target_arch = "wasm32"))]
pub fn replace_state(url: &str) -> Result<(), RouterError> {
	WINDOW.with(|window| {
		let mut window = window.borrow_mut();
		let url = window.resolve(url)?;
		let index = window.index;
		window.entries[index] = url;
		Ok(())
	})
}

/// Dispatches a `popstate` event on the window.
#[cfg(not(target_arch = "wasm32"))]
pub fn dispatch_popstate(state: Option<&str>) {
	let listeners: Vec<_> = WINDOW.with(|window| {
		window
			.borrow()
			.popstate_listeners
			.iter()
			.map(|(_, listener)| Rc::clone(listener))
			.collect()
	});
	let event = PopStateEvent {
		state: state.map(str::to_string),
	};
	for listener in listeners {
		listener(&event);
	}
}

/// Scrolls the window to the top-left corner.
#[cfg(not(target_arch = "wasm32"))]
pub fn scroll_to_top() {
	WINDOW.with(|window| window.borrow_mut().scroll = (0.0, 0.0));
}

/// Listens to clicks anywhere in the document.
#[cfg(not(target_arch = "wasm32"))]
pub fn on_click<F>(handler: F) -> ListenerHandle
where
	F: Fn(&ClickEvent) + 'static,
{
	WINDOW.with(|window| {
		let mut window = window.borrow_mut();
		let id = window.next_listener;
		window.next_listener += 1;
		window.click_listeners.push((id, Rc::new(handler)));
		ListenerHandle { id }
	})
}

/// Listens to `popstate` on the window.
#[cfg(not(target_arch = "wasm32"))]
pub fn on_popstate<F>(handler: F) -> ListenerHandle
where
	F: Fn(&PopStateEvent) + 'static,
{
	WINDOW.with(|window| {
		let mut window = window.borrow_mut();
		let id = window.next_listener;
		window.next_listener += 1;
		window.popstate_listeners.push((id, Rc::new(handler)));
		ListenerHandle { id }
	})
}

/// Test controls for the in-memory window.
#[cfg(not(target_arch = "wasm32"))]
pub mod memory {
	use super::*;

	/// Restores the initial state: a single `http://localhost/` entry, no
	/// base element, no listeners.
	pub fn reset() {
		WINDOW.with(|window| *window.borrow_mut() = MemoryWindow::new());
	}

	/// Navigates the window to `url` without notifying listeners, as a
	/// full page load would.
	pub fn set_location(url: &str) -> Result<(), RouterError> {
		push_state(url)
	}

	/// Sets or clears the document's `<base href>`.
	pub fn set_base_href(href: Option<&str>) {
		WINDOW.with(|window| window.borrow_mut().base_href = href.map(str::to_string));
	}

	/// Goes one entry back and dispatches `popstate`, like the browser's
	/// back button.
	pub fn back() {
		let moved = WINDOW.with(|window| {
			let mut window = window.borrow_mut();
			if window.index == 0 {
				return false;
			}
			window.index -= 1;
			true
		});
		if moved {
			dispatch_popstate(None);
		}
	}

	/// Number of session history entries.
	pub fn history_len() -> usize {
		WINDOW.with(|window| window.borrow().entries.len())
	}

	/// URLs of the session history entries, oldest first.
	pub fn history_entries() -> Vec<String> {
		WINDOW.with(|window| window.borrow().entries.clone())
	}

	/// Sets the scroll position.
	pub fn scroll_to(x: f64, y: f64) {
		WINDOW.with(|window| window.borrow_mut().scroll = (x, y));
	}

	/// Current scroll position.
	pub fn scroll_position() -> (f64, f64) {
		WINDOW.with(|window| window.borrow().scroll)
	}

	/// Dispatches `event` to the document's click listeners.
	pub fn click(event: &ClickEvent) {
		let listeners: Vec<_> = WINDOW.with(|window| {
			window
				.borrow()
				.click_listeners
				.iter()
				.map(|(_, listener)| Rc::clone(listener))
				.collect()
		});
		for listener in listeners {
			listener(event);
		}
	}
}

#[cfg(target_arch = "wasm32")]
fn browser_window() -> Result<web_sys::Window, RouterError> {
	web_sys::window().ok_or_else(|| RouterError::Platform("no window".to_string()))
}

/// Current window location.
#[cfg(target_arch = "wasm32")]
pub fn location() -> WindowLocation {
	browser_window()
		.ok()
		.and_then(|window| window.location().href().ok())
		.and_then(|href| Url::parse(&href).ok())
		.map(|url| WindowLocation::from_url(&url))
		.unwrap_or_default()
}

/// URL of the document.
#[cfg(target_arch = "wasm32")]
pub fn document_url() -> String {
	browser_window()
		.ok()
		.and_then(|window| window.document())
		.and_then(|document| document.url().ok())
		.unwrap_or_else(|| wayfinder_urls::DEFAULT_DOCUMENT_URL.to_string())
}

/// `href` of the document's `<base>` element.
#[cfg(target_arch = "wasm32")]
pub fn base_href() -> Option<String> {
	browser_window()
		.ok()?
		.document()?
		.query_selector("base")
		.ok()
		.flatten()?
		.get_attribute("href")
}

/// Adds a history entry for `url`.
#[cfg(target_arch = "wasm32")]
pub fn push_state(url: &str) -> Result<(), RouterError> {
	browser_window()?
		.history()
		.and_then(|history| {
			history.push_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(url))
		})
		.map_err(|error| RouterError::Platform(format!("pushState failed: {:?}", error)))
}

/// Replaces the current history entry with `url`.
#[cfg(target_arch = "wasm32")]
pub fn replace_state(url: &str) -> Result<(), RouterError> {
	browser_window()?
		.history()
		.and_then(|history| {
			history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(url))
		})
		.map_err(|error| RouterError::Platform(format!("replaceState failed: {:?}", error)))
}

/// Dispatches a `popstate` event on the window.
#[cfg(target_arch = "wasm32")]
pub fn dispatch_popstate(state: Option<&str>) {
	let Ok(window) = browser_window() else {
		return;
	};
	let init = web_sys::PopStateEventInit::new();
	match state {
		Some(state) => init.set_state(&wasm_bindgen::JsValue::from_str(state)),
		None => init.set_state(&wasm_bindgen::JsValue::NULL),
	}
	if let Ok(event) = web_sys::PopStateEvent::new_with_event_init_dict("popstate", &init) {
		let _ = window.dispatch_event(&event);
	}
}

/// Scrolls the window to the top-left corner.
#[cfg(target_arch = "wasm32")]
pub fn scroll_to_top() {
	if let Ok(window) = browser_window() {
		window.scroll_to_with_x_and_y(0.0, 0.0);
	}
}

#[cfg(target_arch = "wasm32")]
fn listen(
	target: Option<web_sys::EventTarget>,
	event: &'static str,
	handler: Box<dyn FnMut(web_sys::Event)>,
) -> ListenerHandle {
	use wasm_bindgen::JsCast;
	use wasm_bindgen::prelude::*;

	let closure = Closure::wrap(handler);
	match &target {
		Some(target) => {
			if let Err(error) =
				target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
			{
				crate::error_log!("failed to add {} listener: {:?}", event, error);
			}
		}
		None => crate::warn_log!("no window to listen to {} on", event),
	}
	ListenerHandle {
		target,
		event,
		closure,
	}
}

/// Listens to clicks anywhere in the document.
#[cfg(target_arch = "wasm32")]
pub fn on_click<F>(handler: F) -> ListenerHandle
where
	F: Fn(&ClickEvent) + 'static,
{
	use wasm_bindgen::JsCast;

	let target = browser_window()
		.ok()
		.and_then(|window| window.document())
		.map(web_sys::EventTarget::from);
	listen(
		target,
		"click",
		Box::new(move |event: web_sys::Event| {
			if let Ok(event) = event.dyn_into::<web_sys::MouseEvent>() {
				handler(&ClickEvent(event));
			}
		}),
	)
}

/// Listens to `popstate` on the window.
#[cfg(target_arch = "wasm32")]
pub fn on_popstate<F>(handler: F) -> ListenerHandle
where
	F: Fn(&PopStateEvent) + 'static,
{
	use wasm_bindgen::JsCast;

	let target = browser_window().ok().map(web_sys::EventTarget::from);
	listen(
		target,
		"popstate",
		Box::new(move |event: web_sys::Event| {
			let state = event
				.dyn_ref::<web_sys::PopStateEvent>()
				.and_then(|event| event.state().as_string());
			handler(&PopStateEvent { state });
		}),
	)
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("http://localhost/users?tab=a#top", "/users", "?tab=a", "#top")]
	#[case("http://localhost/users?#", "/users", "", "")]
	#[case("http://localhost/", "/", "", "")]
	fn test_location_parts(
		#[case] href: &str,
		#[case] pathname: &str,
		#[case] search: &str,
		#[case] hash: &str,
	) {
		let url = Url::parse(href).unwrap();

		let location = WindowLocation::from_url(&url);

		assert_eq!(location.pathname, pathname);
		assert_eq!(location.search, search);
		assert_eq!(location.hash, hash);
		assert_eq!(location.origin, "http://localhost");
	}

	#[rstest]
	fn test_push_truncates_forward_entries() {
		// Arrange
		memory::reset();
		push_state("/a").unwrap();
		push_state("/b").unwrap();
		memory::back();

		// Act
		push_state("/c").unwrap();

		// Assert
		assert_eq!(
			memory::history_entries(),
			vec!["http://localhost/", "http://localhost/a", "http://localhost/c"]
		);
		assert_eq!(location().pathname, "/c");
	}

	#[rstest]
	fn test_replace_keeps_length() {
		memory::reset();
		push_state("/a").unwrap();

		replace_state("/b?x=1").unwrap();

		assert_eq!(memory::history_len(), 2);
		assert_eq!(location().search, "?x=1");
	}

	#[rstest]
	fn test_dropped_listener_is_detached() {
		// Arrange
		memory::reset();
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = Rc::clone(&seen);
		let handle = on_popstate(move |event| sink.borrow_mut().push(event.state.clone()));

		// Act
		dispatch_popstate(Some(IGNORE_STATE));
		drop(handle);
		dispatch_popstate(None);

		// Assert
		assert_eq!(*seen.borrow(), vec![Some(IGNORE_STATE.to_string())]);
	}

	#[rstest]
	fn test_composed_path_walks_ancestors() {
		let outer = Element::create("a").unwrap();
		let inner = Element::create("span").unwrap();
		outer.append_child(&inner).unwrap();

		let path = ClickEvent::new(&inner).composed_path();

		assert_eq!(path, vec![inner, outer]);
	}
}
