//! Window-level router events.
//!
//! Three events are dispatched:
//!
//! - `wayfinder-router-go`: a navigation request. Cancelable; a router that
//!   handles the request prevents its default.
//! - `wayfinder-router-location-changed`: a render cycle settled.
//! - `wayfinder-router-error`: a render cycle failed.
//!
//! Rust listeners subscribe with [`subscribe`]. On wasm32 every event is
//! also dispatched on `window` as a `CustomEvent` whose `detail` carries
//! the JSON form of [`RouterEvent::detail`], so page scripts can observe
//! and cancel navigation too.

use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use wayfinder_urls::{Location, ResolveRequest, RouterError};

use crate::window::WindowLocation;

/// Name of the navigation request event.
pub const GO_EVENT: &str = "wayfinder-router-go";
/// Name of the settled-navigation event.
pub const LOCATION_CHANGED_EVENT: &str = "wayfinder-router-location-changed";
/// Name of the failed-navigation event.
pub const ERROR_EVENT: &str = "wayfinder-router-error";

/// Target of a navigation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigationDetail {
	/// Pathname.
	pub pathname: String,
	/// Search string including `?`.
	pub search: String,
	/// Hash including `#`.
	pub hash: String,
}

impl From<&WindowLocation> for NavigationDetail {
	fn from(location: &WindowLocation) -> Self {
		Self {
			pathname: location.pathname.clone(),
			search: location.search.clone(),
			hash: location.hash.clone(),
		}
	}
}

impl From<NavigationDetail> for ResolveRequest {
	fn from(detail: NavigationDetail) -> Self {
		ResolveRequest::new(detail.pathname)
			.search(detail.search)
			.hash(detail.hash)
	}
}

/// An event dispatched by the router.
#[derive(Debug, Clone)]
pub enum RouterEvent {
	/// Navigation request.
	Go(NavigationDetail),
	/// A render cycle settled at `location`.
	LocationChanged(Location),
	/// A render cycle failed.
	Error {
		/// Failure cause.
		error: RouterError,
		/// Navigation that failed.
		navigation: NavigationDetail,
	},
}

impl RouterEvent {
	/// Window event name.
	pub fn name(&self) -> &'static str {
		match self {
			Self::Go(_) => GO_EVENT,
			Self::LocationChanged(_) => LOCATION_CHANGED_EVENT,
			Self::Error { .. } => ERROR_EVENT,
		}
	}

	/// Only navigation requests can be canceled.
	pub fn cancelable(&self) -> bool {
		matches!(self, Self::Go(_))
	}

	/// JSON detail of the event.
	pub fn detail(&self) -> serde_json::Value {
		match self {
			Self::Go(detail) => serde_json::to_value(detail).unwrap_or_default(),
			Self::LocationChanged(location) => {
				serde_json::json!({ "location": location })
			}
			Self::Error { error, navigation } => serde_json::json!({
				"error": error.to_string(),
				"code": error.code(),
				"pathname": navigation.pathname,
				"search": navigation.search,
				"hash": navigation.hash,
			}),
		}
	}
}

/// An event being delivered to listeners.
#[derive(Debug)]
pub struct DispatchedEvent {
	event: RouterEvent,
	default_prevented: Cell<bool>,
}

impl DispatchedEvent {
	/// The dispatched event.
	pub fn event(&self) -> &RouterEvent {
		&self.event
	}

	/// Marks a cancelable event as handled.
	pub fn prevent_default(&self) {
		if self.event.cancelable() {
			self.default_prevented.set(true);
		}
	}

	/// Whether a listener prevented the default.
	pub fn default_prevented(&self) -> bool {
		self.default_prevented.get()
	}
}

type Listener = Rc<dyn Fn(&DispatchedEvent)>;

#[derive(Default)]
struct Bus {
	next_id: u64,
	listeners: Vec<(u64, Listener)>,
}

thread_local! {
	static BUS: RefCell<Bus> = RefCell::new(Bus::default());
}

/// Keeps a listener subscribed; dropping it unsubscribes.
#[must_use = "the listener is unsubscribed when the subscription is dropped"]
pub struct Subscription {
	id: u64,
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription").field("id", &self.id).finish()
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		let id = self.id;
		let _ = BUS.try_with(|bus| {
			bus.borrow_mut().listeners.retain(|(listener, _)| *listener != id);
		});
	}
}

/// Subscribes `listener` to every router event.
pub fn subscribe<F>(listener: F) -> Subscription
where
	F: Fn(&DispatchedEvent) + 'static,
{
	BUS.with(|bus| {
		let mut bus = bus.borrow_mut();
		let id = bus.next_id;
		bus.next_id += 1;
		bus.listeners.push((id, Rc::new(listener)));
		Subscription { id }
	})
}

/// Dispatches `event` and returns whether its default was prevented.
///
/// Listeners added or removed while the event is being delivered take
/// effect from the next dispatch on.
pub fn dispatch(event: RouterEvent) -> bool {
	crate::debug_log!("dispatching {}", event.name());
	let listeners: Vec<Listener> = BUS.with(|bus| {
		bus.borrow()
			.listeners
			.iter()
			.map(|(_, listener)| Rc::clone(listener))
			.collect()
	});
	let dispatched = DispatchedEvent {
		event,
		default_prevented: Cell::new(false),
	};
	for listener in listeners {
		listener(&dispatched);
	}

	let prevented_by_page = dispatch_window_event(&dispatched.event);
	dispatched.default_prevented() || prevented_by_page
}

#[cfg(target_arch = "wasm32")]
fn dispatch_window_event(event: &RouterEvent) -> bool {
	let Some(window) = web_sys::window() else {
		return false;
	};
	let detail = js_sys::JSON::parse(&event.detail().to_string())
		.unwrap_or(wasm_bindgen::JsValue::NULL);
	let init = web_sys::CustomEventInit::new();
	init.set_detail(&detail);
	init.set_cancelable(event.cancelable());
	match web_sys::CustomEvent::new_with_event_init_dict(event.name(), &init) {
		// `dispatchEvent` returns false when a listener canceled the event.
		Ok(custom) => window.dispatch_event(&custom).map(|proceed| !proceed).unwrap_or(false),
		Err(error) => {
			crate::error_log!("failed to create {} event: {:?}", event.name(), error);
			false
		}
	}
}

#[cfg(not(target_arch = "wasm32"))]
fn dispatch_window_event(_event: &RouterEvent) -> bool {
	false
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn go(pathname: &str) -> RouterEvent {
		RouterEvent::Go(NavigationDetail {
			pathname: pathname.to_string(),
			..Default::default()
		})
	}

	#[rstest]
	fn test_unhandled_go_is_not_prevented() {
		assert!(!dispatch(go("/a")));
	}

	#[rstest]
	fn test_listener_can_cancel_go() {
		// Arrange
		let _subscription = subscribe(|event| {
			if let RouterEvent::Go(detail) = event.event() {
				if detail.pathname == "/mine" {
					event.prevent_default();
				}
			}
		});

		// Act
		let mine = dispatch(go("/mine"));
		let other = dispatch(go("/other"));

		// Assert
		assert!(mine);
		assert!(!other);
	}

	#[rstest]
	fn test_location_changed_cannot_be_canceled() {
		let _subscription = subscribe(|event| event.prevent_default());

		let prevented = dispatch(RouterEvent::LocationChanged(Location::default()));

		assert!(!prevented);
	}

	#[rstest]
	fn test_dropping_subscription_stops_delivery() {
		// Arrange
		let count = Rc::new(Cell::new(0));
		let counter = Rc::clone(&count);
		let subscription = subscribe(move |_| counter.set(counter.get() + 1));
		dispatch(go("/a"));

		// Act
		drop(subscription);
		dispatch(go("/b"));

		// Assert
		assert_eq!(count.get(), 1);
	}

	#[rstest]
	fn test_error_detail_carries_message_and_code() {
		let event = RouterEvent::Error {
			error: RouterError::TooManyRedirects("/a".to_string()),
			navigation: NavigationDetail {
				pathname: "/a".to_string(),
				search: "?x=1".to_string(),
				hash: String::new(),
			},
		};

		let detail = event.detail();

		assert_eq!(event.name(), ERROR_EVENT);
		assert_eq!(detail["error"], "Too many redirects when rendering from /a");
		assert_eq!(detail["code"], serde_json::Value::Null);
		assert_eq!(detail["search"], "?x=1");
	}
}
