//! Wayfinder Pages - client-side rendering engine for the wayfinder router
//!
//! Resolves the window location against a route tree from
//! [`wayfinder_urls`] and keeps an outlet element in sync with the matched
//! chain of views.
//!
//! ## Features
//!
//! - **Nested views**: each matched route's view is mounted inside its
//!   parent's, and views shared with the previous location are reused
//! - **Guards**: `on_before_leave` / `on_before_enter` may cancel or
//!   redirect a navigation
//! - **Supersession**: a newer navigation always wins over one in flight
//! - **Navigation triggers**: link clicks and back/forward become
//!   navigation requests
//! - **Low-level Only**: built on wasm-bindgen, web-sys and js-sys
//!
//! ## Architecture
//!
//! - [`router`]: the [`Router`] and its navigation triggers
//! - [`view`]: views, lifecycle hooks and the component registry
//! - [`dom`]: DOM element abstraction
//! - [`window`]: location, session history and window listeners
//! - [`events`]: the window-level router events
//! - [`spawn`]: local task spawning
//! - [`logging`]: diagnostics, emitted as `tracing` events
//!
//! On native targets the DOM and the window are in-memory simulations with
//! the same API, so routing can be tested without a browser.

#![warn(missing_docs)]

pub mod dom;
pub mod events;
pub mod logging;
pub mod router;
pub mod spawn;
pub mod view;
pub mod window;

pub use dom::Element;
pub use events::{
	DispatchedEvent, ERROR_EVENT, GO_EVENT, LOCATION_CHANGED_EVENT, NavigationDetail, RouterEvent,
	Subscription, subscribe,
};
pub use router::{
	ClickTrigger, MAX_REDIRECT_COUNT, NavigationTrigger, PopstateTrigger, RenderFuture, Router,
	RouterOptions, default_triggers,
};
pub use view::{Amendment, ComponentRegistry, GuardCommands, Lifecycle, View, ViewFactory};
pub use window::{IGNORE_STATE, WindowLocation};

pub(crate) use logging::{debug_log, error_log, warn_log};
