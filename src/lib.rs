//! # Wayfinder
//!
//! A client-side navigation router for single-page applications.
//!
//! Wayfinder maps the browser location to a tree of routes, resolves the
//! deepest matching chain (running route actions, redirects and lazily
//! loaded children along the way) and keeps an outlet element in sync with
//! the matched views, reusing the ones shared with the previous location.
//!
//! ## Feature Flags
//!
//! - `urls` - Routing core: path pattern compiler, route tree matcher,
//!   resolver and URL generation
//! - `pages` (default) - Rendering engine, guards, history and navigation
//!   triggers
//! - `debug-hooks` - Debug logging of router internals
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use wayfinder::prelude::*;
//!
//! let outlet = Element::create("main")?;
//! let router = Router::new(Some(outlet), RouterOptions::default())?;
//! router
//!     .set_routes(
//!         [
//!             Route::new("/").component("x-home"),
//!             Route::new("/users/:id").component("x-user").name("user"),
//!         ],
//!         false,
//!     )?
//!     .await?;
//!
//! Router::go("/users/42");
//! let location = router.ready().await?;
//! assert_eq!(location.params.get_str("id"), Some("42"));
//! ```

#[cfg(feature = "urls")]
pub mod urls;

#[cfg(feature = "pages")]
pub mod pages;

#[cfg(feature = "urls")]
pub use wayfinder_urls::{Location, Params, Route, RouterError};

#[cfg(feature = "pages")]
pub use wayfinder_pages::{Router, RouterOptions, View};

/// Re-exports for applications.
pub mod prelude {
	#[cfg(feature = "urls")]
	pub use crate::urls::{
		ActionResult, Animate, Commands, Context, Location, Params, Redirect, Resolved, Route,
		RouterError, UrlGenerator, UrlGeneratorOptions,
	};

	#[cfg(feature = "pages")]
	pub use crate::pages::{
		Amendment, ComponentRegistry, Element, GuardCommands, Lifecycle, NavigationTrigger, Router,
		RouterEvent, RouterOptions, View,
	};

	#[cfg(feature = "pages")]
	pub use async_trait::async_trait;
}
