//! Routing core for the wayfinder client-side router.
//!
//! This crate is platform independent. It provides:
//!
//! - [`pattern`]: path pattern tokenizer, regex compiler and path builder
//! - [`route`]: route declarations and the route arena
//! - [`matcher`]: lazy depth-first matching of a pathname against the tree
//! - [`resolver`]: asynchronous resolution driving route actions
//! - [`reverse`]: URL generation from route names
//!
//! ## Example
//!
//! ```rust
//! use wayfinder_urls::{ActionResult, Resolved, Resolver, ResolverOptions, Route};
//!
//! # futures::executor::block_on(async {
//! let resolver = Resolver::new(
//! 	[Route::new("/users/:id").action(|context, _| async move {
//! 		let id = context.params.get_str("id").unwrap_or_default().to_string();
//! 		Ok(ActionResult::View(format!("user {}", id)))
//! 	})],
//! 	ResolverOptions::default(),
//! )
//! .unwrap();
//!
//! let context = resolver.resolve("/users/42").await.unwrap();
//! assert_eq!(context.result, Some(Resolved::View("user 42".to_string())));
//! # });
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod location;
pub mod matcher;
pub mod params;
pub mod pattern;
pub mod resolver;
pub mod reverse;
pub mod route;

pub use cache::{DEFAULT_CACHE_CAPACITY, PatternCache};
pub use error::{BuildError, ErrorContext, PatternError, RouteConfigError, RouterError};
pub use location::Location;
pub use matcher::{MatchResult, RouteMatcher, match_path};
pub use params::{ParamValue, Params};
pub use pattern::{
	CompiledPattern, Encoding, Modifier, ParamKey, ParamName, PathBuilder, PatternOptions, Token,
	compile, parse,
};
pub use resolver::{
	ActionResult, ChainItem, Commands, ComponentFactory, Context, DEFAULT_DOCUMENT_URL,
	ErrorHandler, Redirect, ResolveRequest, ResolveRouteFn, Resolved, Resolver, ResolverOptions,
};
pub use reverse::{QueryStringifier, UrlGenerator, UrlGeneratorOptions, stringify_query};
pub use route::{
	ActionFn, ActionFuture, Animate, ChildrenFn, ChildrenFuture, Route, RouteId, RouteInfo,
	RouteNode, RouteTree, join_paths,
};
