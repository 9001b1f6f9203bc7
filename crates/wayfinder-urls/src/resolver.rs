//! Asynchronous route resolution.
//!
//! [`Resolver::resolve`] walks the candidate matches of the route tree in
//! depth-first order and runs the resolve strategy (by default the route's
//! action) on each until one settles. Every context handed to an action
//! shares a cursor over the same match sequence, so an action can call
//! [`Context::next`] to resolve the rest of the chain below it.

use crate::cache::{DEFAULT_CACHE_CAPACITY, PatternCache};
use crate::error::{ErrorContext, RouterError};
use crate::location::Location;
use crate::matcher::{MatchResult, RouteMatcher};
use crate::params::Params;
use crate::pattern::compile;
use crate::route::{ActionFuture, Route, RouteId, RouteTree, join_paths};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use url::Url;

/// URL a relative base URL is resolved against when none is configured.
pub const DEFAULT_DOCUMENT_URL: &str = "http://localhost/";

/// Redirect instruction produced by an action, a guard or a `redirect` route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
	/// Pathname the redirect originates from.
	pub from: String,
	/// Parameters carried over to the target.
	pub params: Params,
	/// Target path pattern.
	pub pathname: String,
}

/// Value returned by a route action.
#[derive(Debug)]
pub enum ActionResult<V> {
	/// No result: keep matching, descending into the route's children.
	Continue,
	/// No result: keep matching, but skip the route's children.
	Skip,
	/// Declined: keep matching without falling back to the route's
	/// `redirect` or `component`.
	NotFound,
	/// A concrete view.
	View(V),
	/// A redirect instruction.
	Redirect(Redirect),
	/// The context returned by [`Context::next`].
	Next(Box<Context<V>>),
	/// An opaque result that settles resolution without a view.
	Done,
}

/// Final result of a settled context.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<V> {
	/// A concrete view.
	View(V),
	/// A redirect instruction.
	Redirect(Redirect),
	/// An opaque result without a view.
	Done,
}

impl<V> Resolved<V> {
	/// Returns the view, if any.
	pub fn view(&self) -> Option<&V> {
		match self {
			Self::View(view) => Some(view),
			_ => None,
		}
	}
}

/// One matched route of a context's chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainItem<V> {
	/// Portion of the pathname consumed by the route.
	pub path: String,
	/// Matched route.
	pub route: RouteId,
	/// View rendered for the route, once created or reused.
	pub element: Option<V>,
}

/// Substitutes a fallback result for a failed resolution.
///
/// Returning `None` propagates the error.
pub type ErrorHandler<V> = Rc<dyn Fn(&RouterError) -> Option<Resolved<V>>>;

/// Strategy resolving a single matched route.
pub type ResolveRouteFn<V> = Rc<dyn Fn(Context<V>) -> ActionFuture<V>>;

/// Creates views from component identifiers.
pub type ComponentFactory<V> = Rc<dyn Fn(&str) -> Result<V, RouterError>>;

/// What to resolve: a pathname and navigation bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveRequest {
	/// Pathname to resolve.
	pub pathname: String,
	/// Search string, including the leading `?`.
	pub search: String,
	/// Hash, including the leading `#`.
	pub hash: String,
	/// Pathname of the navigation that redirected here.
	pub redirect_from: Option<String>,
	/// Render cycle the resolution belongs to.
	pub render_id: u64,
	/// Number of redirects followed so far.
	pub redirect_count: u32,
}

impl ResolveRequest {
	/// Creates a request for `pathname`.
	pub fn new(pathname: impl Into<String>) -> Self {
		Self {
			pathname: pathname.into(),
			..Default::default()
		}
	}

	/// Sets the search string.
	pub fn search(mut self, search: impl Into<String>) -> Self {
		self.search = search.into();
		self
	}

	/// Sets the hash.
	pub fn hash(mut self, hash: impl Into<String>) -> Self {
		self.hash = hash.into();
		self
	}

	/// Records the pathname that redirected here.
	pub fn redirect_from(mut self, from: impl Into<String>) -> Self {
		self.redirect_from = Some(from.into());
		self
	}

	/// Sets the render cycle identifier.
	pub fn render_id(mut self, render_id: u64) -> Self {
		self.render_id = render_id;
		self
	}

	/// Sets the number of redirects followed so far.
	pub fn redirect_count(mut self, redirect_count: u32) -> Self {
		self.redirect_count = redirect_count;
		self
	}
}

impl From<&str> for ResolveRequest {
	fn from(pathname: &str) -> Self {
		Self::new(pathname)
	}
}

impl From<String> for ResolveRequest {
	fn from(pathname: String) -> Self {
		Self::new(pathname)
	}
}

/// State threaded through one resolution.
///
/// Each resolution step derives a fresh context; a settled context carries
/// the chain of matched routes from the root down to `route`.
pub struct Context<V> {
	/// Pathname being resolved.
	pub pathname: String,
	/// Search string of the navigation.
	pub search: String,
	/// Hash of the navigation.
	pub hash: String,
	/// Parameters of `route` and its ancestors.
	pub params: Params,
	/// Route being resolved.
	pub route: RouteId,
	/// Matched routes from the root down to `route`.
	pub chain: Vec<ChainItem<V>>,
	/// Settled result.
	pub result: Option<Resolved<V>>,
	/// Pathname of the navigation that redirected here.
	pub redirect_from: Option<String>,
	/// Render cycle the context belongs to.
	pub render_id: u64,
	/// Number of redirects followed so far.
	pub redirect_count: u32,
	recovered: bool,
	cursor: Option<Rc<Cursor<V>>>,
}

impl<V: Clone> Clone for Context<V> {
	fn clone(&self) -> Self {
		Self {
			pathname: self.pathname.clone(),
			search: self.search.clone(),
			hash: self.hash.clone(),
			params: self.params.clone(),
			route: self.route,
			chain: self.chain.clone(),
			result: self.result.clone(),
			redirect_from: self.redirect_from.clone(),
			render_id: self.render_id,
			redirect_count: self.redirect_count,
			recovered: self.recovered,
			cursor: self.cursor.clone(),
		}
	}
}

impl<V: fmt::Debug> fmt::Debug for Context<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Context")
			.field("pathname", &self.pathname)
			.field("search", &self.search)
			.field("hash", &self.hash)
			.field("params", &self.params)
			.field("route", &self.route)
			.field("chain", &self.chain)
			.field("result", &self.result)
			.field("redirect_from", &self.redirect_from)
			.field("render_id", &self.render_id)
			.field("redirect_count", &self.redirect_count)
			.field("recovered", &self.recovered)
			.finish()
	}
}

impl<V> Context<V> {
	fn seed(route: RouteId, request: ResolveRequest) -> Self {
		Self {
			pathname: request.pathname,
			search: request.search,
			hash: request.hash,
			params: Params::new(),
			route,
			chain: Vec::new(),
			result: None,
			redirect_from: request.redirect_from,
			render_id: request.render_id,
			redirect_count: request.redirect_count,
			recovered: false,
			cursor: None,
		}
	}

	/// Returns whether the result was substituted by the error handler.
	pub fn is_recovered(&self) -> bool {
		self.recovered
	}

	/// Returns whether both contexts come from the same resolution.
	pub fn same_resolution(&self, other: &Context<V>) -> bool {
		match (&self.cursor, &other.cursor) {
			(Some(a), Some(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl<V: Clone + 'static> Context<V> {
	/// Returns a copy that is not tied to a running resolution.
	///
	/// [`Context::next`] on a detached context always reports no match.
	pub fn detached(&self) -> Self {
		let mut context = self.clone();
		context.cursor = None;
		context
	}

	/// Returns the resolver running this context's resolution.
	pub fn resolver(&self) -> Option<Resolver<V>> {
		self.cursor.as_ref().map(|cursor| cursor.resolver.clone())
	}

	/// Resolves the next matching route below the current one.
	///
	/// Returns `None` when no further descendant matches.
	pub async fn next(&self) -> Result<Option<Context<V>>, RouterError> {
		let Some(cursor) = &self.cursor else {
			return Ok(None);
		};
		Rc::clone(cursor).advance(false, None, false).await
	}

	/// Resolves the next match that descends from `parent`.
	///
	/// With `skip_current`, the subtree of the most recently matched route
	/// is not entered.
	pub async fn next_within(
		&self,
		parent: RouteId,
		skip_current: bool,
	) -> Result<Option<Context<V>>, RouterError> {
		let Some(cursor) = &self.cursor else {
			return Ok(None);
		};
		Rc::clone(cursor)
			.advance(false, Some(parent), skip_current)
			.await
	}

	/// Records `element` as the view of `self.route` in the chain.
	///
	/// Contexts derived later from the same resolution see the element too.
	pub fn set_element(&mut self, element: V) {
		let route = self.route;
		if let Some(item) = self.chain.iter_mut().find(|item| item.route == route) {
			item.element = Some(element.clone());
		}
		if let Some(cursor) = &self.cursor {
			if let Some(item) = cursor
				.latest
				.borrow_mut()
				.chain
				.iter_mut()
				.find(|item| item.route == route)
			{
				item.element = Some(element);
			}
		}
	}
}

/// Commands available to a route action.
pub struct Commands<V> {
	from: String,
	params: Params,
	factory: Option<ComponentFactory<V>>,
}

impl<V> Clone for Commands<V> {
	fn clone(&self) -> Self {
		Self {
			from: self.from.clone(),
			params: self.params.clone(),
			factory: self.factory.clone(),
		}
	}
}

impl<V> fmt::Debug for Commands<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Commands")
			.field("from", &self.from)
			.field("has_factory", &self.factory.is_some())
			.finish()
	}
}

impl<V> Commands<V> {
	/// Creates commands for the given context.
	pub fn new(context: &Context<V>) -> Self {
		Self {
			from: context.pathname.clone(),
			params: context.params.clone(),
			factory: None,
		}
	}

	/// Enables [`Commands::component`].
	pub fn with_component_factory(mut self, factory: ComponentFactory<V>) -> Self {
		self.factory = Some(factory);
		self
	}

	/// Builds a redirect instruction carrying the current parameters.
	pub fn redirect_to(&self, pathname: impl Into<String>) -> Redirect {
		Redirect {
			from: self.from.clone(),
			params: self.params.clone(),
			pathname: pathname.into(),
		}
	}

	/// Redirects to `pathname`.
	pub fn redirect(&self, pathname: impl Into<String>) -> ActionResult<V> {
		ActionResult::Redirect(self.redirect_to(pathname))
	}

	/// Creates the view registered for `component`.
	pub fn component(&self, component: &str) -> Result<ActionResult<V>, RouterError> {
		let factory = self.factory.as_ref().ok_or_else(|| {
			RouterError::action(format!(
				"Cannot create component \"{}\": no component factory",
				component
			))
		})?;
		factory(component).map(ActionResult::View)
	}
}

struct Cursor<V> {
	resolver: Resolver<V>,
	base: Context<V>,
	matcher: RefCell<RouteMatcher>,
	current: RefCell<Option<MatchResult>>,
	stashed: RefCell<Option<Option<MatchResult>>>,
	latest: RefCell<Context<V>>,
}

impl<V: Clone + 'static> Cursor<V> {
	async fn advance(
		self: Rc<Self>,
		resume: bool,
		parent: Option<RouteId>,
		skip_current: bool,
	) -> Result<Option<Context<V>>, RouterError> {
		let parent = parent.or_else(|| self.current_route());
		let mut skip_current = skip_current;

		loop {
			let skip = if skip_current {
				self.current_route()
			} else {
				None
			};
			let stashed = self.stashed.borrow_mut().take();
			let matched = match stashed {
				Some(matched) => matched,
				None => self
					.resolver
					.next_match(&mut self.matcher.borrow_mut(), skip)?,
			};
			*self.current.borrow_mut() = matched.clone();

			if !resume {
				let within = matched.as_ref().is_some_and(|matched| {
					self.resolver
						.with_tree(|tree| tree.is_descendant(matched.route, parent))
				});
				if !within {
					*self.stashed.borrow_mut() = Some(matched);
					return Ok(None);
				}
			}

			let Some(matched) = matched else {
				return Err(self.resolver.not_found(&self.base));
			};

			let mut context = self.base.clone();
			context.params = matched.params.clone();
			context.route = matched.route;
			context.chain = self.latest.borrow().chain.clone();
			self.resolver.update_chain(&mut context.chain, &matched);
			*self.latest.borrow_mut() = context.clone();
			context.cursor = Some(Rc::clone(&self));

			tracing::debug!(
				pathname = %context.pathname,
				matched = %matched.path,
				"resolving route"
			);
			let resolve_route = self.resolver.resolve_route_fn();
			let settled = match resolve_route(context).await? {
				ActionResult::View(view) => Resolved::View(view),
				ActionResult::Redirect(redirect) => Resolved::Redirect(redirect),
				ActionResult::Done => Resolved::Done,
				ActionResult::Next(next) => match next.result {
					Some(result) => result,
					None => {
						skip_current = false;
						continue;
					}
				},
				ActionResult::Continue | ActionResult::NotFound => {
					skip_current = false;
					continue;
				}
				ActionResult::Skip => {
					skip_current = true;
					continue;
				}
			};

			let mut context = self.latest.borrow().clone();
			context.result = Some(settled);
			*self.latest.borrow_mut() = context.clone();
			*self.resolver.inner.context.borrow_mut() = context.clone();
			context.cursor = Some(Rc::clone(&self));
			return Ok(Some(context));
		}
	}

	fn current_route(&self) -> Option<RouteId> {
		self.current.borrow().as_ref().map(|matched| matched.route)
	}
}

/// Configuration of a [`Resolver`].
pub struct ResolverOptions<V> {
	/// Base URL all routes are relative to.
	pub base_url: Option<String>,
	/// URL a relative base URL is resolved against.
	pub document_url: String,
	/// Fallback for failed resolutions.
	pub error_handler: Option<ErrorHandler<V>>,
	/// Strategy resolving a single route; defaults to running its action.
	pub resolve_route: Option<ResolveRouteFn<V>>,
	/// Capacity of the compiled pattern cache.
	pub cache_capacity: usize,
}

impl<V> Default for ResolverOptions<V> {
	fn default() -> Self {
		Self {
			base_url: None,
			document_url: DEFAULT_DOCUMENT_URL.to_string(),
			error_handler: None,
			resolve_route: None,
			cache_capacity: DEFAULT_CACHE_CAPACITY,
		}
	}
}

impl<V> fmt::Debug for ResolverOptions<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolverOptions")
			.field("base_url", &self.base_url)
			.field("document_url", &self.document_url)
			.field("has_error_handler", &self.error_handler.is_some())
			.field("has_resolve_route", &self.resolve_route.is_some())
			.field("cache_capacity", &self.cache_capacity)
			.finish()
	}
}

impl<V> ResolverOptions<V> {
	/// Sets the base URL.
	pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = Some(base_url.into());
		self
	}

	/// Sets the URL a relative base URL is resolved against.
	pub fn document_url(mut self, document_url: impl Into<String>) -> Self {
		self.document_url = document_url.into();
		self
	}

	/// Sets the error handler.
	pub fn error_handler<F>(mut self, handler: F) -> Self
	where
		F: Fn(&RouterError) -> Option<Resolved<V>> + 'static,
	{
		self.error_handler = Some(Rc::new(handler));
		self
	}

	/// Replaces the route resolution strategy.
	pub fn resolve_route(mut self, resolve_route: ResolveRouteFn<V>) -> Self {
		self.resolve_route = Some(resolve_route);
		self
	}

	/// Sets the capacity of the compiled pattern cache.
	pub fn cache_capacity(mut self, capacity: usize) -> Self {
		self.cache_capacity = capacity;
		self
	}
}

struct ResolverInner<V> {
	tree: RefCell<RouteTree<V>>,
	cache: RefCell<PatternCache>,
	base_url: Option<String>,
	effective_base: Option<String>,
	context: RefCell<Context<V>>,
	error_handler: Option<ErrorHandler<V>>,
	resolve_route: RefCell<ResolveRouteFn<V>>,
}

/// Resolves pathnames against a route tree.
pub struct Resolver<V> {
	inner: Rc<ResolverInner<V>>,
}

impl<V> Clone for Resolver<V> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<V> fmt::Debug for Resolver<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Resolver")
			.field("base_url", &self.inner.base_url)
			.field("tree", &*self.inner.tree.borrow())
			.finish()
	}
}

/// Resolves `base_url` against `document_url` and drops its last segment.
fn effective_base_url(base_url: &str, document_url: &str) -> Result<String, RouterError> {
	let url = Url::parse(document_url)
		.and_then(|document| document.join(base_url))
		.map_err(|_| RouterError::InvalidBaseUrl(base_url.to_string()))?;
	let href = url.as_str();
	let end = href.rfind('/').map_or(0, |index| index + 1);
	Ok(href[..end].to_string())
}

/// Prefixes an app-relative pathname with the effective base URL's path.
pub(crate) fn rebase(pathname: &str, effective_base: Option<&str>) -> String {
	let Some(base) = effective_base else {
		return pathname.to_string();
	};
	Url::parse(base)
		.and_then(|base| base.join(pathname.strip_prefix('/').unwrap_or(pathname)))
		.map(|url| url.path().to_string())
		.unwrap_or_else(|_| pathname.to_string())
}

fn default_resolve_route<V: Clone + 'static>() -> ResolveRouteFn<V> {
	Rc::new(|context: Context<V>| -> ActionFuture<V> {
		Box::pin(async move {
			let Some(resolver) = context.resolver() else {
				return Ok(ActionResult::Continue);
			};
			resolver.load_children(&context).await?;

			let action = resolver.with_tree(|tree| {
				tree.get(context.route)
					.and_then(|node| node.route().action_fn().cloned())
			});
			match action {
				Some(action) => {
					let commands = Commands::new(&context);
					action(context, commands).await
				}
				None => Ok(ActionResult::Continue),
			}
		})
	})
}

impl<V: Clone + 'static> Resolver<V> {
	/// Creates a resolver for `routes`.
	pub fn new(
		routes: impl IntoIterator<Item = Route<V>>,
		options: ResolverOptions<V>,
	) -> Result<Self, RouterError> {
		let effective_base = match options.base_url.as_deref() {
			Some(base) if !base.is_empty() => {
				Some(effective_base_url(base, &options.document_url)?)
			}
			_ => None,
		};

		let tree = RouteTree::new();
		let root = tree.root();
		let resolver = Self {
			inner: Rc::new(ResolverInner {
				tree: RefCell::new(tree),
				cache: RefCell::new(PatternCache::new(options.cache_capacity)),
				base_url: options.base_url.filter(|base| !base.is_empty()),
				effective_base,
				context: RefCell::new(Context::seed(root, ResolveRequest::default())),
				error_handler: options.error_handler,
				resolve_route: RefCell::new(
					options.resolve_route.unwrap_or_else(default_resolve_route),
				),
			}),
		};
		resolver.set_routes(routes)?;
		Ok(resolver)
	}

	/// Resolves a pathname (or request) into a settled context.
	///
	/// Fails with [`RouterError::NotFound`] when no route settles. Any other
	/// failure is wrapped in [`RouterError::Resolution`]. Either is handed to
	/// the error handler first, which may substitute a result.
	pub async fn resolve(
		&self,
		request: impl Into<ResolveRequest>,
	) -> Result<Context<V>, RouterError> {
		let request = request.into();
		let root = self.root();
		let base = Context::seed(root, request);
		let pathname = self
			.normalize_pathname(&base.pathname)
			.unwrap_or_else(|| base.pathname.clone());

		tracing::debug!(pathname = %base.pathname, render_id = base.render_id, "resolve");

		let cursor = Rc::new(Cursor {
			resolver: self.clone(),
			matcher: RefCell::new(RouteMatcher::new(
				root,
				pathname,
				self.inner.base_url.is_some(),
				Vec::new(),
				Params::new(),
			)),
			current: RefCell::new(None),
			stashed: RefCell::new(None),
			latest: RefCell::new(base.clone()),
			base,
		});

		let outcome = match Rc::clone(&cursor).advance(true, Some(root), false).await {
			Ok(Some(context)) => return Ok(context),
			Ok(None) => self.not_found(&cursor.base),
			Err(error) => error,
		};

		let error = if outcome.is_not_found() {
			outcome
		} else {
			let latest = cursor.latest.borrow();
			let route_path = self.with_tree(|tree| tree.path(latest.route).to_string());
			RouterError::Resolution {
				pathname: latest.pathname.clone(),
				route_path: Some(route_path),
				source: Box::new(outcome),
			}
		};
		tracing::debug!(error = %error, "resolution failed");

		if let Some(handler) = &self.inner.error_handler {
			if let Some(result) = handler(&error) {
				let mut context = cursor.latest.borrow().clone();
				context.result = Some(result);
				context.recovered = true;
				context.cursor = Some(Rc::clone(&cursor));
				return Ok(context);
			}
		}
		Err(error)
	}

	/// Replaces the routing config.
	pub fn set_routes(&self, routes: impl IntoIterator<Item = Route<V>>) -> Result<(), RouterError> {
		let routes = validated(routes)?;
		let root = self.root();
		self.inner.tree.borrow_mut().set_children(root, routes);
		Ok(())
	}

	/// Appends routes to the routing config, returning the effective config.
	pub fn add_routes(
		&self,
		routes: impl IntoIterator<Item = Route<V>>,
	) -> Result<Vec<Route<V>>, RouterError> {
		let routes = validated(routes)?;
		let root = self.root();
		self.inner.tree.borrow_mut().append_children(root, routes);
		Ok(self.get_routes())
	}

	/// Returns a copy of the routing config.
	pub fn get_routes(&self) -> Vec<Route<V>> {
		self.with_tree(|tree| {
			tree.children(tree.root())
				.iter()
				.filter_map(|id| tree.export(*id))
				.collect()
		})
	}

	/// Removes every route.
	pub fn remove_routes(&self) {
		let root = self.root();
		self.inner.tree.borrow_mut().set_children(root, Vec::new());
	}

	/// Runs the lazy children function of `context.route`, if any, and
	/// replaces the route's children with its result.
	///
	/// Children declared the same way as the loaded ones keep their handles,
	/// so views built for them can be reused.
	pub async fn load_children(&self, context: &Context<V>) -> Result<(), RouterError> {
		let children_fn = self.with_tree(|tree| {
			tree.get(context.route)
				.and_then(|node| node.route().children_fn().cloned())
		});
		let Some(children_fn) = children_fn else {
			return Ok(());
		};

		let children = validated(children_fn(context.detached()).await?)?;
		let replaced = self
			.inner
			.tree
			.borrow_mut()
			.refresh_children(context.route, children);
		if replaced {
			tracing::debug!(route = ?context.route, "lazy children replaced");
		}
		Ok(())
	}
}

impl<V> Resolver<V> {
	/// Returns the synthetic root route.
	pub fn root(&self) -> RouteId {
		self.inner.tree.borrow().root()
	}

	/// Runs `f` with shared access to the route tree.
	pub fn with_tree<R>(&self, f: impl FnOnce(&RouteTree<V>) -> R) -> R {
		f(&self.inner.tree.borrow())
	}

	/// Returns the configured base URL.
	pub fn base_url(&self) -> Option<&str> {
		self.inner.base_url.as_deref()
	}

	/// Returns the base URL resolved against the document URL, ending in `/`.
	pub fn effective_base_url(&self) -> Option<&str> {
		self.inner.effective_base.as_deref()
	}

	/// Replaces the route resolution strategy.
	pub fn set_resolve_route(&self, resolve_route: ResolveRouteFn<V>) {
		*self.inner.resolve_route.borrow_mut() = resolve_route;
	}

	fn resolve_route_fn(&self) -> ResolveRouteFn<V> {
		Rc::clone(&self.inner.resolve_route.borrow())
	}

	fn next_match(
		&self,
		matcher: &mut RouteMatcher,
		skip: Option<RouteId>,
	) -> Result<Option<MatchResult>, RouterError> {
		let tree = self.inner.tree.borrow();
		let mut cache = self.inner.cache.borrow_mut();
		Ok(matcher.next(&tree, &mut cache, skip)?)
	}

	/// Appends `matched` to `chain`, first dropping every trailing item that
	/// is not its parent.
	fn update_chain(&self, chain: &mut Vec<ChainItem<V>>, matched: &MatchResult) {
		let tree = self.inner.tree.borrow();
		let Some(node) = tree.get(matched.route) else {
			return;
		};
		if node.is_synthetic() {
			return;
		}
		if let Some(parent) = node.parent() {
			while chain.last().is_some_and(|item| item.route != parent) {
				chain.pop();
			}
		}
		chain.push(ChainItem {
			path: matched.path.clone(),
			route: matched.route,
			element: None,
		});
	}

	/// Strips the base URL from `pathname`.
	///
	/// Returns `None` when the pathname lies outside the base URL.
	pub fn normalize_pathname(&self, pathname: &str) -> Option<String> {
		let Some(base) = self.inner.effective_base.as_deref() else {
			return Some(pathname.to_string());
		};
		let base_url = Url::parse(base).ok()?;
		let url = if pathname.starts_with('/') {
			base_url.join(pathname)
		} else {
			base_url.join(&format!("./{}", pathname))
		}
		.ok()?;
		url.as_str().strip_prefix(base).map(str::to_string)
	}

	/// Prefixes an app-relative pathname with the base URL's path.
	pub fn pathname_for_router(&self, pathname: &str) -> String {
		rebase(pathname, self.inner.effective_base.as_deref())
	}

	/// Builds a URL from a path pattern and parameters.
	pub fn url_for_path(&self, pattern: &str, params: &Params) -> Result<String, RouterError> {
		let path = compile(pattern)?.build(params)?;
		Ok(self.pathname_for_router(&path))
	}

	/// Snapshot of `context` for error reporting.
	pub fn error_context(&self, context: &Context<V>) -> ErrorContext {
		ErrorContext {
			pathname: context.pathname.clone(),
			search: context.search.clone(),
			hash: context.hash.clone(),
			params: context.params.clone(),
			route: self.with_tree(|tree| tree.info(context.route)),
		}
	}

	/// Not-found error for `context`.
	pub fn not_found(&self, context: &Context<V>) -> RouterError {
		RouterError::not_found(self.error_context(context))
	}

	/// Location of a request without any matched route.
	pub fn request_location(&self, request: &ResolveRequest) -> Location {
		Location {
			base_url: self.inner.base_url.clone().unwrap_or_default(),
			pathname: request.pathname.clone(),
			search: request.search.clone(),
			hash: request.hash.clone(),
			redirect_from: request.redirect_from.clone(),
			effective_base: self.inner.effective_base.clone(),
			..Default::default()
		}
	}

	/// Builds the public location for a settled context.
	///
	/// `route` overrides the deepest route of the chain.
	pub fn create_location(&self, context: &Context<V>, route: Option<RouteId>) -> Location {
		self.with_tree(|tree| {
			let routes: Vec<_> = context
				.chain
				.iter()
				.filter_map(|item| tree.info(item.route))
				.collect();
			let route = route
				.and_then(|route| tree.info(route))
				.or_else(|| routes.last().cloned());
			let template = join_paths(context.chain.iter().map(|item| tree.path(item.route)));

			Location {
				base_url: self.inner.base_url.clone().unwrap_or_default(),
				pathname: context.pathname.clone(),
				search: context.search.clone(),
				hash: context.hash.clone(),
				params: context.params.clone(),
				redirect_from: context.redirect_from.clone(),
				route,
				routes,
				template: Some(template),
				effective_base: self.inner.effective_base.clone(),
			}
		})
	}
}

impl<V: Clone> Resolver<V> {
	/// Returns the last settled context, detached from its resolution.
	pub fn context(&self) -> Context<V> {
		let mut context = self.inner.context.borrow().clone();
		context.cursor = None;
		context
	}
}

fn validated<V>(routes: impl IntoIterator<Item = Route<V>>) -> Result<Vec<Route<V>>, RouterError> {
	let routes: Vec<Route<V>> = routes.into_iter().collect();
	for route in &routes {
		route.validate()?;
	}
	Ok(routes)
}
