//! Router state and public API.

use super::triggers::{NavigationTrigger, default_triggers};
use crate::dom::Element;
use crate::events::{self, NavigationDetail, RouterEvent, Subscription};
use crate::spawn::spawn_local;
use crate::view::{ComponentRegistry, View};
use crate::window::{self, WindowLocation};
use futures::future::{self, FutureExt, LocalBoxFuture, Shared};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use url::Url;
use wayfinder_urls::{
	Context, DEFAULT_CACHE_CAPACITY, ErrorHandler, Location, Params, ResolveRequest, Resolved,
	Resolver, ResolverOptions, Route, RouterError, UrlGenerator, UrlGeneratorOptions,
};

/// Redirects followed within one render cycle before giving up.
pub const MAX_REDIRECT_COUNT: u32 = 256;

/// Future of a render cycle, resolving to the router's location once the
/// cycle settles.
pub type RenderFuture = LocalBoxFuture<'static, Result<Location, RouterError>>;

/// A context that passed its guards and is ready to be mounted.
#[derive(Clone)]
pub(super) struct Rendered {
	pub(super) context: Context<View>,
	/// First chain position whose view is not reused.
	pub(super) diverged: usize,
	/// Whether the whole chain is reused and the DOM stays untouched.
	pub(super) skip_attach: bool,
}

impl Rendered {
	pub(super) fn result_view(&self) -> Option<&View> {
		self.context.result.as_ref().and_then(Resolved::view)
	}
}

#[derive(Default)]
pub(super) struct RenderState {
	pub(super) location: Location,
	pub(super) previous: Option<Rendered>,
	pub(super) appearing: Option<Vec<Element>>,
	pub(super) disappearing: Option<Vec<Element>>,
	/// Elements the router attached.
	pub(super) mounted: Vec<Element>,
	/// Elements the router created, with their component identifier.
	pub(super) created: Vec<(Element, String)>,
}

impl RenderState {
	pub(super) fn component_of(&self, element: &Element) -> Option<&str> {
		self.created
			.iter()
			.find(|(created, _)| created == element)
			.map(|(_, component)| component.as_str())
	}

	/// Forgets elements that are neither attached under `outlet` nor part of
	/// the previous render.
	pub(super) fn prune(&mut self, outlet: Option<&Element>) {
		self.mounted
			.retain(|element| outlet.is_some_and(|outlet| is_attached_under(element, outlet)));

		let mut rendered: Vec<Element> = Vec::new();
		if let Some(previous) = &self.previous {
			rendered.extend(
				previous
					.context
					.chain
					.iter()
					.filter_map(|item| item.element.as_ref())
					.map(|view| view.element().clone()),
			);
			if let Some(view) = previous.result_view() {
				rendered.push(view.element().clone());
			}
		}
		let mounted = &self.mounted;
		self.created
			.retain(|(element, _)| mounted.contains(element) || rendered.contains(element));
	}
}

fn is_attached_under(element: &Element, ancestor: &Element) -> bool {
	let mut current = element.parent();
	while let Some(node) = current {
		if &node == ancestor {
			return true;
		}
		current = node.parent();
	}
	false
}

pub(super) struct RouterInner {
	pub(super) resolver: Resolver<View>,
	pub(super) registry: ComponentRegistry,
	pub(super) outlet: RefCell<Option<Element>>,
	pub(super) state: RefCell<RenderState>,
	pub(super) last_started_render: Cell<u64>,
	ready: RefCell<Shared<RenderFuture>>,
	url_generator: RefCell<Option<Rc<UrlGenerator<View>>>>,
	triggers: RefCell<Vec<Box<dyn NavigationTrigger>>>,
	subscription: RefCell<Option<Subscription>>,
}

/// Options for [`Router::new`].
pub struct RouterOptions {
	/// Base URL of the application. Defaults to the document's
	/// `<base href>`, if any.
	pub base_url: Option<String>,
	/// Fallback for failed resolutions.
	pub error_handler: Option<ErrorHandler<View>>,
	/// Views for component identifiers.
	pub registry: ComponentRegistry,
	/// Navigation triggers; click and popstate when `None`.
	pub triggers: Option<Vec<Box<dyn NavigationTrigger>>>,
	/// Capacity of the compiled pattern cache.
	pub cache_capacity: usize,
}

impl Default for RouterOptions {
	fn default() -> Self {
		Self {
			base_url: None,
			error_handler: None,
			registry: ComponentRegistry::default(),
			triggers: None,
			cache_capacity: DEFAULT_CACHE_CAPACITY,
		}
	}
}

impl fmt::Debug for RouterOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouterOptions")
			.field("base_url", &self.base_url)
			.field("has_error_handler", &self.error_handler.is_some())
			.field("registry", &self.registry)
			.field(
				"triggers",
				&self
					.triggers
					.as_ref()
					.map(|triggers| triggers.iter().map(|t| t.name()).collect::<Vec<_>>()),
			)
			.field("cache_capacity", &self.cache_capacity)
			.finish()
	}
}

impl RouterOptions {
	/// Sets the base URL.
	pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = Some(base_url.into());
		self
	}

	/// Sets the error handler.
	pub fn error_handler<F>(mut self, handler: F) -> Self
	where
		F: Fn(&RouterError) -> Option<Resolved<View>> + 'static,
	{
		self.error_handler = Some(Rc::new(handler));
		self
	}

	/// Sets the component registry.
	pub fn registry(mut self, registry: ComponentRegistry) -> Self {
		self.registry = registry;
		self
	}

	/// Sets the navigation triggers.
	pub fn triggers(mut self, triggers: Vec<Box<dyn NavigationTrigger>>) -> Self {
		self.triggers = Some(triggers);
		self
	}

	/// Sets the capacity of the compiled pattern cache.
	pub fn cache_capacity(mut self, capacity: usize) -> Self {
		self.cache_capacity = capacity;
		self
	}
}

/// Renders the route chain matching the window location into an outlet.
///
/// Clones share the same router.
#[derive(Clone)]
pub struct Router {
	pub(super) inner: Rc<RouterInner>,
}

impl fmt::Debug for Router {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("base_url", &self.inner.resolver.base_url())
			.field("location", &self.inner.state.borrow().location.pathname)
			.field("outlet", &*self.inner.outlet.borrow())
			.field("last_started_render", &self.inner.last_started_render.get())
			.finish()
	}
}

/// Resolves `href` against the document URL and drops its last segment.
fn base_url_from_href(href: &str) -> Option<String> {
	if href.is_empty() {
		return None;
	}
	let url = Url::parse(&window::document_url())
		.and_then(|document| document.join(href))
		.ok()?;
	let href = url.as_str();
	let end = href.rfind('/').map_or(0, |index| index + 1);
	Some(href[..end].to_string())
}

impl Router {
	/// Creates a router rendering into `outlet`, activates its navigation
	/// triggers and subscribes it to navigation requests.
	///
	/// The router renders nothing until routes are set.
	pub fn new(outlet: Option<Element>, options: RouterOptions) -> Result<Self, RouterError> {
		let base_url = options
			.base_url
			.or_else(|| window::base_href().and_then(|href| base_url_from_href(&href)));

		let mut resolver_options = ResolverOptions::default()
			.document_url(window::document_url())
			.cache_capacity(options.cache_capacity);
		if let Some(base_url) = base_url {
			resolver_options = resolver_options.base_url(base_url);
		}
		resolver_options.error_handler = options.error_handler;
		let resolver = Resolver::new(Vec::<Route<View>>::new(), resolver_options)?;

		let location = resolver.request_location(&ResolveRequest::default());
		let router = Self {
			inner: Rc::new(RouterInner {
				resolver,
				registry: options.registry,
				outlet: RefCell::new(None),
				state: RefCell::new(RenderState {
					location: location.clone(),
					..Default::default()
				}),
				last_started_render: Cell::new(0),
				ready: RefCell::new(settled(Ok(location))),
				url_generator: RefCell::new(None),
				triggers: RefCell::new(Vec::new()),
				subscription: RefCell::new(None),
			}),
		};
		router
			.inner
			.resolver
			.set_resolve_route(router.resolve_route_strategy());
		router.set_triggers(options.triggers.unwrap_or_else(default_triggers));
		router.set_outlet(outlet)?;
		router.subscribe();
		crate::debug_log!("router created, base url {:?}", router.base_url());
		Ok(router)
	}

	/// The resolver backing this router.
	pub fn resolver(&self) -> &Resolver<View> {
		&self.inner.resolver
	}

	/// The configured base URL.
	pub fn base_url(&self) -> Option<&str> {
		self.inner.resolver.base_url()
	}

	/// Where the router currently is.
	pub fn location(&self) -> Location {
		self.inner.state.borrow().location.clone()
	}

	/// The element routes are rendered into.
	pub fn outlet(&self) -> Option<Element> {
		self.inner.outlet.borrow().clone()
	}

	/// Sets the element routes are rendered into.
	///
	/// Content already in the outlet stays until a render replaces it.
	pub fn set_outlet(&self, outlet: Option<Element>) -> Result<(), RouterError> {
		if let Some(outlet) = &outlet {
			if !outlet.is_container() {
				return Err(RouterError::InvalidOutlet(outlet.node_name()));
			}
		}
		*self.inner.outlet.borrow_mut() = outlet;
		Ok(())
	}

	/// Future of the current render cycle, or of the last one when none is
	/// in progress.
	pub fn ready(&self) -> RenderFuture {
		self.inner.ready.borrow().clone().boxed_local()
	}

	/// Starts a render cycle for `request`.
	///
	/// With `update_history`, a history entry is pushed for the settled
	/// location (replaced on the first render). The returned future fails
	/// when no route matches. A cycle superseded by a newer one leaves the
	/// outlet alone and resolves to the router's location at the time it
	/// settles.
	pub fn render(&self, request: impl Into<ResolveRequest>, update_history: bool) -> RenderFuture {
		let render_id = self.inner.last_started_render.get() + 1;
		self.inner.last_started_render.set(render_id);
		let request = request.into().render_id(render_id);
		crate::debug_log!("render {} started for {}", render_id, request.pathname);

		let router = self.clone();
		let render = async move { router.do_render(request, update_history).await }
			.boxed_local()
			.shared();
		*self.inner.ready.borrow_mut() = render.clone();
		render.boxed_local()
	}

	/// Replaces the route config and, unless `skip_render`, renders the
	/// window location with it.
	///
	/// Fails right away when a route is invalid.
	pub fn set_routes(
		&self,
		routes: impl IntoIterator<Item = Route<View>>,
		skip_render: bool,
	) -> Result<RenderFuture, RouterError> {
		self.inner.resolver.set_routes(routes)?;
		self.inner.state.borrow_mut().previous = None;
		*self.inner.url_generator.borrow_mut() = None;
		if !skip_render {
			self.navigate(NavigationDetail::from(&window::location()));
		}
		Ok(self.ready())
	}

	/// Appends routes to the config, returning the effective config.
	pub fn add_routes(
		&self,
		routes: impl IntoIterator<Item = Route<View>>,
	) -> Result<Vec<Route<View>>, RouterError> {
		self.inner.resolver.add_routes(routes)
	}

	/// A copy of the route config.
	pub fn get_routes(&self) -> Vec<Route<View>> {
		self.inner.resolver.get_routes()
	}

	/// Removes every route.
	pub fn remove_routes(&self) {
		self.inner.resolver.remove_routes();
	}

	/// URL of the route named `name`, or of the route rendering the
	/// component `name`.
	pub fn url_for_name(&self, name: &str, params: Option<&Params>) -> Result<String, RouterError> {
		let generator = Rc::clone(self.inner.url_generator.borrow_mut().get_or_insert_with(|| {
			Rc::new(UrlGenerator::new(
				self.inner.resolver.clone(),
				UrlGeneratorOptions::default().component_names(true),
			))
		}));
		generator.url_for(name, params)
	}

	/// URL of the path pattern `path` with `params` substituted.
	pub fn url_for_path(&self, path: &str, params: Option<&Params>) -> Result<String, RouterError> {
		let empty = Params::new();
		self.inner
			.resolver
			.url_for_path(path, params.unwrap_or(&empty))
	}

	/// Subscribes the router to navigation requests.
	pub fn subscribe(&self) {
		if self.inner.subscription.borrow().is_some() {
			return;
		}
		let router = Rc::downgrade(&self.inner);
		let subscription = events::subscribe(move |event| {
			let Some(inner) = router.upgrade() else {
				return;
			};
			if let RouterEvent::Go(detail) = event.event() {
				if (Router { inner }).navigate(detail.clone()) {
					event.prevent_default();
				}
			}
		});
		*self.inner.subscription.borrow_mut() = Some(subscription);
	}

	/// Stops listening to navigation requests.
	pub fn unsubscribe(&self) {
		self.inner.subscription.borrow_mut().take();
	}

	/// Replaces the navigation triggers, deactivating the current ones
	/// first.
	pub fn set_triggers(&self, triggers: Vec<Box<dyn NavigationTrigger>>) {
		let mut current = self.inner.triggers.borrow_mut();
		for trigger in current.iter_mut() {
			trigger.inactivate();
		}
		*current = triggers;
		for trigger in current.iter_mut() {
			trigger.activate();
		}
	}

	/// Requests navigation to `path`, resolved against the root.
	///
	/// Returns whether a subscribed router handled the request. The
	/// navigation itself completes asynchronously.
	pub fn go(path: &str) -> bool {
		match Url::parse("http://a").and_then(|base| base.join(path)) {
			Ok(url) => events::dispatch(RouterEvent::Go(NavigationDetail::from(
				&WindowLocation::from_url(&url),
			))),
			Err(error) => {
				crate::warn_log!("cannot navigate to \"{}\": {}", path, error);
				false
			}
		}
	}

	/// Starts a history-updating render for `detail` when its pathname
	/// lies under the base URL.
	fn navigate(&self, detail: NavigationDetail) -> bool {
		if self
			.inner
			.resolver
			.normalize_pathname(&detail.pathname)
			.is_none()
		{
			crate::debug_log!("ignoring navigation outside the base url: {}", detail.pathname);
			return false;
		}
		let render = self.render(detail, true);
		spawn_local(async move {
			let _ = render.await;
		});
		true
	}

	pub(super) fn is_latest(&self, render_id: u64) -> bool {
		render_id == self.inner.last_started_render.get()
	}

	/// Records `rendered` as the settled render.
	pub(super) fn settle(&self, rendered: Rendered) {
		let outlet = self.outlet();
		let mut state = self.inner.state.borrow_mut();
		state.previous = Some(rendered);
		state.prune(outlet.as_ref());
	}
}

fn settled(result: Result<Location, RouterError>) -> Shared<RenderFuture> {
	future::ready(result).boxed_local().shared()
}
