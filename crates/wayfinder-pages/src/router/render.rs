//! The render cycle: resolution, chain completion, redirects and the
//! resolve strategy routes are run with.

use super::core::{MAX_REDIRECT_COUNT, Rendered, Router};
use super::history;
use crate::events::{self, NavigationDetail, RouterEvent};
use crate::view::View;
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use wayfinder_urls::{
	ActionFuture, ActionResult, ChainItem, Commands, ComponentFactory, Context, Location, Redirect,
	ResolveRequest, ResolveRouteFn, Resolved, RouterError, join_paths,
};

/// Outcome of chain completion and guards.
pub(super) enum Settled {
	Render(Rendered),
	/// A guard prevented the navigation; the previous render stays.
	Cancelled,
}

/// Outcome of the `on_before_*` guards.
pub(super) enum Amended {
	Proceed(Rendered),
	Cancelled,
	Redirected(Context<View>),
}

enum NextContext {
	/// The context already consumes the whole pathname.
	Same,
	/// A deeper match was resolved.
	Deeper(Context<View>),
	None,
}

impl Router {
	pub(super) async fn do_render(
		self,
		request: ResolveRequest,
		update_history: bool,
	) -> Result<Location, RouterError> {
		let render_id = request.render_id;
		match self.render_cycle(request.clone(), update_history).await {
			Ok(Some(location)) => Ok(location),
			Ok(None) => Ok(self.location()),
			Err(error) if self.is_latest(render_id) => {
				self.fail(&request, update_history, &error);
				Err(error)
			}
			// A newer render owns the outlet now.
			Err(_) => Ok(self.location()),
		}
	}

	/// Returns `None` when the cycle settled without changing the location.
	async fn render_cycle(
		&self,
		request: ResolveRequest,
		update_history: bool,
	) -> Result<Option<Location>, RouterError> {
		let render_id = request.render_id;
		let context = self.inner.resolver.resolve(request).await?;
		let settled = self.fully_resolve_chain(context.clone(), context).await?;
		if !self.is_latest(render_id) {
			return Ok(None);
		}

		let mut rendered = match settled {
			Settled::Render(rendered) => rendered,
			Settled::Cancelled => {
				let previous = self.inner.state.borrow().previous.clone();
				if let Some(previous) = previous {
					history::update_from_context(&previous.context, true)?;
				}
				crate::debug_log!("render {} cancelled", render_id);
				return Ok(None);
			}
		};

		let location = self.inner.resolver.create_location(&rendered.context, None);
		self.inner.state.borrow_mut().location = location.clone();
		if update_history {
			history::update_from_context(&rendered.context, render_id == 1)?;
		}
		events::dispatch(RouterEvent::LocationChanged(location.clone()));

		if rendered.skip_attach {
			self.copy_unchanged_elements(&mut rendered);
			self.settle(rendered);
			return Ok(Some(location));
		}

		self.add_appearing_content(&mut rendered)?;
		let animation = self.animate_if_needed(&rendered);
		self.run_on_after_enter_callbacks(&rendered);
		self.run_on_after_leave_callbacks(&rendered);
		animation.await;

		if self.is_latest(render_id) {
			self.remove_disappearing_content();
			self.settle(rendered);
			crate::debug_log!("render {} settled at {}", render_id, location.pathname);
			return Ok(Some(location));
		}
		Ok(None)
	}

	/// Clears the outlet and publishes `error` for the latest render.
	fn fail(&self, request: &ResolveRequest, update_history: bool, error: &RouterError) {
		crate::error_log!("render of {} failed: {}", request.pathname, error);
		if update_history {
			let context = self.inner.resolver.context();
			if !context.pathname.is_empty() {
				if let Err(history_error) = history::update_from_context(&context, false) {
					crate::warn_log!("failed to update history: {}", history_error);
				}
			}
		}
		if let Some(outlet) = self.outlet() {
			outlet.clear_children();
		}
		{
			let outlet = self.outlet();
			let mut state = self.inner.state.borrow_mut();
			state.location = self.inner.resolver.request_location(request);
			state.previous = None;
			state.appearing = None;
			state.disappearing = None;
			state.prune(outlet.as_ref());
		}
		events::dispatch(RouterEvent::Error {
			error: error.clone(),
			navigation: NavigationDetail {
				pathname: request.pathname.clone(),
				search: request.search.clone(),
				hash: request.hash.clone(),
			},
		});
	}

	/// Extends `before` down to the deepest match consuming the whole
	/// pathname, following redirects, then runs the guards.
	///
	/// `top` is the topmost context of the chain, reported on not-found.
	pub(super) fn fully_resolve_chain(
		&self,
		top: Context<View>,
		before: Context<View>,
	) -> LocalBoxFuture<'_, Result<Settled, RouterError>> {
		Box::pin(async move {
			let (after, redirected) = self.find_component_context_after_all_redirects(before).await?;
			if after.is_recovered() {
				return self.amend_with_on_before_callbacks(after).await;
			}
			let top = if redirected { after.clone() } else { top };

			let matched = join_paths(after.chain.iter().map(|item| item.path.as_str()));
			let is_found = self.inner.resolver.pathname_for_router(&matched) == after.pathname;

			match self.find_next_context_if_any(&after, is_found).await? {
				NextContext::Same => self.amend_with_on_before_callbacks(after).await,
				NextContext::Deeper(next) => self.fully_resolve_chain(top, next).await,
				NextContext::None => Err(self.inner.resolver.not_found(&top)),
			}
		})
	}

	/// Looks for a deeper match below `context`, widening the scope one
	/// ancestor at a time while the pathname is not fully consumed.
	async fn find_next_context_if_any(
		&self,
		context: &Context<View>,
		is_found: bool,
	) -> Result<NextContext, RouterError> {
		let mut parent = context.route;
		loop {
			if let Some(next) = context.next_within(parent, false).await? {
				return Ok(NextContext::Deeper(next));
			}
			if is_found {
				return Ok(NextContext::Same);
			}
			match self.inner.resolver.with_tree(|tree| tree.parent(parent)) {
				Some(ancestor) => parent = ancestor,
				None => return Ok(NextContext::None),
			}
		}
	}

	/// Follows redirect results until a view settles, attaching the view to
	/// the chain. Also reports whether a redirect was followed.
	async fn find_component_context_after_all_redirects(
		&self,
		context: Context<View>,
	) -> Result<(Context<View>, bool), RouterError> {
		let mut context = context;
		let mut redirected = false;
		loop {
			match context.result.clone() {
				Some(Resolved::View(view)) => {
					if context.is_recovered() {
						// A substituted view is rendered on its own.
						context.chain = vec![ChainItem {
							path: String::new(),
							route: context.route,
							element: None,
						}];
					}
					view.set_location(self.inner.resolver.create_location(&context, None));
					context.set_element(view);
					return Ok((context, redirected));
				}
				Some(Resolved::Redirect(redirect)) => {
					context = self
						.redirect(&redirect, context.redirect_count, context.render_id)
						.await?;
					redirected = true;
				}
				Some(Resolved::Done) => {
					return Err(RouterError::InvalidResult {
						pathname: context.pathname,
						found: "done".to_string(),
					});
				}
				None => {
					return Err(RouterError::InvalidResult {
						pathname: context.pathname,
						found: "undefined".to_string(),
					});
				}
			}
		}
	}

	async fn amend_with_on_before_callbacks(
		&self,
		context: Context<View>,
	) -> Result<Settled, RouterError> {
		match self.run_on_before_callbacks(context).await? {
			Amended::Proceed(rendered) => Ok(Settled::Render(rendered)),
			Amended::Cancelled => Ok(Settled::Cancelled),
			Amended::Redirected(next) => self.fully_resolve_chain(next.clone(), next).await,
		}
	}

	/// Resolves the target of `redirect` as part of render `render_id`.
	pub(super) async fn redirect(
		&self,
		redirect: &Redirect,
		counter: u32,
		render_id: u64,
	) -> Result<Context<View>, RouterError> {
		if counter > MAX_REDIRECT_COUNT {
			return Err(RouterError::TooManyRedirects(redirect.from.clone()));
		}
		let pathname = self
			.inner
			.resolver
			.url_for_path(&redirect.pathname, &redirect.params)?;
		crate::debug_log!("redirecting from {} to {}", redirect.from, pathname);
		self.inner
			.resolver
			.resolve(
				ResolveRequest::new(pathname)
					.redirect_from(redirect.from.clone())
					.redirect_count(counter + 1)
					.render_id(render_id),
			)
			.await
	}

	/// Strategy the resolver runs for every matched route.
	pub(super) fn resolve_route_strategy(&self) -> ResolveRouteFn<View> {
		let router = Rc::downgrade(&self.inner);
		Rc::new(move |context: Context<View>| -> ActionFuture<View> {
			let router = router.clone();
			Box::pin(async move {
				match router.upgrade() {
					Some(inner) => Router { inner }.resolve_route(context).await,
					None => Ok(ActionResult::Continue),
				}
			})
		})
	}

	/// Loads lazy children, runs the action of the latest render, then
	/// falls back to the route's `redirect` and `component`.
	async fn resolve_route(&self, context: Context<View>) -> Result<ActionResult<View>, RouterError> {
		let resolver = &self.inner.resolver;
		resolver.load_children(&context).await?;

		let (action, redirect, component) = resolver
			.with_tree(|tree| {
				tree.get(context.route).map(|node| {
					let route = node.route();
					(
						route.action_fn().cloned(),
						route.redirect_target().map(str::to_string),
						route.component_name().map(str::to_string),
					)
				})
			})
			.unwrap_or_default();

		let commands = Commands::new(&context).with_component_factory(self.component_factory());
		let result = match action {
			Some(action) if self.is_latest(context.render_id) => {
				action(context, commands.clone()).await?
			}
			_ => ActionResult::Continue,
		};

		match result {
			ActionResult::View(_)
			| ActionResult::Redirect(_)
			| ActionResult::NotFound
			| ActionResult::Next(_) => return Ok(result),
			_ => {}
		}
		if let Some(target) = redirect {
			return Ok(commands.redirect(target));
		}
		if let Some(component) = component {
			return commands.component(&component);
		}
		Ok(match result {
			ActionResult::Skip => ActionResult::Skip,
			_ => ActionResult::Continue,
		})
	}

	/// Creates views from the registry and records them as router-created.
	fn component_factory(&self) -> ComponentFactory<View> {
		let router = Rc::downgrade(&self.inner);
		Rc::new(move |component: &str| {
			let inner = router
				.upgrade()
				.ok_or_else(|| RouterError::Platform("router was dropped".to_string()))?;
			let view = inner.registry.create(component)?;
			inner
				.state
				.borrow_mut()
				.created
				.push((view.element().clone(), component.to_string()));
			Ok(view)
		})
	}
}
