//! `on_before_leave` / `on_before_enter` guards and the view reuse rule.

use super::core::{Rendered, Router};
use super::render::Amended;
use crate::view::{Amendment, GuardCommands, View};
use wayfinder_urls::{ChainItem, Context, Resolved, RouteId, RouterError};

enum Guard {
	Leave(View),
	Enter(View, RouteId),
}

impl Router {
	/// Whether `element` may stand in for `other` at a chain position.
	///
	/// Views the router created from the same component are
	/// interchangeable; any other view only matches itself.
	pub(super) fn is_reusable(&self, element: Option<&View>, other: Option<&View>) -> bool {
		let (Some(element), Some(other)) = (element, other) else {
			return false;
		};
		let state = self.inner.state.borrow();
		match (
			state.component_of(element.element()),
			state.component_of(other.element()),
		) {
			(Some(component), Some(other_component)) => component == other_component,
			_ => element == other,
		}
	}

	/// Computes how much of the previous chain is reused, updates view
	/// locations and runs the guards in order until one amends the
	/// navigation.
	pub(super) async fn run_on_before_callbacks(
		&self,
		context: Context<View>,
	) -> Result<Amended, RouterError> {
		let previous = self.inner.state.borrow().previous.clone();
		let previous_chain: Vec<ChainItem<View>> = previous
			.as_ref()
			.map(|previous| previous.context.chain.clone())
			.unwrap_or_default();
		let new_chain = &context.chain;
		let resolver = &self.inner.resolver;

		let mut diverged = 0;
		let mut skip_attach = false;
		let mut guards = Vec::new();

		if !previous_chain.is_empty() {
			while diverged < previous_chain.len().min(new_chain.len()) {
				let old = &previous_chain[diverged];
				let new = &new_chain[diverged];
				if old.route != new.route
					|| (old.path != new.path && old.element != new.element)
					|| !self.is_reusable(old.element.as_ref(), new.element.as_ref())
				{
					break;
				}
				diverged += 1;
			}

			skip_attach = new_chain.len() == previous_chain.len()
				&& diverged == new_chain.len()
				&& self.is_reusable(
					context.result.as_ref().and_then(Resolved::view),
					previous.as_ref().and_then(Rendered::result_view),
				);

			if skip_attach {
				for item in previous_chain.iter().rev() {
					if let Some(view) = &item.element {
						guards.push(Guard::Leave(view.clone()));
					}
				}
				for (item, old) in new_chain.iter().zip(&previous_chain) {
					if let Some(view) = &item.element {
						guards.push(Guard::Enter(view.clone(), item.route));
					}
					if let Some(view) = &old.element {
						view.set_location(resolver.create_location(&context, Some(old.route)));
					}
				}
			} else {
				for item in previous_chain[diverged..].iter().rev() {
					if let Some(view) = &item.element {
						guards.push(Guard::Leave(view.clone()));
					}
				}
			}
		}

		if !skip_attach {
			for (index, item) in new_chain.iter().enumerate() {
				if index < diverged {
					if let Some(view) = previous_chain.get(index).and_then(|old| old.element.as_ref()) {
						view.set_location(resolver.create_location(&context, Some(previous_chain[index].route)));
					}
				} else if let Some(view) = &item.element {
					guards.push(Guard::Enter(view.clone(), item.route));
					view.set_location(resolver.create_location(&context, Some(item.route)));
				}
			}
		}

		let commands = GuardCommands::new(context.pathname.clone(), context.params.clone());
		let mut amendment = None;
		for guard in guards {
			if !self.is_latest(context.render_id) {
				break;
			}
			match guard {
				Guard::Leave(view) => {
					let Some(lifecycle) = view.lifecycle() else {
						continue;
					};
					let location = resolver.create_location(&context, None);
					match lifecycle.on_before_leave(&location, &commands, self).await? {
						Some(Amendment::Redirect(redirect)) => {
							crate::warn_log!(
								"on_before_leave cannot redirect, ignoring redirect to {}",
								redirect.pathname
							);
						}
						Some(Amendment::Prevent) => {
							amendment = Some(Amendment::Prevent);
							break;
						}
						None => {}
					}
				}
				Guard::Enter(view, route) => {
					let Some(lifecycle) = view.lifecycle() else {
						continue;
					};
					let location = resolver.create_location(&context, Some(route));
					if let Some(result) = lifecycle.on_before_enter(&location, &commands, self).await? {
						amendment = Some(result);
						break;
					}
				}
			}
		}

		match amendment {
			Some(Amendment::Prevent) if previous.is_some() => Ok(Amended::Cancelled),
			Some(Amendment::Redirect(redirect)) => {
				let next = self
					.redirect(&redirect, context.redirect_count, context.render_id)
					.await?;
				Ok(Amended::Redirected(next))
			}
			_ => Ok(Amended::Proceed(Rendered {
				context,
				diverged,
				skip_attach,
			})),
		}
	}
}
