//! DOM reconciliation of the rendered chain, `on_after_*` hooks and
//! transition animations.

use super::core::{Rendered, Router};
use crate::dom::Element;
use futures::future::{self, FutureExt, LocalBoxFuture};
use wayfinder_urls::RouterError;

impl Router {
	/// Moves the still-mounted views of the previous chain into
	/// `rendered`, up to the diverged index, and returns the deepest of
	/// them (the outlet when none is reused).
	pub(super) fn copy_unchanged_elements(&self, rendered: &mut Rendered) -> Option<Element> {
		let previous = self.inner.state.borrow().previous.clone();
		let mut deepest = self.outlet();
		for index in 0..rendered.diverged {
			let Some(unchanged) = previous
				.as_ref()
				.and_then(|previous| previous.context.chain.get(index))
				.and_then(|item| item.element.clone())
			else {
				continue;
			};
			if deepest.is_some() && unchanged.element().parent() == deepest {
				deepest = Some(unchanged.element().clone());
				rendered.context.chain[index].element = Some(unchanged);
			} else {
				break;
			}
		}
		deepest
	}

	/// Mounts the new part of the chain, nesting each view in the one
	/// above it, and records what appears and what is about to disappear.
	pub(super) fn add_appearing_content(&self, rendered: &mut Rendered) -> Result<(), RouterError> {
		let outlet = self
			.outlet()
			.ok_or_else(|| RouterError::InvalidOutlet("undefined".to_string()))?;
		self.remove_appearing_content();
		let common = self.copy_unchanged_elements(rendered).unwrap_or(outlet);
		let result = rendered.result_view().map(|view| view.element().clone());

		let mut state = self.inner.state.borrow_mut();
		let disappearing: Vec<Element> = common
			.children()
			.into_iter()
			.filter(|child| state.mounted.contains(child) && Some(child) != result.as_ref())
			.collect();

		let mut appearing = Vec::new();
		let mut parent = common.clone();
		for item in rendered.context.chain.iter().skip(rendered.diverged) {
			let Some(view) = &item.element else {
				continue;
			};
			let element = view.element().clone();
			parent.append_child(&element)?;
			if !state.mounted.contains(&element) {
				state.mounted.push(element.clone());
			}
			if parent == common {
				appearing.push(element.clone());
			}
			parent = element;
		}
		state.appearing = Some(appearing);
		state.disappearing = Some(disappearing);
		Ok(())
	}

	pub(super) fn remove_disappearing_content(&self) {
		let disappearing = {
			let mut state = self.inner.state.borrow_mut();
			state.appearing = None;
			state.disappearing.take()
		};
		for element in disappearing.unwrap_or_default() {
			element.remove();
		}
	}

	/// Unmounts what a superseded render mounted but never settled.
	fn remove_appearing_content(&self) {
		let appearing = {
			let mut state = self.inner.state.borrow_mut();
			if state.appearing.is_none() || state.disappearing.is_none() {
				return;
			}
			state.disappearing = None;
			state.appearing.take()
		};
		for element in appearing.unwrap_or_default() {
			element.remove();
		}
	}

	pub(super) fn run_on_after_enter_callbacks(&self, rendered: &Rendered) {
		let context = &rendered.context;
		for item in context.chain.iter().skip(rendered.diverged) {
			if !self.is_latest(context.render_id) {
				break;
			}
			let Some(view) = &item.element else {
				continue;
			};
			if let Some(lifecycle) = view.lifecycle() {
				let location = self
					.inner
					.resolver
					.create_location(context, Some(item.route));
				lifecycle.on_after_enter(&location, self);
			}
		}
	}

	/// Notifies the views left behind, emptying the ones being removed.
	pub(super) fn run_on_after_leave_callbacks(&self, rendered: &Rendered) {
		let (previous_chain, disappearing) = {
			let state = self.inner.state.borrow();
			let Some(previous) = &state.previous else {
				return;
			};
			(
				previous.context.chain.clone(),
				state.disappearing.clone().unwrap_or_default(),
			)
		};
		let context = &rendered.context;
		for item in previous_chain.iter().skip(rendered.diverged).rev() {
			if !self.is_latest(context.render_id) {
				break;
			}
			let Some(view) = &item.element else {
				continue;
			};
			if let Some(lifecycle) = view.lifecycle() {
				let location = self.inner.resolver.create_location(context, None);
				lifecycle.on_after_leave(&location, self);
			}
			if disappearing.contains(view.element()) {
				view.element().clear_children();
			}
		}
	}

	/// Starts the leave and enter animations of the deepest route declaring
	/// one, returning a future that resolves once both have ended.
	pub(super) fn animate_if_needed(&self, rendered: &Rendered) -> LocalBoxFuture<'static, ()> {
		let (from, to) = {
			let state = self.inner.state.borrow();
			(
				state.disappearing.as_ref().and_then(|items| items.first().cloned()),
				state.appearing.as_ref().and_then(|items| items.first().cloned()),
			)
		};
		let config = self.inner.resolver.with_tree(|tree| {
			rendered.context.chain.iter().rev().find_map(|item| {
				tree.get(item.route)
					.and_then(|node| node.route().animate_config().cloned())
			})
		});

		match (from, to, config) {
			(Some(from), Some(to), Some(config)) => {
				crate::debug_log!("animating {} -> {}", from.node_name(), to.node_name());
				let leave = animate(&from, config.leave_class());
				let enter = animate(&to, config.enter_class());
				future::join(leave, enter).map(|_| ()).boxed_local()
			}
			_ => future::ready(()).boxed_local(),
		}
	}
}

/// Adds `class` to `element` and, if that starts an animation, pins the
/// element's size until `animationend`, then removes the class again.
pub(super) fn animate(element: &Element, class: &str) -> LocalBoxFuture<'static, ()> {
	element.add_class(class);
	if !element.will_animate() {
		element.remove_class(class);
		return future::ready(()).boxed_local();
	}

	let (width, height) = element.size().unwrap_or((0.0, 0.0));
	if let Err(error) = element.set_attribute(
		"style",
		&format!("position: absolute; height: {}px; width: {}px", height, width),
	) {
		crate::warn_log!("failed to pin animated element size: {}", error);
	}
	let ended = element.animation_end();
	let element = element.clone();
	let class = class.to_string();
	async move {
		ended.await;
		element.remove_class(&class);
		element.remove_attribute("style");
	}
	.boxed_local()
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use futures::task::noop_waker_ref;
	use rstest::rstest;
	use std::task::{Context, Poll};

	#[rstest]
	fn test_animate_without_animation_resolves_immediately() {
		// Arrange
		let element = Element::create("x-page").unwrap();

		// Act
		let mut done = animate(&element, "entering");
		let poll = done.as_mut().poll(&mut Context::from_waker(noop_waker_ref()));

		// Assert
		assert_eq!(poll, Poll::Ready(()));
		assert!(!element.has_class("entering"));
	}

	#[rstest]
	fn test_animate_waits_for_animation_end() {
		// Arrange
		let element = Element::create("x-page").unwrap();
		element.set_style("animation-name", "fade");
		let mut done = animate(&element, "leaving");
		let mut context = Context::from_waker(noop_waker_ref());

		// Act
		let pending = done.as_mut().poll(&mut context);
		let pinned = element.attribute("style");
		element.finish_animations();
		let finished = done.as_mut().poll(&mut context);

		// Assert
		assert_eq!(pending, Poll::Pending);
		assert_eq!(
			pinned.as_deref(),
			Some("position: absolute; height: 0px; width: 0px")
		);
		assert_eq!(finished, Poll::Ready(()));
		assert!(!element.has_class("leaving"));
		assert_eq!(element.attribute("style"), None);
	}
}
