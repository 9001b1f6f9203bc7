//! Views, their lifecycle hooks and the component registry.
//!
//! A [`View`] is what a route renders: a DOM element plus optional
//! [`Lifecycle`] callbacks. Routes refer to views by component identifier;
//! the [`ComponentRegistry`] turns identifiers into fresh views.

use crate::dom::Element;
use crate::router::Router;
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use wayfinder_urls::{Location, Params, Redirect, RouterError};

/// Instruction returned by a guard to alter the pending navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Amendment {
	/// Abort the navigation and stay where the router is.
	Prevent,
	/// Navigate somewhere else instead.
	Redirect(Redirect),
}

/// Commands handed to `on_before_enter` / `on_before_leave`.
#[derive(Debug, Clone)]
pub struct GuardCommands {
	from: String,
	params: Params,
}

impl GuardCommands {
	pub(crate) fn new(from: impl Into<String>, params: Params) -> Self {
		Self {
			from: from.into(),
			params,
		}
	}

	/// Cancels the navigation.
	pub fn prevent(&self) -> Amendment {
		Amendment::Prevent
	}

	/// Redirects the navigation to `pathname`, carrying the current
	/// parameters over.
	///
	/// Ignored when returned from `on_before_leave`.
	pub fn redirect(&self, pathname: impl Into<String>) -> Amendment {
		Amendment::Redirect(Redirect {
			from: self.from.clone(),
			params: self.params.clone(),
			pathname: pathname.into(),
		})
	}
}

/// Callbacks a view receives as the router enters and leaves it.
///
/// Every method has a no-op default. `on_before_*` hooks run sequentially
/// in chain order and may return an [`Amendment`]; once one does, the rest
/// are skipped. `on_after_*` hooks run after the DOM has been updated.
#[async_trait(?Send)]
pub trait Lifecycle {
	/// Called before the view is attached, or before its location changes
	/// when it is reused.
	async fn on_before_enter(
		&self,
		_location: &Location,
		_commands: &GuardCommands,
		_router: &Router,
	) -> Result<Option<Amendment>, RouterError> {
		Ok(None)
	}

	/// Called before the view is detached.
	async fn on_before_leave(
		&self,
		_location: &Location,
		_commands: &GuardCommands,
		_router: &Router,
	) -> Result<Option<Amendment>, RouterError> {
		Ok(None)
	}

	/// Called after the view has been attached.
	fn on_after_enter(&self, _location: &Location, _router: &Router) {}

	/// Called after the view has been replaced.
	fn on_after_leave(&self, _location: &Location, _router: &Router) {}
}

struct ViewInner {
	element: Element,
	lifecycle: Option<Rc<dyn Lifecycle>>,
	location: RefCell<Option<Location>>,
}

/// A renderable element with optional lifecycle hooks.
///
/// Clones share the element. Two views are equal when they wrap the same
/// element.
#[derive(Clone)]
pub struct View {
	inner: Rc<ViewInner>,
}

impl View {
	/// A view without lifecycle hooks.
	pub fn new(element: Element) -> Self {
		Self {
			inner: Rc::new(ViewInner {
				element,
				lifecycle: None,
				location: RefCell::new(None),
			}),
		}
	}

	/// A view whose hooks are implemented by `lifecycle`.
	pub fn with_lifecycle(element: Element, lifecycle: Rc<dyn Lifecycle>) -> Self {
		Self {
			inner: Rc::new(ViewInner {
				element,
				lifecycle: Some(lifecycle),
				location: RefCell::new(None),
			}),
		}
	}

	/// The element mounted for this view.
	pub fn element(&self) -> &Element {
		&self.inner.element
	}

	/// Lifecycle hooks, if any.
	pub fn lifecycle(&self) -> Option<&Rc<dyn Lifecycle>> {
		self.inner.lifecycle.as_ref()
	}

	/// Location the router last rendered this view at.
	pub fn location(&self) -> Option<Location> {
		self.inner.location.borrow().clone()
	}

	pub(crate) fn set_location(&self, location: Location) {
		*self.inner.location.borrow_mut() = Some(location);
	}
}

impl PartialEq for View {
	fn eq(&self, other: &Self) -> bool {
		self.inner.element == other.inner.element
	}
}

impl fmt::Debug for View {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("View")
			.field("element", &self.inner.element)
			.field("has_lifecycle", &self.inner.lifecycle.is_some())
			.finish()
	}
}

impl From<Element> for View {
	fn from(element: Element) -> Self {
		Self::new(element)
	}
}

/// Creates a fresh view for a component.
pub type ViewFactory = Rc<dyn Fn() -> Result<View, RouterError>>;

/// Maps component identifiers to view factories.
///
/// Identifiers without a registered factory render as a plain element
/// whose tag name is the identifier.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
	factories: HashMap<String, ViewFactory>,
}

impl fmt::Debug for ComponentRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<_> = self.factories.keys().collect();
		names.sort();
		f.debug_struct("ComponentRegistry")
			.field("components", &names)
			.finish()
	}
}

impl ComponentRegistry {
	/// An empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers the factory for `component`.
	pub fn register<F>(mut self, component: impl Into<String>, factory: F) -> Self
	where
		F: Fn() -> Result<View, RouterError> + 'static,
	{
		self.factories.insert(component.into(), Rc::new(factory));
		self
	}

	/// Whether `component` has a registered factory.
	pub fn contains(&self, component: &str) -> bool {
		self.factories.contains_key(component)
	}

	/// Creates a fresh view for `component`.
	pub fn create(&self, component: &str) -> Result<View, RouterError> {
		match self.factories.get(component) {
			Some(factory) => factory(),
			None => Element::create(component).map(View::new),
		}
	}
}
