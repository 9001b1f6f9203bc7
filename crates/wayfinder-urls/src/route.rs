//! Route configuration and the route arena.
//!
//! Applications describe routes with the [`Route`] builder. Registering them
//! moves them into a [`RouteTree`], an arena addressed by generational
//! [`RouteId`] handles. Parent links are stored as handles, so the tree has
//! no reference cycles, and removing a subtree invalidates every handle into
//! it.

use crate::error::{RouteConfigError, RouterError};
use crate::pattern::{CompiledPattern, PatternOptions};
use crate::resolver::{ActionResult, Commands, Context};
use futures::future::LocalBoxFuture;
use serde::Serialize;
use std::cell::OnceCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// Future returned by a route action.
pub type ActionFuture<V> = LocalBoxFuture<'static, Result<ActionResult<V>, RouterError>>;

/// Route action: receives the resolution context and commands.
pub type ActionFn<V> = Rc<dyn Fn(Context<V>, Commands<V>) -> ActionFuture<V>>;

/// Future returned by a lazy children function.
pub type ChildrenFuture<V> = LocalBoxFuture<'static, Result<Vec<Route<V>>, RouterError>>;

/// Lazy children function, run every time its route is resolved.
pub type ChildrenFn<V> = Rc<dyn Fn(Context<V>) -> ChildrenFuture<V>>;

/// Transition animation declared on a route.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Animate {
	/// Use the `leaving` and `entering` classes.
	#[default]
	Default,
	/// Use custom class names; missing ones fall back to the defaults.
	Custom {
		/// Class added to the outgoing element.
		leave: Option<String>,
		/// Class added to the incoming element.
		enter: Option<String>,
	},
}

impl Animate {
	/// Class added to the outgoing element.
	pub fn leave_class(&self) -> &str {
		match self {
			Self::Custom {
				leave: Some(leave), ..
			} => leave,
			_ => "leaving",
		}
	}

	/// Class added to the incoming element.
	pub fn enter_class(&self) -> &str {
		match self {
			Self::Custom {
				enter: Some(enter), ..
			} => enter,
			_ => "entering",
		}
	}
}

enum Children<V> {
	None,
	Static(Vec<Route<V>>),
	Lazy(ChildrenFn<V>),
}

impl<V> Clone for Children<V> {
	fn clone(&self) -> Self {
		match self {
			Self::None => Self::None,
			Self::Static(routes) => Self::Static(routes.clone()),
			Self::Lazy(children) => Self::Lazy(Rc::clone(children)),
		}
	}
}

/// A route declaration.
///
/// A route is resolved by, in order: its `action`, its `redirect`, its
/// `component`. Its `children` are matched against the rest of the pathname
/// once the route itself has matched a prefix.
pub struct Route<V> {
	paths: Vec<String>,
	name: Option<String>,
	component: Option<String>,
	redirect: Option<String>,
	action: Option<ActionFn<V>>,
	children: Children<V>,
	animate: Option<Animate>,
}

impl<V> Clone for Route<V> {
	fn clone(&self) -> Self {
		Self {
			paths: self.paths.clone(),
			name: self.name.clone(),
			component: self.component.clone(),
			redirect: self.redirect.clone(),
			action: self.action.clone(),
			children: self.children.clone(),
			animate: self.animate.clone(),
		}
	}
}

impl<V> fmt::Debug for Route<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let children = match &self.children {
			Children::None => "none".to_string(),
			Children::Static(routes) => format!("{} static", routes.len()),
			Children::Lazy(_) => "lazy".to_string(),
		};
		f.debug_struct("Route")
			.field("paths", &self.paths)
			.field("name", &self.name)
			.field("component", &self.component)
			.field("redirect", &self.redirect)
			.field("has_action", &self.action.is_some())
			.field("children", &children)
			.field("animate", &self.animate)
			.finish()
	}
}

impl<V: 'static> Route<V> {
	/// Creates a route for a single path pattern.
	pub fn new(path: impl Into<String>) -> Self {
		Self::with_paths([path.into()])
	}

	/// Creates a route matching any of several path patterns, tried in order.
	pub fn with_paths<I, S>(paths: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			paths: paths.into_iter().map(Into::into).collect(),
			name: None,
			component: None,
			redirect: None,
			action: None,
			children: Children::None,
			animate: None,
		}
	}

	/// Sets the name used by url-for-name lookups.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Sets the component identifier rendered for this route.
	pub fn component(mut self, component: impl Into<String>) -> Self {
		self.component = Some(component.into());
		self
	}

	/// Redirects to another path, carrying the current parameters over.
	pub fn redirect(mut self, path: impl Into<String>) -> Self {
		self.redirect = Some(path.into());
		self
	}

	/// Sets the action invoked when the route is resolved.
	pub fn action<F, Fut>(mut self, action: F) -> Self
	where
		F: Fn(Context<V>, Commands<V>) -> Fut + 'static,
		Fut: Future<Output = Result<ActionResult<V>, RouterError>> + 'static,
	{
		self.action = Some(Rc::new(move |context, commands| -> ActionFuture<V> {
			Box::pin(action(context, commands))
		}));
		self
	}

	/// Sets a static list of child routes.
	pub fn children(mut self, children: Vec<Route<V>>) -> Self {
		self.children = Children::Static(children);
		self
	}

	/// Sets a function producing the child routes at resolution time.
	pub fn lazy_children<F, Fut>(mut self, children: F) -> Self
	where
		F: Fn(Context<V>) -> Fut + 'static,
		Fut: Future<Output = Result<Vec<Route<V>>, RouterError>> + 'static,
	{
		self.children = Children::Lazy(Rc::new(move |context| -> ChildrenFuture<V> {
			Box::pin(children(context))
		}));
		self
	}

	/// Animates transitions into and out of this route.
	pub fn animate(mut self, animate: Animate) -> Self {
		self.animate = Some(animate);
		self
	}
}

impl<V> Route<V> {
	/// Returns the primary path pattern.
	pub fn path(&self) -> &str {
		self.paths.first().map(String::as_str).unwrap_or_default()
	}

	/// Returns every alternative path pattern.
	pub fn paths(&self) -> &[String] {
		&self.paths
	}

	/// Returns the route name.
	pub fn route_name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Returns the component identifier.
	pub fn component_name(&self) -> Option<&str> {
		self.component.as_deref()
	}

	/// Returns the redirect target.
	pub fn redirect_target(&self) -> Option<&str> {
		self.redirect.as_deref()
	}

	/// Returns the route action.
	pub fn action_fn(&self) -> Option<&ActionFn<V>> {
		self.action.as_ref()
	}

	/// Returns the lazy children function.
	pub fn children_fn(&self) -> Option<&ChildrenFn<V>> {
		match &self.children {
			Children::Lazy(children) => Some(children),
			_ => None,
		}
	}

	/// Returns the static children, if declared.
	pub fn static_children(&self) -> Option<&[Route<V>]> {
		match &self.children {
			Children::Static(children) => Some(children),
			_ => None,
		}
	}

	/// Returns the animation config.
	pub fn animate_config(&self) -> Option<&Animate> {
		self.animate.as_ref()
	}

	/// Checks that the route can be resolved and that its patterns compile.
	///
	/// Static children are validated recursively.
	pub fn validate(&self) -> Result<(), RouteConfigError> {
		if self.paths.is_empty() {
			return Err(RouteConfigError::EmptyPathList);
		}

		let resolvable = self.action.is_some()
			|| !matches!(self.children, Children::None)
			|| self.component.is_some()
			|| self.redirect.is_some();
		if !resolvable {
			return Err(RouteConfigError::NothingToResolve(self.paths.join(", ")));
		}

		for path in &self.paths {
			CompiledPattern::new(path, &PatternOptions::default()).map_err(|source| {
				RouteConfigError::InvalidPattern {
					path: path.clone(),
					source,
				}
			})?;
		}

		if self.redirect.is_some() && self.component.is_some() {
			tracing::warn!(
				path = self.path(),
				"Route config has both \"redirect\" and \"component\" properties, and \"redirect\" will always override the latter"
			);
		}

		if let Children::Static(children) = &self.children {
			for child in children {
				child.validate()?;
			}
		}
		Ok(())
	}
}

/// Stable handle to a node of a [`RouteTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RouteId {
	index: u32,
	generation: u32,
}

/// Serializable summary of a registered route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
	/// Handle of the route.
	pub id: RouteId,
	/// Primary path pattern.
	pub path: String,
	/// Route name.
	pub name: Option<String>,
	/// Component identifier.
	pub component: Option<String>,
}

/// A registered route and its links.
pub struct RouteNode<V> {
	route: Route<V>,
	parent: Option<RouteId>,
	children: Option<Vec<RouteId>>,
	synthetic: bool,
	full_path: OnceCell<String>,
}

impl<V> RouteNode<V> {
	/// Returns the route declaration (static children are held by the tree).
	pub fn route(&self) -> &Route<V> {
		&self.route
	}

	/// Returns the parent handle.
	pub fn parent(&self) -> Option<RouteId> {
		self.parent
	}

	/// Returns the materialized children, if any were declared or loaded.
	pub fn children(&self) -> Option<&[RouteId]> {
		self.children.as_deref()
	}

	/// Whether this is the tree's synthetic root.
	pub fn is_synthetic(&self) -> bool {
		self.synthetic
	}

	/// A route without any children declaration must match the whole
	/// remaining pathname.
	pub(crate) fn is_exact(&self) -> bool {
		self.children.is_none() && self.route.children_fn().is_none()
	}
}

struct Slot<V> {
	generation: u32,
	node: Option<RouteNode<V>>,
}

/// Arena of registered routes under a synthetic root.
pub struct RouteTree<V> {
	slots: Vec<Slot<V>>,
	free: Vec<u32>,
	root: RouteId,
}

impl<V> fmt::Debug for RouteTree<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteTree")
			.field("root", &self.root)
			.field("len", &self.len())
			.finish()
	}
}

impl<V: 'static> Default for RouteTree<V> {
	fn default() -> Self {
		Self::new()
	}
}

impl<V: 'static> RouteTree<V> {
	/// Creates a tree holding only the synthetic root.
	pub fn new() -> Self {
		let mut tree = Self {
			slots: Vec::new(),
			free: Vec::new(),
			root: RouteId {
				index: 0,
				generation: 0,
			},
		};
		tree.root = tree.alloc(RouteNode {
			route: Route::new(""),
			parent: None,
			children: Some(Vec::new()),
			synthetic: true,
			full_path: OnceCell::new(),
		});
		tree
	}
}

impl<V> RouteTree<V> {
	/// Returns the synthetic root.
	pub fn root(&self) -> RouteId {
		self.root
	}

	/// Returns the number of live nodes, the root included.
	pub fn len(&self) -> usize {
		self.slots.iter().filter(|slot| slot.node.is_some()).count()
	}

	/// Returns whether only the root is registered.
	pub fn is_empty(&self) -> bool {
		self.len() <= 1
	}

	/// Returns a live node.
	pub fn get(&self, id: RouteId) -> Option<&RouteNode<V>> {
		self.slots
			.get(id.index as usize)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.node.as_ref())
	}

	/// Returns the parent of a live node.
	pub fn parent(&self, id: RouteId) -> Option<RouteId> {
		self.get(id).and_then(RouteNode::parent)
	}

	/// Returns the materialized children of a live node.
	pub fn children(&self, id: RouteId) -> &[RouteId] {
		self.get(id).and_then(RouteNode::children).unwrap_or_default()
	}

	/// Returns whether `maybe_parent` is a strict ancestor of `route`.
	///
	/// Every route descends from `None`.
	pub fn is_descendant(&self, route: RouteId, maybe_parent: Option<RouteId>) -> bool {
		let mut current = Some(route);
		while let Some(id) = current {
			current = self.parent(id);
			if current == maybe_parent {
				return true;
			}
		}
		false
	}

	/// Returns the primary path pattern of a node.
	pub fn path(&self, id: RouteId) -> &str {
		self.get(id).map(|node| node.route.path()).unwrap_or_default()
	}

	/// Returns the route joined with all its ancestors' paths, memoized.
	pub fn full_path(&self, id: RouteId) -> String {
		let Some(node) = self.get(id) else {
			return String::new();
		};
		node.full_path
			.get_or_init(|| {
				let mut full_path = node.route.path().to_string();
				let mut ancestor = node.parent;
				while let Some(parent) = ancestor {
					let path = self.path(parent);
					if !path.is_empty() {
						full_path = format!(
							"{}/{}",
							path.strip_suffix('/').unwrap_or(path),
							full_path.strip_prefix('/').unwrap_or(&full_path)
						);
					}
					ancestor = self.parent(parent);
				}
				full_path
			})
			.clone()
	}

	/// Returns a serializable summary of a node.
	pub fn info(&self, id: RouteId) -> Option<RouteInfo> {
		self.get(id).map(|node| RouteInfo {
			id,
			path: node.route.path().to_string(),
			name: node.route.name.clone(),
			component: node.route.component.clone(),
		})
	}

	/// Iterates over a node and all its descendants, depth first.
	pub fn descendants(&self, id: RouteId) -> Vec<RouteId> {
		let mut out = Vec::new();
		let mut stack = vec![id];
		while let Some(current) = stack.pop() {
			if self.get(current).is_none() {
				continue;
			}
			out.push(current);
			stack.extend(self.children(current).iter().rev().copied());
		}
		out
	}

	fn alloc(&mut self, node: RouteNode<V>) -> RouteId {
		if let Some(index) = self.free.pop() {
			let slot = &mut self.slots[index as usize];
			slot.node = Some(node);
			return RouteId {
				index,
				generation: slot.generation,
			};
		}

		let index = self.slots.len() as u32;
		self.slots.push(Slot {
			generation: 0,
			node: Some(node),
		});
		RouteId {
			index,
			generation: 0,
		}
	}

	fn insert(&mut self, mut route: Route<V>, parent: RouteId) -> RouteId {
		let static_children = match std::mem::replace(&mut route.children, Children::None) {
			Children::Static(children) => Some(children),
			Children::Lazy(children) => {
				route.children = Children::Lazy(children);
				None
			}
			Children::None => None,
		};

		let id = self.alloc(RouteNode {
			route,
			parent: Some(parent),
			children: static_children.as_ref().map(|_| Vec::new()),
			synthetic: false,
			full_path: OnceCell::new(),
		});

		if let Some(children) = static_children {
			let ids: Vec<RouteId> = children
				.into_iter()
				.map(|child| self.insert(child, id))
				.collect();
			if let Some(node) = self.node_mut(id) {
				node.children = Some(ids);
			}
		}
		id
	}

	fn node_mut(&mut self, id: RouteId) -> Option<&mut RouteNode<V>> {
		self.slots
			.get_mut(id.index as usize)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.node.as_mut())
	}

	fn remove(&mut self, id: RouteId) {
		let Some(slot) = self
			.slots
			.get_mut(id.index as usize)
			.filter(|slot| slot.generation == id.generation)
		else {
			return;
		};
		let Some(node) = slot.node.take() else {
			return;
		};
		slot.generation = slot.generation.wrapping_add(1);
		self.free.push(id.index);

		for child in node.children.unwrap_or_default() {
			self.remove(child);
		}
	}

	/// Replaces the children of `id`, freeing the previous subtrees.
	pub fn set_children(&mut self, id: RouteId, routes: Vec<Route<V>>) -> Vec<RouteId> {
		let previous = self
			.node_mut(id)
			.and_then(|node| node.children.take())
			.unwrap_or_default();
		for child in previous {
			self.remove(child);
		}
		if let Some(node) = self.node_mut(id) {
			node.children = Some(Vec::new());
		}
		self.append_children(id, routes)
	}

	/// Replaces the children of `id` with freshly loaded routes.
	///
	/// When `routes` declare the same routes as the current children (same
	/// paths, name, component, redirect and children shape), the existing
	/// handles are kept and only their declarations are swapped. Returns
	/// whether the handles changed.
	pub fn refresh_children(&mut self, id: RouteId, routes: Vec<Route<V>>) -> bool {
		let current = self.get(id).and_then(RouteNode::children).map(<[_]>::to_vec);
		match current {
			Some(current) if self.same_routes(&current, &routes) => {
				for (child, route) in current.into_iter().zip(routes) {
					self.redeclare(child, route);
				}
				false
			}
			_ => {
				self.set_children(id, routes);
				true
			}
		}
	}

	fn same_routes(&self, ids: &[RouteId], routes: &[Route<V>]) -> bool {
		ids.len() == routes.len()
			&& ids.iter().zip(routes).all(|(id, route)| {
				let Some(node) = self.get(*id) else {
					return false;
				};
				let existing = &node.route;
				let same_children = match &route.children {
					Children::None => node.children.is_none() && existing.children_fn().is_none(),
					Children::Lazy(_) => existing.children_fn().is_some(),
					Children::Static(children) => {
						existing.children_fn().is_none()
							&& node
								.children
								.as_deref()
								.is_some_and(|ids| self.same_routes(ids, children))
					}
				};
				existing.paths == route.paths
					&& existing.name == route.name
					&& existing.component == route.component
					&& existing.redirect == route.redirect
					&& same_children
			})
	}

	/// Swaps the declaration of a node whose shape matches `route`.
	fn redeclare(&mut self, id: RouteId, mut route: Route<V>) {
		let static_children = match std::mem::replace(&mut route.children, Children::None) {
			Children::Static(children) => Some(children),
			other => {
				route.children = other;
				None
			}
		};
		let child_ids = self.children(id).to_vec();
		if let Some(node) = self.node_mut(id) {
			node.route = route;
		}
		if let Some(children) = static_children {
			for (child, route) in child_ids.into_iter().zip(children) {
				self.redeclare(child, route);
			}
		}
	}

	/// Appends children to `id`, returning the new handles.
	pub fn append_children(&mut self, id: RouteId, routes: Vec<Route<V>>) -> Vec<RouteId> {
		if self.get(id).is_none() {
			return Vec::new();
		}
		let ids: Vec<RouteId> = routes
			.into_iter()
			.map(|route| self.insert(route, id))
			.collect();
		if let Some(node) = self.node_mut(id) {
			node.children.get_or_insert_with(Vec::new).extend(&ids);
		}
		ids
	}

	/// Rebuilds the declaration of a node, static children included.
	pub fn export(&self, id: RouteId) -> Option<Route<V>> {
		let node = self.get(id)?;
		let mut route = node.route.clone();
		if route.children_fn().is_none() {
			if let Some(children) = &node.children {
				route.children = Children::Static(
					children
						.iter()
						.filter_map(|child| self.export(*child))
						.collect(),
				);
			}
		}
		Some(route)
	}
}

/// Joins matched path segments with exactly one `/` between them.
///
/// Empty segments are skipped.
pub fn join_paths<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
	segments.into_iter().fold(String::new(), |acc, segment| {
		if segment.is_empty() {
			return acc;
		}
		format!(
			"{}/{}",
			acc.strip_suffix('/').unwrap_or(&acc),
			segment.strip_prefix('/').unwrap_or(segment)
		)
	})
}
