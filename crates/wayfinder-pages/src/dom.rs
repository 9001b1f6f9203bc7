//! DOM element abstraction.
//!
//! [`Element`] is a cheap, clonable handle to a node. On wasm32 it wraps a
//! `web_sys::Node`. On native targets it is an in-memory node tree with the
//! same API, which is what the router's test suite runs against.
//!
//! Equality is node identity.

use futures::future::LocalBoxFuture;
use std::fmt;
use url::Url;
use wayfinder_urls::RouterError;

#[cfg(not(target_arch = "wasm32"))]
use futures::FutureExt;
#[cfg(not(target_arch = "wasm32"))]
use futures::channel::oneshot;
#[cfg(not(target_arch = "wasm32"))]
use std::cell::RefCell;
#[cfg(not(target_arch = "wasm32"))]
use std::collections::BTreeMap;
#[cfg(not(target_arch = "wasm32"))]
use std::rc::{Rc, Weak};

/// Handle to a DOM node.
#[cfg(target_arch = "wasm32")]
#[derive(Clone)]
pub struct Element(web_sys::Node);

/// Handle to an in-memory node.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone)]
pub struct Element(Rc<NodeData>);

#[cfg(not(target_arch = "wasm32"))]
enum NodeKind {
	Element(String),
	Fragment,
	Text(String),
}

#[cfg(not(target_arch = "wasm32"))]
struct NodeData {
	kind: NodeKind,
	attributes: RefCell<BTreeMap<String, String>>,
	classes: RefCell<Vec<String>>,
	styles: RefCell<BTreeMap<String, String>>,
	parent: RefCell<Weak<NodeData>>,
	children: RefCell<Vec<Element>>,
	animation_waiters: RefCell<Vec<oneshot::Sender<()>>>,
}

#[cfg(target_arch = "wasm32")]
fn platform_error(context: &str, error: impl fmt::Debug) -> RouterError {
	RouterError::Platform(format!("{}: {:?}", context, error))
}

impl PartialEq for Element {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl Eq for Element {}

impl fmt::Debug for Element {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Element")
			.field("node_name", &self.node_name())
			.field("children", &self.children().len())
			.finish()
	}
}

// Platform independent helpers.
impl Element {
	/// Returns whether the node can host the router's content.
	///
	/// Only elements and document fragments can.
	pub fn is_container(&self) -> bool {
		self.is_element() || self.is_fragment()
	}

	/// Returns whether the element has an inline or computed animation.
	pub fn will_animate(&self) -> bool {
		self.animation_name()
			.is_some_and(|name| !name.is_empty() && name != "none")
	}

	/// Removes every child node.
	pub fn clear_children(&self) {
		for child in self.children() {
			child.remove();
		}
	}
}

#[cfg(not(target_arch = "wasm32"))]
impl Element {
	fn with_kind(kind: NodeKind) -> Self {
		Self(Rc::new(NodeData {
			kind,
			attributes: RefCell::new(BTreeMap::new()),
			classes: RefCell::new(Vec::new()),
			styles: RefCell::new(BTreeMap::new()),
			parent: RefCell::new(Weak::new()),
			children: RefCell::new(Vec::new()),
			animation_waiters: RefCell::new(Vec::new()),
		}))
	}

	/// Creates an element with the given tag name.
	pub fn create(tag: &str) -> Result<Self, RouterError> {
		if tag.is_empty() || tag.contains(char::is_whitespace) {
			return Err(RouterError::Platform(format!(
				"invalid element name \"{}\"",
				tag
			)));
		}
		Ok(Self::with_kind(NodeKind::Element(tag.to_ascii_lowercase())))
	}

	/// Creates an empty document fragment.
	pub fn fragment() -> Result<Self, RouterError> {
		Ok(Self::with_kind(NodeKind::Fragment))
	}

	/// Creates a text node.
	pub fn text(content: &str) -> Result<Self, RouterError> {
		Ok(Self::with_kind(NodeKind::Text(content.to_string())))
	}

	/// Returns whether both handles point at the same node.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	fn is_element(&self) -> bool {
		matches!(self.0.kind, NodeKind::Element(_))
	}

	fn is_fragment(&self) -> bool {
		matches!(self.0.kind, NodeKind::Fragment)
	}

	/// Tag name of an element, empty for other nodes.
	pub fn local_name(&self) -> String {
		match &self.0.kind {
			NodeKind::Element(tag) => tag.clone(),
			_ => String::new(),
		}
	}

	/// DOM node name.
	pub fn node_name(&self) -> String {
		match &self.0.kind {
			NodeKind::Element(tag) => tag.to_ascii_uppercase(),
			NodeKind::Fragment => "#document-fragment".to_string(),
			NodeKind::Text(_) => "#text".to_string(),
		}
	}

	/// Parent node, if attached.
	pub fn parent(&self) -> Option<Element> {
		self.0.parent.borrow().upgrade().map(Element)
	}

	/// Child nodes in document order.
	pub fn children(&self) -> Vec<Element> {
		self.0.children.borrow().clone()
	}

	/// Appends `child`, moving it out of its current parent first.
	pub fn append_child(&self, child: &Element) -> Result<(), RouterError> {
		if !self.is_container() {
			return Err(RouterError::Platform(format!(
				"{} cannot have children",
				self.node_name()
			)));
		}
		let mut ancestor = Some(self.clone());
		while let Some(node) = ancestor {
			if node.ptr_eq(child) {
				return Err(RouterError::Platform(
					"the new child is an ancestor of the parent".to_string(),
				));
			}
			ancestor = node.parent();
		}

		child.remove();
		*child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
		self.0.children.borrow_mut().push(child.clone());
		Ok(())
	}

	/// Detaches the node from its parent.
	pub fn remove(&self) {
		let Some(parent) = self.parent() else {
			return;
		};
		parent
			.0
			.children
			.borrow_mut()
			.retain(|sibling| !sibling.ptr_eq(self));
		*self.0.parent.borrow_mut() = Weak::new();
	}

	/// Value of an attribute.
	pub fn attribute(&self, name: &str) -> Option<String> {
		self.0.attributes.borrow().get(name).cloned()
	}

	/// Returns whether the attribute is present.
	pub fn has_attribute(&self, name: &str) -> bool {
		self.0.attributes.borrow().contains_key(name)
	}

	/// Sets an attribute.
	pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), RouterError> {
		if !self.is_element() {
			return Err(RouterError::Platform(format!(
				"cannot set attribute on {}",
				self.node_name()
			)));
		}
		self.0
			.attributes
			.borrow_mut()
			.insert(name.to_string(), value.to_string());
		Ok(())
	}

	/// Removes an attribute.
	pub fn remove_attribute(&self, name: &str) {
		self.0.attributes.borrow_mut().remove(name);
	}

	/// Adds a class name.
	pub fn add_class(&self, class: &str) {
		let mut classes = self.0.classes.borrow_mut();
		if !classes.iter().any(|existing| existing == class) {
			classes.push(class.to_string());
		}
	}

	/// Removes a class name.
	pub fn remove_class(&self, class: &str) {
		self.0.classes.borrow_mut().retain(|existing| existing != class);
	}

	/// Returns whether the class name is present.
	pub fn has_class(&self, class: &str) -> bool {
		self.0.classes.borrow().iter().any(|existing| existing == class)
	}

	/// Sets a style property.
	pub fn set_style(&self, property: &str, value: &str) {
		self.0
			.styles
			.borrow_mut()
			.insert(property.to_string(), value.to_string());
	}

	/// Current `animation-name` style.
	pub fn animation_name(&self) -> Option<String> {
		self.0.styles.borrow().get("animation-name").cloned()
	}

	/// Rendered width and height, when layout information exists.
	pub fn size(&self) -> Option<(f64, f64)> {
		None
	}

	/// Resolves once the element's next `animationend` fires.
	pub fn animation_end(&self) -> LocalBoxFuture<'static, ()> {
		let (sender, receiver) = oneshot::channel();
		self.0.animation_waiters.borrow_mut().push(sender);
		async move {
			let _ = receiver.await;
		}
		.boxed_local()
	}

	/// Fires `animationend` on the element.
	pub fn finish_animations(&self) {
		let waiters: Vec<_> = self.0.animation_waiters.borrow_mut().drain(..).collect();
		for waiter in waiters {
			let _ = waiter.send(());
		}
	}

	/// Absolute URL of an `<a href>` element, resolved against the window
	/// location.
	pub fn anchor_url(&self) -> Option<Url> {
		if self.local_name() != "a" {
			return None;
		}
		let href = self.attribute("href")?;
		Url::parse(&crate::window::location().href)
			.and_then(|base| base.join(&href))
			.ok()
	}

	/// Text content of a text node, or the concatenated text of descendants.
	pub fn text_content(&self) -> String {
		match &self.0.kind {
			NodeKind::Text(content) => content.clone(),
			_ => self
				.children()
				.iter()
				.map(Element::text_content)
				.collect(),
		}
	}
}

#[cfg(target_arch = "wasm32")]
impl Element {
	fn document() -> Result<web_sys::Document, RouterError> {
		web_sys::window()
			.and_then(|window| window.document())
			.ok_or_else(|| RouterError::Platform("no document".to_string()))
	}

	/// Wraps an existing node.
	pub fn from_node(node: web_sys::Node) -> Self {
		Self(node)
	}

	/// The wrapped node.
	pub fn as_node(&self) -> &web_sys::Node {
		&self.0
	}

	fn as_element(&self) -> Option<&web_sys::Element> {
		use wasm_bindgen::JsCast;
		self.0.dyn_ref::<web_sys::Element>()
	}

	/// Creates an element with the given tag name.
	pub fn create(tag: &str) -> Result<Self, RouterError> {
		let element = Self::document()?
			.create_element(tag)
			.map_err(|error| platform_error("createElement", error))?;
		Ok(Self(element.into()))
	}

	/// Creates an empty document fragment.
	pub fn fragment() -> Result<Self, RouterError> {
		Ok(Self(Self::document()?.create_document_fragment().into()))
	}

	/// Creates a text node.
	pub fn text(content: &str) -> Result<Self, RouterError> {
		Ok(Self(Self::document()?.create_text_node(content).into()))
	}

	/// Returns whether both handles point at the same node.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		self.0.is_same_node(Some(&other.0))
	}

	fn is_element(&self) -> bool {
		self.0.node_type() == web_sys::Node::ELEMENT_NODE
	}

	fn is_fragment(&self) -> bool {
		self.0.node_type() == web_sys::Node::DOCUMENT_FRAGMENT_NODE
	}

	/// Tag name of an element, empty for other nodes.
	pub fn local_name(&self) -> String {
		self.as_element()
			.map(web_sys::Element::local_name)
			.unwrap_or_default()
	}

	/// DOM node name.
	pub fn node_name(&self) -> String {
		self.0.node_name()
	}

	/// Parent node, if attached.
	pub fn parent(&self) -> Option<Element> {
		self.0.parent_node().map(Element)
	}

	/// Child nodes in document order.
	pub fn children(&self) -> Vec<Element> {
		let nodes = self.0.child_nodes();
		(0..nodes.length())
			.filter_map(|index| nodes.get(index))
			.map(Element)
			.collect()
	}

	/// Appends `child`, moving it out of its current parent first.
	pub fn append_child(&self, child: &Element) -> Result<(), RouterError> {
		self.0
			.append_child(&child.0)
			.map(|_| ())
			.map_err(|error| platform_error("appendChild", error))
	}

	/// Detaches the node from its parent.
	pub fn remove(&self) {
		if let Some(parent) = self.0.parent_node() {
			let _ = parent.remove_child(&self.0);
		}
	}

	/// Value of an attribute.
	pub fn attribute(&self, name: &str) -> Option<String> {
		self.as_element()?.get_attribute(name)
	}

	/// Returns whether the attribute is present.
	pub fn has_attribute(&self, name: &str) -> bool {
		self.as_element()
			.is_some_and(|element| element.has_attribute(name))
	}

	/// Sets an attribute.
	pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), RouterError> {
		let element = self.as_element().ok_or_else(|| {
			RouterError::Platform(format!("cannot set attribute on {}", self.node_name()))
		})?;
		element
			.set_attribute(name, value)
			.map_err(|error| platform_error("setAttribute", error))
	}

	/// Removes an attribute.
	pub fn remove_attribute(&self, name: &str) {
		if let Some(element) = self.as_element() {
			let _ = element.remove_attribute(name);
		}
	}

	/// Adds a class name.
	pub fn add_class(&self, class: &str) {
		if let Some(element) = self.as_element() {
			let _ = element.class_list().add_1(class);
		}
	}

	/// Removes a class name.
	pub fn remove_class(&self, class: &str) {
		if let Some(element) = self.as_element() {
			let _ = element.class_list().remove_1(class);
		}
	}

	/// Returns whether the class name is present.
	pub fn has_class(&self, class: &str) -> bool {
		self.as_element()
			.is_some_and(|element| element.class_list().contains(class))
	}

	/// Sets an inline style property.
	pub fn set_style(&self, property: &str, value: &str) {
		use wasm_bindgen::JsCast;
		if let Some(element) = self.0.dyn_ref::<web_sys::HtmlElement>() {
			let _ = element.style().set_property(property, value);
		}
	}

	/// Computed `animation-name` style.
	pub fn animation_name(&self) -> Option<String> {
		let element = self.as_element()?;
		web_sys::window()?
			.get_computed_style(element)
			.ok()
			.flatten()?
			.get_property_value("animation-name")
			.ok()
	}

	/// Rendered width and height.
	pub fn size(&self) -> Option<(f64, f64)> {
		let rect = self.as_element()?.get_bounding_client_rect();
		Some((rect.right() - rect.left(), rect.bottom() - rect.top()))
	}

	/// Resolves once the element's next `animationend` fires.
	pub fn animation_end(&self) -> LocalBoxFuture<'static, ()> {
		use futures::FutureExt;
		use futures::channel::oneshot;
		use std::cell::RefCell;
		use std::rc::Rc;
		use wasm_bindgen::JsCast;
		use wasm_bindgen::prelude::*;

		let (sender, receiver) = oneshot::channel::<()>();
		let sender = Rc::new(RefCell::new(Some(sender)));
		let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
			if let Some(sender) = sender.borrow_mut().take() {
				let _ = sender.send(());
			}
		}) as Box<dyn FnMut(_)>);
		let registered = self
			.0
			.add_event_listener_with_callback("animationend", closure.as_ref().unchecked_ref())
			.is_ok();
		let node = self.0.clone();

		async move {
			if registered {
				let _ = receiver.await;
			}
			let _ = node
				.remove_event_listener_with_callback("animationend", closure.as_ref().unchecked_ref());
		}
		.boxed_local()
	}

	/// Absolute URL of an `<a href>` element.
	pub fn anchor_url(&self) -> Option<Url> {
		use wasm_bindgen::JsCast;
		let anchor = self.0.dyn_ref::<web_sys::HtmlAnchorElement>()?;
		Url::parse(&anchor.href()).ok()
	}

	/// Text content of the node and its descendants.
	pub fn text_content(&self) -> String {
		self.0.text_content().unwrap_or_default()
	}
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use futures::FutureExt;
	use rstest::rstest;

	#[rstest]
	fn test_append_moves_child_between_parents() {
		// Arrange
		let first = Element::create("div").unwrap();
		let second = Element::create("div").unwrap();
		let child = Element::create("b-list").unwrap();
		first.append_child(&child).unwrap();

		// Act
		second.append_child(&child).unwrap();

		// Assert
		assert!(first.children().is_empty());
		assert_eq!(second.children(), vec![child.clone()]);
		assert_eq!(child.parent(), Some(second));
	}

	#[rstest]
	fn test_reappending_moves_child_to_end() {
		let parent = Element::create("div").unwrap();
		let a = Element::create("x-a").unwrap();
		let b = Element::create("x-b").unwrap();
		parent.append_child(&a).unwrap();
		parent.append_child(&b).unwrap();

		parent.append_child(&a).unwrap();

		assert_eq!(parent.children(), vec![b, a]);
	}

	#[rstest]
	fn test_append_rejects_ancestor_and_text_parent() {
		// Arrange
		let outer = Element::create("div").unwrap();
		let inner = Element::create("div").unwrap();
		outer.append_child(&inner).unwrap();
		let text = Element::text("hello").unwrap();

		// Act
		let cycle = inner.append_child(&outer);
		let into_text = text.append_child(&Element::create("span").unwrap());

		// Assert
		assert!(matches!(cycle, Err(RouterError::Platform(_))));
		assert!(matches!(into_text, Err(RouterError::Platform(_))));
	}

	#[rstest]
	#[case(Element::create("main").unwrap(), true)]
	#[case(Element::fragment().unwrap(), true)]
	#[case(Element::text("x").unwrap(), false)]
	fn test_is_container(#[case] node: Element, #[case] expected: bool) {
		assert_eq!(node.is_container(), expected);
	}

	#[rstest]
	fn test_equality_is_identity() {
		let a = Element::create("x-a").unwrap();
		let b = Element::create("x-a").unwrap();

		assert_eq!(a, a.clone());
		assert_ne!(a, b);
	}

	#[rstest]
	fn test_animation_end_resolves_after_finish() {
		// Arrange
		let element = Element::create("x-a").unwrap();
		element.set_style("animation-name", "fade");
		let mut ended = element.animation_end();
		assert!(element.will_animate());
		assert!((&mut ended).now_or_never().is_none());

		// Act
		element.finish_animations();

		// Assert
		assert!(ended.now_or_never().is_some());
	}

	#[rstest]
	#[case(None, false)]
	#[case(Some("none"), false)]
	#[case(Some("slide"), true)]
	fn test_will_animate(#[case] animation: Option<&str>, #[case] expected: bool) {
		let element = Element::create("x-a").unwrap();
		if let Some(animation) = animation {
			element.set_style("animation-name", animation);
		}

		assert_eq!(element.will_animate(), expected);
	}
}
