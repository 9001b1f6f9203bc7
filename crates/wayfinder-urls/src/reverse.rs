//! Reverse routing: building URLs from route names.

use crate::error::RouterError;
use crate::params::{ParamValue, Params};
use crate::pattern::{Encoding, PathBuilder, PatternOptions, Token, parse};
use crate::resolver::Resolver;
use crate::route::{RouteId, RouteTree};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Serializes the parameters left over after path substitution.
pub type QueryStringifier = Rc<dyn Fn(&Params) -> String>;

/// Configuration of a [`UrlGenerator`].
#[derive(Clone)]
pub struct UrlGeneratorOptions {
	/// Also index routes under their component identifier.
	pub component_names: bool,
	/// Encoding applied to substituted values.
	pub encoding: Encoding,
	/// Serializer for parameters that are not path parameters.
	pub stringify_query: Option<QueryStringifier>,
}

impl Default for UrlGeneratorOptions {
	fn default() -> Self {
		Self {
			component_names: false,
			encoding: Encoding::UriComponent,
			stringify_query: None,
		}
	}
}

impl fmt::Debug for UrlGeneratorOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("UrlGeneratorOptions")
			.field("component_names", &self.component_names)
			.field("encoding", &self.encoding)
			.field("has_stringify_query", &self.stringify_query.is_some())
			.finish()
	}
}

impl UrlGeneratorOptions {
	/// Indexes routes under their component identifier when they have no
	/// name.
	pub fn component_names(mut self, enabled: bool) -> Self {
		self.component_names = enabled;
		self
	}

	/// Sets the encoding applied to substituted values.
	pub fn encoding(mut self, encoding: Encoding) -> Self {
		self.encoding = encoding;
		self
	}

	/// Sets the serializer for leftover parameters.
	pub fn stringify_query<F>(mut self, stringify: F) -> Self
	where
		F: Fn(&Params) -> String + 'static,
	{
		self.stringify_query = Some(Rc::new(stringify));
		self
	}
}

/// Form-encodes parameters as a query string, sorted by name.
///
/// Repeated values produce one pair per element.
pub fn stringify_query(params: &Params) -> String {
	let mut entries: Vec<_> = params.iter().collect();
	entries.sort_by(|a, b| a.0.cmp(b.0));

	let mut serializer = url::form_urlencoded::Serializer::new(String::new());
	for (name, value) in entries {
		match value {
			ParamValue::Single(value) => {
				serializer.append_pair(name, value);
			}
			ParamValue::Repeated(values) => {
				for value in values {
					serializer.append_pair(name, value);
				}
			}
		}
	}
	serializer.finish()
}

struct CompiledName {
	keys: HashSet<String>,
	builder: PathBuilder,
}

/// Builds URLs for named routes of a resolver.
pub struct UrlGenerator<V> {
	resolver: Resolver<V>,
	options: UrlGeneratorOptions,
	routes_by_name: RefCell<HashMap<String, Vec<RouteId>>>,
	compiled: RefCell<HashMap<String, Rc<CompiledName>>>,
}

impl<V> fmt::Debug for UrlGenerator<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("UrlGenerator")
			.field("options", &self.options)
			.field("names", &self.routes_by_name.borrow().len())
			.finish()
	}
}

impl<V> UrlGenerator<V> {
	/// Creates a generator over the routes of `resolver`.
	pub fn new(resolver: Resolver<V>, options: UrlGeneratorOptions) -> Self {
		Self {
			resolver,
			options,
			routes_by_name: RefCell::new(HashMap::new()),
			compiled: RefCell::new(HashMap::new()),
		}
	}

	/// Builds the URL of the route named `name`.
	///
	/// Parameters that are not path parameters go to the query string when
	/// a stringifier is configured. An empty result becomes `/`.
	pub fn url_for(&self, name: &str, params: Option<&Params>) -> Result<String, RouterError> {
		let (route, full_path) = match self.lookup(name)? {
			Some(found) => found,
			None => {
				self.rebuild_index();
				self.lookup(name)?
					.ok_or_else(|| RouterError::RouteNotFound(name.to_string()))?
			}
		};
		tracing::debug!(name, ?route, full_path = %full_path, "url for name");

		let compiled = self.compiled(&full_path)?;
		let empty = Params::new();
		let params = params.unwrap_or(&empty);

		let mut url = compiled.builder.build(params)?;
		if url.is_empty() {
			url.push('/');
		}

		if let Some(stringify) = &self.options.stringify_query {
			let query: Params = params
				.iter()
				.filter(|(name, value)| {
					!compiled.keys.contains(name.as_str())
						&& !matches!(value, ParamValue::Single(value) if value.is_empty())
				})
				.map(|(name, value)| (name.clone(), value.clone()))
				.collect();
			let query = stringify(&query);
			if !query.is_empty() {
				if !query.starts_with('?') {
					url.push('?');
				}
				url.push_str(&query);
			}
		}

		Ok(self.resolver.pathname_for_router(&url))
	}

	fn lookup(&self, name: &str) -> Result<Option<(RouteId, String)>, RouterError> {
		let index = self.routes_by_name.borrow();
		let Some(routes) = index.get(name) else {
			return Ok(None);
		};
		if routes.len() > 1 {
			return Err(RouterError::DuplicateRouteName(name.to_string()));
		}
		let route = routes[0];
		Ok(self
			.resolver
			.with_tree(|tree| tree.get(route).map(|_| tree.full_path(route)))
			.map(|full_path| (route, full_path)))
	}

	fn rebuild_index(&self) {
		let component_names = self.options.component_names;
		let index = self.resolver.with_tree(|tree| index_routes(tree, component_names));
		*self.routes_by_name.borrow_mut() = index;
	}

	fn compiled(&self, full_path: &str) -> Result<Rc<CompiledName>, RouterError> {
		if let Some(compiled) = self.compiled.borrow().get(full_path) {
			return Ok(Rc::clone(compiled));
		}

		let options = PatternOptions::default();
		let tokens = parse(full_path, &options)?;
		let keys = tokens
			.iter()
			.filter_map(|token| match token {
				Token::Param(key) => Some(key.name.to_string()),
				Token::Literal(_) => None,
			})
			.collect();
		let compiled = Rc::new(CompiledName {
			keys,
			builder: PathBuilder::from_tokens(tokens, self.options.encoding, &options)?,
		});
		self.compiled
			.borrow_mut()
			.insert(full_path.to_string(), Rc::clone(&compiled));
		Ok(compiled)
	}
}

fn index_routes<V>(tree: &RouteTree<V>, component_names: bool) -> HashMap<String, Vec<RouteId>> {
	let mut index: HashMap<String, Vec<RouteId>> = HashMap::new();
	for id in tree.descendants(tree.root()) {
		let Some(node) = tree.get(id) else {
			continue;
		};
		let route = node.route();
		let name = route.route_name().or_else(|| {
			if component_names {
				route.component_name()
			} else {
				None
			}
		});
		if let Some(name) = name {
			index.entry(name.to_string()).or_default().push(id);
		}
	}
	index
}
