//! Depth-first matching of a pathname against the route tree.
//!
//! [`RouteMatcher`] is a pull-based cursor: each call to
//! [`RouteMatcher::next`] yields the next candidate match, first the node
//! itself, then the matches of its children one child at a time. The cursor
//! keeps its position between calls, so the resolver can interleave matching
//! with asynchronous route actions and ask to skip a subtree at any point.

use crate::cache::PatternCache;
use crate::error::PatternError;
use crate::params::{ParamValue, Params, decode_param};
use crate::pattern::ParamKey;
use crate::route::{RouteId, RouteTree};

/// A candidate match produced by the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
	/// Matched route.
	pub route: RouteId,
	/// Portion of the remaining pathname consumed by the route.
	pub path: String,
	/// Parameters of the route and all its ancestors.
	pub params: Params,
	/// Parameter descriptors from the root down to the route.
	pub keys: Vec<ParamKey>,
}

/// Matches a single route pattern against `path`.
///
/// Parameters inherited from `parent_params` are kept unless the route
/// captures a value of the same name.
pub fn match_path(
	cache: &mut PatternCache,
	route_path: &str,
	path: &str,
	exact: bool,
	parent_keys: &[ParamKey],
	parent_params: &Params,
) -> Result<Option<(String, Params, Vec<ParamKey>)>, PatternError> {
	let pattern = cache.get_or_compile(route_path, exact)?;
	let Some(matched) = pattern.exec(path) else {
		return Ok(None);
	};

	let mut params = parent_params.clone();
	for (key, value) in pattern.keys().iter().zip(matched.values) {
		let name = key.name.to_string();
		if value.is_none() && params.contains(&name) {
			continue;
		}

		if key.modifier.is_repeat() {
			let segments = match value {
				Some(value) if !value.is_empty() => value
					.split(['/', '?', '#'])
					.map(decode_param)
					.collect(),
				_ => Vec::new(),
			};
			params.insert(name, ParamValue::Repeated(segments));
		} else if let Some(value) = value {
			params.insert(name, decode_param(&value));
		}
	}

	let mut keys = parent_keys.to_vec();
	keys.extend_from_slice(pattern.keys());
	Ok(Some((matched.path, params, keys)))
}

enum MatchState {
	Pending,
	Unmatched,
	Matched {
		result: MatchResult,
		ignore_leading_slash: bool,
		child_index: usize,
		child: Option<Box<RouteMatcher>>,
	},
}

/// Lazy, finite, non-restartable sequence of matches for one subtree.
pub struct RouteMatcher {
	route: RouteId,
	pathname: String,
	ignore_leading_slash: bool,
	parent_keys: Vec<ParamKey>,
	parent_params: Params,
	state: MatchState,
}

impl std::fmt::Debug for RouteMatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouteMatcher")
			.field("route", &self.route)
			.field("pathname", &self.pathname)
			.field("ignore_leading_slash", &self.ignore_leading_slash)
			.finish()
	}
}

impl RouteMatcher {
	/// Creates a matcher for the subtree rooted at `route`.
	///
	/// `ignore_leading_slash` strips a leading `/` from the route pattern;
	/// it is switched on for descendants once any ancestor pattern started
	/// with `/`.
	pub fn new(
		route: RouteId,
		pathname: impl Into<String>,
		ignore_leading_slash: bool,
		parent_keys: Vec<ParamKey>,
		parent_params: Params,
	) -> Self {
		Self {
			route,
			pathname: pathname.into(),
			ignore_leading_slash,
			parent_keys,
			parent_params,
			state: MatchState::Pending,
		}
	}

	/// Yields the next candidate match, or `None` once the subtree is
	/// exhausted.
	///
	/// When `skip` names this matcher's route, the whole subtree is
	/// abandoned.
	pub fn next<V>(
		&mut self,
		tree: &RouteTree<V>,
		cache: &mut PatternCache,
		skip: Option<RouteId>,
	) -> Result<Option<MatchResult>, PatternError> {
		if skip == Some(self.route) {
			return Ok(None);
		}
		let Some(node) = tree.get(self.route) else {
			return Ok(None);
		};

		if matches!(self.state, MatchState::Pending) {
			self.state = MatchState::Unmatched;
			let exact = node.is_exact();

			for route_path in node.route().paths() {
				let (pattern, leading_slash) = match route_path.strip_prefix('/') {
					Some(rest) if self.ignore_leading_slash => (rest, true),
					Some(_) => (route_path.as_str(), true),
					None => (route_path.as_str(), false),
				};

				let matched = match_path(
					cache,
					pattern,
					&self.pathname,
					exact,
					&self.parent_keys,
					&self.parent_params,
				)?;
				if let Some((path, params, keys)) = matched {
					let result = MatchResult {
						route: self.route,
						path,
						params,
						keys,
					};
					self.state = MatchState::Matched {
						result: result.clone(),
						ignore_leading_slash: self.ignore_leading_slash || leading_slash,
						child_index: 0,
						child: None,
					};
					return Ok(Some(result));
				}
			}
		}

		let pathname = &self.pathname;
		let MatchState::Matched {
			result,
			ignore_leading_slash,
			child_index,
			child,
		} = &mut self.state
		else {
			return Ok(None);
		};

		let children = tree.children(self.route);
		while *child_index < children.len() {
			let matcher = child.get_or_insert_with(|| {
				let mut consumed = result.path.len();
				if consumed > 0 && pathname[consumed..].starts_with('/') {
					consumed += 1;
				}
				Box::new(RouteMatcher::new(
					children[*child_index],
					&pathname[consumed..],
					*ignore_leading_slash,
					result.keys.clone(),
					result.params.clone(),
				))
			});

			if let Some(matched) = matcher.next(tree, cache, skip)? {
				return Ok(Some(matched));
			}

			*child = None;
			*child_index += 1;
		}

		Ok(None)
	}
}
