//! Error types for pattern compilation, route configuration and resolution.

use crate::params::Params;
use crate::route::RouteInfo;
use thiserror::Error;

/// Error raised while tokenizing or compiling a path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
	/// A `:` was not followed by a parameter name.
	#[error("Missing parameter name at {0}")]
	MissingParameterName(usize),
	/// A custom pattern started with `?`.
	#[error("Pattern cannot start with \"?\" at {0}")]
	PatternStartsWithModifier(usize),
	/// A custom pattern contained a capturing group.
	#[error("Capturing groups are not allowed at {0}")]
	CapturingGroup(usize),
	/// A custom pattern was never closed.
	#[error("Unbalanced pattern at {0}")]
	UnbalancedPattern(usize),
	/// A custom pattern was empty.
	#[error("Missing pattern at {0}")]
	MissingPattern(usize),
	/// The parser met a token it did not expect.
	#[error("Unexpected {found} at {index}, expected {expected}")]
	UnexpectedToken {
		/// Kind of the token that was found.
		found: &'static str,
		/// Byte offset of the token.
		index: usize,
		/// Kind of the token that was expected.
		expected: &'static str,
	},
	/// Two parameters followed each other with no separating text.
	#[error("Must have text between two parameters, missing text after \"{0}\"")]
	MissingTextBetweenParameters(String),
	/// A repeatable parameter had neither prefix nor suffix.
	#[error("Can not repeat \"{0}\" without a prefix and suffix")]
	RepeatWithoutAffix(String),
	/// The pattern exceeded the maximum accepted length.
	#[error("Pattern length {length} exceeds maximum allowed length of {max} bytes")]
	TooLong {
		/// Length of the rejected pattern.
		length: usize,
		/// Maximum accepted length.
		max: usize,
	},
	/// The generated regular expression was rejected by the regex engine.
	#[error("Failed to compile pattern regex: {0}")]
	Regex(String),
}

/// Error raised by a path builder while substituting parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
	/// A list of values was supplied for a non-repeatable parameter.
	#[error("Expected \"{0}\" to not repeat, but got an array")]
	UnexpectedRepeat(String),
	/// An empty list was supplied for a required repeatable parameter.
	#[error("Expected \"{0}\" to not be empty")]
	EmptyRepeat(String),
	/// One element of a repeated value failed its parameter's pattern.
	#[error("Expected all \"{name}\" to match \"{pattern}\", but got \"{value}\"")]
	RepeatMismatch {
		/// Parameter name.
		name: String,
		/// Parameter pattern.
		pattern: String,
		/// Offending (encoded) value.
		value: String,
	},
	/// A value failed its parameter's pattern.
	#[error("Expected \"{name}\" to match \"{pattern}\", but got \"{value}\"")]
	Mismatch {
		/// Parameter name.
		name: String,
		/// Parameter pattern.
		pattern: String,
		/// Offending (encoded) value.
		value: String,
	},
	/// A required parameter had no value.
	#[error("Expected \"{name}\" to be {}", expected_kind(.repeat))]
	Missing {
		/// Parameter name.
		name: String,
		/// Whether the parameter is repeatable.
		repeat: bool,
	},
}

/// Error raised when a route configuration is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteConfigError {
	/// The route declares none of action, children, component or redirect.
	#[error(
		"Expected route config \"{0}\" to include either \"component, redirect\" or \"action\" function but none found."
	)]
	NothingToResolve(String),
	/// The route declares an empty list of alternative paths.
	#[error("Expected route config to have at least one path alternative")]
	EmptyPathList,
	/// The route path failed to compile.
	#[error("Invalid path \"{path}\": {source}")]
	InvalidPattern {
		/// Offending path.
		path: String,
		/// Underlying compile error.
		#[source]
		source: PatternError,
	},
}

/// Snapshot of the resolution context attached to routing failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
	/// Pathname that was being resolved.
	pub pathname: String,
	/// Search string of the navigation.
	pub search: String,
	/// Hash of the navigation.
	pub hash: String,
	/// Parameters collected so far.
	pub params: Params,
	/// Route that was being resolved, if any.
	pub route: Option<RouteInfo>,
}

/// Errors produced while resolving and rendering routes.
#[derive(Debug, Clone, Error)]
pub enum RouterError {
	/// No route chain consumed the whole pathname.
	#[error("Page not found ({})", .context.pathname)]
	NotFound {
		/// Context of the failed resolution.
		context: Box<ErrorContext>,
	},
	/// A route action failed or returned an unusable value.
	#[error(
		"Path '{pathname}' is not properly resolved due to an error.{}",
		route_suffix(.route_path)
	)]
	Resolution {
		/// Pathname that was being resolved.
		pathname: String,
		/// Path of the route whose resolution failed.
		route_path: Option<String>,
		/// Underlying failure.
		#[source]
		source: Box<RouterError>,
	},
	/// A redirect chain exceeded the redirect bound.
	#[error("Too many redirects when rendering from {0}")]
	TooManyRedirects(String),
	/// The settled result was neither a view nor a redirect.
	#[error(
		"Invalid route resolution result for path \"{pathname}\". Expected redirect object or HTML element, but got: \"{found}\". Double check the action return value for the route."
	)]
	InvalidResult {
		/// Pathname that was resolved.
		pathname: String,
		/// Description of the offending value.
		found: String,
	},
	/// The outlet cannot host child nodes.
	#[error("Expected router outlet to be a valid DOM Element | DocumentFragment (but got {0})")]
	InvalidOutlet(String),
	/// No route carries the requested name.
	#[error("Route \"{0}\" not found")]
	RouteNotFound(String),
	/// Several routes carry the requested name.
	#[error("Duplicate route with name \"{0}\". Try seting unique 'name' route properties.")]
	DuplicateRouteName(String),
	/// A user-supplied action, children function or guard failed.
	#[error("{0}")]
	Action(String),
	/// The configured base URL could not be resolved.
	#[error("Invalid base URL \"{0}\"")]
	InvalidBaseUrl(String),
	/// The host platform (DOM, history) rejected an operation.
	#[error("Platform error: {0}")]
	Platform(String),
	/// A route path failed to compile.
	#[error(transparent)]
	Pattern(#[from] PatternError),
	/// A path builder rejected its parameters.
	#[error(transparent)]
	Build(#[from] BuildError),
	/// A route configuration was rejected.
	#[error(transparent)]
	Config(#[from] RouteConfigError),
}

fn expected_kind(repeat: &bool) -> &'static str {
	if *repeat { "an array" } else { "a string" }
}

fn route_suffix(route_path: &Option<String>) -> String {
	match route_path {
		Some(path) if !path.is_empty() => format!(" Resolution had failed on route: '{}'", path),
		_ => String::new(),
	}
}

impl RouterError {
	/// Creates an error for a failed action, children function or guard.
	pub fn action(message: impl Into<String>) -> Self {
		Self::Action(message.into())
	}

	/// Creates a not-found error for the given context snapshot.
	pub fn not_found(context: ErrorContext) -> Self {
		Self::NotFound {
			context: Box::new(context),
		}
	}

	/// Returns the HTTP-like status code associated with the error, if any.
	pub fn code(&self) -> Option<u16> {
		match self {
			Self::NotFound { .. } => Some(404),
			Self::Resolution { .. } => Some(500),
			_ => None,
		}
	}

	/// Returns `true` for the not-found error.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound { .. })
	}

	/// Returns the context snapshot carried by a not-found error.
	pub fn context(&self) -> Option<&ErrorContext> {
		match self {
			Self::NotFound { context } => Some(context),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_not_found_message_and_code() {
		// Arrange
		let error = RouterError::not_found(ErrorContext {
			pathname: "/missing".to_string(),
			..Default::default()
		});

		// Act
		let message = error.to_string();

		// Assert
		assert_eq!(message, "Page not found (/missing)");
		assert_eq!(error.code(), Some(404));
		assert!(error.is_not_found());
		assert_eq!(error.context().map(|c| c.pathname.as_str()), Some("/missing"));
	}

	#[rstest]
	#[case(Some("/users/:id".to_string()), "Path '/users/1' is not properly resolved due to an error. Resolution had failed on route: '/users/:id'")]
	#[case(None, "Path '/users/1' is not properly resolved due to an error.")]
	#[case(Some(String::new()), "Path '/users/1' is not properly resolved due to an error.")]
	fn test_resolution_error_message(#[case] route_path: Option<String>, #[case] expected: &str) {
		// Arrange
		let error = RouterError::Resolution {
			pathname: "/users/1".to_string(),
			route_path,
			source: Box::new(RouterError::action("boom")),
		};

		// Act & Assert
		assert_eq!(error.to_string(), expected);
		assert_eq!(error.code(), Some(500));
		assert!(std::error::Error::source(&error).is_some());
	}

	#[rstest]
	#[case(true, "Expected \"tail\" to be an array")]
	#[case(false, "Expected \"tail\" to be a string")]
	fn test_missing_parameter_message(#[case] repeat: bool, #[case] expected: &str) {
		let error = BuildError::Missing {
			name: "tail".to_string(),
			repeat,
		};

		assert_eq!(error.to_string(), expected);
	}

	#[rstest]
	fn test_leaf_errors_convert_into_router_error() {
		// Arrange
		let pattern = PatternError::MissingParameterName(3);

		// Act
		let error: RouterError = pattern.into();

		// Assert
		assert_eq!(error.to_string(), "Missing parameter name at 3");
		assert_eq!(error.code(), None);
	}
}
