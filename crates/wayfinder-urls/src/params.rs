//! Route parameter maps.
//!
//! Parameters are keyed by name; unnamed groups are keyed by their
//! positional index rendered as a string (`"0"`, `"1"`, ...). Repeatable
//! parameters (`*`, `+`) hold a list of segments.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Value of a single route parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
	/// A single path segment.
	Single(String),
	/// Segments captured by a repeatable parameter.
	Repeated(Vec<String>),
}

impl ParamValue {
	/// Returns the single value, if this is not a repeated parameter.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Single(value) => Some(value),
			Self::Repeated(_) => None,
		}
	}

	/// Returns the segments of a repeated parameter.
	pub fn as_slice(&self) -> Option<&[String]> {
		match self {
			Self::Single(_) => None,
			Self::Repeated(values) => Some(values),
		}
	}
}

impl From<&str> for ParamValue {
	fn from(value: &str) -> Self {
		Self::Single(value.to_string())
	}
}

impl From<String> for ParamValue {
	fn from(value: String) -> Self {
		Self::Single(value)
	}
}

impl From<Vec<String>> for ParamValue {
	fn from(values: Vec<String>) -> Self {
		Self::Repeated(values)
	}
}

impl From<Vec<&str>> for ParamValue {
	fn from(values: Vec<&str>) -> Self {
		Self::Repeated(values.into_iter().map(str::to_string).collect())
	}
}

macro_rules! impl_param_value_for_number {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for ParamValue {
				fn from(value: $ty) -> Self {
					Self::Single(value.to_string())
				}
			}
		)*
	};
}

impl_param_value_for_number!(i32, i64, u32, u64, usize);

/// Mapping from parameter name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(HashMap<String, ParamValue>);

impl Params {
	/// Creates an empty parameter map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a parameter, builder style.
	pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
		self.insert(name, value);
		self
	}

	/// Inserts or replaces a parameter.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
		self.0.insert(name.into(), value.into());
	}

	/// Returns the value of a parameter.
	pub fn get(&self, name: &str) -> Option<&ParamValue> {
		self.0.get(name)
	}

	/// Returns the value of a single-valued parameter.
	pub fn get_str(&self, name: &str) -> Option<&str> {
		self.get(name).and_then(ParamValue::as_str)
	}

	/// Parses a single-valued parameter into `T`.
	///
	/// Returns `None` when the parameter is absent or repeated.
	pub fn parse<T: FromStr>(&self, name: &str) -> Option<Result<T, T::Err>> {
		self.get_str(name).map(str::parse)
	}

	/// Returns whether the map holds the given parameter.
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	/// Returns the number of parameters.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns whether the map is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over all parameters in unspecified order.
	pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
		self.0.iter()
	}

	/// Returns a copy of `self` overridden by every entry of `other`.
	pub fn merged(&self, other: &Params) -> Params {
		let mut merged = self.clone();
		for (name, value) in other.iter() {
			merged.0.insert(name.clone(), value.clone());
		}
		merged
	}
}

impl<K, V> FromIterator<(K, V)> for Params
where
	K: Into<String>,
	V: Into<ParamValue>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut params = Params::new();
		for (name, value) in iter {
			params.insert(name, value);
		}
		params
	}
}

/// Decodes a percent-encoded parameter value, keeping the raw text when it
/// is not valid percent-encoding.
pub(crate) fn decode_param(value: &str) -> String {
	urlencoding::decode(value)
		.map(|decoded| decoded.into_owned())
		.unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_builder_and_typed_access() {
		// Arrange
		let params = Params::new().with("id", 42).with("slug", "hello");

		// Act
		let id = params.parse::<i64>("id");

		// Assert
		assert_eq!(id, Some(Ok(42)));
		assert_eq!(params.get_str("slug"), Some("hello"));
		assert_eq!(params.len(), 2);
	}

	#[rstest]
	fn test_repeated_value_is_not_a_string() {
		let params = Params::new().with("path", vec!["a", "b"]);

		assert_eq!(params.get_str("path"), None);
		assert_eq!(
			params.get("path").and_then(ParamValue::as_slice),
			Some(&["a".to_string(), "b".to_string()][..])
		);
	}

	#[rstest]
	fn test_merged_overrides_left_side() {
		// Arrange
		let parent = Params::new().with("user", "1").with("tab", "posts");
		let child = Params::new().with("tab", "likes");

		// Act
		let merged = parent.merged(&child);

		// Assert
		assert_eq!(merged.get_str("user"), Some("1"));
		assert_eq!(merged.get_str("tab"), Some("likes"));
	}

	#[rstest]
	#[case("caf%C3%A9", "café")]
	#[case("a%20b", "a b")]
	#[case("%E0%A4%A", "%E0%A4%A")]
	fn test_decode_param(#[case] raw: &str, #[case] expected: &str) {
		assert_eq!(decode_param(raw), expected);
	}

	#[rstest]
	fn test_serializes_as_plain_object() {
		let params = Params::new().with("id", "7");

		let json = serde_json::to_string(&params).unwrap();

		assert_eq!(json, r#"{"id":"7"}"#);
	}
}
