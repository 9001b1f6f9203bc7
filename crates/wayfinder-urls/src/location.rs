//! Public snapshot of the current navigation.

use crate::error::RouterError;
use crate::params::Params;
use crate::pattern::compile;
use crate::resolver::rebase;
use crate::route::RouteInfo;
use serde::Serialize;

/// Where the router currently is.
///
/// Built from a settled resolution context and published with the
/// `location-changed` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
	/// Configured base URL, empty when none.
	pub base_url: String,
	/// Full pathname, base URL included.
	pub pathname: String,
	/// Search string, including the leading `?`.
	pub search: String,
	/// Hash, including the leading `#`.
	pub hash: String,
	/// Parameters of the matched chain.
	pub params: Params,
	/// Pathname of the navigation that redirected here.
	pub redirect_from: Option<String>,
	/// Deepest route rendered.
	pub route: Option<RouteInfo>,
	/// Matched routes from the root down.
	pub routes: Vec<RouteInfo>,
	#[serde(skip)]
	pub(crate) template: Option<String>,
	#[serde(skip)]
	pub(crate) effective_base: Option<String>,
}

impl Location {
	/// Rebuilds the URL of the matched chain with `params` overriding the
	/// current parameters.
	pub fn get_url(&self, params: &Params) -> Result<String, RouterError> {
		let template = self.template.as_deref().unwrap_or_default();
		let path = compile(template)?.build(&self.params.merged(params))?;
		Ok(rebase(&path, self.effective_base.as_deref()))
	}

	/// Decoded `(key, value)` pairs of the search string.
	pub fn search_params(&self) -> Vec<(String, String)> {
		let query = self.search.strip_prefix('?').unwrap_or(&self.search);
		url::form_urlencoded::parse(query.as_bytes())
			.into_owned()
			.collect()
	}

	/// Pathname, search and hash joined.
	pub fn href(&self) -> String {
		format!("{}{}{}", self.pathname, self.search, self.hash)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn location(template: &str, effective_base: Option<&str>) -> Location {
		Location {
			pathname: "/users/7".to_string(),
			search: "?tab=posts&q=a%20b".to_string(),
			hash: "#top".to_string(),
			params: Params::new().with("id", "7"),
			template: Some(template.to_string()),
			effective_base: effective_base.map(str::to_string),
			..Default::default()
		}
	}

	#[rstest]
	fn test_get_url_merges_user_params() {
		// Arrange
		let location = location("/users/:id", None);

		// Act
		let current = location.get_url(&Params::new()).unwrap();
		let other = location.get_url(&Params::new().with("id", 8)).unwrap();

		// Assert
		assert_eq!(current, "/users/7");
		assert_eq!(other, "/users/8");
	}

	#[rstest]
	fn test_get_url_is_rebased() {
		let location = location("/users/:id", Some("http://localhost/app/"));

		assert_eq!(location.get_url(&Params::new()).unwrap(), "/app/users/7");
	}

	#[rstest]
	fn test_search_params_are_decoded() {
		let location = location("/users/:id", None);

		assert_eq!(
			location.search_params(),
			vec![
				("tab".to_string(), "posts".to_string()),
				("q".to_string(), "a b".to_string()),
			]
		);
	}

	#[rstest]
	fn test_serializes_camel_case_without_internals() {
		// Arrange
		let location = location("/users/:id", None);

		// Act
		let json = serde_json::to_value(&location).unwrap();

		// Assert
		assert_eq!(json["pathname"], "/users/7");
		assert_eq!(json["baseUrl"], "");
		assert_eq!(json["params"]["id"], "7");
		assert!(json.get("template").is_none());
		assert_eq!(location.href(), "/users/7?tab=posts&q=a%20b#top");
	}
}
