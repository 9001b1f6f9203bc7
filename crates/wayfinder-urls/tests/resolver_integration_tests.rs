//! Integration tests for the Resolver
//!
//! These tests verify, through the public API only:
//! 1. Resolving a pathname built from a chain of nested routes settles with
//!    that chain, root first
//! 2. Root boundaries of `""` and `"/"` patterns
//! 3. Named routes and generated URLs under a base URL

use futures::executor::block_on;
use futures::future::{Ready, ready};
use proptest::prelude::*;
use rstest::rstest;
use wayfinder_urls::{
	ActionResult, Commands, Context, Params, Resolved, Resolver, ResolverOptions, Route,
	RouterError, UrlGenerator, UrlGeneratorOptions,
};

type TestRoute = Route<String>;

fn view(
	name: &str,
) -> impl Fn(Context<String>, Commands<String>) -> Ready<Result<ActionResult<String>, RouterError>> {
	let name = name.to_string();
	move |_, _| ready(Ok(ActionResult::View(name.clone())))
}

/// Nests one route per segment, the deepest one rendering "leaf".
fn nested(segments: &[String]) -> TestRoute {
	let (last, parents) = segments.split_last().unwrap();
	parents.iter().rev().fold(
		TestRoute::new(format!("/{}", last)).action(view("leaf")),
		|child, segment| TestRoute::new(format!("/{}", segment)).children(vec![child]),
	)
}

fn chain_paths(resolver: &Resolver<String>, context: &Context<String>) -> Vec<String> {
	resolver.with_tree(|tree| {
		context
			.chain
			.iter()
			.map(|item| tree.path(item.route).to_string())
			.collect()
	})
}

mod property_tests {
	use super::*;

	proptest! {
		/// Property: a pathname spelled by a chain of nested routes resolves
		/// to exactly that chain
		#[test]
		fn prop_resolved_chain_follows_the_pathname(
			segments in prop::collection::vec("[a-z]{1,8}", 1..5)
		) {
			let resolver = Resolver::new([nested(&segments)], ResolverOptions::default()).unwrap();
			let pathname = format!("/{}", segments.join("/"));

			let context = block_on(resolver.resolve(pathname.as_str())).unwrap();

			let expected: Vec<String> = segments.iter().map(|segment| format!("/{}", segment)).collect();
			prop_assert_eq!(chain_paths(&resolver, &context), expected);
			prop_assert_eq!(context.result, Some(Resolved::View("leaf".to_string())));
		}
	}
}

#[rstest]
#[case::empty_pattern_matches_empty("", "", true)]
#[case::empty_pattern_rejects_root("", "/", false)]
#[case::root_pattern_matches_root("/", "/", true)]
#[case::root_pattern_rejects_deeper("/", "/a", false)]
fn test_root_leaf_boundaries(#[case] pattern: &str, #[case] pathname: &str, #[case] found: bool) {
	// Arrange
	let resolver = Resolver::new(
		[TestRoute::new(pattern).action(view("root"))],
		ResolverOptions::default(),
	)
	.unwrap();

	// Act
	let result = block_on(resolver.resolve(pathname));

	// Assert
	assert_eq!(result.is_ok(), found);
	if let Err(error) = result {
		assert!(error.is_not_found());
	}
}

#[rstest]
fn test_named_route_url_is_rebased() {
	// Arrange
	let resolver = Resolver::new(
		[TestRoute::new("/users/:id").action(view("user")).name("user")],
		ResolverOptions::default()
			.base_url("/app/")
			.document_url("http://localhost/"),
	)
	.unwrap();
	let generator = UrlGenerator::new(resolver.clone(), UrlGeneratorOptions::default());

	// Act
	let url = generator
		.url_for("user", Some(&Params::new().with("id", 3)))
		.unwrap();
	let context = block_on(resolver.resolve(url.as_str())).unwrap();

	// Assert
	assert_eq!(url, "/app/users/3");
	assert_eq!(context.params.get_str("id"), Some("3"));
}

#[rstest]
fn test_missing_required_parameter_fails_to_build() {
	let resolver = Resolver::<String>::new(Vec::new(), ResolverOptions::default()).unwrap();

	let result = resolver.url_for_path("/users/:id", &Params::new());

	assert!(result.is_err());
}
