//! Integration tests for the facade crate
//!
//! These tests verify that the prelude is enough to configure and run a
//! router end to end.

#![cfg(all(feature = "pages", not(target_arch = "wasm32")))]

use rstest::rstest;
use wayfinder::pages::window::memory;
use wayfinder::prelude::*;

#[rstest]
#[tokio::test]
async fn test_prelude_renders_a_route() {
	// Arrange
	memory::reset();
	let outlet = Element::create("main").unwrap();
	let router = Router::new(Some(outlet.clone()), RouterOptions::default()).unwrap();
	router
		.set_routes([Route::new("/users/:id").component("x-user").name("user")], true)
		.unwrap();

	// Act
	let location = router.render("/users/42", false).await.unwrap();

	// Assert
	assert_eq!(location.params.get_str("id"), Some("42"));
	assert_eq!(outlet.children()[0].local_name(), "x-user");
	assert_eq!(
		router
			.url_for_name("user", Some(&Params::new().with("id", 7)))
			.unwrap(),
		"/users/7"
	);
}
