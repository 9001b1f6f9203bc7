//! Property-based tests for the path pattern compiler
//!
//! Uses proptest to verify properties that should hold for all valid inputs.

mod property_tests {
	use proptest::prelude::*;
	use proptest::proptest;
	use wayfinder_urls::{CompiledPattern, Params, PatternOptions, compile, join_paths};

	proptest! {
		/// Property: a path built from a pattern is matched by the same pattern
		/// and yields the values it was built from
		#[test]
		fn prop_built_path_matches_its_pattern(
			user in r"[a-zA-Z0-9_\-]{1,20}",
			post in r"[a-zA-Z0-9_\-]{1,20}"
		) {
			let pattern = "/users/:user/posts/:post";
			let params = Params::new().with("user", user.as_str()).with("post", post.as_str());

			let path = compile(pattern).unwrap().build(&params).unwrap();
			let matched = CompiledPattern::new(pattern, &PatternOptions::default())
				.unwrap()
				.exec(&path);

			prop_assert!(matched.is_some());
			let values = matched.unwrap().values;
			prop_assert_eq!(values[0].as_deref(), Some(user.as_str()));
			prop_assert_eq!(values[1].as_deref(), Some(post.as_str()));
		}

		/// Property: a literal path always matches itself exactly
		#[test]
		fn prop_literal_pattern_matches_itself(
			path in r"(/[a-z]{1,10}){1,4}"
		) {
			let compiled = CompiledPattern::new(&path, &PatternOptions::default()).unwrap();

			let matched = compiled.exec(&path);

			prop_assert_eq!(matched.map(|m| m.path), Some(path.clone()));
		}

		/// Property: joining route paths never produces an empty segment
		#[test]
		fn prop_join_paths_has_no_double_slash(
			segments in proptest::collection::vec(r"/?[a-z]{1,5}/?", 0..6)
		) {
			let joined = join_paths(segments.iter().map(String::as_str));

			prop_assert!(!joined.contains("//"));
		}

		/// Property: a prefix pattern never consumes past a segment boundary
		#[test]
		fn prop_prefix_match_ends_on_boundary(
			head in r"[a-z]{1,8}",
			tail in r"(/[a-z]{1,8}){0,3}"
		) {
			let compiled = CompiledPattern::new("/:head", &PatternOptions::default().end(false)).unwrap();
			let path = format!("/{}{}", head, tail);

			let matched = compiled.exec(&path).unwrap();

			prop_assert_eq!(matched.path, format!("/{}", head));
		}
	}
}
