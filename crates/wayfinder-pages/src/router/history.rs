//! Session history updates for settled renders.

use crate::view::View;
use crate::window::{self, IGNORE_STATE};
use wayfinder_urls::{Context, RouterError};

/// Pushes (or replaces) a history entry for the given URL parts, unless
/// the window is already there.
///
/// Followed by a `popstate` carrying [`IGNORE_STATE`], so listeners learn
/// about the change without the popstate trigger navigating again.
pub(super) fn update_browser_history(
	pathname: &str,
	search: &str,
	hash: &str,
	replace: bool,
) -> Result<(), RouterError> {
	let current = window::location();
	if current.pathname == pathname && current.search == search && current.hash == hash {
		return Ok(());
	}
	let url = format!("{}{}{}", pathname, search, hash);
	if replace {
		window::replace_state(&url)?;
	} else {
		window::push_state(&url)?;
	}
	window::dispatch_popstate(Some(IGNORE_STATE));
	Ok(())
}

pub(super) fn update_from_context(context: &Context<View>, replace: bool) -> Result<(), RouterError> {
	update_browser_history(&context.pathname, &context.search, &context.hash, replace)
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use crate::window::memory;
	use rstest::rstest;

	#[rstest]
	fn test_same_location_is_not_pushed() {
		// Arrange
		memory::reset();
		memory::set_location("/a?x=1#top").unwrap();
		let before = memory::history_len();

		// Act
		update_browser_history("/a", "?x=1", "#top", false).unwrap();

		// Assert
		assert_eq!(memory::history_len(), before);
	}

	#[rstest]
	#[case(false, 2)]
	#[case(true, 1)]
	fn test_push_or_replace(#[case] replace: bool, #[case] expected_len: usize) {
		memory::reset();

		update_browser_history("/b", "", "#h", replace).unwrap();

		assert_eq!(memory::history_len(), expected_len);
		assert_eq!(window::location().href, "http://localhost/b#h");
	}

	#[rstest]
	fn test_update_announces_ignored_popstate() {
		// Arrange
		memory::reset();
		let states = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
		let recorder = std::rc::Rc::clone(&states);
		let _listener = window::on_popstate(move |event| recorder.borrow_mut().push(event.state.clone()));

		// Act
		update_browser_history("/c", "", "", false).unwrap();

		// Assert
		assert_eq!(*states.borrow(), vec![Some(IGNORE_STATE.to_string())]);
	}
}
