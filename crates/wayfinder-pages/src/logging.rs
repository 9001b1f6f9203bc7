//! Router diagnostics.
//!
//! Every message is a `tracing` event with the [`TARGET`] target, so the
//! host application filters and collects them with its own subscriber.
//! Debug builds on wasm32 also write them to the browser console, where a
//! subscriber is rarely installed.
//!
//! | Macro | Level | Console (wasm32, debug builds) |
//! |-------|-------|--------------------------------|
//! | `debug_log!` | `DEBUG` | with the `debug-hooks` feature |
//! | `warn_log!` | `WARN` | `console.warn` |
//! | `error_log!` | `ERROR` | `console.error` |

/// Target of every event the router emits.
pub const TARGET: &str = "wayfinder_pages";

macro_rules! router_event {
	($level:ident, $($arg:tt)*) => {{
		::tracing::event!(target: $crate::logging::TARGET, ::tracing::Level::$level, $($arg)*);
		#[cfg(all(debug_assertions, target_arch = "wasm32"))]
		$crate::logging::to_console(::tracing::Level::$level, &::std::format!($($arg)*));
	}};
}

/// Render-cycle tracing.
macro_rules! debug_log {
	($($arg:tt)*) => {
		$crate::logging::router_event!(DEBUG, $($arg)*)
	};
}

/// Recoverable misuse, such as a redirect returned from a leave guard.
macro_rules! warn_log {
	($($arg:tt)*) => {
		$crate::logging::router_event!(WARN, $($arg)*)
	};
}

/// Failed renders and broken window state.
macro_rules! error_log {
	($($arg:tt)*) => {
		$crate::logging::router_event!(ERROR, $($arg)*)
	};
}

pub(crate) use {debug_log, error_log, router_event, warn_log};

#[cfg(all(debug_assertions, target_arch = "wasm32"))]
pub(crate) fn to_console(level: tracing::Level, message: &str) {
	use web_sys::console;

	let message = wasm_bindgen::JsValue::from_str(message);
	if level == tracing::Level::ERROR {
		console::error_1(&message);
	} else if level == tracing::Level::WARN {
		console::warn_1(&message);
	} else if cfg!(feature = "debug-hooks") {
		console::debug_1(&message);
	}
}

#[cfg(test)]
mod tests {
	use super::TARGET;
	use rstest::rstest;
	use std::sync::{Arc, Mutex};
	use tracing_subscriber::layer::SubscriberExt as _;
	use tracing_subscriber::util::SubscriberInitExt as _;

	type Captured = Arc<Mutex<Vec<(String, tracing::Level, String)>>>;

	/// Collects `(target, level, message)` of every event.
	struct Capture {
		events: Captured,
	}

	impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Capture {
		fn on_event(
			&self,
			event: &tracing::Event<'_>,
			_ctx: tracing_subscriber::layer::Context<'_, S>,
		) {
			struct Message(String);

			impl tracing::field::Visit for Message {
				fn record_debug(
					&mut self,
					field: &tracing::field::Field,
					value: &dyn std::fmt::Debug,
				) {
					if field.name() == "message" {
						self.0 = format!("{:?}", value);
					}
				}
			}

			let mut message = Message(String::new());
			event.record(&mut message);
			let metadata = event.metadata();
			self.events.lock().unwrap().push((
				metadata.target().to_string(),
				*metadata.level(),
				message.0,
			));
		}
	}

	#[rstest]
	fn test_messages_are_tracing_events_under_router_target() {
		// Arrange
		let events: Captured = Arc::default();
		let _guard = tracing_subscriber::registry()
			.with(Capture {
				events: Arc::clone(&events),
			})
			.set_default();

		// Act
		crate::debug_log!("render {} started for {}", 1, "/users/42");
		crate::warn_log!("ignored: {:?}", vec!["download", "router-ignore"]);
		crate::error_log!("render failed");

		// Assert
		assert_eq!(
			*events.lock().unwrap(),
			vec![
				(
					TARGET.to_string(),
					tracing::Level::DEBUG,
					"render 1 started for /users/42".to_string()
				),
				(
					TARGET.to_string(),
					tracing::Level::WARN,
					"ignored: [\"download\", \"router-ignore\"]".to_string()
				),
				(
					TARGET.to_string(),
					tracing::Level::ERROR,
					"render failed".to_string()
				),
			]
		);
	}

	#[rstest]
	fn test_messages_without_subscriber_are_dropped() {
		crate::debug_log!("debug");
		crate::warn_log!("warning");
		crate::error_log!("error");
	}
}
