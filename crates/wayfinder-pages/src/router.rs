//! Client-side router.
//!
//! A [`Router`] resolves the current pathname against its route tree,
//! runs the lifecycle guards of the views it leaves and enters, and
//! reconciles the chain of matched views into its outlet element.
//!
//! ## Render cycle
//!
//! 1. Resolve the pathname (following redirects) until the matched chain
//!    consumes the whole pathname.
//! 2. Run `on_before_leave` on the views being left, then `on_before_enter`
//!    on the views being entered. A guard may cancel or redirect.
//! 3. Update the session history and publish the new location.
//! 4. Mount the new views below the deepest reused one, run the
//!    `on_after_*` hooks and the optional transition animation, then
//!    unmount the old views.
//!
//! Every cycle carries a render id. Once a newer cycle has started, an
//! older one stops applying effects and settles with the latest location.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wayfinder_pages::dom::Element;
//! use wayfinder_pages::router::{Router, RouterOptions};
//! use wayfinder_urls::Route;
//!
//! # async fn run() -> Result<(), wayfinder_urls::RouterError> {
//! let outlet = Element::create("main")?;
//! let router = Router::new(Some(outlet), RouterOptions::default())?;
//! router
//! 	.set_routes(
//! 		[
//! 			Route::new("/").component("b-list"),
//! 			Route::new("/add").component("b-add"),
//! 		],
//! 		false,
//! 	)?
//! 	.await?;
//! # Ok(())
//! # }
//! ```

mod core;
mod guards;
mod history;
mod outlet;
mod render;
mod triggers;

pub use self::core::{MAX_REDIRECT_COUNT, RenderFuture, Router, RouterOptions};
pub use self::triggers::{ClickTrigger, NavigationTrigger, PopstateTrigger, default_triggers};
