//! Rendering engine
//!
//! This module provides access to wayfinder-pages, which renders resolved
//! route chains into an outlet element.
//!
//! ## Architecture
//!
//! - **Router**: render cycles, guards, history updates and animations
//! - **Views**: elements with lifecycle hooks, created from a component
//!   registry
//! - **Navigation triggers**: link clicks and back/forward navigation
//!
//! On native targets the DOM and the window are simulated in memory, see
//! [`window::memory`](wayfinder_pages::window::memory).

// Re-export all wayfinder-pages functionality
pub use wayfinder_pages::*;
