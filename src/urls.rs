//! Routing core
//!
//! This module provides access to wayfinder-urls: the path pattern
//! compiler, the route tree matcher, the resolver and URL generation.
//! It has no browser dependencies and can be used on its own, for example
//! to resolve locations on a server.

// Re-export all wayfinder-urls functionality
pub use wayfinder_urls::*;
