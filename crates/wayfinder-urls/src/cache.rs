//! Bounded cache of compiled route patterns.

use crate::error::PatternError;
use crate::pattern::{CompiledPattern, PatternOptions};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::rc::Rc;

/// Default number of compiled patterns kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// LRU cache of route patterns keyed by `(pattern, exact)`.
///
/// An exact pattern must consume the whole remaining pathname; a non-exact
/// one matches a prefix ending on a delimiter. The empty pattern is compiled
/// strict so that it never consumes a delimiter.
pub struct PatternCache {
	entries: LruCache<(String, bool), Rc<CompiledPattern>>,
}

impl std::fmt::Debug for PatternCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PatternCache")
			.field("len", &self.entries.len())
			.field("capacity", &self.entries.cap())
			.finish()
	}
}

impl Default for PatternCache {
	fn default() -> Self {
		Self::new(DEFAULT_CACHE_CAPACITY)
	}
}

impl PatternCache {
	/// Creates a cache holding at most `capacity` patterns (at least one).
	pub fn new(capacity: usize) -> Self {
		let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
		Self {
			entries: LruCache::new(capacity),
		}
	}

	/// Returns the compiled pattern for `path`, compiling it on a miss.
	pub fn get_or_compile(
		&mut self,
		path: &str,
		exact: bool,
	) -> Result<Rc<CompiledPattern>, PatternError> {
		let key = (path.to_string(), exact);
		if let Some(compiled) = self.entries.get(&key) {
			return Ok(Rc::clone(compiled));
		}

		let options = PatternOptions::default()
			.end(exact)
			.strict(path.is_empty());
		let compiled = Rc::new(CompiledPattern::new(path, &options)?);
		tracing::debug!(pattern = path, exact, regex = compiled.regex_source(), "compiled route pattern");

		self.entries.put(key, Rc::clone(&compiled));
		Ok(compiled)
	}

	/// Returns the number of cached patterns.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns whether the cache is empty.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Drops every cached pattern.
	pub fn clear(&mut self) {
		self.entries.clear();
	}
}
