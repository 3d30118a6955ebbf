//! Pattern compilation and the compiled-pattern cache

use super::QueryError;
use lru::LruCache;
use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};
use std::num::NonZeroUsize;
use tracing::debug;

/// Compile `pattern` with `^`/`$` matching at line boundaries and `.`
/// matching newlines. `size_limit` bounds the compiled program.
pub fn compile_pattern(pattern: &str, size_limit: usize) -> Result<Regex, QueryError> {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .dot_matches_new_line(true)
        .size_limit(size_limit)
        .build()
        .map_err(|source| QueryError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// LRU cache of compiled patterns keyed by pattern text.
///
/// Entries are immutable once compiled; callers share them read-only.
pub struct PatternCache {
    entries: Mutex<LruCache<String, Regex>>,
}

impl PatternCache {
    /// Create a cache holding up to `capacity` patterns; `None` when capacity is 0
    pub fn new(capacity: usize) -> Option<Self> {
        NonZeroUsize::new(capacity).map(|cap| Self {
            entries: Mutex::new(LruCache::new(cap)),
        })
    }

    /// Return the cached pattern or compile and insert it.
    ///
    /// Patterns that fail to compile are not cached.
    pub fn get_or_compile(&self, pattern: &str, size_limit: usize) -> Result<Regex, QueryError> {
        if let Some(regex) = self.entries.lock().get(pattern) {
            debug!("Pattern cache hit");
            canto_common::metrics::record_pattern_cache(true);
            return Ok(regex.clone());
        }

        canto_common::metrics::record_pattern_cache(false);
        // Compile outside the lock; a concurrent miss on the same pattern just compiles twice
        let regex = compile_pattern(pattern, size_limit)?;
        self.entries.lock().put(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
