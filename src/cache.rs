//! Process-wide compiled-regex and color caches (spec.md §5).
//!
//! Grounded on skim's `matcher.rs`, which keeps a `LazyLock<Option<ThreadPool>>`
//! for the lifetime of the process; here the same `LazyLock` idiom backs a
//! `RwLock`-guarded map instead of a pool. Read access only takes the read
//! lock; insertion re-checks under the write lock so two racing compiles of
//! the same `(name, pattern)` converge on one winner, keeping the "monotone
//! once resolved" invariant from spec.md §8.7.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use regex::Regex;

use crate::error::ConfigError;
use crate::Color;

type RegexKey = (String, String);

static REGEX_CACHE: LazyLock<RwLock<HashMap<RegexKey, Arc<Regex>>>> = LazyLock::new(|| RwLock::new(HashMap::new()));
static COLOR_CACHE: LazyLock<RwLock<HashMap<String, Color>>> = LazyLock::new(|| RwLock::new(HashMap::new()));

/// Returns a shared, compiled `Regex` for `(name, pattern)`, compiling and
/// caching it on first use. Entries are never evicted.
pub fn cached_regex(name: &str, pattern: &str) -> Result<Arc<Regex>, regex::Error> {
    let key = (name.to_string(), pattern.to_string());

    if let Some(re) = REGEX_CACHE.read().unwrap().get(&key) {
        return Ok(re.clone());
    }

    let mut cache = REGEX_CACHE.write().unwrap();
    // Double-checked: another thread may have inserted while we waited for the lock.
    if let Some(re) = cache.get(&key) {
        return Ok(re.clone());
    }
    let compiled = Arc::new(Regex::new(pattern)?);
    cache.insert(key, compiled.clone());
    Ok(compiled)
}

/// Returns a cached parse of `spec`, parsing and caching it on first use.
pub fn cached_color(spec: &str) -> Result<Color, ConfigError> {
    if let Some(c) = COLOR_CACHE.read().unwrap().get(spec) {
        return Ok(*c);
    }
    let mut cache = COLOR_CACHE.write().unwrap();
    if let Some(c) = cache.get(spec) {
        return Ok(*c);
    }
    let color = Color::parse_uncached(spec)?;
    cache.insert(spec.to_string(), color);
    Ok(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_cache_is_monotone() {
        let a = cached_regex("url", "https?://\\S+").unwrap();
        let b = cached_regex("url", "https?://\\S+").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn regex_cache_distinguishes_by_name() {
        let a = cached_regex("one", "a+").unwrap();
        let b = cached_regex("two", "a+").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn color_cache_reuses_parse() {
        let a = cached_color("red").unwrap();
        let b = cached_color("red").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn color_cache_propagates_errors() {
        assert!(cached_color("not-a-color").is_err());
    }
}
