//! Rolling cache for repeated map keys and tag markers.
//!
//! The writer replaces the second and later occurrences of a cacheable
//! string with a short code; the reader assigns codes to the same strings in
//! the same traversal order, so both sides stay in lockstep. A cache lives
//! for exactly one top-level message.

use rustc_hash::FxHashMap;

use crate::error::ReadError;
use crate::limits::{CACHE_BASE_CHAR, CACHE_CODE_DIGITS, CACHE_SIZE, MAP_AS_ARRAY, MIN_SIZE_CACHEABLE, SUB};

/// Returns true if `s` should be entered in the cache.
///
/// Map keys of at least [`MIN_SIZE_CACHEABLE`] characters are cacheable, as
/// are tag markers, keywords and symbols of that length wherever they occur.
pub fn is_cacheable(s: &str, as_map_key: bool) -> bool {
    (as_map_key || s.starts_with("~#") || s.starts_with("~$") || s.starts_with("~:"))
        && s.chars().nth(MIN_SIZE_CACHEABLE - 1).is_some()
}

/// Returns true if `s` has the shape of a cache code.
pub fn is_cache_code(s: &str) -> bool {
    s.starts_with(SUB) && s != MAP_AS_ARRAY
}

/// Renders the code for cache slot `index`.
pub fn index_to_code(index: usize) -> String {
    let hi = index / CACHE_CODE_DIGITS;
    let lo = index % CACHE_CODE_DIGITS;
    let digit = |d: usize| char::from(CACHE_BASE_CHAR + d as u8);

    let mut code = String::with_capacity(3);
    code.push(SUB);
    if hi > 0 {
        code.push(digit(hi));
    }
    code.push(digit(lo));
    code
}

/// Parses a cache code back into its slot index.
pub fn code_to_index(code: &str) -> Option<usize> {
    let digits = code.strip_prefix(SUB)?.as_bytes();
    let digit = |b: u8| {
        let d = b.checked_sub(CACHE_BASE_CHAR)? as usize;
        (d < CACHE_CODE_DIGITS).then_some(d)
    };
    match *digits {
        [lo] => digit(lo),
        [hi, lo] => Some(digit(hi)? * CACHE_CODE_DIGITS + digit(lo)?),
        _ => None,
    }
}

// =============================================================================
// WRITE SIDE
// =============================================================================

/// Writer-side cache: string to code.
#[derive(Debug, Clone, Default)]
pub struct WriteCache {
    codes: FxHashMap<String, String>,
    enabled: bool,
}

impl WriteCache {
    pub fn new() -> Self {
        Self {
            codes: FxHashMap::default(),
            enabled: true,
        }
    }

    /// A cache that never assigns codes. Used by verbose JSON.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Returns the code for `s` if it was seen before, otherwise records it
    /// (when cacheable) and returns it unchanged.
    pub fn encode(&mut self, s: String, as_map_key: bool) -> String {
        if !self.enabled || !is_cacheable(&s, as_map_key) {
            return s;
        }
        if let Some(code) = self.codes.get(&s) {
            return code.clone();
        }
        if self.codes.len() >= CACHE_SIZE {
            self.codes.clear();
        }
        let code = index_to_code(self.codes.len());
        self.codes.insert(s.clone(), code);
        s
    }
}

// =============================================================================
// READ SIDE
// =============================================================================

/// Reader-side cache: code to string.
#[derive(Debug, Clone, Default)]
pub struct ReadCache {
    entries: Vec<String>,
}

impl ReadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a cache code, or records a cacheable string and returns it.
    pub fn decode(&mut self, s: String, as_map_key: bool) -> Result<String, ReadError> {
        if is_cache_code(&s) {
            return code_to_index(&s)
                .and_then(|i| self.entries.get(i))
                .cloned()
                .ok_or(ReadError::MalformedCacheCode { code: s });
        }
        if is_cacheable(&s, as_map_key) {
            if self.entries.len() >= CACHE_SIZE {
                self.entries.clear();
            }
            self.entries.push(s.clone());
        }
        Ok(s)
    }
}
