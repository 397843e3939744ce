//! Wire-format constants shared by the writer, decoder and reader.

/// Escape character. Leads every inline tagged string.
pub const ESC: char = '~';

/// Substitution character. Leads every cache code.
pub const SUB: char = '^';

/// Reserved character. Strings starting with it are always escaped.
pub const RES: char = '`';

/// Prefix of a multi-character tag marker.
pub const TAG: &str = "~#";

/// First element of an array that encodes a map.
pub const MAP_AS_ARRAY: &str = "^ ";

/// Tag used to wrap a top-level scalar.
pub const QUOTE: &str = "'";

/// Number of distinct symbols a cache code digit can take.
pub const CACHE_CODE_DIGITS: usize = 44;

/// Character of the first cache code digit (`'0'`).
pub const CACHE_BASE_CHAR: u8 = b'0';

/// Maximum number of entries before the rolling cache resets.
pub const CACHE_SIZE: usize = CACHE_CODE_DIGITS * CACHE_CODE_DIGITS;

/// Minimum string length for cache eligibility.
pub const MIN_SIZE_CACHEABLE: usize = 4;

/// Largest integer the JSON syntax can carry as a bare number (2^53 - 1).
pub const JSON_MAX_INT: i64 = (1 << 53) - 1;

/// Smallest integer the JSON syntax can carry as a bare number.
pub const JSON_MIN_INT: i64 = -JSON_MAX_INT;
