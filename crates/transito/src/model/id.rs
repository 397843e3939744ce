//! UUID helpers for the `u` tag.
//!
//! On the wire a UUID is normally its canonical hyphenated string. Some
//! writers emit it instead as two signed 64-bit integers: the most and least
//! significant halves in two's complement.

use uuid::Uuid;

/// The nil UUID.
pub const NIL_UUID: Uuid = Uuid::nil();

/// Builds a UUID from its most/least significant halves.
pub fn uuid_from_halves(msb: i64, lsb: i64) -> Uuid {
    let bits = ((msb as u64 as u128) << 64) | (lsb as u64 as u128);
    Uuid::from_u128(bits)
}

/// Splits a UUID into its most/least significant halves.
pub fn uuid_halves(uuid: &Uuid) -> (i64, i64) {
    let bits = uuid.as_u128();
    ((bits >> 64) as u64 as i64, bits as u64 as i64)
}

/// Formats a UUID as lowercase hyphenated hex.
pub fn format_uuid(uuid: &Uuid) -> String {
    uuid.hyphenated().to_string()
}

/// Parses a UUID from hex (with or without hyphens).
pub fn parse_uuid(s: &str) -> Option<Uuid> {
    Uuid::parse_str(s).ok()
}
