//! RFC 3339 timestamp parsing and formatting at millisecond resolution.
//!
//! Converts between RFC 3339 date-time strings and milliseconds since the
//! Unix epoch. Formatting always produces UTC with exactly three fractional
//! digits (`YYYY-MM-DDTHH:MM:SS.mmmZ`); parsing accepts any offset and any
//! number of fractional digits, truncating to milliseconds.

const MILLISECONDS_PER_SECOND: i64 = 1_000;
const MILLISECONDS_PER_MINUTE: i64 = 60 * MILLISECONDS_PER_SECOND;
const MILLISECONDS_PER_HOUR: i64 = 60 * MILLISECONDS_PER_MINUTE;
const MILLISECONDS_PER_DAY: i64 = 24 * MILLISECONDS_PER_HOUR;

/// `0000-01-01T00:00:00.000Z`, the earliest instant with a four-digit year.
pub const MIN_RFC3339_MILLIS: i64 = -62_167_219_200_000;
/// `9999-12-31T23:59:59.999Z`, the latest instant with a four-digit year.
pub const MAX_RFC3339_MILLIS: i64 = 253_402_300_799_999;

/// Returns true if `epoch_millis` formats to a string that
/// [`parse_timestamp_millis`] accepts.
pub fn has_rfc3339_form(epoch_millis: i64) -> bool {
    (MIN_RFC3339_MILLIS..=MAX_RFC3339_MILLIS).contains(&epoch_millis)
}

/// Error type for RFC 3339 parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeParseError {
    pub message: String,
}

impl DateTimeParseError {
    fn invalid(what: &str, input: &str) -> Self {
        Self {
            message: format!("Invalid {} in timestamp: {}", what, input),
        }
    }
}

impl std::fmt::Display for DateTimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DateTimeParseError {}

/// Parses a timezone offset string (Z, +HH:MM, -HH:MM) and returns offset in minutes.
fn parse_timezone_offset(offset: &str) -> Result<i64, DateTimeParseError> {
    if offset == "Z" || offset == "z" {
        return Ok(0);
    }

    let bytes = offset.as_bytes();
    if bytes.len() != 6 || bytes[3] != b':' {
        return Err(DateTimeParseError::invalid("timezone offset", offset));
    }

    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return Err(DateTimeParseError::invalid("timezone offset", offset)),
    };

    let hours: i64 = parse_digits(&offset[1..3])
        .ok_or_else(|| DateTimeParseError::invalid("timezone offset", offset))?;
    let minutes: i64 = parse_digits(&offset[4..6])
        .ok_or_else(|| DateTimeParseError::invalid("timezone offset", offset))?;

    // 24:00 is the widest offset accepted
    if hours > 24 || (hours == 24 && minutes != 0) || minutes > 59 {
        return Err(DateTimeParseError::invalid("timezone offset", offset));
    }

    Ok(sign * (hours * 60 + minutes))
}

/// Parses a fixed-width run of ASCII digits.
fn parse_digits(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parses fractional seconds and returns milliseconds, truncating extra digits.
fn parse_fractional_millis(frac: &str) -> i64 {
    let mut padded: String = frac.chars().take(3).collect();
    while padded.len() < 3 {
        padded.push('0');
    }
    padded.parse().unwrap_or(0)
}

/// Returns true if the given year is a leap year.
fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Returns the number of days in a given month (1-indexed).
fn days_in_month(year: i64, month: i64) -> i64 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Calculates days since Unix epoch for a given civil date.
fn date_to_days(year: i64, month: i64, day: i64) -> i64 {
    // Howard Hinnant's days_from_civil
    let y = if month <= 2 { year - 1 } else { year };
    let m = if month <= 2 { month + 9 } else { month - 3 };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let doy = (153 * m + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;

    era * 146097 + doe - 719468
}

/// Converts days since Unix epoch to (year, month, day).
fn days_to_date(days: i64) -> (i64, i64, i64) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };

    (if m <= 2 { y + 1 } else { y }, m, d)
}

/// Parses an RFC 3339 date-time string and returns milliseconds since the
/// Unix epoch, in UTC.
pub fn parse_timestamp_millis(s: &str) -> Result<i64, DateTimeParseError> {
    // Minimum length is 19 (YYYY-MM-DDTHH:MM:SS)
    if !s.is_ascii() || s.len() < 19 {
        return Err(DateTimeParseError {
            message: format!("Invalid RFC 3339 timestamp: {}", s),
        });
    }

    let bytes = s.as_bytes();
    if bytes[4] != b'-'
        || bytes[7] != b'-'
        || !matches!(bytes[10], b'T' | b't' | b' ')
        || bytes[13] != b':'
        || bytes[16] != b':'
    {
        return Err(DateTimeParseError {
            message: format!("Invalid RFC 3339 timestamp: {}", s),
        });
    }

    let year = parse_digits(&s[..4]).ok_or_else(|| DateTimeParseError::invalid("year", s))?;
    let month = parse_digits(&s[5..7]).ok_or_else(|| DateTimeParseError::invalid("month", s))?;
    let day = parse_digits(&s[8..10]).ok_or_else(|| DateTimeParseError::invalid("day", s))?;
    let hours = parse_digits(&s[11..13]).ok_or_else(|| DateTimeParseError::invalid("hours", s))?;
    let minutes =
        parse_digits(&s[14..16]).ok_or_else(|| DateTimeParseError::invalid("minutes", s))?;
    let seconds =
        parse_digits(&s[17..19]).ok_or_else(|| DateTimeParseError::invalid("seconds", s))?;

    if !(1..=12).contains(&month) {
        return Err(DateTimeParseError::invalid("month", s));
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(DateTimeParseError::invalid("day", s));
    }
    if hours > 23 {
        return Err(DateTimeParseError::invalid("hours", s));
    }
    if minutes > 59 {
        return Err(DateTimeParseError::invalid("minutes", s));
    }
    if seconds > 59 {
        return Err(DateTimeParseError::invalid("seconds", s));
    }

    // Optional fractional seconds, then optional offset
    let rest = &s[19..];
    let (fraction, offset_str) = match rest.strip_prefix('.') {
        Some(after_dot) => {
            let frac_end = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            if frac_end == 0 {
                return Err(DateTimeParseError::invalid("fractional seconds", s));
            }
            (&after_dot[..frac_end], &after_dot[frac_end..])
        }
        None => ("", rest),
    };

    let offset_min = if offset_str.is_empty() {
        0
    } else {
        parse_timezone_offset(offset_str)?
    };

    let local_millis = date_to_days(year, month, day) * MILLISECONDS_PER_DAY
        + hours * MILLISECONDS_PER_HOUR
        + minutes * MILLISECONDS_PER_MINUTE
        + seconds * MILLISECONDS_PER_SECOND
        + parse_fractional_millis(fraction);

    // local time = UTC + offset, so UTC = local - offset
    Ok(local_millis - offset_min * MILLISECONDS_PER_MINUTE)
}

/// Formats milliseconds since the Unix epoch as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
///
/// Instants outside [`has_rfc3339_form`] get a signed or five-digit year
/// that does not parse back.
pub fn format_timestamp_millis(epoch_millis: i64) -> String {
    let days = epoch_millis.div_euclid(MILLISECONDS_PER_DAY);
    let time_millis = epoch_millis.rem_euclid(MILLISECONDS_PER_DAY);

    let (year, month, day) = days_to_date(days);

    let hours = time_millis / MILLISECONDS_PER_HOUR;
    let minutes = (time_millis % MILLISECONDS_PER_HOUR) / MILLISECONDS_PER_MINUTE;
    let seconds = (time_millis % MILLISECONDS_PER_MINUTE) / MILLISECONDS_PER_SECOND;
    let millis = time_millis % MILLISECONDS_PER_SECOND;

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year, month, day, hours, minutes, seconds, millis
    )
}
