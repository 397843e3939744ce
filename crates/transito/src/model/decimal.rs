//! Arbitrary-precision decimal numbers (tag `f`).

use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, Sign};

/// Longest run of zeros written after the point before switching to
/// exponent form.
const MAX_LEADING_ZEROS: u64 = 64;

/// Arbitrary-precision decimal: value = mantissa * 10^-scale.
///
/// The scale is kept as written, so `1.50` and `1.5` are distinct values
/// with distinct text forms. No normalisation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigDecimal {
    mantissa: BigInt,
    scale: i64,
}

/// Error returned when a decimal string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDecimalError {
    pub input: String,
}

impl fmt::Display for ParseDecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid decimal literal: {:?}", self.input)
    }
}

impl std::error::Error for ParseDecimalError {}

impl BigDecimal {
    pub fn new(mantissa: BigInt, scale: i64) -> Self {
        Self { mantissa, scale }
    }

    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    /// Number of digits after the decimal point (negative for trailing zeros
    /// folded into the exponent).
    pub fn scale(&self) -> i64 {
        self.scale
    }
}

impl FromStr for BigDecimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError { input: s.to_string() };

        let (number, exponent) = match s.find(['e', 'E']) {
            Some(i) => {
                let exp: i64 = s[i + 1..].parse().map_err(|_| err())?;
                (&s[..i], exp)
            }
            None => (s, 0),
        };

        let (int_part, frac_part) = match number.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (number, ""),
        };

        let (negative, int_digits) = match int_part.as_bytes().first() {
            Some(b'-') => (true, &int_part[1..]),
            Some(b'+') => (false, &int_part[1..]),
            _ => (false, int_part),
        };

        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if (int_digits.is_empty() && frac_part.is_empty())
            || !all_digits(int_digits)
            || !all_digits(frac_part)
        {
            return Err(err());
        }

        let digits = format!("{}{}", int_digits, frac_part);
        let magnitude = BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(err)?;
        let mantissa = if negative { -magnitude } else { magnitude };

        let scale = i64::try_from(frac_part.len())
            .ok()
            .and_then(|len| len.checked_sub(exponent))
            .ok_or_else(err)?;
        Ok(Self { mantissa, scale })
    }
}

impl fmt::Display for BigDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.mantissa.sign() == Sign::Minus { "-" } else { "" };
        let digits = self.mantissa.magnitude().to_string();

        if self.scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        if self.scale < 0 {
            return write!(f, "{}{}E{}", sign, digits, self.scale.unsigned_abs());
        }

        let scale = self.scale.unsigned_abs();
        let len = digits.len() as u64;
        if len > scale {
            let (int_part, frac_part) = digits.split_at((len - scale) as usize);
            write!(f, "{}{}.{}", sign, int_part, frac_part)
        } else if scale - len <= MAX_LEADING_ZEROS {
            write!(f, "{}0.{:0>width$}", sign, digits, width = scale as usize)
        } else {
            write!(f, "{}{}E-{}", sign, digits, scale)
        }
    }
}
