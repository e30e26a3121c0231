//! Duration text such as `"1h30m"`, `"-1.5s"`, or `"300ms"`.
//!
//! A duration is an optional sign followed by one or more decimal numbers,
//! each with an optional fraction and a mandatory unit. Valid units are `ns`,
//! `us` (or `µs`), `ms`, `s`, `m`, and `h`. The bare string `"0"` is also
//! accepted.

use chrono::TimeDelta;

use crate::{Error, Result};

const NANOSECOND: u64 = 1;
const MICROSECOND: u64 = 1_000 * NANOSECOND;
const MILLISECOND: u64 = 1_000 * MICROSECOND;
const SECOND: u64 = 1_000 * MILLISECOND;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;

/// Magnitude of `i64::MIN`, the largest total a negative duration may reach.
const LIMIT: u64 = 1 << 63;

fn unit(name: &str) -> Option<u64> {
    match name {
        "ns" => Some(NANOSECOND),
        "us" | "µs" | "μs" => Some(MICROSECOND),
        "ms" => Some(MILLISECOND),
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        _ => None,
    }
}

/// Split off the leading digits of `s`.
fn digits(s: &str) -> (&str, &str) {
    let end = s.bytes().position(|c| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

/// Parse an integer part, failing past [`LIMIT`].
fn integer(digits: &str) -> Option<u64> {
    digits.bytes().try_fold(0u64, |x, c| {
        x.checked_mul(10)?
            .checked_add(u64::from(c - b'0'))
            .filter(|&x| x <= LIMIT)
    })
}

/// Parse a fraction, returning its value and scale.
///
/// Digits beyond what fits are ignored.
fn fraction(digits: &str) -> (u64, f64) {
    let mut x = 0u64;
    let mut scale = 1.0;

    for c in digits.bytes() {
        match x.checked_mul(10).and_then(|x| x.checked_add(u64::from(c - b'0'))) {
            Some(next) if next <= LIMIT => {
                x = next;
                scale *= 10.0;
            }
            _ => break,
        }
    }

    (x, scale)
}

pub(crate) fn parse(input: &str) -> Result<TimeDelta> {
    let invalid = || Error::Duration {
        input: input.to_owned(),
    };

    let (negative, mut s) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if s == "0" {
        return Ok(TimeDelta::zero());
    }
    if s.is_empty() {
        Err(invalid())?;
    }

    let mut total = 0u64;

    while !s.is_empty() {
        let (int, rest) = digits(s);
        s = rest;
        let value = integer(int).ok_or_else(invalid)?;

        let (frac, scale, has_frac) = match s.strip_prefix('.') {
            Some(rest) => {
                let (frac, rest) = digits(rest);
                s = rest;
                let (value, scale) = fraction(frac);
                (value, scale, !frac.is_empty())
            }
            None => (0, 1.0, false),
        };

        if int.is_empty() && !has_frac {
            Err(invalid())?;
        }

        let end = s
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(s.len());
        let (name, rest) = s.split_at(end);
        s = rest;
        let unit = unit(name).ok_or_else(invalid)?;

        let mut v = value.checked_mul(unit).filter(|&v| v <= LIMIT).ok_or_else(invalid)?;
        if frac > 0 {
            // Float arithmetic keeps the scaled fraction from overflowing.
            let extra = (frac as f64 * (unit as f64 / scale)) as u64;
            v = v.checked_add(extra).filter(|&v| v <= LIMIT).ok_or_else(invalid)?;
        }

        total = total.checked_add(v).filter(|&t| t <= LIMIT).ok_or_else(invalid)?;
    }

    let nanos = match (negative, i64::try_from(total)) {
        (false, Ok(n)) => n,
        (true, Ok(n)) => -n,
        (true, Err(_)) => i64::MIN,
        (false, Err(_)) => Err(invalid())?,
    };

    Ok(TimeDelta::nanoseconds(nanos))
}
