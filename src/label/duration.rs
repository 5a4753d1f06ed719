//! Duration label syntax.
//!
//! Accepts a sequence of `<number><unit>` terms (`1m30s`, `250ms`, `1.5h`)
//! with units `ns`, `us`, `µs`, `ms`, `s`, `m`, `h`, or a bare integer
//! meaning seconds.

use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

const UNITS: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("ms", 1_000_000),
    ("s", NANOS_PER_SEC),
    ("m", 60 * NANOS_PER_SEC),
    ("h", 3600 * NANOS_PER_SEC),
];

/// Parse a duration label value.
pub fn parse(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let out_of_range = || format!("duration {:?} out of range", raw);
    let mut nanos: u128 = 0;
    let mut rest = raw;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration {:?}", raw))?;
        let number = &rest[..num_end];
        rest = &rest[num_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| format!("unknown unit {:?} in duration {:?}", unit, raw))?;
        rest = &rest[unit_end..];

        let term = term_nanos(number, scale).ok_or_else(|| format!("invalid number in duration {:?}", raw))?;
        nanos = nanos.checked_add(term).ok_or_else(out_of_range)?;
    }

    let secs = u64::try_from(nanos / NANOS_PER_SEC).map_err(|_| out_of_range())?;
    Ok(Duration::new(secs, (nanos % NANOS_PER_SEC) as u32))
}

/// `<int>[.<frac>]` scaled to nanoseconds. The integer part is exact; only
/// the fraction goes through floating point.
fn term_nanos(number: &str, scale: u128) -> Option<u128> {
    let (int, frac) = match number.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (number, None),
    };
    if int.is_empty() && frac.map_or(true, str::is_empty) {
        return None;
    }

    let whole = match int {
        "" => 0,
        digits => digits.parse::<u128>().ok()?.checked_mul(scale)?,
    };
    let part = match frac {
        None | Some("") => 0,
        Some(digits) if digits.bytes().all(|b| b.is_ascii_digit()) => {
            let fraction: f64 = format!("0.{}", digits).parse().ok()?;
            (fraction * scale as f64).round() as u128
        }
        Some(_) => return None,
    };
    whole.checked_add(part)
}

/// Format a duration so that [`parse`] reads it back exactly.
pub fn format(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        "0s".to_string()
    } else if nanos % 1_000_000_000 == 0 {
        format!("{}s", d.as_secs())
    } else if nanos % 1_000_000 == 0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{}ns", nanos)
    }
}

/// Serde adapter writing durations in label syntax.
pub mod serde_text {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse(&raw).map_err(serde::de::Error::custom)
    }
}
