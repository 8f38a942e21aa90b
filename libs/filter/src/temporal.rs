//! Duration and timestamp literal helpers shared by the lexer and the resolver.

use chrono::{DateTime, FixedOffset, TimeDelta};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Unit spelling -> (magnitude order, nanoseconds per unit). Larger order means a larger unit.
static DURATION_UNITS: phf::Map<&'static str, (u8, i128)> = phf::phf_map! {
    "h" => (5, 3_600 * NANOS_PER_SECOND),
    "m" => (4, 60 * NANOS_PER_SECOND),
    "s" => (3, NANOS_PER_SECOND),
    "ms" => (2, 1_000_000),
    "us" => (1, 1_000),
    "µs" => (1, 1_000),
    "μs" => (1, 1_000),
    "ns" => (0, 1),
};

/// Candidate spellings, two-letter units first so `ms` wins over `m`.
const UNIT_SPELLINGS: [&str; 8] = ["ns", "us", "µs", "μs", "ms", "h", "m", "s"];

/// Orders below this one are sub-second units.
pub(crate) const SECOND_ORDER: u8 = 3;

/// Longest duration unit at the start of `input`, with its magnitude order.
pub(crate) fn match_unit(input: &str) -> Option<(&'static str, u8)> {
    UNIT_SPELLINGS
        .iter()
        .find(|unit| input.starts_with(**unit))
        .and_then(|unit| DURATION_UNITS.get(*unit).map(|(order, _)| (*unit, *order)))
}

/// Parse a duration literal such as `1h30m`, `-1.5s` or `250ms`.
///
/// Components must appear in strictly descending unit order and a fractional
/// component may not follow a sub-second unit.
pub fn parse_duration(input: &str) -> Option<TimeDelta> {
    let (negative, mut rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    if rest.is_empty() {
        return None;
    }

    let mut total: i128 = 0;
    let mut last_order: Option<u8> = None;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if int_len == 0 {
            return None;
        }
        let (int_part, after) = rest.split_at(int_len);
        rest = after;

        let mut fraction = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
            if frac_len == 0 {
                return None;
            }
            fraction = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }

        let (unit, order) = match_unit(rest)?;
        rest = &rest[unit.len()..];
        if last_order.is_some_and(|last| order >= last) {
            return None;
        }
        if !fraction.is_empty() && last_order.is_some_and(|last| last < SECOND_ORDER) {
            return None;
        }
        let (_, unit_nanos) = DURATION_UNITS.get(unit)?;

        let whole: i128 = int_part.parse().ok()?;
        total = total.checked_add(whole.checked_mul(*unit_nanos)?)?;
        if !fraction.is_empty() {
            // Digits past nanosecond precision cannot contribute.
            let digits = &fraction[..fraction.len().min(18)];
            let numerator: i128 = digits.parse().ok()?;
            let scale = 10i128.checked_pow(digits.len() as u32)?;
            total = total.checked_add(numerator * unit_nanos / scale)?;
        }
        last_order = Some(order);
    }

    if negative {
        total = -total;
    }
    let seconds = i64::try_from(total.div_euclid(NANOS_PER_SECOND)).ok()?;
    let nanos = total.rem_euclid(NANOS_PER_SECOND) as u32;
    TimeDelta::new(seconds, nanos)
}

/// Render a duration the way it is accepted back, in seconds (`90s`, `-0.25s`).
pub fn format_duration(duration: &TimeDelta) -> String {
    let total = duration.num_seconds() as i128 * NANOS_PER_SECOND
        + duration.subsec_nanos() as i128;
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    let seconds = total / NANOS_PER_SECOND;
    let nanos = total % NANOS_PER_SECOND;
    if nanos == 0 {
        format!("{sign}{seconds}s")
    } else {
        let fraction = format!("{nanos:09}");
        format!("{sign}{seconds}.{}s", fraction.trim_end_matches('0'))
    }
}

/// Parse an RFC 3339 timestamp, keeping its offset.
pub fn parse_timestamp(input: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(input).ok()
}

pub(crate) fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub(crate) fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}
