//! `Range` header parsing (RFC 7233 section 2.1).

use std::cmp;

use thiserror::Error;

const BYTES_UNIT: &str = "bytes";

/// Why a `Range` header could not produce a satisfiable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    /// The header does not follow the `bytes=` range grammar.
    #[error("malformed Range header")]
    Malformed,
    /// The header is well formed but none of its ranges overlap the
    /// representation.
    #[error("requested range not satisfiable")]
    Unsatisfiable,
}

/// A single requested range, resolved against the representation length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// Inclusive byte interval. `end` is `None` when the client asked for
    /// everything from `start` on and the total length is unknown.
    Bytes { start: u64, end: Option<u64> },
    /// The last `n` bytes of a representation whose length is unknown.
    Suffix(u64),
}

impl RangeSpec {
    /// Shorthand for a bounded interval.
    pub fn bytes(start: u64, end: u64) -> Self {
        RangeSpec::Bytes { start, end: Some(end) }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Merge overlapping and adjacent ranges.
    pub combine: bool,
}

/// Element of the range set before it is resolved against a length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawRange {
    Closed(u64, u64),
    From(u64),
    Suffix(u64),
}

/// Parses a `Range` header value against the representation length, `None`
/// when the length is unknown.
///
/// Ranges are returned in header order. A reversed range such as
/// `bytes=400-300` is grammatical, so it is dropped rather than reported as
/// malformed, and a header whose ranges are all dropped is
/// [`RangeError::Unsatisfiable`].
pub fn parse_range(
    total: Option<u64>,
    header: &str,
    options: ParseOptions,
) -> Result<Vec<RangeSpec>, RangeError> {
    let raw = parse_range_set(header)?;

    let mut resolved: Vec<(usize, RangeSpec)> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| resolve(raw, total).map(|spec| (index, spec)))
        .collect();

    if options.combine {
        resolved = combine(resolved);
    }

    if resolved.is_empty() {
        return Err(RangeError::Unsatisfiable);
    }

    Ok(resolved.into_iter().map(|(_, spec)| spec).collect())
}

fn parse_range_set(header: &str) -> Result<Vec<RawRange>, RangeError> {
    let (unit, set) = header.split_once('=').ok_or(RangeError::Malformed)?;
    if !unit.trim().eq_ignore_ascii_case(BYTES_UNIT) {
        return Err(RangeError::Malformed);
    }

    let ranges = set
        .split(',')
        .map(str::trim)
        .filter(|element| !element.is_empty())
        .map(parse_range_element)
        .collect::<Result<Vec<_>, _>>()?;

    if ranges.is_empty() {
        return Err(RangeError::Malformed);
    }

    Ok(ranges)
}

fn parse_range_element(element: &str) -> Result<RawRange, RangeError> {
    let (first, last) = element.split_once('-').ok_or(RangeError::Malformed)?;
    let (first, last) = (first.trim(), last.trim());

    match (first.is_empty(), last.is_empty()) {
        (true, true) => Err(RangeError::Malformed),
        (true, false) => Ok(RawRange::Suffix(parse_digits(last)?)),
        (false, true) => Ok(RawRange::From(parse_digits(first)?)),
        (false, false) => Ok(RawRange::Closed(parse_digits(first)?, parse_digits(last)?)),
    }
}

/// `1*DIGIT`. Values past `u64::MAX` saturate, they are still grammatical.
fn parse_digits(digits: &str) -> Result<u64, RangeError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::Malformed);
    }
    Ok(digits.bytes().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
    }))
}

fn resolve(raw: RawRange, total: Option<u64>) -> Option<RangeSpec> {
    match (raw, total) {
        (RawRange::Closed(start, end), _) if start > end => None,
        (RawRange::Closed(start, _) | RawRange::From(start), Some(total)) if start >= total => None,
        (RawRange::Closed(start, end), Some(total)) => Some(RangeSpec::bytes(start, cmp::min(end, total - 1))),
        (RawRange::Closed(start, end), None) => Some(RangeSpec::bytes(start, end)),
        (RawRange::From(start), Some(total)) => Some(RangeSpec::bytes(start, total - 1)),
        (RawRange::From(start), None) => Some(RangeSpec::Bytes { start, end: None }),
        (RawRange::Suffix(0), _) => None,
        (RawRange::Suffix(_), Some(0)) => None,
        (RawRange::Suffix(len), Some(total)) => Some(RangeSpec::bytes(total.saturating_sub(len), total - 1)),
        (RawRange::Suffix(len), None) => Some(RangeSpec::Suffix(len)),
    }
}

/// Merges overlapping or adjacent intervals. The merged ranges keep the
/// header position of their earliest member.
fn combine(ranges: Vec<(usize, RangeSpec)>) -> Vec<(usize, RangeSpec)> {
    let (mut intervals, mut merged): (Vec<_>, Vec<_>) = ranges
        .into_iter()
        .partition(|(_, spec)| matches!(spec, RangeSpec::Bytes { .. }));

    intervals.sort_by_key(|(_, spec)| match spec {
        RangeSpec::Bytes { start, .. } => *start,
        RangeSpec::Suffix(_) => u64::MAX,
    });

    let mut current: Option<(usize, u64, Option<u64>)> = None;
    for (index, spec) in intervals {
        let RangeSpec::Bytes { start, end } = spec else { continue };
        current = match current {
            None => Some((index, start, end)),
            Some((first, cur_start, cur_end)) => match cur_end {
                // unbounded end swallows everything after it
                None => Some((cmp::min(first, index), cur_start, None)),
                Some(cur_end) if start <= cur_end.saturating_add(1) => {
                    let end = end.map(|end| cmp::max(end, cur_end));
                    Some((cmp::min(first, index), cur_start, end))
                }
                Some(_) => {
                    merged.push((first, RangeSpec::Bytes { start: cur_start, end: cur_end }));
                    Some((index, start, end))
                }
            },
        };
    }
    if let Some((first, start, end)) = current {
        merged.push((first, RangeSpec::Bytes { start, end }));
    }

    merged.sort_by_key(|(index, _)| *index);
    merged
}
