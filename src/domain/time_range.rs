use std::{fmt, iter::FusedIterator};

use crate::utils::epoch_sec_to_utc;

/// Half-open interval `[start, end)` of Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: i64,
    end: i64,
}

impl TimeRange {
    /// `None` when `start > end`.
    pub fn new(start: i64, end: i64) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn span_secs(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.start <= timestamp && timestamp < self.end
    }

    /// Splits the range into request-sized pieces. See [`chunks`].
    pub fn chunks(&self, step_secs: i64, max_items_per_request: usize) -> RangeChunks {
        chunks(*self, step_secs, max_items_per_request)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            epoch_sec_to_utc(self.start),
            epoch_sec_to_utc(self.end)
        )
    }
}

/// Lazily splits `range` into consecutive sub-ranges of at most
/// `step_secs * max_items_per_request` seconds each.
///
/// The chunks tile `range` exactly: the first starts at `range.start()`, each
/// chunk's end is the next chunk's start and the last ends at `range.end()`.
/// An empty range, or a non-positive chunk span, yields nothing.
pub fn chunks(range: TimeRange, step_secs: i64, max_items_per_request: usize) -> RangeChunks {
    let span = i64::try_from(max_items_per_request)
        .ok()
        .and_then(|items| step_secs.checked_mul(items))
        .unwrap_or(i64::MAX);
    let cursor = if span > 0 { range.start } else { range.end };
    RangeChunks {
        cursor,
        end: range.end,
        span: span.max(1),
    }
}

#[derive(Debug, Clone)]
pub struct RangeChunks {
    cursor: i64,
    end: i64,
    span: i64,
}

impl Iterator for RangeChunks {
    type Item = TimeRange;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.end {
            return None;
        }
        let chunk_end = self.cursor.saturating_add(self.span).min(self.end);
        let chunk = TimeRange {
            start: self.cursor,
            end: chunk_end,
        };
        self.cursor = chunk_end;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.cursor >= self.end {
            return (0, Some(0));
        }
        let remaining = (self.end - self.cursor) as u64;
        let n = remaining.div_ceil(self.span as u64) as usize;
        (n, Some(n))
    }
}

impl FusedIterator for RangeChunks {}
