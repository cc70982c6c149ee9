use std::fmt;

use thiserror::Error;

use crate::region::Region;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    #[error("interval end ({end}) must not precede start ({start})")]
    Inverted { start: i64, end: i64 },
}

/// A half-open genomic interval `[start, end)` in 0-based coordinates.
///
/// Zero-length intervals are valid and mark an insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenomicInterval {
    start: i64,
    end: i64,
}

impl GenomicInterval {
    pub fn new(start: i64, end: i64) -> Result<Self, IntervalError> {
        if end < start {
            return Err(IntervalError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build from a start and a length; negative lengths collapse to zero.
    pub fn from_len(start: i64, len: i64) -> Self {
        Self {
            start,
            end: start + len.max(0),
        }
    }

    /// Zero-length interval at `pos`.
    pub fn point(pos: i64) -> Self {
        Self { start: pos, end: pos }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn length(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `pos` lies inside `[start, end)`.
    pub fn contains(&self, pos: i64) -> bool {
        self.start <= pos && pos < self.end
    }

    /// True when the two intervals share at least one base.
    ///
    /// A zero-length interval intersects an interval that strictly surrounds
    /// its point, and another zero-length interval at the same point.
    pub fn intersects(&self, other: &GenomicInterval) -> bool {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => self.start == other.start,
            (true, false) => other.start < self.start && self.start < other.end,
            (false, true) => self.start < other.start && other.start < self.end,
            (false, false) => self.start < other.end && other.start < self.end,
        }
    }

    /// True when the intervals overlap or touch end-to-start.
    pub fn intersects_or_abuts(&self, other: &GenomicInterval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Union of two intervals that overlap or abut; `None` when there is a gap.
    pub fn merge(&self, other: &GenomicInterval) -> Option<GenomicInterval> {
        if !self.intersects_or_abuts(other) {
            return None;
        }
        Some(GenomicInterval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        })
    }

    pub fn intersection(&self, other: &GenomicInterval) -> Option<GenomicInterval> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end || self.intersects(other) {
            Some(GenomicInterval { start, end })
        } else {
            None
        }
    }

    /// Smallest interval spanning both.
    pub fn span(&self, other: &GenomicInterval) -> GenomicInterval {
        GenomicInterval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Extend the end by `room` bases, saturating at `i64::MAX`.
    pub fn padded(&self, room: u64) -> GenomicInterval {
        let room = room.min(i64::MAX as u64) as i64;
        GenomicInterval {
            start: self.start,
            end: self.end.saturating_add(room),
        }
    }

    /// Coalesce overlapping or abutting intervals into a sorted, disjoint list.
    pub fn merge_all(intervals: &[GenomicInterval]) -> Vec<GenomicInterval> {
        let mut sorted = intervals.to_vec();
        sorted.sort();

        let mut merged: Vec<GenomicInterval> = Vec::with_capacity(sorted.len());
        for iv in sorted {
            match merged.last_mut() {
                Some(last) if last.intersects_or_abuts(&iv) => {
                    last.end = last.end.max(iv.end);
                }
                _ => merged.push(iv),
            }
        }
        merged
    }
}

impl fmt::Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl From<&Region> for GenomicInterval {
    /// 1-based inclusive `chrom:start-end` to 0-based half-open.
    fn from(region: &Region) -> Self {
        let start = region.start.saturating_sub(1) as i64;
        Self {
            start,
            end: (region.end as i64).max(start),
        }
    }
}

/// Anything that occupies a genomic interval.
pub trait HasInterval {
    fn interval(&self) -> GenomicInterval;
}

impl HasInterval for GenomicInterval {
    fn interval(&self) -> GenomicInterval {
        *self
    }
}
