//! Greedy assignment of overlapping records to display rows.

use crate::interval::{GenomicInterval, HasInterval};

/// Records sharing one vertical display level.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedRow<T> {
    /// 0 is the innermost row.
    pub level: usize,
    /// Ordered by increasing interval start.
    pub records: Vec<T>,
}

impl<T> PackedRow<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }
}

/// Packs intervals into the fewest rows a single left-to-right greedy scan
/// finds, keeping `breathing_room` bases between neighbours on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPacker {
    pub breathing_room: u64,
}

impl Default for IntervalPacker {
    fn default() -> Self {
        Self { breathing_room: 2 }
    }
}

impl IntervalPacker {
    pub fn new(breathing_room: u64) -> Self {
        Self { breathing_room }
    }

    /// Assign every record to the lowest row whose last padded end is at or
    /// before the record's start.
    ///
    /// Sorting is stable, so records starting at the same position keep input
    /// order and the earlier one gets the lower row.
    pub fn pack<T: HasInterval>(&self, records: Vec<T>) -> Vec<PackedRow<T>> {
        let mut keyed: Vec<(GenomicInterval, T)> =
            records.into_iter().map(|r| (r.interval(), r)).collect();
        keyed.sort_by_key(|(iv, _)| iv.start());

        let mut row_ends: Vec<i64> = Vec::new();
        let mut rows: Vec<PackedRow<T>> = Vec::new();

        for (iv, record) in keyed {
            let level = match row_ends.iter().position(|&end| end <= iv.start()) {
                Some(level) => level,
                None => {
                    rows.push(PackedRow {
                        level: rows.len(),
                        records: Vec::new(),
                    });
                    row_ends.push(i64::MIN);
                    rows.len() - 1
                }
            };
            row_ends[level] = iv.padded(self.breathing_room).end();
            rows[level].records.push(record);
        }

        rows
    }

    /// Row index for each input record, in input order.
    pub fn levels<T: HasInterval>(&self, records: &[T]) -> Vec<usize> {
        let indexed: Vec<Indexed> = records
            .iter()
            .enumerate()
            .map(|(index, r)| Indexed {
                index,
                interval: r.interval(),
            })
            .collect();

        let mut levels = vec![0; records.len()];
        for row in self.pack(indexed) {
            for rec in row.records {
                levels[rec.index] = row.level;
            }
        }
        levels
    }
}

struct Indexed {
    index: usize,
    interval: GenomicInterval,
}

impl HasInterval for Indexed {
    fn interval(&self) -> GenomicInterval {
        self.interval
    }
}

/// Largest number of padded footprints `[start, end + breathing_room)`
/// covering any single position. A zero-width footprint adds one at its own
/// position.
///
/// Greedy packing never needs more rows than this.
pub fn max_overlap_depth(intervals: &[GenomicInterval], breathing_room: u64) -> usize {
    let mut starts = Vec::with_capacity(intervals.len());
    let mut ends = Vec::with_capacity(intervals.len());
    let mut points = Vec::new();
    for iv in intervals {
        let end = iv.padded(breathing_room).end();
        if end > iv.start() {
            starts.push(iv.start());
            ends.push(end);
        } else {
            points.push(iv.start());
        }
    }
    starts.sort_unstable();
    ends.sort_unstable();
    points.sort_unstable();

    let covering = |pos: i64| {
        starts.partition_point(|&s| s <= pos) - ends.partition_point(|&e| e <= pos)
    };

    let widest = starts.iter().map(|&s| covering(s)).max().unwrap_or(0);
    let at_points = points.iter().map(|&p| covering(p) + 1).max().unwrap_or(0);
    widest.max(at_points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: i64, end: i64) -> GenomicInterval {
        GenomicInterval::new(start, end).unwrap()
    }

    fn starts(row: &PackedRow<GenomicInterval>) -> Vec<i64> {
        row.records.iter().map(|r| r.start()).collect()
    }

    #[test]
    fn test_pack_empty() {
        let rows = IntervalPacker::new(0).pack(Vec::<GenomicInterval>::new());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_overlapping_then_abutting() {
        let rows = IntervalPacker::new(0).pack(vec![iv(0, 10), iv(5, 15), iv(10, 20)]);
        assert_eq!(rows.len(), 2);
        assert_eq!(starts(&rows[0]), vec![0, 10]);
        assert_eq!(starts(&rows[1]), vec![5]);
        assert_eq!(rows[1].level, 1);
    }

    #[test]
    fn test_breathing_room_separates_abutting() {
        let rows = IntervalPacker::new(2).pack(vec![iv(0, 10), iv(10, 20), iv(12, 14)]);
        assert_eq!(rows.len(), 2);
        assert_eq!(starts(&rows[0]), vec![0, 12]);
        assert_eq!(starts(&rows[1]), vec![10]);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let rows = IntervalPacker::new(0).pack(vec![iv(30, 40), iv(0, 10), iv(15, 25)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(starts(&rows[0]), vec![0, 15, 30]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let rows = IntervalPacker::new(0).pack(vec![iv(0, 5), iv(0, 50), iv(0, 20)]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].records[0], iv(0, 5));
        assert_eq!(rows[1].records[0], iv(0, 50));
        assert_eq!(rows[2].records[0], iv(0, 20));
    }

    #[test]
    fn test_zero_length_insertions() {
        // two insertions at the same point: width 0, so they share a row
        // unless breathing room pushes them apart
        let same_point = vec![iv(5, 5), iv(5, 5)];
        assert_eq!(IntervalPacker::new(0).pack(same_point.clone()).len(), 1);
        assert_eq!(IntervalPacker::new(1).pack(same_point).len(), 2);
    }

    #[test]
    fn test_all_overlapping_one_row_each() {
        let input: Vec<_> = (0..6).map(|i| iv(i, 100)).collect();
        let rows = IntervalPacker::new(0).pack(input);
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.len() == 1));
    }

    #[test]
    fn test_levels_in_input_order() {
        let levels = IntervalPacker::new(0).levels(&[iv(10, 20), iv(0, 10), iv(5, 15)]);
        assert_eq!(levels, vec![0, 0, 1]);
    }

    #[test]
    fn test_max_overlap_depth() {
        assert_eq!(max_overlap_depth(&[], 0), 0);
        assert_eq!(max_overlap_depth(&[iv(0, 10), iv(5, 15), iv(10, 20)], 0), 2);
        assert_eq!(max_overlap_depth(&[iv(0, 10), iv(10, 20)], 0), 1);
        assert_eq!(max_overlap_depth(&[iv(0, 10), iv(10, 20)], 1), 2);
        assert_eq!(max_overlap_depth(&[iv(5, 5), iv(5, 5)], 0), 1);
        assert_eq!(max_overlap_depth(&[iv(0, 10), iv(5, 5)], 0), 2);
    }

    #[test]
    fn test_unbounded_room_puts_each_record_on_its_own_row() {
        let rows = IntervalPacker::new(u64::MAX).pack(vec![iv(0, 10), iv(1_000, 1_010), iv(5_000, 5_001)]);
        assert_eq!(rows.len(), 3);
        assert_eq!(max_overlap_depth(&[iv(0, 10), iv(1_000, 1_010)], u64::MAX), 2);
    }
}
