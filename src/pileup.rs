//! Per-position nucleotide coverage accumulated from aligned reads.

use std::collections::BTreeMap;

use log::debug;

use crate::alignment::{AlignedRead, CigarOp};
use crate::interval::GenomicInterval;

/// Coverage buckets, in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Nucleotide {
    A,
    C,
    G,
    T,
    Other,
}

impl Nucleotide {
    pub const ALL: [Nucleotide; 5] = [
        Nucleotide::A,
        Nucleotide::C,
        Nucleotide::G,
        Nucleotide::T,
        Nucleotide::Other,
    ];

    pub fn from_base(base: u8) -> Self {
        match base.to_ascii_uppercase() {
            b'A' => Nucleotide::A,
            b'C' => Nucleotide::C,
            b'G' => Nucleotide::G,
            b'T' => Nucleotide::T,
            _ => Nucleotide::Other,
        }
    }

    pub fn to_base(self) -> u8 {
        match self {
            Nucleotide::A => b'A',
            Nucleotide::C => b'C',
            Nucleotide::G => b'G',
            Nucleotide::T => b'T',
            Nucleotide::Other => b'N',
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Coverage at a single reference position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pileup {
    pub position: i64,
    coverage: [f64; 5],
}

impl Pileup {
    pub fn new(position: i64) -> Self {
        Self {
            position,
            coverage: [0.0; 5],
        }
    }

    /// Add `weight` to the bucket of `base`. Non-positive and non-finite
    /// weights are ignored so coverage stays non-negative.
    pub fn pile_on(&mut self, base: u8, weight: f64) {
        if weight.is_finite() && weight > 0.0 {
            self.coverage[Nucleotide::from_base(base).index()] += weight;
        }
    }

    pub fn coverage(&self, nucleotide: Nucleotide) -> f64 {
        self.coverage[nucleotide.index()]
    }

    pub fn total(&self) -> f64 {
        self.coverage.iter().sum()
    }

    /// Most-covered bucket; ties go to the earlier bucket in A, C, G, T, N.
    pub fn largest(&self) -> Option<Nucleotide> {
        self.best_among(|_| true)
    }

    /// Most-covered called base (A, C, G or T) other than the reference
    /// base. Ambiguous bases never form a consensus.
    pub fn consensus(&self, reference_base: u8) -> Option<Nucleotide> {
        let reference = Nucleotide::from_base(reference_base);
        self.best_among(|n| n != reference && n != Nucleotide::Other)
    }

    /// Share of coverage that disagrees with the reference base.
    pub fn mismatch_fraction(&self, reference_base: u8) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        let matching = self.coverage(Nucleotide::from_base(reference_base));
        (total - matching) / total
    }

    fn best_among(&self, keep: impl Fn(Nucleotide) -> bool) -> Option<Nucleotide> {
        let mut best: Option<(Nucleotide, f64)> = None;
        for n in Nucleotide::ALL.into_iter().filter(|&n| keep(n)) {
            let c = self.coverage(n);
            if c <= 0.0 {
                continue;
            }
            match best {
                Some((_, top)) if c <= top => {}
                _ => best = Some((n, c)),
            }
        }
        best.map(|(n, _)| n)
    }
}

/// Pileups for a contiguous window `[start, start + length)`.
///
/// Built fresh for each render pass. Positions outside the window are
/// silently ignored.
#[derive(Debug, Clone)]
pub struct PileupAccumulator {
    window: GenomicInterval,
    piles: Vec<Pileup>,
}

impl PileupAccumulator {
    pub fn new(start: i64, length: usize) -> Self {
        let window = GenomicInterval::from_len(start, length as i64);
        let piles = (0..length as i64).map(|i| Pileup::new(start + i)).collect();
        Self { window, piles }
    }

    pub fn for_window(window: GenomicInterval) -> Self {
        Self::new(window.start(), window.length().max(0) as usize)
    }

    pub fn window(&self) -> GenomicInterval {
        self.window
    }

    fn slot(&self, position: i64) -> Option<usize> {
        self.window
            .contains(position)
            .then(|| (position - self.window.start()) as usize)
    }

    pub fn pile_on(&mut self, position: i64, base: u8, weight: f64) {
        if let Some(i) = self.slot(position) {
            self.piles[i].pile_on(base, weight);
        }
    }

    pub fn pileup(&self, position: i64) -> Option<&Pileup> {
        self.slot(position).map(|i| &self.piles[i])
    }

    pub fn coverage(&self, position: i64, base: u8) -> f64 {
        self.pileup(position)
            .map(|p| p.coverage(Nucleotide::from_base(base)))
            .unwrap_or(0.0)
    }

    pub fn total_coverage(&self, position: i64) -> f64 {
        self.pileup(position).map(Pileup::total).unwrap_or(0.0)
    }

    pub fn largest_base(&self, position: i64) -> Option<u8> {
        self.pileup(position)?.largest().map(Nucleotide::to_base)
    }

    /// Dominant non-reference base at `position`, for SNP highlighting.
    pub fn consensus_base(&self, position: i64, reference_base: u8) -> Option<u8> {
        self.pileup(position)?
            .consensus(reference_base)
            .map(Nucleotide::to_base)
    }

    pub fn mismatch_fraction(&self, position: i64, reference_base: u8) -> f64 {
        self.pileup(position)
            .map(|p| p.mismatch_fraction(reference_base))
            .unwrap_or(0.0)
    }

    pub fn max_total_coverage(&self) -> f64 {
        self.piles.iter().map(Pileup::total).fold(0.0, f64::max)
    }

    /// Pile every aligned base of `read` with unit weight.
    pub fn pile_read(&mut self, read: &AlignedRead) {
        self.pile_read_weighted(read, |_| 1.0);
    }

    /// Pile every aligned base of `read`, weighting each by `weight(quality)`.
    ///
    /// Reads without qualities pass `None`. Unmapped reads and reads without
    /// stored bases contribute nothing. A Match span running past the stored
    /// bases is skipped, but the cursors still advance so the rest of the read
    /// lands in the right place.
    pub fn pile_read_weighted<F>(&mut self, read: &AlignedRead, weight: F)
    where
        F: Fn(Option<u8>) -> f64,
    {
        if read.is_unmapped() || read.sequence.is_empty() {
            return;
        }
        if !read.interval.intersects_or_abuts(&self.window) {
            return;
        }

        let mut ref_pos = read.start();
        let mut read_pos = 0usize;

        for op in &read.cigar {
            if let CigarOp::Match(n) = *op {
                let n = n as usize;
                match read.sequence.get(read_pos..read_pos + n) {
                    Some(bases) => {
                        for (i, &base) in bases.iter().enumerate() {
                            let q = read.qualities.get(read_pos + i).copied();
                            self.pile_on(ref_pos + i as i64, base, weight(q));
                        }
                    }
                    None => debug!(
                        "skipping {n}M at read offset {read_pos} of {}: only {} bases stored",
                        read.name.as_deref().unwrap_or("<unnamed>"),
                        read.sequence.len()
                    ),
                }
            }
            ref_pos += op.ref_len() as i64;
            read_pos += op.read_len() as usize;
        }
    }

    pub fn pileups(&self) -> impl Iterator<Item = &Pileup> {
        self.piles.iter()
    }

    /// Covered positions only, keyed by position.
    pub fn into_table(self) -> BTreeMap<i64, Pileup> {
        self.piles
            .into_iter()
            .filter(|p| p.total() > 0.0)
            .map(|p| (p.position, p))
            .collect()
    }
}

/// Probability that a base with Phred quality `q` is correct.
pub fn quality_weight(quality: Option<u8>) -> f64 {
    match quality {
        Some(255) | None => 1.0,
        Some(q) => 1.0 - 10f64.powf(-(q as f64) / 10.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn read(start: i64, cigar: Vec<CigarOp>, seq: &[u8]) -> AlignedRead {
        AlignedRead::new("r", start, cigar, seq)
    }

    #[test]
    fn test_mismatch_against_reference() {
        let reference = b"ACGG";
        let mut acc = PileupAccumulator::new(100, 4);
        acc.pile_read(&read(100, vec![CigarOp::Match(4)], b"ACGT"));

        for (i, &ref_base) in reference.iter().enumerate() {
            let pos = 100 + i as i64;
            assert_relative_eq!(acc.total_coverage(pos), 1.0);
            let snp = acc.consensus_base(pos, ref_base);
            if pos == 103 {
                assert_eq!(snp, Some(b'T'));
            } else {
                assert_eq!(snp, None);
            }
        }
    }

    #[test]
    fn test_g_has_its_own_bucket() {
        let mut acc = PileupAccumulator::new(0, 1);
        acc.pile_on(0, b'G', 1.0);
        assert_relative_eq!(acc.coverage(0, b'G'), 1.0);
        assert_relative_eq!(acc.coverage(0, b'A'), 0.0);
        assert_eq!(acc.largest_base(0), Some(b'G'));
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut acc = PileupAccumulator::new(10, 5);
        acc.pile_on(9, b'A', 1.0);
        acc.pile_on(15, b'A', 1.0);
        assert!(acc.pileups().all(|p| p.total() == 0.0));
        assert_eq!(acc.largest_base(9), None);
        assert_relative_eq!(acc.total_coverage(100), 0.0);
    }

    #[test]
    fn test_bad_weights_ignored() {
        let mut pile = Pileup::new(0);
        pile.pile_on(b'A', -1.0);
        pile.pile_on(b'A', f64::NAN);
        pile.pile_on(b'A', 0.0);
        assert_relative_eq!(pile.total(), 0.0);
        assert_eq!(pile.largest(), None);
    }

    #[test]
    fn test_lowercase_and_other() {
        let mut pile = Pileup::new(0);
        pile.pile_on(b'a', 1.0);
        pile.pile_on(b'N', 2.0);
        pile.pile_on(b'-', 1.0);
        assert_relative_eq!(pile.coverage(Nucleotide::A), 1.0);
        assert_relative_eq!(pile.coverage(Nucleotide::Other), 3.0);
        assert_eq!(pile.largest(), Some(Nucleotide::Other));
    }

    #[test]
    fn test_ties_follow_base_priority() {
        let mut pile = Pileup::new(0);
        for base in [b'T', b'G', b'C'] {
            pile.pile_on(base, 2.0);
        }
        assert_eq!(pile.largest(), Some(Nucleotide::C));
        assert_eq!(pile.consensus(b'C'), Some(Nucleotide::G));
    }

    #[test]
    fn test_ambiguous_bases_never_form_consensus() {
        let mut acc = PileupAccumulator::new(100, 4);
        acc.pile_read(&read(100, vec![CigarOp::Match(4)], b"ACNG"));
        assert_eq!(acc.consensus_base(102, b'G'), None);
        assert_eq!(acc.largest_base(102), Some(b'N'));

        let mut pile = Pileup::new(0);
        pile.pile_on(b'N', 5.0);
        pile.pile_on(b'C', 1.0);
        assert_eq!(pile.consensus(b'A'), Some(Nucleotide::C));
    }

    #[test]
    fn test_consensus_uses_raw_coverage() {
        let mut pile = Pileup::new(0);
        pile.pile_on(b'A', 10.0);
        pile.pile_on(b'C', 1.0);
        pile.pile_on(b'T', 3.0);
        assert_eq!(pile.consensus(b'A'), Some(Nucleotide::T));
        assert_eq!(pile.consensus(b'T'), Some(Nucleotide::A));
        assert_relative_eq!(pile.mismatch_fraction(b'A'), 4.0 / 14.0);
    }

    #[test]
    fn test_cigar_walk_skips_insertions_and_deletions() {
        // 2S 3M 1I 2M 2D 3M over reference positions 50..60
        let r = read(
            50,
            vec![
                CigarOp::SoftClip(2),
                CigarOp::Match(3),
                CigarOp::Insertion(1),
                CigarOp::Match(2),
                CigarOp::Deletion(2),
                CigarOp::Match(3),
            ],
            b"NNACGTCAGGT",
        );
        let mut acc = PileupAccumulator::new(50, 10);
        acc.pile_read(&r);

        assert_eq!(acc.largest_base(50), Some(b'A'));
        assert_eq!(acc.largest_base(52), Some(b'G'));
        assert_eq!(acc.largest_base(53), Some(b'C'));
        assert_eq!(acc.largest_base(54), Some(b'A'));
        assert_relative_eq!(acc.total_coverage(55), 0.0);
        assert_relative_eq!(acc.total_coverage(56), 0.0);
        assert_eq!(acc.largest_base(57), Some(b'G'));
        assert_eq!(acc.largest_base(59), Some(b'T'));
    }

    #[test]
    fn test_skip_pad_and_hardclip() {
        let r = read(
            0,
            vec![
                CigarOp::HardClip(5),
                CigarOp::Match(2),
                CigarOp::Skip(3),
                CigarOp::Pad(1),
                CigarOp::Match(2),
            ],
            b"ACGT",
        );
        let mut acc = PileupAccumulator::new(0, 7);
        acc.pile_read(&r);
        let bases: Vec<_> = (0..7).map(|p| acc.largest_base(p)).collect();
        assert_eq!(
            bases,
            vec![Some(b'A'), Some(b'C'), None, None, None, Some(b'G'), Some(b'T')]
        );
    }

    #[test]
    fn test_overrunning_span_is_skipped() {
        // the second Match claims more bases than are stored
        let r = read(0, vec![CigarOp::Match(2), CigarOp::Deletion(1), CigarOp::Match(5)], b"ACGT");
        let mut acc = PileupAccumulator::new(0, 8);
        acc.pile_read(&r);
        assert_relative_eq!(acc.total_coverage(0), 1.0);
        assert_relative_eq!(acc.total_coverage(1), 1.0);
        for pos in 2..8 {
            assert_relative_eq!(acc.total_coverage(pos), 0.0);
        }
    }

    #[test]
    fn test_unmapped_and_baseless_reads_are_noops() {
        let mut unmapped = read(0, vec![CigarOp::Match(4)], b"ACGT");
        unmapped.flags.unmapped = true;
        let baseless = read(0, vec![CigarOp::Match(4)], b"");

        let mut acc = PileupAccumulator::new(0, 4);
        acc.pile_read(&unmapped);
        acc.pile_read(&baseless);
        assert_relative_eq!(acc.max_total_coverage(), 0.0);
        assert!(acc.into_table().is_empty());
    }

    #[test]
    fn test_quality_weighting() {
        let mut r = read(0, vec![CigarOp::Match(2)], b"AA");
        r.qualities = vec![10, 20];
        let mut acc = PileupAccumulator::new(0, 2);
        acc.pile_read_weighted(&r, quality_weight);
        assert_relative_eq!(acc.total_coverage(0), 0.9, epsilon = 1e-9);
        assert_relative_eq!(acc.total_coverage(1), 0.99, epsilon = 1e-9);
        assert_relative_eq!(quality_weight(None), 1.0);
    }

    #[test]
    fn test_into_table_keeps_covered_positions() {
        let mut acc = PileupAccumulator::new(0, 10);
        acc.pile_read(&read(3, vec![CigarOp::Match(2)], b"CC"));
        let table = acc.into_table();
        assert_eq!(table.keys().copied().collect::<Vec<_>>(), vec![3, 4]);
        assert_relative_eq!(table[&3].coverage(Nucleotide::C), 1.0);
    }
}
