use crate::interval::{GenomicInterval, HasInterval};
use crate::record::Strand;

/// One edit-script element of an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    /// Aligned base, match or mismatch (`M`, `=`, `X`).
    Match(u32),
    /// Insertion to the reference.
    Insertion(u32),
    /// Deletion from the reference.
    Deletion(u32),
    /// Skipped reference region, e.g. an intron (`N`).
    Skip(u32),
    /// Silent padding (`P`).
    Pad(u32),
    /// Bases present in the read but not aligned.
    SoftClip(u32),
    /// Bases removed from the stored read.
    HardClip(u32),
}

impl CigarOp {
    pub fn len(&self) -> u32 {
        match *self {
            CigarOp::Match(n)
            | CigarOp::Insertion(n)
            | CigarOp::Deletion(n)
            | CigarOp::Skip(n)
            | CigarOp::Pad(n)
            | CigarOp::SoftClip(n)
            | CigarOp::HardClip(n) => n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of bases this operation consumes on the reference.
    pub fn ref_len(&self) -> u32 {
        match *self {
            CigarOp::Match(n) | CigarOp::Deletion(n) | CigarOp::Skip(n) => n,
            _ => 0,
        }
    }

    /// Number of bases this operation consumes on the read.
    pub fn read_len(&self) -> u32 {
        match *self {
            CigarOp::Match(n) | CigarOp::Insertion(n) | CigarOp::SoftClip(n) => n,
            _ => 0,
        }
    }
}

/// SAM flag bits the layout core cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadFlags {
    pub paired: bool,
    pub unmapped: bool,
    pub mate_unmapped: bool,
}

/// A single aligned read as delivered by a data source.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRead {
    /// Query name, absent when the source stripped it.
    pub name: Option<String>,
    pub chrom: String,
    /// Reference span, 0-based half-open.
    pub interval: GenomicInterval,
    pub strand: Strand,
    pub mapq: u8,
    pub cigar: Vec<CigarOp>,
    /// Stored read bases (ASCII); may be empty.
    pub sequence: Vec<u8>,
    /// Phred base qualities; may be empty.
    pub qualities: Vec<u8>,
    pub flags: ReadFlags,
    /// 0-based alignment start of the mate.
    pub mate_start: Option<i64>,
    pub mate_strand: Option<Strand>,
    /// Signed template length (TLEN).
    pub insert_size: Option<i64>,
}

impl AlignedRead {
    /// Forward-strand, mapped, unpaired read whose span is derived from `cigar`.
    pub fn new(name: impl Into<String>, start: i64, cigar: Vec<CigarOp>, sequence: &[u8]) -> Self {
        let ref_len: i64 = cigar.iter().map(|op| op.ref_len() as i64).sum();
        Self {
            name: Some(name.into()),
            chrom: String::new(),
            interval: GenomicInterval::from_len(start, ref_len),
            strand: Strand::Forward,
            mapq: 60,
            cigar,
            sequence: sequence.to_vec(),
            qualities: Vec::new(),
            flags: ReadFlags::default(),
            mate_start: None,
            mate_strand: None,
            insert_size: None,
        }
    }

    pub fn reversed(mut self) -> Self {
        self.strand = Strand::Reverse;
        self
    }

    /// Mark the read as paired with a mapped mate.
    pub fn with_mate(mut self, mate_start: i64, mate_strand: Strand, insert_size: i64) -> Self {
        self.flags.paired = true;
        self.mate_start = Some(mate_start);
        self.mate_strand = Some(mate_strand);
        self.insert_size = Some(insert_size);
        self
    }

    pub fn start(&self) -> i64 {
        self.interval.start()
    }

    pub fn end(&self) -> i64 {
        self.interval.end()
    }

    pub fn is_unmapped(&self) -> bool {
        self.flags.unmapped
    }

    /// Reference spans covered by aligned bases, one per non-empty Match op.
    pub fn aligned_blocks(&self) -> Vec<GenomicInterval> {
        let mut blocks = Vec::new();
        let mut ref_pos = self.interval.start();
        for op in &self.cigar {
            if let CigarOp::Match(n) = *op
                && n > 0
            {
                blocks.push(GenomicInterval::from_len(ref_pos, n as i64));
            }
            ref_pos += op.ref_len() as i64;
        }
        blocks
    }
}

impl HasInterval for AlignedRead {
    fn interval(&self) -> GenomicInterval {
        self.interval
    }
}
