//! Records handed to the layout core by data sources.

use std::fmt;

use crate::alignment::AlignedRead;
use crate::interval::{GenomicInterval, HasInterval};
use crate::mates::ReadPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strand {
    Forward,
    Reverse,
    #[default]
    Unstranded,
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
            Strand::Unstranded => write!(f, "."),
        }
    }
}

/// A plain feature: an interval with optional name and strand.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleInterval {
    pub interval: GenomicInterval,
    pub strand: Strand,
    pub name: Option<String>,
}

impl SimpleInterval {
    pub fn new(interval: GenomicInterval) -> Self {
        Self {
            interval,
            strand: Strand::Unstranded,
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A BED12-style feature with score, thick region and blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct RichInterval {
    pub interval: GenomicInterval,
    pub strand: Strand,
    pub name: Option<String>,
    pub score: Option<f64>,
    pub thick: Option<GenomicInterval>,
    /// Absolute block coordinates, sorted and inside `interval`.
    pub blocks: Vec<GenomicInterval>,
}

/// Anything the packer can lay out.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayableRecord {
    Simple(SimpleInterval),
    Aligned(AlignedRead),
    Paired(ReadPair),
    Rich(RichInterval),
}

impl DisplayableRecord {
    pub fn strand(&self) -> Strand {
        match self {
            DisplayableRecord::Simple(r) => r.strand,
            DisplayableRecord::Aligned(r) => r.strand,
            DisplayableRecord::Paired(p) => p.first.strand,
            DisplayableRecord::Rich(r) => r.strand,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            DisplayableRecord::Simple(r) => r.name.as_deref(),
            DisplayableRecord::Aligned(r) => r.name.as_deref(),
            DisplayableRecord::Paired(p) => p.first.name.as_deref(),
            DisplayableRecord::Rich(r) => r.name.as_deref(),
        }
    }

    /// Every aligned read carried by this record (none, one or two).
    pub fn aligned_reads(&self) -> Vec<&AlignedRead> {
        match self {
            DisplayableRecord::Aligned(r) => vec![r],
            DisplayableRecord::Paired(p) => p.reads().collect(),
            _ => Vec::new(),
        }
    }
}

impl HasInterval for DisplayableRecord {
    fn interval(&self) -> GenomicInterval {
        match self {
            DisplayableRecord::Simple(r) => r.interval,
            DisplayableRecord::Aligned(r) => r.interval,
            DisplayableRecord::Paired(p) => p.envelope(),
            DisplayableRecord::Rich(r) => r.interval,
        }
    }
}

impl From<AlignedRead> for DisplayableRecord {
    fn from(read: AlignedRead) -> Self {
        DisplayableRecord::Aligned(read)
    }
}

impl From<SimpleInterval> for DisplayableRecord {
    fn from(record: SimpleInterval) -> Self {
        DisplayableRecord::Simple(record)
    }
}

impl From<RichInterval> for DisplayableRecord {
    fn from(record: RichInterval) -> Self {
        DisplayableRecord::Rich(record)
    }
}

impl From<ReadPair> for DisplayableRecord {
    fn from(pair: ReadPair) -> Self {
        DisplayableRecord::Paired(pair)
    }
}
