//! Mate-pair grouping, insert-size axis scaling and discordance classes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::alignment::AlignedRead;
use crate::interval::{GenomicInterval, HasInterval};
use crate::record::Strand;

/// Two mates of one template, or a singleton whose mate was not seen.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPair {
    /// The leftmost read.
    pub first: AlignedRead,
    pub second: Option<AlignedRead>,
}

impl ReadPair {
    /// Orders the two reads so `first` is the leftmost.
    pub fn new(a: AlignedRead, b: Option<AlignedRead>) -> Self {
        match b {
            Some(b) if b.start() < a.start() => Self {
                first: b,
                second: Some(a),
            },
            b => Self { first: a, second: b },
        }
    }

    pub fn singleton(read: AlignedRead) -> Self {
        Self {
            first: read,
            second: None,
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.second.is_none()
    }

    /// Smallest interval spanning both reads.
    pub fn envelope(&self) -> GenomicInterval {
        match &self.second {
            Some(second) => self.first.interval.span(&second.interval),
            None => self.first.interval,
        }
    }

    pub fn reads(&self) -> impl Iterator<Item = &AlignedRead> {
        std::iter::once(&self.first).chain(self.second.iter())
    }

    /// Absolute template length: TLEN when recorded, otherwise the envelope
    /// (pairs) or the span to the mate's start (singletons).
    pub fn insert_size(&self) -> Option<i64> {
        match &self.second {
            Some(_) => Some(
                self.first
                    .insert_size
                    .map(i64::abs)
                    .unwrap_or_else(|| self.envelope().length()),
            ),
            None => insert_from_mate(&self.first),
        }
    }

    /// Strands of the leftmost and rightmost mate.
    pub fn orientation(&self) -> Option<(Strand, Strand)> {
        match &self.second {
            Some(second) => Some((self.first.strand, second.strand)),
            None => orientation_from_mate(&self.first),
        }
    }

    /// Discordance class, or `None` when there is no mate information.
    pub fn classify(&self, thresholds: &DiscordantThresholds) -> Option<PairClass> {
        let (left, right) = self.orientation()?;
        let insert_size = self.insert_size()?;
        Some(classify(insert_size, left, right, thresholds))
    }
}

impl HasInterval for ReadPair {
    fn interval(&self) -> GenomicInterval {
        self.envelope()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairClass {
    Concordant,
    DiscordantByLength,
    /// Both mates on the reverse strand.
    InvertedRead,
    /// Both mates on the forward strand.
    InvertedMate,
    /// Leftmost mate reverse, rightmost forward.
    Everted,
}

/// Expected insert-size bounds; outside them a pair is discordant by length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordantThresholds {
    pub min: i64,
    pub max: i64,
}

impl Default for DiscordantThresholds {
    fn default() -> Self {
        Self { min: 50, max: 1000 }
    }
}

impl DiscordantThresholds {
    pub fn is_discordant(&self, insert_size: i64) -> bool {
        let size = insert_size.abs();
        size < self.min || size > self.max
    }
}

/// Classify a pair from its insert size and the strands of its leftmost and
/// rightmost mates. Orientation classes win over length.
pub fn classify(insert_size: i64, left: Strand, right: Strand, thresholds: &DiscordantThresholds) -> PairClass {
    match (left, right) {
        (Strand::Forward, Strand::Forward) => PairClass::InvertedMate,
        (Strand::Reverse, Strand::Reverse) => PairClass::InvertedRead,
        (Strand::Reverse, Strand::Forward) => PairClass::Everted,
        _ if thresholds.is_discordant(insert_size) => PairClass::DiscordantByLength,
        _ => PairClass::Concordant,
    }
}

fn insert_from_mate(read: &AlignedRead) -> Option<i64> {
    if let Some(tlen) = read.insert_size {
        return Some(tlen.abs());
    }
    let mate = read.mate_start?;
    Some(read.end().max(mate) - read.start().min(mate))
}

fn orientation_from_mate(read: &AlignedRead) -> Option<(Strand, Strand)> {
    let mate_start = read.mate_start?;
    let mate_strand = read.mate_strand?;
    if mate_start < read.start() {
        Some((mate_strand, read.strand))
    } else {
        Some((read.strand, mate_strand))
    }
}

/// Classify a lone read from its own mate fields.
pub fn classify_read(read: &AlignedRead, thresholds: &DiscordantThresholds) -> Option<PairClass> {
    let (left, right) = orientation_from_mate(read)?;
    let insert_size = insert_from_mate(read)?;
    Some(classify(insert_size, left, right, thresholds))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MateKey {
    Name(String),
    Positions(String, i64, i64),
    Alone(usize),
}

fn mate_key(index: usize, read: &AlignedRead) -> MateKey {
    if let Some(name) = &read.name {
        return MateKey::Name(name.clone());
    }
    match read.mate_start {
        Some(mate) => MateKey::Positions(
            read.chrom.clone(),
            read.start().min(mate),
            read.start().max(mate),
        ),
        None => MateKey::Alone(index),
    }
}

/// Group single-end records into pairs and singletons.
pub struct MatePairAssociator;

impl MatePairAssociator {
    /// Every input read ends up in exactly one pair. Reads are joined by name,
    /// or by their own and their mate's start when unnamed. A group with more
    /// than two reads pairs the two leftmost and leaves the rest as
    /// singletons. Output is ordered by envelope start.
    pub fn associate(reads: Vec<AlignedRead>) -> Vec<ReadPair> {
        let mut index: HashMap<MateKey, usize> = HashMap::new();
        let mut groups: Vec<Vec<AlignedRead>> = Vec::new();

        for (i, read) in reads.into_iter().enumerate() {
            let key = mate_key(i, &read);
            match index.get(&key) {
                Some(&g) => groups[g].push(read),
                None => {
                    index.insert(key, groups.len());
                    groups.push(vec![read]);
                }
            }
        }

        let mut pairs = Vec::with_capacity(groups.len());
        for mut group in groups {
            group.sort_by_key(|r| r.start());
            let mut reads = group.into_iter();
            if let Some(first) = reads.next() {
                pairs.push(ReadPair::new(first, reads.next()));
            }
            pairs.extend(reads.map(ReadPair::singleton));
        }

        pairs.sort_by_key(|p| p.envelope().start());
        pairs
    }

    /// Largest insert size among complete pairs whose first mate starts
    /// strictly before the second, ignoring anything longer than the window.
    /// Returns 0 when nothing qualifies.
    pub fn max_insert_size(pairs: &[ReadPair], window_length: i64) -> i64 {
        pairs
            .iter()
            .filter(|p| match &p.second {
                Some(second) => p.first.start() < second.start(),
                None => false,
            })
            .filter_map(ReadPair::insert_size)
            .filter(|&size| size <= window_length)
            .max()
            .unwrap_or(0)
    }
}
