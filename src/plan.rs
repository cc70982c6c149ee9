//! Turns a visible window and its records into a typed render plan.

use std::collections::BTreeMap;

use log::{debug, warn};
use rayon::prelude::*;

use crate::alignment::AlignedRead;
use crate::config::RenderConfig;
use crate::interval::{GenomicInterval, HasInterval};
use crate::mates::{DiscordantThresholds, MatePairAssociator, PairClass, ReadPair, classify_read};
use crate::packing::{IntervalPacker, PackedRow};
use crate::pileup::{Nucleotide, Pileup, PileupAccumulator};
use crate::record::DisplayableRecord;
use crate::resolution::{DisplayMode, ResolutionPolicy, ResolutionTier, TrackKind};

/// What the vertical axis of a track measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    Rows,
    InsertSize,
    Coverage,
}

/// How a display mode drives the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeBehavior {
    /// Group aligned reads into mate pairs before packing.
    pub group_pairs: bool,
    /// Accumulate a per-base pileup over the window.
    pub per_base: bool,
    /// Pack without breathing room.
    pub squish: bool,
    pub axis: AxisKind,
}

const STANDARD: ModeBehavior = ModeBehavior {
    group_pairs: false,
    per_base: false,
    squish: false,
    axis: AxisKind::Rows,
};

impl ModeBehavior {
    pub fn of(mode: DisplayMode) -> Self {
        match mode {
            DisplayMode::Standard | DisplayMode::Pack => STANDARD,
            DisplayMode::Squish => ModeBehavior { squish: true, ..STANDARD },
            DisplayMode::Mismatch | DisplayMode::Sequence => ModeBehavior { per_base: true, ..STANDARD },
            DisplayMode::ReadPair => ModeBehavior { group_pairs: true, ..STANDARD },
            DisplayMode::MatePairArc => ModeBehavior {
                group_pairs: true,
                axis: AxisKind::InsertSize,
                ..STANDARD
            },
            DisplayMode::SnpPileup => ModeBehavior {
                per_base: true,
                axis: AxisKind::Coverage,
                ..STANDARD
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

/// A covered position whose dominant non-reference base differs from the
/// reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch {
    pub position: i64,
    pub reference_base: u8,
    pub consensus_base: u8,
    /// Share of coverage disagreeing with the reference.
    pub fraction: f64,
}

/// Everything an external drawing routine needs for one track.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub track: TrackKind,
    pub mode: DisplayMode,
    pub tier: ResolutionTier,
    pub window: GenomicInterval,
    /// Level 0 first.
    pub rows: Vec<PackedRow<DisplayableRecord>>,
    pub axis_range: AxisRange,
    /// Covered positions of the window, present in per-base modes.
    pub pileups: Option<BTreeMap<i64, Pileup>>,
    /// Non-reference consensus calls, present when a reference window was given.
    pub mismatches: Vec<Mismatch>,
    discordant: DiscordantThresholds,
}

impl RenderPlan {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn record_count(&self) -> usize {
        self.rows.iter().map(PackedRow::len).sum()
    }

    /// Colour class for paired or mate-aware records.
    pub fn pair_class(&self, record: &DisplayableRecord) -> Option<PairClass> {
        match record {
            DisplayableRecord::Paired(pair) => pair.classify(&self.discordant),
            DisplayableRecord::Aligned(read) => classify_read(read, &self.discordant),
            _ => None,
        }
    }
}

/// Result of one render pass.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Plan(RenderPlan),
    /// Nothing overlaps the window.
    Empty {
        tier: ResolutionTier,
        window: GenomicInterval,
    },
    /// The window is too wide for this mode to draw records.
    TooCoarse {
        tier: ResolutionTier,
        track: TrackKind,
        mode: DisplayMode,
    },
}

impl RenderOutcome {
    pub fn plan(&self) -> Option<&RenderPlan> {
        match self {
            RenderOutcome::Plan(plan) => Some(plan),
            _ => None,
        }
    }

    pub fn into_plan(self) -> Option<RenderPlan> {
        match self {
            RenderOutcome::Plan(plan) => Some(plan),
            _ => None,
        }
    }

    pub fn tier(&self) -> ResolutionTier {
        match self {
            RenderOutcome::Plan(plan) => plan.tier,
            RenderOutcome::Empty { tier, .. } | RenderOutcome::TooCoarse { tier, .. } => *tier,
        }
    }

    /// User-facing text for the advisory outcomes.
    pub fn message(&self) -> Option<String> {
        match self {
            RenderOutcome::Plan(_) => None,
            RenderOutcome::Empty { .. } => Some("No data in range".to_string()),
            RenderOutcome::TooCoarse { mode, .. } => Some(format!("Zoom in to see {mode} data")),
        }
    }
}

/// One track's input for a render pass.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub window: GenomicInterval,
    pub track: TrackKind,
    pub mode: DisplayMode,
    pub records: Vec<DisplayableRecord>,
    /// Uppercase reference bases for exactly `window`.
    pub reference: Option<Vec<u8>>,
}

impl RenderRequest {
    pub fn new(window: GenomicInterval, track: TrackKind, mode: DisplayMode) -> Self {
        Self {
            window,
            track,
            mode,
            records: Vec::new(),
            reference: None,
        }
    }

    pub fn with_records(mut self, records: impl IntoIterator<Item = impl Into<DisplayableRecord>>) -> Self {
        self.records.extend(records.into_iter().map(Into::into));
        self
    }

    pub fn with_reference(mut self, reference: Vec<u8>) -> Self {
        self.reference = Some(reference);
        self
    }
}

fn visible_in(window: &GenomicInterval, interval: &GenomicInterval) -> bool {
    interval.intersects(window) || (interval.is_empty() && window.contains(interval.start()))
}

/// Builds render plans against a fixed configuration.
pub struct RenderPlanBuilder<'a> {
    config: &'a RenderConfig,
}

impl<'a> RenderPlanBuilder<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, request: RenderRequest) -> RenderOutcome {
        let RenderRequest {
            window,
            track,
            mode,
            records,
            reference,
        } = request;

        let policy = ResolutionPolicy::new(&self.config.resolution);
        let tier = policy.decide(window.length(), track, mode);
        if policy.is_too_coarse(tier, track, mode) {
            debug!("{track}/{mode}: tier {tier} too coarse for {window}");
            return RenderOutcome::TooCoarse { tier, track, mode };
        }

        let visible: Vec<DisplayableRecord> = records
            .into_iter()
            .filter(|r| visible_in(&window, &r.interval()))
            .collect();
        if visible.is_empty() {
            return RenderOutcome::Empty { tier, window };
        }

        let behavior = ModeBehavior::of(mode);

        let mut max_insert = 0;
        let records = if behavior.group_pairs {
            let (reads, mut others): (Vec<_>, Vec<_>) = visible
                .into_iter()
                .partition(|r| matches!(r, DisplayableRecord::Aligned(_)));
            let reads = reads.into_iter().filter_map(|r| match r {
                DisplayableRecord::Aligned(read) => Some(read),
                _ => None,
            });
            let pairs: Vec<ReadPair> = MatePairAssociator::associate(reads.collect());
            max_insert = MatePairAssociator::max_insert_size(&pairs, window.length());
            others.extend(pairs.into_iter().map(DisplayableRecord::Paired));
            others
        } else {
            visible
        };

        let mut mismatches = Vec::new();
        let mut max_coverage = 0.0;
        let pileups = if behavior.per_base {
            let reads: Vec<&AlignedRead> = records.iter().flat_map(|r| r.aligned_reads()).collect();
            let accumulators = pile_covered_spans(window, &reads);
            max_coverage = accumulators
                .iter()
                .map(PileupAccumulator::max_total_coverage)
                .fold(0.0, f64::max);

            match &reference {
                Some(bases) => {
                    mismatches = accumulators
                        .iter()
                        .flat_map(|acc| find_mismatches(acc, window, bases))
                        .collect()
                }
                None => warn!("{track}/{mode}: no reference window for {window}, skipping mismatch calls"),
            }
            Some(
                accumulators
                    .into_iter()
                    .flat_map(PileupAccumulator::into_table)
                    .collect(),
            )
        } else {
            None
        };

        let breathing_room = if behavior.squish {
            0
        } else {
            self.config.breathing_room
        };
        let rows = IntervalPacker::new(breathing_room).pack(records);

        let axis_range = AxisRange {
            min: 0.0,
            max: match behavior.axis {
                AxisKind::Rows => rows.len() as f64,
                AxisKind::InsertSize => max_insert as f64,
                AxisKind::Coverage => max_coverage,
            },
        };

        debug!(
            "{track}/{mode} {window}: tier {tier}, {} rows, axis {}..{}",
            rows.len(),
            axis_range.min,
            axis_range.max
        );

        RenderOutcome::Plan(RenderPlan {
            track,
            mode,
            tier,
            window,
            rows,
            axis_range,
            pileups,
            mismatches,
            discordant: self.config.discordant,
        })
    }

    /// Build independent requests in parallel; outcomes keep request order.
    pub fn build_all(&self, requests: Vec<RenderRequest>) -> Vec<RenderOutcome> {
        requests.into_par_iter().map(|r| self.build(r)).collect()
    }
}

/// One accumulator per stretch of the window covered by aligned bases.
///
/// Returned in position order; uncovered parts of the window get no slots.
fn pile_covered_spans(window: GenomicInterval, reads: &[&AlignedRead]) -> Vec<PileupAccumulator> {
    let blocks: Vec<GenomicInterval> = reads
        .iter()
        .filter(|r| !r.is_unmapped() && !r.sequence.is_empty())
        .flat_map(|r| r.aligned_blocks())
        .collect();
    let spans: Vec<GenomicInterval> = GenomicInterval::merge_all(&blocks)
        .into_iter()
        .filter_map(|span| span.intersection(&window))
        .filter(|span| !span.is_empty())
        .collect();

    let mut accumulators: Vec<PileupAccumulator> =
        spans.iter().map(|&span| PileupAccumulator::for_window(span)).collect();
    for read in reads {
        let mut last = None;
        for block in read.aligned_blocks() {
            // each block lies inside exactly one merged span
            let i = spans.partition_point(|s| s.end() <= block.start());
            if i < spans.len() && spans[i].start() < block.end() && last != Some(i) {
                accumulators[i].pile_read(read);
                last = Some(i);
            }
        }
    }
    accumulators
}

/// Positions whose consensus differs from a called reference base. Positions
/// past the end of `reference` or over an ambiguous reference base get no
/// call.
fn find_mismatches(acc: &PileupAccumulator, window: GenomicInterval, reference: &[u8]) -> Vec<Mismatch> {
    acc.pileups()
        .filter(|p| p.total() > 0.0)
        .filter_map(|p| {
            let offset = usize::try_from(p.position - window.start()).ok()?;
            let reference_base = reference
                .get(offset)
                .copied()
                .filter(|&b| Nucleotide::from_base(b) != Nucleotide::Other)?;
            let consensus = p.consensus(reference_base)?;
            Some(Mismatch {
                position: p.position,
                reference_base,
                consensus_base: consensus.to_base(),
                fraction: p.mismatch_fraction(reference_base),
            })
        })
        .collect()
}
