//! Zoom-level decisions: which data tier and how much rendering detail to use
//! for a visible range of a given length.

use std::borrow::Cow;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rendering detail, finest first. `Ord` follows that order, so a larger
/// tier is a coarser one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

impl ResolutionTier {
    pub fn finest() -> Self {
        ResolutionTier::VeryHigh
    }

    pub fn coarsest() -> Self {
        ResolutionTier::VeryLow
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionTier::VeryHigh => "very_high",
            ResolutionTier::High => "high",
            ResolutionTier::Medium => "medium",
            ResolutionTier::Low => "low",
            ResolutionTier::VeryLow => "very_low",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum TrackKind {
    Alignment,
    Interval,
    Variant,
    Continuous,
    Sequence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum DisplayMode {
    Standard,
    Squish,
    Pack,
    Mismatch,
    Sequence,
    ReadPair,
    MatePairArc,
    SnpPileup,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.to_possible_value().ok_or(fmt::Error)?;
        f.write_str(value.get_name())
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.to_possible_value().ok_or(fmt::Error)?;
        f.write_str(value.get_name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("step bounds must strictly increase ({previous} then {next})")]
    UnorderedBounds { previous: u64, next: u64 },
    #[error("tiers must not get finer as length grows ({previous} then {next})")]
    FinerTier {
        previous: ResolutionTier,
        next: ResolutionTier,
    },
    #[error("{track}/{mode}: {source}")]
    Entry {
        track: TrackKind,
        mode: DisplayMode,
        #[source]
        source: Box<ScheduleError>,
    },
}

/// Visible lengths up to and including `max_length` map to `tier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierStep {
    pub max_length: u64,
    pub tier: ResolutionTier,
}

/// A monotone step function from visible length to tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSchedule {
    pub steps: Vec<TierStep>,
    /// Tier for lengths beyond the last step.
    pub beyond: ResolutionTier,
    /// Coarsest tier at which the mode still draws individual records.
    pub detail_limit: ResolutionTier,
}

impl TierSchedule {
    pub fn new(steps: &[(u64, ResolutionTier)], beyond: ResolutionTier, detail_limit: ResolutionTier) -> Self {
        Self {
            steps: steps
                .iter()
                .map(|&(max_length, tier)| TierStep { max_length, tier })
                .collect(),
            beyond,
            detail_limit,
        }
    }

    pub fn tier_for(&self, length: u64) -> ResolutionTier {
        if length <= 1 {
            return ResolutionTier::finest();
        }
        self.steps
            .iter()
            .find(|step| length <= step.max_length)
            .map(|step| step.tier)
            .unwrap_or(self.beyond)
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        for pair in self.steps.windows(2) {
            if pair[1].max_length <= pair[0].max_length {
                return Err(ScheduleError::UnorderedBounds {
                    previous: pair[0].max_length,
                    next: pair[1].max_length,
                });
            }
            if pair[1].tier < pair[0].tier {
                return Err(ScheduleError::FinerTier {
                    previous: pair[0].tier,
                    next: pair[1].tier,
                });
            }
        }
        if let Some(last) = self.steps.last()
            && self.beyond < last.tier
        {
            return Err(ScheduleError::FinerTier {
                previous: last.tier,
                next: self.beyond,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub track: TrackKind,
    pub mode: DisplayMode,
    pub schedule: TierSchedule,
}

/// Per-track, per-mode tier schedules.
///
/// Lookups fall back from `(track, mode)` to `(track, standard)` and then to
/// the built-in schedule for the track kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionTable {
    entries: Vec<ScheduleEntry>,
}

impl Default for ResolutionTable {
    fn default() -> Self {
        let mut table = Self { entries: Vec::new() };
        for &track in TrackKind::value_variants() {
            table.set(track, DisplayMode::Standard, builtin_schedule(track));
        }
        table.set(
            TrackKind::Alignment,
            DisplayMode::SnpPileup,
            TierSchedule::new(
                &[(20_000, ResolutionTier::VeryHigh), (100_000, ResolutionTier::Low)],
                ResolutionTier::VeryLow,
                ResolutionTier::Low,
            ),
        );
        table.set(
            TrackKind::Alignment,
            DisplayMode::MatePairArc,
            TierSchedule::new(
                &[(1_000_000, ResolutionTier::High)],
                ResolutionTier::VeryLow,
                ResolutionTier::High,
            ),
        );
        table
    }
}

fn builtin_schedule(track: TrackKind) -> TierSchedule {
    use ResolutionTier::*;
    match track {
        TrackKind::Alignment => TierSchedule::new(&[(20_000, VeryHigh)], VeryLow, VeryHigh),
        TrackKind::Interval | TrackKind::Variant => TierSchedule::new(
            &[
                (10_000, VeryHigh),
                (100_000, High),
                (1_000_000, Medium),
                (10_000_000, Low),
            ],
            VeryLow,
            Medium,
        ),
        TrackKind::Continuous => TierSchedule::new(
            &[(1_000, VeryHigh), (10_000, High), (100_000, Medium), (1_000_000, Low)],
            VeryLow,
            VeryLow,
        ),
        TrackKind::Sequence => TierSchedule::new(&[(10_000, VeryHigh)], VeryLow, VeryHigh),
    }
}

impl ResolutionTable {
    /// A table with no entries; every lookup uses the built-in schedules.
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Insert or replace the schedule for `(track, mode)`.
    pub fn set(&mut self, track: TrackKind, mode: DisplayMode, schedule: TierSchedule) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.track == track && e.mode == mode)
        {
            Some(entry) => entry.schedule = schedule,
            None => self.entries.push(ScheduleEntry { track, mode, schedule }),
        }
    }

    pub fn schedule(&self, track: TrackKind, mode: DisplayMode) -> Cow<'_, TierSchedule> {
        let find = |mode: DisplayMode| {
            self.entries
                .iter()
                .find(|e| e.track == track && e.mode == mode)
                .map(|e| &e.schedule)
        };
        match find(mode).or_else(|| find(DisplayMode::Standard)) {
            Some(schedule) => Cow::Borrowed(schedule),
            None => Cow::Owned(builtin_schedule(track)),
        }
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        for entry in &self.entries {
            entry.schedule.validate().map_err(|e| ScheduleError::Entry {
                track: entry.track,
                mode: entry.mode,
                source: Box::new(e),
            })?;
        }
        Ok(())
    }
}

/// Tier decisions against an explicit table.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionPolicy<'a> {
    table: &'a ResolutionTable,
}

impl<'a> ResolutionPolicy<'a> {
    pub fn new(table: &'a ResolutionTable) -> Self {
        Self { table }
    }

    /// Tier for a visible range of `length` bases. Negative lengths count as 0.
    pub fn decide(&self, length: i64, track: TrackKind, mode: DisplayMode) -> ResolutionTier {
        self.table
            .schedule(track, mode)
            .tier_for(length.max(0) as u64)
    }

    /// Whether `tier` is past the point where `mode` can draw records.
    pub fn is_too_coarse(&self, tier: ResolutionTier, track: TrackKind, mode: DisplayMode) -> bool {
        tier > self.table.schedule(track, mode).detail_limit
    }
}

/// Shorthand for [`ResolutionPolicy::decide`].
pub fn decide(length: i64, track: TrackKind, mode: DisplayMode, table: &ResolutionTable) -> ResolutionTier {
    ResolutionPolicy::new(table).decide(length, track, mode)
}
