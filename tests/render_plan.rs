//! End-to-end layout scenarios through the public API.

use approx::assert_relative_eq;

use readstack::alignment::{AlignedRead, CigarOp};
use readstack::interval::GenomicInterval;
use readstack::packing::IntervalPacker;
use readstack::plan::{AxisKind, ModeBehavior, RenderOutcome, RenderPlanBuilder, RenderRequest};
use readstack::record::{DisplayableRecord, SimpleInterval, Strand};
use readstack::resolution::{DisplayMode, ResolutionTable, ResolutionTier, TrackKind, decide};
use readstack::RenderConfig;

fn iv(start: i64, end: i64) -> GenomicInterval {
    GenomicInterval::new(start, end).unwrap()
}

#[test]
fn overlapping_intervals_pack_into_two_rows() {
    let rows = IntervalPacker::new(0).pack(vec![iv(0, 10), iv(5, 15), iv(10, 20)]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].records, vec![iv(0, 10), iv(10, 20)]);
    assert_eq!(rows[1].records, vec![iv(5, 15)]);
}

#[test]
fn read_against_reference_reports_snp() {
    let config = RenderConfig::default();
    let read = AlignedRead::new("r1", 100, vec![CigarOp::Match(4)], b"ACGT");
    let request = RenderRequest::new(iv(100, 104), TrackKind::Alignment, DisplayMode::Mismatch)
        .with_records([read])
        .with_reference(b"ACGG".to_vec());

    let plan = RenderPlanBuilder::new(&config).build(request).into_plan().unwrap();
    assert_eq!(plan.mismatches.len(), 1);
    assert_eq!(plan.mismatches[0].position, 103);
    assert_eq!(plan.mismatches[0].reference_base, b'G');
    assert_eq!(plan.mismatches[0].consensus_base, b'T');

    let pileups = plan.pileups.unwrap();
    assert_relative_eq!(pileups[&103].total(), 1.0);
}

#[test]
fn tiers_span_finest_to_coarsest() {
    let table = ResolutionTable::default();
    assert_eq!(
        decide(4_000, TrackKind::Alignment, DisplayMode::Standard, &table),
        ResolutionTier::finest()
    );
    assert_eq!(
        decide(50_000_000, TrackKind::Alignment, DisplayMode::Standard, &table),
        ResolutionTier::coarsest()
    );
}

#[test]
fn empty_input_is_declared() {
    assert!(IntervalPacker::default().pack(Vec::<GenomicInterval>::new()).is_empty());

    let config = RenderConfig::default();
    let outcome = RenderPlanBuilder::new(&config).build(RenderRequest::new(
        iv(0, 5_000),
        TrackKind::Alignment,
        DisplayMode::Standard,
    ));
    assert!(matches!(outcome, RenderOutcome::Empty { tier: ResolutionTier::VeryHigh, .. }));
    assert_eq!(outcome.message().as_deref(), Some("No data in range"));
}

#[test]
fn whole_chromosome_arcs_are_too_coarse() {
    let config = RenderConfig::default();
    let read = AlignedRead::new("a", 1_000, vec![CigarOp::Match(100)], b"").with_mate(1_400, Strand::Reverse, 500);
    let request = RenderRequest::new(iv(0, 248_956_422), TrackKind::Alignment, DisplayMode::MatePairArc)
        .with_records([read]);
    let outcome = RenderPlanBuilder::new(&config).build(request);
    assert!(matches!(outcome, RenderOutcome::TooCoarse { .. }));
    assert_eq!(outcome.tier(), ResolutionTier::VeryLow);
    assert!(outcome.plan().is_none());
}

#[test]
fn mixed_tracks_build_in_parallel() {
    let config = RenderConfig::default();
    let genes = (0..50).map(|i| SimpleInterval::new(iv(i * 100, i * 100 + 250)).named(format!("g{i}")));
    let reads: Vec<AlignedRead> = (0..20)
        .map(|i| {
            let start = i * 40;
            AlignedRead::new(format!("t{}", i / 2), start, vec![CigarOp::Match(50)], b"")
                .with_mate(start + 300, Strand::Reverse, 350)
        })
        .collect();

    let requests = vec![
        RenderRequest::new(iv(0, 5_000), TrackKind::Interval, DisplayMode::Pack).with_records(genes),
        RenderRequest::new(iv(0, 2_000), TrackKind::Alignment, DisplayMode::ReadPair).with_records(reads),
        RenderRequest::new(iv(0, 100_000_000), TrackKind::Interval, DisplayMode::Standard),
    ];
    let outcomes = RenderPlanBuilder::new(&config).build_all(requests);

    let genes = outcomes[0].plan().unwrap();
    assert_eq!(genes.record_count(), 50);
    assert_eq!(genes.row_count(), 3);
    assert_relative_eq!(genes.axis_range.max, 3.0);

    let pairs = outcomes[1].plan().unwrap();
    assert_eq!(pairs.record_count(), 10);
    assert!(
        pairs
            .rows
            .iter()
            .flat_map(|r| r.iter())
            .all(|r| matches!(r, DisplayableRecord::Paired(p) if !p.is_singleton()))
    );
    assert_eq!(ModeBehavior::of(pairs.mode).axis, AxisKind::Rows);

    assert!(matches!(outcomes[2], RenderOutcome::TooCoarse { .. }));
}

#[test]
fn config_file_drives_packing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("render.json");
    std::fs::write(&path, r#"{ "breathing_room": 0 }"#).unwrap();
    let config = RenderConfig::from_file(&path).unwrap();

    let request = RenderRequest::new(iv(0, 100), TrackKind::Interval, DisplayMode::Standard)
        .with_records([SimpleInterval::new(iv(0, 10)), SimpleInterval::new(iv(10, 20))]);
    let plan = RenderPlanBuilder::new(&config).build(request).into_plan().unwrap();
    assert_eq!(plan.row_count(), 1);
}

#[test]
fn chromosome_wide_pileup_only_holds_covered_bases() {
    let config = RenderConfig::default();
    let reads = [
        AlignedRead::new("a", 10_000_000, vec![CigarOp::Match(4)], b"ACGT"),
        AlignedRead::new("b", 240_000_000, vec![CigarOp::Match(4)], b"ACGT"),
    ];
    let request = RenderRequest::new(iv(0, 248_956_422), TrackKind::Continuous, DisplayMode::SnpPileup)
        .with_records(reads);
    let plan = RenderPlanBuilder::new(&config).build(request).into_plan().unwrap();
    assert_eq!(plan.pileups.unwrap().len(), 8);
    assert!(plan.mismatches.is_empty());
}
