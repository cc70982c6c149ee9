use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use readstack::alignment::AlignmentReader;
use readstack::interval::HasInterval;
use readstack::plan::{RenderOutcome, RenderPlan, RenderPlanBuilder, RenderRequest};
use readstack::reference::ReferenceGenome;
use readstack::region::Region;
use readstack::resolution::ResolutionPolicy;
use readstack::{DisplayMode, RenderConfig, TrackKind};

#[derive(Parser)]
#[command(
    name = "readstack",
    about = "Lay out genome-browser tracks: resolution tiers, packed rows, pileups and mate pairs",
    version
)]
struct Cli {
    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[arg(short, long, global = true, default_value = "0")]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the render plan for a region of a BAM file and print it
    Plan {
        /// Path to BAM file (must be sorted and indexed)
        #[arg(short, long)]
        bam: PathBuf,

        /// Path to reference FASTA file, needed for mismatch calls
        #[arg(short, long)]
        reference: Option<PathBuf>,

        /// Region to lay out (format: chr:start-end)
        #[arg(short = 'L', long)]
        region: String,

        /// Track kind the records are drawn as
        #[arg(short, long, value_enum, ignore_case = true, default_value_t = TrackKind::Alignment)]
        track: TrackKind,

        /// Display mode
        #[arg(short, long, value_enum, ignore_case = true, default_value_t = DisplayMode::Standard)]
        mode: DisplayMode,

        /// JSON render configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of packed rows to print
        #[arg(long, default_value = "10")]
        rows: usize,
    },

    /// Print the resolution tier chosen for a visible length
    Tier {
        /// Visible range length in bases
        #[arg(short, long)]
        length: i64,

        #[arg(short, long, value_enum, ignore_case = true, default_value_t = TrackKind::Alignment)]
        track: TrackKind,

        #[arg(short, long, value_enum, ignore_case = true, default_value_t = DisplayMode::Standard)]
        mode: DisplayMode,

        /// JSON render configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<RenderConfig> {
    match path {
        Some(path) => RenderConfig::from_file(path).with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(RenderConfig::default()),
    }
}

fn print_plan(plan: &RenderPlan, max_rows: usize) {
    println!("Tier:    {}", plan.tier);
    println!("Rows:    {}", plan.row_count());
    println!("Records: {}", plan.record_count());
    println!("Axis:    {} - {}", plan.axis_range.min, plan.axis_range.max);

    for row in plan.rows.iter().take(max_rows) {
        println!("\nRow {}:", row.level);
        for record in row.iter() {
            let interval = record.interval();
            let class = plan
                .pair_class(record)
                .map(|c| format!("{c:?}"))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<30} {:>12} {:>12} {} {}",
                record.name().unwrap_or("."),
                interval.start() + 1,
                interval.end(),
                record.strand(),
                class
            );
        }
    }
    if plan.row_count() > max_rows {
        println!("\n... {} more rows", plan.row_count() - max_rows);
    }

    if let Some(pileups) = &plan.pileups {
        println!("\nCovered positions: {}", pileups.len());
    }
    if !plan.mismatches.is_empty() {
        println!("\n{:>12} {:>4} {:>4} {:>8}", "Position", "Ref", "Alt", "Fraction");
        for snp in &plan.mismatches {
            println!(
                "{:>12} {:>4} {:>4} {:>8.3}",
                snp.position + 1,
                snp.reference_base as char,
                snp.consensus_base as char,
                snp.fraction
            );
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    match cli.command {
        Commands::Plan {
            bam,
            reference,
            region,
            track,
            mode,
            config,
            rows,
        } => {
            let config = load_config(config.as_deref())?;
            let region: Region = region.parse().context("failed to parse region")?;
            let reads = AlignmentReader::read_bam(&bam, &region)?;
            println!("Loaded {} reads in region {}", reads.len(), region);

            let mut request = RenderRequest::new(region.to_interval(), track, mode).with_records(reads);
            if let Some(path) = reference {
                let genome = ReferenceGenome::from_file(&path)?;
                request = request.with_reference(genome.fetch(&region)?);
            }

            let outcome = RenderPlanBuilder::new(&config).build(request);
            match &outcome {
                RenderOutcome::Plan(plan) => print_plan(plan, rows),
                advisory => {
                    println!("Tier:    {}", advisory.tier());
                    if let Some(message) = advisory.message() {
                        println!("{message}");
                    }
                }
            }
        }

        Commands::Tier {
            length,
            track,
            mode,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let policy = ResolutionPolicy::new(&config.resolution);
            let tier = policy.decide(length, track, mode);
            if policy.is_too_coarse(tier, track, mode) {
                println!("{tier} (too coarse for {mode})");
            } else {
                println!("{tier}");
            }
        }
    }

    Ok(())
}
