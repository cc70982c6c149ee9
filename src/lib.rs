//! Layout core for genome-browser tracks: resolution tiers, row packing,
//! per-base pileups and mate pairing, assembled into typed render plans.

pub mod alignment;
pub mod config;
pub mod interval;
pub mod mates;
pub mod packing;
pub mod pileup;
pub mod plan;
pub mod record;
pub mod reference;
pub mod region;
pub mod resolution;

pub use config::RenderConfig;
pub use interval::{GenomicInterval, HasInterval};
pub use plan::{RenderOutcome, RenderPlan, RenderPlanBuilder, RenderRequest};
pub use record::DisplayableRecord;
pub use resolution::{DisplayMode, ResolutionTier, TrackKind};
