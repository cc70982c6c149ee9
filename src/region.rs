use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::interval::GenomicInterval;

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("invalid region '{0}': expected 'chrom:start-end'")]
    InvalidFormat(String),
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] std::num::ParseIntError),
    #[error("region start must be at least 1, got {0}")]
    ZeroStart(u64),
    #[error("start ({start}) must not exceed end ({end})")]
    InvalidRange { start: u64, end: u64 },
}

/// A visible window as typed by a user: `chrom:start-end`, 1-based, inclusive.
///
/// The layout core works on [`GenomicInterval`]; `Region` only exists at the
/// boundary with readers and the command line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Region {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Result<Self, RegionError> {
        if start == 0 {
            return Err(RegionError::ZeroStart(start));
        }
        if start > end {
            return Err(RegionError::InvalidRange { start, end });
        }
        Ok(Self {
            chrom: chrom.into(),
            start,
            end,
        })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 0-based half-open interval covering the same bases.
    pub fn to_interval(&self) -> GenomicInterval {
        GenomicInterval::from(self)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

impl FromStr for Region {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (chrom, rest) = s
            .rsplit_once(':')
            .filter(|(chrom, _)| !chrom.is_empty())
            .ok_or_else(|| RegionError::InvalidFormat(s.to_string()))?;
        let (start, end) = rest
            .split_once('-')
            .ok_or_else(|| RegionError::InvalidFormat(s.to_string()))?;
        let start: u64 = start.replace(',', "").parse()?;
        let end: u64 = end.replace(',', "").parse()?;
        Region::new(chrom, start, end)
    }
}
