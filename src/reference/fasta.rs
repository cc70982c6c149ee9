use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, bail};
use log::info;
use noodles::fasta;

use crate::interval::GenomicInterval;
use crate::region::Region;

/// Reference sequences held in memory, served as uppercase windows for
/// mismatch and pileup modes.
pub struct ReferenceGenome {
    sequences: HashMap<String, Vec<u8>>,
}

impl ReferenceGenome {
    /// Load every record of a FASTA file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("failed to open FASTA file: {}", path.display()))?;
        let mut reader = fasta::io::Reader::new(BufReader::new(file));

        let mut sequences = HashMap::new();
        for result in reader.records() {
            let record = result.with_context(|| format!("failed to read FASTA record from {}", path.display()))?;
            let name = String::from_utf8_lossy(record.name()).into_owned();
            sequences.insert(name, record.sequence().as_ref().to_vec());
        }
        info!("loaded {} reference sequences from {}", sequences.len(), path.display());
        Ok(Self { sequences })
    }

    pub fn from_sequences(sequences: HashMap<String, Vec<u8>>) -> Self {
        Self { sequences }
    }

    /// Bases under a 0-based half-open window, uppercased. A window running
    /// past the end of the sequence is clipped; one starting past it is an
    /// error.
    pub fn fetch_window(&self, chrom: &str, window: GenomicInterval) -> Result<Vec<u8>> {
        let Some(seq) = self.sequences.get(chrom) else {
            bail!(
                "chromosome '{chrom}' not found in reference (available: {})",
                self.chromosomes().join(", ")
            );
        };
        if window.start() < 0 || window.start() as usize >= seq.len() {
            bail!("window {chrom}:{window} is beyond sequence length {}", seq.len());
        }
        let start = window.start() as usize;
        let end = (window.end() as usize).min(seq.len());
        Ok(seq[start..end].to_ascii_uppercase())
    }

    /// Bases under a 1-based inclusive region.
    pub fn fetch(&self, region: &Region) -> Result<Vec<u8>> {
        self.fetch_window(&region.chrom, region.to_interval())
            .with_context(|| format!("failed to fetch reference for {region}"))
    }

    /// Sequence names in sorted order.
    pub fn chromosomes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sequences.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
