use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::alignment::{AlignedRead, CigarOp, ReadFlags};
use crate::interval::GenomicInterval;
use crate::record::Strand;
use crate::region::Region;

/// Loads aligned reads from an indexed BAM file.
pub struct AlignmentReader;

impl AlignmentReader {
    /// Read every mapped record overlapping `region`.
    ///
    /// The BAM file must be coordinate-sorted and indexed (.bai). Unmapped
    /// records are dropped here; everything else, including reads whose mate
    /// is unmapped, is handed to the layout core.
    pub fn read_bam(path: &Path, region: &Region) -> Result<Vec<AlignedRead>> {
        let mut reader = noodles::bam::io::indexed_reader::Builder::default()
            .build_from_path(path)
            .with_context(|| format!("failed to open BAM file: {}", path.display()))?;

        let header = reader.read_header().context("failed to read BAM header")?;

        let query_region: noodles::core::Region = region
            .to_string()
            .parse()
            .with_context(|| format!("failed to parse region: {region}"))?;

        let query = reader
            .query(&header, &query_region)
            .context("failed to query BAM region")?;

        let mut reads = Vec::new();
        let mut skipped = 0usize;
        for result in query {
            let record = result.context("failed to read BAM record")?;

            if record.flags().is_unmapped() {
                skipped += 1;
                continue;
            }

            match Self::convert_record(&record, &header)? {
                Some(read) => reads.push(read),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!("skipped {skipped} unmapped or unplaced records in {region}");
        }
        info!("loaded {} alignments from {}", reads.len(), path.display());

        Ok(reads)
    }

    fn convert_record(
        record: &noodles::bam::Record,
        header: &noodles::sam::Header,
    ) -> Result<Option<AlignedRead>> {
        let name = record
            .name()
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .filter(|n| !n.is_empty() && n != "*");

        let ref_seq_id = match record.reference_sequence_id() {
            Some(id) => id.context("failed to read reference sequence ID")?,
            None => return Ok(None),
        };

        let chrom = header
            .reference_sequences()
            .get_index(ref_seq_id)
            .map(|(name, _)| name.to_string())
            .unwrap_or_default();

        // noodles positions are 1-based
        let start = match record.alignment_start() {
            Some(p) => p.context("failed to read alignment start")?.get() as i64 - 1,
            None => return Ok(None),
        };

        let cigar = Self::convert_cigar(record)?;
        let ref_len: i64 = cigar.iter().map(|op| op.ref_len() as i64).sum();

        let flags = record.flags();
        let read_flags = ReadFlags {
            paired: flags.is_segmented(),
            unmapped: flags.is_unmapped(),
            mate_unmapped: flags.is_mate_unmapped(),
        };

        let same_chrom_mate = match record.mate_reference_sequence_id() {
            Some(id) => id.context("failed to read mate reference sequence ID")? == ref_seq_id,
            None => false,
        };

        let mate_start = if read_flags.paired && !read_flags.mate_unmapped && same_chrom_mate {
            match record.mate_alignment_start() {
                Some(p) => Some(p.context("failed to read mate alignment start")?.get() as i64 - 1),
                None => None,
            }
        } else {
            None
        };

        let mate_strand = mate_start.map(|_| {
            if flags.is_mate_reverse_complemented() {
                Strand::Reverse
            } else {
                Strand::Forward
            }
        });

        let insert_size = match record.template_length() {
            0 => None,
            tlen => Some(tlen as i64),
        };

        let sequence: Vec<u8> = record.sequence().iter().collect();
        let qualities: Vec<u8> = record.quality_scores().as_ref().to_vec();

        Ok(Some(AlignedRead {
            name,
            chrom,
            interval: GenomicInterval::from_len(start, ref_len),
            strand: if flags.is_reverse_complemented() {
                Strand::Reverse
            } else {
                Strand::Forward
            },
            mapq: record.mapping_quality().map(|q| q.get()).unwrap_or(0),
            cigar,
            sequence,
            qualities,
            flags: read_flags,
            mate_start,
            mate_strand,
            insert_size,
        }))
    }

    fn convert_cigar(record: &noodles::bam::Record) -> Result<Vec<CigarOp>> {
        use noodles::sam::alignment::record::cigar::op::Kind;

        let mut ops = Vec::new();
        for result in record.cigar().iter() {
            let op = result.context("failed to read CIGAR operation")?;
            let len = op.len() as u32;
            ops.push(match op.kind() {
                Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => CigarOp::Match(len),
                Kind::Insertion => CigarOp::Insertion(len),
                Kind::Deletion => CigarOp::Deletion(len),
                Kind::Skip => CigarOp::Skip(len),
                Kind::Pad => CigarOp::Pad(len),
                Kind::SoftClip => CigarOp::SoftClip(len),
                Kind::HardClip => CigarOp::HardClip(len),
            });
        }
        Ok(ops)
    }
}
