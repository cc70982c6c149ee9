pub mod fasta;

pub use fasta::ReferenceGenome;
