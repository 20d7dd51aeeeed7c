//! Sequence input.

pub mod fasta_reader;

pub use fasta_reader::{FastaReader, NamedBatch, read_sequence_batch};
