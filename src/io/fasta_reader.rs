// FASTA input for sequence batches, using bio::io::fasta
//
// Compressed input is detected by the .gz extension. BGZIP files (blocked gzip,
// as written by bgzip/samtools) are decompressed on several threads via
// noodles-bgzf; plain gzip goes through flate2 on the calling thread.

use crate::scheduler::SequenceBatch;
use bio::io::fasta;
use flate2::read::MultiGzDecoder;
use noodles_bgzf as bgzf;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::sync::Arc;

const BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// FASTA reader with automatic gzip/bgzip detection
pub struct FastaReader {
    records: fasta::Records<BufReader<Box<dyn Read>>>,
}

/// BGZIP sets FEXTRA and carries a `BC` subfield right after the gzip header.
fn is_bgzip_format(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 18];
    let mut filled = 0;
    while filled < header.len() {
        match file.read(&mut header[filled..])? {
            0 => return Ok(false),
            n => filled += n,
        }
    }

    let gzip_magic = header[0] == 0x1f && header[1] == 0x8b;
    let has_extra = header[3] & 0x04 != 0;
    Ok(gzip_magic && has_extra && header[12] == b'B' && header[13] == b'C')
}

impl FastaReader {
    /// Open a FASTA file (.fa, .fasta, .fa.gz, .fasta.gz)
    pub fn new<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let gzipped = path.extension().is_some_and(|ext| ext == "gz");

        let reader: Box<dyn Read> = if gzipped && is_bgzip_format(path)? {
            log::debug!("{}: BGZIP input, multithreaded decompression", path.display());
            Box::new(bgzf::MultithreadedReader::new(file))
        } else if gzipped {
            log::debug!("{}: gzip input, single-threaded decompression", path.display());
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };

        Ok(Self {
            records: fasta::Reader::from_bufread(BufReader::with_capacity(BUFFER_SIZE, reader))
                .records(),
        })
    }

    /// Read the next FASTA record
    ///
    /// Returns `Ok(Some(record))` if a record is found, `Ok(None)` at EOF,
    /// and `Err(e)` on a parse error.
    pub fn read_record(&mut self) -> io::Result<Option<fasta::Record>> {
        match self.records.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(io::Error::new(io::ErrorKind::InvalidData, e)),
            None => Ok(None),
        }
    }
}

/// Every record of one FASTA file: names in file order and the matching
/// sequences as a shareable batch.
#[derive(Debug, Clone)]
pub struct NamedBatch {
    pub names: Vec<String>,
    pub sequences: SequenceBatch,
}

impl NamedBatch {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn total_bases(&self) -> usize {
        self.sequences.iter().map(Vec::len).sum()
    }
}

/// Load a whole FASTA file. Bases are upper-cased so soft-masked input
/// compares equal to its unmasked form.
pub fn read_sequence_batch<P: AsRef<Path>>(path: P) -> io::Result<NamedBatch> {
    let path = path.as_ref();
    let mut reader = FastaReader::new(path)?;
    let mut names = Vec::new();
    let mut sequences = Vec::new();

    while let Some(record) = reader.read_record()? {
        names.push(record.id().to_string());
        sequences.push(record.seq().to_ascii_uppercase());
    }

    log::debug!("{}: read {} sequences", path.display(), names.len());
    Ok(NamedBatch {
        names,
        sequences: Arc::from(sequences),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_reads_plain_fasta() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ">a first").unwrap();
        writeln!(file, "ACGT").unwrap();
        writeln!(file, "acgt").unwrap();
        writeln!(file, ">b").unwrap();
        writeln!(file, "GGG").unwrap();
        file.flush().unwrap();

        let batch = read_sequence_batch(file.path()).unwrap();
        assert_eq!(batch.names, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(batch.sequences[0], b"ACGTACGT".to_vec());
        assert_eq!(batch.sequences[1], b"GGG".to_vec());
        assert_eq!(batch.total_bases(), 11);
    }

    #[test]
    fn test_reads_gzip_fasta() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("zipped.fa.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b">x\nTTAA\n").unwrap();
        encoder.finish().unwrap();

        assert!(!is_bgzip_format(&path).unwrap());
        let batch = read_sequence_batch(&path).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.sequences[0], b"TTAA".to_vec());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(FastaReader::new(temp_dir.path().join("does_not_exist.fa")).is_err());
    }
}
