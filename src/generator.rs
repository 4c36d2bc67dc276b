//! Test data generator.
//!
//! Produces record files of a requested size from a text corpus, one record per line.
//! The corpus itself can be built from any text file with [`init_corpus`].

use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SortError;
use crate::record::Record;

/// Shortest corpus text cut by [`write_corpus`], in bytes.
pub const MIN_SEGMENT_LENGTH: usize = 15;
/// Longest corpus text cut by [`write_corpus`], in bytes.
pub const MAX_SEGMENT_LENGTH: usize = 50;

const PROGRESS_STEP: u64 = 10;

/// Random record generator.
///
/// Numbers are non-negative 31-bit integers, texts are picked from the corpus lines.
pub struct RecordGenerator<R: Rng = StdRng> {
    corpus: Vec<String>,
    rng: R,
}

impl RecordGenerator {
    /// Creates a generator seeded from the OS entropy source.
    pub fn new(corpus: impl IntoIterator<Item = String>) -> Result<Self, SortError> {
        RecordGenerator::with_rng(corpus, StdRng::from_entropy())
    }

    /// Creates a reproducible generator.
    pub fn with_seed(corpus: impl IntoIterator<Item = String>, seed: u64) -> Result<Self, SortError> {
        RecordGenerator::with_rng(corpus, StdRng::seed_from_u64(seed))
    }

    /// Creates a generator using the non-blank lines of the `corpus` file as texts.
    pub fn from_corpus_file(corpus: &Path) -> Result<Self, SortError> {
        let reader = io::BufReader::new(fs::File::open(corpus)?);
        let lines: Result<Vec<String>, io::Error> = reader.lines().collect();

        RecordGenerator::new(lines?)
    }
}

impl<R: Rng> RecordGenerator<R> {
    /// Creates a generator with a custom random number generator.
    /// Blank corpus lines are ignored; a corpus without texts is rejected.
    pub fn with_rng(corpus: impl IntoIterator<Item = String>, rng: R) -> Result<Self, SortError> {
        let corpus = Vec::from_iter(
            corpus
                .into_iter()
                .map(|text| text.replace(&['\r', '\n'][..], " ").trim().to_string())
                .filter(|text| !text.is_empty()),
        );
        if corpus.is_empty() {
            return Err(SortError::Validation("generator corpus has no text".to_string()));
        }

        return Ok(RecordGenerator { corpus, rng });
    }

    /// Generates the next random record.
    pub fn next_record(&mut self) -> Record {
        let number = self.rng.gen_range(0..=i32::MAX as i64);
        let text = &self.corpus[self.rng.gen_range(0..self.corpus.len())];

        Record::new(number, text.as_str())
    }

    /// Writes records to `writer` until at least `size` bytes are written.
    /// Returns the number of bytes written, the last line may exceed `size`.
    /// Progress is logged every 10% of `size`.
    pub fn write_to<W: Write>(&mut self, writer: &mut W, size: u64) -> io::Result<u64> {
        let mut progress = Progress::new(size);
        let mut written = 0;
        while written < size {
            let line = format!("{}\n", self.next_record());
            writer.write_all(line.as_bytes())?;
            written += line.len() as u64;

            if let Some(percentage) = progress.update(written) {
                log::info!("progress: {}%", percentage);
            }
        }

        return Ok(written);
    }
}

/// Generates a record file of about `size` bytes at `output` using texts of the `corpus` file.
/// Returns the number of bytes written.
pub fn generate_file(corpus: &Path, output: &Path, size: u64) -> Result<u64, SortError> {
    let mut generator = RecordGenerator::from_corpus_file(corpus)?;

    let mut writer = io::BufWriter::new(fs::File::create(output)?);
    let written = generator.write_to(&mut writer, size)?;
    writer.flush()?;

    log::info!("{} bytes of records written to {}", written, output.display());

    return Ok(written);
}

/// Tracks completion of a job of known size in fixed percentage steps.
struct Progress {
    total: u64,
    reported: u64,
}

impl Progress {
    fn new(total: u64) -> Self {
        Progress { total, reported: 0 }
    }

    /// Returns the newly reached percentage if `done` crosses the next step.
    fn update(&mut self, done: u64) -> Option<u64> {
        if self.total == 0 {
            return None;
        }

        let percentage = (done.min(self.total) as u128 * 100 / self.total as u128) as u64;
        if percentage < self.reported + PROGRESS_STEP {
            return None;
        }

        self.reported = percentage / PROGRESS_STEP * PROGRESS_STEP;
        return Some(self.reported);
    }
}

/// Cuts `input` into consecutive segments of random length between [`MIN_SEGMENT_LENGTH`] and
/// [`MAX_SEGMENT_LENGTH`] bytes and writes each of them to `output` as a corpus line.
///
/// Line breaks and tabs are replaced by spaces and the segment is trimmed,
/// segments shorter than [`MIN_SEGMENT_LENGTH`] after that are skipped.
/// Returns the number of corpus lines written.
pub fn write_corpus<R, W, G>(input: &mut R, output: &mut W, rng: &mut G) -> io::Result<usize>
where
    R: Read,
    W: Write,
    G: Rng,
{
    let mut segments = 0;
    let mut buffer = Vec::with_capacity(MAX_SEGMENT_LENGTH);
    loop {
        let length = rng.gen_range(MIN_SEGMENT_LENGTH..=MAX_SEGMENT_LENGTH);
        buffer.clear();
        if input.by_ref().take(length as u64).read_to_end(&mut buffer)? == 0 {
            break;
        }

        let text = String::from_utf8_lossy(&buffer).replace(&['\r', '\n', '\t'][..], " ");
        let text = text.trim();
        if text.len() < MIN_SEGMENT_LENGTH {
            continue;
        }

        writeln!(output, "{}", text)?;
        segments += 1;
    }

    return Ok(segments);
}

/// Builds a generator corpus at `output` from the text file `input`.
/// Returns the number of corpus lines written.
pub fn init_corpus(input: &Path, output: &Path) -> Result<usize, SortError> {
    let mut reader = io::BufReader::new(fs::File::open(input)?);
    let mut writer = io::BufWriter::new(fs::File::create(output)?);

    let segments = write_corpus(&mut reader, &mut writer, &mut StdRng::from_entropy())?;
    writer.flush()?;

    log::info!("{} corpus texts written to {}", segments, output.display());

    return Ok(segments);
}
