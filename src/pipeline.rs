//! Sorting pipeline.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::Path;
use std::time::Instant;

use crate::chunk::{list_chunks, ChunkReader};
use crate::error::SortError;
use crate::merger::BinaryHeapMerger;
use crate::record::Record;
use crate::sort::ChunkSorter;
use crate::split::ChunkSplitter;
use crate::stage::{LogObserver, Stage, StageObserver};
use crate::workspace::Workspace;

/// Default number of lines per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1_000_000;

/// Sorting run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSummary {
    /// Number of chunks the input was split into.
    pub chunks: usize,
    /// Number of records written to the output.
    pub records: usize,
}

/// Sorting pipeline builder. Provides methods for [`SortPipeline`] initialization.
#[derive(Clone)]
pub struct SortPipelineBuilder<O = LogObserver>
where
    O: StageObserver,
{
    /// Maximum number of lines per chunk.
    chunk_size: usize,
    /// Number of threads to be used to sort chunks in parallel.
    threads_number: Option<usize>,
    /// Directory to be used to store temporary data.
    tmp_dir: Option<Box<Path>>,
    /// Input, output and chunk files read/write buffer size.
    rw_buf_size: Option<usize>,
    /// Stage timings observer.
    observer: O,
}

impl SortPipelineBuilder {
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        SortPipelineBuilder::default()
    }
}

impl<O: StageObserver> SortPipelineBuilder<O> {
    /// Builds a [`SortPipeline`] instance using provided configuration.
    pub fn build(self) -> Result<SortPipeline<O>, SortError> {
        SortPipeline::new(
            self.chunk_size,
            self.threads_number,
            self.tmp_dir.as_deref(),
            self.rw_buf_size,
            self.observer,
        )
    }

    /// Sets maximum number of lines per chunk.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> SortPipelineBuilder<O> {
        self.chunk_size = chunk_size;
        return self;
    }

    /// Sets number of threads to be used to sort chunks in parallel.
    pub fn with_threads_number(mut self, threads_number: usize) -> SortPipelineBuilder<O> {
        self.threads_number = Some(threads_number);
        return self;
    }

    /// Sets directory to be used to store temporary data.
    pub fn with_tmp_dir(mut self, path: &Path) -> SortPipelineBuilder<O> {
        self.tmp_dir = Some(path.into());
        return self;
    }

    /// Sets files read/write buffer size.
    pub fn with_rw_buf_size(mut self, buf_size: usize) -> SortPipelineBuilder<O> {
        self.rw_buf_size = Some(buf_size);
        return self;
    }

    /// Sets stage timings observer.
    pub fn with_observer<P: StageObserver>(self, observer: P) -> SortPipelineBuilder<P> {
        SortPipelineBuilder {
            chunk_size: self.chunk_size,
            threads_number: self.threads_number,
            tmp_dir: self.tmp_dir,
            rw_buf_size: self.rw_buf_size,
            observer,
        }
    }
}

impl Default for SortPipelineBuilder {
    fn default() -> Self {
        SortPipelineBuilder {
            chunk_size: DEFAULT_CHUNK_SIZE,
            threads_number: None,
            tmp_dir: None,
            rw_buf_size: None,
            observer: LogObserver,
        }
    }
}

/// External sorting pipeline for record files.
///
/// A run splits the input into chunk files, sorts the chunks in parallel and merges them into the output.
/// Each stage completes before the next one starts. Every run works in its own temporary workspace
/// which is removed when the run ends, whatever the outcome.
pub struct SortPipeline<O = LogObserver>
where
    O: StageObserver,
{
    /// Sorting thread pool.
    thread_pool: rayon::ThreadPool,
    /// Maximum number of lines per chunk.
    chunk_size: usize,
    /// Parent directory of run workspaces.
    tmp_dir: Option<Box<Path>>,
    /// Files read/write buffer size.
    rw_buf_size: Option<usize>,
    /// Stage timings observer.
    observer: O,
}

impl<O: StageObserver> SortPipeline<O> {
    /// Creates a new sorting pipeline instance.
    ///
    /// # Arguments
    /// * `chunk_size` - Maximum number of lines per chunk, must be positive.
    /// * `threads_number` - Number of threads to be used to sort chunks in parallel. If the parameter is [`None`]
    ///   threads number will be selected based on available CPU core number.
    /// * `tmp_path` - Directory to be used to store temporary data. If parameter is [`None`] default OS temporary
    ///   directory will be used.
    /// * `rw_buf_size` - Files read/write buffer size.
    /// * `observer` - Receives stage timings.
    pub fn new(
        chunk_size: usize,
        threads_number: Option<usize>,
        tmp_path: Option<&Path>,
        rw_buf_size: Option<usize>,
        observer: O,
    ) -> Result<Self, SortError> {
        if chunk_size == 0 {
            return Err(SortError::Validation("chunk size must be positive".to_string()));
        }
        if threads_number == Some(0) {
            return Err(SortError::Validation("threads number must be positive".to_string()));
        }

        return Ok(SortPipeline {
            thread_pool: Self::init_thread_pool(threads_number)?,
            chunk_size,
            tmp_dir: tmp_path.map(Into::into),
            rw_buf_size,
            observer,
        });
    }

    fn init_thread_pool(threads_number: Option<usize>) -> Result<rayon::ThreadPool, SortError> {
        let mut thread_pool_builder = rayon::ThreadPoolBuilder::new();

        if let Some(threads_number) = threads_number {
            log::info!("initializing thread-pool (threads: {})", threads_number);
            thread_pool_builder = thread_pool_builder.num_threads(threads_number);
        } else {
            log::info!("initializing thread-pool (threads: default)");
        }
        let thread_pool = thread_pool_builder
            .build()
            .map_err(|err| SortError::ThreadPoolBuildError(err))?;

        return Ok(thread_pool);
    }

    /// Sorts the record file `input` into `output` by text, then number.
    /// An existing `output` file is replaced.
    pub fn sort_file(&self, input: &Path, output: &Path) -> Result<SortSummary, SortError> {
        self.sort_file_by(input, output, Record::cmp)
    }

    /// Sorts the record file `input` into `output` using a custom compare function.
    /// The same function orders records within chunks and across chunks.
    ///
    /// # Arguments
    /// * `input` - File to be sorted
    /// * `output` - File the sorted records are written to, replaced if it exists
    /// * `compare` - Function be be used to compare records
    pub fn sort_file_by<F>(&self, input: &Path, output: &Path, compare: F) -> Result<SortSummary, SortError>
    where
        F: Fn(&Record, &Record) -> Ordering + Sync + Send + Copy,
    {
        let workspace = Workspace::create(self.tmp_dir.as_deref())?;

        let chunks = self.timed(Stage::Split, || {
            ChunkSplitter::new(self.chunk_size, self.rw_buf_size)?.split_file(input, workspace.chunks_dir())
        })?;
        log::info!("input split into {} chunks", chunks);

        self.timed(Stage::Sort, || {
            ChunkSorter::new(&self.thread_pool, self.rw_buf_size).sort_chunks_by(
                workspace.chunks_dir(),
                workspace.sorted_dir(),
                compare,
            )
        })?;

        let records = self.timed(Stage::Merge, || self.merge(workspace.sorted_dir(), output, compare))?;
        log::info!("{} records merged into {}", records, output.display());

        workspace.close()?;

        return Ok(SortSummary { chunks, records });
    }

    fn merge<F>(&self, sorted_dir: &Path, output: &Path, compare: F) -> Result<usize, SortError>
    where
        F: Fn(&Record, &Record) -> Ordering,
    {
        let mut sources = Vec::new();
        for chunk in list_chunks(sorted_dir)? {
            sources.push(ChunkReader::open(&chunk, self.rw_buf_size)?);
        }
        let merger = BinaryHeapMerger::new(sources, compare)?;
        log::debug!("merging {} sorted chunks", merger.active_sources());

        if output.exists() {
            log::debug!("removing existing output {}", output.display());
            fs::remove_file(output)?;
        }

        let file = fs::File::create(output)?;
        let mut writer = match self.rw_buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, file),
            None => io::BufWriter::new(file),
        };

        let mut records = 0;
        for record in merger {
            writeln!(writer, "{}", record?)?;
            records += 1;
        }
        writer.flush()?;

        return Ok(records);
    }

    fn timed<T>(&self, stage: Stage, run: impl FnOnce() -> Result<T, SortError>) -> Result<T, SortError> {
        log::debug!("{} started", stage);
        let started = Instant::now();
        let result = run();
        self.observer.stage_finished(stage, started.elapsed());

        return result;
    }
}
