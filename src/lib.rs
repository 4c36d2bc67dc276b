//! `large-sort` sorts record files that do not fit into memory.
//!
//! A record is a line of the form `<number>.<text>`, for example `415.Apple` or `30432.Something something something`.
//! Records are ordered by text (byte-wise) and, for equal texts, by number.
//!
//! Sorting is done in three stages, each of them completing before the next one starts:
//!
//! * **Split:**
//!   the input is cut into chunk files of at most `chunk_size` lines.
//! * **Sort:**
//!   chunks are loaded, sorted and written back in parallel, one chunk per worker thread,
//!   so memory consumption is bounded by `chunk_size` \* threads.
//! * **Merge:**
//!   sorted chunks are merged into the output by a binary heap k-way merge, reading one record
//!   at a time from every chunk.
//!
//! Intermediate files live in a temporary directory owned by the run and removed when it ends.
//! For more information see [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use large_sort::SortPipelineBuilder;
//!
//! fn main() {
//!     let pipeline = SortPipelineBuilder::new()
//!         .with_chunk_size(500_000)
//!         .with_tmp_dir(Path::new("./"))
//!         .build()
//!         .unwrap();
//!
//!     let summary = pipeline.sort_file(Path::new("input.txt"), Path::new("sorted.txt")).unwrap();
//!     println!("{} records sorted", summary.records);
//! }
//! ```

pub mod chunk;
pub mod error;
pub mod generator;
pub mod heap;
pub mod merger;
pub mod pipeline;
pub mod record;
pub mod sort;
pub mod split;
pub mod stage;
pub mod workspace;

pub use chunk::{ChunkReadError, ChunkReader, SortedSource};
pub use error::SortError;
pub use generator::RecordGenerator;
pub use heap::KeyedMinHeap;
pub use merger::{BinaryHeapMerger, IterSource, MergeError};
pub use pipeline::{SortPipeline, SortPipelineBuilder, SortSummary, DEFAULT_CHUNK_SIZE};
pub use record::{ParseError, Record};
pub use sort::ChunkSorter;
pub use split::ChunkSplitter;
pub use stage::{LogObserver, Stage, StageObserver};
pub use workspace::Workspace;
