//! Parallel chunk sorter.

use std::cmp::Ordering;
use std::fs;
use std::io::prelude::*;
use std::path::Path;

use rayon::prelude::*;

use crate::chunk::{create_chunk, list_chunks, open_chunk};
use crate::error::SortError;
use crate::record::Record;

/// Sorts chunk files independently on a worker thread pool.
///
/// Every worker owns one chunk at a time: it loads the chunk into memory, parses it, removes the unsorted
/// file, sorts the records and writes them to a file with the same name in the output directory.
/// Peak memory is bounded by chunk size \* pool threads.
pub struct ChunkSorter<'a> {
    thread_pool: &'a rayon::ThreadPool,
    rw_buf_size: Option<usize>,
}

impl<'a> ChunkSorter<'a> {
    /// Creates a chunk sorter.
    ///
    /// # Arguments
    /// * `thread_pool` - Pool the chunks are sorted on, its size bounds the number of chunks held in memory
    /// * `rw_buf_size` - Chunk files read/write buffer size
    pub fn new(thread_pool: &'a rayon::ThreadPool, rw_buf_size: Option<usize>) -> Self {
        ChunkSorter {
            thread_pool,
            rw_buf_size,
        }
    }

    /// Sorts every chunk of `chunks_dir` into `output_dir` using the record order.
    pub fn sort_chunks(&self, chunks_dir: &Path, output_dir: &Path) -> Result<usize, SortError> {
        self.sort_chunks_by(chunks_dir, output_dir, Record::cmp)
    }

    /// Sorts every chunk of `chunks_dir` into `output_dir` using a custom compare function.
    /// The first failing chunk fails the whole stage. Returns the number of sorted chunks.
    ///
    /// # Arguments
    /// * `chunks_dir` - Directory with unsorted chunk files, emptied by the call
    /// * `output_dir` - Directory sorted chunks are written to
    /// * `compare` - Function used to compare records
    pub fn sort_chunks_by<F>(&self, chunks_dir: &Path, output_dir: &Path, compare: F) -> Result<usize, SortError>
    where
        F: Fn(&Record, &Record) -> Ordering + Sync + Send + Copy,
    {
        let chunks = list_chunks(chunks_dir)?;
        log::info!(
            "sorting {} chunks (threads: {})",
            chunks.len(),
            self.thread_pool.current_num_threads()
        );

        self.thread_pool.install(|| {
            chunks
                .par_iter()
                .try_for_each(|chunk| self.sort_chunk(chunk, output_dir, compare))
        })?;

        return Ok(chunks.len());
    }

    fn sort_chunk<F>(&self, chunk: &Path, output_dir: &Path, compare: F) -> Result<(), SortError>
    where
        F: Fn(&Record, &Record) -> Ordering,
    {
        let mut records = self.load_chunk(chunk)?;
        // the unsorted chunk is not needed once loaded
        fs::remove_file(chunk)?;

        records.sort_unstable_by(compare);

        let file_name = chunk
            .file_name()
            .ok_or_else(|| SortError::Validation(format!("chunk path {} has no file name", chunk.display())))?;
        let output = output_dir.join(file_name);

        let mut writer = create_chunk(&output, self.rw_buf_size)?;
        for record in &records {
            writeln!(writer, "{}", record)?;
        }
        writer.flush()?;

        log::debug!("chunk {} sorted ({} records)", output.display(), records.len());

        return Ok(());
    }

    fn load_chunk(&self, chunk: &Path) -> Result<Vec<Record>, SortError> {
        let reader = open_chunk(chunk, self.rw_buf_size)?;

        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let record = Record::parse(&line).map_err(|source| SortError::Parse {
                path: chunk.to_path_buf(),
                line: idx + 1,
                source,
            })?;
            records.push(record);
        }

        return Ok(records);
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::path::PathBuf;

    use rand::seq::SliceRandom;
    use rstest::*;

    use super::ChunkSorter;
    use crate::chunk::{chunk_file_name, list_chunks};
    use crate::error::SortError;
    use crate::record::Record;

    struct Dirs {
        _root: tempfile::TempDir,
        chunks: PathBuf,
        sorted: PathBuf,
    }

    #[fixture]
    fn dirs() -> Dirs {
        let root = tempfile::tempdir().unwrap();
        let chunks = root.path().join("chunks");
        let sorted = root.path().join("sorted");
        fs::create_dir(&chunks).unwrap();
        fs::create_dir(&sorted).unwrap();

        Dirs {
            _root: root,
            chunks,
            sorted,
        }
    }

    #[fixture]
    fn thread_pool() -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    fn read_lines(path: &PathBuf) -> Vec<String> {
        Vec::from_iter(fs::read_to_string(path).unwrap().lines().map(String::from))
    }

    #[rstest]
    fn test_sort_chunks_scenario(dirs: Dirs, thread_pool: rayon::ThreadPool) {
        fs::write(dirs.chunks.join(chunk_file_name(0)), "5.apple\n2.apple\n").unwrap();
        fs::write(dirs.chunks.join(chunk_file_name(1)), "5.banana\n").unwrap();

        let sorter = ChunkSorter::new(&thread_pool, None);
        let sorted = sorter.sort_chunks(&dirs.chunks, &dirs.sorted).unwrap();

        assert_eq!(sorted, 2);
        assert!(list_chunks(&dirs.chunks).unwrap().is_empty());
        assert_eq!(read_lines(&dirs.sorted.join(chunk_file_name(0))), vec!["2.apple", "5.apple"]);
        assert_eq!(read_lines(&dirs.sorted.join(chunk_file_name(1))), vec!["5.banana"]);
    }

    #[rstest]
    fn test_sort_many_chunks(dirs: Dirs, thread_pool: rayon::ThreadPool) {
        let mut rng = rand::thread_rng();
        for idx in 0..8 {
            let mut records = Vec::from_iter((0..50).map(|n| Record::new(n % 7, format!("text {}", n % 5))));
            records.shuffle(&mut rng);
            let data = String::from_iter(records.iter().map(|record| format!("{}\n", record)));
            fs::write(dirs.chunks.join(chunk_file_name(idx)), data).unwrap();
        }

        let sorter = ChunkSorter::new(&thread_pool, Some(128));
        assert_eq!(sorter.sort_chunks(&dirs.chunks, &dirs.sorted).unwrap(), 8);

        for chunk in list_chunks(&dirs.sorted).unwrap() {
            let records = Vec::from_iter(read_lines(&chunk).iter().map(|line| Record::parse(line).unwrap()));
            assert_eq!(records.len(), 50);
            assert!(records.windows(2).all(|pair| pair[0] <= pair[1]));
        }
    }

    #[rstest]
    fn test_sort_chunks_by_custom_order(dirs: Dirs, thread_pool: rayon::ThreadPool) {
        fs::write(dirs.chunks.join(chunk_file_name(0)), "1.b\n3.a\n2.c\n").unwrap();

        let sorter = ChunkSorter::new(&thread_pool, None);
        sorter
            .sort_chunks_by(&dirs.chunks, &dirs.sorted, |a: &Record, b: &Record| b.number().cmp(&a.number()))
            .unwrap();

        assert_eq!(read_lines(&dirs.sorted.join(chunk_file_name(0))), vec!["3.a", "2.c", "1.b"]);
    }

    #[rstest]
    fn test_sort_chunks_parse_error(dirs: Dirs, thread_pool: rayon::ThreadPool) {
        fs::write(dirs.chunks.join(chunk_file_name(0)), "1.a\n").unwrap();
        fs::write(dirs.chunks.join(chunk_file_name(1)), "2.b\nnot a record\n").unwrap();

        let sorter = ChunkSorter::new(&thread_pool, None);
        match sorter.sort_chunks(&dirs.chunks, &dirs.sorted) {
            Err(SortError::Parse { path, line, .. }) => {
                assert_eq!(path, dirs.chunks.join(chunk_file_name(1)));
                assert_eq!(line, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[rstest]
    fn test_sort_no_chunks(dirs: Dirs, thread_pool: rayon::ThreadPool) {
        let sorter = ChunkSorter::new(&thread_pool, None);

        assert_eq!(sorter.sort_chunks(&dirs.chunks, &dirs.sorted).unwrap(), 0);
    }
}
