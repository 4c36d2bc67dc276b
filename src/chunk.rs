use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use crate::record::{ParseError, Record};

const CHUNK_FILE_PREFIX: &str = "chunk_";
const CHUNK_FILE_SUFFIX: &str = ".txt";

/// Returns the file name of the chunk with index `idx`.
pub fn chunk_file_name(idx: usize) -> String {
    format!("{}{}{}", CHUNK_FILE_PREFIX, idx, CHUNK_FILE_SUFFIX)
}

/// Returns the index of a chunk file or [`None`] if the path is not a chunk file.
pub fn chunk_index(path: &Path) -> Option<usize> {
    path.file_name()?
        .to_str()?
        .strip_prefix(CHUNK_FILE_PREFIX)?
        .strip_suffix(CHUNK_FILE_SUFFIX)?
        .parse()
        .ok()
}

/// Lists chunk files of a directory ordered by chunk index. Other files are ignored.
pub fn list_chunks(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut chunks = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(idx) = chunk_index(&path) {
            chunks.push((idx, path));
        }
    }
    chunks.sort_unstable_by_key(|(idx, _)| *idx);

    return Ok(chunks.into_iter().map(|(_, path)| path).collect());
}

/// Opens a chunk file for buffered reading.
pub fn open_chunk(path: &Path, buf_size: Option<usize>) -> io::Result<io::BufReader<fs::File>> {
    let file = fs::File::open(path)?;
    return Ok(match buf_size {
        Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
        None => io::BufReader::new(file),
    });
}

/// Creates (or truncates) a chunk file for buffered writing.
pub fn create_chunk(path: &Path, buf_size: Option<usize>) -> io::Result<io::BufWriter<fs::File>> {
    let file = fs::File::create(path)?;
    return Ok(match buf_size {
        Some(buf_size) => io::BufWriter::with_capacity(buf_size, file),
        None => io::BufWriter::new(file),
    });
}

/// Pull cursor over an ascending stream of items.
pub trait SortedSource {
    type Item;
    type Error: Error;

    /// Fetches the next item. Returns `Ok(None)` once the source is exhausted.
    fn advance(&mut self) -> Result<Option<Self::Item>, Self::Error>;
}

/// Sorted chunk reading error.
#[derive(Debug)]
pub enum ChunkReadError {
    /// Chunk file reading failed.
    IO(io::Error),
    /// Chunk line is not a valid record.
    Parse { line: usize, source: ParseError },
}

impl Error for ChunkReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(match &self {
            ChunkReadError::IO(err) => err,
            ChunkReadError::Parse { source, .. } => source,
        })
    }
}

impl Display for ChunkReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            ChunkReadError::IO(err) => write!(f, "chunk reading failed: {}", err),
            ChunkReadError::Parse { line, source } => write!(f, "chunk line {} is malformed: {}", line, source),
        }
    }
}

/// Cursor over a sorted chunk file. Yields one record per line.
pub struct ChunkReader<R = io::BufReader<fs::File>> {
    reader: R,
    line: String,
    line_number: usize,
}

impl ChunkReader {
    /// Opens a sorted chunk file.
    pub fn open(path: &Path, buf_size: Option<usize>) -> io::Result<Self> {
        Ok(ChunkReader::new(open_chunk(path, buf_size)?))
    }
}

impl<R: BufRead> ChunkReader<R> {
    pub fn new(reader: R) -> Self {
        ChunkReader {
            reader,
            line: String::new(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> SortedSource for ChunkReader<R> {
    type Item = Record;
    type Error = ChunkReadError;

    fn advance(&mut self) -> Result<Option<Record>, ChunkReadError> {
        self.line.clear();
        if self.reader.read_line(&mut self.line).map_err(ChunkReadError::IO)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        let line = trim_line_end(&self.line);
        let record = Record::parse(line).map_err(|source| ChunkReadError::Parse {
            line: self.line_number,
            source,
        })?;

        return Ok(Some(record));
    }
}

fn trim_line_end(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::io;
    use std::path::Path;

    use rstest::*;

    use super::{chunk_file_name, chunk_index, list_chunks, ChunkReadError, ChunkReader, SortedSource};
    use crate::record::Record;

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[rstest]
    #[case(0)]
    #[case(7)]
    #[case(1234)]
    fn test_chunk_name_index(#[case] idx: usize) {
        let name = chunk_file_name(idx);
        assert_eq!(chunk_index(Path::new(&name)), Some(idx));
    }

    #[rstest]
    #[case("chunk_.txt")]
    #[case("chunk_1.tmp")]
    #[case("other_1.txt")]
    #[case("chunk_x.txt")]
    fn test_not_a_chunk(#[case] name: &str) {
        assert_eq!(chunk_index(Path::new(name)), None);
    }

    #[rstest]
    fn test_list_chunks_by_index(tmp_dir: tempfile::TempDir) {
        for idx in [10, 2, 1] {
            fs::write(tmp_dir.path().join(chunk_file_name(idx)), "").unwrap();
        }
        fs::write(tmp_dir.path().join("notes.txt"), "").unwrap();

        let chunks = list_chunks(tmp_dir.path()).unwrap();
        let indices = Vec::from_iter(chunks.iter().map(|path| chunk_index(path).unwrap()));

        assert_eq!(indices, vec![1, 2, 10]);
    }

    #[test]
    fn test_chunk_reader() {
        let data = "2.apple\r\n5.apple\n5.banana";
        let mut reader = ChunkReader::new(io::Cursor::new(data));

        assert_eq!(reader.advance().unwrap(), Some(Record::new(2, "apple")));
        assert_eq!(reader.advance().unwrap(), Some(Record::new(5, "apple")));
        assert_eq!(reader.advance().unwrap(), Some(Record::new(5, "banana")));
        assert_eq!(reader.advance().unwrap(), None);
        assert_eq!(reader.advance().unwrap(), None);
    }

    #[test]
    fn test_chunk_reader_malformed_line() {
        let mut reader = ChunkReader::new(io::Cursor::new("1.a\nbroken\n"));

        assert!(reader.advance().unwrap().is_some());
        match reader.advance() {
            Err(ChunkReadError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[rstest]
    fn test_chunk_reader_file(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join(chunk_file_name(0));
        fs::write(&path, "1.a\n2.b\n").unwrap();

        let mut reader = ChunkReader::open(&path, Some(16)).unwrap();
        let mut records = Vec::new();
        while let Some(record) = reader.advance().unwrap() {
            records.push(record);
        }

        assert_eq!(records, vec![Record::new(1, "a"), Record::new(2, "b")]);
    }
}
