//! Chunk splitter.

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::iter::Peekable;
use std::path::Path;

use crate::chunk::{chunk_file_name, create_chunk};
use crate::error::SortError;

/// Splits a line stream into chunk files of at most `chunk_size` lines each.
/// Lines are copied verbatim, no record parsing happens at this stage.
pub struct ChunkSplitter {
    chunk_size: usize,
    rw_buf_size: Option<usize>,
}

impl ChunkSplitter {
    /// Creates a splitter.
    ///
    /// # Arguments
    /// * `chunk_size` - Maximum number of lines per chunk, must be positive
    /// * `rw_buf_size` - Input and chunk files read/write buffer size
    pub fn new(chunk_size: usize, rw_buf_size: Option<usize>) -> Result<Self, SortError> {
        if chunk_size == 0 {
            return Err(SortError::Validation("chunk size must be positive".to_string()));
        }

        return Ok(ChunkSplitter { chunk_size, rw_buf_size });
    }

    /// Splits the file at `input` into chunk files created in `dir`.
    /// Returns the number of chunks created.
    pub fn split_file(&self, input: &Path, dir: &Path) -> Result<usize, SortError> {
        let file = fs::File::open(input)?;
        let reader = match self.rw_buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
            None => io::BufReader::new(file),
        };

        self.split(reader, dir)
    }

    /// Splits `input` into chunk files `chunk_0.txt`, `chunk_1.txt`, ... created in `dir`.
    /// Blank lines at the end of the stream are dropped. Returns the number of chunks created.
    pub fn split<R: BufRead>(&self, input: R, dir: &Path) -> Result<usize, SortError> {
        let mut lines = TrailingBlankLines::new(input.lines()).peekable();
        let mut chunks = 0;

        while lines.peek().is_some() {
            let path = dir.join(chunk_file_name(chunks));
            let mut writer = create_chunk(&path, self.rw_buf_size)?;
            let written = write_lines(&mut writer, &mut lines, self.chunk_size)?;
            writer.flush()?;

            log::debug!("chunk {} created ({} lines)", path.display(), written);
            chunks += 1;
        }

        return Ok(chunks);
    }
}

fn write_lines<W, I>(writer: &mut W, lines: &mut Peekable<I>, limit: usize) -> io::Result<usize>
where
    W: Write,
    I: Iterator<Item = io::Result<String>>,
{
    let mut written = 0;
    while written < limit {
        match lines.next() {
            Some(line) => writeln!(writer, "{}", line?)?,
            None => break,
        }
        written += 1;
    }

    return Ok(written);
}

/// Line iterator adapter holding back blank lines until a non-blank line follows them,
/// so that blank lines at the end of the stream are never yielded.
///
/// Held lines are run-length encoded: a run of identical blank lines takes one slot.
struct TrailingBlankLines<I> {
    inner: I,
    held: VecDeque<(String, usize)>,
    next_line: Option<io::Result<String>>,
}

impl<I> TrailingBlankLines<I> {
    fn new(inner: I) -> Self {
        TrailingBlankLines {
            inner,
            held: VecDeque::new(),
            next_line: None,
        }
    }

    fn hold(&mut self, line: String) {
        match self.held.back_mut() {
            Some((last, count)) if *last == line => *count += 1,
            _ => self.held.push_back((line, 1)),
        }
    }

    fn release(&mut self) -> Option<String> {
        let (line, count) = self.held.front_mut()?;
        if *count > 1 {
            *count -= 1;
            return Some(line.clone());
        }

        self.held.pop_front().map(|(line, _)| line)
    }

    fn held_count(&self) -> usize {
        self.held.iter().map(|(_, count)| count).sum()
    }
}

impl<I: Iterator<Item = io::Result<String>>> Iterator for TrailingBlankLines<I> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(blank) = self.release() {
            return Some(Ok(blank));
        }
        if let Some(line) = self.next_line.take() {
            return Some(line);
        }

        loop {
            let line = match self.inner.next() {
                Some(line) => line,
                None => {
                    if !self.held.is_empty() {
                        log::debug!("dropping {} blank line(s) at the end of input", self.held_count());
                        self.held.clear();
                    }
                    return None;
                }
            };

            match line {
                Ok(line) if line.trim().is_empty() => self.hold(line),
                line => {
                    return match self.release() {
                        Some(blank) => {
                            self.next_line = Some(line);
                            Some(Ok(blank))
                        }
                        None => Some(line),
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::io;

    use rstest::*;

    use super::{ChunkSplitter, TrailingBlankLines};
    use crate::chunk::{chunk_file_name, list_chunks};
    use crate::error::SortError;

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn read_chunks(dir: &tempfile::TempDir) -> Vec<Vec<String>> {
        Vec::from_iter(list_chunks(dir.path()).unwrap().iter().map(|path| {
            Vec::from_iter(fs::read_to_string(path).unwrap().lines().map(String::from))
        }))
    }

    #[rstest]
    fn test_split_scenario(tmp_dir: tempfile::TempDir) {
        let splitter = ChunkSplitter::new(2, None).unwrap();
        let chunks = splitter
            .split(io::Cursor::new("5.apple\n2.apple\n5.banana\n"), tmp_dir.path())
            .unwrap();

        assert_eq!(chunks, 2);
        assert_eq!(
            read_chunks(&tmp_dir),
            vec![vec!["5.apple", "2.apple"], vec!["5.banana"]]
        );
        assert!(tmp_dir.path().join(chunk_file_name(0)).exists());
        assert!(tmp_dir.path().join(chunk_file_name(1)).exists());
    }

    #[rstest]
    #[case(1, 10)]
    #[case(3, 4)]
    #[case(10, 1)]
    #[case(100, 1)]
    fn test_split_is_lossless(tmp_dir: tempfile::TempDir, #[case] chunk_size: usize, #[case] expected_chunks: usize) {
        let input = Vec::from_iter((0..10).map(|i| format!("{}.line", i)));

        let splitter = ChunkSplitter::new(chunk_size, Some(64)).unwrap();
        let chunks = splitter.split(io::Cursor::new(input.join("\n")), tmp_dir.path()).unwrap();

        let chunk_lines = read_chunks(&tmp_dir);
        assert_eq!(chunks, expected_chunks);
        assert!(chunk_lines.iter().all(|lines| lines.len() <= chunk_size));
        assert_eq!(Vec::from_iter(chunk_lines.into_iter().flatten()), input);
    }

    #[rstest]
    fn test_split_empty_input(tmp_dir: tempfile::TempDir) {
        let splitter = ChunkSplitter::new(5, None).unwrap();

        assert_eq!(splitter.split(io::Cursor::new(""), tmp_dir.path()).unwrap(), 0);
        assert_eq!(splitter.split(io::Cursor::new("\n\n"), tmp_dir.path()).unwrap(), 0);
        assert!(list_chunks(tmp_dir.path()).unwrap().is_empty());
    }

    #[rstest]
    fn test_split_drops_trailing_blank_lines(tmp_dir: tempfile::TempDir) {
        let splitter = ChunkSplitter::new(2, None).unwrap();
        let chunks = splitter.split(io::Cursor::new("1.a\n2.b\n\n\n"), tmp_dir.path()).unwrap();

        assert_eq!(chunks, 1);
        assert_eq!(read_chunks(&tmp_dir), vec![vec!["1.a", "2.b"]]);
    }

    #[rstest]
    fn test_split_missing_input(tmp_dir: tempfile::TempDir) {
        let splitter = ChunkSplitter::new(2, None).unwrap();
        let result = splitter.split_file(&tmp_dir.path().join("missing.txt"), tmp_dir.path());

        assert!(matches!(result, Err(SortError::IO(err)) if err.kind() == io::ErrorKind::NotFound));
    }

    #[test]
    fn test_zero_chunk_size() {
        assert!(matches!(ChunkSplitter::new(0, None), Err(SortError::Validation(_))));
    }

    #[rstest]
    #[case(vec!["a", "", "b"], vec!["a", "", "b"])]
    #[case(vec!["a", "", " ", "b", ""], vec!["a", "", " ", "b"])]
    #[case(vec!["a", "", "", " ", " ", "", "b", "", " "], vec!["a", "", "", " ", " ", "", "b"])]
    #[case(vec!["", "a"], vec!["", "a"])]
    #[case(vec!["a", "", ""], vec!["a"])]
    #[case(vec![""], vec![])]
    fn test_trailing_blank_lines(#[case] input: Vec<&str>, #[case] expected: Vec<&str>) {
        let lines = input.into_iter().map(|line| Ok::<_, io::Error>(line.to_string()));
        let actual: Vec<String> = TrailingBlankLines::new(lines).map(Result::unwrap).collect();

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_blank_line_run_is_held_compactly() {
        let input = std::iter::once("1.a".to_string())
            .chain(std::iter::repeat(String::new()).take(100_000))
            .chain(std::iter::once("2.b".to_string()))
            .map(Ok::<_, io::Error>);
        let mut lines = TrailingBlankLines::new(input);

        assert_eq!(lines.next().unwrap().unwrap(), "1.a");
        assert_eq!(lines.next().unwrap().unwrap(), "");
        assert_eq!(lines.held.len(), 1);
        assert_eq!(lines.held_count(), 99_999);

        let rest: Vec<String> = lines.map(Result::unwrap).collect();
        assert_eq!(rest.len(), 100_000);
        assert!(rest[..99_999].iter().all(String::is_empty));
        assert_eq!(rest[99_999], "2.b");
    }
}
