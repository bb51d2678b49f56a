//! One-time line counting for large files
//!
//! A single forward scan establishes how many lines the file has. The same
//! pass can record a sparse index of line-start offsets so later cache
//! reloads seek close to their target instead of rescanning from byte 0.

use crate::error::ViewError;
use crate::types::{Checkpoint, FilePos, LineNo};
use memchr::memchr_iter;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Block size for the counting scan (64KB)
const SCAN_BLOCK_SIZE: usize = 64 * 1024;

/// Sparse index of line-start byte offsets, one checkpoint every `stride` lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    stride: usize,
    /// Checkpoint `k` is line `k * stride`; checkpoint 0 is always the origin
    checkpoints: Vec<Checkpoint>,
}

impl LineIndex {
    fn new(stride: usize) -> Self {
        Self {
            stride: stride.max(1),
            checkpoints: vec![Checkpoint::origin()],
        }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// The closest recorded line start at or before `line`
    pub fn checkpoint_at_or_before(&self, line: LineNo) -> Checkpoint {
        let slot = (line / self.stride).min(self.checkpoints.len().saturating_sub(1));
        self.checkpoints
            .get(slot)
            .copied()
            .unwrap_or_else(Checkpoint::origin)
    }

    fn record(&mut self, line: LineNo, offset: FilePos) {
        if line % self.stride == 0 {
            self.checkpoints.push(Checkpoint::new(line, offset));
        }
    }

    /// Drop checkpoints that point at or past the last line
    fn trim(&mut self, total_lines: usize) {
        self.checkpoints
            .retain(|cp| cp.line == 0 || cp.line < total_lines);
    }
}

/// Result of the counting scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineExtent {
    /// Number of newline-delimited lines
    pub total_lines: usize,
    /// Bytes scanned
    pub bytes: u64,
    /// Sparse index, when one was requested
    pub index: Option<LineIndex>,
}

/// Count lines the way a line scanner yields them.
///
/// Every '\n' ends a line; trailing bytes after the last '\n' form one more
/// line. An empty input has zero lines. With `stride` set, a checkpoint is
/// recorded for every line whose number is a multiple of it.
pub fn count_lines<R: Read>(reader: &mut R, stride: Option<usize>) -> io::Result<LineExtent> {
    let mut index = stride.map(LineIndex::new);
    let mut block = vec![0u8; SCAN_BLOCK_SIZE];
    let mut newlines: usize = 0;
    let mut bytes: u64 = 0;
    let mut last_byte = None;

    loop {
        let read = match reader.read(&mut block) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        let chunk = &block[..read];
        for pos in memchr_iter(b'\n', chunk) {
            newlines += 1;
            if let Some(index) = index.as_mut() {
                // The next line starts right after this newline
                index.record(newlines, bytes + pos as u64 + 1);
            }
        }

        last_byte = chunk.last().copied();
        bytes += read as u64;
    }

    let total_lines = match last_byte {
        None => 0,
        Some(b'\n') => newlines,
        Some(_) => newlines + 1,
    };

    if let Some(index) = index.as_mut() {
        index.trim(total_lines);
    }

    Ok(LineExtent {
        total_lines,
        bytes,
        index,
    })
}

/// Count the lines of the file at `path`
pub fn count_file_lines(path: &Path, stride: Option<usize>) -> Result<LineExtent, ViewError> {
    let to_count_error = |source| ViewError::CountLines {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(to_count_error)?;
    count_lines(&mut file, stride).map_err(to_count_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn count(text: &str) -> usize {
        count_lines(&mut Cursor::new(text.as_bytes()), None)
            .unwrap()
            .total_lines
    }

    #[test]
    fn test_count_lines_simple() {
        assert_eq!(count(""), 0);
        assert_eq!(count("a"), 1);
        assert_eq!(count("a\n"), 1);
        assert_eq!(count("a\nb"), 2);
        assert_eq!(count("a\nb\n"), 2);
        assert_eq!(count("\n"), 1);
        assert_eq!(count("\n\n\n"), 3);
        assert_eq!(count("a\r\nb\r\n"), 2);
    }

    #[test]
    fn test_count_lines_across_blocks() {
        // Newlines straddling the 64KB block boundary
        let line = "x".repeat(999);
        let text: String = (0..300).map(|_| format!("{}\n", line)).collect();
        assert!(text.len() > 4 * SCAN_BLOCK_SIZE);
        assert_eq!(count(&text), 300);

        let unterminated = format!("{}tail", text);
        assert_eq!(count(&unterminated), 301);
    }

    #[test]
    fn test_sparse_index_offsets() {
        let text = "l0\nl1\nl2\nl3\nl4\nl5\nl6";
        let extent = count_lines(&mut Cursor::new(text.as_bytes()), Some(3)).unwrap();
        assert_eq!(extent.total_lines, 7);
        assert_eq!(extent.bytes, text.len() as u64);

        let index = extent.index.unwrap();
        assert_eq!(index.stride(), 3);
        assert_eq!(index.len(), 3);
        assert_eq!(index.checkpoint_at_or_before(0), Checkpoint::new(0, 0));
        assert_eq!(index.checkpoint_at_or_before(2), Checkpoint::new(0, 0));
        assert_eq!(index.checkpoint_at_or_before(3), Checkpoint::new(3, 9));
        assert_eq!(index.checkpoint_at_or_before(5), Checkpoint::new(3, 9));
        assert_eq!(index.checkpoint_at_or_before(6), Checkpoint::new(6, 18));
        assert_eq!(&text[18..], "l6");
        // Past the end falls back to the last checkpoint
        assert_eq!(index.checkpoint_at_or_before(100), Checkpoint::new(6, 18));
    }

    #[test]
    fn test_sparse_index_trailing_newline() {
        // "a\nb\n" has 2 lines; a checkpoint for line 2 would point at EOF
        let extent = count_lines(&mut Cursor::new(b"a\nb\n".to_vec()), Some(2)).unwrap();
        assert_eq!(extent.total_lines, 2);
        let index = extent.index.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.checkpoint_at_or_before(5), Checkpoint::origin());
    }

    #[test]
    fn test_count_file_lines() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "one\ntwo\nthree").unwrap();
        file.flush().unwrap();

        let extent = count_file_lines(file.path(), None).unwrap();
        assert_eq!(extent.total_lines, 3);
        assert!(extent.index.is_none());
    }

    #[test]
    fn test_count_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = count_file_lines(&dir.path().join("gone"), None).unwrap_err();
        assert!(matches!(err, ViewError::CountLines { .. }));
    }
}
