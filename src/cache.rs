//! Windowed line cache
//!
//! Holds one contiguous range of lines from a large file. A request that
//! falls outside the cached range rebuilds it: the reader is seeked back to
//! the start of the file (or to the nearest sparse-index checkpoint) and
//! scanned forward, skipping lines before the padded target and storing the
//! ones inside it. Stored lines are cut to a byte cap so one huge line cannot
//! pull the whole file into memory.

use crate::extent::LineIndex;
use crate::types::{Checkpoint, LineNo, LineWindow};
use crate::viewport::MAX_LINE_DISPLAY_WIDTH;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use tracing::debug;

/// Default number of lines kept around the viewport
pub const DEFAULT_CACHE_LINES: usize = 1000;

/// Counters for observing cache behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered without I/O
    pub hits: u64,
    /// Rebuilds from the backing reader
    pub reloads: u64,
    /// Lines read (skipped or stored) across all rebuilds
    pub lines_scanned: u64,
}

/// A cached, contiguous slice of a file's lines
#[derive(Debug)]
pub struct LineCache {
    /// Range actually held; None until the first rebuild
    window: Option<LineWindow>,
    lines: Vec<String>,
    cache_lines: usize,
    /// Bytes kept per line; the rest of a longer line is read and dropped
    max_line_bytes: usize,
    stats: CacheStats,
}

impl LineCache {
    pub fn new(cache_lines: usize) -> Self {
        Self {
            window: None,
            lines: Vec::new(),
            cache_lines,
            max_line_bytes: MAX_LINE_DISPLAY_WIDTH,
            stats: CacheStats::default(),
        }
    }

    /// Keep at most `max_line_bytes` bytes of each stored line
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    /// Lines of padding added on each side of a request
    pub fn pad(&self) -> usize {
        self.cache_lines / 2
    }

    pub fn window(&self) -> Option<LineWindow> {
        self.window
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Forget everything held; the next request rebuilds
    pub fn invalidate(&mut self) {
        self.window = None;
        self.lines.clear();
    }

    /// Text of a single cached line
    pub fn line(&self, line: LineNo) -> Option<&str> {
        let window = self.window?;
        if !window.contains(line) {
            return None;
        }
        self.lines.get(line - window.start).map(String::as_str)
    }

    /// Cached lines in `[lo, hi)`, clipped to what the cache holds
    pub fn slice(&self, lo: LineNo, hi: LineNo) -> &[String] {
        let Some(window) = self.window else {
            return &[];
        };
        let lo = lo.max(window.start);
        let hi = hi.min(window.end);
        if lo >= hi {
            return &[];
        }
        &self.lines[lo - window.start..hi - window.start]
    }

    /// Make sure lines `[lo, min(hi, total_lines))` are cached.
    ///
    /// A miss rebuilds the padded range `[lo - pad, hi + pad)` clamped to
    /// `[0, total_lines)`. With `index`, the rebuild starts from the closest
    /// checkpoint instead of byte 0. On error the previous cache is kept.
    pub fn ensure_lines<R: Read + Seek>(
        &mut self,
        reader: &mut R,
        total_lines: usize,
        lo: LineNo,
        hi: LineNo,
        index: Option<&LineIndex>,
    ) -> io::Result<()> {
        let hi = hi.min(total_lines);
        let lo = lo.min(hi);
        let requested = LineWindow::new(lo, hi);

        if requested.is_empty() {
            return Ok(());
        }

        if let Some(window) = self.window {
            if !self.lines.is_empty() && window.covers(&requested) {
                self.stats.hits += 1;
                return Ok(());
            }
        }

        let pad = self.pad();
        let target = LineWindow::new(
            lo.saturating_sub(pad),
            hi.saturating_add(pad).min(total_lines),
        );
        let from = index
            .map(|index| index.checkpoint_at_or_before(target.start))
            .unwrap_or_else(Checkpoint::origin);

        self.reload(reader, target, from)
    }

    fn reload<R: Read + Seek>(
        &mut self,
        reader: &mut R,
        target: LineWindow,
        from: Checkpoint,
    ) -> io::Result<()> {
        reader.seek(SeekFrom::Start(from.offset))?;
        let mut buffered = BufReader::new(reader);

        let mut lines = Vec::with_capacity(target.len());
        let mut buf = Vec::new();
        let mut line_no = from.line;
        let mut scanned = 0u64;

        while line_no < target.end {
            buf.clear();
            // Lines before the target are only counted
            let keep = if line_no >= target.start {
                self.max_line_bytes
            } else {
                0
            };
            let consumed = read_line_capped(&mut buffered, &mut buf, keep)?;
            if consumed == 0 {
                break;
            }
            scanned += 1;
            if line_no >= target.start {
                lines.push(decode_line(&buf, buf.len() < consumed));
            }
            line_no += 1;
        }

        // EOF before the target start leaves an empty window at the tail
        let start = target.start.min(line_no);
        let window = LineWindow::new(start, line_no);

        debug!(
            requested_start = target.start,
            requested_end = target.end,
            start = window.start,
            end = window.end,
            from_line = from.line,
            scanned,
            "line cache reloaded"
        );

        self.window = Some(window);
        self.lines = lines;
        self.stats.reloads += 1;
        self.stats.lines_scanned += scanned;
        Ok(())
    }
}

/// Read up to and including the next '\n', appending at most `cap` bytes to
/// `buf`. Returns the bytes consumed from `reader`, 0 at EOF.
fn read_line_capped<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>, cap: usize) -> io::Result<usize> {
    let mut consumed = 0;
    loop {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            return Ok(consumed);
        }

        let (used, done) = match memchr::memchr(b'\n', available) {
            Some(pos) => (pos + 1, true),
            None => (available.len(), false),
        };
        let room = cap.saturating_sub(buf.len());
        buf.extend_from_slice(&available[..used.min(room)]);
        reader.consume(used);
        consumed += used;

        if done {
            return Ok(consumed);
        }
    }
}

/// Strip the line terminator ("\n" or "\r\n") and decode lossily.
///
/// A `truncated` line lost its tail to the byte cap, so it has no terminator
/// and may end in the middle of a character.
fn decode_line(raw: &[u8], truncated: bool) -> String {
    let mut bytes = if truncated { trim_partial_char(raw) } else { raw };
    bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Drop a UTF-8 sequence cut short at the end of `bytes`
fn trim_partial_char(bytes: &[u8]) -> &[u8] {
    let tail = bytes.len().saturating_sub(4);
    for start in (tail..bytes.len()).rev() {
        let lead = bytes[start];
        if lead & 0xC0 == 0x80 {
            continue;
        }
        let width = match lead {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        if bytes.len() - start < width {
            return &bytes[..start];
        }
        return bytes;
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extent::count_lines;
    use std::io::Cursor;

    fn numbered(n: usize) -> Cursor<Vec<u8>> {
        let text: String = (0..n).map(|i| format!("line {}\n", i)).collect();
        Cursor::new(text.into_bytes())
    }

    #[test]
    fn test_first_request_loads_padded_window() {
        let mut reader = numbered(2000);
        let mut cache = LineCache::new(1000);

        cache.ensure_lines(&mut reader, 2000, 0, 30, None).unwrap();
        assert_eq!(cache.window(), Some(LineWindow::new(0, 530)));
        assert_eq!(cache.line(0), Some("line 0"));
        assert_eq!(cache.line(529), Some("line 529"));
        assert_eq!(cache.line(530), None);
        assert_eq!(cache.stats().reloads, 1);
        assert_eq!(cache.stats().lines_scanned, 530);
    }

    #[test]
    fn test_request_inside_window_is_a_hit() {
        let mut reader = numbered(2000);
        let mut cache = LineCache::new(1000);

        cache.ensure_lines(&mut reader, 2000, 700, 730, None).unwrap();
        assert_eq!(cache.window(), Some(LineWindow::new(200, 1230)));

        for lo in [200, 450, 699, 701, 1200] {
            cache.ensure_lines(&mut reader, 2000, lo, lo + 30, None).unwrap();
        }
        assert_eq!(cache.stats().reloads, 1);
        assert_eq!(cache.stats().hits, 5);

        // One line past the window forces a rebuild
        cache.ensure_lines(&mut reader, 2000, 1201, 1231, None).unwrap();
        assert_eq!(cache.stats().reloads, 2);
        assert_eq!(cache.window(), Some(LineWindow::new(701, 1731)));
    }

    #[test]
    fn test_rescan_reads_from_start() {
        let mut reader = numbered(3000);
        let mut cache = LineCache::new(100);

        cache.ensure_lines(&mut reader, 3000, 2500, 2510, None).unwrap();
        assert_eq!(cache.window(), Some(LineWindow::new(2450, 2560)));
        assert_eq!(cache.stats().lines_scanned, 2560);
        assert_eq!(cache.slice(2500, 2502), ["line 2500", "line 2501"]);
    }

    #[test]
    fn test_sparse_index_skips_prefix() {
        let mut reader = numbered(3000);
        let index = count_lines(&mut reader, Some(256)).unwrap().index.unwrap();
        let mut cache = LineCache::new(100);

        cache.ensure_lines(&mut reader, 3000, 2500, 2510, Some(&index)).unwrap();
        assert_eq!(cache.window(), Some(LineWindow::new(2450, 2560)));
        // Starts at checkpoint 2304 instead of line 0
        assert_eq!(cache.stats().lines_scanned, 2560 - 2304);
        assert_eq!(cache.line(2450), Some("line 2450"));
        assert_eq!(cache.line(2559), Some("line 2559"));
    }

    #[test]
    fn test_window_near_eof_is_short() {
        let mut reader = numbered(10);
        let mut cache = LineCache::new(4);

        cache.ensure_lines(&mut reader, 10, 8, 14, None).unwrap();
        assert_eq!(cache.window(), Some(LineWindow::new(6, 10)));
        assert_eq!(cache.slice(8, 14), ["line 8", "line 9"]);
    }

    #[test]
    fn test_empty_request_does_no_io() {
        let mut reader = Cursor::new(Vec::new());
        let mut cache = LineCache::new(1000);

        cache.ensure_lines(&mut reader, 0, 0, 30, None).unwrap();
        cache.ensure_lines(&mut reader, 0, 5, 2, None).unwrap();
        assert_eq!(cache.stats(), CacheStats::default());
        assert!(cache.window().is_none());
        assert!(cache.slice(0, 30).is_empty());
    }

    #[test]
    fn test_crlf_and_invalid_utf8() {
        let mut reader = Cursor::new(b"one\r\ntw\xffo\r\nthree".to_vec());
        let mut cache = LineCache::new(10);

        cache.ensure_lines(&mut reader, 3, 0, 3, None).unwrap();
        assert_eq!(cache.line(0), Some("one"));
        assert_eq!(cache.line(1), Some("tw\u{FFFD}o"));
        assert_eq!(cache.line(2), Some("three"));
    }

    #[test]
    fn test_file_shorter_than_extent() {
        // Extent claims more lines than the reader now has
        let mut reader = numbered(5);
        let mut cache = LineCache::new(2);

        cache.ensure_lines(&mut reader, 20, 10, 12, None).unwrap();
        assert_eq!(cache.window(), Some(LineWindow::new(5, 5)));
        assert!(cache.slice(10, 12).is_empty());
    }

    #[test]
    fn test_invalidate() {
        let mut reader = numbered(50);
        let mut cache = LineCache::new(10);

        cache.ensure_lines(&mut reader, 50, 0, 5, None).unwrap();
        assert!(!cache.is_empty());
        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.window().is_none());

        cache.ensure_lines(&mut reader, 50, 0, 5, None).unwrap();
        assert_eq!(cache.stats().reloads, 2);
    }

    #[test]
    fn test_long_lines_are_capped() {
        let long = "x".repeat(100_000);
        let text = format!("short\n{}\nafter\n{}", long, long);
        let mut reader = Cursor::new(text.into_bytes());
        let mut cache = LineCache::new(10).with_max_line_bytes(16);

        cache.ensure_lines(&mut reader, 4, 0, 4, None).unwrap();
        assert_eq!(cache.window(), Some(LineWindow::new(0, 4)));
        assert_eq!(cache.line(0), Some("short"));
        assert_eq!(cache.line(1), Some("x".repeat(16).as_str()));
        // Line numbering survives the dropped tail
        assert_eq!(cache.line(2), Some("after"));
        assert_eq!(cache.line(3), Some("x".repeat(16).as_str()));
        assert_eq!(cache.stats().lines_scanned, 4);
    }

    #[test]
    fn test_cap_cuts_on_char_boundary() {
        // 'é' is two bytes: a 5-byte cap would split the third one
        let mut reader = Cursor::new("ééééé\nz".as_bytes().to_vec());
        let mut cache = LineCache::new(4).with_max_line_bytes(5);

        cache.ensure_lines(&mut reader, 2, 0, 2, None).unwrap();
        assert_eq!(cache.line(0), Some("éé"));
        assert_eq!(cache.line(1), Some("z"));
    }

    #[test]
    fn test_skipped_long_lines_are_not_stored() {
        let long = "y".repeat(50_000);
        let text: String = (0..20).map(|i| format!("{}{}\n", i, long)).collect();
        let mut reader = Cursor::new(text.into_bytes());
        let mut cache = LineCache::new(2).with_max_line_bytes(8);

        cache.ensure_lines(&mut reader, 20, 15, 16, None).unwrap();
        assert_eq!(cache.window(), Some(LineWindow::new(14, 17)));
        assert_eq!(cache.line(15), Some("15yyyyyy"));
        assert_eq!(cache.slice(14, 17).iter().map(String::len).sum::<usize>(), 24);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
        }
    }

    impl Seek for FailingReader {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_failed_reload_keeps_previous_cache() {
        let mut reader = numbered(100);
        let mut cache = LineCache::new(10);
        cache.ensure_lines(&mut reader, 100, 0, 5, None).unwrap();
        let before = cache.window();

        let err = cache
            .ensure_lines(&mut FailingReader, 100, 50, 55, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "disk gone");
        assert_eq!(cache.window(), before);
        assert_eq!(cache.line(0), Some("line 0"));
        assert_eq!(cache.stats().reloads, 1);
    }
}
