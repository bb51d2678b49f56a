use bigview::classify::classify;
use bigview::session::{FileViewSession, SessionOptions};
use bigview::viewport::ViewportController;
use proptest::prelude::*;
use proptest::string::string_regex;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_lines(lines: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

fn open(file: &NamedTempFile, cache_lines: usize, stride: Option<usize>, height: usize) -> FileViewSession {
    let options = SessionOptions {
        large_file_threshold: 0,
        cache_lines,
        default_viewport: height,
        border_rows: 2,
        index_stride: stride,
        max_line_bytes: 4096,
    };
    let class = classify(file.path(), 0).unwrap();
    FileViewSession::open(file.path(), class, &options).unwrap()
}

fn lines_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(string_regex("[a-z ]{0,8}").unwrap(), 0..200)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_pages_reconstruct_file(
        lines in lines_strategy(),
        height in 3usize..40,
        cache_lines in 0usize..120,
    ) {
        let file = write_lines(&lines);
        let mut session = open(&file, cache_lines, None, height);
        let vc = ViewportController::default();

        let mut page = vc.go_to_top(&mut session).unwrap();
        let mut seen: Vec<String> = if page.content.is_empty() && lines.is_empty() {
            Vec::new()
        } else {
            page.content.split('\n').map(str::to_string).collect()
        };

        loop {
            let next = vc.page_down(&mut session).unwrap();
            if next.current_line == page.current_line {
                break;
            }
            let repeated = page.current_line + height - next.current_line;
            prop_assert!(repeated >= vc.page_overlap());
            seen.extend(next.content.split('\n').skip(repeated).map(str::to_string));
            page = next;
        }

        prop_assert_eq!(seen, lines);
    }

    #[test]
    fn prop_moves_stay_in_bounds(
        lines in lines_strategy(),
        height in 0usize..30,
        cache_lines in 0usize..80,
        sparse in any::<bool>(),
        moves in prop::collection::vec(0u8..6, 0..40),
    ) {
        let file = write_lines(&lines);
        let stride = if sparse { Some(7) } else { None };
        let mut session = open(&file, cache_lines, stride, height);
        let vc = ViewportController::default();
        let total = lines.len();

        for m in moves {
            let text = match m {
                0 => vc.scroll_up(&mut session),
                1 => vc.scroll_down(&mut session),
                2 => vc.page_up(&mut session),
                3 => vc.page_down(&mut session),
                4 => vc.go_to_top(&mut session),
                _ => vc.go_to_bottom(&mut session),
            }
            .unwrap();

            prop_assert_eq!(text.total_lines, total);
            prop_assert!(text.current_line <= total.saturating_sub(height));

            let end = (text.current_line + height).min(total);
            let expected = if height == 0 || text.current_line >= end {
                String::new()
            } else {
                lines[text.current_line..end].join("\n")
            };
            prop_assert_eq!(text.content, expected);

            if let Some(window) = session.cache().window() {
                prop_assert!(window.end <= total);
                prop_assert!(window.len() <= cache_lines + height.max(1));
            }
        }
    }
}
