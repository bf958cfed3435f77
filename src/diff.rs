use serde::{Deserialize, Serialize};

/// The span of lines that differ between two buffers.
///
/// `start_line` and `end_line` are 1-indexed and inclusive, in the
/// coordinates of the "before" buffer. `after_end_line` closes the same span
/// in the "after" buffer, which may be longer or shorter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffRange {
    pub start_line: usize,
    pub end_line: usize,
    pub after_end_line: usize,
    pub before_snippet: String,
    pub after_snippet: String,
}

/// Bounding-box diff from a common prefix and a common suffix.
///
/// Only meant for buffers that differ by a single localized edit; it does
/// not compute an edit script.
pub fn diff(before: &str, after: &str) -> Option<DiffRange> {
    if before == after {
        return None;
    }

    let (old, new) = (before.as_bytes(), after.as_bytes());
    let limit = old.len().min(new.len());
    let mut prefix = 0;
    while prefix < limit && old[prefix] == new[prefix] {
        prefix += 1;
    }

    let (mut old_end, mut new_end) = (old.len(), new.len());
    while old_end > prefix && new_end > prefix && old[old_end - 1] == new[new_end - 1] {
        old_end -= 1;
        new_end -= 1;
    }

    let start_line = line_at(old, prefix);
    let end_line = line_at(old, old_end);
    let after_end_line = line_at(new, new_end);

    Some(DiffRange {
        start_line,
        end_line,
        after_end_line,
        before_snippet: slice_lines(before, start_line, end_line),
        after_snippet: slice_lines(after, start_line, after_end_line),
    })
}

/// Lines `start..=end` (1-indexed) of `text`, joined with `\n`.
pub fn slice_lines(text: &str, start: usize, end: usize) -> String {
    text.split('\n')
        .skip(start.saturating_sub(1))
        .take((end + 1).saturating_sub(start))
        .collect::<Vec<_>>()
        .join("\n")
}

fn line_at(text: &[u8], offset: usize) -> usize {
    1 + text[..offset].iter().filter(|&&b| b == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_buffers() {
        assert_eq!(diff("same\n", "same\n"), None);
        assert_eq!(diff("", ""), None);
    }

    #[test]
    fn test_single_changed_line() {
        let range = diff("L1\nL2\nL3", "L1\nCHANGED\nL3").unwrap();
        assert_eq!(range.start_line, 2);
        assert_eq!(range.end_line, 2);
        assert_eq!(range.after_end_line, 2);
        assert_eq!(range.before_snippet, "L2");
        assert_eq!(range.after_snippet, "CHANGED");
    }

    #[test]
    fn test_change_within_a_line() {
        let range = diff("if (a < b) {}", "if (a <= b) {}").unwrap();
        assert_eq!((range.start_line, range.end_line), (1, 1));
        assert_eq!(range.before_snippet, "if (a < b) {}");
        assert_eq!(range.after_snippet, "if (a <= b) {}");
    }

    #[test]
    fn test_inserted_line() {
        let before = "function f() {\n  return x;\n}\n";
        let after = "function f() {\n  let x = null;\n  return x;\n}\n";
        let range = diff(before, after).unwrap();
        assert_eq!(range.start_line, 2);
        assert_eq!(range.end_line, 2);
        assert_eq!(range.after_end_line, 3);
        assert_eq!(range.before_snippet, "  return x;");
        assert_eq!(range.after_snippet, "  let x = null;\n  return x;");
    }

    #[test]
    fn test_snippets_match_line_slices() {
        let before = "a\nb\nc\nd";
        let after = "a\nB\nC\nd";
        let range = diff(before, after).unwrap();
        assert_eq!((range.start_line, range.end_line), (2, 3));
        assert_eq!(
            slice_lines(before, range.start_line, range.end_line),
            range.before_snippet
        );
        assert_eq!(
            slice_lines(after, range.start_line, range.after_end_line),
            range.after_snippet
        );
        assert_eq!(range.after_snippet, "B\nC");
    }

    #[test]
    fn test_multibyte_characters() {
        let range = diff("let cat = 5;\n", "let \u{0441}at = 5;\n").unwrap();
        assert_eq!((range.start_line, range.end_line), (1, 1));
        assert_eq!(range.after_snippet, "let \u{0441}at = 5;");
    }
}
