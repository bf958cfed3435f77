use crate::error::Result;
use crate::syntax::SyntaxTree;
use regex::Regex;

/// Line-break convention of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Regenerate source text for `tree`, normalized against `original`.
///
/// Edits are spliced straight into the tree's text, so comments, blank
/// lines and formatting outside the mutated spans survive unchanged.
pub fn print(tree: &SyntaxTree, original: &str) -> Result<String> {
    normalize(original, tree.source())
}

/// Match `printed` to the line endings and trailing newline of `original`.
pub fn normalize(original: &str, printed: &str) -> Result<String> {
    let ending = LineEnding::detect(original);
    let line_break = Regex::new(r"\r\n|\n")?;
    let mut text = line_break
        .replace_all(printed, ending.as_str())
        .into_owned();

    let wants_newline = original.ends_with('\n');
    let has_newline = text.ends_with('\n');
    if wants_newline && !has_newline {
        text.push_str(ending.as_str());
    } else if !wants_newline && has_newline {
        let trailing = if text.ends_with("\r\n") { 2 } else { 1 };
        text.truncate(text.len() - trailing);
    }

    Ok(text)
}
