//! Conflict-block parser.
//!
//! A single forward pass over a file's lines with an explicit three-state
//! machine. Content between `<<<<<<<` and `=======` (ours) is kept, content
//! between `=======` and `>>>>>>>` (theirs) is dropped, and the marker lines
//! themselves are removed. Lines retain their own endings so untouched
//! content round-trips byte for byte.

use tracing::debug;

use crate::errors::ParseError;

/// Start-of-conflict marker token. Only counts at the start of a line.
pub const CONFLICT_START: &str = "<<<<<<<";
/// Separator between the ours and theirs sections.
pub const CONFLICT_MID: &str = "=======";
/// End-of-conflict marker token.
pub const CONFLICT_END: &str = ">>>>>>>";

/// Output of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The rewritten content with all conflict blocks collapsed to ours.
    pub text: String,
    /// Number of conflict blocks that were resolved.
    pub blocks: usize,
}

/// Scanner state while walking the line sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Outside any conflict block; lines pass through unchanged.
    Normal,
    /// Between `<<<<<<<` and `=======`; lines are buffered as ours.
    InOurs,
    /// Between `=======` and `>>>>>>>`; lines are discarded.
    InTheirs,
}

/// Resolve every conflict block in `text`, keeping the ours side.
///
/// Returns the rewritten text and the number of blocks resolved. Any
/// structural problem (missing separator or end marker, nested start
/// marker) fails the whole parse -- callers must not write partial output.
///
/// Running the parser on its own output is a no-op with a block count of
/// zero, since no marker tokens survive a successful pass.
pub fn resolve_keep_ours(text: &str) -> Result<Resolved, ParseError> {
    let mut out = String::with_capacity(text.len());
    let mut ours = String::new();
    let mut state = State::Normal;
    let mut blocks = 0usize;

    for line in text.split_inclusive('\n') {
        match state {
            State::Normal => {
                if line.starts_with(CONFLICT_START) {
                    state = State::InOurs;
                    ours.clear();
                } else {
                    out.push_str(line);
                }
            }
            State::InOurs => {
                if line.starts_with(CONFLICT_START) {
                    return Err(ParseError::NestedStartInOurs);
                } else if line.starts_with(CONFLICT_MID) {
                    state = State::InTheirs;
                } else {
                    ours.push_str(line);
                }
            }
            State::InTheirs => {
                if line.starts_with(CONFLICT_START) {
                    return Err(ParseError::NestedStartInTheirs);
                } else if line.starts_with(CONFLICT_END) {
                    out.push_str(&ours);
                    blocks += 1;
                    state = State::Normal;
                }
                // Theirs lines are dropped.
            }
        }
    }

    match state {
        State::Normal => {
            debug!(blocks, "conflict parse complete");
            Ok(Resolved { text: out, blocks })
        }
        State::InOurs => Err(ParseError::MissingSeparator),
        State::InTheirs => Err(ParseError::MissingEndMarker),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_markers_passthrough() {
        let input = "line one\nline two\n";
        let resolved = resolve_keep_ours(input).unwrap();
        assert_eq!(resolved.text, input);
        assert_eq!(resolved.blocks, 0);
    }

    #[test]
    fn test_single_block_keeps_ours() {
        let input = "keep this\n<<<<<<< HEAD\nmine\n=======\ntheirs\n>>>>>>> branch\nafter\n";
        let resolved = resolve_keep_ours(input).unwrap();
        assert_eq!(resolved.text, "keep this\nmine\nafter\n");
        assert_eq!(resolved.blocks, 1);
    }

    #[test]
    fn test_multiple_blocks() {
        let input = "\
a\n\
<<<<<<< HEAD\nours1\n=======\ntheirs1\n>>>>>>> x\n\
b\n\
<<<<<<< HEAD\nours2a\nours2b\n=======\ntheirs2\n>>>>>>> y\n\
c\n";
        let resolved = resolve_keep_ours(input).unwrap();
        assert_eq!(resolved.text, "a\nours1\nb\nours2a\nours2b\nc\n");
        assert_eq!(resolved.blocks, 2);
    }

    #[test]
    fn test_output_contains_no_marker_tokens() {
        let input = "<<<<<<< HEAD\nours\n=======\ntheirs\n>>>>>>> other\n";
        let resolved = resolve_keep_ours(input).unwrap();
        for token in [CONFLICT_START, CONFLICT_MID, CONFLICT_END] {
            assert!(!resolved.text.contains(token));
        }
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let input = "x\n<<<<<<< HEAD\nours\n=======\ntheirs\n>>>>>>> y\nz\n";
        let first = resolve_keep_ours(input).unwrap();
        let second = resolve_keep_ours(&first.text).unwrap();
        assert_eq!(second.text, first.text);
        assert_eq!(second.blocks, 0);
    }

    #[test]
    fn test_empty_ours_section() {
        let input = "<<<<<<< HEAD\n=======\ntheirs\n>>>>>>> x\nrest\n";
        let resolved = resolve_keep_ours(input).unwrap();
        assert_eq!(resolved.text, "rest\n");
        assert_eq!(resolved.blocks, 1);
    }

    #[test]
    fn test_no_trailing_newline_preserved() {
        let input = "before\n<<<<<<< HEAD\nmine\n=======\nyours\n>>>>>>> b\nafter";
        let resolved = resolve_keep_ours(input).unwrap();
        assert_eq!(resolved.text, "before\nmine\nafter");
    }

    #[test]
    fn test_crlf_lines_preserved() {
        let input = "keep\r\n<<<<<<< HEAD\r\nmine\r\n=======\r\ntheirs\r\n>>>>>>> b\r\n";
        let resolved = resolve_keep_ours(input).unwrap();
        assert_eq!(resolved.text, "keep\r\nmine\r\n");
        assert_eq!(resolved.blocks, 1);
    }

    #[test]
    fn test_missing_separator() {
        let input = "<<<<<<< HEAD\nours\n";
        assert_eq!(
            resolve_keep_ours(input).unwrap_err(),
            ParseError::MissingSeparator
        );
    }

    #[test]
    fn test_missing_end_marker() {
        let input = "<<<<<<< HEAD\nours\n=======\ntheirs\n";
        assert_eq!(
            resolve_keep_ours(input).unwrap_err(),
            ParseError::MissingEndMarker
        );
    }

    #[test]
    fn test_nested_start_in_ours() {
        let input = "<<<<<<< HEAD\n<<<<<<< again\n=======\ntheirs\n>>>>>>> x\n";
        assert_eq!(
            resolve_keep_ours(input).unwrap_err(),
            ParseError::NestedStartInOurs
        );
    }

    #[test]
    fn test_nested_start_in_theirs() {
        let input = "<<<<<<< HEAD\nours\n=======\n<<<<<<< again\n>>>>>>> x\n";
        assert_eq!(
            resolve_keep_ours(input).unwrap_err(),
            ParseError::NestedStartInTheirs
        );
    }

    #[test]
    fn test_marker_mid_line_is_not_a_marker() {
        // Tokens only count at the start of a line.
        let input = "text with <<<<<<< inside\nand ======= too\nand >>>>>>> as well\n";
        let resolved = resolve_keep_ours(input).unwrap();
        assert_eq!(resolved.text, input);
        assert_eq!(resolved.blocks, 0);
    }

    #[test]
    fn test_separator_line_with_trailing_text() {
        // Git never writes suffixed separators, but prefix matching mirrors
        // the start/end markers which do carry labels.
        let input = "<<<<<<< HEAD\nmine\n======= label\ntheirs\n>>>>>>> b\n";
        let resolved = resolve_keep_ours(input).unwrap();
        assert_eq!(resolved.text, "mine\n");
    }
}
