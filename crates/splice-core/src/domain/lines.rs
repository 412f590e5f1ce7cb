//! Line-buffer primitives: anchor matching and idempotent splicing.
//!
//! These operate on a plain `Vec<String>` so they stay usable on files whose
//! structural view is stale or that no longer parse.

use regex::Regex;

use crate::error::{SpliceError, SpliceResult};

/// Where new lines go relative to the matched anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    Before,
    #[default]
    After,
}

/// How each anchor line is compared against buffer lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternMode {
    /// Trimmed substring match.
    #[default]
    Literal,
    /// Per-line regular expression.
    Regex,
}

/// Result of an anchored insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Lines were spliced in; `line` is the 1-based position of the first one.
    Inserted { line: usize },
    /// The lines already appear as a consecutive run; nothing changed.
    AlreadyPresent,
    /// The anchor did not match anywhere; nothing changed.
    AnchorNotFound,
}

impl InsertOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Inserted { .. })
    }
}

/// A compiled, possibly multi-line anchor.
#[derive(Debug)]
pub struct Anchor {
    lines: Vec<AnchorLine>,
}

#[derive(Debug)]
enum AnchorLine {
    Literal(String),
    Regex(Regex),
}

impl Anchor {
    /// Compile `pattern`; each of its lines must match one consecutive buffer line.
    pub fn compile(pattern: &str, mode: PatternMode) -> SpliceResult<Self> {
        let lines = pattern
            .lines()
            .map(|line| match mode {
                PatternMode::Literal => Ok(AnchorLine::Literal(line.trim().to_string())),
                PatternMode::Regex => Regex::new(line).map(AnchorLine::Regex).map_err(|e| {
                    SpliceError::InvalidPattern {
                        pattern: pattern.to_string(),
                        reason: e.to_string(),
                    }
                }),
            })
            .collect::<SpliceResult<Vec<_>>>()?;

        if lines.is_empty() {
            return Err(SpliceError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "pattern is empty".into(),
            });
        }
        Ok(Self { lines })
    }

    /// First matched span as `(start, end_exclusive)` indices.
    pub fn find(&self, buffer: &[String]) -> Option<(usize, usize)> {
        let width = self.lines.len();
        if width > buffer.len() {
            return None;
        }
        (0..=buffer.len() - width)
            .find(|&start| {
                self.lines
                    .iter()
                    .zip(&buffer[start..start + width])
                    .all(|(anchor, line)| anchor.matches(line))
            })
            .map(|start| (start, start + width))
    }
}

impl AnchorLine {
    fn matches(&self, line: &str) -> bool {
        match self {
            // A blank pattern line only stands for a blank buffer line.
            Self::Literal(needle) if needle.is_empty() => line.trim().is_empty(),
            Self::Literal(needle) => line.contains(needle.as_str()),
            Self::Regex(re) => re.is_match(line),
        }
    }
}

/// Split caller-supplied text into buffer lines.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// `true` when `needle` (compared trimmed) appears as a consecutive run.
pub fn contains_run(buffer: &[String], needle: &[String]) -> bool {
    if needle.is_empty() || needle.len() > buffer.len() {
        return needle.is_empty();
    }
    buffer.windows(needle.len()).any(|window| {
        window
            .iter()
            .zip(needle)
            .all(|(have, want)| have.trim() == want.trim())
    })
}

/// Splice `new_lines` next to the first match of `anchor`.
pub fn insert_relative(
    buffer: &mut Vec<String>,
    anchor: &Anchor,
    new_lines: &[String],
    placement: Placement,
) -> InsertOutcome {
    if contains_run(buffer, new_lines) {
        return InsertOutcome::AlreadyPresent;
    }
    let Some((start, end)) = anchor.find(buffer) else {
        return InsertOutcome::AnchorNotFound;
    };
    let at = match placement {
        Placement::Before => start,
        Placement::After => end,
    };
    buffer.splice(at..at, new_lines.iter().cloned());
    InsertOutcome::Inserted { line: at + 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> Vec<String> {
        split_lines("pub struct App {\n    db: Pool,\n    mux: Router,\n    cfg: Config,\n}")
    }

    #[test]
    fn inserts_after_single_line_anchor() {
        let mut buf = buffer();
        let anchor = Anchor::compile("mux: Router,", PatternMode::Literal).unwrap();
        let new = split_lines("    x: X,");

        let outcome = insert_relative(&mut buf, &anchor, &new, Placement::After);
        assert_eq!(outcome, InsertOutcome::Inserted { line: 4 });
        assert_eq!(buf.len(), 6);
        assert_eq!(buf[3], "    x: X,");

        let again = insert_relative(&mut buf, &anchor, &new, Placement::After);
        assert_eq!(again, InsertOutcome::AlreadyPresent);
        assert_eq!(buf.len(), 6);
    }

    #[test]
    fn inserts_before_multi_line_anchor() {
        let mut buf = buffer();
        let anchor = Anchor::compile("db: Pool,\nmux: Router,", PatternMode::Literal).unwrap();
        let new = split_lines("    // wiring");
        let outcome = insert_relative(&mut buf, &anchor, &new, Placement::Before);
        assert_eq!(outcome, InsertOutcome::Inserted { line: 2 });
        assert_eq!(buf[1], "    // wiring");
        assert_eq!(buf[2], "    db: Pool,");
    }

    #[test]
    fn multi_line_anchor_requires_consecutive_lines() {
        let buf = buffer();
        let anchor = Anchor::compile("db: Pool,\ncfg: Config,", PatternMode::Literal).unwrap();
        assert_eq!(anchor.find(&buf), None);
    }

    #[test]
    fn regex_anchor_matches_per_line() {
        let mut buf = buffer();
        let anchor = Anchor::compile(r"^\s*mux:\s*\w+,$", PatternMode::Regex).unwrap();
        let new = split_lines("    y: Y,");
        let outcome = insert_relative(&mut buf, &anchor, &new, Placement::After);
        assert!(outcome.changed());
        assert_eq!(buf[3], "    y: Y,");
    }

    #[test]
    fn missing_anchor_is_a_silent_no_op() {
        let mut buf = buffer();
        let anchor = Anchor::compile("nope: Nope,", PatternMode::Literal).unwrap();
        let outcome = insert_relative(&mut buf, &anchor, &split_lines("x"), Placement::After);
        assert_eq!(outcome, InsertOutcome::AnchorNotFound);
        assert_eq!(buf, buffer());
    }

    #[test]
    fn idempotence_ignores_indentation() {
        let mut buf = buffer();
        let anchor = Anchor::compile("mux: Router,", PatternMode::Literal).unwrap();
        let new = split_lines("db: Pool,");
        let outcome = insert_relative(&mut buf, &anchor, &new, Placement::After);
        assert_eq!(outcome, InsertOutcome::AlreadyPresent);
    }

    #[test]
    fn blank_anchor_line_matches_only_blank_lines() {
        let buf = split_lines("struct A;\nimpl A {}\n\nimpl B {}\nfn main() {}");
        let anchor = Anchor::compile("impl A {}\n\nimpl B {}", PatternMode::Literal).unwrap();
        assert_eq!(anchor.find(&buf), Some((1, 4)));

        let tight = split_lines("impl A {}\nstruct X;\nimpl B {}");
        assert_eq!(anchor.find(&tight), None);
    }

    #[test]
    fn invalid_regex_is_reported() {
        let err = Anchor::compile("fn (", PatternMode::Regex).unwrap_err();
        assert!(matches!(err, SpliceError::InvalidPattern { .. }));
    }

    #[test]
    fn empty_pattern_is_rejected() {
        assert!(Anchor::compile("", PatternMode::Literal).is_err());
    }
}
