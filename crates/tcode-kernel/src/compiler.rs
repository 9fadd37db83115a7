//! Block-level compilation: splitting a block into command lines and runs
//! of ordinary code.

use crate::error::Outcome;

/// One unit of work in a block, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// A line starting with the command prefix, trimmed.
    Command(&'a str),
    /// A maximal run of other non-blank lines, newline-joined and trimmed.
    Code(String),
}

/// Partition `text` into command lines and code runs. Blank lines are
/// dropped and do not end a code run. An empty `prefix` marks no lines as
/// commands.
pub fn partition<'a>(text: &'a str, prefix: &str) -> Vec<Segment<'a>> {
    let mut segments = Vec::new();
    let mut run: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !prefix.is_empty() && trimmed.starts_with(prefix) {
            flush(&mut run, &mut segments);
            segments.push(Segment::Command(trimmed));
        } else {
            run.push(line);
        }
    }
    flush(&mut run, &mut segments);
    segments
}

fn flush<'a>(run: &mut Vec<&str>, segments: &mut Vec<Segment<'a>>) {
    if run.is_empty() {
        return;
    }
    segments.push(Segment::Code(run.join("\n").trim().to_string()));
    run.clear();
}

/// Results of one compiled block, one per segment.
#[derive(Debug, Default)]
pub struct BlockOutput {
    pub segments: Vec<Outcome>,
}

impl BlockOutput {
    /// Join the non-empty rendered results with newlines. Errors render as
    /// their messages.
    pub fn render(&self) -> String {
        self.segments
            .iter()
            .map(|outcome| match outcome {
                Ok(text) => text.clone(),
                Err(e) => e.to_string(),
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether any segment failed.
    pub fn has_errors(&self) -> bool {
        self.segments.iter().any(Result::is_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn alternating_runs_keep_order() {
        let text = "!help()\nx = 1\n\ny = 2\n!help()\nprint(x)";
        assert_eq!(partition(text, "!"), vec![
            Segment::Command("!help()"),
            Segment::Code("x = 1\ny = 2".into()),
            Segment::Command("!help()"),
            Segment::Code("print(x)".into()),
        ]);
    }

    #[test]
    fn consecutive_commands_stay_separate() {
        assert_eq!(partition("  !a()\n!b()  ", "!"), vec![
            Segment::Command("!a()"),
            Segment::Command("!b()"),
        ]);
    }

    #[test]
    fn blank_text_has_no_segments() {
        assert!(partition(" \n\t\n", "!").is_empty());
    }

    #[test]
    fn empty_prefix_means_all_code() {
        assert_eq!(partition("!x\ny", ""), vec![Segment::Code("!x\ny".into())]);
    }

    #[test]
    fn render_skips_empty_and_shows_errors() {
        let output = BlockOutput {
            segments: vec![
                Ok("one".into()),
                Ok(String::new()),
                Err(EngineError::EmptyInput),
                Ok("two".into()),
            ],
        };
        assert_eq!(output.render(), "one\nempty command\ntwo");
        assert!(output.has_errors());
    }
}
