use std::fmt;

use itertools::Itertools;
use serde::Serialize;
use strum::AsRefStr;
use strum::Display;

use crate::constants::DEFAULT_PADDING_WIDTH;

/// Severity of one transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize)]
pub enum LineLevel {
    /// A change was applied or a request completed
    Success,
    /// Something was adjusted or ignored, processing continued
    Warning,
    /// This entry failed, siblings may still succeed
    Error,
}

/// One diagnostic record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptLine {
    /// Severity
    pub level:   LineLevel,
    /// Nesting depth at which the line was produced, used for indentation only
    pub depth:   usize,
    /// Message without the level prefix
    pub message: String,
}

/// Ordered diagnostic trail of one serialize / populate / invoke call
///
/// Lines are kept structured and only joined into text at the response boundary. Every line is
/// mirrored to `tracing` as it is recorded.
#[derive(Debug, Clone)]
pub struct Transcript {
    lines:         Vec<TranscriptLine>,
    padding_width: usize,
}

impl Default for Transcript {
    fn default() -> Self { Self::new(DEFAULT_PADDING_WIDTH) }
}

impl Transcript {
    /// Empty transcript indenting `padding_width` spaces per depth level
    pub const fn new(padding_width: usize) -> Self {
        Self {
            lines: Vec::new(),
            padding_width,
        }
    }

    /// Record a line
    pub fn push(&mut self, level: LineLevel, depth: usize, message: impl Into<String>) {
        let message = message.into();
        match level {
            LineLevel::Success => tracing::debug!(depth, "{message}"),
            LineLevel::Warning => tracing::warn!(depth, "{message}"),
            LineLevel::Error => tracing::error!(depth, "{message}"),
        }
        self.lines.push(TranscriptLine {
            level,
            depth,
            message,
        });
    }

    /// Record a `[Success]` line
    pub fn success(&mut self, depth: usize, message: impl Into<String>) {
        self.push(LineLevel::Success, depth, message);
    }

    /// Record a `[Warning]` line
    pub fn warning(&mut self, depth: usize, message: impl Into<String>) {
        self.push(LineLevel::Warning, depth, message);
    }

    /// Record an `[Error]` line
    pub fn error(&mut self, depth: usize, message: impl Into<String>) {
        self.push(LineLevel::Error, depth, message);
    }

    /// Recorded lines in order
    pub fn lines(&self) -> &[TranscriptLine] { &self.lines }

    /// Number of lines of one level
    pub fn count(&self, level: LineLevel) -> usize {
        self.lines.iter().filter(|line| line.level == level).count()
    }

    /// True when any `[Error]` line was recorded
    pub fn has_errors(&self) -> bool { self.count(LineLevel::Error) > 0 }

    /// True when a warning or an error was recorded
    pub fn has_problems(&self) -> bool {
        self.lines.iter().any(|line| line.level != LineLevel::Success)
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }

    /// Number of recorded lines
    pub fn len(&self) -> usize { self.lines.len() }

    /// Append another transcript's lines
    pub fn extend(&mut self, other: Self) { self.lines.extend(other.lines); }

    /// Newline-joined `[Level] message` text, indented by depth
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| {
                format!(
                    "{:pad$}[{}] {}",
                    "",
                    line.level,
                    line.message,
                    pad = line.depth * self.padding_width
                )
            })
            .join("\n")
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.render()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_indents_by_depth() {
        let mut transcript = Transcript::new(2);
        transcript.success(0, "root");
        transcript.warning(1, "child");
        transcript.error(2, "grandchild");

        assert_eq!(
            transcript.render(),
            "[Success] root\n  [Warning] child\n    [Error] grandchild"
        );
        assert_eq!(transcript.count(LineLevel::Warning), 1);
        assert!(transcript.has_errors());
    }

    #[test]
    fn test_every_line_has_a_level_prefix() {
        let mut transcript = Transcript::default();
        transcript.success(3, "a");
        transcript.error(0, "b");
        for line in transcript.render().lines() {
            let trimmed = line.trim_start();
            assert!(
                trimmed.starts_with("[Success]")
                    || trimmed.starts_with("[Warning]")
                    || trimmed.starts_with("[Error]")
            );
        }
    }
}
