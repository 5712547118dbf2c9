//! Diagnostics and error reporting for scene files
//!
//! Byte spans into the scene source, and helpers that turn parse and
//! configuration errors into messages pointing at the offending line.

use crate::parser::ParseError;

/// Byte range into the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-based line the span starts on
    pub fn line_in(&self, source: &str) -> usize {
        let end = self.start.min(source.len());
        source.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count()
    }
}

/// Format a parse error with context from the source code
pub fn format_parse_error(error: &ParseError, source: &str) -> String {
    let mut msg = format!("Parse error: {}", error);

    if let Some(span) = error.span() {
        let line = span.line_in(source);
        if let Some(text) = source.lines().nth(line) {
            msg.push_str(&format!("\n  at line {}: {}", line + 1, text.trim_end()));
        }
    }

    msg
}

/// Format a configuration error
pub fn format_config_error(error: &dyn std::error::Error) -> String {
    format!("Configuration error: {}", error)
}
