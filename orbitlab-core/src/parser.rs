use crate::config::{Color, ConfigError, SimulationConfig, SlotConfig, SlotTable};
use crate::diagnostics::Span;
use crate::engine::GravityField;
use crate::integrator::IntegratorKind;
use glam::Vec2;
use thiserror::Error;

/// Parse error with optional span information
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{message}")]
    SyntaxError {
        message: String,
        span: Option<Span>,
    },
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::SyntaxError {
            message: message.into(),
            span,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::SyntaxError {
            message: message.into(),
            span: None,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::SyntaxError { span, .. } => *span,
        }
    }
}

/// Anything that can go wrong turning scene text into a runnable setup
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A fully parsed and validated scene
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub gravity: GravityField,
    pub config: SimulationConfig,
    pub slots: SlotTable<Color>,
}

/// Helper to track byte offsets while parsing
struct ParseContext {
    line_offsets: Vec<usize>, // Byte offset of start of each line
    len: usize,
}

impl ParseContext {
    fn new(source: &str) -> Self {
        let mut line_offsets = vec![0];
        let mut offset = 0;
        for ch in source.chars() {
            offset += ch.len_utf8();
            if ch == '\n' {
                line_offsets.push(offset);
            }
        }
        Self {
            line_offsets,
            len: source.len(),
        }
    }

    /// Get byte offset for start of line (0-indexed)
    fn line_start(&self, line: usize) -> usize {
        self.line_offsets.get(line).copied().unwrap_or(self.len)
    }

    /// Create a span for the entire line
    fn full_line_span(&self, line: usize) -> Span {
        Span::new(self.line_start(line), self.line_start(line + 1))
    }
}

/// Parse and validate a scene description
///
/// ```text
/// mass 10000000
/// rate 60
/// start at (200, 0) velocity (0, 100)
/// slot euler steps 100 color yellow
/// ```
///
/// `mass`, `rate` and `start` are optional; at least one `slot` is required.
pub fn parse_scene(source: &str) -> Result<Scene, SceneError> {
    let ctx = ParseContext::new(source);
    let mut mass = None;
    let mut rate = None;
    let mut start = None;
    let mut slots = Vec::new();

    for (i, raw) in source.lines().enumerate() {
        let line = strip_comment(raw.trim());
        let span = Some(ctx.full_line_span(i));

        if line.is_empty() {
            continue;
        }

        let keyword = line.split_whitespace().next().unwrap_or("");
        match keyword {
            "mass" => set_once(&mut mass, parse_scalar(line, "mass", span)?, "mass", span)?,
            "rate" => set_once(&mut rate, parse_scalar(line, "rate", span)?, "rate", span)?,
            "start" => set_once(&mut start, parse_start(line, span)?, "start", span)?,
            "slot" => slots.push(parse_slot(line, span)?),
            _ => {
                return Err(ParseError::new(format!("Unexpected token: {}", keyword), span).into());
            }
        }
    }

    let defaults = SimulationConfig::default();
    let (initial_position, initial_velocity) =
        start.unwrap_or((defaults.initial_position, defaults.initial_velocity));
    let config = SimulationConfig {
        base_frame_rate: rate.unwrap_or(defaults.base_frame_rate),
        initial_position,
        initial_velocity,
    };
    config.validate()?;

    if slots.is_empty() {
        return Err(ParseError::message("Missing 'slot' declaration").into());
    }

    let mass = mass.unwrap_or(GravityField::DEFAULT_MASS);
    if !mass.is_finite() {
        return Err(ConfigError::InvalidMass(mass).into());
    }

    Ok(Scene {
        gravity: GravityField::new(mass),
        config,
        slots: SlotTable::new(slots)?,
    })
}

/// Drop a comment: a whole line starting with `#`, or a `#` followed by
/// whitespace or the end of the line. `#rrggbb` colors are not comments.
fn strip_comment(line: &str) -> &str {
    if line.starts_with('#') {
        return "";
    }
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'#' && bytes.get(i + 1).map_or(true, |c| c.is_ascii_whitespace()) {
            return line[..i].trim_end();
        }
    }
    line
}

fn set_once<T>(
    slot: &mut Option<T>,
    value: T,
    keyword: &str,
    span: Option<Span>,
) -> Result<(), ParseError> {
    if slot.is_some() {
        return Err(ParseError::new(
            format!("Duplicate '{}' declaration", keyword),
            span,
        ));
    }
    *slot = Some(value);
    Ok(())
}

/// Parse `<keyword> <number>`
fn parse_scalar(line: &str, keyword: &str, span: Option<Span>) -> Result<f32, ParseError> {
    let rest = line
        .strip_prefix(keyword)
        .ok_or_else(|| ParseError::new(format!("Expected '{}' keyword", keyword), span))?;
    parse_number(rest.trim(), span)
}

/// Parse a start declaration: `start at (x, y) velocity (vx, vy)`
fn parse_start(line: &str, span: Option<Span>) -> Result<(Vec2, Vec2), ParseError> {
    let rest = line
        .strip_prefix("start")
        .ok_or_else(|| ParseError::new("Expected 'start' keyword", span))?
        .trim_start();

    let rest = rest.strip_prefix("at").ok_or_else(|| {
        ParseError::new(format!("Expected 'at' in start declaration: {}", line), span)
    })?;

    let vel_pos = rest.find("velocity").ok_or_else(|| {
        ParseError::new(
            format!("Expected 'velocity' in start declaration: {}", line),
            span,
        )
    })?;

    let position = parse_vec2(&rest[..vel_pos], line, span)?;
    let velocity = parse_vec2(&rest[vel_pos + "velocity".len()..], line, span)?;
    Ok((position, velocity))
}

/// Parse a slot declaration: `slot <integrator> steps <n> color <name|#hex>`
fn parse_slot(line: &str, span: Option<Span>) -> Result<SlotConfig<Color>, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 6 || tokens[0] != "slot" || tokens[2] != "steps" || tokens[4] != "color"
    {
        return Err(ParseError::new(
            format!("Expected 'slot <integrator> steps <n> color <color>': {}", line),
            span,
        ));
    }

    let integrator: IntegratorKind = tokens[1]
        .parse()
        .map_err(|e| ParseError::new(format!("{}", e), span))?;

    let sub_steps: u32 = tokens[3].parse().map_err(|_| {
        ParseError::new(format!("Invalid sub-step count: {}", tokens[3]), span)
    })?;

    let color = Color::named(tokens[5])
        .or_else(|| Color::from_hex(tokens[5]))
        .ok_or_else(|| ParseError::new(format!("Unknown color: {}", tokens[5]), span))?;

    Ok(SlotConfig::new(sub_steps, integrator, color))
}

/// Parse `(x, y)`
fn parse_vec2(text: &str, line: &str, span: Option<Span>) -> Result<Vec2, ParseError> {
    let text = text.trim();
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| ParseError::new(format!("Expected '(x, y)' in: {}", line), span))?;

    let coords: Vec<&str> = inner.split(',').map(|s| s.trim()).collect();
    if coords.len() != 2 {
        return Err(ParseError::new(
            format!("Expected two coordinates in: {}", line),
            span,
        ));
    }

    Ok(Vec2::new(
        parse_number(coords[0], span)?,
        parse_number(coords[1], span)?,
    ))
}

fn parse_number(text: &str, span: Option<Span>) -> Result<f32, ParseError> {
    text.parse::<f32>()
        .map_err(|_| ParseError::new(format!("Invalid number: {}", text), span))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vectors() {
        assert_eq!(
            parse_vec2(" (1.5, -2) ", "", None).unwrap(),
            Vec2::new(1.5, -2.0)
        );
        assert!(parse_vec2("(1, 2, 3)", "", None).is_err());
        assert!(parse_vec2("1, 2", "", None).is_err());
    }

    #[test]
    fn strips_trailing_comments_but_not_colors() {
        assert_eq!(strip_comment("# whole line"), "");
        assert_eq!(strip_comment("#"), "");
        assert_eq!(
            strip_comment("slot rk4 steps 10 color #ffa100 # fine"),
            "slot rk4 steps 10 color #ffa100"
        );
        assert_eq!(strip_comment("rate 60 #"), "rate 60");
        assert_eq!(
            strip_comment("slot heun steps 1 color #102030"),
            "slot heun steps 1 color #102030"
        );
    }

    #[test]
    fn duplicate_declarations_are_rejected() {
        let err = parse_scene("rate 60\nrate 30\nslot heun steps 1 color red\n").unwrap_err();
        assert_eq!(
            err,
            SceneError::Parse(ParseError::new(
                "Duplicate 'rate' declaration",
                Some(Span::new(8, 16))
            ))
        );
    }
}
