//! Line formatter driven by a small template language.
//!
//! Templates mix literal text with four placeholders:
//! - `{time}` - local timestamp, millisecond precision
//! - `{name}` - logger name (the event target, with `::` shown as `.`)
//! - `{level}` - severity (`DEBUG`, `INFO`, `WARNING`, ...)
//! - `{message}` - the event's fields
//!
//! Anything else inside braces is kept as literal text.

use chrono::Local;
use std::fmt::{self, Write as _};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Time,
    Name,
    Level,
    Message,
}

#[derive(Debug, Clone)]
pub struct PatternFormatter {
    segments: Vec<Segment>,
}

impl PatternFormatter {
    pub fn new(pattern: &str) -> Self {
        Self {
            segments: parse(pattern),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

fn parse(pattern: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = pattern;

    while let Some(start) = rest.find('{') {
        literal.push_str(&rest[..start]);
        let tail = &rest[start..];

        let Some(end) = tail.find('}') else {
            literal.push_str(tail);
            rest = "";
            break;
        };

        let placeholder = match &tail[1..end] {
            "time" => Some(Segment::Time),
            "name" => Some(Segment::Name),
            "level" => Some(Segment::Level),
            "message" => Some(Segment::Message),
            _ => None,
        };

        match placeholder {
            Some(segment) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(segment);
            }
            None => literal.push_str(&tail[..=end]),
        }

        rest = &tail[end + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Severity as written in log lines.
pub fn level_name(level: &Level) -> &'static str {
    if *level == Level::WARN {
        "WARNING"
    } else {
        level.as_str()
    }
}

/// Render a tracing target as a dotted logger name.
pub fn logger_name(target: &str) -> String {
    target.replace("::", ".")
}

impl<S, N> FormatEvent<S, N> for PatternFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => writer.write_str(text)?,
                Segment::Time => write!(writer, "{}", Local::now().format(TIME_FORMAT))?,
                Segment::Name => writer.write_str(&logger_name(meta.target()))?,
                Segment::Level => writer.write_str(level_name(meta.level()))?,
                Segment::Message => ctx.field_format().format_fields(writer.by_ref(), event)?,
            }
        }

        writeln!(writer)
    }
}
