//! Row format templates for event-list output.
//!
//! Templates contain `{field}` or `{field:width}` placeholders. A positive
//! width left-pads the value to that character count; a leading `-` pads on
//! the right instead. `{{` and `}}` emit literal braces.

use chrono::{DateTime, SecondsFormat};
use serde_json::Value;

use loghive_api_models::{EVENT_TIMESTAMP_FIELD, EventRow};

use crate::client::{CliError, CliResult};

/// Template applied when the caller does not supply one.
pub(crate) const DEFAULT_EVENT_FORMAT: &str = "{@timestamp} {@rawstring}";

/// A parsed format template, applied once per rendered row.
#[derive(Debug, Clone)]
pub(crate) struct RowFormat {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Field { name: String, width: Option<isize> },
}

impl RowFormat {
    /// Parse a template, rejecting unbalanced braces, empty field names, and
    /// non-numeric widths as validation errors.
    pub(crate) fn parse(template: &str) -> CliResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut placeholder = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        placeholder.push(inner);
                    }
                    if !closed {
                        return Err(CliError::validation(format!(
                            "unclosed '{{' in format template '{template}'"
                        )));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_placeholder(&placeholder)?);
                }
                '}' => {
                    return Err(CliError::validation(format!(
                        "unmatched '}}' in format template '{template}'"
                    )));
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Apply the template to one result row.
    pub(crate) fn render(&self, row: &EventRow) -> String {
        let mut rendered = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Field { name, width } => {
                    let value = format_field(name, row);
                    match width {
                        None => rendered.push_str(&value),
                        Some(width) if *width < 0 => {
                            let pad = width.unsigned_abs();
                            rendered.push_str(&format!("{value:<pad$}"));
                        }
                        Some(width) => {
                            let pad = width.unsigned_abs();
                            rendered.push_str(&format!("{value:>pad$}"));
                        }
                    }
                }
            }
        }
        rendered
    }
}

fn parse_placeholder(placeholder: &str) -> CliResult<Segment> {
    let (name, width) = match placeholder.rsplit_once(':') {
        Some((name, width_text)) => {
            let width = width_text.parse::<isize>().map_err(|_| {
                CliError::validation(format!(
                    "invalid width '{width_text}' in format placeholder '{{{placeholder}}}'"
                ))
            })?;
            (name, Some(width))
        }
        None => (placeholder, None),
    };
    if name.is_empty() {
        return Err(CliError::validation(format!(
            "empty field name in format placeholder '{{{placeholder}}}'"
        )));
    }
    Ok(Segment::Field {
        name: name.to_string(),
        width,
    })
}

/// Render one field of a row. Missing fields render as JSON `null`; the
/// well-known timestamp field gets a human-readable formatter.
pub(crate) fn format_field(name: &str, row: &EventRow) -> String {
    row.get(name).map_or_else(
        || Value::Null.to_string(),
        |value| {
            if name == EVENT_TIMESTAMP_FIELD {
                format_timestamp(value)
            } else {
                format_value(value)
            }
        },
    )
}

/// Natural string representation of a JSON value: strings unquoted,
/// everything else in its JSON form.
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Format a float milliseconds-since-epoch timestamp as RFC3339 seconds UTC.
/// Values that are not such a timestamp fall back to their natural form.
fn format_timestamp(value: &Value) -> String {
    value
        .as_f64()
        .and_then(|millis| DateTime::from_timestamp_millis(millis as i64))
        .map_or_else(
            || format_value(value),
            |timestamp| timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> EventRow {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn renders_the_timestamp_scenario() {
        let format = RowFormat::parse("{@timestamp} {@rawstring}").unwrap();
        let row = row(json!({"@timestamp": 1_700_000_000_000.0_f64, "@rawstring": "hello"}));
        assert_eq!(format.render(&row), "2023-11-14T22:13:20Z hello");
    }

    #[test]
    fn positive_width_pads_on_the_left() {
        let format = RowFormat::parse("[{level:8}]").unwrap();
        let row = row(json!({"level": "warn"}));
        assert_eq!(format.render(&row), "[    warn]");
    }

    #[test]
    fn negative_width_pads_on_the_right() {
        let format = RowFormat::parse("[{level:-8}]").unwrap();
        let row = row(json!({"level": "warn"}));
        assert_eq!(format.render(&row), "[warn    ]");
    }

    #[test]
    fn missing_fields_render_as_null() {
        let format = RowFormat::parse("{absent}").unwrap();
        assert_eq!(format.render(&row(json!({"other": 1}))), "null");
    }

    #[test]
    fn non_string_values_use_their_json_form() {
        let format = RowFormat::parse("{count} {tags}").unwrap();
        let row = row(json!({"count": 42, "tags": ["a", "b"]}));
        assert_eq!(format.render(&row), "42 [\"a\",\"b\"]");
    }

    #[test]
    fn doubled_braces_are_literals() {
        let format = RowFormat::parse("{{{host}}}").unwrap();
        let row = row(json!({"host": "web-1"}));
        assert_eq!(format.render(&row), "{web-1}");
    }

    #[test]
    fn malformed_templates_are_validation_errors() {
        for template in ["{open", "close}", "{host:wide}", "{:8}"] {
            assert!(matches!(
                RowFormat::parse(template).unwrap_err(),
                CliError::Validation(_)
            ));
        }
    }

    #[test]
    fn non_numeric_timestamp_falls_back_to_natural_form() {
        let format = RowFormat::parse("{@timestamp}").unwrap();
        let row = row(json!({"@timestamp": "not-a-number"}));
        assert_eq!(format.render(&row), "not-a-number");
    }
}
