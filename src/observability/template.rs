//! Message templates with named holes.
//!
//! `"HTTP {Method} request to {Path}"` rendered with `["GET", "/a"]` gives
//! the text `HTTP GET request to /a` and the properties `Method = GET`,
//! `Path = /a`. Holes bind to arguments by position. `{{` and `}}` are
//! literal braces. A hole without a matching argument is left as written.

use std::fmt::{Display, Write};

/// Output of [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub text: String,
    pub properties: Vec<(String, String)>,
}

pub fn render(template: &str, args: &[&dyn Display]) -> RenderedMessage {
    let mut text = String::with_capacity(template.len());
    let mut properties = Vec::new();
    let mut args = args.iter();
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        text.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            text.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            text.push('}');
            rest = &tail[1..];
            continue;
        }

        let Some(close) = tail.find('}') else {
            text.push_str(tail);
            rest = "";
            break;
        };
        let hole = &tail[..=close];
        match (hole_name(&tail[1..close]), args.next()) {
            (Some(name), Some(arg)) => {
                let value = arg.to_string();
                text.push_str(&value);
                properties.push((name.to_string(), value));
            }
            (None, Some(arg)) => {
                let _ = write!(text, "{}", arg);
            }
            (_, None) => text.push_str(hole),
        }
        rest = &tail[close + 1..];
    }
    text.push_str(rest);

    RenderedMessage { text, properties }
}

/// `@Name`, `$Name`, `Name:format` and `Name,align` all name `Name`.
fn hole_name(raw: &str) -> Option<&str> {
    let raw = raw.trim_start_matches(['@', '$']);
    let end = raw.find([':', ',']).unwrap_or(raw.len());
    let name = raw[..end].trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_holes() {
        let rendered = render("HTTP {Method} request to {Path}", &[&"GET", &"/api/v1/test"]);
        assert_eq!(rendered.text, "HTTP GET request to /api/v1/test");
        assert_eq!(
            rendered.properties,
            vec![
                ("Method".to_string(), "GET".to_string()),
                ("Path".to_string(), "/api/v1/test".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_argument_keeps_hole() {
        let rendered = render("user {UserId} missing {Field}", &[&7]);
        assert_eq!(rendered.text, "user 7 missing {Field}");
        assert_eq!(rendered.properties.len(), 1);
    }

    #[test]
    fn test_escaped_braces() {
        let rendered = render("{{literal}} and {Value}", &[&1]);
        assert_eq!(rendered.text, "{literal} and 1");
    }

    #[test]
    fn test_format_suffix_and_destructure_prefix() {
        let rendered = render("{@Order} took {Elapsed:0.00}", &[&"o-1", &12]);
        assert_eq!(rendered.text, "o-1 took 12");
        assert_eq!(rendered.properties[0].0, "Order");
        assert_eq!(rendered.properties[1].0, "Elapsed");
    }

    #[test]
    fn test_unclosed_brace_is_literal() {
        let rendered = render("broken {Name", &[&"x"]);
        assert_eq!(rendered.text, "broken {Name");
        assert!(rendered.properties.is_empty());
    }

    #[test]
    fn test_no_holes() {
        let rendered = render("plain text", &[]);
        assert_eq!(rendered.text, "plain text");
        assert!(rendered.properties.is_empty());
    }
}
