use regex::Regex;
use std::sync::OnceLock;

/// Indent of continuation lines.
pub const TIP_PADDING: &str = "   ";

/// First line is padded up to this width.
const MIN_LINE_LENGTH: usize = 80;
/// Longer continuation lines are split at this width.
const MAX_LINE_LENGTH: usize = 100;

static SIGNATURE_REGEX: OnceLock<Regex> = OnceLock::new();

fn signature_regex() -> &'static Regex {
    SIGNATURE_REGEX.get_or_init(|| {
        Regex::new(r"([^\s]+)\(([^\[\(\)]*)")
            .expect("Invalid regex pattern - this is a compile-time constant")
    })
}

/// A formatted call-tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTip {
    /// Wrapped lines for list or panel display.
    pub lines: Vec<String>,
    /// Placeholders for the parameters not typed yet, if any.
    pub snippet: Option<String>,
    /// Single-line text for the status bar.
    pub text: String,
}

/// Format an engine call-tip.
///
/// The first line of `tip` is the signature, the rest is documentation.
/// `line` is the current line up to the cursor and decides how many
/// arguments are already typed. A signature without a parsable parameter
/// list yields no snippet.
pub fn format_call_tip(tip: &str, line: &str) -> CallTip {
    let tip_info: Vec<&str> = tip.split('\n').collect();
    let signature = tip_info.first().copied().unwrap_or_default();
    let doc = tip_info[1..].join(" ");

    let (snippet, text) = match signature_regex().captures(signature) {
        Some(caps) => {
            let params = caps.get(2).map_or("", |m| m.as_str());
            let snippet = parameter_snippet(params, line);
            (snippet, format!("{} - {}", doc, signature).trim().to_string())
        }
        None => (None, format!("{} {}", signature, doc).trim().to_string()),
    };

    CallTip {
        lines: wrap_tip(&tip_info),
        snippet,
        text,
    }
}

/// Pad and wrap tip lines for display.
///
/// The signature line is padded to a fixed width so the list or panel does
/// not resize as documentation lines vary.
pub fn wrap_tip(tip_info: &[&str]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, tip) in tip_info.iter().enumerate() {
        let len = tip.chars().count();
        if i == 0 {
            lines.push(format!("{tip:<width$}", width = MIN_LINE_LENGTH));
        } else if len > MAX_LINE_LENGTH {
            let chars: Vec<char> = tip.chars().collect();
            for chunk in chars.chunks(MAX_LINE_LENGTH) {
                lines.push(format!(
                    "{TIP_PADDING}{}{TIP_PADDING}",
                    chunk.iter().collect::<String>()
                ));
            }
        } else {
            lines.push(format!("{TIP_PADDING}{tip}{TIP_PADDING}"));
        }
    }
    lines
}

/// Placeholders for the parameters in `params` not covered by the
/// arguments already typed on `line`.
fn parameter_snippet(params: &str, line: &str) -> Option<String> {
    let typed = typed_arguments(line);
    let (arguments, separator) = match &typed {
        Some(t) => (t.count, t.separator.as_str()),
        None => (0, ""),
    };

    let mut placeholders = Vec::new();
    for (i, param) in params.split(',').map(str::trim).enumerate() {
        if param.is_empty() || i < arguments {
            continue;
        }
        let var = param.split('=').next().unwrap_or_default().trim();
        // Typed parameters: take the name after the type
        let var = match var.split(' ').nth(1) {
            Some(name) if var.contains(' ') => name,
            _ => var,
        };
        let var = var.strip_prefix('$').unwrap_or(var);
        if var.is_empty() {
            continue;
        }
        placeholders.push(format!("${{{}:{}}}", placeholders.len() + 1, var));
    }

    if placeholders.is_empty() {
        return None;
    }
    let snippet = placeholders.join(", ");
    if arguments > 0 {
        Some(format!("{separator}{snippet}"))
    } else {
        Some(snippet)
    }
}

#[derive(Debug, PartialEq, Eq)]
struct TypedArguments {
    count: usize,
    /// Text to insert before the first placeholder.
    separator: String,
}

/// Count the arguments already typed inside the innermost open `(`.
fn typed_arguments(line: &str) -> Option<TypedArguments> {
    let mut open: Vec<(usize, char)> = Vec::new();
    for (i, c) in line.char_indices() {
        match c {
            '(' | '[' | '{' => open.push((i, c)),
            ')' | ']' | '}' => {
                open.pop();
            }
            _ => {}
        }
    }
    let start = open.iter().rev().find(|(_, c)| *c == '(').map(|(i, _)| i + 1)?;
    let inside = &line[start..];

    let compact: String = inside.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    let mut depth = 0usize;
    let mut commas = 0;
    for c in compact.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => commas += 1,
            _ => {}
        }
    }

    let mut separator = String::new();
    let count = if compact.ends_with(',') {
        commas
    } else {
        separator.push(',');
        commas + 1
    };
    if !line.ends_with(' ') {
        separator.push(' ');
    }
    Some(TypedArguments { count, separator })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_parameters_after_typed_arguments() {
        let tip = format_call_tip("foo(a, b, c)", "foo(1, ");
        assert_eq!(tip.snippet.as_deref(), Some("${1:b}, ${2:c}"));
    }

    #[test]
    fn test_no_arguments_typed() {
        let tip = format_call_tip("foo(a, b=2, *args)\nDo the foo.", "foo(");
        assert_eq!(tip.snippet.as_deref(), Some("${1:a}, ${2:b}, ${3:*args}"));
        assert_eq!(tip.text, "Do the foo. - foo(a, b=2, *args)");
    }

    #[test]
    fn test_separator_when_no_trailing_comma() {
        let tip = format_call_tip("foo(a, b, c)", "foo(1");
        assert_eq!(tip.snippet.as_deref(), Some(", ${1:b}, ${2:c}"));

        let tip = format_call_tip("foo(a, b, c)", "foo(1,");
        assert_eq!(tip.snippet.as_deref(), Some(" ${1:b}, ${2:c}"));
    }

    #[test]
    fn test_nested_calls_count_outer_arguments() {
        let tip = format_call_tip("foo(a, b, c)", "foo(bar(1, 2), ");
        assert_eq!(tip.snippet.as_deref(), Some("${1:b}, ${2:c}"));
    }

    #[test]
    fn test_all_arguments_typed() {
        let tip = format_call_tip("foo(a, b)", "foo(1, 2, ");
        assert_eq!(tip.snippet, None);
    }

    #[test]
    fn test_typed_and_php_parameters() {
        let tip = format_call_tip("strpos(string $haystack, mixed $needle)", "strpos(");
        assert_eq!(tip.snippet.as_deref(), Some("${1:haystack}, ${2:needle}"));
    }

    #[test]
    fn test_unparsable_signature_degrades_to_raw_text() {
        let tip = format_call_tip("no signature here\nsecond line", "x");
        assert_eq!(tip.snippet, None);
        assert_eq!(tip.text, "no signature here second line");
        assert_eq!(tip.lines.len(), 2);
    }

    #[test]
    fn test_wrap_tip() {
        let long = "x".repeat(250);
        let lines = wrap_tip(&["sig()", "short", &long]);
        assert_eq!(lines[0].chars().count(), 80);
        assert!(lines[0].starts_with("sig()"));
        assert_eq!(lines[1], "   short   ");
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2].chars().count(), 106);
        assert_eq!(lines[4], format!("   {}   ", "x".repeat(50)));
    }

    #[test]
    fn test_typed_arguments() {
        assert_eq!(typed_arguments("x = 1"), None);
        assert_eq!(typed_arguments("foo("), None);
        assert_eq!(typed_arguments("foo(a)"), None);
        assert_eq!(
            typed_arguments("foo(a, [1, 2], "),
            Some(TypedArguments {
                count: 2,
                separator: String::new()
            })
        );
    }
}
