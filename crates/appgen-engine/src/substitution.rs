//! Line-level template substitution
//!
//! Two grammars share a template:
//! - scalar tokens `$key$` or `$key%default$`, any number per line
//! - block markers `@key|indent@`, replacing the whole line with the YAML
//!   serialization of a structured value indented by `indent` spaces
//!
//! A line is first offered to scalar substitution. Only when no token was
//! resolved is it tried as a block line.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::context::{Context, ContextValue};

static SCALAR_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$.+?\$").expect("valid regex"));

static BLOCK_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(\S+)\|(\d+)@").expect("valid regex"));

/// Result of scalar substitution on one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarOutcome {
    pub text: String,
    /// Whether any token was replaced
    pub substituted: bool,
}

/// A parsed scalar token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarToken<'a> {
    pub key: &'a str,
    pub default: Option<&'a str>,
}

impl<'a> ScalarToken<'a> {
    /// Parse the text between the `$` delimiters
    pub fn parse(inner: &'a str) -> Self {
        let mut parts = inner.split('%');
        let key = parts.next().unwrap_or_default();
        let default = parts.next().filter(|d| !d.is_empty());
        Self { key, default }
    }
}

/// A parsed block marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMarker<'a> {
    pub key: &'a str,
    pub indent: usize,
}

/// Error raised by a block marker that cannot be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockError {
    pub message: String,
    /// Byte offset of the marker within the line
    pub offset: usize,
    pub len: usize,
}

/// Iterate over the scalar tokens of a line, with their byte offsets
pub fn scalar_tokens(line: &str) -> impl Iterator<Item = (usize, &str, ScalarToken<'_>)> {
    SCALAR_TOKEN.find_iter(line).map(|m| {
        let token = m.as_str();
        (m.start(), token, ScalarToken::parse(&token[1..token.len() - 1]))
    })
}

/// Find the block marker of a line, if any
pub fn block_marker(line: &str) -> Option<(usize, &str, std::result::Result<BlockMarker<'_>, BlockError>)> {
    let caps = BLOCK_MARKER.captures(line)?;
    let whole = caps.get(0)?;
    let key = caps.get(1)?.as_str();
    let indent = caps.get(2)?.as_str();

    let parsed = indent
        .parse::<usize>()
        .map(|indent| BlockMarker { key, indent })
        .map_err(|_| BlockError {
            message: format!("block indent '{}' is out of range", indent),
            offset: whole.start(),
            len: whole.len(),
        });
    Some((whole.start(), whole.as_str(), parsed))
}

/// Replace every resolvable scalar token of `line`
///
/// A token whose key is found renders the value's string form; a missing
/// key falls back to the default; anything else is left verbatim.
/// Structured values count as missing. Never fails.
pub fn substitute_scalars(line: &str, ctx: &Context) -> ScalarOutcome {
    let mut substituted = false;

    let text = SCALAR_TOKEN.replace_all(line, |caps: &Captures<'_>| {
        let token = &caps[0];
        let parsed = ScalarToken::parse(&token[1..token.len() - 1]);

        match ctx.lookup(parsed.key).and_then(ContextValue::as_scalar) {
            Some(value) => {
                substituted = true;
                value.to_string()
            }
            None => match parsed.default {
                Some(default) => {
                    substituted = true;
                    default.to_string()
                }
                None => token.to_string(),
            },
        }
    });

    ScalarOutcome {
        text: text.into_owned(),
        substituted,
    }
}

/// Render a block marker line
///
/// Lines without a marker are returned unchanged. A marker whose key is
/// absent renders to nothing, dropping the line and its newline.
pub fn substitute_block(line: &str, ctx: &Context) -> std::result::Result<String, BlockError> {
    let Some((_, _, marker)) = block_marker(line) else {
        return Ok(line.to_string());
    };
    let marker = marker?;

    match ctx.lookup(marker.key) {
        None => Ok(String::new()),
        Some(ContextValue::Scalar(value)) => {
            Ok(format!("{}{}\n", " ".repeat(marker.indent), value))
        }
        Some(ContextValue::Structured(value)) => {
            serialize_block(marker.key, value, marker.indent).map_err(|message| BlockError {
                message,
                offset: line.find('@').unwrap_or_default(),
                len: line.trim_end().len(),
            })
        }
    }
}

/// Render one template line
pub fn render_line(line: &str, ctx: &Context) -> std::result::Result<String, BlockError> {
    let outcome = substitute_scalars(line, ctx);
    if outcome.substituted {
        return Ok(outcome.text);
    }
    substitute_block(line, ctx)
}

/// Serialize `{key: value}` and keep the value's lines, indented
fn serialize_block(
    key: &str,
    value: &serde_yaml::Value,
    indent: usize,
) -> std::result::Result<String, String> {
    let mut wrapper = serde_yaml::Mapping::new();
    wrapper.insert(serde_yaml::Value::String(key.to_string()), value.clone());
    let yaml = serde_yaml::to_string(&wrapper).map_err(|e| e.to_string())?;

    let padding = " ".repeat(indent);
    let mut lines: Vec<&str> = yaml.split('\n').collect();
    // trailing empty element from the final newline, then the `key:` line
    lines.pop();
    if !lines.is_empty() {
        lines.remove(0);
    }

    let body: Vec<String> = lines
        .into_iter()
        .map(|line| format!("{}{}", padding, line))
        .collect();
    Ok(body.join("\n") + "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CHART_GROUP_SCHEMA, CHART_SCHEMA};

    fn chart_ctx() -> Context {
        Context::new(&CHART_SCHEMA)
            .with("name", "example")
            .unwrap()
            .with("namespace", "demo")
            .unwrap()
    }

    fn group_ctx(names: &[&str]) -> Context {
        Context::new(&CHART_GROUP_SCHEMA)
            .with(
                "chartNames",
                names.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            )
            .unwrap()
    }

    #[test]
    fn test_scalar_found() {
        let out = substitute_scalars("  namespace: $namespace$\n", &chart_ctx());
        assert_eq!(out.text, "  namespace: demo\n");
        assert!(out.substituted);
    }

    #[test]
    fn test_default_fallback() {
        let ctx = chart_ctx();
        let out = substitute_scalars("v: $missing_key%fallback$", &ctx);
        assert_eq!(out.text, "v: fallback");
        assert!(out.substituted);

        let out = substitute_scalars("v: $name%fallback$", &ctx);
        assert_eq!(out.text, "v: example");
    }

    #[test]
    fn test_unresolved_token_preserved() {
        let line = "v: $missing_key$ and $other%$\n";
        let out = substitute_scalars(line, &chart_ctx());
        assert_eq!(out.text, line);
        assert!(!out.substituted);
    }

    #[test]
    fn test_multiple_tokens() {
        let out = substitute_scalars("$name$-$namespace$-$name$", &chart_ctx());
        assert_eq!(out.text, "example-demo-example");
    }

    #[test]
    fn test_partial_resolution_is_substituted() {
        let out = substitute_scalars("$name$ $unknown$", &chart_ctx());
        assert_eq!(out.text, "example $unknown$");
        assert!(out.substituted);
    }

    #[test]
    fn test_scalar_idempotent() {
        let ctx = chart_ctx();
        let line = "name: $name$ ns: $namespace%x$ other: $nope$\n";
        let first = substitute_scalars(line, &ctx);
        let second = substitute_scalars(line, &ctx);
        assert_eq!(first, second);
    }

    #[test]
    fn test_structured_value_in_scalar_position() {
        let line = "names: $chart_names%none$ $chart_names$";
        let out = substitute_scalars(line, &group_ctx(&["a"]));
        assert_eq!(out.text, "names: none $chart_names$");
    }

    #[test]
    fn test_block_indentation() {
        let out = substitute_block("@chart_names|4@\n", &group_ctx(&["a", "b"])).unwrap();
        assert_eq!(out, "    - a\n    - b\n");
    }

    #[test]
    fn test_block_absent_key_deletes_line() {
        let ctx = Context::new(&CHART_GROUP_SCHEMA);
        assert_eq!(substitute_block("@chart_names|2@\n", &ctx).unwrap(), "");
    }

    #[test]
    fn test_block_mapping_value() {
        let value: serde_yaml::Value = serde_yaml::from_str("a: 1\nb: [x]\n").unwrap();
        let ctx = Context::new(&CHART_GROUP_SCHEMA)
            .with("chartNames", value)
            .unwrap();

        // nested mappings keep the serializer's own indentation
        let out = substitute_block("@chartNames|2@", &ctx).unwrap();
        assert_eq!(out, "    a: 1\n    b:\n    - x\n");
    }

    #[test]
    fn test_block_on_scalar_key() {
        let out = substitute_block("@namespace|2@\n", &chart_ctx()).unwrap();
        assert_eq!(out, "  demo\n");
    }

    #[test]
    fn test_block_indent_overflow() {
        let err = substitute_block("@chart_names|99999999999999999999999@", &group_ctx(&["a"]))
            .unwrap_err();
        assert_eq!(err.offset, 0);
        assert!(err.message.contains("out of range"));
    }

    #[test]
    fn test_render_line_prefers_scalars() {
        let ctx = chart_ctx();
        assert_eq!(render_line("plain\n", &ctx).unwrap(), "plain\n");
        assert_eq!(render_line("ns: $namespace$\n", &ctx).unwrap(), "ns: demo\n");
        assert_eq!(render_line("@unknown|2@\n", &ctx).unwrap(), "");
    }

    #[test]
    fn test_token_parse() {
        assert_eq!(
            ScalarToken::parse("key%a%b"),
            ScalarToken {
                key: "key",
                default: Some("a")
            }
        );
        assert_eq!(ScalarToken::parse("key%").default, None);
    }
}
