//! Pattern compilation and command extraction
//!
//! A command pattern like `[[GENERATE_WALLET_{user_id}]]` compiles into an
//! anchored matching rule: literal text is matched exactly, each `{var}`
//! placeholder captures a run of characters excluding the closing delimiter
//! character. Extraction first locates the delimited `[[ ... ]]` span in the
//! model output, then tries each registered rule against the full span in
//! registration order. First match wins.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::error::{EnvoyError, Result};

/// First `[[ ... ]]` span in a text, non-greedy, single line
static SPAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("span regex"));

/// A `{var}` placeholder with a well-formed variable name
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex"));

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("name regex"));

/// A command instance extracted from model output. Ephemeral, produced per
/// dispatch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Name of the matched command
    pub command: String,
    /// Variable bindings captured from the pattern
    pub variables: HashMap<String, String>,
}

/// A compiled matching rule for one command pattern.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    regex: Regex,
    variables: Vec<String>,
}

impl CompiledMatcher {
    /// Match a delimited span (delimiters already stripped) against this
    /// rule. The rule is anchored: the span must match start to end.
    ///
    /// Returns the captured variable bindings on success. Captures may be
    /// empty strings.
    pub fn match_span(&self, span: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(span)?;
        Some(
            self.variables
                .iter()
                .map(|name| {
                    let value = caps
                        .name(name)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default();
                    (name.clone(), value)
                })
                .collect(),
        )
    }

    /// Variable names in pattern order
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Locate the first delimited span in arbitrary text
///
/// Returns the span's inner text (delimiters stripped), or None when the
/// text contains no `[[ ... ]]` span. Absence is the normal "plain
/// conversational answer" outcome, not an error.
pub fn find_delimited_span(text: &str) -> Option<&str> {
    SPAN_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Compile a command pattern into a matching rule
///
/// Pure function: depends only on its arguments, so patterns are testable
/// without a registry or dispatcher. The delimiters are stripped, literal
/// text is regex-escaped, and each `{var}` placeholder becomes a named
/// capture group matching any run of characters excluding `}`.
///
/// # Errors
/// Fails when the pattern is not `[[ ]]`-wrapped, contains stray braces or
/// duplicate placeholders, or when its placeholder set does not exactly
/// match `variables`. These are registration-time errors.
pub fn compile_matcher(pattern: &str, variables: &[String]) -> Result<CompiledMatcher> {
    let inner = pattern
        .strip_prefix("[[")
        .and_then(|p| p.strip_suffix("]]"))
        .ok_or_else(|| {
            EnvoyError::InvalidCommand(format!("pattern '{}' must be wrapped in [[ ]]", pattern))
        })?;

    let mut source = String::from("^");
    let mut found: Vec<String> = Vec::new();
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(inner) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let name = name.as_str();

        push_literal(&mut source, &inner[last..whole.start()], pattern)?;

        if found.iter().any(|n| n == name) {
            return Err(EnvoyError::InvalidCommand(format!(
                "pattern '{}' uses placeholder '{{{}}}' more than once",
                pattern, name
            )));
        }
        source.push_str(&format!("(?P<{}>[^}}]*)", name));
        found.push(name.to_string());
        last = whole.end();
    }
    push_literal(&mut source, &inner[last..], pattern)?;
    source.push('$');

    for name in &found {
        if !variables.iter().any(|v| v == name) {
            return Err(EnvoyError::InvalidCommand(format!(
                "pattern '{}' has unbound placeholder '{{{}}}'",
                pattern, name
            )));
        }
    }
    for var in variables {
        if !found.contains(var) {
            return Err(EnvoyError::InvalidCommand(format!(
                "variable '{}' does not appear in pattern '{}'",
                var, pattern
            )));
        }
    }

    let regex = Regex::new(&source)
        .map_err(|e| EnvoyError::InvalidCommand(format!("pattern '{}': {}", pattern, e)))?;

    Ok(CompiledMatcher {
        regex,
        variables: found,
    })
}

/// Append an escaped literal segment, rejecting stray braces
fn push_literal(dst: &mut String, literal: &str, pattern: &str) -> Result<()> {
    if literal.contains('{') || literal.contains('}') {
        return Err(EnvoyError::InvalidCommand(format!(
            "pattern '{}' contains a malformed placeholder",
            pattern
        )));
    }
    dst.push_str(&regex::escape(literal));
    Ok(())
}

/// Names of all well-formed `{var}` placeholders in a pattern, in order
pub(crate) fn placeholder_names(pattern: &str) -> Vec<String> {
    PLACEHOLDER_RE
        .captures_iter(pattern)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

pub(crate) fn is_valid_variable_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_find_span() {
        assert_eq!(
            find_delimited_span("Sure! [[GENERATE_WALLET_123]] done"),
            Some("GENERATE_WALLET_123")
        );
        assert_eq!(find_delimited_span("no span here"), None);
    }

    #[test]
    fn test_find_span_takes_first() {
        assert_eq!(find_delimited_span("[[FIRST]] and [[SECOND]]"), Some("FIRST"));
    }

    #[test]
    fn test_compile_and_match() {
        let matcher =
            compile_matcher("[[GENERATE_WALLET_{user_id}]]", &vars(&["user_id"])).unwrap();
        let bindings = matcher.match_span("GENERATE_WALLET_123").unwrap();
        assert_eq!(bindings.get("user_id"), Some(&"123".to_string()));
    }

    #[test]
    fn test_match_is_anchored() {
        let matcher =
            compile_matcher("[[GENERATE_WALLET_{user_id}]]", &vars(&["user_id"])).unwrap();
        // Partial span matches are rejected
        assert!(matcher.match_span("XGENERATE_WALLET_123").is_none());
        assert!(matcher.match_span("GENERATE_WALLET_123 trailing").is_some());
        // The capture is permissive, so trailing text lands in the variable
        let bindings = matcher.match_span("GENERATE_WALLET_123 trailing").unwrap();
        assert_eq!(bindings.get("user_id"), Some(&"123 trailing".to_string()));
    }

    #[test]
    fn test_empty_capture_allowed() {
        let matcher =
            compile_matcher("[[GENERATE_WALLET_{user_id}]]", &vars(&["user_id"])).unwrap();
        let bindings = matcher.match_span("GENERATE_WALLET_").unwrap();
        assert_eq!(bindings.get("user_id"), Some(&String::new()));
    }

    #[test]
    fn test_multiple_variables() {
        let matcher = compile_matcher(
            "[[TRANSFER_{amount}_{recipient}]]",
            &vars(&["amount", "recipient"]),
        )
        .unwrap();
        let bindings = matcher.match_span("TRANSFER_50_alice").unwrap();
        assert_eq!(bindings.get("amount"), Some(&"50".to_string()));
        assert_eq!(bindings.get("recipient"), Some(&"alice".to_string()));
    }

    #[test]
    fn test_literal_text_is_escaped() {
        let matcher = compile_matcher("[[PING.{host}]]", &vars(&["host"])).unwrap();
        assert!(matcher.match_span("PING.example").is_some());
        // '.' must not act as a wildcard
        assert!(matcher.match_span("PINGXexample").is_none());
    }

    #[test]
    fn test_unbound_placeholder_rejected() {
        let result = compile_matcher("[[CMD_{a}_{b}]]", &vars(&["a"]));
        assert!(matches!(result, Err(EnvoyError::InvalidCommand(_))));
    }

    #[test]
    fn test_unused_variable_rejected() {
        let result = compile_matcher("[[CMD_{a}]]", &vars(&["a", "b"]));
        assert!(matches!(result, Err(EnvoyError::InvalidCommand(_))));
    }

    #[test]
    fn test_missing_delimiters_rejected() {
        let result = compile_matcher("CMD_{a}", &vars(&["a"]));
        assert!(matches!(result, Err(EnvoyError::InvalidCommand(_))));
    }

    #[test]
    fn test_stray_brace_rejected() {
        let result = compile_matcher("[[CMD_{a}_}]]", &vars(&["a"]));
        assert!(matches!(result, Err(EnvoyError::InvalidCommand(_))));
    }

    #[test]
    fn test_duplicate_placeholder_rejected() {
        let result = compile_matcher("[[CMD_{a}_{a}]]", &vars(&["a"]));
        assert!(matches!(result, Err(EnvoyError::InvalidCommand(_))));
    }

    #[test]
    fn test_zero_variable_pattern() {
        let matcher = compile_matcher("[[STATUS_REPORT]]", &[]).unwrap();
        assert!(matcher.match_span("STATUS_REPORT").is_some());
        assert!(matcher.match_span("STATUS_REPORT_EXTRA").is_none());
    }

    #[test]
    fn test_placeholder_names() {
        assert_eq!(
            placeholder_names("[[TRANSFER_{amount}_{recipient}]]"),
            vec!["amount".to_string(), "recipient".to_string()]
        );
        assert!(placeholder_names("[[STATUS]]").is_empty());
    }
}
