//! Comment-based allowance directives.
//!
//! Supports directives like:
//! ```text
//! // goarch-lint:allow(interface-location) reason="shared with the mock generator"
//! ```
//!
//! A directive applies to findings on its own line and on the line after it.

use std::collections::HashSet;

const DIRECTIVE_PREFIX: &str = "goarch-lint:";

/// Result of checking for allow directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowCheck {
    /// Rule is not allowed.
    Denied,
    /// Rule is allowed with optional reason.
    Allowed {
        /// The reason provided (if any).
        reason: Option<String>,
    },
}

impl AllowCheck {
    /// Returns true if allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Returns the reason if allowed.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allowed { reason } => reason.as_deref(),
            Self::Denied => None,
        }
    }
}

/// Parsed allowance directive.
#[derive(Debug, Clone)]
pub struct AllowDirective {
    /// Rule names that are allowed.
    pub rules: HashSet<String>,
    /// Optional reason for the allowance.
    pub reason: Option<String>,
}

/// Checks whether `rule_name` is allowed on a 1-indexed line by a directive
/// on that line or the one before it.
#[must_use]
pub fn check_allow_with_reason(content: &str, line: usize, rule_name: &str) -> AllowCheck {
    let Some(current) = line.checked_sub(1) else {
        return AllowCheck::Denied;
    };
    let first = current.saturating_sub(1);

    for text in content.lines().skip(first).take(current - first + 1) {
        if let Some(directive) = parse_allow_directive(text) {
            if directive.rules.contains(rule_name) || directive.rules.contains("all") {
                return AllowCheck::Allowed {
                    reason: directive.reason,
                };
            }
        }
    }

    AllowCheck::Denied
}

/// Parses an allowance directive from a line, which may carry code before a
/// trailing `//` comment.
fn parse_allow_directive(line: &str) -> Option<AllowDirective> {
    let comment_start = line.find("//")?;
    let comment_content = line[comment_start + 2..].trim();

    let directive = comment_content.strip_prefix(DIRECTIVE_PREFIX)?.trim();
    let allow_content = directive.strip_prefix("allow(")?.trim();

    let paren_end = allow_content.find(')')?;
    let rules: HashSet<String> = allow_content[..paren_end]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if rules.is_empty() {
        return None;
    }

    let rest = allow_content[paren_end + 1..].trim();
    let reason = rest
        .strip_prefix("reason=")
        .map(str::trim)
        .and_then(|r| r.strip_prefix('"'))
        .and_then(|r| r.find('"').map(|end| r[..end].to_string()));

    Some(AllowDirective { rules, reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allow_directive() {
        let directive =
            parse_allow_directive("// goarch-lint:allow(style-limits)").expect("directive");
        assert!(directive.rules.contains("style-limits"));
        assert!(directive.reason.is_none());
    }

    #[test]
    fn test_parse_allow_directive_with_reason() {
        let directive = parse_allow_directive(
            "// goarch-lint:allow(interface-location) reason=\"generated mocks\"",
        )
        .expect("directive");
        assert!(directive.rules.contains("interface-location"));
        assert_eq!(directive.reason.as_deref(), Some("generated mocks"));
    }

    #[test]
    fn test_parse_multiple_rules() {
        let directive = parse_allow_directive("//goarch-lint: allow(rule1, rule2, rule3)")
            .expect("directive");
        assert_eq!(directive.rules.len(), 3);
        assert!(directive.rules.contains("rule2"));
    }

    #[test]
    fn test_trailing_comment() {
        let directive =
            parse_allow_directive("\tx := 1 // goarch-lint:allow(all)").expect("directive");
        assert!(directive.rules.contains("all"));
    }

    #[test]
    fn directive_covers_its_line_and_the_next() {
        let content = "func f() {\n\t// goarch-lint:allow(error-wrapping)\n\treturn err\n}";

        assert!(check_allow_with_reason(content, 2, "error-wrapping").is_allowed());
        assert!(check_allow_with_reason(content, 3, "error-wrapping").is_allowed());
        assert!(!check_allow_with_reason(content, 3, "other-rule").is_allowed());
        assert!(!check_allow_with_reason(content, 4, "error-wrapping").is_allowed());
    }

    #[test]
    fn test_check_allow_with_reason() {
        let content = "// goarch-lint:allow(all) reason=\"legacy file\"\ntype Thing interface{}\n";
        let result = check_allow_with_reason(content, 2, "interface-location");
        assert!(result.is_allowed());
        assert_eq!(result.reason(), Some("legacy file"));
    }

    #[test]
    fn test_check_allow_denied() {
        let result = check_allow_with_reason("func f() {\n\treturn err\n}", 2, "error-wrapping");
        assert!(!result.is_allowed());
        assert_eq!(result.reason(), None);
        assert!(!check_allow_with_reason("x", 0, "a").is_allowed());
    }
}
