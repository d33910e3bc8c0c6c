//! Rule enforcing structured, leveled and context-rich logging.
//!
//! # Detected Patterns
//!
//! A call whose name starts with `Log` or is one of `Error`, `Info`,
//! `Debug`, `Warn`, `Fatal` is a logging call. It is checked for:
//!
//! - key/value pairs after the message, with string literal keys
//! - a level name
//! - a string argument mentioning `ctx`, `context`, `correlation` or
//!   `request_id`
//! - no string argument mentioning a sensitive term
//!
//! Separately, a function that returns an error must log an error somewhere
//! in its body (a `.Error(...)` call, or a `.Log(...)` call with an error
//! argument). A return yields an error when a value is typed `error` or a
//! non-`nil` value fills a declared `error` result. Only returns of the
//! function itself count, not returns inside nested function literals.

use crate::decl_index::{self, Declarations};
use crate::tree_index::{self, NodeIndex};
use crate::util::{
    call_args, callee_name, field_types, is_selector_call, own_returns, string_value,
};
use goarch_lint_core::visit::find_all;
use goarch_lint_core::{
    Capabilities, NodeKind, NodeRef, NodeTag, Pass, Rule, RuleError, SemanticBridge, Severity,
};

/// Rule code for structured-logging.
pub const CODE: &str = "GA008";

/// Rule name for structured-logging.
pub const NAME: &str = "structured-logging";

const LEVELS: &[&str] = &["Error", "Info", "Debug", "Warn", "Fatal"];

const CONTEXT_KEYS: &[&str] = &["ctx", "context", "correlation", "request_id"];

const SENSITIVE_TERMS: &[&str] = &[
    "password",
    "token",
    "secret",
    "key",
    "auth",
    "credential",
    "private",
    "cert",
    "ssh",
];

/// Checks logging calls and error logging before returns.
#[derive(Debug, Clone)]
pub struct StructuredLogging {
    severity: Severity,
}

impl Default for StructuredLogging {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuredLogging {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Warning,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Logging calls have a log-like name and at least a message argument.
fn logging_call_name(call: NodeRef<'_>) -> Option<&str> {
    let name = callee_name(call)?;
    let is_logging = name.starts_with("Log") || LEVELS.contains(&name);
    (is_logging && !call_args(call).is_empty()).then_some(name)
}

/// `msg, "key", value, "key", value`.
fn is_structured(args: &[NodeRef<'_>]) -> bool {
    let Some((_, pairs)) = args.split_first() else {
        return false;
    };
    !pairs.is_empty()
        && pairs.len() % 2 == 0
        && pairs
            .chunks(2)
            .all(|pair| string_value(pair[0]).is_some())
}

fn mentions_any(args: &[NodeRef<'_>], terms: &[&str]) -> bool {
    args.iter().filter_map(|a| string_value(*a)).any(|s| {
        let lower = s.to_lowercase();
        terms.iter().any(|t| lower.contains(t))
    })
}

fn is_error_logging(call: NodeRef<'_>, semantics: &dyn SemanticBridge) -> bool {
    if !is_selector_call(call) {
        return false;
    }
    let args = call_args(call);
    match callee_name(call) {
        Some("Error") => !args.is_empty(),
        Some("Log") => args
            .iter()
            .any(|a| semantics.type_of(a.id()).is_some_and(|t| t.is_error())),
        _ => false,
    }
}

fn is_nil(expr: NodeRef<'_>) -> bool {
    expr.ident() == Some("nil")
}

/// True when some return of the function yields a non-nil error: either a
/// value typed `error`, or a non-`nil` value in a declared `error` result.
fn returns_error(func: NodeRef<'_>, body: NodeRef<'_>, semantics: &dyn SemanticBridge) -> bool {
    let declared = field_types(
        func.kind()
            .func_parts()
            .and_then(|p| p.results)
            .map(|r| func.get(r)),
    );
    let error_slots: Vec<usize> = declared
        .iter()
        .enumerate()
        .filter(|(_, ty)| {
            ty.text() == "error" || semantics.type_of(ty.id()).is_some_and(|t| t.is_error())
        })
        .map(|(i, _)| i)
        .collect();

    own_returns(body).into_iter().any(|ret| {
        let NodeKind::ReturnStmt { results } = ret.kind() else {
            return false;
        };
        let results: Vec<NodeRef<'_>> = results.iter().map(|r| ret.get(*r)).collect();
        let typed = results.iter().any(|r| {
            !is_nil(*r) && semantics.type_of(r.id()).is_some_and(|t| t.is_error())
        });
        let in_slot = match results.as_slice() {
            [] => false,
            [single] if declared.len() > 1 => !error_slots.is_empty() && !is_nil(*single),
            _ => error_slots
                .iter()
                .any(|&i| results.get(i).is_some_and(|r| !is_nil(*r))),
        };
        typed || in_slot
    })
}

impl StructuredLogging {
    fn check_call(&self, pass: &mut Pass<'_>, call: NodeRef<'_>) {
        let Some(name) = logging_call_name(call) else {
            return;
        };
        let args = call_args(call);
        let mut problems = Vec::new();

        if !is_structured(&args) {
            problems.push((
                "use structured logging",
                "Pass key/value pairs after the message, e.g. \"task_id\", id",
            ));
        }
        if !LEVELS.contains(&name) {
            problems.push((
                "use appropriate log level",
                "Use Debug, Info, Warn, Error or Fatal",
            ));
        }
        if !mentions_any(&args, CONTEXT_KEYS) {
            problems.push((
                "include relevant context",
                "Add a request_id or correlation id field",
            ));
        }
        if mentions_any(&args, SENSITIVE_TERMS) {
            problems.push((
                "avoid logging sensitive information",
                "Remove credentials and secrets from log fields",
            ));
        }

        for (message, help) in problems {
            let diagnostic = pass
                .diagnostic(call.span(), format!("{message} in `{name}` call"))
                .with_help(help);
            pass.report(diagnostic);
        }
    }
}

impl Rule for StructuredLogging {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires structured, leveled logging with context and error logging before returns"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::SEMANTIC
    }

    fn requires(&self) -> &[&'static str] {
        &[tree_index::NAME, decl_index::NAME]
    }

    fn run(&self, pass: &mut Pass<'_>) -> Result<(), RuleError> {
        let index = pass.result_of::<NodeIndex>(tree_index::NAME)?;
        let decls = pass.result_of::<Declarations>(decl_index::NAME)?;
        let tree = pass.tree();
        let semantics = pass.semantics();

        for &id in index.nodes(NodeTag::CallExpr) {
            self.check_call(pass, tree.node(id));
        }

        for info in &decls.funcs {
            let func = tree.node(info.node);
            let Some(body) = func.kind().func_parts().and_then(|p| p.body) else {
                continue;
            };
            let body = func.get(body);
            if !returns_error(func, body, semantics) {
                continue;
            }
            let logs = find_all(body, |n| {
                matches!(n.kind(), NodeKind::CallExpr { .. }) && is_error_logging(n, semantics)
            });
            if logs.is_empty() {
                let diagnostic = pass
                    .diagnostic(
                        func.span(),
                        format!("log errors before returning them in `{}`", info.name),
                    )
                    .with_help("Call logger.Error(...) before returning the error");
                pass.report(diagnostic);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::check;

    fn messages(src: &str) -> Vec<String> {
        check(StructuredLogging::new(), "svc.go", src)
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    fn call(body: &str) -> Vec<String> {
        messages(&format!("package svc\n\nfunc f() {{\n\t{body}\n}}\n"))
    }

    #[test]
    fn bare_error_message_is_unstructured_but_leveled() {
        let found = call("Error(\"something failed\")");
        assert!(found.contains(&"use structured logging in `Error` call".to_string()));
        assert!(!found.iter().any(|m| m.starts_with("use appropriate log level")));
    }

    #[test]
    fn structured_call_with_context_is_clean() {
        let found = call("logger.Info(\"task created\", \"request_id\", id, \"task\", t.ID)");
        assert!(found.is_empty(), "{found:?}");
    }

    #[test]
    fn log_prefixed_calls_need_a_level() {
        insta::assert_debug_snapshot!(call("LogMessage(\"saved\", \"ctx\", ctx)"), @r###"
        [
            "use appropriate log level in `LogMessage` call",
        ]
        "###);
    }

    #[test]
    fn odd_pairs_and_non_literal_keys_are_unstructured() {
        assert!(call("log.Warn(\"ctx\", \"a\")")[0].starts_with("use structured logging"));
        assert!(call("log.Warn(\"ctx\", key, v)")[0].starts_with("use structured logging"));
    }

    #[test]
    fn sensitive_terms_are_flagged() {
        let found = call("log.Info(\"login\", \"request_id\", id, \"password\", pw)");
        assert_eq!(found, ["avoid logging sensitive information in `Info` call"]);
    }

    #[test]
    fn zero_argument_error_calls_are_not_logging() {
        assert!(call("_ = err.Error()").is_empty());
    }

    #[test]
    fn error_returns_require_error_logging() {
        let src = r#"package svc

import "errors"

func Load() error {
	err := errors.New("boom")
	return err
}

func Save() error {
	err := errors.New("boom")
	logger.Error("save failed", "request_id", id, "err", err)
	return err
}

func Nil() error {
	return nil
}
"#;
        assert_eq!(messages(src), ["log errors before returning them in `Load`"]);
    }

    #[test]
    fn declared_error_results_count_for_untyped_calls() {
        let src = r#"package svc

func (s *Service) Save(t *Task) error {
	return s.repo.Save(t)
}

func Load(id string) (*Task, error) {
	t, err := fetch(id)
	if err != nil {
		return nil, wrapErr(err)
	}
	return t, nil
}

func Forward(id string) (*Task, error) {
	return fetch(id)
}

func Done() (*Task, error) {
	return nil, nil
}
"#;
        assert_eq!(
            messages(src),
            [
                "log errors before returning them in `Save`",
                "log errors before returning them in `Load`",
                "log errors before returning them in `Forward`",
            ]
        );
    }

    #[test]
    fn log_with_error_argument_counts() {
        let src = r#"package svc

func Load() (int, error) {
	n, err := read()
	if err != nil {
		logger.Log("context", err)
		return 0, err
	}
	return n, nil
}
"#;
        let found = messages(src);
        assert!(!found.iter().any(|m| m.starts_with("log errors")), "{found:?}");
    }
}
