//! Rule requiring HTTP handlers to validate, handle errors and use context.
//!
//! # Rationale
//!
//! Handlers are the edge of the application. A handler that never validates
//! its input, never reports errors, or ignores the request context tends to
//! leak bad data and goroutines into the layers below it.
//!
//! # Detected Patterns
//!
//! A declaration with no results and exactly two parameters, a
//! `...ResponseWriter` and a `*...Request`, is a handler. Its whole body is
//! searched for calls whose name contains:
//!
//! - `Validate` or `Decode` (validation)
//! - `Error` or `WriteError` (error handling)
//! - `Context` or `WithValue` (context usage)
//!
//! Each missing category is reported once at the declaration.

use crate::decl_index::{self, Declarations};
use crate::util::{callee_names, field_count, field_types};
use goarch_lint_core::{NodeKind, NodeRef, Pass, Rule, RuleError, Severity};

/// Rule code for api-handler.
pub const CODE: &str = "GA001";

/// Rule name for api-handler.
pub const NAME: &str = "api-handler";

const CHECKS: &[(&[&str], &str, &str)] = &[
    (
        &["Validate", "Decode"],
        "does not validate its input",
        "Decode and validate the request before using it",
    ),
    (
        &["Error", "WriteError"],
        "does not handle errors",
        "Report failures to the client, e.g. with http.Error",
    ),
    (
        &["Context", "WithValue"],
        "does not use the request context",
        "Pass r.Context() to downstream calls",
    ),
];

/// Checks the shape of HTTP handler bodies.
#[derive(Debug, Clone)]
pub struct ApiHandler {
    severity: Severity,
}

impl Default for ApiHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiHandler {
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

/// True for `(w ...ResponseWriter, r *...Request)` with no results.
pub(crate) fn is_handler(func: NodeRef<'_>) -> bool {
    let Some(parts) = func.kind().func_parts() else {
        return false;
    };
    if field_count(parts.results.map(|r| func.get(r))) != 0 {
        return false;
    }
    let params = field_types(Some(func.get(parts.params)));
    let [sink, request] = params.as_slice() else {
        return false;
    };
    let is_request = match request.kind() {
        NodeKind::PointerType { elem } => request.get(*elem).text().ends_with("Request"),
        _ => false,
    };
    sink.text().ends_with("ResponseWriter") && is_request
}

impl Rule for ApiHandler {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires handlers to validate input, handle errors and use the request context"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn requires(&self) -> &[&'static str] {
        &[decl_index::NAME]
    }

    fn run(&self, pass: &mut Pass<'_>) -> Result<(), RuleError> {
        let decls = pass.result_of::<Declarations>(decl_index::NAME)?;
        let tree = pass.tree();

        for info in &decls.funcs {
            let func = tree.node(info.node);
            if !is_handler(func) {
                continue;
            }
            let Some(body) = func.kind().func_parts().and_then(|p| p.body) else {
                continue;
            };
            let calls = callee_names(func.get(body));

            for (patterns, problem, help) in CHECKS {
                let found = calls
                    .iter()
                    .any(|name| patterns.iter().any(|p| name.contains(p)));
                if !found {
                    let diagnostic = pass
                        .diagnostic(func.span(), format!("handler `{}` {problem}", info.name))
                        .with_help(*help);
                    pass.report(diagnostic);
                }
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
        check(ApiHandler::new(), "handler.go", src)
            .into_iter()
            .map(|d| format!("{}:{} {}", d.location.line, d.location.column, d.message))
            .collect()
    }

    #[test]
    fn empty_handler_reports_three_in_order() {
        let found = messages(
            "package api\n\nimport \"net/http\"\n\nfunc GetTask(w http.ResponseWriter, r *http.Request) {\n}\n",
        );
        insta::assert_debug_snapshot!(found, @r###"
        [
            "5:1 handler `GetTask` does not validate its input",
            "5:1 handler `GetTask` does not handle errors",
            "5:1 handler `GetTask` does not use the request context",
        ]
        "###);
    }

    #[test]
    fn complete_handler_is_clean() {
        let found = messages(
            r#"package api

import "net/http"

func (h *Handler) Create(w http.ResponseWriter, r *http.Request) {
	var req CreateRequest
	if err := json.NewDecoder(r.Body).Decode(&req); err != nil {
		http.Error(w, err.Error(), http.StatusBadRequest)
		return
	}
	if err := h.svc.Create(r.Context(), req); err != nil {
		writeError(w, err)
	}
}
"#,
        );
        assert!(found.is_empty(), "{found:?}");
    }

    #[test]
    fn nested_calls_count() {
        let found = messages(
            r#"package api

func Get(w http.ResponseWriter, r *http.Request) {
	if ok {
		for {
			ctx := r.Context()
			ValidateID(ctx)
		}
	}
}
"#,
        );
        assert_eq!(found, ["3:1 handler `Get` does not handle errors"]);
    }

    #[test]
    fn other_shapes_are_not_handlers() {
        let found = messages(
            r#"package api

func Get(w http.ResponseWriter, r http.Request) {}
func List(w http.ResponseWriter, r *http.Request) error { return nil }
func Delete(w http.ResponseWriter, r *http.Request, id int) {}
"#,
        );
        assert!(found.is_empty());
    }
}
