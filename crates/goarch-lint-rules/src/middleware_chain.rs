//! Rule requiring middleware to keep the request context and call the next
//! handler.
//!
//! A declaration returning exactly one `http.Handler` or `http.HandlerFunc`
//! (any package qualifier) is middleware. Its body must contain a context-preserving call (name
//! containing `Context`) and a forwarding call (`ServeHTTP`, or a name
//! containing `Handle`). Both findings carry a fix.

use crate::decl_index::{self, Declarations};
use crate::util::{callee_names, field_types, own_returns};
use goarch_lint_core::{FixBuilder, NodeKind, NodeRef, Pass, Rule, RuleError, Severity};

/// Rule code for middleware-chain.
pub const CODE: &str = "GA002";

/// Rule name for middleware-chain.
pub const NAME: &str = "middleware-chain";

/// Checks that middleware forwards requests with their context.
#[derive(Debug, Clone)]
pub struct MiddlewareChain {
    severity: Severity,
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewareChain {
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

/// `Handler`, `HandlerFunc` or a qualified `pkg.Handler` / `pkg.HandlerFunc`.
/// Pointers and types merely named `...Handler` are not handlers.
fn is_handler_type(ty: NodeRef<'_>) -> bool {
    if matches!(ty.kind(), NodeKind::PointerType { .. }) {
        return false;
    }
    let name = ty.text().rsplit('.').next().unwrap_or_default();
    name == "Handler" || name == "HandlerFunc"
}

/// True for declarations returning exactly one handler.
fn is_middleware(func: NodeRef<'_>) -> bool {
    let Some(parts) = func.kind().func_parts() else {
        return false;
    };
    let results = field_types(parts.results.map(|r| func.get(r)));
    matches!(results.as_slice(), [only] if is_handler_type(*only))
}

/// Name of the wrapped handler parameter, `next` when none is declared.
fn next_handler(func: NodeRef<'_>) -> &str {
    let Some(parts) = func.kind().func_parts() else {
        return "next";
    };
    func.get(parts.params)
        .children()
        .find_map(|field| match field.kind() {
            NodeKind::Field { names, ty, .. } if is_handler_type(field.get(*ty)) => {
                names.first().and_then(|n| field.get(*n).ident())
            }
            _ => None,
        })
        .unwrap_or("next")
}

impl Rule for MiddlewareChain {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires middleware to preserve the request context and call the next handler"
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
        let file = pass.file();

        for info in &decls.funcs {
            let func = tree.node(info.node);
            if !is_middleware(func) {
                continue;
            }
            let Some(body) = func.kind().func_parts().and_then(|p| p.body) else {
                continue;
            };
            let body = func.get(body);
            let calls = callee_names(body);
            let indent = file.indent_at(func.span().start);

            if !calls.iter().any(|name| name.contains("Context")) {
                let fix = FixBuilder::new("Capture and reattach the request context")
                    .insert(
                        body.span().start + 1,
                        format!("\n{indent}\tctx := r.Context()\n{indent}\tr = r.WithContext(ctx)"),
                    )
                    .build()?;
                let diagnostic = pass
                    .diagnostic(
                        func.span(),
                        format!("middleware `{}` does not preserve the request context", info.name),
                    )
                    .with_fix(fix);
                pass.report(diagnostic);
            }

            let forwards = calls
                .iter()
                .any(|name| *name == "ServeHTTP" || name.contains("Handle"));
            if !forwards {
                let next = next_handler(func);
                let fix = match own_returns(body).last() {
                    Some(ret) => {
                        let at = ret.span().start;
                        let indent = file.indent_at(at);
                        FixBuilder::new(format!("Call {next}.ServeHTTP before returning"))
                            .insert(at, format!("{next}.ServeHTTP(w, r)\n{indent}"))
                    }
                    None => {
                        let at = body.span().end.saturating_sub(1);
                        FixBuilder::new(format!("Call {next}.ServeHTTP at the end of the body"))
                            .insert(at, format!("\t{next}.ServeHTTP(w, r)\n{}", file.indent_at(at)))
                    }
                }
                .build()?;
                let diagnostic = pass
                    .diagnostic(
                        func.span(),
                        format!("middleware `{}` does not call the next handler", info.name),
                    )
                    .with_fix(fix);
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
    use goarch_lint_core::apply_fix;

    const BARE: &str = "package mw\n\nfunc Logging(next http.Handler) http.Handler {\n\tlog.Println(\"x\")\n\treturn next\n}\n";

    #[test]
    fn reports_both_categories_with_fixes() {
        let found = check(MiddlewareChain::new(), "mw.go", BARE);
        let messages: Vec<&str> = found.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "middleware `Logging` does not preserve the request context",
                "middleware `Logging` does not call the next handler",
            ]
        );

        let with_context = apply_fix(BARE, &found[0].fixes[0]).expect("apply");
        assert_eq!(
            with_context,
            "package mw\n\nfunc Logging(next http.Handler) http.Handler {\n\tctx := r.Context()\n\tr = r.WithContext(ctx)\n\tlog.Println(\"x\")\n\treturn next\n}\n"
        );

        let forwarded = apply_fix(BARE, &found[1].fixes[0]).expect("apply");
        assert_eq!(
            forwarded,
            "package mw\n\nfunc Logging(next http.Handler) http.Handler {\n\tlog.Println(\"x\")\n\tnext.ServeHTTP(w, r)\n\treturn next\n}\n"
        );
    }

    #[test]
    fn forwarding_fix_without_return_goes_before_closing_brace() {
        let src = "package mw\n\nfunc Wrap(h http.HandlerFunc) http.HandlerFunc {\n\tr.Context()\n}\n";
        let found = check(MiddlewareChain::new(), "mw.go", src);
        assert_eq!(found.len(), 1);
        let fixed = apply_fix(src, &found[0].fixes[0]).expect("apply");
        assert_eq!(
            fixed,
            "package mw\n\nfunc Wrap(h http.HandlerFunc) http.HandlerFunc {\n\tr.Context()\n\th.ServeHTTP(w, r)\n}\n"
        );
    }

    #[test]
    fn complete_middleware_is_clean() {
        let src = r#"package mw

func Auth(next http.Handler) http.Handler {
	return http.HandlerFunc(func(w http.ResponseWriter, r *http.Request) {
		ctx := context.WithValue(r.Context(), key, "v")
		next.ServeHTTP(w, r.WithContext(ctx))
	})
}
"#;
        assert!(check(MiddlewareChain::new(), "mw.go", src).is_empty());
    }

    #[test]
    fn handler_constructors_are_not_middleware() {
        let src = r#"package handler

type TaskHandler struct{ svc Service }

func NewTaskHandler(svc Service) *TaskHandler { return &TaskHandler{svc: svc} }

func NewAdminHandler(svc Service) AdminHandler { return AdminHandler{svc} }
"#;
        assert!(check(MiddlewareChain::new(), "internal/handler/task.go", src).is_empty());
    }

    #[test]
    fn multiple_results_are_not_middleware() {
        let src = "package mw\n\nfunc Build() (http.Handler, error) { return nil, nil }\n";
        assert!(check(MiddlewareChain::new(), "mw.go", src).is_empty());
    }
}
