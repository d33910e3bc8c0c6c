//! End-to-end scenarios over the recommended preset.

use goarch_lint::rules::{registry, Preset, TreeIndex};
use goarch_lint::{
    apply_fix, lint_project, lint_source, lint_source_with, Analyzer, CompilationUnit, Config,
    Diagnostic, DiagnosticKind, Frontend, GoFrontend, Registry, RuleError, SourceFile,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const MODULE: &str = "example.com/todo";

fn lint(path: &str, src: &str) -> Vec<Diagnostic> {
    lint_source(path, src, Some(MODULE)).expect("valid Go")
}

fn of_rule<'d>(diagnostics: &'d [Diagnostic], rule: &str) -> Vec<&'d Diagnostic> {
    diagnostics.iter().filter(|d| d.rule == rule).collect()
}

const SERVICE: &str = r#"package http

import (
	"net/http"

	"example.com/todo/internal/domain"
	"github.com/pkg/errors"
)

type TaskStore interface {
	Get(id string) (*domain.Task, error)
}

func GetTask(w http.ResponseWriter, r *http.Request) {
}

func Logging(next http.Handler) http.Handler {
	return http.HandlerFunc(func(w http.ResponseWriter, r *http.Request) {
		next.ServeHTTP(w, r)
	})
}

func load(s TaskStore, id string) (*domain.Task, error) {
	t, err := s.Get(id)
	if err != nil {
		return nil, err
	}
	return t, errors.Wrap(err, "load")
}

func rename(t *domain.Task) {
	t.Content = "x"
}
"#;

#[test]
fn analysis_is_deterministic() {
    let first = lint("internal/http/service.go", SERVICE);
    let second = lint("internal/http/service.go", SERVICE);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn fixes_are_well_formed() {
    let diagnostics = lint("internal/http/service.go", SERVICE);
    let fixes: Vec<_> = diagnostics.iter().flat_map(|d| &d.fixes).collect();
    assert!(!fixes.is_empty());
    for fix in fixes {
        for pair in fix.edits().windows(2) {
            assert!(pair[0].end <= pair[1].start, "{}", fix.description);
        }
        let fixed = apply_fix(SERVICE, fix).expect("fix applies");
        assert_ne!(fixed, SERVICE);
    }
}

#[test]
fn interface_location_depends_on_file_name() {
    let src = "package store\n\ntype Reader interface{ Read() }\n\ntype Writer interface{ Write() }\n";
    assert!(of_rule(&lint("internal/store/interfaces.go", src), "interface-location").is_empty());
    assert_eq!(
        of_rule(&lint("internal/store/store.go", src), "interface-location").len(),
        2
    );
}

fn wide_struct(fields: usize) -> String {
    let mut src = String::from("package domain\n\ntype Wide struct {\n");
    for i in 0..fields {
        src.push_str(&format!("\tField{i} int\n"));
    }
    src.push_str("}\n");
    src
}

#[test]
fn struct_field_limit() {
    let count = |n| {
        lint("internal/domain/wide.go", &wide_struct(n))
            .into_iter()
            .filter(|d| d.message.starts_with("struct `Wide` has"))
            .count()
    };
    assert_eq!(count(10), 0);
    assert_eq!(count(11), 1);
}

#[test]
fn task_content_is_renamed_to_title() {
    let src = "package domain\n\ntype Task struct{ Title string }\n\nfunc newTask() Task {\n\treturn Task{Content: \"buy milk\"}\n}\n";
    let diagnostics = lint("internal/domain/task.go", src);
    let renames = of_rule(&diagnostics, "task-fields");
    assert_eq!(renames.len(), 1);
    let edits = renames[0].fixes[0].edits();
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].replacement, "Title");
    assert_eq!(&src[edits[0].start..edits[0].end], "Content");
}

#[test]
fn empty_handler_reports_three_problems_in_order() {
    let diagnostics = lint("internal/http/service.go", SERVICE);
    let handler: Vec<_> = of_rule(&diagnostics, "api-handler")
        .into_iter()
        .map(|d| (d.location.line, d.location.column, d.message.as_str()))
        .collect();
    assert_eq!(
        handler,
        [
            (14, 1, "handler `GetTask` does not validate its input"),
            (14, 1, "handler `GetTask` does not handle errors"),
            (14, 1, "handler `GetTask` does not use the request context"),
        ]
    );
}

#[test]
fn bare_error_log_is_unstructured_but_leveled() {
    let src = "package svc\n\nfunc f() {\n\tError(\"something failed\")\n}\n";
    let messages: Vec<_> = of_rule(&lint("internal/svc/svc.go", src), "structured-logging")
        .into_iter()
        .map(|d| d.message.clone())
        .collect();
    assert!(messages.iter().any(|m| m.contains("structured logging")));
    assert!(!messages.iter().any(|m| m.contains("appropriate log level")));
}

#[test]
fn service_snapshot() {
    let lines: Vec<String> = lint("internal/http/service.go", SERVICE)
        .iter()
        .filter(|d| d.rule != "structured-logging")
        .map(ToString::to_string)
        .collect();
    insta::assert_debug_snapshot!(lines, @r###"
    [
        "internal/http/service.go:14:1: warning [GA001] handler `GetTask` does not validate its input",
        "internal/http/service.go:14:1: warning [GA001] handler `GetTask` does not handle errors",
        "internal/http/service.go:14:1: warning [GA001] handler `GetTask` does not use the request context",
        "internal/http/service.go:17:1: warning [GA002] middleware `Logging` does not preserve the request context",
        "internal/http/service.go:10:6: warning [GA004] interface name `TaskStore` should end in \"er\" or \"Service\"",
        "internal/http/service.go:10:6: warning [GA005] storage type `TaskStore` does not use domain error wrapping",
        "internal/http/service.go:10:6: warning [GA005] storage type `TaskStore` does not support transactions (missing `BeginTx`)",
        "internal/http/service.go:26:15: warning [GA006] error `err` is returned without wrapping",
        "internal/http/service.go:10:6: warning [GA007] interface `TaskStore` should be declared in an interfaces.go file",
        "internal/http/service.go:32:4: warning [GA009] task field `Content` should be named `Title`",
        "internal/http/service.go:7:2: warning [GA010] third-party import \"github.com/pkg/errors\" should come before internal imports",
        "internal/http/service.go:10:6: warning [GA010] interface name `TaskStore` should end in \"er\" or \"Service\"",
    ]
    "###);
}

#[test]
fn allow_comment_suppresses_one_rule() {
    let src = "package store\n\n// goarch-lint:allow(interface-location) reason=\"mock\"\ntype Reader interface{ Read() }\n";
    let diagnostics = lint("internal/store/store.go", src);
    assert!(of_rule(&diagnostics, "interface-location").is_empty());

    let src = src.replace("interface-location", "style-limits");
    assert_eq!(
        of_rule(&lint("internal/store/store.go", &src), "interface-location").len(),
        1
    );
}

#[test]
fn severity_override_and_disabled_rules() {
    let config = Config::parse(
        r#"
[rules.interface-location]
severity = "error"

[rules.interface-contract]
enabled = false

[rules.style-limits]
enabled = false
"#,
    )
    .expect("config");
    let src = "package store\n\ntype Tasks interface{ A() }\n";
    let diagnostics =
        lint_source_with("internal/store/store.go", src, Some(MODULE), config).expect("lint");
    let rules: Vec<_> = diagnostics.iter().map(|d| (d.rule.as_str(), d.severity)).collect();
    assert_eq!(rules, [("interface-location", goarch_lint::Severity::Error)]);
}

#[test]
fn rule_faults_do_not_stop_later_rules() {
    let mut registry = registry(Preset::Minimal.rules());
    registry.register_fn("exploding", "T999", "always panics", &[], |_| {
        panic!("boom");
    });
    registry.register_fn("failing", "T998", "always fails", &[], |_| {
        Err(RuleError::Failed("no luck".to_string()))
    });
    let analyzer = Analyzer::builder()
        .root("/")
        .registry(registry)
        .build()
        .expect("analyzer");

    let root = Path::new("/");
    let unit: CompilationUnit = GoFrontend::new()
        .load(SourceFile::new(
            &root.join("store.go"),
            "package store\n\ntype Reader interface{ Read() }\n",
            root,
        ))
        .expect("unit");
    let diagnostics = analyzer.run_unit(&unit);

    let faults: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::RuleFault)
        .map(|d| d.rule.as_str())
        .collect();
    assert_eq!(faults, ["exploding", "failing"]);
    assert_eq!(of_rule(&diagnostics, "interface-location").len(), 1);
}

#[test]
fn bad_graphs_fail_before_analysis() {
    let mut cyclic = Registry::new();
    cyclic.register_fn("a", "T1", "", &["b"], |_| Ok(()));
    cyclic.register_fn("b", "T2", "", &["a"], |_| Ok(()));
    assert!(Analyzer::builder().registry(cyclic).build().is_err());

    let mut dangling = Registry::new();
    dangling.register(TreeIndex::new());
    dangling.register_fn("a", "T1", "", &["missing"], |_| Ok(()));
    assert!(Analyzer::builder().registry(dangling).build().is_err());
}

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, content).expect("write");
}

#[test]
fn project_run_uses_config_and_go_mod() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    write(root, "go.mod", "module example.com/todo\n\ngo 1.22\n");
    write(root, "goarch-lint.toml", "preset = \"minimal\"\n[rules.style-limits]\nmax_fields = 1\n");
    write(
        root,
        "internal/domain/task.go",
        "package domain\n\ntype Task struct {\n\tID    string\n\tTitle string\n}\n",
    );
    write(root, "internal/store/store.go", "package store\n\ntype Reader interface{ Read() }\n");
    write(root, "internal/store/interfaces.go", "package store\n\ntype Writer interface{ Write() }\n");
    write(root, "internal/store/broken.go", "package store\nfunc {\n");

    let result = lint_project(root).expect("lint");
    assert_eq!(result.files_checked, 3);
    assert_eq!(result.files_failed, 1);

    let found: Vec<_> = result
        .diagnostics
        .iter()
        .map(|d| (d.location.file.to_string_lossy().into_owned(), d.code.as_str()))
        .collect();
    assert_eq!(
        found,
        [
            ("internal/domain/task.go".to_string(), "GA010"),
            ("internal/store/store.go".to_string(), "GA007"),
        ]
    );
    assert!(result.has_findings());
}

#[test]
fn methods_in_sibling_files_satisfy_package_rules() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    write(root, "go.mod", "module example.com/todo\n");
    write(root, "goarch-lint.toml", "preset = \"architecture\"\n");
    write(
        root,
        "internal/domain/task.go",
        "package domain\n\ntype Task struct {\n\tID        int64\n\tCreatedAt int64\n}\n",
    );
    write(
        root,
        "internal/domain/validate.go",
        "package domain\n\nfunc (t *Task) Validate() error { return nil }\n",
    );
    write(
        root,
        "internal/storage/store.go",
        "package storage\n\ntype TaskStore struct {\n\tdb   *sql.DB\n\tfail domain.Error\n}\n",
    );
    write(
        root,
        "internal/storage/tx.go",
        "package storage\n\nfunc (s *TaskStore) BeginTx() error { return nil }\n",
    );

    let result = lint_project(root).expect("lint");
    assert_eq!(result.files_checked, 4);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

    fs::remove_file(root.join("internal/domain/validate.go")).expect("remove");
    let result = lint_project(root).expect("lint");
    let found: Vec<_> = result.diagnostics.iter().map(ToString::to_string).collect();
    assert_eq!(
        found,
        ["internal/domain/task.go:3:6: warning [GA003] domain type `Task` must have a pointer-receiver `Validate` method"]
    );
}
