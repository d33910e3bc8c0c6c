//! The [`Frontend`] implementation for Go sources.

use crate::parser::GoParser;
use crate::resolver::{receiver_methods, Resolver};
use goarch_lint_core::{
    CompilationUnit, Frontend, FrontendError, Method, NodeKind, SourceFile, SyntaxTree,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Receiver methods declared by one file on disk.
#[derive(Debug)]
struct FileMethods {
    path: PathBuf,
    test: bool,
    methods: Vec<(String, Method)>,
}

/// Loads `.go` files into compilation units with resolved facts.
///
/// Method sets are package-wide: receiver methods declared in the other
/// `.go` files of a unit's directory are merged into its facts. Test files
/// only contribute to test units.
#[derive(Default)]
pub struct GoFrontend {
    parser: GoParser,
    module: Option<String>,
    isolated: bool,
    packages: Mutex<HashMap<PathBuf, Arc<Vec<FileMethods>>>>,
}

impl GoFrontend {
    /// Creates a front-end without a module prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the module import path (`github.com/acme/todo`).
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Treats every loaded file as a whole package; nothing else is read
    /// from disk.
    #[must_use]
    pub fn isolated(mut self) -> Self {
        self.isolated = true;
        self
    }

    /// Creates a front-end whose module is read from `root/go.mod`, if any.
    #[must_use]
    pub fn detect(root: &Path) -> Self {
        match read_module(root) {
            Some(module) => {
                tracing::debug!("Detected Go module {module}");
                Self::new().with_module(module)
            }
            None => Self::new(),
        }
    }

    /// Module import path.
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    fn package_path(&self, tree: &SyntaxTree) -> Option<String> {
        let dir = tree
            .file()
            .relative_path()
            .parent()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        match (&self.module, dir.is_empty()) {
            (Some(module), true) => Some(module.clone()),
            (Some(module), false) => Some(format!("{module}/{dir}")),
            (None, false) => Some(dir),
            (None, true) => tree.root().children().find_map(|c| match c.kind() {
                NodeKind::PackageClause { name } => Some(name.clone()),
                _ => None,
            }),
        }
    }

    /// Methods declared on disk next to `file`, excluding `file` itself.
    fn sibling_methods(&self, file: &SourceFile) -> Vec<(String, Method)> {
        if self.isolated {
            return Vec::new();
        }
        let Some(dir) = file.path().parent().filter(|d| d.is_dir()) else {
            return Vec::new();
        };
        let cached = self
            .packages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(dir)
            .cloned();
        let package = match cached {
            Some(package) => package,
            None => {
                let scanned = Arc::new(self.scan_package(dir));
                self.packages
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entry(dir.to_path_buf())
                    .or_insert(scanned)
                    .clone()
            }
        };
        package
            .iter()
            .filter(|f| f.path != file.path() && (file.is_test() || !f.test))
            .flat_map(|f| f.methods.iter().cloned())
            .collect()
    }

    fn scan_package(&self, dir: &Path) -> Vec<FileMethods> {
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "go"))
            .collect();
        paths.sort();

        let mut files = Vec::new();
        for path in paths {
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            match self.parser.parse(SourceFile::new(&path, content, dir)) {
                Ok(tree) => files.push(FileMethods {
                    test: tree.file().is_test(),
                    methods: receiver_methods(&tree),
                    path,
                }),
                Err(e) => tracing::debug!("Skipping methods of {}: {e}", path.display()),
            }
        }
        tracing::debug!("Scanned {} package file(s) in {}", files.len(), dir.display());
        files
    }
}

impl Frontend for GoFrontend {
    fn language_id(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".go"]
    }

    fn load(&self, file: SourceFile) -> Result<CompilationUnit, FrontendError> {
        let tree = self.parser.parse(file)?;
        let package = self.package_path(&tree);
        let siblings = self.sibling_methods(tree.file());
        let facts = Resolver::new(&tree, package)
            .with_package_methods(&siblings)
            .resolve();

        let unit = CompilationUnit::new(tree, facts);
        Ok(match &self.module {
            Some(module) => unit.with_module(module.clone()),
            None => unit,
        })
    }
}

/// Reads the `module` directive of a `go.mod` file.
fn read_module(root: &Path) -> Option<String> {
    let content = fs::read_to_string(root.join("go.mod")).ok()?;
    parse_module_line(&content)
}

fn parse_module_line(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let module = rest.split("//").next()?.trim().trim_matches('"');
        (!module.is_empty()).then(|| module.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use goarch_lint_core::{ReceiverKind, Type};
    use tempfile::TempDir;

    #[test]
    fn parses_module_directive() {
        let gomod = "// comment\nmodule github.com/acme/todo // app\n\ngo 1.22\n";
        assert_eq!(
            parse_module_line(gomod).as_deref(),
            Some("github.com/acme/todo")
        );
        assert_eq!(parse_module_line("modules x\n"), None);
        assert_eq!(parse_module_line("go 1.22\n"), None);
    }

    #[test]
    fn detects_module_from_go_mod() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("go.mod"), "module example.com/app\n").expect("write");
        assert_eq!(
            GoFrontend::detect(dir.path()).module(),
            Some("example.com/app")
        );

        let empty = TempDir::new().expect("tempdir");
        assert_eq!(GoFrontend::detect(empty.path()).module(), None);
    }

    #[test]
    fn unit_package_follows_directory() {
        let root = PathBuf::from("/repo");
        let file = SourceFile::new(
            &root.join("internal/domain/task.go"),
            "package domain\n",
            &root,
        );
        let unit = GoFrontend::new()
            .with_module("example.com/app")
            .load(file)
            .expect("unit");
        assert_eq!(unit.package_path(), Some("example.com/app/internal/domain"));
        assert_eq!(unit.module(), Some("example.com/app"));
        assert_eq!(
            unit.semantics().package_path(unit.tree().root().id()),
            Some("example.com/app/internal/domain")
        );
    }

    #[test]
    fn syntax_errors_surface() {
        let root = PathBuf::from("/repo");
        let file = SourceFile::new(&root.join("x.go"), "package x\nfunc {\n", &root);
        assert!(matches!(
            GoFrontend::new().load(file),
            Err(FrontendError::Syntax { .. })
        ));
    }

    #[test]
    fn method_sets_span_the_package_directory() {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path();
        let domain = root.join("internal/domain");
        fs::create_dir_all(&domain).expect("mkdir");
        fs::write(
            domain.join("validate.go"),
            "package domain\n\nfunc (t *Task) Validate() error { return nil }\n",
        )
        .expect("write");
        fs::write(
            domain.join("task_test.go"),
            "package domain\n\nfunc (t Task) Fixture() Task { return t }\n",
        )
        .expect("write");
        fs::write(domain.join("broken.go"), "package domain\nfunc {\n").expect("write");

        let task_src = "package domain\n\ntype Task struct{ ID int64 }\n";
        let unit = GoFrontend::new()
            .with_module("example.com/app")
            .load(SourceFile::new(&domain.join("task.go"), task_src, root))
            .expect("unit");

        let task = Type::named(Some("example.com/app/internal/domain"), "Task");
        let set = unit.semantics().method_set(&task).expect("method set");
        assert_eq!(
            set.get("Validate").map(|m| m.receiver),
            Some(ReceiverKind::Pointer)
        );
        assert!(!set.contains("Fixture"));

        let alone = GoFrontend::new()
            .with_module("example.com/app")
            .isolated()
            .load(SourceFile::new(&domain.join("task.go"), task_src, root))
            .expect("unit");
        assert!(alone
            .semantics()
            .method_set(&task)
            .is_some_and(|set| set.is_empty()));
    }
}
