//! Rule registration and the pass dependency graph.

use crate::rule::{FnRule, Pass, Rule, RuleBox, RuleError};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// Invalid rule set, detected before any file is analyzed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Prerequisites form a cycle.
    #[error("dependency cycle between rules: {}", path.join(" -> "))]
    Cycle {
        /// Rule names along the cycle; the first name is repeated at the end.
        path: Vec<String>,
    },
    /// A rule requires a rule that is not registered.
    #[error("rule `{rule}` requires unknown rule `{dependency}`")]
    UnknownDependency {
        /// Requiring rule.
        rule: String,
        /// Missing prerequisite.
        dependency: String,
    },
    /// Two rules share a name.
    #[error("rule `{0}` is registered more than once")]
    DuplicateRule(String),
}

/// Explicit list of rules, in declaration order.
#[derive(Default)]
pub struct Registry {
    rules: Vec<RuleBox>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule.
    pub fn register<R: Rule + 'static>(&mut self, rule: R) -> &mut Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Registers a boxed rule.
    pub fn register_box(&mut self, rule: RuleBox) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Registers a rule given by name, documentation, prerequisites and a
    /// run function.
    pub fn register_fn<F>(
        &mut self,
        name: &'static str,
        code: &'static str,
        doc: &'static str,
        requires: &[&'static str],
        run: F,
    ) -> &mut Self
    where
        F: Fn(&mut Pass<'_>) -> Result<(), RuleError> + Send + Sync + 'static,
    {
        self.register(FnRule::new(name, code, doc, requires, run))
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rule is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registered rules in declaration order.
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(AsRef::as_ref)
    }

    /// Keeps only the named rules and, transitively, their prerequisites.
    ///
    /// Returns the requested names that matched no rule.
    pub fn retain_with_prerequisites<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        let by_name: HashMap<&str, &dyn Rule> =
            self.rules.iter().map(|r| (r.name(), r.as_ref())).collect();

        let mut unknown = Vec::new();
        let mut keep: HashSet<String> = HashSet::new();
        let mut pending: Vec<&str> = Vec::new();
        for name in names {
            let name = name.as_ref();
            if by_name.contains_key(name) {
                pending.push(name);
            } else {
                unknown.push(name.to_string());
            }
        }
        while let Some(name) = pending.pop() {
            if !keep.insert(name.to_string()) {
                continue;
            }
            if let Some(rule) = by_name.get(name) {
                pending.extend(rule.requires().iter().copied());
            }
        }

        self.rules.retain(|r| keep.contains(r.name()));
        unknown
    }

    /// Validates prerequisites and computes the schedule.
    ///
    /// # Errors
    ///
    /// Fails on duplicate names, unknown prerequisites and cycles.
    pub fn build(self) -> Result<PassGraph, GraphError> {
        let mut index: HashMap<&'static str, usize> = HashMap::new();
        for (i, rule) in self.rules.iter().enumerate() {
            if index.insert(rule.name(), i).is_some() {
                return Err(GraphError::DuplicateRule(rule.name().to_string()));
            }
        }

        let mut deps: Vec<Vec<usize>> = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let mut list = Vec::new();
            for dependency in rule.requires() {
                let Some(&d) = index.get(dependency) else {
                    return Err(GraphError::UnknownDependency {
                        rule: rule.name().to_string(),
                        dependency: (*dependency).to_string(),
                    });
                };
                list.push(d);
            }
            deps.push(list);
        }

        let order = topological_order(&deps).map_err(|remaining| GraphError::Cycle {
            path: find_cycle(&deps, &remaining)
                .into_iter()
                .map(|i| self.rules[i].name().to_string())
                .collect(),
        })?;

        debug!(
            "Pass schedule: {}",
            order
                .iter()
                .map(|&i| self.rules[i].name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(PassGraph {
            rules: self.rules,
            deps,
            order,
        })
    }
}

/// Kahn's algorithm, always taking the lowest ready declaration index.
/// On a cycle, returns the nodes that could not be scheduled.
fn topological_order(deps: &[Vec<usize>]) -> Result<Vec<usize>, Vec<bool>> {
    let n = deps.len();
    let mut indegree: Vec<usize> = deps.iter().map(Vec::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (rule, list) in deps.iter().enumerate() {
        for &d in list {
            dependents[d].push(rule);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
        .filter(|&i| indegree[i] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(next)) = ready.pop() {
        order.push(next);
        for &dependent in &dependents[next] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    if order.len() == n {
        Ok(order)
    } else {
        let mut remaining = vec![true; n];
        for &i in &order {
            remaining[i] = false;
        }
        Err(remaining)
    }
}

/// Follows unscheduled prerequisites from the lowest unscheduled rule until
/// a rule repeats. Every unscheduled rule has an unscheduled prerequisite.
fn find_cycle(deps: &[Vec<usize>], remaining: &[bool]) -> Vec<usize> {
    let Some(start) = remaining.iter().position(|r| *r) else {
        return Vec::new();
    };
    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(&next) = deps[current].iter().find(|&&d| remaining[d]) else {
            return path;
        };
        if let Some(pos) = path.iter().position(|&p| p == next) {
            let mut cycle = path.split_off(pos);
            cycle.push(next);
            return cycle;
        }
        path.push(next);
        current = next;
    }
}

/// A rule selected for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    /// Declaration index of the rule.
    pub index: usize,
    /// Runs only as a prerequisite; its diagnostics are discarded.
    pub silent: bool,
}

/// Validated rules plus their execution order.
pub struct PassGraph {
    rules: Vec<RuleBox>,
    deps: Vec<Vec<usize>>,
    order: Vec<usize>,
}

impl PassGraph {
    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the graph has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule at a declaration index.
    #[must_use]
    pub fn rule(&self, index: usize) -> &dyn Rule {
        self.rules[index].as_ref()
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(AsRef::as_ref)
    }

    /// Rules in execution order.
    pub fn ordered(&self) -> impl Iterator<Item = &dyn Rule> {
        self.order.iter().map(|&i| self.rules[i].as_ref())
    }

    /// Execution plan for the rules `enabled` selects.
    ///
    /// Disabled prerequisites of enabled rules still run, marked silent.
    pub fn schedule<F>(&self, enabled: F) -> Vec<Scheduled>
    where
        F: Fn(&str) -> bool,
    {
        let active: Vec<bool> = self.rules.iter().map(|r| enabled(r.name())).collect();
        let mut needed = active.clone();
        let mut pending: Vec<usize> = (0..self.rules.len()).filter(|&i| active[i]).collect();
        while let Some(i) = pending.pop() {
            for &d in &self.deps[i] {
                if !needed[d] {
                    needed[d] = true;
                    pending.push(d);
                }
            }
        }

        self.order
            .iter()
            .filter(|&&i| needed[i])
            .map(|&i| Scheduled {
                index: i,
                silent: !active[i],
            })
            .collect()
    }
}

impl std::fmt::Debug for PassGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.ordered().map(|r| r.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(registry: &mut Registry, name: &'static str, requires: &[&'static str]) {
        registry.register_fn(name, "T000", "", requires, |_| Ok(()));
    }

    fn names(graph: &PassGraph) -> Vec<&'static str> {
        graph.ordered().map(|r| r.name()).collect()
    }

    #[test]
    fn ties_follow_declaration_order() {
        let mut registry = Registry::new();
        noop(&mut registry, "c", &[]);
        noop(&mut registry, "a", &["index"]);
        noop(&mut registry, "index", &[]);
        noop(&mut registry, "b", &[]);

        let graph = registry.build().expect("graph");
        assert_eq!(names(&graph), ["c", "index", "a", "b"]);
    }

    #[test]
    fn layered_schedule() {
        let mut registry = Registry::new();
        noop(&mut registry, "report", &["decls", "types"]);
        noop(&mut registry, "types", &["index"]);
        noop(&mut registry, "decls", &["index"]);
        noop(&mut registry, "index", &[]);

        insta::assert_debug_snapshot!(registry.build().expect("graph"), @r###"
        [
            "index",
            "types",
            "decls",
            "report",
        ]
        "###);
    }

    #[test]
    fn detects_cycles() {
        let mut registry = Registry::new();
        noop(&mut registry, "free", &[]);
        noop(&mut registry, "a", &["b"]);
        noop(&mut registry, "b", &["c"]);
        noop(&mut registry, "c", &["a"]);

        let err = registry.build().expect_err("cycle");
        assert_eq!(
            err,
            GraphError::Cycle {
                path: vec!["a".into(), "b".into(), "c".into(), "a".into()]
            }
        );
        assert_eq!(
            err.to_string(),
            "dependency cycle between rules: a -> b -> c -> a"
        );
    }

    #[test]
    fn detects_self_cycle() {
        let mut registry = Registry::new();
        noop(&mut registry, "a", &["a"]);
        assert!(matches!(registry.build(), Err(GraphError::Cycle { .. })));
    }

    #[test]
    fn detects_unknown_dependency() {
        let mut registry = Registry::new();
        noop(&mut registry, "a", &["missing"]);
        assert_eq!(
            registry.build().expect_err("unknown"),
            GraphError::UnknownDependency {
                rule: "a".into(),
                dependency: "missing".into()
            }
        );
    }

    #[test]
    fn detects_duplicates() {
        let mut registry = Registry::new();
        noop(&mut registry, "a", &[]);
        noop(&mut registry, "a", &[]);
        assert_eq!(
            registry.build().expect_err("duplicate"),
            GraphError::DuplicateRule("a".into())
        );
    }

    #[test]
    fn schedule_runs_disabled_prerequisites_silently() {
        let mut registry = Registry::new();
        noop(&mut registry, "index", &[]);
        noop(&mut registry, "decls", &["index"]);
        noop(&mut registry, "rule", &["decls"]);
        noop(&mut registry, "other", &[]);
        let graph = registry.build().expect("graph");

        let plan = graph.schedule(|name| name == "rule");
        assert_eq!(
            plan,
            [
                Scheduled { index: 0, silent: true },
                Scheduled { index: 1, silent: true },
                Scheduled { index: 2, silent: false },
            ]
        );
    }

    #[test]
    fn retain_keeps_prerequisites() {
        let mut registry = Registry::new();
        noop(&mut registry, "index", &[]);
        noop(&mut registry, "decls", &["index"]);
        noop(&mut registry, "rule", &["decls"]);
        noop(&mut registry, "other", &[]);

        let unknown = registry.retain_with_prerequisites(&["rule", "nope"]);
        assert_eq!(unknown, ["nope"]);
        let kept: Vec<&str> = registry.rules().map(Rule::name).collect();
        assert_eq!(kept, ["index", "decls", "rule"]);
    }
}
