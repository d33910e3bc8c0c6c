//! Prerequisite pass indexing nodes by kind.
//!
//! Runs first for every unit so that later rules can jump straight to the
//! nodes they care about instead of walking the whole tree again.

use goarch_lint_core::visit::walk;
use goarch_lint_core::{NodeId, NodeTag, Pass, Rule, RuleError};
use std::collections::HashMap;

/// Rule code for tree-index.
pub const CODE: &str = "GA000";

/// Rule name for tree-index.
pub const NAME: &str = "tree-index";

/// Node ids grouped by [`NodeTag`], each group in source order.
#[derive(Debug, Default)]
pub struct NodeIndex {
    by_tag: HashMap<NodeTag, Vec<NodeId>>,
}

impl NodeIndex {
    /// Ids of all nodes with the given tag.
    #[must_use]
    pub fn nodes(&self, tag: NodeTag) -> &[NodeId] {
        self.by_tag.get(&tag).map_or(&[], Vec::as_slice)
    }

    /// Total number of indexed nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_tag.values().map(Vec::len).sum()
    }

    /// Returns true if nothing was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

/// Publishes a [`NodeIndex`] for each unit.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeIndex;

impl TreeIndex {
    /// Creates the pass.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for TreeIndex {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Indexes syntax nodes by kind for later passes"
    }

    fn run(&self, pass: &mut Pass<'_>) -> Result<(), RuleError> {
        let mut index = NodeIndex::default();
        walk(pass.tree().root(), |node| {
            index
                .by_tag
                .entry(node.kind().tag())
                .or_default()
                .push(node.id());
            true
        });
        pass.set_result(index);
        Ok(())
    }
}
