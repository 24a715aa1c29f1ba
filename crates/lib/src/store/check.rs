//! Integrity checking and repair.
//!
//! Paths are the source of truth. `depth` and `numchild` are derived from
//! them and can be recomputed; paths themselves are never rewritten here.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::{
    Result,
    backend::{TreeTxn, TxnMode},
    node::{Node, NodeId},
    path::PathCodec,
};

use super::TreeStore;

/// Nodes that break a tree invariant, grouped by problem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeProblems {
    /// Paths using characters outside the alphabet.
    pub bad_alphabet: Vec<NodeId>,
    /// Paths whose length is not a whole number of segments.
    pub bad_length: Vec<NodeId>,
    /// Nodes whose parent path has no row.
    pub orphans: Vec<NodeId>,
    /// Nodes whose depth disagrees with their path.
    pub wrong_depth: Vec<NodeId>,
    /// Nodes whose numchild disagrees with the number of child rows.
    pub wrong_numchild: Vec<NodeId>,
}

impl TreeProblems {
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Number of reported problems. A node can be counted more than once.
    pub fn total(&self) -> usize {
        self.bad_alphabet.len()
            + self.bad_length.len()
            + self.orphans.len()
            + self.wrong_depth.len()
            + self.wrong_numchild.len()
    }
}

/// Outcome of [`TreeStore::fix_tree`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub depth_fixed: usize,
    pub numchild_fixed: usize,
    /// Problems repair does not touch: malformed paths and orphans.
    pub remaining: TreeProblems,
}

#[derive(Debug, Default)]
struct Analysis {
    problems: TreeProblems,
    depth_fixes: Vec<(NodeId, usize)>,
    numchild_fixes: Vec<(NodeId, u64)>,
}

fn analyze(codec: &PathCodec, nodes: &[Node]) -> Analysis {
    let mut analysis = Analysis::default();
    let alphabet = codec.alphabet().as_bytes();

    let mut well_formed = Vec::with_capacity(nodes.len());
    for node in nodes {
        let path = node.path();
        if !path.bytes().all(|b| alphabet.contains(&b)) {
            analysis.problems.bad_alphabet.push(node.id());
        } else if path.is_empty() || path.len() % codec.steplen() != 0 {
            analysis.problems.bad_length.push(node.id());
        } else {
            well_formed.push(node);
        }
    }

    let paths: HashSet<&str> = well_formed.iter().map(|n| n.path()).collect();
    let mut children: HashMap<&str, u64> = HashMap::new();
    for node in &well_formed {
        if codec.depth_of(node.path()) > 1 {
            *children.entry(codec.parent_path(node.path())).or_default() += 1;
        }
    }

    for node in well_formed {
        let depth = codec.depth_of(node.path());
        if depth != node.depth() {
            analysis.problems.wrong_depth.push(node.id());
            analysis.depth_fixes.push((node.id(), depth));
        }
        if depth > 1 && !paths.contains(codec.parent_path(node.path())) {
            analysis.problems.orphans.push(node.id());
        }
        let numchild = children.get(node.path()).copied().unwrap_or(0);
        if numchild != node.numchild() {
            analysis.problems.wrong_numchild.push(node.id());
            analysis.numchild_fixes.push((node.id(), numchild));
        }
    }
    analysis
}

impl TreeStore {
    /// Scan the whole tree for invariant violations.
    pub async fn find_problems(&self) -> Result<TreeProblems> {
        let nodes = self.get_tree(None).await?;
        let problems = analyze(self.codec(), &nodes).problems;
        if !problems.is_empty() {
            tracing::warn!(
                tree = %self.name(),
                problems = problems.total(),
                "Tree integrity problems found"
            );
        }
        Ok(problems)
    }

    /// Recompute `depth` and `numchild` from the stored paths.
    ///
    /// Malformed paths and orphans are reported in
    /// [`RepairReport::remaining`] and left alone.
    pub async fn fix_tree(&self) -> Result<RepairReport> {
        let mut txn = self.begin(TxnMode::Write).await?;
        let result = self.fix_tree_in(txn.as_mut()).await;
        self.finish(txn, result).await
    }

    async fn fix_tree_in(&self, txn: &mut dyn TreeTxn) -> Result<RepairReport> {
        let nodes = txn.scan("", None).await?;
        let analysis = analyze(self.codec(), &nodes);

        for (id, depth) in &analysis.depth_fixes {
            tracing::warn!(tree = %self.name(), %id, depth, "Repairing depth");
            txn.set_depth(id, *depth).await?;
        }
        for (id, numchild) in &analysis.numchild_fixes {
            tracing::warn!(tree = %self.name(), %id, numchild, "Repairing numchild");
            txn.set_numchild(id, *numchild).await?;
        }

        let problems = analysis.problems;
        Ok(RepairReport {
            depth_fixed: analysis.depth_fixes.len(),
            numchild_fixed: analysis.numchild_fixes.len(),
            remaining: TreeProblems {
                bad_alphabet: problems.bad_alphabet,
                bad_length: problems.bad_length,
                orphans: problems.orphans,
                ..TreeProblems::default()
            },
        })
    }
}
