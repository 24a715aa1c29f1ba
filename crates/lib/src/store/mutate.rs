//! Structural mutations.

use crate::{
    Result,
    backend::{TreeTxn, TxnMode},
    constants::PARK_CHAR,
    node::{Node, NodeId, NodeSpec},
    position::Position,
};

use super::{TreeError, TreeStore, slots};

impl TreeStore {
    /// Add a new top-level node after the existing roots.
    pub async fn add_root(&self, spec: NodeSpec) -> Result<Node> {
        let mut txn = self.begin(TxnMode::Write).await?;
        let result = self.insert_last(txn.as_mut(), None, spec).await;
        self.finish(txn, result).await
    }

    /// Add a new node as the last child of `parent`.
    pub async fn add_child(&self, parent: NodeId, spec: NodeSpec) -> Result<Node> {
        let mut txn = self.begin(TxnMode::Write).await?;
        let result = self.add_child_in(txn.as_mut(), parent, spec).await;
        self.finish(txn, result).await
    }

    /// Add a new node next to `node`.
    ///
    /// # Errors
    /// [`TreeError::InvalidPosition`] for `first-child` and `last-child`.
    pub async fn add_sibling(&self, node: NodeId, position: Position, spec: NodeSpec) -> Result<Node> {
        if position.is_child() {
            return Err(TreeError::InvalidPosition {
                position: position.to_string(),
                operation: "add_sibling".to_string(),
            }
            .into());
        }
        let mut txn = self.begin(TxnMode::Write).await?;
        let result = self.add_sibling_in(txn.as_mut(), node, position, spec).await;
        self.finish(txn, result).await
    }

    /// Move `node` with its whole subtree relative to `target`.
    ///
    /// Child positions make `node` the first or last child of `target`;
    /// sibling positions place it among `target`'s siblings. Moving a node
    /// left or right of itself changes nothing.
    ///
    /// # Errors
    /// [`TreeError::InvalidMoveToDescendant`] when `target` lies inside the
    /// moved subtree (or is `node` itself, for child positions).
    pub async fn move_node(&self, node: NodeId, target: NodeId, position: Position) -> Result<()> {
        let mut txn = self.begin(TxnMode::Write).await?;
        let result = self.move_in(txn.as_mut(), node, target, position).await;
        self.finish(txn, result).await
    }

    /// Delete `node` and everything below it. Returns the number of nodes
    /// removed.
    pub async fn delete(&self, node: NodeId) -> Result<u64> {
        let mut txn = self.begin(TxnMode::Write).await?;
        let result = self.delete_in(txn.as_mut(), node).await;
        self.finish(txn, result).await
    }

    /// Replace a node's payload. Shape columns are untouched.
    pub async fn update_data(&self, node: NodeId, data: serde_json::Value) -> Result<Node> {
        let mut txn = self.begin(TxnMode::Write).await?;
        let result = self.update_data_in(txn.as_mut(), node, data).await;
        self.finish(txn, result).await
    }

    async fn add_child_in(
        &self,
        txn: &mut dyn TreeTxn,
        parent: NodeId,
        spec: NodeSpec,
    ) -> Result<Node> {
        let parent = self.load(txn, parent).await?;
        self.insert_last(txn, Some(parent), spec).await
    }

    async fn add_sibling_in(
        &self,
        txn: &mut dyn TreeTxn,
        node: NodeId,
        position: Position,
        spec: NodeSpec,
    ) -> Result<Node> {
        let anchor = self.load(txn, node).await?;
        let parent = self.parent_of(txn, &anchor).await?;
        let index = self
            .sibling_index(txn, parent.as_ref(), position, Some(&anchor))
            .await?;
        self.insert_at(txn, parent, index, spec).await
    }

    async fn delete_in(&self, txn: &mut dyn TreeTxn, node: NodeId) -> Result<u64> {
        let node = self.load(txn, node).await?;
        let parent = self.parent_of(txn, &node).await?;
        let removed = txn.delete_prefix(node.path()).await?;
        if let Some(parent) = parent {
            txn.set_numchild(&parent.id(), parent.numchild().saturating_sub(1))
                .await?;
        }
        tracing::debug!(
            tree = %self.name(),
            path = %node.path(),
            removed,
            "Deleted subtree"
        );
        Ok(removed)
    }

    async fn update_data_in(
        &self,
        txn: &mut dyn TreeTxn,
        node: NodeId,
        data: serde_json::Value,
    ) -> Result<Node> {
        let mut current = self.load(txn, node).await?;
        txn.set_data(&node, &data).await?;
        current.set_data(data);
        Ok(current)
    }

    pub(super) async fn insert_last(
        &self,
        txn: &mut dyn TreeTxn,
        parent: Option<Node>,
        spec: NodeSpec,
    ) -> Result<Node> {
        let index = self
            .sibling_index(txn, parent.as_ref(), Position::LastSibling, None)
            .await?;
        self.insert_at(txn, parent, index, spec).await
    }

    /// Insert a new node at sibling `index` under `parent`.
    async fn insert_at(
        &self,
        txn: &mut dyn TreeTxn,
        parent: Option<Node>,
        index: usize,
        spec: NodeSpec,
    ) -> Result<Node> {
        self.check_kind(&spec.kind, parent.as_ref())?;
        let (parent_path, parent_depth) = parent
            .as_ref()
            .map_or(("", 0), |p| (p.path(), p.depth()));

        let path = self.make_room(txn, parent_path, parent_depth, index).await?;
        let node = spec.into_node(path, parent_depth + 1);
        txn.insert(&node).await?;

        if let Some(parent) = &parent {
            txn.set_numchild(&parent.id(), parent.numchild() + 1).await?;
        }
        tracing::debug!(
            tree = %self.name(),
            id = %node.id(),
            path = %node.path(),
            "Inserted node"
        );
        Ok(node)
    }

    /// Sibling index for `position` among the children of `parent`.
    ///
    /// `anchor` is the node a `left`/`right` position is relative to; it must
    /// be among those children.
    async fn sibling_index(
        &self,
        txn: &mut dyn TreeTxn,
        parent: Option<&Node>,
        position: Position,
        anchor: Option<&Node>,
    ) -> Result<usize> {
        let (parent_path, parent_depth) = parent.map_or(("", 0), |p| (p.path(), p.depth()));
        let siblings = self.children_at(txn, parent_path, parent_depth).await?;
        let anchor_index = || -> Result<usize> {
            let anchor = anchor.ok_or_else(|| TreeError::InvalidPosition {
                position: position.to_string(),
                operation: "insert without an anchor".to_string(),
            })?;
            siblings
                .iter()
                .position(|s| s.id() == anchor.id())
                .ok_or_else(|| {
                    TreeError::IntegrityViolation {
                        reason: format!("'{}' is missing from its sibling list", anchor.path()),
                    }
                    .into()
                })
        };
        match position {
            Position::FirstSibling | Position::FirstChild => Ok(0),
            Position::LastSibling | Position::LastChild => Ok(siblings.len()),
            Position::Left => anchor_index(),
            Position::Right => Ok(anchor_index()? + 1),
        }
    }

    /// Free a slot at sibling `index` under `parent_path` and return the path
    /// of that slot. Renumbers sibling subtrees as the slot plan requires.
    async fn make_room(
        &self,
        txn: &mut dyn TreeTxn,
        parent_path: &str,
        parent_depth: usize,
        index: usize,
    ) -> Result<String> {
        let codec = self.codec();
        let siblings = self.children_at(txn, parent_path, parent_depth).await?;
        let values = siblings
            .iter()
            .map(|s| codec.last_segment_value(s.path()))
            .collect::<std::result::Result<Vec<u64>, _>>()?;

        let plan = slots::plan(parent_path, &values, index, codec.capacity())?;
        if !plan.moves.is_empty() {
            tracing::trace!(
                tree = %self.name(),
                parent = %parent_path,
                moves = ?plan.moves,
                "Renumbering siblings"
            );
        }
        for (from, to) in &plan.moves {
            let old = codec.child_path(parent_path, *from)?;
            let new = codec.child_path(parent_path, *to)?;
            txn.relocate(&old, &new, 0).await?;
        }
        Ok(codec.child_path(parent_path, plan.value)?)
    }

    async fn move_in(
        &self,
        txn: &mut dyn TreeTxn,
        node: NodeId,
        target: NodeId,
        position: Position,
    ) -> Result<()> {
        let moving = self.load(txn, node).await?;
        let anchor = self.load(txn, target).await?;

        let into_self = position.is_child() && anchor.id() == moving.id();
        if into_self || anchor.is_descendant_of(&moving) {
            return Err(TreeError::InvalidMoveToDescendant { node, target }.into());
        }
        if anchor.id() == moving.id() && matches!(position, Position::Left | Position::Right) {
            return Ok(());
        }

        let old_parent = self.parent_of(txn, &moving).await?;
        let new_parent = if position.is_child() {
            Some(anchor.clone())
        } else if anchor.id() == moving.id() {
            old_parent.clone()
        } else {
            self.parent_of(txn, &anchor).await?
        };
        self.check_kind(moving.kind(), new_parent.as_ref())?;

        // Nothing outside the moved subtree changes path here, so `anchor`
        // and `new_parent` stay valid for slot planning.
        let park = PARK_CHAR.to_string();
        txn.relocate(moving.path(), &park, 0).await?;

        let anchor_ref = (anchor.id() != moving.id()).then_some(&anchor);
        let index = self
            .sibling_index(txn, new_parent.as_ref(), position, anchor_ref)
            .await?;
        let (parent_path, parent_depth) = new_parent
            .as_ref()
            .map_or(("", 0), |p| (p.path(), p.depth()));
        let destination = self.make_room(txn, parent_path, parent_depth, index).await?;

        let depth_delta = (parent_depth + 1) as i64 - moving.depth() as i64;
        txn.relocate(&park, &destination, depth_delta).await?;

        let old_parent_id = old_parent.as_ref().map(Node::id);
        let new_parent_id = new_parent.as_ref().map(Node::id);
        if old_parent_id != new_parent_id {
            // Renumbering may have moved either parent; go by id.
            if let Some(id) = old_parent_id {
                let current = self.load(txn, id).await?;
                txn.set_numchild(&id, current.numchild().saturating_sub(1))
                    .await?;
            }
            if let Some(id) = new_parent_id {
                let current = self.load(txn, id).await?;
                txn.set_numchild(&id, current.numchild() + 1).await?;
            }
        }

        tracing::debug!(
            tree = %self.name(),
            id = %node,
            from = %moving.path(),
            to = %destination,
            "Moved subtree"
        );
        Ok(())
    }
}
