//! Node Tree (arena-based allocation)
//!
//! Pure structure: parent/sibling links and node data. Knows nothing about
//! widgets; [`Document`](super::Document) layers the widget mirroring on top.
//!
//! Links are kept mutually consistent after every operation:
//! `a.next_sibling == Some(b)` ⇔ `b.prev_sibling == Some(a)`, and a node is a
//! child of at most one parent.

use crate::error::{DomError, Result};

use super::node::{Node, NodeData, NodeId, NodeType};

/// Arena-backed virtual node tree. Slot 0 is the document root.
#[derive(Debug)]
pub struct NodeTree {
    nodes: Vec<Option<Node>>,
    /// Released slots for reuse.
    free: Vec<u32>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Create a tree holding only a document root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::new(NodeData::Document))],
            free: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Allocate a detached node.
    pub fn create(&mut self, data: NodeData) -> NodeId {
        let node = Some(Node::new(data));
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = node;
                NodeId(slot)
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() as u32 - 1)
            }
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Get a node, failing with [`DomError::InvalidNode`].
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or(DomError::InvalidNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.get_mut(id).ok_or(DomError::InvalidNode(id))
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Iterate the direct children of `id` in order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).and_then(|n| n.first_child),
        }
    }

    /// Snapshot of the direct children of `id`.
    pub fn child_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).collect()
    }

    /// `id` and all of its descendants, in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if self.get(next).is_none() {
                continue;
            }
            out.push(next);
            let mut kids = self.child_nodes(next);
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// True when `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// True when `id` is reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.get(id).is_some() && self.is_inclusive_ancestor(NodeId::ROOT, id)
    }

    /// Index of `child` among the element children of `parent`.
    pub fn element_position(&self, parent: NodeId, child: NodeId) -> usize {
        self.children(parent)
            .take_while(|&c| c != child)
            .filter(|&c| self.get(c).is_some_and(Node::is_element))
            .count()
    }

    /// Nearest element ancestor, stopping at the document root.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        self.get(parent).filter(|n| n.is_element()).map(|_| parent)
    }

    // =========================================================================
    // Structural Mutators
    // =========================================================================

    /// Check that `child` may be inserted into `parent` before `reference`.
    pub fn validate_insert(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
        let parent_node = self.node(parent)?;
        if parent_node.is_leaf() {
            return Err(DomError::structural(parent, "leaf nodes cannot have children"));
        }

        let child_node = self.node(child)?;
        if child_node.node_type() == NodeType::Document {
            return Err(DomError::structural(child, "a document cannot be inserted"));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::structural(child, "insertion would create a cycle"));
        }

        if let Some(reference) = reference {
            if self.node(reference)?.parent != Some(parent) {
                return Err(DomError::NotFound { node: reference, parent });
            }
        }
        Ok(())
    }

    /// Insert `child` before `reference` (append when `None`).
    ///
    /// A fragment moves its children instead of itself. Returns the nodes that
    /// were inserted.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<Vec<NodeId>> {
        self.validate_insert(parent, child, reference)?;
        let moved = self.insertion_set(child);
        for &node in &moved {
            self.link_before(parent, node, reference);
        }
        Ok(moved)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<Vec<NodeId>> {
        self.insert_before(parent, child, None)
    }

    /// Nodes that inserting `child` actually moves.
    pub(crate) fn insertion_set(&self, child: NodeId) -> Vec<NodeId> {
        match self.get(child).map(Node::node_type) {
            Some(NodeType::Fragment) => self.child_nodes(child),
            Some(_) => vec![child],
            None => Vec::new(),
        }
    }

    /// Link an already-validated node before `reference`, detaching it first.
    pub(crate) fn link_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if reference == Some(child) {
            return;
        }
        self.detach(child);

        let prev = match reference {
            Some(r) => self.get(r).and_then(|n| n.prev_sibling),
            None => self.get(parent).and_then(|n| n.last_child),
        };

        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = reference;
        }

        match prev {
            Some(p) => {
                if let Some(node) = self.get_mut(p) {
                    node.next_sibling = Some(child);
                }
            }
            None => {
                if let Some(node) = self.get_mut(parent) {
                    node.first_child = Some(child);
                }
            }
        }

        match reference {
            Some(r) => {
                if let Some(node) = self.get_mut(r) {
                    node.prev_sibling = Some(child);
                }
            }
            None => {
                if let Some(node) = self.get_mut(parent) {
                    node.last_child = Some(child);
                }
            }
        }
    }

    /// Remove `child` from `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        if self.node(child)?.parent != Some(parent) {
            return Err(DomError::NotFound { node: child, parent });
        }
        self.detach(child);
        Ok(())
    }

    /// Unlink a node from its parent, if it has one.
    pub(crate) fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else { return };
        let Some(parent) = node.parent else { return };
        let (prev, next) = (node.prev_sibling, node.next_sibling);

        match prev {
            Some(p) => {
                if let Some(n) = self.get_mut(p) {
                    n.next_sibling = next;
                }
            }
            None => {
                if let Some(n) = self.get_mut(parent) {
                    n.first_child = next;
                }
            }
        }
        match next {
            Some(nx) => {
                if let Some(n) = self.get_mut(nx) {
                    n.prev_sibling = prev;
                }
            }
            None => {
                if let Some(n) = self.get_mut(parent) {
                    n.last_child = prev;
                }
            }
        }

        if let Some(node) = self.get_mut(id) {
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
        }
    }

    /// Copy a node (and, when `deep`, its subtree). The copy is detached.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> Result<NodeId> {
        let data = self.node(id)?.data.clone();
        let copy = self.create(data);
        if deep {
            for child in self.child_nodes(id) {
                let child_copy = self.clone_node(child, true)?;
                self.link_before(copy, child_copy, None);
            }
        }
        Ok(copy)
    }

    /// Free a detached subtree. Its ids may be reused afterwards.
    pub fn release(&mut self, id: NodeId) -> Result<()> {
        if id == NodeId::ROOT {
            return Err(DomError::structural(id, "the document root cannot be released"));
        }
        if self.node(id)?.parent.is_some() {
            return Err(DomError::structural(id, "only detached nodes can be released"));
        }
        for node in self.descendants(id) {
            self.nodes[node.index()] = None;
            self.free.push(node.0);
        }
        Ok(())
    }
}

/// Iterator over the direct children of a node.
pub struct Children<'a> {
    tree: &'a NodeTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::node::ElementData;

    fn element(tree: &mut NodeTree, tag: &str) -> NodeId {
        tree.create(NodeData::Element(ElementData::new(tag)))
    }

    /// Every link must have its mirror image.
    fn assert_consistent(tree: &NodeTree, parent: NodeId) {
        let kids = tree.child_nodes(parent);
        let node = tree.get(parent).unwrap();
        assert_eq!(node.first_child, kids.first().copied());
        assert_eq!(node.last_child, kids.last().copied());
        for (i, &kid) in kids.iter().enumerate() {
            let k = tree.get(kid).unwrap();
            assert_eq!(k.parent, Some(parent));
            assert_eq!(k.prev_sibling, if i == 0 { None } else { Some(kids[i - 1]) });
            assert_eq!(k.next_sibling, kids.get(i + 1).copied());
            assert_consistent(tree, kid);
        }
    }

    #[test]
    fn test_append_and_insert() {
        let mut tree = NodeTree::new();
        let a = element(&mut tree, "box");
        let b = element(&mut tree, "box");
        let c = element(&mut tree, "box");

        tree.append_child(NodeId::ROOT, a).unwrap();
        tree.append_child(NodeId::ROOT, c).unwrap();
        tree.insert_before(NodeId::ROOT, b, Some(c)).unwrap();

        assert_eq!(tree.child_nodes(NodeId::ROOT), vec![a, b, c]);
        assert_consistent(&tree, NodeId::ROOT);
    }

    #[test]
    fn test_reparent_detaches_first() {
        let mut tree = NodeTree::new();
        let a = element(&mut tree, "box");
        let b = element(&mut tree, "box");
        let x = element(&mut tree, "text");

        tree.append_child(NodeId::ROOT, a).unwrap();
        tree.append_child(NodeId::ROOT, b).unwrap();
        tree.append_child(a, x).unwrap();
        tree.append_child(b, x).unwrap();

        assert!(tree.child_nodes(a).is_empty());
        assert_eq!(tree.child_nodes(b), vec![x]);
        assert_consistent(&tree, NodeId::ROOT);
    }

    #[test]
    fn test_move_within_parent() {
        let mut tree = NodeTree::new();
        let kids: Vec<_> = (0..4).map(|_| element(&mut tree, "box")).collect();
        for &k in &kids {
            tree.append_child(NodeId::ROOT, k).unwrap();
        }

        tree.insert_before(NodeId::ROOT, kids[3], Some(kids[0])).unwrap();
        assert_eq!(tree.child_nodes(NodeId::ROOT), vec![kids[3], kids[0], kids[1], kids[2]]);

        tree.insert_before(NodeId::ROOT, kids[1], Some(kids[1])).unwrap();
        assert_eq!(tree.child_nodes(NodeId::ROOT), vec![kids[3], kids[0], kids[1], kids[2]]);

        tree.append_child(NodeId::ROOT, kids[3]).unwrap();
        assert_eq!(tree.child_nodes(NodeId::ROOT), vec![kids[0], kids[1], kids[2], kids[3]]);
        assert_consistent(&tree, NodeId::ROOT);
    }

    #[test]
    fn test_leaf_rejects_children() {
        let mut tree = NodeTree::new();
        let text = tree.create(NodeData::Text(Some("hi".into())));
        let comment = tree.create(NodeData::Comment("note".into()));
        let a = element(&mut tree, "box");

        assert!(tree.append_child(text, a).unwrap_err().is_structural());
        assert!(tree.append_child(comment, a).unwrap_err().is_structural());
    }

    #[test]
    fn test_reference_must_be_child() {
        let mut tree = NodeTree::new();
        let a = element(&mut tree, "box");
        let stray = element(&mut tree, "box");

        let err = tree.insert_before(NodeId::ROOT, a, Some(stray)).unwrap_err();
        assert!(err.is_not_found());
        assert!(tree.remove_child(NodeId::ROOT, stray).unwrap_err().is_not_found());
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = NodeTree::new();
        let a = element(&mut tree, "box");
        let b = element(&mut tree, "box");
        tree.append_child(a, b).unwrap();

        assert!(tree.append_child(b, a).unwrap_err().is_structural());
        assert!(tree.append_child(a, a).unwrap_err().is_structural());
    }

    #[test]
    fn test_fragment_moves_children() {
        let mut tree = NodeTree::new();
        let frag = tree.create(NodeData::Fragment);
        let a = element(&mut tree, "box");
        let b = element(&mut tree, "box");
        tree.append_child(frag, a).unwrap();
        tree.append_child(frag, b).unwrap();

        let moved = tree.append_child(NodeId::ROOT, frag).unwrap();
        assert_eq!(moved, vec![a, b]);
        assert_eq!(tree.child_nodes(NodeId::ROOT), vec![a, b]);
        assert!(tree.child_nodes(frag).is_empty());
        assert_consistent(&tree, NodeId::ROOT);
    }

    #[test]
    fn test_clone_deep() {
        let mut tree = NodeTree::new();
        let a = element(&mut tree, "box");
        let t = tree.create(NodeData::Text(Some("hello".into())));
        tree.append_child(a, t).unwrap();
        tree.append_child(NodeId::ROOT, a).unwrap();

        let shallow = tree.clone_node(a, false).unwrap();
        assert!(tree.child_nodes(shallow).is_empty());
        assert_eq!(tree.parent(shallow), None);

        let deep = tree.clone_node(a, true).unwrap();
        let copy_kids = tree.child_nodes(deep);
        assert_eq!(copy_kids.len(), 1);
        assert_ne!(copy_kids[0], t);
        assert_eq!(tree.get(copy_kids[0]).unwrap().node_value(), Some("hello"));
        assert_consistent(&tree, deep);
    }

    #[test]
    fn test_release_reuses_slots() {
        let mut tree = NodeTree::new();
        let a = element(&mut tree, "box");
        let b = element(&mut tree, "box");
        tree.append_child(a, b).unwrap();

        assert!(tree.release(b).unwrap_err().is_structural());
        tree.release(a).unwrap();
        assert!(tree.get(a).is_none());
        assert!(tree.get(b).is_none());

        let c = element(&mut tree, "box");
        assert!(c == a || c == b);
    }

    #[test]
    fn test_element_position_skips_text() {
        let mut tree = NodeTree::new();
        let t = tree.create(NodeData::Text(Some("x".into())));
        let a = element(&mut tree, "box");
        let b = element(&mut tree, "box");
        for n in [t, a, b] {
            tree.append_child(NodeId::ROOT, n).unwrap();
        }
        assert_eq!(tree.element_position(NodeId::ROOT, a), 0);
        assert_eq!(tree.element_position(NodeId::ROOT, b), 1);
    }
}
