//! Binary tree with a parent-linked in-order cursor.
//!
//! Nodes live in an arena owned by the [`BinaryTree`]; children and parents
//! are [`NodeId`] handles. A node's parent link is recorded when its parent
//! is built and never changes afterwards, so the links never form an
//! ownership cycle.
//!
//! The [`InOrderCursor`] walks the tree left-subtree, node, right-subtree
//! using only its current position and the parent links: no explicit stack
//! and no precomputed sequence.
//!
//! # Example
//!
//! ```
//! use horizon_lattice_behavior::BinaryTree;
//!
//! //   1
//! //  / \
//! // 2   3
//! let mut tree = BinaryTree::new();
//! let left = tree.leaf(2);
//! let right = tree.leaf(3);
//! let root = tree.node(1, Some(left), Some(right)).unwrap();
//! tree.set_root(root).unwrap();
//!
//! let values: Vec<i32> = tree.in_order().copied().collect();
//! assert_eq!(values, vec![2, 1, 3]);
//! ```

use std::iter::FusedIterator;

use slotmap::{SlotMap, new_key_type};

use crate::error::{TreeError, TreeResult};

new_key_type! {
    /// Handle to a node inside a [`BinaryTree`].
    pub struct NodeId;
}

struct Node<T> {
    value: T,
    left: Option<NodeId>,
    right: Option<NodeId>,
    parent: Option<NodeId>,
}

/// A binary tree stored in an arena.
///
/// Build nodes bottom-up with [`leaf`](Self::leaf) and [`node`](Self::node),
/// then pick the root with [`set_root`](Self::set_root). Nodes that are not
/// reachable from the root are kept in the arena but never visited.
pub struct BinaryTree<T> {
    nodes: SlotMap<NodeId, Node<T>>,
    root: Option<NodeId>,
}

impl<T> Default for BinaryTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BinaryTree<T> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
        }
    }

    /// Add a node without children.
    pub fn leaf(&mut self, value: T) -> NodeId {
        self.nodes.insert(Node {
            value,
            left: None,
            right: None,
            parent: None,
        })
    }

    /// Add a node that adopts the given children.
    ///
    /// Each child must belong to this tree, must not have a parent yet and
    /// must not be the root.
    pub fn node(
        &mut self,
        value: T,
        left: Option<NodeId>,
        right: Option<NodeId>,
    ) -> TreeResult<NodeId> {
        if left.is_some() && left == right {
            return Err(TreeError::DuplicateChild);
        }
        for child in [left, right].into_iter().flatten() {
            let data = self.nodes.get(child).ok_or(TreeError::InvalidNode)?;
            if data.parent.is_some() || self.root == Some(child) {
                return Err(TreeError::AlreadyAttached);
            }
        }

        let id = self.nodes.insert(Node {
            value,
            left,
            right,
            parent: None,
        });
        for child in [left, right].into_iter().flatten() {
            self.nodes[child].parent = Some(id);
        }
        tracing::trace!(target: "horizon_lattice_behavior::tree", ?id, ?left, ?right, "linked node");
        Ok(id)
    }

    /// Make a parentless node the root.
    pub fn set_root(&mut self, id: NodeId) -> TreeResult<()> {
        let data = self.nodes.get(id).ok_or(TreeError::InvalidNode)?;
        if data.parent.is_some() {
            return Err(TreeError::NotARoot);
        }
        self.root = Some(id);
        Ok(())
    }

    /// The root node, if one was set.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of nodes in the arena, including unreachable ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The value stored at a node.
    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id).map(|n| &n.value)
    }

    /// Left child of a node.
    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.left)
    }

    /// Right child of a node.
    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.right)
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// A cursor positioned before the first in-order value.
    pub fn cursor(&self) -> InOrderCursor<'_, T> {
        InOrderCursor::new(self)
    }

    /// Iterate values in in-order sequence.
    pub fn in_order(&self) -> InOrder<'_, T> {
        InOrder {
            cursor: self.cursor(),
        }
    }

    /// Descend via left links until a node without a left child.
    fn leftmost(&self, from: NodeId) -> NodeId {
        let mut current = from;
        while let Some(left) = self.nodes[current].left {
            current = left;
        }
        current
    }
}

impl<'a, T> IntoIterator for &'a BinaryTree<T> {
    type Item = &'a T;
    type IntoIter = InOrder<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.in_order()
    }
}

/// Explicit in-order cursor over a [`BinaryTree`].
///
/// Call [`move_next`](Self::move_next) before each [`value`](Self::value):
///
/// ```
/// use horizon_lattice_behavior::BinaryTree;
///
/// let mut tree = BinaryTree::new();
/// let leaf = tree.leaf("left");
/// let root = tree.node("root", Some(leaf), None).unwrap();
/// tree.set_root(root).unwrap();
///
/// let mut cursor = tree.cursor();
/// let mut seen = Vec::new();
/// while cursor.move_next() {
///     seen.push(*cursor.value());
/// }
/// assert_eq!(seen, ["left", "root"]);
/// ```
pub struct InOrderCursor<'a, T> {
    tree: &'a BinaryTree<T>,
    current: Option<NodeId>,
    returned_start: bool,
}

impl<'a, T> InOrderCursor<'a, T> {
    /// Position a cursor at the left-most node of the tree's root.
    pub fn new(tree: &'a BinaryTree<T>) -> Self {
        Self {
            tree,
            current: tree.root.map(|root| tree.leftmost(root)),
            returned_start: false,
        }
    }

    /// Advance to the next in-order node.
    ///
    /// Returns `false` once the traversal is exhausted.
    pub fn move_next(&mut self) -> bool {
        let Some(current) = self.current else {
            return false;
        };

        if !self.returned_start {
            self.returned_start = true;
            return true;
        }

        let nodes = &self.tree.nodes;
        if let Some(right) = nodes[current].right {
            self.current = Some(self.tree.leftmost(right));
            return true;
        }

        // Climb while we are coming back from a right subtree.
        let mut child = current;
        let mut parent = nodes[current].parent;
        while let Some(p) = parent {
            if nodes[p].right != Some(child) {
                break;
            }
            child = p;
            parent = nodes[p].parent;
        }
        self.current = parent;
        parent.is_some()
    }

    /// The value at the cursor.
    ///
    /// # Panics
    ///
    /// Panics if called before the first successful [`move_next`](Self::move_next)
    /// or after the traversal is exhausted.
    pub fn value(&self) -> &'a T {
        assert!(
            self.returned_start,
            "InOrderCursor::value called before move_next"
        );
        match self.current {
            Some(id) => &self.tree.nodes[id].value,
            None => panic!("InOrderCursor::value called on an exhausted cursor"),
        }
    }

    /// The node at the cursor, if the cursor is positioned on one.
    pub fn node_id(&self) -> Option<NodeId> {
        if self.returned_start {
            self.current
        } else {
            None
        }
    }

    /// Rewind to the start of the traversal.
    pub fn reset(&mut self) {
        self.current = self.tree.root.map(|root| self.tree.leftmost(root));
        self.returned_start = false;
    }
}

/// Iterator adapter over [`InOrderCursor`].
pub struct InOrder<'a, T> {
    cursor: InOrderCursor<'a, T>,
}

impl<'a, T> Iterator for InOrder<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.move_next() {
            Some(self.cursor.value())
        } else {
            None
        }
    }
}

impl<T> FusedIterator for InOrder<'_, T> {}
