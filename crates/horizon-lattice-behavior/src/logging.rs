//! Logging and debugging facilities for the behavior toolkit.
//!
//! All components log through the `tracing` crate under per-subsystem
//! targets. Install a subscriber in your application to see them:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_lattice_behavior::registry=trace")
//!     .init();
//! ```
//!
//! # Debug Visualization
//!
//! Use [`TreeDebug`] to render a [`BinaryTree`]:
//!
//! ```
//! use horizon_lattice_behavior::BinaryTree;
//! use horizon_lattice_behavior::logging::{TreeDebug, TreeFormatOptions, TreeStyle};
//!
//! let mut tree = BinaryTree::new();
//! let left = tree.leaf(2);
//! let right = tree.leaf(3);
//! let root = tree.node(1, Some(left), Some(right)).unwrap();
//! tree.set_root(root).unwrap();
//!
//! let options = TreeFormatOptions {
//!     style: TreeStyle::Compact,
//!     ..Default::default()
//! };
//! assert_eq!(TreeDebug::with_options(&tree, options).to_string(), "1(2, 3)");
//! ```

use std::fmt::{self, Write as FmtWrite};

use crate::tree::{BinaryTree, NodeId};

/// Span names used by the toolkit's instrumented entry points.
pub mod span_names {
    /// Observer fan-out span.
    pub const PUBLISH: &str = "horizon_lattice_behavior::publish";
    /// Broker query span.
    pub const QUERY: &str = "horizon_lattice_behavior::query";
    /// State machine trigger span.
    pub const FIRE: &str = "horizon_lattice_behavior::fire";
}

/// Target names for log filtering.
pub mod targets {
    /// Crate-wide target.
    pub const CORE: &str = "horizon_lattice_behavior";
    /// Observer registry target.
    pub const REGISTRY: &str = "horizon_lattice_behavior::registry";
    /// Query broker target.
    pub const BROKER: &str = "horizon_lattice_behavior::broker";
    /// Modifier chain target.
    pub const CHAIN: &str = "horizon_lattice_behavior::chain";
    /// Chat room target.
    pub const MEDIATOR: &str = "horizon_lattice_behavior::mediator";
    /// Observable property target.
    pub const PROPERTY: &str = "horizon_lattice_behavior::property";
    /// Tree construction target.
    pub const TREE: &str = "horizon_lattice_behavior::tree";
    /// State machine target.
    pub const STATE: &str = "horizon_lattice_behavior::state";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Single-line `value(left, right)` form.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node IDs.
    pub show_ids: bool,
    /// Whether to prefix children with `L:` / `R:`.
    pub show_sides: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: false,
            show_sides: true,
            max_depth: None,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_ids: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_sides: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing a [`BinaryTree`].
///
/// Formatting starts at the tree's root; nodes that are not reachable from
/// it are not shown.
///
/// Nodes are walked with an explicit stack, so tree depth is not limited by
/// the call stack. The branch styles indent every line by its depth, which
/// grows quadratically on a degenerate spine; set `max_depth` to cut such
/// trees short.
pub struct TreeDebug<'a, T> {
    tree: &'a BinaryTree<T>,
    options: TreeFormatOptions,
}

impl<'a, T: fmt::Display> TreeDebug<'a, T> {
    /// Create a visualizer with default options.
    pub fn new(tree: &'a BinaryTree<T>) -> Self {
        Self::with_options(tree, TreeFormatOptions::default())
    }

    /// Create a visualizer with custom options.
    pub fn with_options(tree: &'a BinaryTree<T>, options: TreeFormatOptions) -> Self {
        Self { tree, options }
    }

    /// Render the whole tree into a string.
    pub fn format_tree(&self) -> String {
        self.to_string()
    }

    fn write_label(&self, out: &mut impl FmtWrite, id: NodeId, side: Option<&str>) -> fmt::Result {
        if self.options.show_sides {
            if let Some(side) = side {
                write!(out, "{side}: ")?;
            }
        }
        if let Some(value) = self.tree.value(id) {
            write!(out, "{value}")?;
        }
        if self.options.show_ids {
            write!(out, " [{id:?}]")?;
        }
        Ok(())
    }

    fn write_branches(&self, out: &mut impl FmtWrite, root: NodeId) -> fmt::Result {
        let (tee, elbow, pipe) = match self.options.style {
            TreeStyle::Ascii => ("+-- ", "`-- ", "|   "),
            _ => ("\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} ", "\u{2502}   "),
        };

        // (node, side, prefix, is_last, depth), popped in pre-order.
        let mut pending = vec![(root, None, String::new(), true, 0usize)];
        while let Some((id, side, prefix, is_last, depth)) = pending.pop() {
            if self.options.max_depth.is_some_and(|max| depth > max) {
                continue;
            }

            let child_prefix = if depth == 0 {
                String::new()
            } else {
                out.write_str(&prefix)?;
                out.write_str(if is_last { elbow } else { tee })?;
                format!("{prefix}{}", if is_last { "    " } else { pipe })
            };
            self.write_label(out, id, side)?;
            out.write_char('\n')?;

            let children: Vec<(&'static str, NodeId)> = [
                ("L", self.tree.left(id)),
                ("R", self.tree.right(id)),
            ]
            .into_iter()
            .filter_map(|(side, child)| child.map(|c| (side, c)))
            .collect();

            let count = children.len();
            for (i, (side, child)) in children.into_iter().enumerate().rev() {
                pending.push((child, Some(side), child_prefix.clone(), i + 1 == count, depth + 1));
            }
        }
        Ok(())
    }

    fn write_compact(&self, out: &mut impl FmtWrite, root: NodeId) -> fmt::Result {
        let mut pending = vec![CompactStep::Node(root, 0)];
        while let Some(step) = pending.pop() {
            let (id, depth) = match step {
                CompactStep::Text(text) => {
                    out.write_str(text)?;
                    continue;
                }
                CompactStep::Node(id, depth) => (id, depth),
            };

            self.write_label(out, id, None)?;
            let (left, right) = (self.tree.left(id), self.tree.right(id));
            if left.is_none() && right.is_none() {
                continue;
            }
            if self.options.max_depth.is_some_and(|max| depth >= max) {
                out.write_str("(..)")?;
                continue;
            }

            out.write_char('(')?;
            pending.push(CompactStep::Text(")"));
            for (i, child) in [left, right].into_iter().enumerate().rev() {
                pending.push(match child {
                    Some(child) => CompactStep::Node(child, depth + 1),
                    None => CompactStep::Text("-"),
                });
                if i > 0 {
                    pending.push(CompactStep::Text(", "));
                }
            }
        }
        Ok(())
    }
}

enum CompactStep {
    Node(NodeId, usize),
    Text(&'static str),
}

impl<T: fmt::Display> fmt::Display for TreeDebug<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(root) = self.tree.root() else {
            return f.write_str("(empty)");
        };
        match self.options.style {
            TreeStyle::Compact => self.write_compact(f, root),
            _ => self.write_branches(f, root),
        }
    }
}
