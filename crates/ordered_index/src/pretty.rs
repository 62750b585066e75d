//! Indented text rendering of a tree's shape, for debugging.

use std::fmt::Write;

use crate::arena::Handle;
use crate::key::Key;

/// Read-only view of a binary tree's links.
pub trait TreeShape {
    type Value;

    fn top(&self) -> Option<Handle>;
    fn left(&self, h: Handle) -> Option<Handle>;
    fn right(&self, h: Handle) -> Option<Handle>;
    fn entry(&self, h: Handle) -> (&Key, &Self::Value);
}

const INDENT: &str = "    ";

/// Renders `tree` sideways: one node per line, right subtree above its parent,
/// each level indented one step further.
pub fn render<T: TreeShape>(tree: &T, mut label: impl FnMut(&Key, &T::Value) -> String) -> String {
    let mut out = String::new();
    if let Some(root) = tree.top() {
        render_node(tree, root, 0, &mut label, &mut out);
    }
    out
}

fn render_node<T: TreeShape>(
    tree: &T,
    h: Handle,
    depth: usize,
    label: &mut impl FnMut(&Key, &T::Value) -> String,
    out: &mut String,
) {
    if let Some(right) = tree.right(h) {
        render_node(tree, right, depth + 1, label, out);
    }
    let (key, value) = tree.entry(h);
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    let _ = writeln!(out, "{}", label(key, value));
    if let Some(left) = tree.left(h) {
        render_node(tree, left, depth + 1, label, out);
    }
}
