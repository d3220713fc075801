//! Rebuilding the category forest from a flat, ordered list.
//!
//! Categories only carry `parent_id`; nodes are linked here through an
//! id → position index, so no category ever holds a reference to another.

use std::collections::HashMap;

use uuid::Uuid;

use crate::Category;

/// A category together with its (recursively nested) children.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryNode {
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// Number of categories in this subtree, the node included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(CategoryNode::size).sum::<usize>()
    }

    /// Depth-first, pre-order walk over the subtree.
    pub fn walk(&self) -> Vec<&Category> {
        let mut out = Vec::with_capacity(self.size());
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(&node.category);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

/// Arrange `categories` into a forest.
///
/// Sibling order is the input order, so callers pass categories already
/// sorted by `sort_order` then `name`. A category whose parent is absent from
/// the input becomes a root. Every input category appears exactly once in the
/// result; members of a parent cycle (only possible with corrupt data) are
/// surfaced as roots instead of being dropped.
pub fn build_forest(categories: Vec<Category>) -> Vec<CategoryNode> {
    let index: HashMap<Uuid, usize> = categories
        .iter()
        .enumerate()
        .map(|(position, category)| (category.id, position))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); categories.len()];
    let mut roots = Vec::new();
    for (position, category) in categories.iter().enumerate() {
        match category.parent_id.and_then(|parent| index.get(&parent)) {
            Some(&parent) if parent != position => children[parent].push(position),
            _ => roots.push(position),
        }
    }

    let mut slots: Vec<Option<Category>> = categories.into_iter().map(Some).collect();
    let mut forest: Vec<CategoryNode> = roots
        .into_iter()
        .filter_map(|root| assemble(root, &children, &mut slots))
        .collect();

    for position in 0..slots.len() {
        if let Some(node) = assemble(position, &children, &mut slots) {
            forest.push(node);
        }
    }

    forest
}

fn assemble(
    position: usize,
    children: &[Vec<usize>],
    slots: &mut [Option<Category>],
) -> Option<CategoryNode> {
    let category = slots[position].take()?;
    let nested = children[position]
        .iter()
        .filter_map(|&child| assemble(child, children, slots))
        .collect();
    Some(CategoryNode {
        category,
        children: nested,
    })
}
