use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

use super::fragment::TextFragment;

/// Index of a node inside its [`TocTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

/// One entry of the reconstructed table of contents.
#[derive(Debug, Clone, PartialEq)]
pub struct TocNode {
    pub title: String,
    /// Page label. Usually a bare number, but may carry positioning tokens
    /// such as `"5 XYZ 0 700"`.
    pub page: String,
    /// 0-based nesting depth.
    pub depth: usize,
    pub children: Vec<NodeId>,
    /// Back-reference used for path reconstruction only.
    pub parent: Option<NodeId>,
}

impl TocNode {
    /// Leading integer of the page label, 0 when there is none.
    pub fn page_number(&self) -> u32 {
        self.page
            .split_whitespace()
            .next()
            .and_then(|token| token.parse().ok())
            .unwrap_or(0)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// A heading ready to be folded into the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub title: String,
    pub page_label: String,
    /// 1-based level; 0 is treated as 1.
    pub level: u8,
}

impl From<&TextFragment> for TocEntry {
    fn from(fragment: &TextFragment) -> Self {
        TocEntry {
            title: fragment.text.clone(),
            page_label: fragment.page.to_string(),
            level: fragment.level(),
        }
    }
}

/// An ordered forest stored in an arena.
///
/// Children are listed in document order. Traversal always follows the
/// forward `children` edges; `parent` is only read by [`TocTree::full_path`]
/// and [`TocTree::parent`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TocTree {
    nodes: Vec<TocNode>,
    roots: Vec<NodeId>,
}

impl TocTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&TocNode> {
        self.nodes.get(id.0)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Every node in pre-order (document order).
    pub fn iter(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: self.roots.iter().rev().copied().collect(),
        }
    }

    /// All nodes below `id`, in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Titles from the root down to `id`, joined by `separator`.
    pub fn full_path(&self, id: NodeId, separator: &str) -> String {
        let mut titles = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.node(c)) {
            titles.push(node.title.as_str());
            current = node.parent;
        }
        titles.reverse();
        titles.join(separator)
    }

    fn push(&mut self, node: TocNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        match node.parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        self.nodes.push(node);
        id
    }
}

/// Pre-order iterator over a [`TocTree`].
pub struct Preorder<'a> {
    tree: &'a TocTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = (NodeId, &'a TocNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id)?;
        self.stack.extend(node.children.iter().rev().copied());
        Some((id, node))
    }
}

/// Trim and collapse internal whitespace runs to a single space.
pub fn clean_title(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fold an ordered heading sequence into a forest.
///
/// Keeps a stack of open ancestors paired with the depth each one asked for
/// (`level - 1`). Before placing a heading, every open node that asked for a
/// depth at or below the current request is closed. The heading then becomes
/// a root, or the last child of the innermost open node one level below it.
/// A jump such as level 1 followed by level 3 therefore yields depths 0 and 1.
pub fn build_tree<I>(entries: I) -> TocTree
where
    I: IntoIterator<Item = TocEntry>,
{
    let mut tree = TocTree::default();
    let mut stack: Vec<(NodeId, usize)> = Vec::new();

    for entry in entries {
        let requested = usize::from(entry.level.max(1) - 1);

        while let Some(&(_, open)) = stack.last() {
            if open >= requested {
                stack.pop();
            } else {
                break;
            }
        }

        let parent = stack.last().map(|&(id, _)| id);
        let depth = parent
            .and_then(|p| tree.node(p))
            .map_or(0, |p| p.depth + 1);

        let id = tree.push(TocNode {
            title: clean_title(&entry.title),
            page: entry.page_label,
            depth,
            children: Vec::new(),
            parent,
        });
        stack.push((id, requested));
    }

    tree
}

/// Nested `{title, page, depth, children}` view of one node.
struct NodeView<'a> {
    tree: &'a TocTree,
    id: NodeId,
}

impl Serialize for NodeView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = &self.tree.nodes[self.id.0];
        let mut state = serializer.serialize_struct("TocNode", 4)?;
        state.serialize_field("title", &node.title)?;
        state.serialize_field("page", &node.page)?;
        state.serialize_field("depth", &node.depth)?;
        state.serialize_field(
            "children",
            &Siblings {
                tree: self.tree,
                ids: &node.children,
            },
        )?;
        state.end()
    }
}

struct Siblings<'a> {
    tree: &'a TocTree,
    ids: &'a [NodeId],
}

impl Serialize for Siblings<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.ids.len()))?;
        for &id in self.ids {
            seq.serialize_element(&NodeView {
                tree: self.tree,
                id,
            })?;
        }
        seq.end()
    }
}

/// Serialises as a list of root nodes, each with nested children.
impl Serialize for TocTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Siblings {
            tree: self,
            ids: &self.roots,
        }
        .serialize(serializer)
    }
}
