use std::collections::{hash_map, HashMap};

use crate::{
    api::{self, CommentId},
    Comment,
};

/// Handle to a node of a [`CommentTree`]
///
/// Only meaningful for the tree that returned it. Handles are never reused
/// within a tree, so a handle to a removed node stays dead.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(usize);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Node {
    pub comment: Comment,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// What happens to the replies of a removed comment
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Removal {
    /// Replies take the removed comment's place among its siblings
    RetainReplies,

    /// The whole subtree goes away
    Cascade,
}

/// The comment thread of one post, as a forest of nodes stored in an arena
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommentTree {
    nodes: Vec<Option<Node>>,
    len: usize,
    roots: Vec<NodeId>,
    index: HashMap<CommentId, NodeId>,
}

impl CommentTree {
    pub fn new() -> CommentTree {
        CommentTree::default()
    }

    /// Builds the forest from the flat list the server returns
    ///
    /// Children may appear before their parent. Siblings keep the order they
    /// have in `records`. Records that cannot be placed are dropped with a
    /// warning: repeated ids keep their first occurrence, and records that are
    /// part of a parent cycle are left out. Records whose parent is not in
    /// the list become roots.
    pub fn build<I>(records: I) -> CommentTree
    where
        I: IntoIterator<Item = api::Comment>,
    {
        let mut records = records.into_iter().map(Some).collect::<Vec<_>>();

        // Index every record by its id
        let mut by_id = HashMap::with_capacity(records.len());
        for (i, r) in records.iter_mut().enumerate() {
            let Some(id) = r.as_ref().map(|rec| rec.id) else { continue };
            match by_id.entry(id) {
                hash_map::Entry::Occupied(_) => {
                    tracing::warn!(comment=?id, "dropping duplicate comment record");
                    *r = None;
                }
                hash_map::Entry::Vacant(e) => {
                    e.insert(i);
                }
            }
        }
        let kept = by_id.len();

        // Link every record to its parent
        let mut roots = Vec::new();
        let mut children = vec![Vec::new(); records.len()];
        for (i, rec) in records.iter().enumerate() {
            let Some(rec) = rec else { continue };
            match rec.parent_id {
                None => roots.push(i),
                Some(p) => match by_id.get(&p) {
                    Some(&parent) => children[parent].push(i),
                    None => {
                        tracing::warn!(
                            comment=?rec.id,
                            parent=?p,
                            "parent of comment is not in the thread, showing it at top level"
                        );
                        roots.push(i);
                    }
                },
            }
        }

        // Walk down from the roots; taking each record out marks it visited
        let mut tree = CommentTree::new();
        tree.nodes.reserve(kept);
        let mut stack = roots
            .into_iter()
            .rev()
            .map(|i| (i, None))
            .collect::<Vec<_>>();
        while let Some((i, parent)) = stack.pop() {
            let Some(rec) = records[i].take() else { continue };
            let comment_id = rec.id;
            let node = tree.alloc(Node {
                comment: Comment::from(rec),
                parent,
                children: Vec::new(),
            });
            tree.index.insert(comment_id, node);
            tree.siblings_mut(parent).push(node);
            stack.extend(children[i].iter().rev().map(|&c| (c, Some(node))));
        }

        if tree.len() < kept {
            tracing::warn!(
                dropped = kept - tree.len(),
                "dropping comments that are part of a reply cycle"
            );
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn get(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node.0).and_then(|n| n.as_ref())
    }

    pub fn comment(&self, node: NodeId) -> Option<&Comment> {
        self.get(node).map(|n| &n.comment)
    }

    pub fn comment_mut(&mut self, node: NodeId) -> Option<&mut Comment> {
        self.get_mut(node).map(|n| &mut n.comment)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node).map(|n| &n.children as &[_]).unwrap_or(&[])
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|n| n.parent)
    }

    /// Confirmed comments in pre-order, in the flat form the server uses
    pub fn records(&self) -> Vec<api::Comment> {
        crate::presentation::flatten(self)
            .filter_map(|(_, c, _)| c.to_api())
            .collect()
    }

    /// Looks up a confirmed comment anywhere in the forest
    pub fn find(&self, id: CommentId) -> Option<NodeId> {
        self.index.get(&id).copied()
    }

    pub fn depth(&self, node: NodeId) -> usize {
        let mut depth = 0;
        let mut cur = self.parent(node);
        while let Some(p) = cur {
            depth += 1;
            cur = self.parent(p);
        }
        depth
    }

    /// Inserts `comment` as the first reply of `parent`, or as the first
    /// top-level comment if `parent` is None or no longer in the tree
    pub fn insert_first(&mut self, parent: Option<NodeId>, comment: Comment) -> NodeId {
        let parent = match parent {
            Some(p) if self.get(p).is_none() => {
                tracing::warn!(parent=?p, "inserting under a removed comment, using top level");
                None
            }
            p => p,
        };
        let comment_id = comment.id;
        let node = self.alloc(Node {
            comment,
            parent,
            children: Vec::new(),
        });
        if let Some(id) = comment_id {
            self.index.insert(id, node);
        }
        self.siblings_mut(parent).insert(0, node);
        node
    }

    /// Replaces the record held by `node`, keeping its position and replies
    ///
    /// Returns false if `node` is not in the tree.
    pub fn confirm(&mut self, node: NodeId, comment: Comment) -> bool {
        let new_id = comment.id;
        let Some(n) = self.get_mut(node) else {
            return false;
        };
        let old_id = std::mem::replace(&mut n.comment, comment).id;
        if let Some(id) = old_id {
            self.index.remove(&id);
        }
        if let Some(id) = new_id {
            self.index.insert(id, node);
        }
        true
    }

    /// Flips the viewer's like on `node`, returning the new like state
    pub fn toggle_like(&mut self, node: NodeId) -> Option<bool> {
        self.comment_mut(node).map(|c| c.toggle_like())
    }

    /// Removes `node` from the forest, returning the comments that went away
    pub fn remove(&mut self, node: NodeId, removal: Removal) -> Vec<Comment> {
        let Some(n) = self.get(node) else {
            return Vec::new();
        };
        let parent = n.parent;
        let siblings = self.siblings_mut(parent);
        let Some(pos) = siblings.iter().position(|&s| s == node) else {
            return Vec::new();
        };
        siblings.remove(pos);

        match removal {
            Removal::RetainReplies => {
                let Some(removed) = self.release(node) else {
                    return Vec::new();
                };
                for &c in removed.children.iter() {
                    if let Some(child) = self.get_mut(c) {
                        child.parent = parent;
                    }
                }
                self.siblings_mut(parent)
                    .splice(pos..pos, removed.children.iter().copied());
                vec![removed.comment]
            }
            Removal::Cascade => {
                let mut removed = Vec::new();
                let mut stack = vec![node];
                while let Some(n) = stack.pop() {
                    if let Some(n) = self.release(n) {
                        stack.extend(n.children.iter().rev());
                        removed.push(n.comment);
                    }
                }
                removed
            }
        }
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(node.0).and_then(|n| n.as_mut())
    }

    fn siblings_mut(&mut self, parent: Option<NodeId>) -> &mut Vec<NodeId> {
        match parent.and_then(|p| self.nodes.get_mut(p.0)).and_then(|n| n.as_mut()) {
            Some(p) => &mut p.children,
            None => &mut self.roots,
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(Some(node));
        self.len += 1;
        NodeId(self.nodes.len() - 1)
    }

    /// Frees the slot of `node` without touching its parent's child list
    fn release(&mut self, node: NodeId) -> Option<Node> {
        let n = self.nodes.get_mut(node.0)?.take()?;
        self.len -= 1;
        if let Some(id) = n.comment.id {
            if self.index.get(&id) == Some(&node) {
                self.index.remove(&id);
            }
        }
        Some(n)
    }
}
