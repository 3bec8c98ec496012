//! Flattening of a [`CommentTree`] into what a screen renders, top to bottom

use crate::{
    api::{self, UserId},
    Comment, CommentTree, NodeId, PostRef,
};

/// Indentation, in columns, added per nesting level
pub const INDENT_PER_LEVEL: usize = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Row<'a> {
    pub node: NodeId,
    pub comment: &'a Comment,

    /// 0 for top-level comments
    pub depth: usize,

    /// Advisory, the server decides in the end
    pub can_delete: bool,

    /// The comment is still waiting for server confirmation
    pub pending: bool,
}

/// Iterates over the forest in pre-order: every comment is immediately
/// followed by all its replies, before its next sibling
pub fn flatten(tree: &CommentTree) -> Flatten<'_> {
    Flatten {
        tree,
        stack: tree.roots().iter().rev().map(|&n| (n, 0)).collect(),
    }
}

/// Like [`flatten`], annotating each row with what `viewer` may do with it
pub fn rows<'a>(tree: &'a CommentTree, viewer: UserId, post: &PostRef) -> Vec<Row<'a>> {
    let post_author = post.author_id;
    flatten(tree)
        .map(|(node, comment, depth)| Row {
            node,
            comment,
            depth,
            can_delete: api::can_delete(viewer, comment.author_id, post_author),
            pending: comment.is_pending(),
        })
        .collect()
}

pub fn indent(depth: usize) -> usize {
    depth * INDENT_PER_LEVEL
}

pub struct Flatten<'a> {
    tree: &'a CommentTree,
    stack: Vec<(NodeId, usize)>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = (NodeId, &'a Comment, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, depth) = self.stack.pop()?;
            let Some(n) = self.tree.get(node) else {
                continue;
            };
            self.stack
                .extend(n.children().iter().rev().map(|&c| (c, depth + 1)));
            return Some((node, &n.comment, depth));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::api::{CommentId, PostId, Time, Uuid};

    fn cid(n: u128) -> CommentId {
        CommentId(Uuid::from_u128(n))
    }

    fn uid(n: u128) -> UserId {
        UserId(Uuid::from_u128(n))
    }

    fn record(id: u128, parent: Option<u128>, author: u128) -> api::Comment {
        api::Comment {
            id: cid(id),
            author_id: uid(author),
            author_name: format!("user {author}"),
            content: format!("comment {id}"),
            created_at: Time::default(),
            like_count: 0,
            viewer_has_liked: false,
            parent_id: parent.map(cid),
        }
    }

    fn flat_ids(tree: &CommentTree) -> Vec<(CommentId, usize)> {
        flatten(tree)
            .map(|(_, c, depth)| (c.id.unwrap(), depth))
            .collect()
    }

    #[test]
    fn preorder_with_depths() {
        let tree = CommentTree::build(vec![
            record(1, None, 0),
            record(2, Some(1), 0),
            record(3, None, 0),
        ]);
        assert_eq!(
            flat_ids(&tree),
            vec![(cid(1), 0), (cid(2), 1), (cid(3), 0)]
        );
    }

    #[test]
    fn deep_nesting_is_fully_visited() {
        let mut records = vec![record(0, None, 0)];
        records.extend((1..10_000).map(|i| record(i, Some(i - 1), 0)));
        let tree = CommentTree::build(records);
        let flat = flat_ids(&tree);
        assert_eq!(flat.len(), 10_000);
        assert_eq!(flat.last(), Some(&(cid(9_999), 9_999)));
    }

    #[test]
    fn flatten_is_restartable() {
        let tree = CommentTree::build(vec![record(1, None, 0), record(2, Some(1), 0)]);
        assert_eq!(flat_ids(&tree), flat_ids(&tree));
    }

    #[test]
    fn rows_flag_deletion_rights() {
        let post = PostRef {
            id: PostId::stub(),
            author_id: uid(100),
        };
        let tree = CommentTree::build(vec![record(1, None, 7), record(2, Some(1), 8)]);

        let as_author_of_1 = rows(&tree, uid(7), &post);
        assert_eq!(
            as_author_of_1.iter().map(|r| r.can_delete).collect::<Vec<_>>(),
            vec![true, false]
        );

        let as_post_author = rows(&tree, uid(100), &post);
        assert!(as_post_author.iter().all(|r| r.can_delete));

        let as_stranger = rows(&tree, uid(9), &post);
        assert!(as_stranger.iter().all(|r| !r.can_delete && !r.pending));
    }

    #[test]
    fn indentation_grows_per_level() {
        assert_eq!(indent(0), 0);
        assert_eq!(indent(3), 3 * INDENT_PER_LEVEL);
    }

    #[test]
    fn fuzz_flatten_matches_parent_links() {
        // each entry is the index of the parent among the previous records,
        // reduced modulo the number of records so far, or None for a root
        bolero::check!()
            .with_type::<Vec<Option<u16>>>()
            .cloned()
            .for_each(|parents| {
                let mut records = parents
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        let parent = match (i, p) {
                            (0, _) | (_, None) => None,
                            (i, Some(p)) => Some(*p as u128 % i as u128),
                        };
                        record(i as u128, parent, 0)
                    })
                    .collect::<Vec<_>>();
                // children listed before their parents must work too
                records.reverse();
                let expected_parents = records
                    .iter()
                    .map(|r| (r.id, r.parent_id))
                    .collect::<HashMap<_, _>>();

                let tree = CommentTree::build(records);
                assert_eq!(tree.len(), parents.len());

                // every row's parent is the closest preceding row one level up
                let mut path: Vec<CommentId> = Vec::new();
                let mut seen = 0;
                for (_, c, depth) in flatten(&tree) {
                    let id = c.id.unwrap();
                    assert!(depth <= path.len());
                    path.truncate(depth);
                    assert_eq!(path.last().copied(), expected_parents[&id]);
                    path.push(id);
                    seen += 1;
                }
                assert_eq!(seen, parents.len());
            });
    }
}
