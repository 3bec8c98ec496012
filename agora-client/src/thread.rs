use crate::{
    api::{self, CommentId, NewComment, PostId, UserId, Viewer},
    presentation::{self, Row},
    Comment, CommentTree, Deletion, Error, NodeId, RemoteError, Removal,
};

/// What the thread needs to know about the post it hangs off
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PostRef {
    pub id: PostId,
    pub author_id: UserId,
}

impl From<&api::Post> for PostRef {
    fn from(p: &api::Post) -> PostRef {
        PostRef {
            id: p.id,
            author_id: p.author_id,
        }
    }
}

/// Result of feeding a remote answer back into a [`CommentThread`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome<T = ()> {
    Applied(T),

    /// The answer was for a tree that has since been replaced, and was ignored
    Stale,
}

#[derive(Debug)]
#[must_use = "the remote call must be dispatched and its result passed to complete_like"]
pub struct PendingLike {
    generation: u64,
    pub comment: CommentId,
    pub viewer: UserId,
}

#[derive(Debug)]
#[must_use = "the remote call must be dispatched and its result passed to complete_add"]
pub struct PendingAdd {
    generation: u64,
    placeholder: NodeId,
    pub post: PostId,
    pub request: NewComment,
}

impl PendingAdd {
    pub fn placeholder(&self) -> NodeId {
        self.placeholder
    }
}

#[derive(Debug)]
#[must_use = "the remote call must be dispatched and its result passed to complete_delete"]
pub struct PendingDelete {
    generation: u64,
    pub comment: CommentId,
    pub viewer: UserId,
}

#[derive(Debug)]
#[must_use = "the remote call must be dispatched and its result passed to complete_refresh"]
pub struct PendingRefresh {
    request: u64,
    pub post: PostId,
    pub viewer: UserId,
}

/// The comment thread of one open post, with optimistic local mutations
///
/// Every mutation is split in two. `begin_*` validates locally, applies the
/// optimistic change and returns a ticket naming the remote call to make.
/// `complete_*` takes the ticket back along with the call's result and
/// reconciles. Replacing the tree (refresh, failed like, close) bumps the
/// generation, after which completions of older tickets are ignored.
#[derive(Clone, Debug)]
pub struct CommentThread {
    post: PostRef,
    tree: CommentTree,
    generation: u64,
    latest_refresh: u64,
    needs_refresh: bool,
    closed: bool,
}

impl CommentThread {
    /// An empty thread, waiting for its first refresh
    pub fn new(post: PostRef) -> CommentThread {
        CommentThread {
            post,
            tree: CommentTree::new(),
            generation: 0,
            latest_refresh: 0,
            needs_refresh: true,
            closed: false,
        }
    }

    pub fn with_comments<I>(post: PostRef, records: I) -> CommentThread
    where
        I: IntoIterator<Item = api::Comment>,
    {
        CommentThread {
            tree: CommentTree::build(records),
            needs_refresh: false,
            ..CommentThread::new(post)
        }
    }

    pub fn post(&self) -> &PostRef {
        &self.post
    }

    pub fn tree(&self) -> &CommentTree {
        &self.tree
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The local tree was discarded and must be fetched again
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn rows(&self, viewer: UserId) -> Vec<Row<'_>> {
        presentation::rows(&self.tree, viewer, &self.post)
    }

    /// Stops accepting completions, for when the screen showing the thread
    /// goes away with calls still in flight
    pub fn close(&mut self) {
        self.closed = true;
        self.generation += 1;
    }

    pub fn begin_refresh(&mut self, viewer: UserId) -> PendingRefresh {
        self.latest_refresh += 1;
        PendingRefresh {
            request: self.latest_refresh,
            post: self.post.id,
            viewer,
        }
    }

    pub fn complete_refresh(
        &mut self,
        ticket: PendingRefresh,
        res: Result<Vec<api::Comment>, RemoteError>,
    ) -> Result<Outcome, Error> {
        if self.closed || ticket.request != self.latest_refresh {
            tracing::debug!(post=?self.post.id, "ignoring outdated comment list");
            return Ok(Outcome::Stale);
        }
        let records = res?;
        self.tree = CommentTree::build(records);
        self.generation += 1;
        self.needs_refresh = false;
        tracing::debug!(
            post=?self.post.id,
            comments = self.tree.len(),
            generation = self.generation,
            "loaded comment thread"
        );
        Ok(Outcome::Applied(()))
    }

    pub fn begin_like(&mut self, comment: CommentId, viewer: UserId) -> Result<PendingLike, Error> {
        let node = self
            .tree
            .find(comment)
            .ok_or(Error::UnknownComment(comment))?;
        self.tree.toggle_like(node);
        Ok(PendingLike {
            generation: self.generation,
            comment,
            viewer,
        })
    }

    /// On failure the whole tree is discarded; call [`Self::begin_refresh`]
    /// to get the server's view back
    pub fn complete_like(
        &mut self,
        ticket: PendingLike,
        res: Result<bool, RemoteError>,
    ) -> Result<Outcome, Error> {
        if self.is_stale(ticket.generation) {
            return Ok(Outcome::Stale);
        }
        match res {
            Ok(_) => Ok(Outcome::Applied(())),
            Err(e) => {
                tracing::info!(
                    comment=?ticket.comment,
                    error=%e,
                    "like toggle failed, discarding local thread"
                );
                self.discard();
                Err(e.into())
            }
        }
    }

    pub fn begin_add(
        &mut self,
        content: &str,
        parent: Option<CommentId>,
        viewer: &Viewer,
    ) -> Result<PendingAdd, Error> {
        let content = api::validate_content(content)?;
        let parent_node = match parent {
            None => None,
            Some(p) => Some(self.tree.find(p).ok_or(Error::UnknownComment(p))?),
        };
        let placeholder = Comment::placeholder(viewer, String::from(content), parent);
        let placeholder = self.tree.insert_first(parent_node, placeholder);
        Ok(PendingAdd {
            generation: self.generation,
            placeholder,
            post: self.post.id,
            request: NewComment {
                content: String::from(content),
                user_id: viewer.id,
                parent_id: parent,
            },
        })
    }

    /// Swaps the placeholder for the server's record, or removes it if the
    /// call failed
    pub fn complete_add(
        &mut self,
        ticket: PendingAdd,
        res: Result<api::Comment, RemoteError>,
    ) -> Result<Outcome<NodeId>, Error> {
        if self.is_stale(ticket.generation) {
            return Ok(Outcome::Stale);
        }
        match res {
            Ok(mut confirmed) => {
                confirmed.viewer_has_liked = false;
                if !self.tree.confirm(ticket.placeholder, Comment::from(confirmed)) {
                    tracing::warn!("placeholder vanished before its comment was confirmed");
                    return Ok(Outcome::Stale);
                }
                Ok(Outcome::Applied(ticket.placeholder))
            }
            Err(e) => {
                self.tree.remove(ticket.placeholder, Removal::RetainReplies);
                Err(e.into())
            }
        }
    }

    /// Checks the viewer may delete `comment`, without touching the tree
    pub fn begin_delete(
        &mut self,
        comment: CommentId,
        viewer: UserId,
    ) -> Result<PendingDelete, Error> {
        let node = self
            .tree
            .find(comment)
            .ok_or(Error::UnknownComment(comment))?;
        let author = self
            .tree
            .comment(node)
            .ok_or(Error::UnknownComment(comment))?
            .author_id;
        if !api::can_delete(viewer, author, self.post.author_id) {
            return Err(Error::NotAuthorized { viewer, comment });
        }
        Ok(PendingDelete {
            generation: self.generation,
            comment,
            viewer,
        })
    }

    /// Removes the comment once the server confirmed, returning how many
    /// comments left the tree
    pub fn complete_delete(
        &mut self,
        ticket: PendingDelete,
        res: Result<Deletion, RemoteError>,
    ) -> Result<Outcome<usize>, Error> {
        if self.is_stale(ticket.generation) {
            return Ok(Outcome::Stale);
        }
        let deletion = res?;
        let removal = match deletion.cascaded {
            true => Removal::Cascade,
            false => Removal::RetainReplies,
        };
        let removed = match self.tree.find(ticket.comment) {
            Some(node) => self.tree.remove(node, removal).len(),
            None => 0,
        };
        Ok(Outcome::Applied(removed))
    }

    fn is_stale(&self, generation: u64) -> bool {
        let stale = self.closed || generation != self.generation;
        if stale {
            tracing::debug!(
                post=?self.post.id,
                ticket = generation,
                current = self.generation,
                "ignoring completion for a replaced thread"
            );
        }
        stale
    }

    fn discard(&mut self) {
        self.tree = CommentTree::new();
        self.generation += 1;
        self.needs_refresh = true;
    }
}
