use async_trait::async_trait;

use crate::{
    api::{self, CommentId, NewComment, PostId, UserId},
    RemoteError,
};

/// How the server handled a deletion
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Deletion {
    /// The server also removed every reply below the comment
    pub cascaded: bool,
}

/// The calls a comment thread makes to the server
#[async_trait]
pub trait Remote {
    /// Flat list of the post's comments, with like state scoped to `viewer`
    async fn fetch_comments(
        &self,
        post: PostId,
        viewer: UserId,
    ) -> Result<Vec<api::Comment>, RemoteError>;

    async fn create_comment(
        &self,
        post: PostId,
        comment: NewComment,
    ) -> Result<api::Comment, RemoteError>;

    /// Toggles `viewer`'s like, returning whether the comment is now liked
    async fn toggle_like(&self, comment: CommentId, viewer: UserId) -> Result<bool, RemoteError>;

    async fn delete_comment(
        &self,
        comment: CommentId,
        viewer: UserId,
    ) -> Result<Deletion, RemoteError>;
}

#[async_trait]
impl<R: Remote + Send + Sync + ?Sized> Remote for &R {
    async fn fetch_comments(
        &self,
        post: PostId,
        viewer: UserId,
    ) -> Result<Vec<api::Comment>, RemoteError> {
        (**self).fetch_comments(post, viewer).await
    }

    async fn create_comment(
        &self,
        post: PostId,
        comment: NewComment,
    ) -> Result<api::Comment, RemoteError> {
        (**self).create_comment(post, comment).await
    }

    async fn toggle_like(&self, comment: CommentId, viewer: UserId) -> Result<bool, RemoteError> {
        (**self).toggle_like(comment, viewer).await
    }

    async fn delete_comment(
        &self,
        comment: CommentId,
        viewer: UserId,
    ) -> Result<Deletion, RemoteError> {
        (**self).delete_comment(comment, viewer).await
    }
}
