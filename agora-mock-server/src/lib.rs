use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use agora_client::{
    api::{
        self, CommentId, Error, NewComment, NewPost, NewUser, Post, PostId, User, UserId, Uuid,
    },
    Deletion, Remote, RemoteError,
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

/// In-memory replica of the server's semantics
pub struct MockServer {
    users: BTreeMap<UserId, User>,
    posts: Vec<Post>,
    comments: Vec<DbComment>,
    cascade_deletes: bool,
}

#[derive(Debug)]
struct DbComment {
    post: PostId,
    comment: api::Comment,
    likes: HashSet<UserId>,
}

impl DbComment {
    fn for_viewer(&self, viewer: UserId) -> api::Comment {
        api::Comment {
            like_count: self.likes.len() as u64,
            viewer_has_liked: self.likes.contains(&viewer),
            ..self.comment.clone()
        }
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            users: BTreeMap::new(),
            posts: Vec::new(),
            comments: Vec::new(),
            cascade_deletes: false,
        }
    }

    pub fn with_cascading_deletes(mut self, cascade: bool) -> MockServer {
        self.cascade_deletes = cascade;
        self
    }

    /// Return the current number of users
    pub fn test_num_users(&self) -> usize {
        self.users.len()
    }

    /// Return the number of comments across all posts
    pub fn test_num_comments(&self) -> usize {
        self.comments.len()
    }

    pub fn create_user(&mut self, u: NewUser) -> Result<User, Error> {
        u.validate()?;
        let user = User {
            id: UserId(Uuid::new_v4()),
            name: String::from(u.name.trim()),
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn user(&self, id: UserId) -> Result<&User, Error> {
        self.users.get(&id).ok_or(Error::UserNotFound(id))
    }

    fn post(&self, id: PostId) -> Result<&Post, Error> {
        self.posts
            .iter()
            .find(|p| p.id == id)
            .ok_or(Error::PostNotFound(id))
    }

    fn with_count(&self, p: &Post) -> Post {
        Post {
            comment_count: self.comments.iter().filter(|c| c.post == p.id).count() as u64,
            ..p.clone()
        }
        .public()
    }

    pub fn create_post(&mut self, p: NewPost) -> Result<Post, Error> {
        let content = String::from(p.validate()?);
        let author = self.user(p.user_id)?;
        let post = Post {
            id: PostId(Uuid::new_v4()),
            author_id: author.id,
            author_name: author.name.clone(),
            content,
            created_at: Utc::now(),
            comment_count: 0,
            location: p.location(),
            is_anonymous: p.is_anonymous,
        };
        self.posts.push(post.clone());
        Ok(post.public())
    }

    /// Newest first
    pub fn list_posts(&self) -> Vec<Post> {
        self.posts.iter().rev().map(|p| self.with_count(p)).collect()
    }

    pub fn fetch_post(&self, id: PostId) -> Result<Post, Error> {
        Ok(self.with_count(self.post(id)?))
    }

    pub fn delete_post(&mut self, id: PostId, user: UserId) -> Result<(), Error> {
        if self.post(id)?.author_id != user {
            return Err(Error::PermissionDenied);
        }
        self.posts.retain(|p| p.id != id);
        self.comments.retain(|c| c.post != id);
        Ok(())
    }

    /// Oldest first, with like state scoped to `viewer`
    pub fn fetch_comments(&self, post: PostId, viewer: UserId) -> Result<Vec<api::Comment>, Error> {
        self.post(post)?;
        Ok(self
            .comments
            .iter()
            .filter(|c| c.post == post)
            .map(|c| c.for_viewer(viewer))
            .collect())
    }

    pub fn create_comment(&mut self, post: PostId, c: NewComment) -> Result<api::Comment, Error> {
        let content = String::from(api::validate_content(&c.content)?);
        self.post(post)?;
        let author = self.user(c.user_id)?.clone();
        if let Some(parent) = c.parent_id {
            if !self
                .comments
                .iter()
                .any(|db| db.post == post && db.comment.id == parent)
            {
                return Err(Error::ParentNotFound(parent));
            }
        }
        let comment = api::Comment {
            id: CommentId(Uuid::new_v4()),
            author_id: author.id,
            author_name: author.name,
            content,
            created_at: Utc::now(),
            like_count: 0,
            viewer_has_liked: false,
            parent_id: c.parent_id,
        };
        self.comments.push(DbComment {
            post,
            comment: comment.clone(),
            likes: HashSet::new(),
        });
        Ok(comment)
    }

    fn comment_mut(&mut self, id: CommentId) -> Result<&mut DbComment, Error> {
        self.comments
            .iter_mut()
            .find(|c| c.comment.id == id)
            .ok_or(Error::CommentNotFound(id))
    }

    /// Returns whether `user` now likes the comment, and the new like count
    pub fn toggle_like(&mut self, comment: CommentId, user: UserId) -> Result<(bool, u64), Error> {
        self.user(user)?;
        let c = self.comment_mut(comment)?;
        let liked = match c.likes.remove(&user) {
            true => false,
            false => c.likes.insert(user),
        };
        Ok((liked, c.likes.len() as u64))
    }

    /// Returns whether the replies were deleted along with the comment
    pub fn delete_comment(&mut self, comment: CommentId, user: UserId) -> Result<bool, Error> {
        let (post, author) = {
            let c = self.comment_mut(comment)?;
            (c.post, c.comment.author_id)
        };
        let post_author = self.post(post)?.author_id;
        if !api::can_delete(user, author, post_author) {
            return Err(Error::PermissionDenied);
        }
        let mut doomed = HashSet::new();
        doomed.insert(comment);
        if self.cascade_deletes {
            // comments are stored oldest first, so replies come after their parent
            for c in self.comments.iter() {
                if let Some(p) = c.comment.parent_id {
                    if doomed.contains(&p) {
                        doomed.insert(c.comment.id);
                    }
                }
            }
        }
        self.comments.retain(|c| !doomed.contains(&c.comment.id));
        Ok(self.cascade_deletes)
    }
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

/// Remote call recorded by [`MockRemote`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Call {
    FetchComments(PostId),
    CreateComment(PostId),
    ToggleLike(CommentId),
    DeleteComment(CommentId),
}

struct Inner {
    server: MockServer,
    calls: Vec<Call>,
    fail_next: usize,
    hang_next: usize,
}

/// Shares a [`MockServer`] as a [`Remote`], recording every call and
/// optionally failing or never answering the next ones
#[derive(Clone)]
pub struct MockRemote(Arc<Mutex<Inner>>);

impl MockRemote {
    pub fn new(server: MockServer) -> MockRemote {
        MockRemote(Arc::new(Mutex::new(Inner {
            server,
            calls: Vec::new(),
            fail_next: 0,
            hang_next: 0,
        })))
    }

    pub async fn with_server<T>(&self, f: impl FnOnce(&mut MockServer) -> T) -> T {
        f(&mut self.0.lock().await.server)
    }

    /// Every call received so far, in order
    pub async fn calls(&self) -> Vec<Call> {
        self.0.lock().await.calls.clone()
    }

    /// The next `n` calls fail with a network error without reaching the server
    pub async fn fail_next(&self, n: usize) {
        self.0.lock().await.fail_next = n;
    }

    /// The next `n` calls never complete
    pub async fn hang_next(&self, n: usize) {
        self.0.lock().await.hang_next = n;
    }

    async fn call<T>(
        &self,
        call: Call,
        f: impl FnOnce(&mut MockServer) -> Result<T, Error>,
    ) -> Result<T, RemoteError> {
        let mut inner = self.0.lock().await;
        inner.calls.push(call);
        if inner.hang_next > 0 {
            inner.hang_next -= 1;
            drop(inner);
            futures::future::pending::<()>().await;
            unreachable!()
        }
        if inner.fail_next > 0 {
            inner.fail_next -= 1;
            return Err(RemoteError::Network(String::from("injected failure")));
        }
        f(&mut inner.server).map_err(RemoteError::Server)
    }
}

#[async_trait]
impl Remote for MockRemote {
    async fn fetch_comments(
        &self,
        post: PostId,
        viewer: UserId,
    ) -> Result<Vec<api::Comment>, RemoteError> {
        self.call(Call::FetchComments(post), |s| s.fetch_comments(post, viewer))
            .await
    }

    async fn create_comment(
        &self,
        post: PostId,
        comment: NewComment,
    ) -> Result<api::Comment, RemoteError> {
        self.call(Call::CreateComment(post), |s| s.create_comment(post, comment))
            .await
    }

    async fn toggle_like(&self, comment: CommentId, viewer: UserId) -> Result<bool, RemoteError> {
        self.call(Call::ToggleLike(comment), |s| {
            s.toggle_like(comment, viewer).map(|(liked, _)| liked)
        })
        .await
    }

    async fn delete_comment(
        &self,
        comment: CommentId,
        viewer: UserId,
    ) -> Result<Deletion, RemoteError> {
        self.call(Call::DeleteComment(comment), |s| {
            s.delete_comment(comment, viewer)
                .map(|cascaded| Deletion { cascaded })
        })
        .await
    }
}
