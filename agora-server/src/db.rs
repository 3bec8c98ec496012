//! In-memory tables backing the REST handlers
//!
//! Rows carry a monotonic sequence number so listings keep insertion order
//! regardless of hash map iteration order.

use std::collections::{HashMap, HashSet};

use agora_api::{
    Comment, CommentId, Error as ApiError, NewComment, NewPost, NewUser, Post, PostId, User,
    UserId, Uuid,
};
use chrono::Utc;

use crate::Error;

#[derive(Default)]
pub struct Db {
    seq: u64,
    users: HashMap<UserId, User>,
    posts: HashMap<PostId, PostRow>,
    comments: HashMap<CommentId, CommentRow>,
    likes: HashMap<CommentId, HashSet<UserId>>,
}

struct PostRow {
    seq: u64,
    post: Post,
}

struct CommentRow {
    seq: u64,
    post: PostId,
    comment: Comment,
}

impl Db {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn user(&self, id: UserId) -> Result<&User, Error> {
        Ok(self.users.get(&id).ok_or(ApiError::UserNotFound(id))?)
    }

    fn post(&self, id: PostId) -> Result<&PostRow, Error> {
        Ok(self.posts.get(&id).ok_or(ApiError::PostNotFound(id))?)
    }

    fn comment(&self, id: CommentId) -> Result<&CommentRow, Error> {
        Ok(self.comments.get(&id).ok_or(ApiError::CommentNotFound(id))?)
    }

    fn like_count(&self, comment: CommentId) -> u64 {
        self.likes.get(&comment).map_or(0, |l| l.len() as u64)
    }

    fn has_liked(&self, comment: CommentId, user: UserId) -> bool {
        self.likes.get(&comment).map_or(false, |l| l.contains(&user))
    }

    fn comment_count(&self, post: PostId) -> u64 {
        self.comments.values().filter(|c| c.post == post).count() as u64
    }

    fn post_with_count(&self, row: &PostRow) -> Post {
        Post {
            comment_count: self.comment_count(row.post.id),
            ..row.post.clone()
        }
        .public()
    }
}

pub fn create_user(db: &mut Db, u: NewUser) -> Result<User, Error> {
    u.validate()?;
    let user = User {
        id: UserId(Uuid::new_v4()),
        name: String::from(u.name.trim()),
    };
    db.users.insert(user.id, user.clone());
    Ok(user)
}

/// Newest first
pub fn fetch_posts(db: &Db) -> Vec<Post> {
    let mut rows = db.posts.values().collect::<Vec<_>>();
    rows.sort_unstable_by_key(|r| std::cmp::Reverse(r.seq));
    rows.into_iter().map(|r| db.post_with_count(r)).collect()
}

pub fn fetch_post(db: &Db, post: PostId) -> Result<Post, Error> {
    Ok(db.post_with_count(db.post(post)?))
}

pub fn create_post(db: &mut Db, p: NewPost) -> Result<Post, Error> {
    let content = String::from(p.validate()?);
    let author = db.user(p.user_id)?.clone();
    let post = Post {
        id: PostId(Uuid::new_v4()),
        author_id: author.id,
        author_name: author.name,
        content,
        created_at: Utc::now(),
        comment_count: 0,
        location: p.location(),
        is_anonymous: p.is_anonymous,
    };
    let seq = db.next_seq();
    db.posts.insert(
        post.id,
        PostRow {
            seq,
            post: post.clone(),
        },
    );
    Ok(post.public())
}

/// Removes the post along with all its comments and their likes
pub fn delete_post(db: &mut Db, post: PostId, user: UserId) -> Result<(), Error> {
    if db.post(post)?.post.author_id != user {
        return Err(Error::permission_denied());
    }
    db.posts.remove(&post);
    let removed = db
        .comments
        .iter()
        .filter(|(_, c)| c.post == post)
        .map(|(id, _)| *id)
        .collect::<HashSet<_>>();
    db.comments.retain(|id, _| !removed.contains(id));
    db.likes.retain(|c, _| !removed.contains(c));
    Ok(())
}

/// Oldest first, `user_has_liked` computed for `viewer`
pub fn fetch_comments(db: &Db, post: PostId, viewer: UserId) -> Result<Vec<Comment>, Error> {
    db.post(post)?;
    let mut rows = db
        .comments
        .values()
        .filter(|c| c.post == post)
        .collect::<Vec<_>>();
    rows.sort_unstable_by_key(|r| r.seq);
    Ok(rows
        .into_iter()
        .map(|r| Comment {
            like_count: db.like_count(r.comment.id),
            viewer_has_liked: db.has_liked(r.comment.id, viewer),
            ..r.comment.clone()
        })
        .collect())
}

pub fn create_comment(db: &mut Db, post: PostId, c: NewComment) -> Result<Comment, Error> {
    let content = String::from(agora_api::validate_content(&c.content)?);
    db.post(post)?;
    let author = db.user(c.user_id)?.clone();
    if let Some(parent) = c.parent_id {
        match db.comments.get(&parent) {
            Some(p) if p.post == post => (),
            _ => return Err(Error::Api(ApiError::ParentNotFound(parent))),
        }
    }
    let comment = Comment {
        id: CommentId(Uuid::new_v4()),
        author_id: author.id,
        author_name: author.name,
        content,
        created_at: Utc::now(),
        like_count: 0,
        viewer_has_liked: false,
        parent_id: c.parent_id,
    };
    let seq = db.next_seq();
    db.comments.insert(
        comment.id,
        CommentRow {
            seq,
            post,
            comment: comment.clone(),
        },
    );
    Ok(comment)
}

/// Returns whether `user` likes the comment after the toggle, and the new count
pub fn toggle_like(db: &mut Db, comment: CommentId, user: UserId) -> Result<(bool, u64), Error> {
    db.user(user)?;
    db.comment(comment)?;
    let likers = db.likes.entry(comment).or_default();
    let liked = match likers.remove(&user) {
        true => false,
        false => likers.insert(user),
    };
    Ok((liked, db.like_count(comment)))
}

/// Returns whether replies were removed along with the comment
pub fn delete_comment(
    db: &mut Db,
    comment: CommentId,
    user: UserId,
    cascade: bool,
) -> Result<bool, Error> {
    let row = db.comment(comment)?;
    let post_author = db.post(row.post)?.post.author_id;
    if !agora_api::can_delete(user, row.comment.author_id, post_author) {
        return Err(Error::permission_denied());
    }
    let mut removed = HashSet::from([comment]);
    if cascade {
        let mut todo = vec![comment];
        while let Some(parent) = todo.pop() {
            for (id, c) in db.comments.iter() {
                if c.comment.parent_id == Some(parent) && removed.insert(*id) {
                    todo.push(*id);
                }
            }
        }
    }
    tracing::debug!(?comment, removed = removed.len(), "deleting comments");
    db.comments.retain(|id, _| !removed.contains(id));
    db.likes.retain(|c, _| !removed.contains(c));
    Ok(cascade)
}
