use chrono::Utc;

use crate::api::{self, CommentId, Time, UserId, Viewer};

/// A comment as held by the client
///
/// Replies are not stored here: the [`crate::CommentTree`] owning the comment
/// keeps the parent/child links.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comment {
    /// None until the server has confirmed the comment
    pub id: Option<CommentId>,
    pub author_id: UserId,
    pub author_name: String,
    pub content: String,
    pub created_at: Time,
    pub like_count: u64,
    pub viewer_has_liked: bool,
    pub parent_id: Option<CommentId>,
}

impl From<api::Comment> for Comment {
    fn from(c: api::Comment) -> Comment {
        Comment {
            id: Some(c.id),
            author_id: c.author_id,
            author_name: c.author_name,
            content: c.content,
            created_at: c.created_at,
            like_count: c.like_count,
            viewer_has_liked: c.viewer_has_liked,
            parent_id: c.parent_id,
        }
    }
}

impl Comment {
    pub fn placeholder(viewer: &Viewer, content: String, parent_id: Option<CommentId>) -> Comment {
        Comment {
            id: None,
            author_id: viewer.id,
            author_name: viewer.name.clone(),
            content,
            created_at: Utc::now(),
            like_count: 0,
            viewer_has_liked: false,
            parent_id,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.id.is_none()
    }

    /// Flips the viewer's like, returning the new state
    pub fn toggle_like(&mut self) -> bool {
        self.viewer_has_liked = !self.viewer_has_liked;
        self.like_count = match self.viewer_has_liked {
            true => self.like_count.saturating_add(1),
            false => self.like_count.saturating_sub(1),
        };
        self.viewer_has_liked
    }

    /// Converts back to the wire representation, if the comment is confirmed
    pub fn to_api(&self) -> Option<api::Comment> {
        Some(api::Comment {
            id: self.id?,
            author_id: self.author_id,
            author_name: self.author_name.clone(),
            content: self.content.clone(),
            created_at: self.created_at,
            like_count: self.like_count,
            viewer_has_liked: self.viewer_has_liked,
            parent_id: self.parent_id,
        })
    }
}
