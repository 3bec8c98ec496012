//! Request bodies and success envelopes of the REST surface
//!
//! Every successful response carries `success: true`; failures are reported
//! through [`crate::Error::contents`] with `success: false`.

use crate::{Comment, Post, User, UserId};

/// Body (or query string) of the calls that only identify the acting user
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ViewerRequest {
    pub user_id: UserId,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentList {
    pub success: bool,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentCreated {
    pub success: bool,
    pub comment: Option<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LikeToggled {
    pub success: bool,
    /// Whether the user likes the comment after the toggle
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub like_count: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Deleted {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Set when the server also removed every reply below the comment
    #[serde(default)]
    pub cascaded: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct UserCreated {
    pub success: bool,
    pub user: Option<User>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PostList {
    pub success: bool,
    #[serde(default)]
    pub posts: Vec<Post>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PostResponse {
    pub success: bool,
    pub post: Option<Post>,
}

impl CommentList {
    pub fn ok(comments: Vec<Comment>) -> CommentList {
        CommentList {
            success: true,
            comments,
        }
    }
}

impl CommentCreated {
    pub fn ok(comment: Comment) -> CommentCreated {
        CommentCreated {
            success: true,
            comment: Some(comment),
            message: None,
        }
    }
}

impl PostResponse {
    pub fn ok(post: Post) -> PostResponse {
        PostResponse {
            success: true,
            post: Some(post),
        }
    }
}
