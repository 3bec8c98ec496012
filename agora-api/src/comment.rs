use crate::{Time, UserId};

use uuid::Uuid;

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub Uuid);

/// A comment as the server sends it: flat, with a reference to its parent
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    #[serde(rename = "user_id")]
    pub author_id: UserId,
    #[serde(rename = "author")]
    pub author_name: String,
    pub content: String,
    pub created_at: Time,
    #[serde(default)]
    pub like_count: u64,

    /// Scoped to the user the list was fetched for
    #[serde(default, rename = "user_has_liked")]
    pub viewer_has_liked: bool,

    #[serde(default)]
    pub parent_id: Option<CommentId>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub content: String,
    pub user_id: UserId,
    pub parent_id: Option<CommentId>,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), crate::Error> {
        crate::validate_content(&self.content)?;
        Ok(())
    }
}
