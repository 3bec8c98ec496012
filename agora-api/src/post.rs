use crate::{Time, UserId, STUB_UUID};

use uuid::Uuid;

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct PostId(pub Uuid);

impl PostId {
    pub fn stub() -> PostId {
        PostId(STUB_UUID)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Post {
    pub id: PostId,
    #[serde(rename = "user_id")]
    pub author_id: UserId,
    #[serde(rename = "author")]
    pub author_name: String,
    pub content: String,
    pub created_at: Time,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Display name shown instead of the author of an anonymous post
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

impl Post {
    /// The post as shown to readers: anonymous posts lose their author name
    ///
    /// The author id stays, as it decides who may delete the post's comments.
    pub fn public(self) -> Post {
        match self.is_anonymous {
            true => Post {
                author_name: String::from(ANONYMOUS_AUTHOR),
                ..self
            },
            false => self,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewPost {
    pub content: String,
    pub user_id: UserId,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

impl NewPost {
    /// Returns the trimmed content
    pub fn validate(&self) -> Result<&str, crate::Error> {
        if let Some(l) = &self.location {
            crate::validate_string(l)?;
        }
        crate::validate_content(&self.content)
    }

    /// Blank locations count as none
    pub fn location(&self) -> Option<String> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
    }
}
