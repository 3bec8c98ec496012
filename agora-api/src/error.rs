use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde_json::json;
use uuid::Uuid;

use crate::{CommentId, PostId, UserId};

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Content must not be empty")]
    EmptyContent,

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("User {0:?} does not exist")]
    UserNotFound(UserId),

    #[error("Post {0:?} does not exist")]
    PostNotFound(PostId),

    #[error("Comment {0:?} does not exist")]
    CommentNotFound(CommentId),

    #[error("Parent comment {0:?} does not exist in this post")]
    ParentNotFound(CommentId),

    /// The request could not be decoded: bad JSON, bad id, missing parameter
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::EmptyContent => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::UserNotFound(_) => StatusCode::NOT_FOUND,
            Error::PostNotFound(_) => StatusCode::NOT_FOUND,
            Error::CommentNotFound(_) => StatusCode::NOT_FOUND,
            Error::ParentNotFound(_) => StatusCode::BAD_REQUEST,
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "success": false,
                "message": msg,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "success": false,
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::EmptyContent => json!({
                "success": false,
                "message": "content must not be empty",
                "type": "empty-content",
            }),
            Error::NullByteInString(s) => json!({
                "success": false,
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::UserNotFound(UserId(id)) => json!({
                "success": false,
                "message": "user not found",
                "type": "user-not-found",
                "uuid": id,
            }),
            Error::PostNotFound(PostId(id)) => json!({
                "success": false,
                "message": "post not found",
                "type": "post-not-found",
                "uuid": id,
            }),
            Error::CommentNotFound(CommentId(id)) => json!({
                "success": false,
                "message": "comment not found",
                "type": "comment-not-found",
                "uuid": id,
            }),
            Error::ParentNotFound(CommentId(id)) => json!({
                "success": false,
                "message": "parent comment not found in this post",
                "type": "parent-not-found",
                "uuid": id,
            }),
            Error::InvalidRequest(details) => json!({
                "success": false,
                "message": "invalid request",
                "type": "invalid-request",
                "details": details,
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let uuid = || {
            data.get("uuid")
                .and_then(|uuid| uuid.as_str())
                .and_then(|uuid| Uuid::from_str(uuid).ok())
                .ok_or_else(|| anyhow!("error is about a missing item without a proper uuid"))
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(String::from(
                    data.get("message")
                        .and_then(|msg| msg.as_str())
                        .unwrap_or(""),
                )),
                "permission-denied" => Error::PermissionDenied,
                "empty-content" => Error::EmptyContent,
                "null-byte" => Error::NullByteInString(String::from(
                    data.get("string").and_then(|s| s.as_str()).ok_or_else(|| {
                        anyhow!("error is a null-byte-in-string without a string")
                    })?,
                )),
                "user-not-found" => Error::UserNotFound(UserId(uuid()?)),
                "post-not-found" => Error::PostNotFound(PostId(uuid()?)),
                "comment-not-found" => Error::CommentNotFound(CommentId(uuid()?)),
                "parent-not-found" => Error::ParentNotFound(CommentId(uuid()?)),
                "invalid-request" => Error::InvalidRequest(String::from(
                    data.get("details")
                        .and_then(|d| d.as_str())
                        .unwrap_or(""),
                )),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}
