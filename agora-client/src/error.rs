use std::time::Duration;

use crate::api::{self, CommentId, UserId};

/// Failure of a call to the server
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("no answer from the server after {0:?}")]
    Timeout(Duration),

    #[error("server refused the request: {0}")]
    Server(#[from] api::Error),

    /// The server answered with `success: false` but no recognizable error
    #[error("server reported a failure: {}", .0.as_deref().unwrap_or("no details"))]
    Rejected(Option<String>),
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("a comment cannot be empty")]
    EmptyContent,

    #[error("comments cannot contain null bytes")]
    NullByte,

    #[error("user {viewer:?} may not delete comment {comment:?}")]
    NotAuthorized { viewer: UserId, comment: CommentId },

    #[error("comment {0:?} is not in this thread")]
    UnknownComment(CommentId),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A like toggle failed, and so did reloading the discarded thread
    #[error("{like}, then reloading the thread failed: {reload}")]
    ReloadFailed {
        like: RemoteError,
        reload: RemoteError,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Rejected locally before anything was sent
    Validation,

    /// Rejected locally before anything was sent
    Authorization,

    /// The operation targets something the local thread does not know
    NotFound,

    /// Sent, and failed on the way or on the server
    Remote,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyContent | Error::NullByte => ErrorKind::Validation,
            Error::NotAuthorized { .. } => ErrorKind::Authorization,
            Error::UnknownComment(_) => ErrorKind::NotFound,
            Error::Remote(_) | Error::ReloadFailed { .. } => ErrorKind::Remote,
        }
    }

    /// Whether the operation failed before reaching the network
    pub fn is_local(&self) -> bool {
        self.kind() != ErrorKind::Remote
    }
}

impl From<api::Error> for Error {
    fn from(e: api::Error) -> Error {
        match e {
            api::Error::EmptyContent => Error::EmptyContent,
            api::Error::NullByteInString(_) => Error::NullByte,
            e => Error::Remote(RemoteError::Server(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_and_remote_are_told_apart() {
        assert!(Error::EmptyContent.is_local());
        assert_eq!(
            Error::NotAuthorized {
                viewer: UserId::stub(),
                comment: CommentId(api::STUB_UUID),
            }
            .kind(),
            ErrorKind::Authorization
        );
        let timeout = Error::from(RemoteError::Timeout(Duration::from_secs(10)));
        assert!(!timeout.is_local());
        assert_eq!(
            Error::from(api::Error::PermissionDenied).kind(),
            ErrorKind::Remote
        );
        assert_eq!(Error::from(api::Error::EmptyContent), Error::EmptyContent);
    }

    #[test]
    fn messages_are_displayable() {
        assert_eq!(
            RemoteError::Rejected(None).to_string(),
            "server reported a failure: no details"
        );
        assert_eq!(
            Error::from(RemoteError::Rejected(Some(String::from("nope")))).to_string(),
            "server reported a failure: nope"
        );
        let both = Error::ReloadFailed {
            like: RemoteError::Network(String::from("reset")),
            reload: RemoteError::Timeout(Duration::from_secs(10)),
        };
        assert_eq!(
            both.to_string(),
            "network error: reset, then reloading the thread failed: no answer from the server after 10s"
        );
        assert_eq!(both.kind(), ErrorKind::Remote);
    }
}
