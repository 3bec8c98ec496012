mod comment;
pub use comment::Comment;

mod config;
pub use config::ThreadConfig;

mod error;
pub use error::{Error, ErrorKind, RemoteError};

mod http;
pub use http::HttpRemote;

pub mod presentation;

mod remote;
pub use remote::{Deletion, Remote};

mod sync;
pub use sync::ThreadClient;

mod thread;
pub use thread::{
    CommentThread, Outcome, PendingAdd, PendingDelete, PendingLike, PendingRefresh, PostRef,
};

mod tree;
pub use tree::{CommentTree, Node, NodeId, Removal};

pub mod api {
    pub use agora_api::*;
}
