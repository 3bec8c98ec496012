pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<chrono::Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

mod comment;
pub use comment::{Comment, CommentId, NewComment};

mod error;
pub use error::Error;

mod post;
pub use post::{NewPost, Post, PostId, ANONYMOUS_AUTHOR};

mod response;
pub use response::*;

mod user;
pub use user::{NewUser, User, UserId, Viewer};

pub fn validate_string(s: &str) -> Result<(), Error> {
    match s.contains('\0') {
        true => Err(Error::NullByteInString(String::from(s))),
        false => Ok(()),
    }
}

/// Checks user-provided text (comment or post body) and returns it trimmed
pub fn validate_content(s: &str) -> Result<&str, Error> {
    validate_string(s)?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyContent);
    }
    Ok(trimmed)
}

/// Whether `viewer` may delete a comment written by `comment_author` under a
/// post written by `post_author`
///
/// Clients use this only to decide what to offer; the server checks it again.
pub fn can_delete(viewer: UserId, comment_author: UserId, post_author: UserId) -> bool {
    viewer == comment_author || viewer == post_author
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_validation() {
        assert_eq!(validate_content(""), Err(Error::EmptyContent));
        assert_eq!(validate_content("   \n\t"), Err(Error::EmptyContent));
        assert_eq!(validate_content("  hello "), Ok("hello"));
        assert_eq!(
            validate_content("a\0b"),
            Err(Error::NullByteInString(String::from("a\0b")))
        );
    }

    #[test]
    fn deletion_rights() {
        let (alice, bob, carol) = (
            UserId(Uuid::new_v4()),
            UserId(Uuid::new_v4()),
            UserId(Uuid::new_v4()),
        );
        // alice wrote the post, bob wrote the comment
        assert!(can_delete(alice, bob, alice));
        assert!(can_delete(bob, bob, alice));
        assert!(!can_delete(carol, bob, alice));
    }
}
