use async_trait::async_trait;

use crate::{
    api::{
        self, CommentCreated, CommentId, CommentList, Deleted, LikeToggled, NewComment, NewPost,
        NewUser, Post, PostId, PostList, PostResponse, User, UserCreated, UserId, ViewerRequest,
    },
    Deletion, Remote, RemoteError,
};

/// [`Remote`] talking JSON over HTTP to an agora server
#[derive(Clone, Debug)]
pub struct HttpRemote {
    client: reqwest::Client,
    host: String,
}

impl HttpRemote {
    pub fn new(host: impl Into<String>) -> HttpRemote {
        let host = host.into();
        HttpRemote {
            client: reqwest::Client::new(),
            host: String::from(host.trim_end_matches('/')),
        }
    }

    pub async fn create_user(&self, name: String) -> Result<User, RemoteError> {
        let resp: UserCreated = send(
            self.client
                .post(format!("{}/users", self.host))
                .json(&NewUser { name }),
        )
        .await?;
        match resp {
            UserCreated {
                success: true,
                user: Some(user),
            } => Ok(user),
            _ => Err(RemoteError::Rejected(None)),
        }
    }

    /// Lists posts, newest first
    pub async fn list_posts(&self) -> Result<Vec<Post>, RemoteError> {
        let resp: PostList = send(self.client.get(format!("{}/posts", self.host))).await?;
        match resp.success {
            true => Ok(resp.posts),
            false => Err(RemoteError::Rejected(None)),
        }
    }

    pub async fn fetch_post(&self, post: PostId) -> Result<Post, RemoteError> {
        let resp: PostResponse =
            send(self.client.get(format!("{}/posts/{}", self.host, post.0))).await?;
        expect_post(resp)
    }

    pub async fn create_post(&self, post: NewPost) -> Result<Post, RemoteError> {
        let resp: PostResponse = send(
            self.client
                .post(format!("{}/posts", self.host))
                .json(&post),
        )
        .await?;
        expect_post(resp)
    }

    pub async fn delete_post(&self, post: PostId, user_id: UserId) -> Result<(), RemoteError> {
        let resp: Deleted = send(
            self.client
                .delete(format!("{}/posts/{}", self.host, post.0))
                .json(&ViewerRequest { user_id }),
        )
        .await?;
        match resp.success {
            true => Ok(()),
            false => Err(RemoteError::Rejected(resp.message)),
        }
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn fetch_comments(
        &self,
        post: PostId,
        viewer: UserId,
    ) -> Result<Vec<api::Comment>, RemoteError> {
        let resp: CommentList = send(
            self.client
                .get(format!("{}/posts/{}/comments", self.host, post.0))
                .query(&ViewerRequest { user_id: viewer }),
        )
        .await?;
        match resp.success {
            true => Ok(resp.comments),
            false => Err(RemoteError::Rejected(None)),
        }
    }

    async fn create_comment(
        &self,
        post: PostId,
        comment: NewComment,
    ) -> Result<api::Comment, RemoteError> {
        let resp: CommentCreated = send(
            self.client
                .post(format!("{}/posts/{}/comments", self.host, post.0))
                .json(&comment),
        )
        .await?;
        match resp {
            CommentCreated {
                success: true,
                comment: Some(comment),
                ..
            } => Ok(comment),
            CommentCreated { message, .. } => Err(RemoteError::Rejected(message)),
        }
    }

    async fn toggle_like(&self, comment: CommentId, viewer: UserId) -> Result<bool, RemoteError> {
        let resp: LikeToggled = send(
            self.client
                .post(format!("{}/comments/{}/like", self.host, comment.0))
                .json(&ViewerRequest { user_id: viewer }),
        )
        .await?;
        match resp.success {
            true => Ok(resp.liked),
            false => Err(RemoteError::Rejected(None)),
        }
    }

    async fn delete_comment(
        &self,
        comment: CommentId,
        viewer: UserId,
    ) -> Result<Deletion, RemoteError> {
        let resp: Deleted = send(
            self.client
                .delete(format!("{}/comments/{}", self.host, comment.0))
                .json(&ViewerRequest { user_id: viewer }),
        )
        .await?;
        match resp.success {
            true => Ok(Deletion {
                cascaded: resp.cascaded,
            }),
            false => Err(RemoteError::Rejected(resp.message)),
        }
    }
}

fn expect_post(resp: PostResponse) -> Result<Post, RemoteError> {
    match resp {
        PostResponse {
            success: true,
            post: Some(post),
        } => Ok(post),
        _ => Err(RemoteError::Rejected(None)),
    }
}

async fn send<R>(req: reqwest::RequestBuilder) -> Result<R, RemoteError>
where
    R: for<'de> serde::Deserialize<'de>,
{
    let resp = req.send().await.map_err(network_error)?;
    let status = resp.status();
    let body = resp.bytes().await.map_err(network_error)?;
    if !status.is_success() {
        return Err(match api::Error::parse(&body) {
            Ok(err) => RemoteError::Server(err),
            Err(_) => RemoteError::Rejected(Some(format!("server answered {status}"))),
        });
    }
    serde_json::from_slice(&body).map_err(|err| {
        tracing::warn!(?err, "failed parsing server response");
        RemoteError::Rejected(Some(format!("malformed server response: {err}")))
    })
}

fn network_error(err: reqwest::Error) -> RemoteError {
    RemoteError::Network(err.to_string())
}
