#![cfg(test)]

use std::{cmp, fmt::Debug, ops::RangeTo, panic::AssertUnwindSafe};

use agora_api::{
    Comment, CommentCreated, CommentId, CommentList, Deleted, Error as ApiError, LikeToggled,
    NewComment, NewPost, NewUser, PostId, PostList, PostResponse, UserCreated, UserId,
    ViewerRequest, STUB_UUID,
};
use agora_mock_server::MockServer;
use bolero::generator::TypeGenerator;
use axum::http::{self, request};
use tower::{Service, ServiceExt};

use crate::*;

macro_rules! do_tokio_test {
    ( $name:ident, $typ:ty, $fn:expr ) => {
        #[test]
        fn $name() {
            let runtime = AssertUnwindSafe(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed initializing tokio runtime"),
            );
            bolero::check!()
                .with_type::<$typ>()
                .cloned()
                .for_each(move |v| {
                    let () = runtime.block_on($fn(v));
                })
        }
    };
}

#[derive(Clone, Debug, bolero::generator::TypeGenerator)]
enum FuzzOp {
    CreateUser {
        #[generator(bolero::generator::gen_with::<String>().len(0..20usize))]
        name: String,
    },
    CreatePost {
        uid: usize,
        #[generator(bolero::generator::gen_with::<String>().len(0..40usize))]
        content: String,
        location: Option<String>,
        is_anonymous: bool,
    },
    DeletePost {
        uid: usize,
        pid: usize,
    },
    CreateComment {
        uid: usize,
        pid: usize,
        parent: Option<usize>,
        #[generator(bolero::generator::gen_with::<String>().len(0..40usize))]
        content: String,
    },
    ToggleLike {
        uid: usize,
        cid: usize,
    },
    DeleteComment {
        uid: usize,
        cid: usize,
    },
    FetchComments {
        uid: usize,
        pid: usize,
    },
    FetchPosts,
}

async fn call<Resp>(
    app: &mut Router,
    method: &str,
    uri: &str,
    body: Option<&impl serde::Serialize>,
) -> Result<Resp, ApiError>
where
    Resp: for<'de> serde::Deserialize<'de>,
{
    let req = request::Builder::new().method(method).uri(uri);
    let req = match body {
        Some(body) => req
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(
                serde_json::to_vec(body).expect("serializing request body to json"),
            )),
        None => req.body(axum::body::Body::empty()),
    }
    .expect("building request");
    app.ready().await.expect("waiting for app to be ready");
    let resp = app.call(req).await.expect("running request");
    let status = resp.status();
    let body = hyper::body::to_bytes(resp.into_body())
        .await
        .expect("recovering resp bytes");
    if status == http::StatusCode::OK {
        return Ok(serde_json::from_slice(&body).unwrap_or_else(|err| {
            panic!("failed parsing resp body for {method} {uri}: {err}, body is {body:?}")
        }));
    }
    Err(ApiError::parse(&body)
        .unwrap_or_else(|err| panic!("parsing error response body {err}, body is {body:?}")))
}

/// Ids differ between app and mock, so errors are compared by kind only
fn strip_ids(err: ApiError) -> ApiError {
    match err {
        ApiError::UserNotFound(_) => ApiError::UserNotFound(UserId(STUB_UUID)),
        ApiError::PostNotFound(_) => ApiError::PostNotFound(PostId(STUB_UUID)),
        ApiError::CommentNotFound(_) => ApiError::CommentNotFound(CommentId(STUB_UUID)),
        ApiError::ParentNotFound(_) => ApiError::ParentNotFound(CommentId(STUB_UUID)),
        err => err,
    }
}

fn compare<T>(name: &str, app_res: Result<T, ApiError>, mock_res: Result<T, ApiError>)
where
    T: Debug + PartialEq,
{
    assert_eq!(
        app_res.map_err(strip_ids),
        mock_res.map_err(strip_ids),
        "app and mock did not return the same result for {name}"
    );
}

fn resize_int(fuzz_id: usize, RangeTo { end }: RangeTo<usize>) -> Option<usize> {
    if end == 0 {
        return None;
    }
    let bucket_size = cmp::max(1, usize::MAX / end); // in case we rounded to 0
    let id = fuzz_id / bucket_size;
    Some(cmp::min(id, end - 1)) // in case id was actually over end - 1 due to rounding
}

/// The same entity, as known to the app and to the mock
struct Pair<T> {
    app: T,
    mock: T,
}

/// What both sides must agree on for a comment
#[derive(Debug, PartialEq)]
struct CommentView {
    index: Option<usize>,
    parent: Option<Option<usize>>,
    author: Option<usize>,
    content: String,
    like_count: u64,
    liked: bool,
}

struct ComparativeFuzzer {
    app: Router,
    mock: MockServer,
    users: Vec<Pair<UserId>>,
    posts: Vec<Pair<PostId>>,
    comments: Vec<Pair<CommentId>>,
}

impl ComparativeFuzzer {
    fn new(cascade: bool) -> ComparativeFuzzer {
        ComparativeFuzzer {
            app: app(Store::new(), CascadeDeletes(cascade)),
            mock: MockServer::new().with_cascading_deletes(cascade),
            users: Vec::new(),
            posts: Vec::new(),
            comments: Vec::new(),
        }
    }

    fn pick<'a, T>(v: &'a [Pair<T>], id: usize) -> Option<&'a Pair<T>> {
        resize_int(id, ..v.len()).map(|i| &v[i])
    }

    fn view(&self, c: &Comment, mock: bool) -> CommentView {
        let side = |p: &Pair<CommentId>| if mock { p.mock } else { p.app };
        let index = |id: CommentId| self.comments.iter().position(|p| side(p) == id);
        CommentView {
            index: index(c.id),
            parent: c.parent_id.map(index),
            author: self.users.iter().position(|u| {
                c.author_id == if mock { u.mock } else { u.app }
            }),
            content: c.content.clone(),
            like_count: c.like_count,
            liked: c.viewer_has_liked,
        }
    }

    async fn execute_fuzz_op(&mut self, op: FuzzOp) {
        match op {
            FuzzOp::CreateUser { name } => {
                let app_res: Result<UserCreated, _> =
                    call(&mut self.app, "POST", "/users", Some(&NewUser { name: name.clone() }))
                        .await;
                let mock_res = self.mock.create_user(NewUser { name });
                if let (Ok(app), Ok(mock)) = (&app_res, &mock_res) {
                    let app = app.user.as_ref().expect("successful user creation without user");
                    assert_eq!(app.name, mock.name);
                    self.users.push(Pair {
                        app: app.id,
                        mock: mock.id,
                    });
                }
                assert_eq!(self.users.len(), self.mock.test_num_users());
                compare("CreateUser", app_res.map(|_| ()), mock_res.map(|_| ()));
            }
            FuzzOp::CreatePost {
                uid,
                content,
                location,
                is_anonymous,
            } => {
                let Some(user) = Self::pick(&self.users, uid) else { return };
                let (app_user, mock_user) = (user.app, user.mock);
                let app_res: Result<PostResponse, _> = call(
                    &mut self.app,
                    "POST",
                    "/posts",
                    Some(&NewPost {
                        content: content.clone(),
                        user_id: app_user,
                        location: location.clone(),
                        is_anonymous,
                    }),
                )
                .await;
                let mock_res = self.mock.create_post(NewPost {
                    content,
                    user_id: mock_user,
                    location,
                    is_anonymous,
                });
                if let (Ok(app), Ok(mock)) = (&app_res, &mock_res) {
                    let app = app.post.as_ref().expect("successful post creation without post");
                    assert_eq!(
                        (&app.content, &app.author_name, &app.location, app.is_anonymous),
                        (&mock.content, &mock.author_name, &mock.location, mock.is_anonymous)
                    );
                    self.posts.push(Pair {
                        app: app.id,
                        mock: mock.id,
                    });
                }
                compare("CreatePost", app_res.map(|_| ()), mock_res.map(|_| ()));
            }
            FuzzOp::DeletePost { uid, pid } => {
                let (Some(user), Some(post)) =
                    (Self::pick(&self.users, uid), Self::pick(&self.posts, pid)) else { return };
                let (app_user, mock_user, app_post, mock_post) =
                    (user.app, user.mock, post.app, post.mock);
                let app_res: Result<Deleted, _> = call(
                    &mut self.app,
                    "DELETE",
                    &format!("/posts/{}", app_post.0),
                    Some(&ViewerRequest { user_id: app_user }),
                )
                .await;
                let mock_res = self.mock.delete_post(mock_post, mock_user);
                compare("DeletePost", app_res.map(|_| ()), mock_res);
            }
            FuzzOp::CreateComment {
                uid,
                pid,
                parent,
                content,
            } => {
                let (Some(user), Some(post)) =
                    (Self::pick(&self.users, uid), Self::pick(&self.posts, pid)) else { return };
                let (app_user, mock_user, app_post, mock_post) =
                    (user.app, user.mock, post.app, post.mock);
                let parent = match parent {
                    None => None,
                    Some(cid) => match Self::pick(&self.comments, cid) {
                        Some(c) => Some((c.app, c.mock)),
                        None => return,
                    },
                };
                let app_res: Result<CommentCreated, _> = call(
                    &mut self.app,
                    "POST",
                    &format!("/posts/{}/comments", app_post.0),
                    Some(&NewComment {
                        content: content.clone(),
                        user_id: app_user,
                        parent_id: parent.map(|p| p.0),
                    }),
                )
                .await;
                let mock_res = self.mock.create_comment(
                    mock_post,
                    NewComment {
                        content,
                        user_id: mock_user,
                        parent_id: parent.map(|p| p.1),
                    },
                );
                if let (Ok(app), Ok(mock)) = (&app_res, &mock_res) {
                    let app = app
                        .comment
                        .as_ref()
                        .expect("successful comment creation without comment");
                    self.comments.push(Pair {
                        app: app.id,
                        mock: mock.id,
                    });
                    assert_eq!(self.view(app, false), self.view(mock, true));
                }
                compare("CreateComment", app_res.map(|_| ()), mock_res.map(|_| ()));
            }
            FuzzOp::ToggleLike { uid, cid } => {
                let (Some(user), Some(comment)) =
                    (Self::pick(&self.users, uid), Self::pick(&self.comments, cid)) else { return };
                let (app_user, mock_user, app_comment, mock_comment) =
                    (user.app, user.mock, comment.app, comment.mock);
                let app_res: Result<LikeToggled, _> = call(
                    &mut self.app,
                    "POST",
                    &format!("/comments/{}/like", app_comment.0),
                    Some(&ViewerRequest { user_id: app_user }),
                )
                .await;
                let mock_res = self.mock.toggle_like(mock_comment, mock_user);
                compare(
                    "ToggleLike",
                    app_res.map(|r| (r.liked, r.like_count)),
                    mock_res,
                );
            }
            FuzzOp::DeleteComment { uid, cid } => {
                let (Some(user), Some(comment)) =
                    (Self::pick(&self.users, uid), Self::pick(&self.comments, cid)) else { return };
                let (app_user, mock_user, app_comment, mock_comment) =
                    (user.app, user.mock, comment.app, comment.mock);
                let app_res: Result<Deleted, _> = call(
                    &mut self.app,
                    "DELETE",
                    &format!("/comments/{}", app_comment.0),
                    Some(&ViewerRequest { user_id: app_user }),
                )
                .await;
                let mock_res = self.mock.delete_comment(mock_comment, mock_user);
                compare("DeleteComment", app_res.map(|r| r.cascaded), mock_res);
            }
            FuzzOp::FetchComments { uid, pid } => {
                let (Some(user), Some(post)) =
                    (Self::pick(&self.users, uid), Self::pick(&self.posts, pid)) else { return };
                let (app_user, mock_user, app_post, mock_post) =
                    (user.app, user.mock, post.app, post.mock);
                let app_res: Result<CommentList, _> = call(
                    &mut self.app,
                    "GET",
                    &format!("/posts/{}/comments?user_id={}", app_post.0, app_user.0),
                    None::<&()>,
                )
                .await;
                let mock_res = self.mock.fetch_comments(mock_post, mock_user);
                compare(
                    "FetchComments",
                    app_res.map(|r| {
                        r.comments
                            .iter()
                            .map(|c| self.view(c, false))
                            .collect::<Vec<_>>()
                    }),
                    mock_res.map(|cs| cs.iter().map(|c| self.view(c, true)).collect()),
                );
            }
            FuzzOp::FetchPosts => {
                let app_res: Result<PostList, _> =
                    call(&mut self.app, "GET", "/posts", None::<&()>).await;
                let summary = |posts: Vec<agora_api::Post>| {
                    posts
                        .into_iter()
                        .map(|p| {
                            (
                                p.content,
                                p.author_name,
                                p.location,
                                p.is_anonymous,
                                p.comment_count,
                            )
                        })
                        .collect::<Vec<_>>()
                };
                compare(
                    "FetchPosts",
                    app_res.map(|r| summary(r.posts)),
                    Ok(summary(self.mock.list_posts())),
                );
            }
        }
    }
}

do_tokio_test!(compare_with_mock, Vec<FuzzOp>, |test: Vec<FuzzOp>| async move {
    let mut fuzzer = ComparativeFuzzer::new(false);
    for op in test {
        fuzzer.execute_fuzz_op(op).await;
    }
});

do_tokio_test!(
    compare_with_cascading_mock,
    Vec<FuzzOp>,
    |test: Vec<FuzzOp>| async move {
        let mut fuzzer = ComparativeFuzzer::new(true);
        for op in test {
            fuzzer.execute_fuzz_op(op).await;
        }
    }
);

async fn scenario_app() -> (Router, UserId, UserId, PostId) {
    let mut app = app(Store::new(), CascadeDeletes(false));
    let user = |name: &str| NewUser {
        name: String::from(name),
    };
    let op: UserCreated = call(&mut app, "POST", "/users", Some(&user("op")))
        .await
        .expect("creating op");
    let lawyer: UserCreated = call(&mut app, "POST", "/users", Some(&user("lawyer")))
        .await
        .expect("creating lawyer");
    let (op, lawyer) = (
        op.user.expect("op was not returned").id,
        lawyer.user.expect("lawyer was not returned").id,
    );
    let post: PostResponse = call(
        &mut app,
        "POST",
        "/posts",
        Some(&NewPost {
            content: String::from("My employer withholds my last paycheck"),
            user_id: op,
            location: None,
            is_anonymous: false,
        }),
    )
    .await
    .expect("creating post");
    (app, op, lawyer, post.post.expect("post was not returned").id)
}

#[tokio::test]
async fn rejected_comments_use_error_envelope() {
    let (mut app, _, lawyer, post) = scenario_app().await;
    let res: Result<CommentCreated, _> = call(
        &mut app,
        "POST",
        &format!("/posts/{}/comments", post.0),
        Some(&NewComment {
            content: String::from("   "),
            user_id: lawyer,
            parent_id: None,
        }),
    )
    .await;
    assert_eq!(res, Err(ApiError::EmptyContent));
}

#[tokio::test]
async fn delete_reports_no_cascade_by_default() {
    let (mut app, op, lawyer, post) = scenario_app().await;
    let uri = format!("/posts/{}/comments", post.0);
    let root: CommentCreated = call(
        &mut app,
        "POST",
        &uri,
        Some(&NewComment {
            content: String::from("File a wage claim."),
            user_id: lawyer,
            parent_id: None,
        }),
    )
    .await
    .expect("creating root comment");
    let root = root.comment.expect("comment was not returned").id;
    let _: CommentCreated = call(
        &mut app,
        "POST",
        &uri,
        Some(&NewComment {
            content: String::from("Thanks, where?"),
            user_id: op,
            parent_id: Some(root),
        }),
    )
    .await
    .expect("creating reply");

    let deleted: Deleted = call(
        &mut app,
        "DELETE",
        &format!("/comments/{}", root.0),
        Some(&ViewerRequest { user_id: op }),
    )
    .await
    .expect("deleting root comment as post author");
    assert!(deleted.success);
    assert!(!deleted.cascaded);

    let left: CommentList = call(
        &mut app,
        "GET",
        &format!("{uri}?user_id={}", op.0),
        None::<&()>,
    )
    .await
    .expect("fetching comments");
    assert_eq!(left.comments.len(), 1);
    assert_eq!(left.comments[0].parent_id, Some(root));
}

#[tokio::test]
async fn anonymous_post_listing_hides_author() {
    let (mut app, _, lawyer, _) = scenario_app().await;
    let created: PostResponse = call(
        &mut app,
        "POST",
        "/posts",
        Some(&NewPost {
            content: String::from("Harassed at work, what are my options?"),
            user_id: lawyer,
            location: Some(String::from("Mumbai")),
            is_anonymous: true,
        }),
    )
    .await
    .expect("creating anonymous post");
    let created = created.post.expect("post was not returned");
    assert_eq!(created.author_name, agora_api::ANONYMOUS_AUTHOR);

    let listed: PostList = call(&mut app, "GET", "/posts", None::<&()>)
        .await
        .expect("listing posts");
    assert_eq!(listed.posts.len(), 2);
    assert_eq!(listed.posts[0].id, created.id);
    assert_eq!(listed.posts[0].author_name, agora_api::ANONYMOUS_AUTHOR);
    assert_eq!(listed.posts[0].location.as_deref(), Some("Mumbai"));
    assert_eq!(listed.posts[1].author_name, "op");
}

#[tokio::test]
async fn undecodable_requests_use_error_envelope() {
    let (mut app, op, _, post) = scenario_app().await;
    let invalid = |res: Result<serde_json::Value, ApiError>| {
        assert!(
            matches!(res, Err(ApiError::InvalidRequest(_))),
            "expected an invalid-request error, got {res:?}"
        )
    };

    let uri = format!("/posts/{}/comments", post.0);
    invalid(call(&mut app, "GET", &uri, None::<&()>).await);
    invalid(call(&mut app, "GET", &format!("{uri}?user_id=42"), None::<&()>).await);
    invalid(
        call(
            &mut app,
            "POST",
            &uri,
            Some(&serde_json::json!({ "content": 3, "user_id": op.0 })),
        )
        .await,
    );
    invalid(
        call(
            &mut app,
            "DELETE",
            "/comments/not-a-uuid",
            Some(&ViewerRequest { user_id: op }),
        )
        .await,
    );
}
