use agora_api::{
    CommentCreated, CommentId, CommentList, Deleted, LikeToggled, NewComment, NewPost, NewUser,
    PostId, PostList, PostResponse, UserCreated, UserId, Uuid, ViewerRequest,
};
use axum::{extract::State, Json};

use crate::{db, extractors::*, Error};

#[derive(serde::Deserialize)]
pub struct ViewerQuery {
    user_id: Uuid,
}

pub async fn create_user(
    mut conn: WriteConn,
    JsonBody(data): JsonBody<NewUser>,
) -> Result<Json<UserCreated>, Error> {
    let user = db::create_user(&mut conn, data)?;
    tracing::info!(id=?user.id, "created user");
    Ok(Json(UserCreated {
        success: true,
        user: Some(user),
    }))
}

pub async fn fetch_posts(conn: ReadConn) -> Json<PostList> {
    Json(PostList {
        success: true,
        posts: db::fetch_posts(&conn),
    })
}

pub async fn create_post(
    mut conn: WriteConn,
    JsonBody(data): JsonBody<NewPost>,
) -> Result<Json<PostResponse>, Error> {
    Ok(Json(PostResponse::ok(db::create_post(&mut conn, data)?)))
}

pub async fn fetch_post(
    conn: ReadConn,
    PathId(post): PathId,
) -> Result<Json<PostResponse>, Error> {
    Ok(Json(PostResponse::ok(db::fetch_post(&conn, PostId(post))?)))
}

pub async fn delete_post(
    mut conn: WriteConn,
    PathId(post): PathId,
    JsonBody(data): JsonBody<ViewerRequest>,
) -> Result<Json<Deleted>, Error> {
    db::delete_post(&mut conn, PostId(post), data.user_id)?;
    Ok(Json(Deleted {
        success: true,
        message: Some(String::from("Post deleted")),
        cascaded: true,
    }))
}

pub async fn fetch_comments(
    conn: ReadConn,
    PathId(post): PathId,
    QueryParams(viewer): QueryParams<ViewerQuery>,
) -> Result<Json<CommentList>, Error> {
    Ok(Json(CommentList::ok(db::fetch_comments(
        &conn,
        PostId(post),
        UserId(viewer.user_id),
    )?)))
}

pub async fn create_comment(
    mut conn: WriteConn,
    PathId(post): PathId,
    JsonBody(data): JsonBody<NewComment>,
) -> Result<Json<CommentCreated>, Error> {
    Ok(Json(CommentCreated::ok(db::create_comment(
        &mut conn,
        PostId(post),
        data,
    )?)))
}

pub async fn toggle_like(
    mut conn: WriteConn,
    PathId(comment): PathId,
    JsonBody(data): JsonBody<ViewerRequest>,
) -> Result<Json<LikeToggled>, Error> {
    let (liked, like_count) = db::toggle_like(&mut conn, CommentId(comment), data.user_id)?;
    Ok(Json(LikeToggled {
        success: true,
        liked,
        like_count,
    }))
}

pub async fn delete_comment(
    State(CascadeDeletes(cascade)): State<CascadeDeletes>,
    mut conn: WriteConn,
    PathId(comment): PathId,
    JsonBody(data): JsonBody<ViewerRequest>,
) -> Result<Json<Deleted>, Error> {
    let cascaded = db::delete_comment(&mut conn, CommentId(comment), data.user_id, cascade)?;
    Ok(Json(Deleted {
        success: true,
        message: Some(String::from("Comment deleted")),
        cascaded,
    }))
}
