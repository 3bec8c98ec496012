use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

use axum::{
    async_trait,
    body::HttpBody,
    extract::{FromRequest, FromRequestParts, Path, Query},
    http::{request, Request},
    BoxError, Json,
};
use serde::de::DeserializeOwned;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

use crate::{db::Db, Error};

#[derive(Clone, axum::extract::FromRef)]
pub struct AppState {
    pub db: Store,
    pub cascade: CascadeDeletes,
}

/// Whether deleting a comment also deletes the replies below it
#[derive(Clone, Copy, Debug)]
pub struct CascadeDeletes(pub bool);

#[derive(Clone, Default)]
pub struct Store(Arc<RwLock<Db>>);

impl Store {
    pub fn new() -> Store {
        Store::default()
    }

    pub async fn read(&self) -> ReadConn {
        ReadConn(self.0.clone().read_owned().await)
    }

    pub async fn write(&self) -> WriteConn {
        WriteConn(self.0.clone().write_owned().await)
    }
}

pub struct ReadConn(OwnedRwLockReadGuard<Db>);

#[async_trait]
impl FromRequestParts<AppState> for ReadConn {
    type Rejection = Error;

    async fn from_request_parts(
        _req: &mut request::Parts,
        state: &AppState,
    ) -> Result<ReadConn, Error> {
        Ok(state.db.read().await)
    }
}

impl Deref for ReadConn {
    type Target = Db;

    fn deref(&self) -> &Db {
        &self.0
    }
}

pub struct WriteConn(OwnedRwLockWriteGuard<Db>);

#[async_trait]
impl FromRequestParts<AppState> for WriteConn {
    type Rejection = Error;

    async fn from_request_parts(
        _req: &mut request::Parts,
        state: &AppState,
    ) -> Result<WriteConn, Error> {
        Ok(state.db.write().await)
    }
}

impl Deref for WriteConn {
    type Target = Db;

    fn deref(&self) -> &Db {
        &self.0
    }
}

impl DerefMut for WriteConn {
    fn deref_mut(&mut self) -> &mut Db {
        &mut self.0
    }
}

/// JSON body whose decoding failures use the API error envelope
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, B, T> FromRequest<S, B> for JsonBody<T>
where
    T: DeserializeOwned,
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request<B>, state: &S) -> Result<JsonBody<T>, Error> {
        let Json(data) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(data))
    }
}

/// Query string, decoded like [`JsonBody`]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        req: &mut request::Parts,
        state: &S,
    ) -> Result<QueryParams<T>, Error> {
        let Query(data) = Query::<T>::from_request_parts(req, state).await?;
        Ok(QueryParams(data))
    }
}

/// The uuid in a `/posts/:id` or `/comments/:id` route
pub struct PathId(pub agora_api::Uuid);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for PathId {
    type Rejection = Error;

    async fn from_request_parts(req: &mut request::Parts, state: &S) -> Result<PathId, Error> {
        let Path(id) = Path::<agora_api::Uuid>::from_request_parts(req, state).await?;
        Ok(PathId(id))
    }
}
