use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    routing::{delete, get, post},
    Router,
};
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

mod db;
mod error;
mod extractors;
mod fuzz;
mod handlers;

use error::Error;
use extractors::{AppState, CascadeDeletes, Store};

#[derive(Debug, StructOpt)]
#[structopt(name = "agora-server", about = "Serves posts and comment threads from memory")]
struct Opt {
    /// Address to listen on
    #[structopt(long, env = "AGORA_LISTEN", default_value = "127.0.0.1:5001")]
    listen: SocketAddr,

    /// Delete the replies along with a deleted comment, instead of keeping them
    #[structopt(long)]
    cascade_deletes: bool,
}

pub fn app(store: Store, cascade: CascadeDeletes) -> Router {
    Router::new()
        .route("/users", post(handlers::create_user))
        .route(
            "/posts",
            get(handlers::fetch_posts).post(handlers::create_post),
        )
        .route(
            "/posts/:id",
            get(handlers::fetch_post).delete(handlers::delete_post),
        )
        .route(
            "/posts/:id/comments",
            get(handlers::fetch_comments).post(handlers::create_comment),
        )
        .route("/comments/:id/like", post(handlers::toggle_like))
        .route("/comments/:id", delete(handlers::delete_comment))
        .with_state(AppState { db: store, cascade })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opt = Opt::from_args();

    let app = app(Store::new(), CascadeDeletes(opt.cascade_deletes))
        .layer(tower_http::trace::TraceLayer::new_for_http());

    tracing::info!(cascade_deletes = opt.cascade_deletes, "listening on {}", opt.listen);
    axum::Server::bind(&opt.listen)
        .serve(app.into_make_service())
        .await
        .context("serving axum webserver")
}
