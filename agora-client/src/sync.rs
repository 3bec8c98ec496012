use std::{future::Future, time::Duration};

use crate::{
    api::{CommentId, Viewer},
    presentation::Row,
    CommentThread, Error, NodeId, Outcome, PostRef, Remote, RemoteError, ThreadConfig,
};

/// Drives a [`CommentThread`] against a [`Remote`], one operation at a time
///
/// Each operation applies its optimistic change, awaits the remote call under
/// the configured timeout, and reconciles before returning. No operation is
/// retried.
pub struct ThreadClient<R> {
    remote: R,
    viewer: Viewer,
    thread: CommentThread,
    config: ThreadConfig,
}

impl<R: Remote> ThreadClient<R> {
    pub fn new(remote: R, post: PostRef, viewer: Viewer, config: ThreadConfig) -> ThreadClient<R> {
        ThreadClient {
            remote,
            viewer,
            thread: CommentThread::new(post),
            config,
        }
    }

    /// Creates the client and loads the thread
    pub async fn open(
        remote: R,
        post: PostRef,
        viewer: Viewer,
        config: ThreadConfig,
    ) -> Result<ThreadClient<R>, Error> {
        let mut this = ThreadClient::new(remote, post, viewer, config);
        this.refresh().await?;
        Ok(this)
    }

    pub fn thread(&self) -> &CommentThread {
        &self.thread
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn rows(&self) -> Vec<Row<'_>> {
        self.thread.rows(self.viewer.id)
    }

    pub async fn refresh(&mut self) -> Result<(), Error> {
        let ticket = self.thread.begin_refresh(self.viewer.id);
        let res = timed(
            self.config.request_timeout,
            self.remote.fetch_comments(ticket.post, ticket.viewer),
        )
        .await;
        self.thread.complete_refresh(ticket, res)?;
        Ok(())
    }

    /// On failure the thread is fetched again from scratch before the error
    /// is returned. If that reload fails too, the thread is left empty and
    /// [`Error::ReloadFailed`] carries both failures.
    pub async fn toggle_like(&mut self, comment: CommentId) -> Result<(), Error> {
        let ticket = self.thread.begin_like(comment, self.viewer.id)?;
        tracing::debug!(?comment, "dispatching like toggle");
        let res = timed(
            self.config.request_timeout,
            self.remote.toggle_like(ticket.comment, ticket.viewer),
        )
        .await;
        match self.thread.complete_like(ticket, res) {
            Ok(_) => Ok(()),
            Err(Error::Remote(like)) if self.thread.needs_refresh() => {
                tracing::info!("reloading comment thread after failed like toggle");
                match self.refresh().await {
                    Ok(()) => Err(Error::Remote(like)),
                    Err(Error::Remote(reload)) => {
                        tracing::warn!(error=%reload, "failed reloading comment thread");
                        Err(Error::ReloadFailed { like, reload })
                    }
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Posts a comment, or a reply to `parent`
    ///
    /// Returns the node holding the confirmed comment.
    pub async fn add_comment(
        &mut self,
        content: &str,
        parent: Option<CommentId>,
    ) -> Result<Outcome<NodeId>, Error> {
        let ticket = self.thread.begin_add(content, parent, &self.viewer)?;
        tracing::debug!(?parent, "dispatching comment creation");
        let res = timed(
            self.config.request_timeout,
            self.remote
                .create_comment(ticket.post, ticket.request.clone()),
        )
        .await;
        self.thread.complete_add(ticket, res)
    }

    /// Returns how many comments left the thread
    pub async fn delete_comment(&mut self, comment: CommentId) -> Result<Outcome<usize>, Error> {
        let ticket = self.thread.begin_delete(comment, self.viewer.id)?;
        tracing::debug!(?comment, "dispatching comment deletion");
        let res = timed(
            self.config.request_timeout,
            self.remote.delete_comment(ticket.comment, ticket.viewer),
        )
        .await;
        self.thread.complete_delete(ticket, res)
    }

    pub fn close(&mut self) {
        self.thread.close();
    }
}

async fn timed<T, F>(timeout: Duration, call: F) -> Result<T, RemoteError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(res) => res,
        Err(_) => Err(RemoteError::Timeout(timeout)),
    }
}
