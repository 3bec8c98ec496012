use std::time::Duration;

use agora_client::{
    api::{CommentId, NewPost, PostId, UserId, Uuid, Viewer},
    presentation, HttpRemote, Outcome, PostRef, ThreadClient, ThreadConfig,
};
use anyhow::Context;
use tracing_subscriber::EnvFilter;

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(short, long, env = "AGORA_HOST", default_value = "http://127.0.0.1:5001")]
    host: String,

    /// Id of the user to act as
    #[structopt(short, long, env = "AGORA_USER")]
    user: Option<Uuid>,

    /// Display name of the user to act as
    #[structopt(short, long, env = "AGORA_NAME", default_value = "anonymous")]
    name: String,

    /// Seconds to wait for each answer from the server
    #[structopt(long, default_value = "10")]
    timeout_secs: u64,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Create a user and print its id
    CreateUser {
        /// Display name
        name: String,
    },

    /// List posts, newest first
    Posts,

    /// Publish a post
    CreatePost {
        content: String,

        /// Where the question comes from, e.g. a city
        #[structopt(long)]
        location: Option<String>,

        /// Hide your name from readers
        #[structopt(long)]
        anonymous: bool,
    },

    /// Delete one of your posts along with its comments
    DeletePost { post: Uuid },

    /// Print the comment thread of a post
    Show { post: Uuid },

    /// Comment on a post, or reply to one of its comments
    Comment {
        post: Uuid,

        content: String,

        /// Comment to reply to
        #[structopt(long)]
        parent: Option<Uuid>,
    },

    /// Like a comment, or remove your like
    Like { post: Uuid, comment: Uuid },

    /// Delete a comment
    Delete { post: Uuid, comment: Uuid },
}

impl Opt {
    fn viewer(&self) -> anyhow::Result<Viewer> {
        let id = self
            .user
            .context("this command needs a user, pass --user or set AGORA_USER")?;
        Ok(Viewer {
            id: UserId(id),
            name: self.name.clone(),
        })
    }

    fn config(&self) -> ThreadConfig {
        ThreadConfig {
            request_timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

async fn open_thread(
    opt: &Opt,
    remote: HttpRemote,
    post: Uuid,
) -> anyhow::Result<ThreadClient<HttpRemote>> {
    let viewer = opt.viewer()?;
    let post = remote
        .fetch_post(PostId(post))
        .await
        .with_context(|| format!("fetching post {post}"))?;
    ThreadClient::open(remote, PostRef::from(&post), viewer, opt.config())
        .await
        .context("loading comment thread")
}

fn print_thread(client: &ThreadClient<HttpRemote>) {
    let rows = client.rows();
    if rows.is_empty() {
        println!("no comments yet");
    }
    for row in rows {
        let pad = " ".repeat(presentation::indent(row.depth));
        let c = row.comment;
        let id = match c.id {
            Some(id) => id.0.to_string(),
            None => String::from("pending"),
        };
        let liked = if c.viewer_has_liked { ", liked" } else { "" };
        let deletable = if row.can_delete { ", deletable" } else { "" };
        println!(
            "{pad}{} on {} [{id}] ({} likes{liked}{deletable})",
            c.author_name,
            c.created_at.format("%Y-%m-%d %H:%M"),
            c.like_count,
        );
        for line in c.content.lines() {
            println!("{pad}  {line}");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opt = <Opt as structopt::StructOpt>::from_args();
    let remote = HttpRemote::new(opt.host.clone());

    match &opt.cmd {
        Command::CreateUser { name } => {
            let user = remote
                .create_user(name.clone())
                .await
                .context("creating user")?;
            println!("{}", user.id.0);
        }
        Command::Posts => {
            for p in remote.list_posts().await.context("listing posts")? {
                println!(
                    "[{}] {} on {} in {} ({} comments)",
                    p.id.0,
                    p.author_name,
                    p.created_at.format("%Y-%m-%d %H:%M"),
                    p.location.as_deref().unwrap_or("unknown location"),
                    p.comment_count,
                );
                println!("  {}", p.content);
            }
        }
        Command::CreatePost {
            content,
            location,
            anonymous,
        } => {
            let post = remote
                .create_post(NewPost {
                    content: content.clone(),
                    user_id: opt.viewer()?.id,
                    location: location.clone(),
                    is_anonymous: *anonymous,
                })
                .await
                .context("creating post")?;
            println!("{}", post.id.0);
        }
        Command::DeletePost { post } => {
            remote
                .delete_post(PostId(*post), opt.viewer()?.id)
                .await
                .with_context(|| format!("deleting post {post}"))?;
        }
        Command::Show { post } => {
            let client = open_thread(&opt, remote, *post).await?;
            print_thread(&client);
        }
        Command::Comment {
            post,
            content,
            parent,
        } => {
            let mut client = open_thread(&opt, remote, *post).await?;
            let outcome = client
                .add_comment(content, parent.map(CommentId))
                .await
                .context("posting comment")?;
            if let Outcome::Applied(node) = outcome {
                if let Some(id) = client.thread().tree().comment(node).and_then(|c| c.id) {
                    println!("{}", id.0);
                }
            }
        }
        Command::Like { post, comment } => {
            let mut client = open_thread(&opt, remote, *post).await?;
            client
                .toggle_like(CommentId(*comment))
                .await
                .with_context(|| format!("toggling like on {comment}"))?;
            print_thread(&client);
        }
        Command::Delete { post, comment } => {
            let mut client = open_thread(&opt, remote, *post).await?;
            client
                .delete_comment(CommentId(*comment))
                .await
                .with_context(|| format!("deleting comment {comment}"))?;
            print_thread(&client);
        }
    }

    Ok(())
}
