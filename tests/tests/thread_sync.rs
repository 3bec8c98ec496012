use std::time::Duration;

use agora_client::{
    api::{CommentId, User, Viewer},
    presentation, CommentThread, CommentTree, Error, ErrorKind, Outcome, PostRef, Remote,
    RemoteError, ThreadClient, ThreadConfig,
};
use agora_mock_server::{Call, MockRemote, MockServer};
use rand::{rngs::StdRng, SeedableRng};
use tests::{seed, Seeded};

struct Fixture {
    remote: MockRemote,
    users: Vec<User>,
    post: PostRef,
    comments: Vec<CommentId>,
}

fn fixture(seed_value: u64, num_comments: usize) -> Fixture {
    let mut rng = StdRng::seed_from_u64(seed_value);
    let Seeded {
        server,
        users,
        post,
        comments,
    } = seed(&mut rng, 3, num_comments);
    Fixture {
        remote: MockRemote::new(server),
        users,
        post: PostRef::from(&post),
        comments,
    }
}

fn viewer(u: &User) -> Viewer {
    Viewer::from(u.clone())
}

async fn open(f: &Fixture, user: usize, config: ThreadConfig) -> ThreadClient<MockRemote> {
    ThreadClient::open(f.remote.clone(), f.post, viewer(&f.users[user]), config)
        .await
        .expect("opening thread")
}

/// The tree the server would hand to `client`'s viewer right now
async fn server_tree(client: &ThreadClient<MockRemote>) -> CommentTree {
    let records = client
        .remote()
        .fetch_comments(client.thread().post().id, client.viewer().id)
        .await
        .expect("fetching server view");
    CommentTree::build(records)
}

fn ids(tree: &CommentTree) -> Vec<Option<CommentId>> {
    presentation::flatten(tree).map(|(_, c, _)| c.id).collect()
}

#[tokio::test]
async fn open_builds_whole_thread() {
    let f = fixture(1, 40);
    let client = open(&f, 1, ThreadConfig::default()).await;
    let rows = client.rows();
    assert_eq!(rows.len(), 40);
    assert_eq!(client.thread().tree().len(), 40);
    for (i, row) in rows.iter().enumerate() {
        match row.comment.parent_id {
            None => assert_eq!(row.depth, 0),
            Some(parent) => {
                let p = rows[..i]
                    .iter()
                    .rev()
                    .find(|r| r.comment.id == Some(parent))
                    .expect("parent listed after its reply");
                assert_eq!(row.depth, p.depth + 1);
            }
        }
    }
    assert_eq!(f.remote.calls().await, vec![Call::FetchComments(f.post.id)]);
}

#[tokio::test]
async fn like_twice_matches_server() {
    let f = fixture(2, 10);
    let mut client = open(&f, 2, ThreadConfig::default()).await;
    let target = f.comments[3];
    let before = client.thread().tree().clone();

    client.toggle_like(target).await.expect("liking");
    let node = client.thread().tree().find(target).expect("comment vanished");
    let liked = client.thread().tree().comment(node).expect("comment vanished");
    assert!(liked.viewer_has_liked);
    assert_eq!(&server_tree(&client).await, client.thread().tree());

    client.toggle_like(target).await.expect("unliking");
    assert_eq!(client.thread().tree(), &before);
    assert_eq!(&server_tree(&client).await, &before);
}

#[tokio::test]
async fn invalid_add_is_never_sent() {
    let f = fixture(3, 5);
    let mut client = open(&f, 0, ThreadConfig::default()).await;
    for content in ["", "   ", "\n\t"] {
        let err = client.add_comment(content, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    let err = client.add_comment("a\0b", None).await.unwrap_err();
    assert_eq!(err, Error::NullByte);
    assert_eq!(f.remote.calls().await.len(), 1);
    assert_eq!(client.thread().tree().len(), 5);
}

#[tokio::test]
async fn unauthorized_delete_is_never_sent() {
    let f = fixture(4, 0);
    let (author, stranger) = (&f.users[1], &f.users[2]);
    let comment = f
        .remote
        .with_server(|s| {
            s.create_comment(
                f.post.id,
                agora_client::api::NewComment {
                    content: String::from("You should talk to a notary."),
                    user_id: author.id,
                    parent_id: None,
                },
            )
        })
        .await
        .expect("creating comment")
        .id;
    let mut client = open(&f, 2, ThreadConfig::default()).await;
    let err = client.delete_comment(comment).await.unwrap_err();
    assert_eq!(
        err,
        Error::NotAuthorized {
            viewer: stranger.id,
            comment
        }
    );
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(f.remote.calls().await, vec![Call::FetchComments(f.post.id)]);
    assert_eq!(client.thread().tree().len(), 1);
}

#[tokio::test]
async fn failed_like_reloads_thread() {
    let f = fixture(5, 12);
    let mut client = open(&f, 1, ThreadConfig::default()).await;
    let target = f.comments[0];
    f.remote.fail_next(1).await;
    let err = client.toggle_like(target).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Remote);
    assert_eq!(
        f.remote.calls().await,
        vec![
            Call::FetchComments(f.post.id),
            Call::ToggleLike(target),
            Call::FetchComments(f.post.id),
        ]
    );
    assert!(!client.thread().needs_refresh());
    assert_eq!(&server_tree(&client).await, client.thread().tree());
}

#[tokio::test]
async fn failed_reload_after_like_is_reported() {
    let f = fixture(13, 12);
    let mut client = open(&f, 1, ThreadConfig::default()).await;
    let target = f.comments[0];
    f.remote.fail_next(2).await;
    let err = client.toggle_like(target).await.unwrap_err();
    assert_eq!(
        err,
        Error::ReloadFailed {
            like: RemoteError::Network(String::from("injected failure")),
            reload: RemoteError::Network(String::from("injected failure")),
        }
    );
    assert_eq!(err.kind(), ErrorKind::Remote);
    assert!(client.thread().needs_refresh());
    assert!(client.thread().tree().is_empty());

    client.refresh().await.expect("reloading once the server is back");
    assert!(!client.thread().needs_refresh());
    assert_eq!(client.thread().tree().len(), 12);
}

#[tokio::test]
async fn failed_add_drops_placeholder() {
    let f = fixture(6, 8);
    let mut client = open(&f, 0, ThreadConfig::default()).await;
    let before = client.thread().tree().records();
    f.remote.fail_next(1).await;
    let err = client
        .add_comment("Keep every receipt.", Some(f.comments[2]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Remote(RemoteError::Network(_))));
    assert_eq!(client.thread().tree().records(), before);
    assert!(client.rows().iter().all(|r| !r.pending));
}

#[tokio::test]
async fn failed_delete_leaves_tree_alone() {
    let f = fixture(7, 15);
    // user 0 wrote the post and may delete anything
    let mut client = open(&f, 0, ThreadConfig::default()).await;
    let before = client.thread().tree().clone();
    f.remote.fail_next(1).await;
    client.delete_comment(f.comments[0]).await.unwrap_err();
    assert_eq!(client.thread().tree(), &before);
    assert_eq!(f.remote.with_server(|s| s.test_num_comments()).await, 15);
}

#[tokio::test]
async fn added_reply_is_confirmed_in_place() {
    let f = fixture(8, 6);
    let mut client = open(&f, 1, ThreadConfig::default()).await;
    let parent = f.comments[1];
    let node = match client
        .add_comment("  Section 8 covers this.  ", Some(parent))
        .await
        .expect("adding reply")
    {
        Outcome::Applied(node) => node,
        Outcome::Stale => panic!("fresh thread reported stale add"),
    };
    let tree = client.thread().tree();
    let confirmed = tree.comment(node).expect("confirmed comment missing");
    let id = confirmed.id.expect("confirmed comment has no id");
    assert_eq!(confirmed.content, "Section 8 covers this.");
    assert_eq!(tree.find(id), Some(node));
    let parent_node = tree.find(parent).expect("parent missing");
    assert_eq!(tree.parent(node), Some(parent_node));
    assert_eq!(tree.children(parent_node)[0], node);

    client.refresh().await.expect("refreshing");
    let tree = client.thread().tree();
    let node = tree.find(id).expect("reply missing after refresh");
    assert_eq!(tree.parent(node), tree.find(parent));
}

#[tokio::test]
async fn retained_replies_survive_refresh() {
    let f = fixture(9, 30);
    let mut client = open(&f, 0, ThreadConfig::default()).await;
    let target = f.comments[0];
    let removed = client.delete_comment(target).await.expect("deleting");
    assert_eq!(removed, Outcome::Applied(1));
    let mut local = ids(client.thread().tree());
    let mut remote = ids(&server_tree(&client).await);
    local.sort();
    remote.sort();
    assert_eq!(local, remote);
}

#[tokio::test]
async fn cascading_delete_matches_server() {
    let mut rng = StdRng::seed_from_u64(10);
    let Seeded {
        server,
        users,
        post,
        comments,
    } = seed(&mut rng, 3, 30);
    let remote = MockRemote::new(server.with_cascading_deletes(true));
    let mut client = ThreadClient::open(
        remote,
        PostRef::from(&post),
        viewer(&users[0]),
        ThreadConfig::default(),
    )
    .await
    .expect("opening thread");
    client.delete_comment(comments[0]).await.expect("deleting");
    assert_eq!(
        ids(&server_tree(&client).await),
        ids(client.thread().tree())
    );
}

#[tokio::test]
async fn hanging_server_times_out() {
    let f = fixture(11, 4);
    let config = ThreadConfig {
        request_timeout: Duration::from_millis(50),
    };
    let mut client = open(&f, 0, config).await;
    let before = client.thread().tree().records();
    f.remote.hang_next(1).await;
    let err = client
        .add_comment("Is anyone there?", None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        Error::Remote(RemoteError::Timeout(Duration::from_millis(50)))
    );
    assert_eq!(client.thread().tree().records(), before);
}

#[tokio::test]
async fn answers_for_replaced_thread_are_ignored() {
    let f = fixture(12, 5);
    let me = viewer(&f.users[1]);
    let mut thread = CommentThread::new(f.post);
    let refresh = thread.begin_refresh(me.id);
    let res = f.remote.fetch_comments(refresh.post, refresh.viewer).await;
    thread.complete_refresh(refresh, res).expect("loading");

    let add = thread
        .begin_add("Try small claims court.", None, &me)
        .expect("adding");
    let res = f.remote.create_comment(add.post, add.request.clone()).await;

    // the list is reloaded before the creation answer is processed
    let refresh = thread.begin_refresh(me.id);
    let list = f.remote.fetch_comments(refresh.post, refresh.viewer).await;
    thread.complete_refresh(refresh, list).expect("reloading");

    assert_eq!(thread.complete_add(add, res), Ok(Outcome::Stale));
    assert_eq!(thread.tree().len(), 6);
    assert!(thread.rows(me.id).iter().all(|r| !r.pending));

    thread.close();
    let refresh = thread.begin_refresh(me.id);
    let list = f.remote.fetch_comments(refresh.post, refresh.viewer).await;
    assert_eq!(thread.complete_refresh(refresh, list), Ok(Outcome::Stale));
}

#[test]
fn generated_threads_flatten_completely() {
    bolero::check!().with_type::<(u64, u8)>().for_each(|&(s, n)| {
        let mut rng = StdRng::seed_from_u64(s);
        let users = tests::gen_users(&mut rng, 4);
        let records = tests::gen_comments(&mut rng, &users, users[0].id, n as usize);
        let tree = CommentTree::build(records.clone());
        assert_eq!(presentation::flatten(&tree).count(), records.len());
        let mut exported = tree.records();
        let mut original = records;
        exported.sort_by_key(|c| c.id);
        original.sort_by_key(|c| c.id);
        assert_eq!(exported, original);
    });
}

#[tokio::test]
async fn unknown_post_fails_to_open() {
    let remote = MockRemote::new(MockServer::new());
    let post = PostRef {
        id: tests::unknown_post(),
        author_id: agora_client::api::UserId::stub(),
    };
    let err = ThreadClient::open(
        remote,
        post,
        Viewer {
            id: agora_client::api::UserId::stub(),
            name: String::from("nobody"),
        },
        ThreadConfig::default(),
    )
    .await
    .err()
    .expect("opening a thread for a missing post");
    assert_eq!(err.kind(), ErrorKind::Remote);
}
