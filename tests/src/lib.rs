use agora_client::api::{
    self, CommentId, NewComment, NewPost, NewUser, Post, PostId, User, UserId, Uuid,
};
use agora_mock_server::MockServer;
use chrono::{Duration, Utc};
use rand::{seq::SliceRandom, Rng};

/// Probability that a generated comment is a reply rather than top-level
const REPLY_PROBABILITY: f64 = 0.6;

const MIN_WORDS: usize = 3;
const MAX_WORDS: usize = 25;

fn gen_text(rng: &mut impl Rng) -> String {
    lipsum::lipsum_words(rng.gen_range(MIN_WORDS..MAX_WORDS))
}

fn gen_parent(rng: &mut impl Rng, existing: &[CommentId]) -> Option<CommentId> {
    match rng.gen_bool(REPLY_PROBABILITY) {
        true => existing.choose(rng).copied(),
        false => None,
    }
}

/// Generates a flat, server-ordered comment list for `post`
///
/// Parents always come before their replies and each record is liked by a
/// random subset of `users`, with `user_has_liked` computed for `viewer`.
pub fn gen_comments(
    rng: &mut impl Rng,
    users: &[User],
    viewer: UserId,
    n: usize,
) -> Vec<api::Comment> {
    let start = Utc::now() - Duration::days(30);
    let mut ids = Vec::with_capacity(n);
    let mut res = Vec::with_capacity(n);
    for i in 0..n {
        let id = CommentId(Uuid::new_v4());
        let author = users
            .choose(rng)
            .expect("generating comments without users");
        let likers = users
            .iter()
            .filter(|_| rng.gen_bool(0.3))
            .map(|u| u.id)
            .collect::<Vec<_>>();
        res.push(api::Comment {
            id,
            author_id: author.id,
            author_name: author.name.clone(),
            content: gen_text(rng),
            created_at: start + Duration::minutes(i as i64),
            like_count: likers.len() as u64,
            viewer_has_liked: likers.contains(&viewer),
            parent_id: gen_parent(rng, &ids),
        });
        ids.push(id);
    }
    res
}

pub fn gen_users(rng: &mut impl Rng, n: usize) -> Vec<User> {
    (0..n)
        .map(|_| User {
            id: UserId(Uuid::new_v4()),
            name: lipsum::lipsum_words(rng.gen_range(1..3)),
        })
        .collect()
}

/// A mock server holding one post and its comment thread
pub struct Seeded {
    pub server: MockServer,
    pub users: Vec<User>,
    pub post: Post,
    pub comments: Vec<CommentId>,
}

/// Fills a mock server through its public operations, so the resulting
/// state is one the server itself could have reached
pub fn seed(rng: &mut impl Rng, num_users: usize, num_comments: usize) -> Seeded {
    let mut server = MockServer::new();
    let users = (0..num_users)
        .map(|i| {
            server
                .create_user(NewUser {
                    name: format!("user{i}"),
                })
                .expect("creating seed user")
        })
        .collect::<Vec<_>>();
    let post = server
        .create_post(NewPost {
            content: gen_text(rng),
            user_id: users[0].id,
            location: None,
            is_anonymous: false,
        })
        .expect("creating seed post");
    let mut comments = Vec::with_capacity(num_comments);
    for _ in 0..num_comments {
        let author = users.choose(rng).expect("seeding without users").id;
        let comment = server
            .create_comment(
                post.id,
                NewComment {
                    content: gen_text(rng),
                    user_id: author,
                    parent_id: gen_parent(rng, &comments),
                },
            )
            .expect("creating seed comment");
        comments.push(comment.id);
    }
    Seeded {
        server,
        users,
        post,
        comments,
    }
}

/// A post id no server knows about
pub fn unknown_post() -> PostId {
    PostId(Uuid::new_v4())
}
