use agora_client::api::CommentList;

const NUM_USERS: usize = 5;
const NUM_COMMENTS: usize = 150;

fn main() {
    let mut rng = rand::thread_rng();
    let users = tests::gen_users(&mut rng, NUM_USERS);
    let comments = tests::gen_comments(&mut rng, &users, users[0].id, NUM_COMMENTS);
    let list = CommentList::ok(comments);
    match serde_json::to_string_pretty(&list) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("failed serializing generated thread: {e}");
            std::process::exit(1);
        }
    }
}
