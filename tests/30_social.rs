mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use wordset_api::database::Fault;

use common::{seed_user, seed_word_set, Client};

async fn two_users_one_set(client: &Client) {
    seed_user(&client.app.store, "u1", "alice").await;
    seed_user(&client.app.store, "u2", "bob").await;
    seed_word_set(&client.app.store, "ws1", "u1", &["cat", "dog"]).await;
}

#[tokio::test]
async fn like_then_unlike_keeps_every_counter_in_step() -> Result<()> {
    let client = Client::new();
    two_users_one_set(&client).await;
    let body = json!({"userID": "u2", "wordSetID": "ws1"});
    let cookie = client.cookie("u2");

    let liked = client.post("/toggleLikeWordSet", body.clone(), Some(&cookie)).await?;
    assert_eq!(liked.status, StatusCode::OK, "{}", liked.body);
    let data = client.app.store.snapshot().await;
    assert_eq!(data.word_sets["ws1"].likes, 1);
    assert_eq!(data.word_sets["ws1"].liked_users, vec!["u2"]);
    assert_eq!(data.users["u2"].liked_word_sets, vec!["ws1"]);
    assert_eq!(data.users["u1"].liked_cnt, 1);

    let me = client.get("/checkLogIn", Some(&cookie)).await?;
    assert_eq!(me.body["payload"]["likedWordSets"][0], "ws1");

    client.post("/toggleLikeWordSet", body, Some(&cookie)).await?;
    let data = client.app.store.snapshot().await;
    assert_eq!(data.word_sets["ws1"].likes, 0);
    assert!(data.users["u2"].liked_word_sets.is_empty());
    assert_eq!(data.users["u1"].liked_cnt, 0);
    assert!(data.word_sets["ws1"].is_consistent());
    Ok(())
}

#[tokio::test]
async fn authors_cannot_like_their_own_set() -> Result<()> {
    let client = Client::new();
    two_users_one_set(&client).await;

    let reply = client
        .post(
            "/toggleLikeWordSet",
            json!({"userID": "u1", "wordSetID": "ws1"}),
            Some(&client.cookie("u1")),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(client.app.store.snapshot().await.word_sets["ws1"].likes, 0);
    Ok(())
}

#[tokio::test]
async fn failed_like_changes_nothing() -> Result<()> {
    let client = Client::new();
    two_users_one_set(&client).await;
    let before = client.app.store.snapshot().await;
    client.app.store.fail_on(Fault::SaveWordSet);

    let reply = client
        .post(
            "/toggleLikeWordSet",
            json!({"userID": "u2", "wordSetID": "ws1"}),
            Some(&client.cookie("u2")),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);

    let after = client.app.store.snapshot().await;
    assert_eq!(after.users, before.users);
    assert_eq!(after.word_sets, before.word_sets);
    Ok(())
}

#[tokio::test]
async fn fork_copies_into_the_forker_library() -> Result<()> {
    let client = Client::new();
    two_users_one_set(&client).await;

    let reply = client
        .post("/forkWordSet", json!({"userID": "u2", "wordSetID": "ws1"}), Some(&client.cookie("u2")))
        .await?;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    let copy_id = reply.message().to_string();
    assert_ne!(copy_id, "ws1");

    let data = client.app.store.snapshot().await;
    let copy = &data.word_sets[&copy_id];
    let source = &data.word_sets["ws1"];
    assert_eq!(copy.author_id, "u2");
    assert_eq!(copy.title, source.title);
    assert_eq!(copy.word_cnt, 2);
    assert!(copy.words.iter().all(|w| source.words.iter().all(|s| s.id != w.id)));
    assert_eq!(data.users["u2"].created_word_sets, vec![copy_id.clone()]);
    assert_eq!(data.users["u1"].forked_cnt, 1);
    Ok(())
}

#[tokio::test]
async fn fork_respects_allow_copy() -> Result<()> {
    let client = Client::new();
    two_users_one_set(&client).await;

    let toggled = client
        .post("/toggleAllowCopy", json!({"userID": "u1", "wordSetID": "ws1"}), Some(&client.cookie("u1")))
        .await?;
    assert_eq!(toggled.status, StatusCode::OK, "{}", toggled.body);

    let reply = client
        .post("/forkWordSet", json!({"userID": "u2", "wordSetID": "ws1"}), Some(&client.cookie("u2")))
        .await?;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(client.app.store.snapshot().await.word_sets.len(), 1);
    Ok(())
}

#[tokio::test]
async fn recent_visits_are_returned_newest_first() -> Result<()> {
    let client = Client::new();
    seed_user(&client.app.store, "u1", "alice").await;
    for id in ["a", "b", "c"] {
        seed_word_set(&client.app.store, id, "u1", &["x"]).await;
    }
    let cookie = client.cookie("u1");
    for id in ["a", "b", "c", "a"] {
        let reply = client
            .post("/addRecentVisit", json!({"userID": "u1", "wordSetID": id}), Some(&cookie))
            .await?;
        assert_eq!(reply.status, StatusCode::OK);
    }

    let recent = client.get("/getRecentVisit/u1", Some(&cookie)).await?;
    assert_eq!(recent.status, StatusCode::OK);
    let ids: Vec<_> = recent.body["payload"]["record"]
        .as_array()
        .expect("record list")
        .iter()
        .map(|ws| ws["id"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(ids, vec!["a", "c", "b"]);
    Ok(())
}
