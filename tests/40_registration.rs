mod common;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use serde_json::json;
use wordset_api::database::Fault;
use wordset_api::external::IdentityClaims;

use common::{seed_user, Client, TEST_PASSWORD};

#[tokio::test]
async fn activation_then_password_registration() -> Result<()> {
    let client = Client::new();

    let sent = client
        .post("/sendActivationEmail", json!({"email": "carol@example.com"}), None)
        .await?;
    assert_eq!(sent.status, StatusCode::OK, "{}", sent.body);
    let token = client
        .app
        .mailer
        .last_activation_token()
        .await
        .context("activation link mailed")?;

    let activated = client.post("/activateEmail", json!({"token": token}), None).await?;
    assert_eq!(activated.status, StatusCode::OK, "{}", activated.body);

    let again = client.post("/activateEmail", json!({"token": token}), None).await?;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let registered = client
        .post(
            "/accountPasswordRegister",
            json!({
                "userName": "carol",
                "userEmail": "carol@example.com",
                "userPassword": TEST_PASSWORD,
                "reUserPassword": TEST_PASSWORD
            }),
            None,
        )
        .await?;
    assert_eq!(registered.status, StatusCode::OK, "{}", registered.body);
    let user_id = registered.body["payload"]["id"].as_str().context("user id")?.to_string();
    let cookie = registered.session_cookie().context("session cookie")?;

    let mails = client.get(&format!("/getMails/{}", user_id), Some(&cookie)).await?;
    assert_eq!(mails.status, StatusCode::OK);
    assert_eq!(mails.body["payload"][0]["title"], "歡迎信件");

    let unread = client.get(&format!("/getUnreadMailsCnt/{}", user_id), Some(&cookie)).await?;
    assert_eq!(unread.body["payload"], 1);

    let data = client.app.store.snapshot().await;
    assert!(data.activations.is_empty());
    assert!(data.recent_visits.contains_key(&user_id));
    Ok(())
}

#[tokio::test]
async fn registration_without_activation_is_refused() -> Result<()> {
    let client = Client::new();
    let reply = client
        .post(
            "/accountPasswordRegister",
            json!({
                "userName": "dave",
                "userEmail": "dave@example.com",
                "userPassword": TEST_PASSWORD,
                "reUserPassword": TEST_PASSWORD
            }),
            None,
        )
        .await?;
    assert!(reply.status.is_client_error(), "{}", reply.status);
    assert!(reply.session_cookie().is_none());
    assert!(client.app.store.snapshot().await.users.is_empty());
    Ok(())
}

#[tokio::test]
async fn activation_for_a_registered_email_is_refused() -> Result<()> {
    let client = Client::new();
    seed_user(&client.app.store, "u1", "alice").await;

    let reply = client
        .post("/sendActivationEmail", json!({"email": "alice@example.com"}), None)
        .await?;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert!(client.app.mailer.sent().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn password_reset_with_a_mailed_code() -> Result<()> {
    let client = Client::new();
    seed_user(&client.app.store, "u1", "alice").await;

    let requested = client
        .post(
            "/requestValidateCode?changeMode=password",
            json!({"email": "alice@example.com"}),
            None,
        )
        .await?;
    assert_eq!(requested.status, StatusCode::OK, "{}", requested.body);
    let code = client.app.mailer.last_code().await.context("code mailed")?;

    let wrong = client
        .post(
            "/resetPassword",
            json!({"email": "alice@example.com", "validateCode": "000000", "password": "N3w!pass", "rePassword": "N3w!pass"}),
            None,
        )
        .await?;
    assert_eq!(wrong.status, StatusCode::UNPROCESSABLE_ENTITY);

    let reset = client
        .post(
            "/resetPassword",
            json!({"email": "alice@example.com", "validateCode": code, "password": "N3w!pass", "rePassword": "N3w!pass"}),
            None,
        )
        .await?;
    assert_eq!(reset.status, StatusCode::OK, "{}", reset.body);

    let old = client
        .post(
            "/accountPasswordLogIn",
            json!({"userEmail": "alice@example.com", "userPassword": TEST_PASSWORD}),
            None,
        )
        .await?;
    assert_eq!(old.status, StatusCode::UNPROCESSABLE_ENTITY);

    let new = client
        .post(
            "/accountPasswordLogIn",
            json!({"userEmail": "alice@example.com", "userPassword": "N3w!pass"}),
            None,
        )
        .await?;
    assert_eq!(new.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn unknown_change_mode_is_malformed() -> Result<()> {
    let client = Client::new();
    let reply = client
        .post("/requestValidateCode?changeMode=pin", json!({"email": "a@example.com"}), None)
        .await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn federated_register_then_log_in() -> Result<()> {
    let client = Client::new();
    client.app.identity.allow(
        "cred-1",
        IdentityClaims {
            email: "erin@example.com".into(),
            name: "Erin".into(),
            picture: "https://img.test/erin.png".into(),
        },
    );

    let registered = client.post("/OAuthRegister", json!({"credential": "cred-1"}), None).await?;
    assert_eq!(registered.status, StatusCode::OK, "{}", registered.body);
    assert_eq!(registered.body["payload"]["img"], "https://img.test/erin.png");

    let duplicate = client.post("/OAuthRegister", json!({"credential": "cred-1"}), None).await?;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let logged_in = client.post("/OAuthLogIn", json!({"credential": "cred-1"}), None).await?;
    assert_eq!(logged_in.status, StatusCode::OK);
    assert!(logged_in.session_cookie().is_some());

    let password = client
        .post(
            "/accountPasswordLogIn",
            json!({"userEmail": "erin@example.com", "userPassword": TEST_PASSWORD}),
            None,
        )
        .await?;
    assert_eq!(password.status, StatusCode::UNPROCESSABLE_ENTITY);

    let rejected = client.post("/OAuthLogIn", json!({"credential": "forged"}), None).await?;
    assert!(rejected.status.is_client_error());
    Ok(())
}

#[tokio::test]
async fn email_claimed_mid_registration_reports_registered() -> Result<()> {
    let client = Client::new();
    client.app.identity.allow(
        "cred-2",
        IdentityClaims {
            email: "fay@example.com".into(),
            name: "Fay".into(),
            picture: String::new(),
        },
    );
    client.app.store.fail_on(Fault::EmailTaken);

    let reply = client.post("/OAuthRegister", json!({"credential": "cred-2"}), None).await?;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.message(), "此帳號已註冊");
    assert!(!reply.body.to_string().contains("users_email_key"));
    assert!(client.app.store.snapshot().await.users.is_empty());
    Ok(())
}
