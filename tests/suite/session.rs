//! Chat session over a live (mock) daemon.
//!
//! The pure transcript rules live in `anvil_engine::chat`'s unit tests;
//! these cover the round trip through the spawned send task.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use anvil_types::ChatRole;
use anvil_engine::{App, UiKey};

use crate::common::{
    app_for, chat, drive_to_chat, mount_action_success, mount_chat_reply, mount_system_report,
    settle, start_daemon, type_str,
};

async fn app_in_chat(daemon: &MockServer) -> App {
    mount_system_report(daemon, "Cloud").await;
    mount_action_success(daemon, "/config/model/test").await;
    mount_action_success(daemon, "/config/model").await;
    let mut app = app_for(daemon);
    drive_to_chat(&mut app).await;
    app
}

#[tokio::test]
async fn submit_appends_an_optimistic_user_turn() {
    let daemon = start_daemon().await;
    mount_chat_reply(&daemon, "Hello! How can I help?").await;
    let mut app = app_in_chat(&daemon).await;

    type_str(&mut app, "hello");
    app.handle_key(UiKey::Enter);

    // The user's turn is visible before the daemon answers.
    {
        let session = chat(&app);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, ChatRole::User);
        assert_eq!(session.messages()[0].content, "hello");
        assert!(session.is_waiting());
        assert!(session.input().is_empty());
    }

    settle(&mut app).await;
    let session = chat(&app);
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.messages()[1].role, ChatRole::Assistant);
    assert_eq!(session.messages()[1].content, "Hello! How can I help?");
    assert!(!session.is_waiting());
}

#[tokio::test]
async fn reply_failure_lands_as_a_system_turn() {
    let daemon = start_daemon().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&daemon)
        .await;
    let mut app = app_in_chat(&daemon).await;

    type_str(&mut app, "hello");
    app.handle_key(UiKey::Enter);
    settle(&mut app).await;

    let session = chat(&app);
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.messages()[0].role, ChatRole::User);
    assert_eq!(session.messages()[1].role, ChatRole::System);
    assert_eq!(session.messages()[1].content, "Error: Daemon returned HTTP 500");
    // The session is usable again.
    assert!(!session.is_waiting());
}

#[tokio::test]
async fn submit_while_waiting_is_ignored() {
    let daemon = start_daemon().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "message": { "role": "assistant", "content": "one reply" }
                }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&daemon)
        .await;
    let mut app = app_in_chat(&daemon).await;

    type_str(&mut app, "first");
    app.handle_key(UiKey::Enter);

    // A second Enter while the reply is in flight sends nothing; the typed
    // text stays in the input line.
    type_str(&mut app, "second");
    app.handle_key(UiKey::Enter);
    {
        let session = chat(&app);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.input().text(), "second");
    }

    settle(&mut app).await;
    assert_eq!(chat(&app).messages().len(), 2);
}

#[tokio::test]
async fn blank_input_is_never_sent() {
    let daemon = start_daemon().await;
    // No `/chat` mock: a stray send would come back as an HTTP 404 turn.
    let mut app = app_in_chat(&daemon).await;

    app.handle_key(UiKey::Enter);
    type_str(&mut app, "   ");
    app.handle_key(UiKey::Enter);
    settle(&mut app).await;

    let session = chat(&app);
    assert!(session.messages().is_empty());
    assert!(!session.is_waiting());
}

#[tokio::test]
async fn every_send_carries_the_whole_transcript() {
    let daemon = start_daemon().await;
    // The second send must replay both earlier turns. This matcher only
    // accepts the full three-turn transcript; the first send falls through
    // to the catch-all below, a shortened second send would land on a 404.
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({
            "messages": [
                {"role": "user", "content": "hello"},
                {"role": "assistant", "content": "Hi there!"},
                {"role": "user", "content": "what models do I have?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "role": "assistant", "content": "You have smollm installed." }
        })))
        .expect(1)
        .mount(&daemon)
        .await;
    mount_chat_reply(&daemon, "Hi there!").await;
    let mut app = app_in_chat(&daemon).await;

    type_str(&mut app, "hello");
    app.handle_key(UiKey::Enter);
    settle(&mut app).await;

    type_str(&mut app, "what models do I have?");
    app.handle_key(UiKey::Enter);
    settle(&mut app).await;

    let session = chat(&app);
    assert_eq!(session.messages().len(), 4);
    assert_eq!(session.messages()[3].content, "You have smollm installed.");
}
