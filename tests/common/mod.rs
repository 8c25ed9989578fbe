//! Shared test utilities and fixtures
//!
//! Every test here drives a real [`App`] against a wiremock daemon. These
//! helpers mount the endpoints a scenario needs and pump the app until its
//! spawned calls resolve.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use anvil_engine::chat::ChatSession;
use anvil_engine::wizard::WizardStep;
use anvil_engine::{App, AppPhase, DaemonClient, EngineKind, UiKey};

/// Start a mock server that stands in for the Anvil daemon.
pub async fn start_daemon() -> MockServer {
    MockServer::start().await
}

pub fn app_for(daemon: &MockServer) -> App {
    App::new(DaemonClient::new(daemon.uri()))
}

/// Pump [`App::poll_events`] until no daemon call is outstanding.
///
/// Spawned requests make progress between the sleeps. A scenario that stays
/// busy for more than two seconds is a broken test, not a slow daemon.
pub async fn settle(app: &mut App) {
    for _ in 0..200 {
        app.poll_events();
        if !app.is_busy() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("app never settled; a daemon call is still outstanding");
}

pub fn type_str(app: &mut App, text: &str) {
    for c in text.chars() {
        app.handle_key(UiKey::Char(c));
    }
}

/// The wizard's current step. Panics if the app already left the wizard.
pub fn wizard_step(app: &App) -> &WizardStep {
    match app.phase() {
        AppPhase::Wizard(wizard) => wizard.step(),
        AppPhase::Chat(_) => panic!("expected the wizard, app is in the chat"),
    }
}

/// The chat session. Panics while the wizard is still running.
pub fn chat(app: &App) -> &ChatSession {
    match app.phase() {
        AppPhase::Chat(chat) => chat,
        AppPhase::Wizard(_) => panic!("expected the chat, app is still in the wizard"),
    }
}

// ============================================================================
// Navigation
// ============================================================================

/// Welcome -> SystemCheck (resolved) -> EngineChoice. The system report
/// endpoints must be mounted.
pub async fn drive_to_engine_choice(app: &mut App) {
    app.handle_key(UiKey::Enter);
    settle(app).await;
    app.handle_key(UiKey::Enter);
}

/// At EngineChoice, put the cursor on `kind` and confirm.
pub fn choose_engine(app: &mut App, kind: EngineKind) {
    if let AppPhase::Wizard(wizard) = app.phase()
        && let WizardStep::EngineChoice(state) = wizard.step()
        && state.cursor() != kind
    {
        app.handle_key(UiKey::Down);
    }
    app.handle_key(UiKey::Enter);
}

/// Run the whole wizard and land in the chat: cloud engine, save via the
/// test-then-save path. Needs the system report plus successful
/// `/config/model/test` and `/config/model` mounts.
pub async fn drive_to_chat(app: &mut App) {
    drive_to_engine_choice(app).await;
    choose_engine(app, EngineKind::Cloud);
    app.handle_key(UiKey::CtrlS);
    settle(app).await;
}

// ============================================================================
// Daemon endpoint fixtures
// ============================================================================

/// Mount `/system/profile` and `/system/recommendation`. `engine` is the
/// wire value, `"Local"` or `"Cloud"`.
pub async fn mount_system_report(daemon: &MockServer, engine: &str) {
    Mock::given(method("GET"))
        .and(path("/system/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "os_name": "linux",
            "os_version": "6.8",
            "cpu_cores": 16,
            "cpu_brand": "AMD Ryzen 9",
            "total_memory_gb": 64,
            "used_memory_gb": 12,
            "architecture": "x86_64"
        })))
        .mount(daemon)
        .await;

    Mock::given(method("GET"))
        .and(path("/system/recommendation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "recommended_engine": engine,
            "reason": "64 GB of RAM is plenty for local models.",
            "recommended_model": "smollm:135m"
        })))
        .mount(daemon)
        .await;
}

pub fn installed_json(id: &str, port: u16) -> serde_json::Value {
    json!({
        "model_id": id,
        "install_path": format!("/models/{id}"),
        "is_running": true,
        "port": port,
        "runtime_type": "local"
    })
}

pub fn available_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "description": "A small test model",
        "size_gb": 1.5,
        "recommended_ram_gb": 8,
        "download_url": format!("https://models.example/{id}"),
        "local_port": 8080,
        "runtime_type": "local"
    })
}

/// Mount both gallery list endpoints with fixed contents.
pub async fn mount_model_lists(
    daemon: &MockServer,
    installed: Vec<serde_json::Value>,
    available: Vec<serde_json::Value>,
) {
    Mock::given(method("GET"))
        .and(path("/config/local/installed_models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": installed })))
        .mount(daemon)
        .await;

    Mock::given(method("GET"))
        .and(path("/config/local/available_models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": available })))
        .mount(daemon)
        .await;
}

/// Like [`mount_model_lists`], but each list answers exactly one fetch; a
/// later mount takes over for the refetch after a mutation.
pub async fn mount_model_lists_once(
    daemon: &MockServer,
    installed: Vec<serde_json::Value>,
    available: Vec<serde_json::Value>,
) {
    Mock::given(method("GET"))
        .and(path("/config/local/installed_models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": installed })))
        .up_to_n_times(1)
        .mount(daemon)
        .await;

    Mock::given(method("GET"))
        .and(path("/config/local/available_models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": available })))
        .up_to_n_times(1)
        .mount(daemon)
        .await;
}

/// Mount a POST endpoint answering the success envelope.
pub async fn mount_action_success(daemon: &MockServer, endpoint: &str) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": ""
        })))
        .mount(daemon)
        .await;
}

/// Mount a POST endpoint answering a daemon refusal with `message`.
pub async fn mount_action_refusal(daemon: &MockServer, endpoint: &str, message: &str) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "message": message
        })))
        .mount(daemon)
        .await;
}

pub async fn mount_tool_servers(daemon: &MockServer, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/config/mcp/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "servers": ids })))
        .mount(daemon)
        .await;
}

pub async fn mount_tool_servers_once(daemon: &MockServer, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/config/mcp/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "servers": ids })))
        .up_to_n_times(1)
        .mount(daemon)
        .await;
}

pub async fn mount_server_tools(daemon: &MockServer, tools: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/config/mcp/tools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tools": tools })))
        .mount(daemon)
        .await;
}

pub async fn mount_chat_reply(daemon: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "role": "assistant", "content": content }
        })))
        .mount(daemon)
        .await;
}
