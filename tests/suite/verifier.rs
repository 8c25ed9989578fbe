//! Connection test and save gating on the endpoint form.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use anvil_engine::verifier::TestVerdict;
use anvil_engine::wizard::{ConfigField, WizardStep};
use anvil_engine::{App, AppPhase, EngineKind, UiKey};

use crate::common::{
    app_for, choose_engine, drive_to_engine_choice, mount_system_report, settle, start_daemon,
    wizard_step,
};

async fn app_at_cloud_config(daemon: &MockServer) -> App {
    mount_system_report(daemon, "Cloud").await;
    let mut app = app_for(daemon);
    drive_to_engine_choice(&mut app).await;
    choose_engine(&mut app, EngineKind::Cloud);
    assert!(matches!(wizard_step(&app), WizardStep::Config(_)));
    app
}

async fn mount_test_success(daemon: &MockServer, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/config/model/test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": ""
        })))
        .expect(calls)
        .mount(daemon)
        .await;
}

async fn mount_save_success(daemon: &MockServer, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/config/model"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Configuration saved"
        })))
        .expect(calls)
        .mount(daemon)
        .await;
}

fn verdict(app: &App) -> &TestVerdict {
    let WizardStep::Config(state) = wizard_step(app) else {
        panic!("expected Config, got {:?}", wizard_step(app));
    };
    state.verdict()
}

#[tokio::test]
async fn enter_tests_the_form_exactly_as_typed() {
    let daemon = start_daemon().await;
    let mut app = app_at_cloud_config(&daemon).await;

    // The test call must carry the current field values.
    Mock::given(method("POST"))
        .and(path("/config/model/test"))
        .and(body_json(json!({
            "base_url": "https://api.openai.com/v1",
            "model": "gpt-4o-mini",
            "api_key": "sk-test"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": ""
        })))
        .expect(1)
        .mount(&daemon)
        .await;

    // Focus the API key field and type a value.
    app.handle_key(UiKey::Tab);
    app.handle_key(UiKey::Tab);
    assert!(matches!(wizard_step(&app), WizardStep::Config(s) if s.focus() == ConfigField::ApiKey));
    for c in "sk-test".chars() {
        app.handle_key(UiKey::Char(c));
    }

    app.handle_key(UiKey::Enter);
    assert!(matches!(verdict(&app), TestVerdict::Testing));
    settle(&mut app).await;
    assert!(matches!(verdict(&app), TestVerdict::Success));
}

#[tokio::test]
async fn any_edit_resets_the_verdict() {
    let daemon = start_daemon().await;
    mount_test_success(&daemon, 1).await;
    let mut app = app_at_cloud_config(&daemon).await;

    app.handle_key(UiKey::Enter);
    settle(&mut app).await;
    assert!(matches!(verdict(&app), TestVerdict::Success));

    // Moving focus is not an edit.
    app.handle_key(UiKey::Tab);
    assert!(matches!(verdict(&app), TestVerdict::Success));

    // A cursor motion that changes nothing is not an edit either.
    app.handle_key(UiKey::End);
    assert!(matches!(verdict(&app), TestVerdict::Success));

    // Typing is.
    app.handle_key(UiKey::Char('x'));
    assert!(matches!(verdict(&app), TestVerdict::Idle));
}

#[tokio::test]
async fn save_with_a_verified_connection_saves_immediately() {
    let daemon = start_daemon().await;
    mount_test_success(&daemon, 1).await;
    mount_save_success(&daemon, 1).await;
    let mut app = app_at_cloud_config(&daemon).await;

    app.handle_key(UiKey::Enter);
    settle(&mut app).await;
    assert!(matches!(verdict(&app), TestVerdict::Success));

    app.handle_key(UiKey::CtrlS);
    {
        let WizardStep::Config(state) = wizard_step(&app) else {
            panic!("expected Config");
        };
        assert!(state.is_saving());
        assert_eq!(state.status(), Some("Saving configuration..."));
    }
    settle(&mut app).await;

    assert!(matches!(app.phase(), AppPhase::Chat(_)));
    let config = app.active_config().expect("save should set the active config");
    assert_eq!(config.model, "gpt-4o-mini");
    assert_eq!(config.base_url, "https://api.openai.com/v1");
}

#[tokio::test]
async fn save_without_a_test_runs_one_first() {
    let daemon = start_daemon().await;
    mount_test_success(&daemon, 1).await;
    mount_save_success(&daemon, 1).await;
    let mut app = app_at_cloud_config(&daemon).await;

    assert!(matches!(verdict(&app), TestVerdict::Idle));
    app.handle_key(UiKey::CtrlS);
    assert!(
        matches!(verdict(&app), TestVerdict::Testing),
        "an unverified save starts with a test, not a save"
    );
    settle(&mut app).await;

    // The test passed, so the remembered save intent fired.
    assert!(matches!(app.phase(), AppPhase::Chat(_)));
}

#[tokio::test]
async fn failed_test_blocks_the_save() {
    let daemon = start_daemon().await;
    Mock::given(method("POST"))
        .and(path("/config/model/test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "message": "Invalid API key"
        })))
        .expect(1)
        .mount(&daemon)
        .await;
    // The save endpoint must never be touched.
    mount_save_success(&daemon, 0).await;
    let mut app = app_at_cloud_config(&daemon).await;

    app.handle_key(UiKey::CtrlS);
    settle(&mut app).await;

    assert!(matches!(wizard_step(&app), WizardStep::Config(_)));
    match verdict(&app) {
        TestVerdict::Error(message) => assert_eq!(message, "Invalid API key"),
        other => panic!("expected the daemon's refusal, got {other:?}"),
    }
}

#[tokio::test]
async fn save_request_during_a_test_attaches_to_it() {
    let daemon = start_daemon().await;
    Mock::given(method("POST"))
        .and(path("/config/model/test"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "success", "message": "" }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&daemon)
        .await;
    mount_save_success(&daemon, 1).await;
    let mut app = app_at_cloud_config(&daemon).await;

    app.handle_key(UiKey::Enter);
    assert!(matches!(verdict(&app), TestVerdict::Testing));

    // Ctrl+S while the test is in flight: no second test, but the intent
    // sticks and the save follows the verdict.
    app.handle_key(UiKey::CtrlS);
    settle(&mut app).await;

    assert!(matches!(app.phase(), AppPhase::Chat(_)));
}

#[tokio::test]
async fn save_refusal_keeps_the_form_intact() {
    let daemon = start_daemon().await;
    mount_test_success(&daemon, 1).await;
    Mock::given(method("POST"))
        .and(path("/config/model"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "message": "Config file is read-only"
        })))
        .expect(1)
        .mount(&daemon)
        .await;
    let mut app = app_at_cloud_config(&daemon).await;

    app.handle_key(UiKey::Enter);
    settle(&mut app).await;
    app.handle_key(UiKey::CtrlS);
    // Keys pressed while the save is in flight must not reach the form.
    app.handle_key(UiKey::Char('z'));
    settle(&mut app).await;

    let WizardStep::Config(state) = wizard_step(&app) else {
        panic!("a refused save must stay on the form");
    };
    assert_eq!(state.status(), Some("Error: Config file is read-only"));
    assert_eq!(state.field(ConfigField::BaseUrl).text(), "https://api.openai.com/v1");
    // The swallowed key left the verified verdict alone.
    assert!(matches!(state.verdict(), TestVerdict::Success));
    assert!(app.active_config().is_none());
}
