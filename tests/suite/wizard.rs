//! Wizard flow tests: a real [`App`](anvil_engine::App) walking the setup
//! steps against a wiremock daemon.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use anvil_engine::gallery::GalleryRow;
use anvil_engine::wizard::{ConfigField, ReportPhase, WizardStep};
use anvil_engine::{EngineKind, UiKey};

use crate::common::{
    app_for, available_json, choose_engine, drive_to_engine_choice, installed_json,
    mount_model_lists, mount_system_report, settle, start_daemon, wizard_step,
};

#[tokio::test]
async fn enter_runs_the_system_check() {
    let daemon = start_daemon().await;
    mount_system_report(&daemon, "Local").await;
    let mut app = app_for(&daemon);

    assert!(matches!(wizard_step(&app), WizardStep::Welcome));
    app.handle_key(UiKey::Enter);
    assert!(app.is_busy(), "report fetch should be in flight");

    settle(&mut app).await;
    let WizardStep::SystemCheck(state) = wizard_step(&app) else {
        panic!("expected SystemCheck, got {:?}", wizard_step(&app));
    };
    let ReportPhase::Ready(report) = state.phase() else {
        panic!("expected a resolved report, got {:?}", state.phase());
    };
    assert_eq!(report.profile.os_name, "linux");
    assert_eq!(report.profile.cpu_cores, 16);
    assert_eq!(report.recommendation.recommended_engine, EngineKind::Local);
}

#[tokio::test]
async fn half_a_report_fails_the_whole_check() {
    let daemon = start_daemon().await;
    // The profile endpoint answers; the recommendation endpoint 404s.
    Mock::given(method("GET"))
        .and(path("/system/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "os_name": "linux",
            "cpu_cores": 8,
            "total_memory_gb": 16,
            "architecture": "x86_64"
        })))
        .mount(&daemon)
        .await;
    let mut app = app_for(&daemon);

    app.handle_key(UiKey::Enter);
    settle(&mut app).await;

    let WizardStep::SystemCheck(state) = wizard_step(&app) else {
        panic!("expected SystemCheck");
    };
    let ReportPhase::Failed(message) = state.phase() else {
        panic!("partial data must not reach Ready, got {:?}", state.phase());
    };
    assert_eq!(message, "Daemon returned HTTP 404");

    // Mounting the missing endpoint and retrying recovers in place.
    Mock::given(method("GET"))
        .and(path("/system/recommendation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "recommended_engine": "Local",
            "reason": "Enough RAM for a small model."
        })))
        .mount(&daemon)
        .await;

    app.handle_key(UiKey::Char('r'));
    assert!(app.is_busy(), "retry should start a new fetch");
    settle(&mut app).await;

    let WizardStep::SystemCheck(state) = wizard_step(&app) else {
        panic!("expected SystemCheck");
    };
    assert!(matches!(state.phase(), ReportPhase::Ready(_)));
}

#[tokio::test]
async fn recommendation_preselects_the_engine() {
    let daemon = start_daemon().await;
    mount_system_report(&daemon, "Cloud").await;
    let mut app = app_for(&daemon);

    drive_to_engine_choice(&mut app).await;

    let WizardStep::EngineChoice(state) = wizard_step(&app) else {
        panic!("expected EngineChoice, got {:?}", wizard_step(&app));
    };
    assert_eq!(state.cursor(), EngineKind::Cloud);
    let recommendation = state.recommendation().expect("recommendation is carried over");
    assert_eq!(recommendation.recommended_engine, EngineKind::Cloud);
}

#[tokio::test]
async fn local_choice_loads_the_model_gallery() {
    let daemon = start_daemon().await;
    mount_system_report(&daemon, "Local").await;
    mount_model_lists(
        &daemon,
        vec![installed_json("smollm:135m", 8080)],
        vec![available_json("phi-3", "Phi 3 Mini")],
    )
    .await;
    let mut app = app_for(&daemon);

    drive_to_engine_choice(&mut app).await;
    choose_engine(&mut app, EngineKind::Local);
    settle(&mut app).await;

    let WizardStep::ModelGallery(gallery) = wizard_step(&app) else {
        panic!("expected ModelGallery, got {:?}", wizard_step(&app));
    };
    let rows = gallery.rows();
    assert_eq!(rows.len(), 2);
    assert!(matches!(rows[0], GalleryRow::Installed(m) if m.model_id == "smollm:135m"));
    assert!(matches!(rows[1], GalleryRow::Available(m) if m.id == "phi-3"));
}

#[tokio::test]
async fn cloud_choice_prefills_the_endpoint_form() {
    let daemon = start_daemon().await;
    mount_system_report(&daemon, "Cloud").await;
    let mut app = app_for(&daemon);

    drive_to_engine_choice(&mut app).await;
    choose_engine(&mut app, EngineKind::Cloud);

    let WizardStep::Config(state) = wizard_step(&app) else {
        panic!("expected Config, got {:?}", wizard_step(&app));
    };
    assert_eq!(state.field(ConfigField::BaseUrl).text(), "https://api.openai.com/v1");
    assert_eq!(state.field(ConfigField::Model).text(), "gpt-4o-mini");
    assert_eq!(state.field(ConfigField::ApiKey).text(), "");
}

#[tokio::test]
async fn installed_model_prefills_from_its_port() {
    let daemon = start_daemon().await;
    mount_system_report(&daemon, "Local").await;
    mount_model_lists(&daemon, vec![installed_json("smollm:135m", 9001)], vec![]).await;
    let mut app = app_for(&daemon);

    drive_to_engine_choice(&mut app).await;
    choose_engine(&mut app, EngineKind::Local);
    settle(&mut app).await;

    // Cursor starts on the installed model; Enter adopts it.
    app.handle_key(UiKey::Enter);

    let WizardStep::Config(state) = wizard_step(&app) else {
        panic!("expected Config, got {:?}", wizard_step(&app));
    };
    assert_eq!(state.field(ConfigField::BaseUrl).text(), "http://localhost:9001/v1");
    assert_eq!(state.field(ConfigField::Model).text(), "smollm:135m");
    assert_eq!(state.field(ConfigField::ApiKey).text(), "");
}

#[tokio::test]
async fn esc_walks_back_one_step() {
    let daemon = start_daemon().await;
    mount_system_report(&daemon, "Cloud").await;
    let mut app = app_for(&daemon);

    drive_to_engine_choice(&mut app).await;
    choose_engine(&mut app, EngineKind::Cloud);
    assert!(matches!(wizard_step(&app), WizardStep::Config(_)));

    app.handle_key(UiKey::Esc);
    assert!(matches!(wizard_step(&app), WizardStep::EngineChoice(_)));

    // EngineChoice walks back into a fresh system check.
    app.handle_key(UiKey::Esc);
    assert!(matches!(wizard_step(&app), WizardStep::SystemCheck(_)));
    settle(&mut app).await;

    app.handle_key(UiKey::Esc);
    assert!(matches!(wizard_step(&app), WizardStep::Welcome));
}

#[tokio::test]
async fn esc_on_welcome_requests_quit() {
    let daemon = start_daemon().await;
    let mut app = app_for(&daemon);

    assert!(!app.should_quit());
    app.handle_key(UiKey::Esc);
    assert!(app.should_quit());
}

#[tokio::test]
async fn gallery_reply_from_an_abandoned_step_is_dropped() {
    let daemon = start_daemon().await;
    mount_system_report(&daemon, "Local").await;

    // First visit: slow, stale contents. One use each, then the fast mounts
    // below take over.
    Mock::given(method("GET"))
        .and(path("/config/local/installed_models"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "models": [installed_json("stale-model", 1111)] }))
                .set_delay(Duration::from_millis(300)),
        )
        .up_to_n_times(1)
        .mount(&daemon)
        .await;
    Mock::given(method("GET"))
        .and(path("/config/local/available_models"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "models": [] }))
                .set_delay(Duration::from_millis(300)),
        )
        .up_to_n_times(1)
        .mount(&daemon)
        .await;
    mount_model_lists(&daemon, vec![installed_json("fresh-model", 2222)], vec![]).await;

    let mut app = app_for(&daemon);
    drive_to_engine_choice(&mut app).await;

    // Enter the gallery, abandon it while its fetch is still in flight,
    // then enter it again.
    choose_engine(&mut app, EngineKind::Local);
    // Let the first fetch reach the daemon before abandoning the step; its
    // response is held back by the mock delay.
    tokio::time::sleep(Duration::from_millis(50)).await;
    app.handle_key(UiKey::Esc);
    choose_engine(&mut app, EngineKind::Local);
    settle(&mut app).await;

    // Give the abandoned fetch time to land, then drain it.
    tokio::time::sleep(Duration::from_millis(400)).await;
    app.poll_events();

    let WizardStep::ModelGallery(gallery) = wizard_step(&app) else {
        panic!("expected ModelGallery, got {:?}", wizard_step(&app));
    };
    let rows = gallery.rows();
    assert_eq!(rows.len(), 1);
    assert!(
        matches!(rows[0], GalleryRow::Installed(m) if m.model_id == "fresh-model"),
        "the abandoned fetch must not overwrite the current gallery"
    );
}
