//! Model installs, tool server registration, and the refetch-after-mutation
//! rule, end to end against a mock daemon.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use anvil_engine::gallery::GalleryRow;
use anvil_engine::tools::ToolFocus;
use anvil_engine::wizard::WizardStep;
use anvil_engine::{App, EngineKind, UiKey};

use crate::common::{
    app_for, available_json, choose_engine, drive_to_engine_choice, installed_json,
    mount_action_refusal, mount_action_success, mount_model_lists, mount_model_lists_once,
    mount_server_tools, mount_system_report, mount_tool_servers, mount_tool_servers_once, settle,
    start_daemon, type_str, wizard_step,
};

async fn app_at_model_gallery(daemon: &MockServer) -> App {
    mount_system_report(daemon, "Local").await;
    let mut app = app_for(daemon);
    drive_to_engine_choice(&mut app).await;
    choose_engine(&mut app, EngineKind::Local);
    settle(&mut app).await;
    app
}

async fn app_at_tool_gallery(daemon: &MockServer) -> App {
    mount_system_report(daemon, "Local").await;
    let mut app = app_for(daemon);
    drive_to_engine_choice(&mut app).await;
    app.handle_key(UiKey::Char('t'));
    settle(&mut app).await;
    assert!(matches!(wizard_step(&app), WizardStep::ToolGallery(_)));
    app
}

fn model_gallery(app: &App) -> &anvil_engine::gallery::ModelGallery {
    let WizardStep::ModelGallery(gallery) = wizard_step(app) else {
        panic!("expected the model gallery, got {:?}", wizard_step(app));
    };
    gallery
}

fn tool_gallery(app: &App) -> &anvil_engine::tools::ToolGallery {
    let WizardStep::ToolGallery(gallery) = wizard_step(app) else {
        panic!("expected the tool gallery, got {:?}", wizard_step(app));
    };
    gallery
}

// ============================================================================
// Model gallery
// ============================================================================

#[tokio::test]
async fn install_refetches_the_gallery() {
    let daemon = start_daemon().await;
    // First fetch: one catalog entry, nothing installed. The refetch after
    // the install sees it on disk.
    mount_model_lists_once(&daemon, vec![], vec![available_json("phi-3", "Phi-3 Mini")]).await;
    mount_model_lists(&daemon, vec![installed_json("phi-3", 8080)], vec![]).await;
    mount_action_success(&daemon, "/config/local/install_model").await;
    let mut app = app_at_model_gallery(&daemon).await;
    assert!(matches!(model_gallery(&app).rows().as_slice(), [GalleryRow::Available(_)]));

    app.handle_key(UiKey::Enter);
    {
        let gallery = model_gallery(&app);
        assert_eq!(gallery.status(), Some("Installing phi-3..."));
        assert_eq!(gallery.pending_model(), Some("phi-3"));
    }
    settle(&mut app).await;

    let gallery = model_gallery(&app);
    assert_eq!(gallery.status(), Some("Installation complete!"));
    assert!(!gallery.is_mutating());
    assert!(
        matches!(gallery.rows().as_slice(), [GalleryRow::Installed(m)] if m.model_id == "phi-3"),
        "the refetched list shows the model as installed"
    );
}

#[tokio::test]
async fn failed_install_reports_the_refusal() {
    let daemon = start_daemon().await;
    mount_model_lists(&daemon, vec![], vec![available_json("phi-3", "Phi-3 Mini")]).await;
    mount_action_refusal(&daemon, "/config/local/install_model", "Not enough disk space").await;
    let mut app = app_at_model_gallery(&daemon).await;

    app.handle_key(UiKey::Enter);
    settle(&mut app).await;

    let gallery = model_gallery(&app);
    assert_eq!(gallery.status(), Some("Error: Not enough disk space"));
    // The daemon refused, but the lists were still refetched.
    assert!(matches!(gallery.rows().as_slice(), [GalleryRow::Available(_)]));
    assert!(!gallery.is_mutating());
}

#[tokio::test]
async fn install_is_single_flight() {
    let daemon = start_daemon().await;
    mount_model_lists(&daemon, vec![], vec![available_json("phi-3", "Phi-3 Mini")]).await;
    Mock::given(method("POST"))
        .and(path("/config/local/install_model"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "success", "message": "" }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&daemon)
        .await;
    let mut app = app_at_model_gallery(&daemon).await;

    app.handle_key(UiKey::Enter);
    // Mashing Enter while the install runs starts nothing new.
    app.handle_key(UiKey::Enter);
    app.handle_key(UiKey::Enter);
    assert_eq!(model_gallery(&app).status(), Some("Installing phi-3..."));
    settle(&mut app).await;

    assert_eq!(model_gallery(&app).status(), Some("Installation complete!"));
}

#[tokio::test]
async fn uninstall_refetches_and_drops_the_row() {
    let daemon = start_daemon().await;
    mount_model_lists_once(&daemon, vec![installed_json("smollm:135m", 9001)], vec![]).await;
    mount_model_lists(&daemon, vec![], vec![]).await;
    mount_action_success(&daemon, "/config/local/uninstall_model").await;
    let mut app = app_at_model_gallery(&daemon).await;
    assert_eq!(model_gallery(&app).rows().len(), 1);

    app.handle_key(UiKey::Char('x'));
    assert!(model_gallery(&app).is_mutating());
    settle(&mut app).await;

    let gallery = model_gallery(&app);
    assert!(gallery.rows().is_empty());
    // A quiet success; only failures get a status line.
    assert!(gallery.status().is_none());
}

// ============================================================================
// Tool gallery
// ============================================================================

#[tokio::test]
async fn registering_a_server_resets_the_form() {
    let daemon = start_daemon().await;
    mount_tool_servers_once(&daemon, &[]).await;
    mount_tool_servers(&daemon, &["filesystem"]).await;
    mount_action_success(&daemon, "/config/mcp/server/add").await;
    let mut app = app_at_tool_gallery(&daemon).await;
    assert!(tool_gallery(&app).servers().is_empty());

    app.handle_key(UiKey::Tab);
    assert_eq!(tool_gallery(&app).focus(), ToolFocus::Id);
    type_str(&mut app, "filesystem");
    app.handle_key(UiKey::Tab);
    app.handle_key(UiKey::Tab);
    type_str(&mut app, "-y @modelcontextprotocol/server-filesystem");

    app.handle_key(UiKey::Enter);
    assert_eq!(tool_gallery(&app).status(), Some("Connecting to filesystem..."));
    settle(&mut app).await;

    let gallery = tool_gallery(&app);
    assert_eq!(gallery.status(), Some("Server connected!"));
    assert_eq!(gallery.servers(), ["filesystem"]);
    // Id and args clear for the next registration; the launcher stays.
    assert!(gallery.id_field().is_empty());
    assert!(gallery.args_field().is_empty());
    assert_eq!(gallery.command_field().text(), "npx");
}

#[tokio::test]
async fn blank_registration_never_reaches_the_daemon() {
    let daemon = start_daemon().await;
    mount_tool_servers(&daemon, &[]).await;
    Mock::given(method("POST"))
        .and(path("/config/mcp/server/add"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": ""
        })))
        .expect(0)
        .mount(&daemon)
        .await;
    let mut app = app_at_tool_gallery(&daemon).await;

    // Id left blank.
    app.handle_key(UiKey::Tab);
    app.handle_key(UiKey::Enter);

    let gallery = tool_gallery(&app);
    assert_eq!(gallery.status(), Some("Server id and command are required"));
    assert!(!gallery.is_adding());
}

#[tokio::test]
async fn inspecting_a_server_lists_its_tools() {
    let daemon = start_daemon().await;
    mount_tool_servers(&daemon, &["filesystem", "github"]).await;
    mount_server_tools(
        &daemon,
        json!([
            { "name": "read_file", "description": "Read a file", "input_schema": {} },
            { "name": "write_file", "description": null, "input_schema": {} }
        ]),
    )
    .await;
    let mut app = app_at_tool_gallery(&daemon).await;
    assert_eq!(tool_gallery(&app).servers().len(), 2);

    app.handle_key(UiKey::Enter);
    {
        let gallery = tool_gallery(&app);
        assert_eq!(gallery.inspected(), Some("filesystem"));
        assert!(gallery.tools_loading());
    }
    settle(&mut app).await;

    let gallery = tool_gallery(&app);
    assert_eq!(gallery.tools().len(), 2);
    assert_eq!(gallery.tools()[0].name, "read_file");
    assert!(gallery.tools()[1].description.is_none());
}
