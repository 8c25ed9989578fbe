//! Core engine for Anvil - wizard state machine and daemon orchestration.
//!
//! This crate contains the [`App`] state machine without TUI dependencies.
//! The TUI translates terminal input into [`UiKey`]s and renders whatever
//! [`App::phase`] exposes; everything else happens here.

use tokio::sync::mpsc;

use crate::chat::ChatSession;
use crate::form::EditMotion;
use crate::gallery::GalleryData;
use crate::wizard::{SystemReport, Wizard, WizardCmd, WizardEvent, WizardStep};

pub mod chat;
pub mod form;
pub mod gallery;
pub mod resources;
pub mod tools;
pub mod verifier;
pub mod wizard;

// Config types - loaded by the caller, consumed here.
mod config;
pub use config::{
    AnvilConfig, ConfigError, DAEMON_URL_ENV, DaemonSection, UiSection, resolve_daemon_url,
    resolve_ui_options,
};

// Re-export from crates for public API
pub use anvil_client::{ClientError, DEFAULT_DAEMON_URL, DaemonClient};
pub use anvil_types::ui::UiOptions;
pub use anvil_types::{
    ActionOutcome, AvailableModel, ChatMessage, ChatRole, EngineKind, InstalledModel, ModelConfig,
    Recommendation, RuntimeKind, SystemProfile, Tool, ToolServer,
};

// ============================================================================
// UiKey - semantic terminal input
// ============================================================================

/// A keypress after the terminal layer has decoded it.
///
/// The TUI owns the mapping from raw terminal events to these; the engine
/// never sees modifiers or escape sequences. `Paste` carries a whole bracket
/// paste so multi-character input lands as one edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiKey {
    Char(char),
    Enter,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Backspace,
    Delete,
    Home,
    End,
    Esc,
    CtrlS,
    CtrlW,
    CtrlU,
    Paste(String),
}

// ============================================================================
// App - top-level state machine
// ============================================================================

/// What the user is looking at: the setup wizard, then the chat.
#[derive(Debug)]
pub enum AppPhase {
    Wizard(Wizard),
    Chat(ChatSession),
}

/// A finished background task, delivered through the app's event channel.
#[derive(Debug)]
enum TaskEvent {
    Wizard(WizardEvent),
    ChatReply(Result<ChatMessage, String>),
}

/// Application state.
///
/// Keys go into [`App::handle_key`]; daemon work runs on spawned tasks whose
/// results come back through [`App::poll_events`]. The TUI calls both once
/// per frame, so all state changes happen on the UI thread.
pub struct App {
    daemon: DaemonClient,
    phase: AppPhase,
    /// The configuration saved at the end of the wizard.
    active_config: Option<ModelConfig>,
    ui_options: UiOptions,
    events_tx: mpsc::UnboundedSender<TaskEvent>,
    events_rx: mpsc::UnboundedReceiver<TaskEvent>,
    tick: usize,
    should_quit: bool,
}

impl App {
    #[must_use]
    pub fn new(daemon: DaemonClient) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            daemon,
            phase: AppPhase::Wizard(Wizard::new()),
            active_config: None,
            ui_options: UiOptions::default(),
            events_tx,
            events_rx,
            tick: 0,
            should_quit: false,
        }
    }

    #[must_use]
    pub fn phase(&self) -> &AppPhase {
        &self.phase
    }

    #[must_use]
    pub fn daemon_url(&self) -> &str {
        self.daemon.base_url()
    }

    /// The configuration the wizard saved, once it has.
    #[must_use]
    pub fn active_config(&self) -> Option<&ModelConfig> {
        self.active_config.as_ref()
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.ui_options
    }

    pub fn set_ui_options(&mut self, options: UiOptions) {
        self.ui_options = options;
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    /// True while any daemon call is outstanding. Drives the spinner.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        match &self.phase {
            AppPhase::Wizard(wizard) => wizard.is_busy(),
            AppPhase::Chat(chat) => chat.is_waiting(),
        }
    }

    /// Increment the animation tick.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    #[must_use]
    pub fn tick_count(&self) -> usize {
        self.tick
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    pub fn handle_key(&mut self, key: UiKey) {
        match &mut self.phase {
            AppPhase::Wizard(wizard) => {
                // Esc on the first step is the only in-wizard exit.
                if key == UiKey::Esc && matches!(wizard.step(), WizardStep::Welcome) {
                    self.should_quit = true;
                    return;
                }
                let cmds = wizard.handle_key(key);
                self.run_commands(cmds);
            }
            AppPhase::Chat(chat) => match key {
                UiKey::Enter => {
                    if let Some(transcript) = chat.submit() {
                        self.spawn_chat(transcript);
                    }
                }
                UiKey::Char(c) => {
                    chat.input_mut().insert_char(c);
                }
                UiKey::Paste(chunk) => {
                    chat.input_mut().insert_str(&chunk);
                }
                other => {
                    if let Some(motion) = EditMotion::from_key(&other) {
                        chat.input_mut().apply(motion);
                    }
                }
            },
        }
    }

    // ------------------------------------------------------------------------
    // Background tasks
    // ------------------------------------------------------------------------

    /// Drain finished tasks and feed them back into the state machine.
    pub fn poll_events(&mut self) {
        loop {
            let event = match self.events_rx.try_recv() {
                Ok(event) => event,
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    tracing::warn!("task channel disconnected");
                    break;
                }
            };
            match event {
                TaskEvent::Wizard(event) => {
                    let AppPhase::Wizard(wizard) = &mut self.phase else {
                        // A wizard task that outlived the wizard. Nothing to do.
                        continue;
                    };
                    let follow_ups = wizard.apply(event);
                    if let Some(config) = wizard.take_completed() {
                        self.active_config = Some(config);
                        self.phase = AppPhase::Chat(ChatSession::new());
                        continue;
                    }
                    self.run_commands(follow_ups);
                }
                TaskEvent::ChatReply(result) => {
                    let AppPhase::Chat(chat) = &mut self.phase else {
                        continue;
                    };
                    match result {
                        Ok(message) => chat.resolve_reply(message),
                        Err(message) => chat.resolve_failure(message),
                    }
                }
            }
        }
    }

    fn run_commands(&self, cmds: Vec<WizardCmd>) {
        for cmd in cmds {
            let daemon = self.daemon.clone();
            let tx = self.events_tx.clone();
            tokio::spawn(async move {
                let event = run_command(&daemon, cmd).await;
                let _ = tx.send(TaskEvent::Wizard(event));
            });
        }
    }

    fn spawn_chat(&self, transcript: Vec<ChatMessage>) {
        let daemon = self.daemon.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = daemon
                .send_chat(&transcript)
                .await
                .map_err(|e| e.user_message(daemon.base_url()));
            let _ = tx.send(TaskEvent::ChatReply(result));
        });
    }
}

// ============================================================================
// Command execution
// ============================================================================

async fn run_command(daemon: &DaemonClient, cmd: WizardCmd) -> WizardEvent {
    match cmd {
        WizardCmd::FetchSystemReport { epoch, attempt } => {
            let result = fetch_system_report(daemon).await;
            WizardEvent::ReportFetched {
                epoch,
                attempt,
                result,
            }
        }
        WizardCmd::FetchGallery { epoch, resource } => {
            let result = fetch_gallery(daemon).await;
            WizardEvent::GalleryFetched {
                epoch,
                resource,
                result,
            }
        }
        WizardCmd::InstallModel { epoch, model_id } => {
            let result = flatten_action(daemon.install_model(&model_id).await, daemon);
            WizardEvent::InstallFinished { epoch, result }
        }
        WizardCmd::UninstallModel { epoch, model_id } => {
            let result = flatten_action(daemon.uninstall_model(&model_id).await, daemon);
            WizardEvent::UninstallFinished { epoch, result }
        }
        WizardCmd::FetchToolServers { epoch, resource } => {
            let result = daemon
                .tool_servers()
                .await
                .map_err(|e| e.user_message(daemon.base_url()));
            WizardEvent::ServersFetched {
                epoch,
                resource,
                result,
            }
        }
        WizardCmd::AddToolServer { epoch, server } => {
            let result = flatten_action(daemon.add_tool_server(&server).await, daemon);
            WizardEvent::ServerAdded { epoch, result }
        }
        WizardCmd::FetchServerTools {
            epoch,
            resource,
            server_id,
        } => {
            let result = daemon
                .server_tools(&server_id)
                .await
                .map_err(|e| e.user_message(daemon.base_url()));
            WizardEvent::ToolsFetched {
                epoch,
                resource,
                result,
            }
        }
        WizardCmd::TestConfig {
            epoch,
            ticket,
            config,
        } => {
            let result = flatten_action(daemon.test_model_config(&config).await, daemon);
            WizardEvent::TestFinished {
                epoch,
                ticket,
                result,
            }
        }
        WizardCmd::SaveConfig { epoch, config } => {
            let result = flatten_action(daemon.save_model_config(&config).await, daemon);
            WizardEvent::SaveFinished {
                epoch,
                config,
                result,
            }
        }
    }
}

/// Profile and recommendation are fetched together: either both arrive or
/// the system check fails as a whole. The profile's error wins when both
/// fail, so the user sees one message, not two.
async fn fetch_system_report(daemon: &DaemonClient) -> Result<SystemReport, String> {
    let (profile, recommendation) = tokio::join!(
        daemon.system_profile(),
        daemon.system_recommendation()
    );
    match (profile, recommendation) {
        (Ok(profile), Ok(recommendation)) => Ok(SystemReport {
            profile,
            recommendation,
        }),
        (Err(e), _) | (_, Err(e)) => Err(e.user_message(daemon.base_url())),
    }
}

/// Installed and available lists are one gallery; a half-loaded gallery is
/// worse than an error, so partial success fails the load.
async fn fetch_gallery(daemon: &DaemonClient) -> Result<GalleryData, String> {
    let (installed, available) = tokio::join!(
        daemon.installed_models(),
        daemon.available_models()
    );
    match (installed, available) {
        (Ok(installed), Ok(available)) => Ok(GalleryData {
            installed,
            available,
        }),
        (Err(e), _) | (_, Err(e)) => Err(e.user_message(daemon.base_url())),
    }
}

/// Collapse a daemon action to the string the user should see. A daemon
/// refusal passes its message through verbatim; transport and protocol
/// failures get the client's phrasing.
fn flatten_action(
    outcome: Result<ActionOutcome, ClientError>,
    daemon: &DaemonClient,
) -> Result<(), String> {
    match outcome {
        Ok(ActionOutcome::Success) => Ok(()),
        Ok(ActionOutcome::Failure(message)) => Err(message),
        Err(e) => Err(e.user_message(daemon.base_url())),
    }
}
