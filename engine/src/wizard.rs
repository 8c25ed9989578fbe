//! Setup wizard state machine.
//!
//! The wizard is pure state: keys go in, [`WizardCmd`] descriptors come out,
//! and the app layer runs them against the daemon, feeding results back as
//! [`WizardEvent`]s. Nothing in this module performs IO, which is what makes
//! the whole flow testable without a daemon.
//!
//! # State Machine
//!
//! ```text
//! ┌─────────┐ Enter  ┌─────────────┐ Enter  ┌──────────────┐
//! │ Welcome │ ─────▶ │ SystemCheck │ ─────▶ │ EngineChoice │
//! └─────────┘        └─────────────┘        └──────────────┘
//!                                             │        │  │
//!                                      Local  │    't' │  │ Cloud
//!                                             ▼        ▼  │
//!                                  ┌──────────────┐ ┌─────────────┐
//!                                  │ ModelGallery │ │ ToolGallery │
//!                                  └──────────────┘ └─────────────┘
//!                                    use model │       'c' │
//!                                             ▼           ▼
//!                                          ┌──────────────────┐  save ok  ┌────────────┐
//!                                          │      Config      │ ────────▶ │ Configured │
//!                                          └──────────────────┘           └────────────┘
//! ```
//!
//! Esc walks backward: the galleries and Config return to EngineChoice,
//! EngineChoice to SystemCheck, SystemCheck to Welcome. `Configured` is
//! terminal; the app takes the config and opens the chat.
//!
//! # Staleness
//!
//! Every transition bumps an epoch, and every command carries the epoch it
//! was issued under. An event whose epoch is not current is dropped without
//! touching state, so a fetch outliving its step can never leak into the
//! next one. Requests are never cancelled; their results just stop mattering.

use anvil_types::{
    EngineKind, ModelConfig, Recommendation, SystemProfile, Tool, ToolServer,
};

use crate::UiKey;
use crate::form::{EditMotion, FieldEditor};
use crate::gallery::{GalleryData, GalleryRow, ModelGallery};
use crate::tools::{ToolFocus, ToolGallery};
use crate::verifier::{ConnectionVerifier, SaveDecision, TestResolution, TestVerdict};

pub use crate::verifier::TestTicket;

// ============================================================================
// Commands and events
// ============================================================================

/// Daemon work the app layer must start on the wizard's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardCmd {
    FetchSystemReport {
        epoch: u64,
        attempt: u64,
    },
    FetchGallery {
        epoch: u64,
        resource: u64,
    },
    InstallModel {
        epoch: u64,
        model_id: String,
    },
    UninstallModel {
        epoch: u64,
        model_id: String,
    },
    FetchToolServers {
        epoch: u64,
        resource: u64,
    },
    AddToolServer {
        epoch: u64,
        server: ToolServer,
    },
    FetchServerTools {
        epoch: u64,
        resource: u64,
        server_id: String,
    },
    TestConfig {
        epoch: u64,
        ticket: TestTicket,
        config: ModelConfig,
    },
    SaveConfig {
        epoch: u64,
        config: ModelConfig,
    },
}

/// Results flowing back from the app layer. Error strings are already
/// user-facing; domain refusals and transport failures arrive the same way.
#[derive(Debug, Clone)]
pub enum WizardEvent {
    ReportFetched {
        epoch: u64,
        attempt: u64,
        result: Result<SystemReport, String>,
    },
    GalleryFetched {
        epoch: u64,
        resource: u64,
        result: Result<GalleryData, String>,
    },
    InstallFinished {
        epoch: u64,
        result: Result<(), String>,
    },
    UninstallFinished {
        epoch: u64,
        result: Result<(), String>,
    },
    ServersFetched {
        epoch: u64,
        resource: u64,
        result: Result<Vec<String>, String>,
    },
    ServerAdded {
        epoch: u64,
        result: Result<(), String>,
    },
    ToolsFetched {
        epoch: u64,
        resource: u64,
        result: Result<Vec<Tool>, String>,
    },
    TestFinished {
        epoch: u64,
        ticket: TestTicket,
        result: Result<(), String>,
    },
    SaveFinished {
        epoch: u64,
        config: ModelConfig,
        result: Result<(), String>,
    },
}

impl WizardEvent {
    fn epoch(&self) -> u64 {
        match self {
            WizardEvent::ReportFetched { epoch, .. }
            | WizardEvent::GalleryFetched { epoch, .. }
            | WizardEvent::InstallFinished { epoch, .. }
            | WizardEvent::UninstallFinished { epoch, .. }
            | WizardEvent::ServersFetched { epoch, .. }
            | WizardEvent::ServerAdded { epoch, .. }
            | WizardEvent::ToolsFetched { epoch, .. }
            | WizardEvent::TestFinished { epoch, .. }
            | WizardEvent::SaveFinished { epoch, .. } => *epoch,
        }
    }
}

// ============================================================================
// Per-step state
// ============================================================================

/// Both halves of the system check. They are fetched together and either
/// both arrive or the step fails as a whole; partial data is never shown.
#[derive(Debug, Clone)]
pub struct SystemReport {
    pub profile: SystemProfile,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone)]
pub enum ReportPhase {
    Loading,
    Ready(SystemReport),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SystemCheckState {
    phase: ReportPhase,
    /// Retry counter; a result from an earlier attempt is stale.
    attempt: u64,
}

impl SystemCheckState {
    #[must_use]
    pub fn phase(&self) -> &ReportPhase {
        &self.phase
    }
}

#[derive(Debug, Clone)]
pub struct EngineChoiceState {
    recommendation: Option<Recommendation>,
    cursor: EngineKind,
}

impl EngineChoiceState {
    fn new(recommendation: Option<Recommendation>) -> Self {
        let cursor = recommendation
            .as_ref()
            .map_or(EngineKind::Local, |r| r.recommended_engine);
        Self {
            recommendation,
            cursor,
        }
    }

    #[must_use]
    pub fn recommendation(&self) -> Option<&Recommendation> {
        self.recommendation.as_ref()
    }

    #[must_use]
    pub fn cursor(&self) -> EngineKind {
        self.cursor
    }

    fn toggle(&mut self) {
        self.cursor = match self.cursor {
            EngineKind::Local => EngineKind::Cloud,
            EngineKind::Cloud => EngineKind::Local,
        };
    }
}

/// Fields of the endpoint form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigField {
    #[default]
    BaseUrl,
    Model,
    ApiKey,
}

impl ConfigField {
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            ConfigField::BaseUrl => ConfigField::Model,
            ConfigField::Model => ConfigField::ApiKey,
            ConfigField::ApiKey => ConfigField::BaseUrl,
        }
    }

    #[must_use]
    pub fn prev(self) -> Self {
        match self {
            ConfigField::BaseUrl => ConfigField::ApiKey,
            ConfigField::Model => ConfigField::BaseUrl,
            ConfigField::ApiKey => ConfigField::Model,
        }
    }
}

/// The endpoint form plus its verification state.
#[derive(Debug, Clone)]
pub struct ConfigState {
    base_url: FieldEditor,
    model: FieldEditor,
    api_key: FieldEditor,
    focus: ConfigField,
    verifier: ConnectionVerifier,
    saving: bool,
    status: Option<String>,
}

impl ConfigState {
    fn from_config(config: ModelConfig) -> Self {
        Self {
            base_url: FieldEditor::with_text(config.base_url),
            model: FieldEditor::with_text(config.model),
            api_key: FieldEditor::with_text(config.api_key),
            focus: ConfigField::default(),
            verifier: ConnectionVerifier::new(),
            saving: false,
            status: None,
        }
    }

    #[must_use]
    pub fn field(&self, field: ConfigField) -> &FieldEditor {
        match field {
            ConfigField::BaseUrl => &self.base_url,
            ConfigField::Model => &self.model,
            ConfigField::ApiKey => &self.api_key,
        }
    }

    fn active_field_mut(&mut self) -> &mut FieldEditor {
        match self.focus {
            ConfigField::BaseUrl => &mut self.base_url,
            ConfigField::Model => &mut self.model,
            ConfigField::ApiKey => &mut self.api_key,
        }
    }

    #[must_use]
    pub fn focus(&self) -> ConfigField {
        self.focus
    }

    #[must_use]
    pub fn verdict(&self) -> &TestVerdict {
        self.verifier.verdict()
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// The form's values, exactly as typed.
    #[must_use]
    pub fn current_config(&self) -> ModelConfig {
        ModelConfig {
            base_url: self.base_url.text().to_string(),
            model: self.model.text().to_string(),
            api_key: self.api_key.text().to_string(),
        }
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }
}

// ============================================================================
// The wizard
// ============================================================================

/// Where the wizard is.
#[derive(Debug, Clone)]
pub enum WizardStep {
    Welcome,
    SystemCheck(SystemCheckState),
    EngineChoice(EngineChoiceState),
    ModelGallery(ModelGallery),
    ToolGallery(ToolGallery),
    Config(ConfigState),
    /// Saved to the daemon; the app takes over from here.
    Configured(ModelConfig),
}

/// The wizard state machine. See the module docs for the step graph.
#[derive(Debug, Clone)]
pub struct Wizard {
    step: WizardStep,
    epoch: u64,
    /// Remembered from the system check so EngineChoice can highlight the
    /// daemon's suggestion even after walking back and forth.
    recommendation: Option<Recommendation>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: WizardStep::Welcome,
            epoch: 0,
            recommendation: None,
        }
    }

    #[must_use]
    pub fn step(&self) -> &WizardStep {
        &self.step
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True while any daemon call for the current step is outstanding.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        match &self.step {
            WizardStep::Welcome | WizardStep::EngineChoice(_) | WizardStep::Configured(_) => false,
            WizardStep::SystemCheck(state) => matches!(state.phase, ReportPhase::Loading),
            WizardStep::ModelGallery(gallery) => gallery.is_loading() || gallery.is_mutating(),
            WizardStep::ToolGallery(gallery) => {
                gallery.servers_loading() || gallery.tools_loading() || gallery.is_adding()
            }
            WizardStep::Config(state) => state.verifier.is_testing() || state.saving,
        }
    }

    /// Take the final configuration once the wizard reaches `Configured`.
    pub fn take_completed(&mut self) -> Option<ModelConfig> {
        if !matches!(self.step, WizardStep::Configured(_)) {
            return None;
        }
        match std::mem::replace(&mut self.step, WizardStep::Welcome) {
            WizardStep::Configured(config) => Some(config),
            _ => unreachable!(),
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn goto_welcome(&mut self) -> Vec<WizardCmd> {
        self.epoch += 1;
        self.step = WizardStep::Welcome;
        Vec::new()
    }

    fn goto_system_check(&mut self) -> Vec<WizardCmd> {
        self.epoch += 1;
        self.step = WizardStep::SystemCheck(SystemCheckState {
            phase: ReportPhase::Loading,
            attempt: 0,
        });
        vec![WizardCmd::FetchSystemReport {
            epoch: self.epoch,
            attempt: 0,
        }]
    }

    fn goto_engine_choice(&mut self) -> Vec<WizardCmd> {
        self.epoch += 1;
        self.step = WizardStep::EngineChoice(EngineChoiceState::new(self.recommendation.clone()));
        Vec::new()
    }

    fn goto_model_gallery(&mut self) -> Vec<WizardCmd> {
        self.epoch += 1;
        let recommended = self
            .recommendation
            .as_ref()
            .and_then(|r| r.recommended_model.clone());
        let mut gallery = ModelGallery::new(recommended);
        let resource = gallery.begin_refresh();
        self.step = WizardStep::ModelGallery(gallery);
        vec![WizardCmd::FetchGallery {
            epoch: self.epoch,
            resource,
        }]
    }

    fn goto_tool_gallery(&mut self) -> Vec<WizardCmd> {
        self.epoch += 1;
        let mut gallery = ToolGallery::new();
        let resource = gallery.begin_servers_refresh();
        self.step = WizardStep::ToolGallery(gallery);
        vec![WizardCmd::FetchToolServers {
            epoch: self.epoch,
            resource,
        }]
    }

    fn goto_config(&mut self, prefill: ModelConfig) -> Vec<WizardCmd> {
        self.epoch += 1;
        self.step = WizardStep::Config(ConfigState::from_config(prefill));
        Vec::new()
    }

    fn goto_configured(&mut self, config: ModelConfig) -> Vec<WizardCmd> {
        self.epoch += 1;
        self.step = WizardStep::Configured(config);
        Vec::new()
    }

    // ------------------------------------------------------------------------
    // Key handling
    // ------------------------------------------------------------------------

    /// Feed one key. Returns commands for the app layer to start.
    pub fn handle_key(&mut self, key: UiKey) -> Vec<WizardCmd> {
        match self.step {
            WizardStep::Welcome => self.welcome_key(key),
            WizardStep::SystemCheck(_) => self.system_check_key(key),
            WizardStep::EngineChoice(_) => self.engine_choice_key(key),
            WizardStep::ModelGallery(_) => self.model_gallery_key(key),
            WizardStep::ToolGallery(_) => self.tool_gallery_key(key),
            WizardStep::Config(_) => self.config_key(key),
            WizardStep::Configured(_) => Vec::new(),
        }
    }

    fn welcome_key(&mut self, key: UiKey) -> Vec<WizardCmd> {
        match key {
            UiKey::Enter => self.goto_system_check(),
            _ => Vec::new(),
        }
    }

    fn system_check_key(&mut self, key: UiKey) -> Vec<WizardCmd> {
        let WizardStep::SystemCheck(state) = &mut self.step else {
            return Vec::new();
        };
        match key {
            UiKey::Enter => match &state.phase {
                ReportPhase::Ready(_) => self.goto_engine_choice(),
                ReportPhase::Failed(_) => self.retry_report(),
                ReportPhase::Loading => Vec::new(),
            },
            UiKey::Char('r') => match &state.phase {
                ReportPhase::Failed(_) => self.retry_report(),
                _ => Vec::new(),
            },
            UiKey::Esc => self.goto_welcome(),
            _ => Vec::new(),
        }
    }

    fn retry_report(&mut self) -> Vec<WizardCmd> {
        let WizardStep::SystemCheck(state) = &mut self.step else {
            return Vec::new();
        };
        state.attempt += 1;
        state.phase = ReportPhase::Loading;
        let attempt = state.attempt;
        vec![WizardCmd::FetchSystemReport {
            epoch: self.epoch,
            attempt,
        }]
    }

    fn engine_choice_key(&mut self, key: UiKey) -> Vec<WizardCmd> {
        let WizardStep::EngineChoice(state) = &mut self.step else {
            return Vec::new();
        };
        match key {
            UiKey::Up | UiKey::Down => {
                state.toggle();
                Vec::new()
            }
            UiKey::Enter => match state.cursor {
                EngineKind::Local => self.goto_model_gallery(),
                EngineKind::Cloud => self.goto_config(ModelConfig::cloud_default()),
            },
            UiKey::Char('t') => self.goto_tool_gallery(),
            UiKey::Esc => self.goto_system_check(),
            _ => Vec::new(),
        }
    }

    fn model_gallery_key(&mut self, key: UiKey) -> Vec<WizardCmd> {
        let WizardStep::ModelGallery(gallery) = &mut self.step else {
            return Vec::new();
        };
        match key {
            UiKey::Up => {
                gallery.move_up();
                Vec::new()
            }
            UiKey::Down => {
                gallery.move_down();
                Vec::new()
            }
            UiKey::Char('r') => {
                let resource = gallery.begin_refresh();
                vec![WizardCmd::FetchGallery {
                    epoch: self.epoch,
                    resource,
                }]
            }
            UiKey::Enter => match gallery.selected() {
                Some(GalleryRow::Installed(model)) => {
                    let config = model.derived_config();
                    self.goto_config(config)
                }
                Some(GalleryRow::Available(model)) => {
                    let model_id = model.id.clone();
                    if !gallery.begin_mutation(&model_id) {
                        return Vec::new();
                    }
                    gallery.set_status(format!("Installing {model_id}..."));
                    vec![WizardCmd::InstallModel {
                        epoch: self.epoch,
                        model_id,
                    }]
                }
                None => Vec::new(),
            },
            UiKey::Char('x') => match gallery.selected() {
                Some(GalleryRow::Installed(model)) => {
                    let model_id = model.model_id.clone();
                    if !gallery.begin_mutation(&model_id) {
                        return Vec::new();
                    }
                    vec![WizardCmd::UninstallModel {
                        epoch: self.epoch,
                        model_id,
                    }]
                }
                _ => Vec::new(),
            },
            UiKey::Esc => self.goto_engine_choice(),
            _ => Vec::new(),
        }
    }

    fn tool_gallery_key(&mut self, key: UiKey) -> Vec<WizardCmd> {
        let WizardStep::ToolGallery(gallery) = &mut self.step else {
            return Vec::new();
        };
        if let Some(motion) = EditMotion::from_key(&key) {
            // No-op while the server list has focus.
            if let Some(field) = gallery.active_field_mut() {
                field.apply(motion);
            }
            return Vec::new();
        }
        match key {
            UiKey::Tab => {
                gallery.focus_next();
                Vec::new()
            }
            UiKey::BackTab => {
                gallery.focus_prev();
                Vec::new()
            }
            UiKey::Up => {
                if gallery.focus() == ToolFocus::Servers {
                    gallery.move_up();
                }
                Vec::new()
            }
            UiKey::Down => {
                if gallery.focus() == ToolFocus::Servers {
                    gallery.move_down();
                }
                Vec::new()
            }
            UiKey::Enter => {
                if gallery.focus() == ToolFocus::Servers {
                    let Some(server_id) = gallery.selected_server().map(str::to_string) else {
                        return Vec::new();
                    };
                    let resource = gallery.begin_tools_fetch(&server_id);
                    vec![WizardCmd::FetchServerTools {
                        epoch: self.epoch,
                        resource,
                        server_id,
                    }]
                } else {
                    self.submit_registration()
                }
            }
            UiKey::Char(c) => {
                if let Some(field) = gallery.active_field_mut() {
                    field.insert_char(c);
                    return Vec::new();
                }
                match c {
                    'c' => self.goto_config(ModelConfig::cloud_default()),
                    'r' => {
                        let resource = gallery.begin_servers_refresh();
                        vec![WizardCmd::FetchToolServers {
                            epoch: self.epoch,
                            resource,
                        }]
                    }
                    _ => Vec::new(),
                }
            }
            UiKey::Paste(chunk) => {
                if let Some(field) = gallery.active_field_mut() {
                    field.insert_str(&chunk);
                }
                Vec::new()
            }
            UiKey::Esc => self.goto_engine_choice(),
            _ => Vec::new(),
        }
    }

    fn submit_registration(&mut self) -> Vec<WizardCmd> {
        let WizardStep::ToolGallery(gallery) = &mut self.step else {
            return Vec::new();
        };
        if gallery.is_adding() {
            return Vec::new();
        }
        match gallery.registration() {
            Some(server) => {
                let server_id = server.id.to_string();
                gallery.begin_add(&server_id);
                gallery.set_status(format!("Connecting to {server_id}..."));
                vec![WizardCmd::AddToolServer {
                    epoch: self.epoch,
                    server,
                }]
            }
            None => {
                gallery.set_status("Server id and command are required");
                Vec::new()
            }
        }
    }

    fn config_key(&mut self, key: UiKey) -> Vec<WizardCmd> {
        let WizardStep::Config(state) = &mut self.step else {
            return Vec::new();
        };
        // The window between save and Configured is short; edits during it
        // would save-or-discard unpredictably, so they are swallowed.
        if state.saving {
            return Vec::new();
        }
        if let Some(motion) = EditMotion::from_key(&key) {
            if state.active_field_mut().apply(motion) {
                state.verifier.note_edit();
            }
            return Vec::new();
        }
        match key {
            UiKey::Char(c) => {
                state.active_field_mut().insert_char(c);
                state.verifier.note_edit();
                Vec::new()
            }
            UiKey::Paste(chunk) => {
                if state.active_field_mut().insert_str(&chunk) {
                    state.verifier.note_edit();
                }
                Vec::new()
            }
            UiKey::Tab | UiKey::Down => {
                state.focus = state.focus.next();
                Vec::new()
            }
            UiKey::BackTab | UiKey::Up => {
                state.focus = state.focus.prev();
                Vec::new()
            }
            UiKey::Enter => match state.verifier.request_test() {
                Some(ticket) => {
                    let config = state.current_config();
                    vec![WizardCmd::TestConfig {
                        epoch: self.epoch,
                        ticket,
                        config,
                    }]
                }
                None => Vec::new(),
            },
            UiKey::CtrlS => match state.verifier.request_save() {
                SaveDecision::SaveNow => {
                    state.saving = true;
                    state.set_status("Saving configuration...");
                    let config = state.current_config();
                    vec![WizardCmd::SaveConfig {
                        epoch: self.epoch,
                        config,
                    }]
                }
                SaveDecision::TestFirst(ticket) => {
                    let config = state.current_config();
                    vec![WizardCmd::TestConfig {
                        epoch: self.epoch,
                        ticket,
                        config,
                    }]
                }
                SaveDecision::AlreadyTesting => Vec::new(),
            },
            UiKey::Esc => self.goto_engine_choice(),
            _ => Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Event handling
    // ------------------------------------------------------------------------

    /// Feed one result back in. Stale events (older epoch, older attempt or
    /// resource) are dropped whole. May emit follow-up commands, e.g. the
    /// refetch after a mutation or the save after a passed test.
    pub fn apply(&mut self, event: WizardEvent) -> Vec<WizardCmd> {
        if event.epoch() != self.epoch {
            tracing::debug!(
                stale = event.epoch(),
                current = self.epoch,
                "dropping event from an abandoned step"
            );
            return Vec::new();
        }
        match event {
            WizardEvent::ReportFetched {
                attempt, result, ..
            } => {
                let WizardStep::SystemCheck(state) = &mut self.step else {
                    return Vec::new();
                };
                if attempt != state.attempt {
                    return Vec::new();
                }
                match result {
                    Ok(report) => {
                        let recommendation = report.recommendation.clone();
                        state.phase = ReportPhase::Ready(report);
                        self.recommendation = Some(recommendation);
                    }
                    Err(message) => state.phase = ReportPhase::Failed(message),
                }
                Vec::new()
            }
            WizardEvent::GalleryFetched {
                resource, result, ..
            } => {
                if let WizardStep::ModelGallery(gallery) = &mut self.step {
                    gallery.resolve(resource, result);
                }
                Vec::new()
            }
            WizardEvent::InstallFinished { result, .. } => {
                let WizardStep::ModelGallery(gallery) = &mut self.step else {
                    return Vec::new();
                };
                gallery.finish_mutation();
                match result {
                    Ok(()) => gallery.set_status("Installation complete!"),
                    Err(message) => gallery.set_status(format!("Error: {message}")),
                }
                let resource = gallery.begin_refresh();
                vec![WizardCmd::FetchGallery {
                    epoch: self.epoch,
                    resource,
                }]
            }
            WizardEvent::UninstallFinished { result, .. } => {
                let WizardStep::ModelGallery(gallery) = &mut self.step else {
                    return Vec::new();
                };
                gallery.finish_mutation();
                if let Err(message) = result {
                    gallery.set_status(format!("Error: {message}"));
                }
                let resource = gallery.begin_refresh();
                vec![WizardCmd::FetchGallery {
                    epoch: self.epoch,
                    resource,
                }]
            }
            WizardEvent::ServersFetched {
                resource, result, ..
            } => {
                if let WizardStep::ToolGallery(gallery) = &mut self.step {
                    gallery.resolve_servers(resource, result);
                }
                Vec::new()
            }
            WizardEvent::ServerAdded { result, .. } => {
                let WizardStep::ToolGallery(gallery) = &mut self.step else {
                    return Vec::new();
                };
                gallery.finish_add();
                match result {
                    Ok(()) => {
                        gallery.set_status("Server connected!");
                        gallery.reset_registration_form();
                    }
                    Err(message) => gallery.set_status(format!("Error: {message}")),
                }
                let resource = gallery.begin_servers_refresh();
                vec![WizardCmd::FetchToolServers {
                    epoch: self.epoch,
                    resource,
                }]
            }
            WizardEvent::ToolsFetched {
                resource, result, ..
            } => {
                if let WizardStep::ToolGallery(gallery) = &mut self.step {
                    gallery.resolve_tools(resource, result);
                }
                Vec::new()
            }
            WizardEvent::TestFinished { ticket, result, .. } => {
                let WizardStep::Config(state) = &mut self.step else {
                    return Vec::new();
                };
                match state.verifier.resolve(ticket, result) {
                    TestResolution::Verified {
                        save_requested: true,
                    } => {
                        state.saving = true;
                        state.set_status("Saving configuration...");
                        let config = state.current_config();
                        vec![WizardCmd::SaveConfig {
                            epoch: self.epoch,
                            config,
                        }]
                    }
                    TestResolution::Verified {
                        save_requested: false,
                    }
                    | TestResolution::Rejected
                    | TestResolution::Stale => Vec::new(),
                }
            }
            WizardEvent::SaveFinished { config, result, .. } => {
                let WizardStep::Config(state) = &mut self.step else {
                    return Vec::new();
                };
                state.saving = false;
                match result {
                    Ok(()) => self.goto_configured(config),
                    Err(message) => {
                        state.set_status(format!("Error: {message}"));
                        Vec::new()
                    }
                }
            }
        }
    }
}
