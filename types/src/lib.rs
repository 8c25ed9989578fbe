//! Core domain types for Anvil.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here mirrors the daemon's wire contract; the engine and TUI build on top.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod ui;

// ============================================================================
// NonEmpty String Types
// ============================================================================

/// A string guaranteed to be non-empty (after trimming).
///
/// Used for fields the daemon rejects when blank (tool server id and command).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

#[derive(Debug, Error)]
#[error("value must not be empty")]
pub struct EmptyStringError;

impl NonEmptyString {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyStringError> {
        let value = value.into();
        if value.trim().is_empty() {
            Err(EmptyStringError)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::ops::Deref for NonEmptyString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Engine & Runtime Kinds
// ============================================================================

/// How the user wants to run models: on their own hardware or against a cloud API.
///
/// Wire values are the capitalized literals `"Local"` / `"Cloud"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineKind {
    Local,
    Cloud,
}

impl EngineKind {
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            EngineKind::Local => "Local Models",
            EngineKind::Cloud => "Cloud API",
        }
    }
}

/// Runtime backing a catalog entry. Cloud entries are hidden from the local gallery.
///
/// Wire values are lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    Local,
    Cloud,
}

impl RuntimeKind {
    #[must_use]
    pub fn is_cloud(self) -> bool {
        matches!(self, RuntimeKind::Cloud)
    }
}

// ============================================================================
// System Report
// ============================================================================

/// Immutable hardware/OS snapshot reported by the daemon.
///
/// The last three fields are newer additions to the daemon's payload; older
/// daemons omit them, so they decode as empty/zero and are hidden when blank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemProfile {
    pub os_name: String,
    pub cpu_cores: usize,
    pub total_memory_gb: u64,
    pub architecture: String,
    #[serde(default)]
    pub os_version: String,
    #[serde(default)]
    pub cpu_brand: String,
    #[serde(default)]
    pub used_memory_gb: u64,
}

/// The daemon's engine suggestion for this hardware, with its reasoning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommended_engine: EngineKind,
    pub reason: String,
    /// Specific model the daemon suggests for the recommended engine, when it has one.
    #[serde(default)]
    pub recommended_model: Option<String>,
}

// ============================================================================
// Model Configuration
// ============================================================================

/// The engine endpoint under construction in the wizard, persisted to the
/// daemon once verified. `api_key` may be empty (local engines need none).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: String,
}

impl ModelConfig {
    /// Default endpoint offered on the cloud path.
    pub const CLOUD_BASE_URL: &'static str = "https://api.openai.com/v1";
    /// Default model offered on the cloud path.
    pub const CLOUD_MODEL: &'static str = "gpt-4o-mini";

    /// The prefill used when the user picks the cloud engine (or arrives at the
    /// config step without selecting a local model).
    #[must_use]
    pub fn cloud_default() -> Self {
        Self {
            base_url: Self::CLOUD_BASE_URL.to_string(),
            model: Self::CLOUD_MODEL.to_string(),
            api_key: String::new(),
        }
    }
}

/// A catalog entry the daemon can install. Read-only to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableModel {
    pub id: String,
    pub name: String,
    pub description: String,
    pub size_gb: f64,
    pub recommended_ram_gb: u32,
    pub download_url: String,
    pub local_port: u16,
    pub runtime_type: RuntimeKind,
}

/// A model present on the user's machine, as reported by the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledModel {
    pub model_id: String,
    pub install_path: String,
    pub is_running: bool,
    pub port: u16,
    pub runtime_type: RuntimeKind,
}

impl InstalledModel {
    /// Derive the endpoint configuration for this installed model.
    ///
    /// Pure and idempotent: the same installed model always maps to the same
    /// config (`http://localhost:{port}/v1`, the full model id, no API key).
    #[must_use]
    pub fn derived_config(&self) -> ModelConfig {
        ModelConfig {
            base_url: format!("http://localhost:{}/v1", self.port),
            model: self.model_id.clone(),
            api_key: String::new(),
        }
    }
}

// ============================================================================
// Tool Servers
// ============================================================================

/// A tool server registration sent to the daemon. The daemon's list endpoint
/// returns only ids; the command and args exist write-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolServer {
    pub id: NonEmptyString,
    pub command: NonEmptyString,
    pub args: Vec<String>,
}

impl ToolServer {
    #[must_use]
    pub fn new(id: NonEmptyString, command: NonEmptyString, args: Vec<String>) -> Self {
        Self { id, command, args }
    }
}

/// A callable tool exposed by one server. Never cached across server switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

// ============================================================================
// Chat
// ============================================================================

/// Who a chat turn belongs to. Wire values are lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl ChatRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::System => "system",
        }
    }
}

/// One turn of the session log. System turns record delivery failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

// ============================================================================
// Daemon Status Replies
// ============================================================================

/// The daemon's loose `{status, message}` envelope for mutating endpoints.
///
/// `status` is the literal `"success"` or any other string on failure.
/// Convert to [`ActionOutcome`] at the client boundary; nothing downstream
/// should pattern-match on raw status strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReply {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl StatusReply {
    pub const SUCCESS: &'static str = "success";

    /// Collapse the envelope into a two-variant outcome. A failure without a
    /// message falls back to the raw status string so the user sees something.
    #[must_use]
    pub fn into_outcome(self) -> ActionOutcome {
        if self.status == Self::SUCCESS {
            ActionOutcome::Success
        } else if self.message.is_empty() {
            ActionOutcome::Failure(self.status)
        } else {
            ActionOutcome::Failure(self.message)
        }
    }
}

/// Domain-level result of a mutating daemon call, distinct from transport or
/// HTTP failure. Failures carry the daemon's human-readable cause verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    Failure(String),
}

impl ActionOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Success)
    }

    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            ActionOutcome::Success => None,
            ActionOutcome::Failure(message) => Some(message),
        }
    }
}
