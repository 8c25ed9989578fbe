//! Typed HTTP client for the Anvil daemon.
//!
//! [`DaemonClient`] wraps every daemon endpoint the wizard and chat screens
//! use. It is a thin translation layer: JSON in, domain types out, with
//! failures split into the three cases callers handle differently:
//!
//! - [`ClientError::Transport`] - the request never completed (daemon down,
//!   timeout, connection reset)
//! - [`ClientError::Http`] - the daemon answered with a non-2xx status
//! - [`ClientError::Protocol`] - the daemon answered 2xx but the body did not
//!   match the expected shape (usually a client/daemon version mismatch)
//!
//! Endpoints that report success or failure through the daemon's
//! `{status, message}` envelope return `Ok(ActionOutcome)` instead: the
//! daemon declining an action is a domain answer, not a client failure.
//!
//! No retry lives here. Every call maps to exactly one request; recovery is
//! the user pressing the retry key.

use std::sync::OnceLock;
use std::time::Duration;

use anvil_types::{
    ActionOutcome, AvailableModel, ChatMessage, InstalledModel, ModelConfig, Recommendation,
    StatusReply, SystemProfile, Tool, ToolServer,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Default daemon address when no configuration overrides it.
pub const DEFAULT_DAEMON_URL: &str = "http://localhost:3046";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Shared HTTP client for all daemon traffic.
///
/// Built once; reqwest clients pool connections internally, so cloning the
/// returned reference is cheap and keeps one pool per process.
pub fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        base_client_builder().build().unwrap_or_else(|e| {
            tracing::error!("Failed to build tuned HTTP client: {e}. Falling back to defaults.");
            reqwest::Client::builder()
                .build()
                .expect("default HTTP client must build")
        })
    })
}

fn base_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        // Chat turns can take a while on small local models.
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
}

// ============================================================================
// Errors
// ============================================================================

/// Failure of a single daemon call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("could not reach the daemon: {0}")]
    Transport(#[from] reqwest::Error),
    /// The daemon responded outside the 2xx range.
    #[error("daemon returned HTTP {status}")]
    Http { status: reqwest::StatusCode },
    /// The response body did not decode as the expected shape.
    #[error("could not decode daemon reply: {0}")]
    Protocol(#[source] reqwest::Error),
}

impl ClientError {
    /// One-line description for status bars and error panes.
    ///
    /// `daemon_url` is the base URL the client was talking to; transport
    /// failures name it so the user knows what to start.
    #[must_use]
    pub fn user_message(&self, daemon_url: &str) -> String {
        match self {
            ClientError::Transport(_) => {
                format!("Cannot reach the daemon at {daemon_url}. Is it running?")
            }
            ClientError::Http { status } => {
                format!("Daemon returned HTTP {}", status.as_u16())
            }
            ClientError::Protocol(_) => {
                "Unexpected reply from the daemon (version mismatch?)".to_string()
            }
        }
    }
}

// ============================================================================
// Wire envelopes
// ============================================================================

#[derive(Debug, serde::Deserialize)]
struct ModelsEnvelope<T> {
    models: Vec<T>,
}

#[derive(Debug, serde::Deserialize)]
struct ServersEnvelope {
    servers: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ToolsEnvelope {
    tools: Vec<Tool>,
}

#[derive(Debug, serde::Deserialize)]
struct ChatEnvelope {
    message: ChatMessage,
}

#[derive(Debug, Serialize)]
struct ModelIdRequest<'a> {
    model_id: &'a str,
}

#[derive(Debug, Serialize)]
struct ServerIdRequest<'a> {
    server_id: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
}

// ============================================================================
// Client
// ============================================================================

/// Handle to one Anvil daemon. Cheap to clone; carries the base URL and a
/// reference to the shared connection pool.
#[derive(Debug, Clone)]
pub struct DaemonClient {
    base_url: String,
    http: reqwest::Client,
}

impl DaemonClient {
    /// Create a client for the daemon at `base_url`. A trailing slash on the
    /// base URL is tolerated and normalized away.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: http_client().clone(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    // ------------------------------------------------------------------------
    // System report
    // ------------------------------------------------------------------------

    pub async fn system_profile(&self) -> Result<SystemProfile, ClientError> {
        self.get_json("/system/profile").await
    }

    pub async fn system_recommendation(&self) -> Result<Recommendation, ClientError> {
        self.get_json("/system/recommendation").await
    }

    // ------------------------------------------------------------------------
    // Model configuration
    // ------------------------------------------------------------------------

    /// Ask the daemon to exercise `config` end to end without persisting it.
    pub async fn test_model_config(
        &self,
        config: &ModelConfig,
    ) -> Result<ActionOutcome, ClientError> {
        self.post_status("/config/model/test", config).await
    }

    /// Persist `config` as the active model configuration.
    pub async fn save_model_config(
        &self,
        config: &ModelConfig,
    ) -> Result<ActionOutcome, ClientError> {
        self.post_status("/config/model", config).await
    }

    // ------------------------------------------------------------------------
    // Local model gallery
    // ------------------------------------------------------------------------

    pub async fn available_models(&self) -> Result<Vec<AvailableModel>, ClientError> {
        let envelope: ModelsEnvelope<AvailableModel> =
            self.get_json("/config/local/available_models").await?;
        Ok(envelope.models)
    }

    pub async fn installed_models(&self) -> Result<Vec<InstalledModel>, ClientError> {
        let envelope: ModelsEnvelope<InstalledModel> =
            self.get_json("/config/local/installed_models").await?;
        Ok(envelope.models)
    }

    pub async fn install_model(&self, model_id: &str) -> Result<ActionOutcome, ClientError> {
        self.post_status("/config/local/install_model", &ModelIdRequest { model_id })
            .await
    }

    pub async fn uninstall_model(&self, model_id: &str) -> Result<ActionOutcome, ClientError> {
        self.post_status("/config/local/uninstall_model", &ModelIdRequest { model_id })
            .await
    }

    // ------------------------------------------------------------------------
    // Tool servers
    // ------------------------------------------------------------------------

    /// Ids of every registered tool server. The daemon's list endpoint does
    /// not return commands or args; those exist write-side only.
    pub async fn tool_servers(&self) -> Result<Vec<String>, ClientError> {
        let envelope: ServersEnvelope = self.get_json("/config/mcp/servers").await?;
        Ok(envelope.servers)
    }

    pub async fn add_tool_server(&self, server: &ToolServer) -> Result<ActionOutcome, ClientError> {
        self.post_status("/config/mcp/server/add", server).await
    }

    pub async fn server_tools(&self, server_id: &str) -> Result<Vec<Tool>, ClientError> {
        let envelope: ToolsEnvelope = self
            .post_json("/config/mcp/tools", &ServerIdRequest { server_id })
            .await?;
        Ok(envelope.tools)
    }

    // ------------------------------------------------------------------------
    // Chat
    // ------------------------------------------------------------------------

    /// Send the full transcript and return the daemon's reply turn.
    ///
    /// The daemon is stateless here: it answers from exactly the messages it
    /// is given, so the caller always sends the whole log.
    pub async fn send_chat(&self, messages: &[ChatMessage]) -> Result<ChatMessage, ClientError> {
        let envelope: ChatEnvelope = self.post_json("/chat", &ChatRequest { messages }).await?;
        Ok(envelope.message)
    }

    // ------------------------------------------------------------------------
    // Transport plumbing
    // ------------------------------------------------------------------------

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.endpoint(path);
        tracing::debug!(%url, "daemon GET");
        let response = self.http.get(&url).send().await?;
        Self::parse(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        tracing::debug!(%url, "daemon POST");
        let response = self.http.post(&url).json(body).send().await?;
        Self::parse(response).await
    }

    /// POST returning the `{status, message}` envelope, collapsed to an outcome.
    async fn post_status<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ActionOutcome, ClientError> {
        let reply: StatusReply = self.post_json(path, body).await?;
        Ok(reply.into_outcome())
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Http { status });
        }
        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                ClientError::Protocol(e)
            } else {
                ClientError::Transport(e)
            }
        })
    }
}
