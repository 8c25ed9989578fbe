//! Daemon-owned state mirrored into the UI.
//!
//! The daemon is the source of truth for everything the wizard displays:
//! model lists, tool server lists, tool lists. The client never patches these
//! locally after a mutation; it refetches and shows whatever the daemon
//! reports. [`Reconciled`] tracks one such mirrored payload.
//!
//! ```text
//!          begin_refresh              resolve(Ok)
//!   Idle ───────────────▶ Loading ───────────────▶ Ready
//!                            │    ◀───────────────   │
//!                            │      begin_refresh    │
//!                            │ resolve(Err)          │ begin_mutation /
//!                            ▼                       ▼ finish_mutation
//!                         Failed                 (refetch follows)
//! ```
//!
//! Every refresh gets a new epoch; a resolve carrying an older epoch is
//! dropped. That is the only staleness mechanism - in-flight requests are
//! never cancelled, their results just stop mattering.

/// Load state of a mirrored payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPhase {
    /// Nothing fetched yet.
    Idle,
    /// A refresh is in flight.
    Loading,
    /// The payload reflects the daemon's last answer.
    Ready,
    /// The last refresh failed; the message is already user-facing.
    Failed(String),
}

/// A payload mirrored from the daemon, with refresh staleness tracking and
/// at most one mutation in flight.
#[derive(Debug, Clone)]
pub struct Reconciled<T> {
    value: T,
    phase: LoadPhase,
    epoch: u64,
    /// Key of the mutation in flight (a model id, a server id). One at a
    /// time; a second request while this is set must be ignored.
    pending: Option<String>,
}

impl<T: Default> Default for Reconciled<T> {
    fn default() -> Self {
        Self {
            value: T::default(),
            phase: LoadPhase::Idle,
            epoch: 0,
            pending: None,
        }
    }
}

impl<T: Default> Reconciled<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last payload the daemon reported. Stays visible during a refresh.
    #[must_use]
    pub fn get(&self) -> &T {
        &self.value
    }

    #[must_use]
    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, LoadPhase::Loading)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.phase, LoadPhase::Ready)
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            LoadPhase::Failed(message) => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Start a refresh, keeping the stale payload visible until the new one
    /// lands. Returns the epoch the eventual [`Self::resolve`] must carry.
    pub fn begin_refresh(&mut self) -> u64 {
        self.epoch += 1;
        self.phase = LoadPhase::Loading;
        self.epoch
    }

    /// Start a refresh that immediately blanks the payload. Used where
    /// showing the previous payload would be wrong, not merely stale
    /// (one server's tools while another server's are loading).
    pub fn begin_refresh_cleared(&mut self) -> u64 {
        self.value = T::default();
        self.begin_refresh()
    }

    /// Accept a refresh result. Returns false (and changes nothing) when the
    /// epoch is not the current one.
    pub fn resolve(&mut self, epoch: u64, result: Result<T, String>) -> bool {
        if epoch != self.epoch {
            tracing::debug!(stale = epoch, current = self.epoch, "dropping stale refresh");
            return false;
        }
        match result {
            Ok(value) => {
                self.value = value;
                self.phase = LoadPhase::Ready;
            }
            Err(message) => {
                self.phase = LoadPhase::Failed(message);
            }
        }
        true
    }

    /// Claim the mutation slot for `key`. Returns false when a mutation is
    /// already in flight; the caller drops the request.
    pub fn begin_mutation(&mut self, key: impl Into<String>) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(key.into());
        true
    }

    /// Release the mutation slot, returning its key.
    pub fn finish_mutation(&mut self) -> Option<String> {
        self.pending.take()
    }

    #[must_use]
    pub fn is_mutating(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn pending_key(&self) -> Option<&str> {
        self.pending.as_deref()
    }
}
