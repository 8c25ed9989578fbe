//! Connection verification for the endpoint form.
//!
//! A verdict is only ever about the exact field values that were tested.
//! The moment any field changes, the old verdict is meaningless, so every
//! edit resets the verdict to [`TestVerdict::Idle`] and bumps an epoch that
//! orphans whatever test may still be in flight.
//!
//! ```text
//!            request_test                resolve(Ok)
//!   Idle ──────────────────▶ Testing ──────────────────▶ Success
//!    ▲                        │    │                        │
//!    │   edit (any field)     │    │ resolve(Err)           │ edit
//!    ◀────────────────────────┘    ▼                        │
//!    ◀──────────────────────── Error(msg) ◀── edit ─────────┘
//! ```
//!
//! Saving is gated on `Success`. A save request from `Idle` or `Error` runs
//! exactly one test first and remembers the intent; if that test passes, the
//! save proceeds without another keypress. A failed or orphaned test drops
//! the intent.

/// Outcome of testing the current field values against the daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TestVerdict {
    /// Nothing known about the current values.
    #[default]
    Idle,
    /// A test for the current values is in flight.
    Testing,
    /// The daemon verified the current values end to end.
    Success,
    /// The daemon rejected the values; the message is user-facing.
    Error(String),
}

/// Proof that a test was started for a particular edit epoch. Results
/// resolve only against a matching ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestTicket {
    epoch: u64,
}

/// What the caller should do with a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveDecision {
    /// The current values are verified; save immediately.
    SaveNow,
    /// Not verified yet; run this test, the save intent is remembered.
    TestFirst(TestTicket),
    /// A test is already in flight; the save intent is now attached to it.
    AlreadyTesting,
}

/// What a finished test meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResolution {
    /// The values passed; `save_requested` is true when a save was waiting
    /// on this verdict.
    Verified { save_requested: bool },
    /// The values failed; any pending save intent was dropped.
    Rejected,
    /// The fields changed while the test ran; nothing was updated.
    Stale,
}

/// Tracks the verdict for an endpoint form.
#[derive(Debug, Clone, Default)]
pub struct ConnectionVerifier {
    verdict: TestVerdict,
    epoch: u64,
    save_requested: bool,
}

impl ConnectionVerifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn verdict(&self) -> &TestVerdict {
        &self.verdict
    }

    #[must_use]
    pub fn is_testing(&self) -> bool {
        matches!(self.verdict, TestVerdict::Testing)
    }

    /// Record that a field changed. The verdict returns to `Idle`, any
    /// in-flight test becomes stale, and any pending save intent is dropped.
    pub fn note_edit(&mut self) {
        self.epoch += 1;
        self.verdict = TestVerdict::Idle;
        self.save_requested = false;
    }

    /// Start a test of the current values. Returns `None` while a test is
    /// already in flight; there is never more than one.
    pub fn request_test(&mut self) -> Option<TestTicket> {
        if self.is_testing() {
            return None;
        }
        self.verdict = TestVerdict::Testing;
        Some(TestTicket { epoch: self.epoch })
    }

    /// Ask to save the current values.
    pub fn request_save(&mut self) -> SaveDecision {
        match self.verdict {
            TestVerdict::Success => SaveDecision::SaveNow,
            TestVerdict::Testing => {
                self.save_requested = true;
                SaveDecision::AlreadyTesting
            }
            TestVerdict::Idle | TestVerdict::Error(_) => {
                self.verdict = TestVerdict::Testing;
                self.save_requested = true;
                SaveDecision::TestFirst(TestTicket { epoch: self.epoch })
            }
        }
    }

    /// Accept a test result. `result` is `Ok` when the daemon verified the
    /// values, `Err` with a user-facing message otherwise.
    pub fn resolve(&mut self, ticket: TestTicket, result: Result<(), String>) -> TestResolution {
        if ticket.epoch != self.epoch || !self.is_testing() {
            tracing::debug!(
                ticket = ticket.epoch,
                current = self.epoch,
                "dropping stale test result"
            );
            return TestResolution::Stale;
        }
        match result {
            Ok(()) => {
                self.verdict = TestVerdict::Success;
                let save_requested = std::mem::take(&mut self.save_requested);
                TestResolution::Verified { save_requested }
            }
            Err(message) => {
                self.verdict = TestVerdict::Error(message);
                self.save_requested = false;
                TestResolution::Rejected
            }
        }
    }
}
