//! Generation orchestrator
//!
//! Owns the writing form, triggers relay calls and runs the bounded retry
//! protocol:
//!
//! ```text
//! Idle -> Validating -> Calling -> Success -> Idle
//!                          |  ^
//!                          v  |
//!                     RetryPending
//!                          |
//!                          v
//!                        Failed -> Idle
//! ```
//!
//! Rate-limited (429) and network-level failures are retried while fewer than
//! three calls have been made; everything else ends the sequence at once.
//! `generate` takes `&mut self`, so one orchestrator can never run two
//! sequences at the same time.

pub mod client;
pub mod notify;
pub mod retry;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::DEFAULT_API_KEY_ENV;
use crate::session::{IdentityProvider, User};
use crate::types::{ErrorKind, GenerationRequest};

pub use client::{CallError, HttpRelayClient, RelayClient};
pub use notify::{Notice, NoticeLevel, NoticeLog, NotificationSink, TracingSink};
pub use retry::{RetryCause, RetryPolicy, RetryState};

const GENERIC_FAILURE: &str = "Generation failed, try again later or switch to another model";

/// Where a generation sequence currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    Calling,
    RetryPending,
    Success,
    Failed,
}

impl Phase {
    /// True while a call or a backoff is outstanding
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Calling | Self::RetryPending)
    }
}

/// Terminal failure of a sequence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Required fields are empty; nothing was sent
    #[error("Please fill in all required fields ({})", .missing.join(", "))]
    FormIncomplete { missing: Vec<&'static str> },

    #[error(transparent)]
    Call(#[from] CallError),
}

impl GenerationError {
    /// Message shown to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::FormIncomplete { .. } => self.to_string(),
            Self::Call(CallError::Http {
                kind: ErrorKind::MissingCredential,
                ..
            }) => format!(
                "The relay has no upstream API key; set a valid {} in its environment (.env.local)",
                DEFAULT_API_KEY_ENV
            ),
            Self::Call(CallError::Http { message, .. }) if !message.is_empty() => message.clone(),
            Self::Call(CallError::Network(detail)) => {
                format!("Could not reach the relay: {}", detail)
            }
            Self::Call(_) => GENERIC_FAILURE.to_string(),
        }
    }
}

/// How a sequence ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { text: String, calls: u32 },
    Failed { error: GenerationError, calls: u32 },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Relay calls issued during the sequence
    pub fn calls(&self) -> u32 {
        match self {
            Self::Success { calls, .. } | Self::Failed { calls, .. } => *calls,
        }
    }
}

/// Client-side controller for one user session
pub struct Orchestrator {
    client: Arc<dyn RelayClient>,
    sink: Arc<dyn NotificationSink>,
    identity: Option<Arc<dyn IdentityProvider>>,
    policy: RetryPolicy,
    form: GenerationRequest,
    output: String,
    phase: Phase,
    last_user: Option<User>,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn RelayClient>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            client,
            sink,
            identity: None,
            policy: RetryPolicy::default(),
            form: GenerationRequest::default(),
            output: String::new(),
            phase: Phase::Idle,
            last_user: None,
        }
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_form(mut self, form: GenerationRequest) -> Self {
        self.form = form;
        self
    }

    pub fn form(&self) -> &GenerationRequest {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut GenerationRequest {
        &mut self.form
    }

    /// Text of the last successful generation
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The trigger is enabled only while idle
    pub fn can_trigger(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// User snapshot taken when the last sequence was triggered
    pub fn last_user(&self) -> Option<&User> {
        self.last_user.as_ref()
    }

    /// Run one generation sequence for the current form.
    ///
    /// Always returns to `Idle`. Every terminal outcome is also reported to
    /// the sink.
    #[instrument(skip_all, fields(model = %self.form.model))]
    pub async fn generate(&mut self) -> Outcome {
        self.transition(Phase::Validating);

        let missing = self.form.missing_fields();
        if !missing.is_empty() {
            let error = GenerationError::FormIncomplete { missing };
            debug!(%error, "Form incomplete, nothing sent");
            return self.finish(Outcome::Failed { error, calls: 0 });
        }

        self.last_user = self.identity.as_ref().and_then(|id| id.current_user());
        if let Some(user) = &self.last_user {
            info!(user = user.display_name(), "Generation triggered");
        }

        self.output.clear();
        let request = self.form.clone();
        let mut retry = RetryState::default();

        let outcome = loop {
            self.transition(Phase::Calling);
            let result = self.client.generate(&request).await;
            retry.record_call();

            let err = match result {
                Ok(text) => {
                    break Outcome::Success {
                        text,
                        calls: retry.calls,
                    }
                }
                Err(err) => err,
            };

            match retry.schedule_retry(&self.policy, &err) {
                Some(delay) => {
                    self.transition(Phase::RetryPending);
                    let notice = match retry.last_cause {
                        Some(RetryCause::RateLimited) => "Model is rate limited, retrying...",
                        _ => "Network error, retrying...",
                    };
                    warn!(error = %err, attempt = retry.attempt_count, ?delay, "Retrying generation");
                    self.sink.notify(
                        NoticeLevel::Warning,
                        &format!(
                            "{} ({}/{})",
                            notice, retry.attempt_count, self.policy.max_attempts
                        ),
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    break Outcome::Failed {
                        error: err.into(),
                        calls: retry.calls,
                    }
                }
            }
        };

        self.finish(outcome)
    }

    fn finish(&mut self, outcome: Outcome) -> Outcome {
        match &outcome {
            Outcome::Success { text, calls } => {
                info!(calls, chars = text.len(), "Generation succeeded");
                self.output = text.clone();
                self.transition(Phase::Success);
                self.sink.notify(NoticeLevel::Success, "Content generated");
            }
            Outcome::Failed { error, calls } => {
                warn!(calls, %error, "Generation failed");
                self.transition(Phase::Failed);
                self.sink.notify(NoticeLevel::Error, &error.user_message());
            }
        }
        self.transition(Phase::Idle);
        outcome
    }

    fn transition(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "Phase change");
        self.phase = phase;
        self.sink.phase_changed(phase);
    }
}
