//! User-facing notices emitted by the orchestrator.
//!
//! The orchestrator never talks to a presentation layer directly; it hands
//! notices and phase changes to a [`NotificationSink`].

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{error, info, warn};

use super::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Success => "success",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Receiver for notices and phase changes
pub trait NotificationSink: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);

    /// Called on every phase transition. Front ends use it to disable the
    /// trigger while a sequence is in flight.
    fn phase_changed(&self, _phase: Phase) {}
}

/// Sink that only logs, used by `scribe generate --quiet`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Error => error!("{}", message),
            NoticeLevel::Warning => warn!("{}", message),
            NoticeLevel::Info | NoticeLevel::Success => info!(%level, "{}", message),
        }
    }
}

/// Sink that keeps every notice and phase in order
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
    phases: Mutex<Vec<Phase>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.phases.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Notices of one level, messages only
    pub fn messages(&self, level: NoticeLevel) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == level)
            .map(|n| n.message)
            .collect()
    }
}

impl NotificationSink for NoticeLog {
    fn notify(&self, level: NoticeLevel, message: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(Notice {
                level,
                message: message.to_string(),
            });
        }
    }

    fn phase_changed(&self, phase: Phase) {
        if let Ok(mut phases) = self.phases.lock() {
            phases.push(phase);
        }
    }
}
