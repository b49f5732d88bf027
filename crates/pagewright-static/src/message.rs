//! Per-page build diagnostics.

use crate::hooks::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A recoverable diagnostic raised while building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,

    /// Stage that raised it
    pub stage: Stage,

    /// Id of the page concerned, when there is one
    pub page: Option<String>,

    pub text: String,
}

impl Message {
    pub fn warning(stage: Stage, page: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            stage,
            page: Some(page.into()),
            text: text.into(),
        }
    }

    pub fn error(stage: Stage, page: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            stage,
            page: Some(page.into()),
            text: text.into(),
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.page {
            Some(page) => write!(f, "[{}] {}: {}", self.stage, page, self.text),
            None => write!(f, "[{}] {}", self.stage, self.text),
        }
    }
}

/// Default message sink: forward to `tracing`.
pub fn log_message(message: &Message) {
    match message.severity {
        Severity::Info => tracing::info!("{}", message),
        Severity::Warning => tracing::warn!("{}", message),
        Severity::Error => tracing::error!("{}", message),
    }
}
