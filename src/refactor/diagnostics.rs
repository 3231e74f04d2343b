//! Diagnostics sink and the asynchronous user-notice channel.
//!
//! Internal errors go to an injected [`Diagnostics`] implementation; failures
//! with a user-facing I/O reason are posted as [`Notice`]s on an unbounded
//! channel that the UI side drains whenever it gets around to it.

use std::cell::RefCell;

use serde::Serialize;
use tokio::sync::mpsc;

pub trait Diagnostics {
    /// A defect in the engine or the host model. Never shown as actionable.
    fn internal_error(&self, context: &str, error: &dyn std::error::Error);

    fn warn(&self, message: &str);
}

/// Forwards everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn internal_error(&self, context: &str, error: &dyn std::error::Error) {
        tracing::error!(context, error = %error, "internal error");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Keeps every report in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    errors: RefCell<Vec<String>>,
    warnings: RefCell<Vec<String>>,
}

impl RecordingDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Internal errors as `context: error`.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }

    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn internal_error(&self, context: &str, error: &dyn std::error::Error) {
        self.errors.borrow_mut().push(format!("{context}: {error}"));
    }

    fn warn(&self, message: &str) {
        self.warnings.borrow_mut().push(message.to_string());
    }
}

/// A message for the user, shown after the operation that raised it returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct NoticeSender(mpsc::UnboundedSender<Notice>);

#[derive(Debug)]
pub struct NoticeReceiver(mpsc::UnboundedReceiver<Notice>);

#[must_use]
pub fn notice_channel() -> (NoticeSender, NoticeReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NoticeSender(tx), NoticeReceiver(rx))
}

impl NoticeSender {
    /// Queue a notice. Never blocks; a closed receiver drops it.
    pub fn post(&self, notice: Notice) {
        if let Err(err) = self.0.send(notice) {
            tracing::debug!(title = %err.0.title, "notice dropped, receiver closed");
        }
    }
}

impl NoticeReceiver {
    /// Everything posted so far, without waiting.
    pub fn drain(&mut self) -> Vec<Notice> {
        let mut out = Vec::new();
        while let Ok(notice) = self.0.try_recv() {
            out.push(notice);
        }
        out
    }

    /// Wait for the next notice; `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<Notice> {
        self.0.recv().await
    }
}
