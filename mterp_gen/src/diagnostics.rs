// Copyright 2026 the Execution Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Non-fatal messages produced during a run.

use core::fmt;

/// How much a [`Diagnostic`] matters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational, e.g. an `op` override replacing an earlier mapping.
    Note,
    /// A setting was accepted but has no effect in the current configuration.
    Warning,
}

/// A non-fatal message tied to a config line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// 1-based config line.
    pub line: usize,
    /// Human-readable text.
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn note(line: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::info!(line, "Note: {message}");
        Self {
            severity: Severity::Note,
            line,
            message,
        }
    }

    pub(crate) fn warning(line: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!(line, "Warning: {message}");
        Self {
            severity: Severity::Warning,
            line,
            message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Note => "note",
            Severity::Warning => "warning",
        };
        write!(f, "{label}: line {}: {}", self.line, self.message)
    }
}
