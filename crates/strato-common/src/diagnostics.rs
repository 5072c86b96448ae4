//  Copyright (c) 2026 Metaform Systems, Inc
//
//  This program and the accompanying materials are made available under the
//  terms of the Apache License, Version 2.0 which is available at
//  https://www.apache.org/licenses/LICENSE-2.0
//
//  SPDX-License-Identifier: Apache-2.0
//
//  Contributors:
//       Metaform Systems, Inc. - initial API and implementation
//

use std::fmt;

/// Severity of a reported diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A single user-facing finding produced during an operation.
///
/// `summary` is a short human-readable headline; `detail` carries the cause
/// (including HTTP status text where available) so the host framework can
/// render an actionable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}: {}", level, self.summary, self.detail)
    }
}

/// Append-only accumulator of warnings and errors for one logical
/// operation.
///
/// Mirrors the host framework convention of collecting multiple findings
/// per operation rather than failing on the first. The core only ever
/// appends; existing entries are never replaced or removed.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        });
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_accumulate_in_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_warning("vpc lookup slow", "first fetch exceeded a tick");
        diagnostics.add_error("vpc not found", "gone after create returned");

        assert_eq!(diagnostics.len(), 2);
        let entries: Vec<_> = diagnostics.iter().collect();
        assert_eq!(entries[0].severity, Severity::Warning);
        assert_eq!(entries[1].severity, Severity::Error);
    }

    #[test]
    fn test_has_errors_ignores_warnings() {
        let mut diagnostics = Diagnostics::new();
        assert!(!diagnostics.has_errors());

        diagnostics.add_warning("slow", "still converging");
        assert!(!diagnostics.has_errors());

        diagnostics.add_error("timed out", "deadline exceeded");
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn test_display_includes_severity_and_cause() {
        let diagnostic = Diagnostic {
            severity: Severity::Error,
            summary: "failed to create subnet".to_string(),
            detail: "status 409: CIDR overlaps".to_string(),
        };

        assert_eq!(
            diagnostic.to_string(),
            "error: failed to create subnet: status 409: CIDR overlaps"
        );
    }
}
