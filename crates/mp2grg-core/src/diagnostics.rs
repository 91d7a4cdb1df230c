//! Diagnostics collected while parsing, encoding and decoding cases.
//!
//! Translation keeps going when it meets missing or ambiguous data: it picks a
//! documented default and records a [`DiagnosticIssue`]. Callers receive the
//! collector alongside the result and decide what to do with it, e.g. print
//! every issue or fail via [`Diagnostics::escalate`].
//!
//! # Example
//!
//! ```
//! use mp2grg_core::diagnostics::Diagnostics;
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning("merge", "merging 2 buses into 1");
//! diag.add_error_with_entity("validation", "link resolves to no voltage level", "load_1");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! assert!(diag.escalate().is_err());
//! ```

use std::fmt;

use serde::Serialize;

use crate::error::{TranslateError, TranslateResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Translation continued with a default or a guess
    Warning,
    /// Data that breaks a structural rule of the target format
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// "parse", "encode", "decode", "merge", "cost", "rating", "validation", ...
    pub category: String,
    pub message: String,
    /// Component id or record the issue is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.severity, self.category, self.message)?;
        match &self.entity {
            Some(entity) => write!(f, " ({})", entity),
            None => Ok(()),
        }
    }
}

/// Issues gathered during one translation call, in the order they arose.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, severity: Severity, category: &str, message: &str, entity: Option<&str>) {
        self.issues.push(DiagnosticIssue {
            severity,
            category: category.to_string(),
            message: message.to_string(),
            entity: entity.map(str::to_string),
        });
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.record(Severity::Warning, category, message, None);
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.record(Severity::Warning, category, message, Some(entity));
    }

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.record(Severity::Error, category, message, None);
    }

    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.record(Severity::Error, category, message, Some(entity));
    }

    fn of_severity(&self, severity: Severity) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.of_severity(Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.of_severity(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    /// Fail when any issue was collected, warnings included.
    pub fn escalate(&self) -> TranslateResult<()> {
        if !self.has_issues() {
            return Ok(());
        }
        let listing: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        Err(TranslateError::Escalated(format!(
            "{} escalated to failure:\n  - {}",
            self.summary(),
            listing.join("\n  - ")
        )))
    }

    /// "No issues", "2 warnings", "1 warning, 3 errors"
    pub fn summary(&self) -> String {
        fn counted(n: usize, noun: &str) -> String {
            format!("{} {}{}", n, noun, if n == 1 { "" } else { "s" })
        }

        let parts: Vec<String> = [
            (self.warning_count(), "warning"),
            (self.error_count(), "error"),
        ]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, noun)| counted(n, noun))
        .collect();

        if parts.is_empty() {
            "No issues".to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        self.issues
            .iter()
            .try_for_each(|issue| writeln!(f, "  {}", issue))
    }
}
