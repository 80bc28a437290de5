//! Validation report types for structured error reporting.
//!
//! This module provides structured validation results that can be shown to
//! the operator, printed by the CLI, or serialized for other tools.

use serde::Serialize;
use std::fmt;

/// The result of validating a site configuration.
///
/// Contains all issues found during validation, categorized by severity.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    /// All issues found during validation.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Returns the number of errors in the report.
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Returns the number of warnings in the report.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if an issue with the given code was reported.
    pub fn has(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    /// Iterates over the error-level issues only.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single validation issue (error or warning).
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    /// The severity of the issue.
    pub severity: Severity,

    /// A stable code for the issue type.
    pub code: IssueCode,

    /// A human-readable description of the issue.
    pub message: String,

    /// Context about where the issue occurred.
    pub context: IssueContext,
}

impl ValidationIssue {
    /// Creates a new validation issue.
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    /// Creates a new error.
    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    /// Creates a new warning.
    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

/// The severity of a validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Registration can go ahead but the result may not be what was meant.
    Warning,
    /// Registration must not go ahead.
    Error,
}

/// A stable code identifying the type of validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCode {
    // Image issues
    /// No reference image has been captured.
    MissingImage,
    /// The reference image has zero width or height.
    InvalidImageDimensions,

    // Parking space issues
    /// No parking space has been defined.
    NoParkingSpaces,
    /// A parking space has zero width or height.
    DegenerateSpace,
    /// Two parking spaces have identical rectangles.
    DuplicateSpace,
    /// A parking space extends outside the reference image.
    SpaceOutOfBounds,
    /// Two parking spaces overlap (allowed, but usually a drawing slip).
    OverlappingSpaces,

    // Control point issues
    /// Fewer control points than calibration needs.
    InsufficientControlPoints,
    /// All control points lie on one line.
    CollinearControlPoints,
    /// A control point lies outside the reference image.
    ControlPointOutOfBounds,
    /// A control point has no world coordinate (relative calibration only).
    MissingWorldCoordinate,

    /// A coordinate is NaN or infinite.
    NonFiniteCoordinates,
    /// An entry's own id differs from the id it is stored under.
    IdMismatch,
}

/// Context about where a validation issue occurred.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueContext {
    /// Issue with the site as a whole.
    Site,
    /// Issue with the reference image.
    Image,
    /// Issue with a specific parking space.
    Space { id: u64 },
    /// Issue with a specific control point.
    ControlPoint { id: u64 },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Site => write!(f, "site"),
            IssueContext::Image => write!(f, "image"),
            IssueContext::Space { id } => write!(f, "space {}", id),
            IssueContext::ControlPoint { id } => write!(f, "control point {}", id),
        }
    }
}
