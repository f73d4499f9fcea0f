//! Recording failures without aborting the test.

use std::fmt::{self, Display};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{Error, FailureKind, SourceLocation};

/// A single recorded test failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    message: String,
    kind: Option<FailureKind>,
    location: Option<SourceLocation>,
}

impl Issue {
    /// Create an issue with a free-form message and no location.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
            location: None,
        }
    }

    /// Attach a source location.
    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Build an issue from a validation failure.
    ///
    /// Source errors become an "unexpected error" issue with no kind.
    pub fn from_error<E: Display>(error: &Error<E>) -> Self {
        Self {
            message: error.diagnostic(),
            kind: error.kind(),
            location: error.location(),
        }
    }

    /// The rendered message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The assertion failure kind, or `None` for source errors and
    /// free-form issues.
    #[must_use]
    pub fn kind(&self) -> Option<FailureKind> {
        self.kind
    }

    /// Where the issue is attributed.
    #[must_use]
    pub fn location(&self) -> Option<SourceLocation> {
        self.location
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if self.kind.is_none() {
            if let Some(location) = self.location {
                write!(f, "\n  at {location}")?;
            }
        }
        Ok(())
    }
}

/// Shared, thread-safe collection of recorded issues.
///
/// Clones share the same underlying list, so one collector can be handed to
/// several concurrent validation passes.
///
/// # Example
///
/// ```rust
/// use testkit_sequence::assertions::{Issue, Issues};
///
/// let issues = Issues::new();
/// issues.push(Issue::new("first"));
/// assert_eq!(issues.len(), 1);
///
/// let drained = issues.take();
/// assert_eq!(drained[0].message(), "first");
/// assert!(issues.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Issues {
    inner: Arc<Mutex<Vec<Issue>>>,
}

impl Issues {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a validation failure.
    pub fn record<E: Display>(&self, error: &Error<E>) {
        self.push(Issue::from_error(error));
    }

    /// Record an issue.
    pub fn push(&self, issue: Issue) {
        match issue.location {
            Some(location) => warn!(kind = ?issue.kind, %location, "{}", issue.message),
            None => warn!(kind = ?issue.kind, "{}", issue.message),
        }
        self.inner.lock().push(issue);
    }

    /// Number of recorded issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Copy of the recorded issues.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Issue> {
        self.inner.lock().clone()
    }

    /// Remove and return the recorded issues.
    #[must_use]
    pub fn take(&self) -> Vec<Issue> {
        std::mem::take(&mut *self.inner.lock())
    }

    /// Assert that nothing was recorded.
    ///
    /// # Panics
    ///
    /// Panics listing every recorded issue.
    #[track_caller]
    pub fn assert_empty(&self) {
        let issues = self.inner.lock();
        if !issues.is_empty() {
            let report = issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n\n");
            panic!("{} issue(s) recorded:\n{report}", issues.len());
        }
    }
}
