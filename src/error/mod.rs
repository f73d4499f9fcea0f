//! Error definitions
//!
//! This module provides the failure taxonomy produced by a validation pass.
//! Every variant except [`Error::Source`] is an assertion failure; `Source`
//! carries an error raised by the sequence itself while no error expectation
//! was active, passed through untouched.

use std::convert::Infallible;
use std::fmt::{self, Display, Write as _};
use std::panic::Location;

use thiserror::Error;

/// Position in the test source where an expectation was declared.
pub type SourceLocation = &'static Location<'static>;

/// Main error type for a validation pass.
///
/// `E` is the error type of the sequence under test.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error<E = Infallible> {
    /// An element arrived after every expectation was satisfied.
    #[error("unexpected element received at position {index}: {element}")]
    UnexpectedElement {
        /// Rendering of the extra element.
        element: String,
        /// Position the element would have occupied.
        index: usize,
        /// Location of the last expectation, or of the validation call.
        location: Option<SourceLocation>,
    },

    /// An element did not satisfy the active expectation.
    #[error("expectation at index {index} failed. Expected: {expected}, but got: {actual}")]
    ExpectationMismatch {
        /// Description of the active expectation.
        expected: String,
        /// Rendering of what was observed.
        actual: String,
        /// Index of the active expectation.
        index: usize,
        /// Where the expectation was declared.
        location: Option<SourceLocation>,
    },

    /// The sequence ended with expectations left unsatisfied.
    #[error("insufficient elements. Expected {expected}, but got {actual}")]
    InsufficientElements {
        /// Number of declared expectations.
        expected: usize,
        /// Number of expectations satisfied.
        actual: usize,
        /// Descriptions of the expectations never reached.
        unprocessed: Vec<String>,
        /// Location of the first unsatisfied expectation.
        location: Option<SourceLocation>,
    },

    /// The sequence ended while a counted skip was still consuming.
    #[error(
        "attempted to skip {skip_count} elements, but only {elements_skipped} elements were available"
    )]
    InsufficientElementsForSkip {
        /// Requested skip count.
        skip_count: i64,
        /// Elements actually consumed by the skip.
        elements_skipped: usize,
        /// Index of the skip expectation.
        index: usize,
        /// Number of declared expectations.
        total_expectations: usize,
        /// Where the skip was declared.
        location: Option<SourceLocation>,
    },

    /// A counted skip was declared with a count of zero or less.
    #[error("invalid skip count: {count}. Skip count must be greater than 0")]
    InvalidSkipCount {
        /// The offending count.
        count: i64,
        /// Where the skip was declared.
        location: Option<SourceLocation>,
    },

    /// An error expectation was active but the sequence produced an element
    /// or finished cleanly.
    #[error("expected an error ({expected_error}) but sequence succeeded without failing")]
    ExpectedErrorButSequenceSucceeded {
        /// Description of the error expectation.
        expected_error: String,
        /// Index of the error expectation.
        index: usize,
        /// Where the error expectation was declared.
        location: Option<SourceLocation>,
    },

    /// The sequence failed, but not in the way the active error expectation
    /// describes.
    #[error("error expectation failed. Expected: {expected_error}, but got: {actual_error}")]
    ErrorExpectationMismatch {
        /// Description of the error expectation.
        expected_error: String,
        /// Rendering of the error the sequence raised.
        actual_error: String,
        /// Index of the error expectation.
        index: usize,
        /// Where the error expectation was declared.
        location: Option<SourceLocation>,
    },

    /// The sequence raised an error no expectation accounted for.
    #[error("sequence failed: {0}")]
    Source(E),
}

/// Kind of an assertion failure, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// See [`Error::UnexpectedElement`].
    UnexpectedElement,
    /// See [`Error::ExpectationMismatch`].
    ExpectationMismatch,
    /// See [`Error::InsufficientElements`].
    InsufficientElements,
    /// See [`Error::InsufficientElementsForSkip`].
    InsufficientElementsForSkip,
    /// See [`Error::InvalidSkipCount`].
    InvalidSkipCount,
    /// See [`Error::ExpectedErrorButSequenceSucceeded`].
    ExpectedErrorButSequenceSucceeded,
    /// See [`Error::ErrorExpectationMismatch`].
    ErrorExpectationMismatch,
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnexpectedElement => "unexpected element",
            Self::ExpectationMismatch => "expectation mismatch",
            Self::InsufficientElements => "insufficient elements",
            Self::InsufficientElementsForSkip => "insufficient elements for skip",
            Self::InvalidSkipCount => "invalid skip count",
            Self::ExpectedErrorButSequenceSucceeded => "expected error but sequence succeeded",
            Self::ErrorExpectationMismatch => "error expectation mismatch",
        };
        f.write_str(name)
    }
}

impl<E> Error<E> {
    /// The failure kind, or `None` for a passed-through source error.
    #[must_use]
    pub fn kind(&self) -> Option<FailureKind> {
        let kind = match self {
            Self::UnexpectedElement { .. } => FailureKind::UnexpectedElement,
            Self::ExpectationMismatch { .. } => FailureKind::ExpectationMismatch,
            Self::InsufficientElements { .. } => FailureKind::InsufficientElements,
            Self::InsufficientElementsForSkip { .. } => FailureKind::InsufficientElementsForSkip,
            Self::InvalidSkipCount { .. } => FailureKind::InvalidSkipCount,
            Self::ExpectedErrorButSequenceSucceeded { .. } => {
                FailureKind::ExpectedErrorButSequenceSucceeded
            }
            Self::ErrorExpectationMismatch { .. } => FailureKind::ErrorExpectationMismatch,
            Self::Source(_) => return None,
        };
        Some(kind)
    }

    /// Index of the expectation the failure refers to.
    ///
    /// For [`Error::InsufficientElements`] this is the first unsatisfied
    /// expectation. `InvalidSkipCount` and `Source` carry no index.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::UnexpectedElement { index, .. }
            | Self::ExpectationMismatch { index, .. }
            | Self::InsufficientElementsForSkip { index, .. }
            | Self::ExpectedErrorButSequenceSucceeded { index, .. }
            | Self::ErrorExpectationMismatch { index, .. } => Some(*index),
            Self::InsufficientElements { actual, .. } => Some(*actual),
            Self::InvalidSkipCount { .. } | Self::Source(_) => None,
        }
    }

    /// Where the offending expectation was declared, if known.
    #[must_use]
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Self::UnexpectedElement { location, .. }
            | Self::ExpectationMismatch { location, .. }
            | Self::InsufficientElements { location, .. }
            | Self::InsufficientElementsForSkip { location, .. }
            | Self::InvalidSkipCount { location, .. }
            | Self::ExpectedErrorButSequenceSucceeded { location, .. }
            | Self::ErrorExpectationMismatch { location, .. } => *location,
            Self::Source(_) => None,
        }
    }

    /// Returns `true` if this is a passed-through source error.
    #[must_use]
    pub fn is_source(&self) -> bool {
        matches!(self, Self::Source(_))
    }

    /// Extract the source error, if this is one.
    #[must_use]
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::Source(error) => Some(error),
            _ => None,
        }
    }
}

impl<E: Display> Error<E> {
    /// Multi-line report suitable for a test failure message.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_diagnostic(&mut out);
        out
    }

    fn write_diagnostic(&self, out: &mut String) -> fmt::Result {
        match self {
            Self::UnexpectedElement { element, index, .. } => {
                writeln!(out, "Unexpected element received at position {index}")?;
                writeln!(out)?;
                writeln!(out, "Expected no more elements, but received: {element}")?;
                writeln!(out)?;
                write!(
                    out,
                    "The sequence produced more elements than the test declared."
                )?;
            }
            Self::ExpectationMismatch {
                expected,
                actual,
                index,
                ..
            } => {
                writeln!(out, "Expectation mismatch at index {index}")?;
                writeln!(out)?;
                writeln!(out, "Expected: {expected}")?;
                writeln!(out, "Received: {actual}")?;
            }
            Self::InsufficientElements {
                expected,
                actual,
                unprocessed,
                ..
            } => {
                writeln!(out, "Insufficient elements in sequence")?;
                writeln!(out)?;
                writeln!(
                    out,
                    "Expected {expected} expectations to be satisfied, but only {actual} were."
                )?;
                writeln!(out)?;
                writeln!(out, "Unprocessed expectations:")?;
                for description in unprocessed {
                    writeln!(out, "- {description}")?;
                }
            }
            Self::InsufficientElementsForSkip {
                skip_count,
                elements_skipped,
                index,
                total_expectations,
                ..
            } => {
                writeln!(out, "Insufficient elements for skip operation")?;
                writeln!(out)?;
                writeln!(
                    out,
                    "Attempted to skip {skip_count} elements, but only {elements_skipped} elements were available."
                )?;
                writeln!(out)?;
                writeln!(out, "Current expectation index: {index}")?;
                writeln!(out, "Total expectations: {total_expectations}")?;
            }
            Self::InvalidSkipCount { count, .. } => {
                writeln!(out, "Invalid skip count: {count}")?;
                writeln!(out)?;
                write!(
                    out,
                    "Skip count must be greater than 0. Use skip() for a single element or skip_n(n) with n > 0."
                )?;
            }
            Self::ExpectedErrorButSequenceSucceeded {
                expected_error,
                index,
                ..
            } => {
                writeln!(
                    out,
                    "Expected error at position {index}, but sequence succeeded"
                )?;
                writeln!(out)?;
                writeln!(out, "Expected: {expected_error}")?;
            }
            Self::ErrorExpectationMismatch {
                expected_error,
                actual_error,
                index,
                ..
            } => {
                writeln!(out, "Error expectation mismatch at index {index}")?;
                writeln!(out)?;
                writeln!(out, "Expected error: {expected_error}")?;
                writeln!(out, "Actual error: {actual_error}")?;
            }
            Self::Source(error) => {
                write!(
                    out,
                    "An unexpected error occurred during sequence testing: {error}"
                )?;
            }
        }

        if let Some(location) = self.location() {
            let trimmed = out.trim_end().len();
            out.truncate(trimmed);
            writeln!(out)?;
            write!(out, "  at {location}")?;
        }
        Ok(())
    }
}

/// Result type alias
pub type Result<T, E = Infallible> = std::result::Result<T, Error<E>>;
