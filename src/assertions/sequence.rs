//! Entry points for testing a sequence against expectations.
//!
//! ```rust,ignore
//! use testkit_sequence::prelude::*;
//! use futures::stream;
//!
//! // Propagate the failure
//! expect_stream(stream::iter(vec![1, 2, 3]))
//!     .validate(vec![emit(1), skip(), emit(3)])
//!     .await?;
//!
//! // Record it without failing
//! let issues = Issues::new();
//! expect_stream(stream::iter(vec![1, 2, 3]))
//!     .record(vec![emit(1)], &issues)
//!     .await;
//! assert_eq!(issues.len(), 1);
//! ```

use std::fmt::{Debug, Display};
use std::panic::Location;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use pin_project_lite::pin_project;

use crate::assertions::expectation::Expectation;
use crate::assertions::issues::Issues;
use crate::assertions::validator::Validator;
use crate::config::Config;
use crate::error::{Error, SourceLocation};

/// Test a stream whose items are plain elements.
///
/// The stream can never fail, so its error type is
/// [`std::convert::Infallible`].
#[track_caller]
pub fn expect_stream<S: Stream>(stream: S) -> SequenceTest<Unfailing<S>> {
    SequenceTest::new(Unfailing { stream })
}

/// Test a stream whose items are `Result`s, where an `Err` ends the sequence.
#[track_caller]
pub fn expect_try_stream<S>(source: S) -> SequenceTest<S> {
    SequenceTest::new(source)
}

/// A sequence waiting to be checked against expectations.
///
/// Created by [`expect_stream`] or [`expect_try_stream`]. Each of
/// [`validate`](Self::validate), [`record`](Self::record) and
/// [`assert`](Self::assert) runs one validation pass with identical
/// semantics; they differ only in how a failure is surfaced.
pub struct SequenceTest<S> {
    source: S,
    config: Config,
    origin: SourceLocation,
}

impl<S> SequenceTest<S> {
    #[track_caller]
    fn new(source: S) -> Self {
        Self {
            source,
            config: Config::default(),
            origin: Location::caller(),
        }
    }

    /// Use `config` for the validation pass.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Get the inner source back without validating it.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Validate the sequence, returning the failure.
    ///
    /// # Errors
    ///
    /// Returns the first assertion failure, or [`Error::Source`] if the
    /// sequence failed while no error expectation was active.
    pub async fn validate<T, E, I>(self, expectations: I) -> Result<(), Error<E>>
    where
        S: Stream<Item = Result<T, E>>,
        I: IntoIterator<Item = Expectation<T, E>>,
        T: Debug,
        E: Display,
    {
        let expectations: Vec<Expectation<T, E>> = expectations.into_iter().collect();
        Validator::new(&expectations)
            .with_origin(self.origin)
            .with_config(self.config)
            .run(self.source)
            .await
    }

    /// Validate the sequence, recording any failure in `issues`.
    ///
    /// Returns `true` if the sequence satisfied every expectation.
    pub async fn record<T, E, I>(self, expectations: I, issues: &Issues) -> bool
    where
        S: Stream<Item = Result<T, E>>,
        I: IntoIterator<Item = Expectation<T, E>>,
        T: Debug,
        E: Display,
    {
        match self.validate(expectations).await {
            Ok(()) => true,
            Err(error) => {
                issues.record(&error);
                false
            }
        }
    }

    /// Validate the sequence, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics with the failure's diagnostic report.
    pub async fn assert<T, E, I>(self, expectations: I)
    where
        S: Stream<Item = Result<T, E>>,
        I: IntoIterator<Item = Expectation<T, E>>,
        T: Debug,
        E: Display,
    {
        if let Err(error) = self.validate(expectations).await {
            panic!("sequence assertion failed: {}", error.diagnostic());
        }
    }
}

pin_project! {
    /// Stream adapter that wraps every element in `Ok`.
    ///
    /// Created by [`expect_stream`].
    #[derive(Debug)]
    pub struct Unfailing<S> {
        #[pin]
        stream: S,
    }
}

impl<S: Stream> Stream for Unfailing<S> {
    type Item = Result<S::Item, std::convert::Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().stream.poll_next(cx).map(|item| item.map(Ok))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.stream.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::expectation::{emit, expect_error, skip, skip_all};
    use crate::error::FailureKind;
    use futures::stream;

    #[tokio::test]
    async fn test_validate_ok() {
        expect_stream(stream::iter(vec![1, 2, 3]))
            .validate(vec![emit(1), skip(), emit(3)])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_validate_reports_failure() {
        let err = expect_stream(stream::iter(vec!["hello", "unexpected"]))
            .validate(vec![emit("hello")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::UnexpectedElement));
        assert_eq!(err.index(), Some(1));
    }

    #[tokio::test]
    async fn test_empty_expectations_point_at_call_site() {
        let line = line!() + 1;
        let err = expect_stream(stream::iter(vec![1]))
            .validate(Vec::new())
            .await
            .unwrap_err();
        let location = err.location().expect("origin recorded");
        assert_eq!(location.line(), line);
        assert!(location.file().ends_with("sequence.rs"));
    }

    #[tokio::test]
    async fn test_try_stream_with_error_expectation() {
        let source = stream::iter(vec![Ok(1), Err("boom")]);
        expect_try_stream(source)
            .validate(vec![emit(1), expect_error()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_record_collects_issue() {
        let issues = Issues::new();
        let passed = expect_stream(stream::iter(vec![1, 2]))
            .record(vec![emit(1)], &issues)
            .await;
        assert!(!passed);
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues.snapshot()[0].kind(),
            Some(FailureKind::UnexpectedElement)
        );

        let passed = expect_stream(stream::iter(vec![1, 2]))
            .record(vec![emit(1), skip_all()], &issues)
            .await;
        assert!(passed);
        assert_eq!(issues.len(), 1);
    }

    #[tokio::test]
    async fn test_record_source_error() {
        let issues = Issues::new();
        let source = stream::iter(vec![Ok(1), Err("connection reset")]);
        expect_try_stream(source)
            .record(vec![emit(1), emit(2)], &issues)
            .await;

        let recorded = issues.take();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].kind(), None);
        assert!(recorded[0].message().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_assert_passes() {
        expect_stream(stream::iter(vec!["a"]))
            .assert(vec![emit("a")])
            .await;
    }

    #[tokio::test]
    #[should_panic(expected = "Expectation mismatch at index 0")]
    async fn test_assert_panics_with_diagnostic() {
        expect_stream(stream::iter(vec![2]))
            .assert(vec![emit(1)])
            .await;
    }

    #[tokio::test]
    async fn test_into_inner_returns_source() {
        let test = expect_stream(stream::iter(vec![1, 2]));
        let inner = test.into_inner();
        assert_eq!(inner.size_hint(), (2, Some(2)));
    }
}
