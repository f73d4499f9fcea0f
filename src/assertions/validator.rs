//! The validation state machine.
//!
//! A [`Validator`] walks an ordered slice of [`Expectation`]s against a
//! pull-based source in a single pass. It holds a cursor into the slice
//! that only ever moves forward, pulls one element at a time, and stops at
//! the first success or failure.
//!
//! Terminal rules:
//!
//! - A source error resolves against the expectation at the cursor. A
//!   matching error expectation ends the pass successfully, even with
//!   expectations left over.
//! - Source exhaustion fails if any remaining expectation is an error
//!   expectation, then fails with `InsufficientElements` unless nothing, or
//!   exactly one `skip_all`, is left.
//! - An element arriving while an error expectation is active always fails.
//! - Once a `skip_all` drains the source, only the `InsufficientElements`
//!   check runs; error expectations after it count as unprocessed.

use std::fmt::{Debug, Display};
use std::future::poll_fn;
use std::pin::{pin, Pin};

use futures_core::Stream;
use tracing::{debug, trace};

use crate::assertions::expectation::{check_skip_counts, Expectation, Rule};
use crate::config::Config;
use crate::error::{Error, SourceLocation};

const EVENTUALLY_PREFIX: &str = "eventually: ";
const EVENTUALLY_EXHAUSTED: &str = "sequence ended without finding match";

/// How a pass ended.
enum Halt<E> {
    Succeeded,
    Failed(Error<E>),
}

impl<E> From<Error<E>> for Halt<E> {
    fn from(error: Error<E>) -> Self {
        Self::Failed(error)
    }
}

/// Single-use validator for one pass over one source.
///
/// # Example
///
/// ```rust
/// use futures::stream;
/// use testkit_sequence::assertions::{emit, skip_n, Validator};
///
/// # futures::executor::block_on(async {
/// let expectations = vec![emit("hello"), skip_n(2), emit("d"), emit("e")];
/// let source = stream::iter(["hello", "b", "c", "d", "e"].map(Ok::<_, std::convert::Infallible>));
///
/// Validator::new(&expectations).run(source).await.unwrap();
/// # });
/// ```
pub struct Validator<'a, T, E> {
    expectations: &'a [Expectation<T, E>],
    config: Config,
    cursor: usize,
    /// Element that ended a `skip_while`, owed to the next expectation.
    carried: Option<T>,
    origin: SourceLocation,
}

impl<'a, T, E> Validator<'a, T, E>
where
    T: Debug,
    E: Display,
{
    /// Create a validator over `expectations`.
    ///
    /// The caller's location is reported for unexpected elements when
    /// `expectations` is empty.
    #[track_caller]
    #[must_use]
    pub fn new(expectations: &'a [Expectation<T, E>]) -> Self {
        Self {
            expectations,
            config: Config::default(),
            cursor: 0,
            carried: None,
            origin: std::panic::Location::caller(),
        }
    }

    /// Use `config` for this pass.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub(crate) fn with_origin(mut self, origin: SourceLocation) -> Self {
        self.origin = origin;
        self
    }

    /// Run the pass to completion.
    ///
    /// # Errors
    ///
    /// Returns the first assertion failure, or the source's own error when no
    /// error expectation was active to receive it.
    pub async fn run<S>(mut self, source: S) -> Result<(), Error<E>>
    where
        S: Stream<Item = Result<T, E>>,
    {
        let halt = match check_skip_counts(self.expectations) {
            Err(error) => Halt::Failed(error),
            Ok(()) => {
                let mut source = pin!(source);
                loop {
                    if let Err(halt) = self.step(&mut source).await {
                        break halt;
                    }
                }
            }
        };

        match halt {
            Halt::Succeeded => {
                debug!(
                    expectations = self.expectations.len(),
                    cursor = self.cursor,
                    "sequence validation succeeded"
                );
                Ok(())
            }
            Halt::Failed(error) => {
                debug!(
                    expectations = self.expectations.len(),
                    cursor = self.cursor,
                    kind = ?error.kind(),
                    "sequence validation failed"
                );
                Err(error)
            }
        }
    }

    async fn step<S>(&mut self, source: &mut Pin<&mut S>) -> Result<(), Halt<E>>
    where
        S: Stream<Item = Result<T, E>>,
    {
        let element = match self.carried.take() {
            Some(element) => element,
            None => match self.pull(source).await? {
                Some(element) => element,
                None => return Err(self.finish()),
            },
        };

        let expectations = self.expectations;
        let Some(expectation) = expectations.get(self.cursor) else {
            let location = expectations
                .last()
                .map_or(Some(self.origin), Expectation::location);
            return Err(Error::UnexpectedElement {
                element: self.config.render_debug(&element),
                index: self.cursor,
                location,
            }
            .into());
        };

        match expectation.rule() {
            Rule::AnyError | Rule::ErrorKind(_) | Rule::ErrorPredicate(_) => {
                Err(Error::ExpectedErrorButSequenceSucceeded {
                    expected_error: expectation.description(),
                    index: self.cursor,
                    location: expectation.location(),
                }
                .into())
            }
            Rule::SkipOne => {
                self.advance(expectation);
                Ok(())
            }
            Rule::SkipCount(count) => self.skip_count(expectation, *count, source).await,
            Rule::SkipAll => {
                while self.pull(source).await?.is_some() {}
                self.advance(expectation);
                Err(self.conclude())
            }
            Rule::SkipWhile(_) => self.skip_while(expectation, element, source).await,
            Rule::EventuallyValue(_) | Rule::EventuallyPredicate(_) => {
                self.eventually(expectation, element, source).await
            }
            Rule::Value(_) | Rule::Predicate(_) => {
                if expectation.matches_element(&element)? {
                    self.advance(expectation);
                    Ok(())
                } else {
                    Err(Error::ExpectationMismatch {
                        expected: expectation.description(),
                        actual: self.config.render_debug(&element),
                        index: self.cursor,
                        location: expectation.location(),
                    }
                    .into())
                }
            }
        }
    }

    async fn skip_count<S>(
        &mut self,
        expectation: &Expectation<T, E>,
        requested: i64,
        source: &mut Pin<&mut S>,
    ) -> Result<(), Halt<E>>
    where
        S: Stream<Item = Result<T, E>>,
    {
        let count = expectation.validate_skip_count(requested)?;

        // The element that activated the skip counts as the first one.
        let mut skipped = 1;
        while skipped < count {
            if self.pull(source).await?.is_none() {
                return Err(Error::InsufficientElementsForSkip {
                    skip_count: requested,
                    elements_skipped: skipped,
                    index: self.cursor,
                    total_expectations: self.expectations.len(),
                    location: expectation.location(),
                }
                .into());
            }
            skipped += 1;
        }

        self.advance(expectation);
        Ok(())
    }

    async fn skip_while<S>(
        &mut self,
        expectation: &Expectation<T, E>,
        element: T,
        source: &mut Pin<&mut S>,
    ) -> Result<(), Halt<E>>
    where
        S: Stream<Item = Result<T, E>>,
    {
        let mut current = element;
        loop {
            if !expectation.matches_element(&current)? {
                self.advance(expectation);
                self.carried = Some(current);
                return Ok(());
            }
            match self.pull(source).await? {
                Some(next) => current = next,
                None => {
                    self.advance(expectation);
                    return Err(self.finish());
                }
            }
        }
    }

    async fn eventually<S>(
        &mut self,
        expectation: &Expectation<T, E>,
        element: T,
        source: &mut Pin<&mut S>,
    ) -> Result<(), Halt<E>>
    where
        S: Stream<Item = Result<T, E>>,
    {
        let mut current = element;
        loop {
            if expectation.matches_element(&current)? {
                self.advance(expectation);
                return Ok(());
            }
            trace!(index = self.cursor, element = ?current, "eventually: discarding element");
            match self.pull(source).await? {
                Some(next) => current = next,
                None => {
                    return Err(Error::ExpectationMismatch {
                        expected: format!("{EVENTUALLY_PREFIX}{}", expectation.description()),
                        actual: EVENTUALLY_EXHAUSTED.to_string(),
                        index: self.cursor,
                        location: expectation.location(),
                    }
                    .into());
                }
            }
        }
    }

    /// Pull the next element. A source error ends the pass here.
    async fn pull<S>(&mut self, source: &mut Pin<&mut S>) -> Result<Option<T>, Halt<E>>
    where
        S: Stream<Item = Result<T, E>>,
    {
        match poll_fn(|cx| source.as_mut().poll_next(cx)).await {
            Some(Ok(element)) => {
                trace!(cursor = self.cursor, element = ?element, "pulled element");
                Ok(Some(element))
            }
            Some(Err(error)) => Err(self.resolve_error(error)),
            None => {
                trace!(cursor = self.cursor, "source exhausted");
                Ok(None)
            }
        }
    }

    fn resolve_error(&self, error: E) -> Halt<E> {
        match self.expectations.get(self.cursor) {
            Some(expectation) if expectation.is_error_expectation() => {
                if expectation.matches_error(&error) {
                    trace!(index = self.cursor, "error expectation satisfied");
                    Halt::Succeeded
                } else {
                    Halt::Failed(Error::ErrorExpectationMismatch {
                        expected_error: expectation.description(),
                        actual_error: self.config.render_display(&error),
                        index: self.cursor,
                        location: expectation.location(),
                    })
                }
            }
            _ => Halt::Failed(Error::Source(error)),
        }
    }

    /// Conclude the pass after the source ended on its own.
    fn finish(&self) -> Halt<E> {
        let remaining = self.remaining();

        if let Some(offset) = remaining
            .iter()
            .position(Expectation::is_error_expectation)
        {
            let expectation = &remaining[offset];
            return Halt::Failed(Error::ExpectedErrorButSequenceSucceeded {
                expected_error: expectation.description(),
                index: self.cursor + offset,
                location: expectation.location(),
            });
        }

        self.conclude()
    }

    /// Conclude the pass from the expectations left at the cursor.
    ///
    /// After a `skip_all` this is the only check: error expectations left
    /// over are reported as unprocessed like any other.
    fn conclude(&self) -> Halt<E> {
        let remaining = self.remaining();
        match remaining {
            [] => Halt::Succeeded,
            [only] if matches!(only.rule(), Rule::SkipAll) => Halt::Succeeded,
            [first, ..] => Halt::Failed(Error::InsufficientElements {
                expected: self.expectations.len(),
                actual: self.cursor,
                unprocessed: remaining.iter().map(Expectation::description).collect(),
                location: first.location(),
            }),
        }
    }

    fn remaining(&self) -> &'a [Expectation<T, E>] {
        self.expectations.get(self.cursor..).unwrap_or_default()
    }

    fn advance(&mut self, expectation: &Expectation<T, E>) {
        trace!(
            index = self.cursor,
            expectation = %expectation.description(),
            "expectation satisfied"
        );
        self.cursor += 1;
    }
}
