//! Expectation descriptors.
//!
//! An [`Expectation`] is one declared rule about a sequence: a value or
//! predicate an element must satisfy, a skip, an "eventually" search, or a
//! terminal error. A validation pass walks an ordered list of them.
//!
//! The free functions in this module are the usual way to build them. They
//! record the caller's source location so failures can point back at the
//! line that declared the expectation.
//!
//! # Example
//!
//! ```rust
//! use testkit_sequence::assertions::expectation::{emit, emit_eventually, skip_n, Expectation};
//!
//! let expectations: Vec<Expectation<&str>> = vec![
//!     emit("hello"),
//!     skip_n(2),
//!     emit_eventually("done"),
//! ];
//! assert_eq!(expectations[1].description(), "skip 2 elements");
//! ```

use std::convert::Infallible;
use std::error::Error as StdError;
use std::fmt::{self, Debug};
use std::panic::Location;

use crate::assertions::matcher::{
    described, eq, error_of, predicate, same_variant, Matcher,
};
use crate::error::{Error, SourceLocation};

/// The matching rule of an expectation.
///
/// Element-side rules hold a [`Matcher`] over the element type `T`;
/// error-side rules hold one over the sequence's error type `E`.
pub enum Rule<T, E> {
    /// The next element equals a value.
    Value(Box<dyn Matcher<T>>),
    /// The next element satisfies a predicate.
    Predicate(Box<dyn Matcher<T>>),
    /// Consume exactly one element.
    SkipOne,
    /// Consume `count` elements. Counts of zero or less are invalid.
    SkipCount(i64),
    /// Consume every remaining element.
    SkipAll,
    /// Consume elements while the matcher accepts them.
    SkipWhile(Box<dyn Matcher<T>>),
    /// Discard elements until one equals a value.
    EventuallyValue(Box<dyn Matcher<T>>),
    /// Discard elements until one satisfies a predicate.
    EventuallyPredicate(Box<dyn Matcher<T>>),
    /// The sequence fails with any error.
    AnyError,
    /// The sequence fails with an error of a particular kind.
    ErrorKind(Box<dyn Matcher<E>>),
    /// The sequence fails with an error satisfying a predicate.
    ErrorPredicate(Box<dyn Matcher<E>>),
}

impl<T, E> Rule<T, E> {
    /// Returns `true` for rules only a terminal error can satisfy.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::AnyError | Self::ErrorKind(_) | Self::ErrorPredicate(_)
        )
    }

    /// Returns `true` for rules that discard non-matching elements.
    #[must_use]
    pub fn is_eventually(&self) -> bool {
        matches!(self, Self::EventuallyValue(_) | Self::EventuallyPredicate(_))
    }

    /// Human-readable description used in failure messages.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Value(m)
            | Self::Predicate(m)
            | Self::EventuallyValue(m)
            | Self::EventuallyPredicate(m) => m.describe(),
            Self::SkipOne => "skip element".to_string(),
            Self::SkipCount(count) => {
                let plural = if *count == 1 { "" } else { "s" };
                format!("skip {count} element{plural}")
            }
            Self::SkipAll => "skip all remaining elements".to_string(),
            Self::SkipWhile(m) => format!("skip while {}", m.describe()),
            Self::AnyError => "any error".to_string(),
            Self::ErrorKind(m) | Self::ErrorPredicate(m) => m.describe(),
        }
    }
}

/// A single declared expectation: a [`Rule`] plus where it was declared.
pub struct Expectation<T, E = Infallible> {
    rule: Rule<T, E>,
    location: Option<SourceLocation>,
}

impl<T, E> Expectation<T, E> {
    /// Create an expectation located at the caller.
    #[track_caller]
    #[must_use]
    pub fn new(rule: Rule<T, E>) -> Self {
        Self {
            rule,
            location: Some(Location::caller()),
        }
    }

    /// Override the recorded source location.
    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Drop the recorded source location.
    #[must_use]
    pub fn without_location(mut self) -> Self {
        self.location = None;
        self
    }

    /// The matching rule.
    pub fn rule(&self) -> &Rule<T, E> {
        &self.rule
    }

    /// Where the expectation was declared, if recorded.
    pub fn location(&self) -> Option<SourceLocation> {
        self.location
    }

    /// Human-readable description used in failure messages.
    pub fn description(&self) -> String {
        self.rule.description()
    }

    /// Returns `true` if only a terminal error can satisfy this expectation.
    pub fn is_error_expectation(&self) -> bool {
        self.rule.is_error()
    }

    /// Decide whether `element` satisfies this expectation.
    ///
    /// Skips accept every element; error expectations accept none. For
    /// [`Rule::SkipWhile`] the answer is whether skipping continues.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSkipCount`] for a counted skip whose count is
    /// zero or less.
    pub fn matches_element(&self, element: &T) -> Result<bool, Error<E>> {
        match &self.rule {
            Rule::Value(m)
            | Rule::Predicate(m)
            | Rule::SkipWhile(m)
            | Rule::EventuallyValue(m)
            | Rule::EventuallyPredicate(m) => Ok(m.matches(element)),
            Rule::SkipOne | Rule::SkipAll => Ok(true),
            Rule::SkipCount(count) => {
                self.validate_skip_count(*count)?;
                Ok(true)
            }
            Rule::AnyError | Rule::ErrorKind(_) | Rule::ErrorPredicate(_) => Ok(false),
        }
    }

    /// Decide whether a terminal `error` satisfies this expectation.
    ///
    /// Always `false` for element-side rules.
    pub fn matches_error(&self, error: &E) -> bool {
        match &self.rule {
            Rule::AnyError => true,
            Rule::ErrorKind(m) | Rule::ErrorPredicate(m) => m.matches(error),
            _ => false,
        }
    }

    pub(crate) fn validate_skip_count(&self, count: i64) -> Result<usize, Error<E>> {
        if count <= 0 {
            return Err(Error::InvalidSkipCount {
                count,
                location: self.location,
            });
        }
        // Saturates on targets narrower than 64 bits.
        Ok(usize::try_from(count).unwrap_or(usize::MAX))
    }
}

impl<T, E> Debug for Expectation<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("description", &self.description())
            .field("location", &self.location)
            .finish()
    }
}

// =============================================================================
// Element expectations
// =============================================================================

/// Expect the next element to equal `value`.
#[track_caller]
pub fn emit<T, E, U>(value: U) -> Expectation<T, E>
where
    T: PartialEq<U>,
    U: Debug + Send + Sync + 'static,
{
    Expectation::new(Rule::Value(Box::new(eq(value))))
}

/// Expect the next element to satisfy `test`.
#[track_caller]
pub fn emit_where<T, E, F>(test: F) -> Expectation<T, E>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    Expectation::new(Rule::Predicate(Box::new(predicate(test))))
}

/// Expect the next element to satisfy `matcher`.
#[track_caller]
pub fn emit_that<T, E, M>(matcher: M) -> Expectation<T, E>
where
    M: Matcher<T> + 'static,
{
    Expectation::new(Rule::Predicate(Box::new(matcher)))
}

/// Discard elements until one equals `value`.
#[track_caller]
pub fn emit_eventually<T, E, U>(value: U) -> Expectation<T, E>
where
    T: PartialEq<U>,
    U: Debug + Send + Sync + 'static,
{
    Expectation::new(Rule::EventuallyValue(Box::new(eq(value))))
}

/// Discard elements until one satisfies `test`.
#[track_caller]
pub fn emit_eventually_where<T, E, F>(test: F) -> Expectation<T, E>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    Expectation::new(Rule::EventuallyPredicate(Box::new(predicate(test))))
}

// =============================================================================
// Skip expectations
// =============================================================================

/// Ignore exactly one element.
#[track_caller]
pub fn skip<T, E>() -> Expectation<T, E> {
    Expectation::new(Rule::SkipOne)
}

/// Ignore `count` elements. `count` must be greater than zero.
#[track_caller]
pub fn skip_n<T, E>(count: i64) -> Expectation<T, E> {
    Expectation::new(Rule::SkipCount(count))
}

/// Ignore every remaining element.
#[track_caller]
pub fn skip_all<T, E>() -> Expectation<T, E> {
    Expectation::new(Rule::SkipAll)
}

/// Ignore elements for as long as `test` holds.
#[track_caller]
pub fn skip_while<T, E, F>(test: F) -> Expectation<T, E>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    Expectation::new(Rule::SkipWhile(Box::new(predicate(test))))
}

// =============================================================================
// Error expectations
// =============================================================================

/// Expect the sequence to fail with any error.
#[track_caller]
pub fn expect_error<T, E>() -> Expectation<T, E> {
    Expectation::new(Rule::AnyError)
}

/// Expect the sequence to fail with an error whose concrete type is `K`.
#[track_caller]
pub fn expect_error_of<K, T, E>() -> Expectation<T, E>
where
    K: StdError + 'static,
    E: AsRef<dyn StdError + Send + Sync + 'static>,
{
    Expectation::new(Rule::ErrorKind(Box::new(error_of::<K>())))
}

/// Expect the sequence to fail with the same enum variant as `sample`.
#[track_caller]
pub fn expect_error_like<T, E>(sample: E) -> Expectation<T, E>
where
    E: Debug + Send + Sync + 'static,
{
    Expectation::new(Rule::ErrorKind(Box::new(same_variant(sample))))
}

/// Expect the sequence to fail with an error satisfying `test`.
#[track_caller]
pub fn expect_error_where<T, E, F>(test: F) -> Expectation<T, E>
where
    F: Fn(&E) -> bool + Send + Sync + 'static,
{
    Expectation::new(Rule::ErrorPredicate(Box::new(described(
        "error matching predicate",
        test,
    ))))
}

// =============================================================================
// Expectation lists
// =============================================================================

/// An ordered list of expectations, with a chainable builder.
///
/// # Example
///
/// ```rust
/// use testkit_sequence::assertions::Expectations;
///
/// let expectations = Expectations::<i32>::new()
///     .emit(1)
///     .skip_while(|x| *x < 10)
///     .emit_where(|x| x % 10 == 0)
///     .skip_all();
/// assert_eq!(expectations.len(), 4);
/// ```
pub struct Expectations<T, E = Infallible> {
    items: Vec<Expectation<T, E>>,
}

impl<T, E> Default for Expectations<T, E> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T, E> Expectations<T, E> {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an expectation.
    #[must_use]
    pub fn push(mut self, expectation: Expectation<T, E>) -> Self {
        self.items.push(expectation);
        self
    }

    /// Number of expectations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if no expectations were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The expectations in declaration order.
    #[must_use]
    pub fn as_slice(&self) -> &[Expectation<T, E>] {
        &self.items
    }

    /// Check every counted skip before any element is pulled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSkipCount`] for the first counted skip whose
    /// count is zero or less.
    pub fn check(&self) -> Result<(), Error<E>> {
        check_skip_counts(&self.items)
    }

    /// See [`emit`].
    #[track_caller]
    #[must_use]
    pub fn emit<U>(self, value: U) -> Self
    where
        T: PartialEq<U>,
        U: Debug + Send + Sync + 'static,
    {
        self.push(emit(value))
    }

    /// See [`emit_where`].
    #[track_caller]
    #[must_use]
    pub fn emit_where<F>(self, test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.push(emit_where(test))
    }

    /// See [`emit_that`].
    #[track_caller]
    #[must_use]
    pub fn emit_that<M>(self, matcher: M) -> Self
    where
        M: Matcher<T> + 'static,
    {
        self.push(emit_that(matcher))
    }

    /// See [`emit_eventually`].
    #[track_caller]
    #[must_use]
    pub fn emit_eventually<U>(self, value: U) -> Self
    where
        T: PartialEq<U>,
        U: Debug + Send + Sync + 'static,
    {
        self.push(emit_eventually(value))
    }

    /// See [`emit_eventually_where`].
    #[track_caller]
    #[must_use]
    pub fn emit_eventually_where<F>(self, test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.push(emit_eventually_where(test))
    }

    /// See [`skip`].
    #[track_caller]
    #[must_use]
    pub fn skip(self) -> Self {
        self.push(skip())
    }

    /// See [`skip_n`].
    #[track_caller]
    #[must_use]
    pub fn skip_n(self, count: i64) -> Self {
        self.push(skip_n(count))
    }

    /// See [`skip_all`].
    #[track_caller]
    #[must_use]
    pub fn skip_all(self) -> Self {
        self.push(skip_all())
    }

    /// See [`skip_while`].
    #[track_caller]
    #[must_use]
    pub fn skip_while<F>(self, test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.push(skip_while(test))
    }

    /// See [`expect_error`].
    #[track_caller]
    #[must_use]
    pub fn expect_error(self) -> Self {
        self.push(expect_error())
    }

    /// See [`expect_error_of`].
    #[track_caller]
    #[must_use]
    pub fn expect_error_of<K>(self) -> Self
    where
        K: StdError + 'static,
        E: AsRef<dyn StdError + Send + Sync + 'static>,
    {
        self.push(expect_error_of::<K, T, E>())
    }

    /// See [`expect_error_like`].
    #[track_caller]
    #[must_use]
    pub fn expect_error_like(self, sample: E) -> Self
    where
        E: Debug + Send + Sync + 'static,
    {
        self.push(expect_error_like(sample))
    }

    /// See [`expect_error_where`].
    #[track_caller]
    #[must_use]
    pub fn expect_error_where<F>(self, test: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.push(expect_error_where(test))
    }
}

impl<T, E> From<Vec<Expectation<T, E>>> for Expectations<T, E> {
    fn from(items: Vec<Expectation<T, E>>) -> Self {
        Self { items }
    }
}

impl<T, E> FromIterator<Expectation<T, E>> for Expectations<T, E> {
    fn from_iter<I: IntoIterator<Item = Expectation<T, E>>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T, E> IntoIterator for Expectations<T, E> {
    type Item = Expectation<T, E>;
    type IntoIter = std::vec::IntoIter<Expectation<T, E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<T, E> Debug for Expectations<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

pub(crate) fn check_skip_counts<T, E>(expectations: &[Expectation<T, E>]) -> Result<(), Error<E>> {
    for expectation in expectations {
        if let Rule::SkipCount(count) = expectation.rule() {
            expectation.validate_skip_count(*count)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::matcher::gt;
    use crate::error::FailureKind;

    #[derive(Debug, PartialEq)]
    enum FetchError {
        NotFound(&'static str),
        Refused,
    }

    #[test]
    fn test_descriptions() {
        let value: Expectation<&str> = emit("hello");
        assert_eq!(value.description(), "\"hello\"");

        let pred: Expectation<i32> = emit_where(|x: &i32| *x > 0);
        assert_eq!(pred.description(), "matching predicate");

        assert_eq!(skip::<i32, Infallible>().description(), "skip element");
        assert_eq!(skip_n::<i32, Infallible>(1).description(), "skip 1 element");
        assert_eq!(skip_n::<i32, Infallible>(3).description(), "skip 3 elements");
        assert_eq!(
            skip_all::<i32, Infallible>().description(),
            "skip all remaining elements"
        );

        let sw: Expectation<i32> = skip_while(|x: &i32| *x < 3);
        assert_eq!(sw.description(), "skip while matching predicate");

        let ev: Expectation<i32> = emit_eventually(10);
        assert_eq!(ev.description(), "10");

        assert_eq!(expect_error::<i32, FetchError>().description(), "any error");
        assert_eq!(
            expect_error_where::<i32, FetchError, _>(|_| true).description(),
            "error matching predicate"
        );
        assert_eq!(
            expect_error_like::<i32, _>(FetchError::Refused).description(),
            "error like Refused"
        );
    }

    #[test]
    fn test_records_caller_location() {
        let line = line!() + 1;
        let expectation: Expectation<i32> = emit(1);
        let location = expectation.location().expect("location recorded");
        assert_eq!(location.line(), line);
        assert!(location.file().ends_with("expectation.rs"));

        assert!(expectation.without_location().location().is_none());
    }

    #[test]
    fn test_at_overrides_location() {
        let here = Location::caller();
        let expectation: Expectation<i32> = skip::<i32, Infallible>().at(here);
        assert_eq!(expectation.location(), Some(here));
    }

    #[test]
    fn test_matches_element() {
        let value: Expectation<i32> = emit(5);
        assert!(value.matches_element(&5).unwrap());
        assert!(!value.matches_element(&6).unwrap());

        let matcher: Expectation<i32> = emit_that(gt(3));
        assert!(matcher.matches_element(&4).unwrap());
        assert_eq!(matcher.description(), "greater than 3");

        assert!(skip::<i32, Infallible>().matches_element(&0).unwrap());
        assert!(skip_all::<i32, Infallible>().matches_element(&0).unwrap());
        assert!(skip_n::<i32, Infallible>(2).matches_element(&0).unwrap());
    }

    #[test]
    fn test_error_expectations_never_match_elements() {
        let expectation = expect_error::<i32, FetchError>();
        assert!(expectation.is_error_expectation());
        assert!(!expectation.matches_element(&1).unwrap());
    }

    #[test]
    fn test_invalid_skip_count_on_use() {
        let expectation = skip_n::<i32, Infallible>(0);
        let err = expectation.matches_element(&1).unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::InvalidSkipCount));
        assert_eq!(
            err,
            Error::InvalidSkipCount {
                count: 0,
                location: expectation.location(),
            }
        );
    }

    #[test]
    fn test_matches_error() {
        let any = expect_error::<i32, FetchError>();
        assert!(any.matches_error(&FetchError::Refused));

        let like = expect_error_like::<i32, _>(FetchError::NotFound(""));
        assert!(like.matches_error(&FetchError::NotFound("/x")));
        assert!(!like.matches_error(&FetchError::Refused));

        let pred = expect_error_where::<i32, _, _>(|e: &FetchError| *e == FetchError::Refused);
        assert!(pred.matches_error(&FetchError::Refused));

        let element_side: Expectation<i32, FetchError> = emit(1);
        assert!(!element_side.matches_error(&FetchError::Refused));
    }

    #[test]
    fn test_expect_error_of_boxed() {
        let expectation =
            expect_error_of::<std::fmt::Error, i32, Box<dyn StdError + Send + Sync>>();
        let matching: Box<dyn StdError + Send + Sync> = Box::new(std::fmt::Error);
        let other: Box<dyn StdError + Send + Sync> = "other".into();
        assert!(expectation.matches_error(&matching));
        assert!(!expectation.matches_error(&other));
    }

    #[test]
    fn test_large_skip_count_is_valid() {
        let expectation = skip_n::<i32, Infallible>(i64::MAX);
        assert!(expectation.matches_element(&1).unwrap());
        let count = expectation.validate_skip_count(i64::MAX).unwrap();
        assert_eq!(count, usize::try_from(i64::MAX).unwrap_or(usize::MAX));
        assert!(Expectations::<i32>::new().skip_n(i64::MAX).check().is_ok());
    }

    #[test]
    fn test_check_reports_first_invalid_skip() {
        let expectations = Expectations::<i32>::new().emit(1).skip_n(-5).skip_n(0);
        let err = expectations.check().unwrap_err();
        assert!(matches!(err, Error::InvalidSkipCount { count: -5, .. }));

        assert!(Expectations::<i32>::new().skip_n(2).check().is_ok());
    }

    #[test]
    fn test_builder_and_collect() {
        let built = Expectations::<i32>::new()
            .emit(1)
            .skip()
            .emit_eventually(3)
            .skip_all();
        assert_eq!(built.len(), 4);
        assert!(built.as_slice()[2].rule().is_eventually());

        let collected: Expectations<i32> = vec![emit(1), skip()].into_iter().collect();
        assert_eq!(collected.len(), 2);
        assert!(!collected.is_empty());
    }
}
