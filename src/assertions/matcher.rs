// Allow must_use_candidate for matcher factory functions since returning the matcher
// without using it is the common pattern for test setup
#![allow(clippy::must_use_candidate)]

//! Matchers used by expectations to accept or reject elements and errors.
//!
//! - [`Matcher`] trait for custom matchers
//! - Element matchers: [`eq`], [`ne`], [`gt`], [`lt`], [`contains_str`],
//!   [`predicate`], [`described`]
//! - Combinators: [`all_of`], [`any_of`], [`not`]
//! - Error matchers: [`error_of`], [`same_variant`]
//!
//! # Example
//!
//! ```rust
//! use testkit_sequence::assertions::matcher::{all_of, gt, lt, not, eq, Matcher};
//!
//! let m = all_of::<i32>(vec![Box::new(gt(0)), Box::new(lt(10))]);
//! assert!(m.matches(&5));
//! assert!(!m.matches(&50));
//!
//! let m = not(eq(0_i32));
//! assert!(m.matches(&1_i32));
//! ```

use std::any::type_name;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::mem::discriminant;

/// A matcher for testing values.
///
/// Matchers are shared by reference across a validation pass, which may run
/// on any task, so they must be `Send + Sync`.
///
/// # Implementing Custom Matchers
///
/// ```rust
/// use testkit_sequence::assertions::matcher::Matcher;
///
/// struct IsEven;
///
/// impl Matcher<i32> for IsEven {
///     fn matches(&self, value: &i32) -> bool {
///         value % 2 == 0
///     }
///
///     fn describe(&self) -> String {
///         "is even".to_string()
///     }
/// }
///
/// assert!(IsEven.matches(&4));
/// assert!(!IsEven.matches(&3));
/// ```
pub trait Matcher<T: ?Sized>: Send + Sync {
    /// Check if the value matches.
    fn matches(&self, value: &T) -> bool;

    /// Describe what this matcher expects.
    fn describe(&self) -> String;
}

impl<T: ?Sized, M: Matcher<T> + ?Sized> Matcher<T> for Box<M> {
    fn matches(&self, value: &T) -> bool {
        (**self).matches(value)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

// =============================================================================
// Element Matchers
// =============================================================================

/// Create an equality matcher.
///
/// Describes itself as the `Debug` rendering of `expected`, which is how
/// value expectations appear in failure messages.
///
/// ```rust
/// use testkit_sequence::assertions::matcher::{eq, Matcher};
///
/// let m = eq("hello");
/// assert!(Matcher::<&str>::matches(&m, &"hello"));
/// assert_eq!(Matcher::<&str>::describe(&m), "\"hello\"");
/// ```
pub fn eq<U: Debug + Send + Sync>(expected: U) -> EqMatcher<U> {
    EqMatcher { expected }
}

/// Matcher for equality.
#[derive(Debug, Clone)]
pub struct EqMatcher<U> {
    expected: U,
}

impl<T, U> Matcher<T> for EqMatcher<U>
where
    T: PartialEq<U> + ?Sized,
    U: Debug + Send + Sync,
{
    fn matches(&self, value: &T) -> bool {
        value == &self.expected
    }

    fn describe(&self) -> String {
        format!("{:?}", self.expected)
    }
}

/// Create an inequality matcher.
pub fn ne<U: Debug + Send + Sync>(unexpected: U) -> NeMatcher<U> {
    NeMatcher { unexpected }
}

/// Matcher for inequality.
#[derive(Debug, Clone)]
pub struct NeMatcher<U> {
    unexpected: U,
}

impl<T, U> Matcher<T> for NeMatcher<U>
where
    T: PartialEq<U> + ?Sized,
    U: Debug + Send + Sync,
{
    fn matches(&self, value: &T) -> bool {
        value != &self.unexpected
    }

    fn describe(&self) -> String {
        format!("not equal to {:?}", self.unexpected)
    }
}

/// Create a greater-than matcher.
pub fn gt<U: Debug + Send + Sync>(threshold: U) -> GtMatcher<U> {
    GtMatcher { threshold }
}

/// Matcher for greater-than comparison.
#[derive(Debug, Clone)]
pub struct GtMatcher<U> {
    threshold: U,
}

impl<T, U> Matcher<T> for GtMatcher<U>
where
    T: PartialOrd<U> + ?Sized,
    U: Debug + Send + Sync,
{
    fn matches(&self, value: &T) -> bool {
        value > &self.threshold
    }

    fn describe(&self) -> String {
        format!("greater than {:?}", self.threshold)
    }
}

/// Create a less-than matcher.
pub fn lt<U: Debug + Send + Sync>(threshold: U) -> LtMatcher<U> {
    LtMatcher { threshold }
}

/// Matcher for less-than comparison.
#[derive(Debug, Clone)]
pub struct LtMatcher<U> {
    threshold: U,
}

impl<T, U> Matcher<T> for LtMatcher<U>
where
    T: PartialOrd<U> + ?Sized,
    U: Debug + Send + Sync,
{
    fn matches(&self, value: &T) -> bool {
        value < &self.threshold
    }

    fn describe(&self) -> String {
        format!("less than {:?}", self.threshold)
    }
}

/// Create a substring matcher for anything that views as a `str`.
///
/// ```rust
/// use testkit_sequence::assertions::matcher::{contains_str, Matcher};
///
/// let m = contains_str("world");
/// assert!(m.matches(&"hello world".to_string()));
/// assert!(!m.matches(&"hello".to_string()));
/// ```
pub fn contains_str(substring: impl Into<String>) -> ContainsStrMatcher {
    ContainsStrMatcher {
        substring: substring.into(),
    }
}

/// Matcher for string contains.
#[derive(Debug, Clone)]
pub struct ContainsStrMatcher {
    substring: String,
}

impl<T: AsRef<str> + ?Sized> Matcher<T> for ContainsStrMatcher {
    fn matches(&self, value: &T) -> bool {
        value.as_ref().contains(&self.substring)
    }

    fn describe(&self) -> String {
        format!("contains {:?}", self.substring)
    }
}

/// Create a matcher from a closure.
///
/// Describes itself as `"matching predicate"`; use [`described`] to give it a
/// more useful name.
pub fn predicate<T, F>(test: F) -> PredicateMatcher<F>
where
    T: ?Sized,
    F: Fn(&T) -> bool + Send + Sync,
{
    PredicateMatcher {
        test,
        label: Cow::Borrowed("matching predicate"),
    }
}

/// Create a labelled matcher from a closure.
///
/// ```rust
/// use testkit_sequence::assertions::matcher::{described, Matcher};
///
/// let m = described("an even number", |x: &i32| x % 2 == 0);
/// assert!(m.matches(&4_i32));
/// assert_eq!(Matcher::<i32>::describe(&m), "an even number");
/// ```
pub fn described<T, F>(label: impl Into<Cow<'static, str>>, test: F) -> PredicateMatcher<F>
where
    T: ?Sized,
    F: Fn(&T) -> bool + Send + Sync,
{
    PredicateMatcher {
        test,
        label: label.into(),
    }
}

/// Matcher backed by a closure.
pub struct PredicateMatcher<F> {
    test: F,
    label: Cow<'static, str>,
}

impl<T, F> Matcher<T> for PredicateMatcher<F>
where
    T: ?Sized,
    F: Fn(&T) -> bool + Send + Sync,
{
    fn matches(&self, value: &T) -> bool {
        (self.test)(value)
    }

    fn describe(&self) -> String {
        self.label.to_string()
    }
}

impl<F> Debug for PredicateMatcher<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateMatcher")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Combinators
// =============================================================================

/// Invert a matcher.
pub fn not<M>(inner: M) -> NotMatcher<M> {
    NotMatcher { inner }
}

/// Matcher that inverts another matcher.
#[derive(Debug, Clone)]
pub struct NotMatcher<M> {
    inner: M,
}

impl<T: ?Sized, M: Matcher<T>> Matcher<T> for NotMatcher<M> {
    fn matches(&self, value: &T) -> bool {
        !self.inner.matches(value)
    }

    fn describe(&self) -> String {
        format!("not ({})", self.inner.describe())
    }
}

/// Boxed matcher, for combinators over heterogeneous matchers.
pub type BoxMatcher<T> = Box<dyn Matcher<T>>;

/// Match when every inner matcher matches. Empty lists match everything.
pub fn all_of<T: ?Sized>(matchers: Vec<BoxMatcher<T>>) -> AllOfMatcher<T> {
    AllOfMatcher { matchers }
}

/// Matcher requiring all inner matchers.
pub struct AllOfMatcher<T: ?Sized> {
    matchers: Vec<BoxMatcher<T>>,
}

impl<T: ?Sized> Matcher<T> for AllOfMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        self.matchers.iter().all(|m| m.matches(value))
    }

    fn describe(&self) -> String {
        join_descriptions(&self.matchers, " and ")
    }
}

/// Match when any inner matcher matches. Empty lists match nothing.
pub fn any_of<T: ?Sized>(matchers: Vec<BoxMatcher<T>>) -> AnyOfMatcher<T> {
    AnyOfMatcher { matchers }
}

/// Matcher requiring at least one inner matcher.
pub struct AnyOfMatcher<T: ?Sized> {
    matchers: Vec<BoxMatcher<T>>,
}

impl<T: ?Sized> Matcher<T> for AnyOfMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        self.matchers.iter().any(|m| m.matches(value))
    }

    fn describe(&self) -> String {
        join_descriptions(&self.matchers, " or ")
    }
}

fn join_descriptions<T: ?Sized>(matchers: &[BoxMatcher<T>], separator: &str) -> String {
    let parts: Vec<String> = matchers.iter().map(|m| m.describe()).collect();
    format!("({})", parts.join(separator))
}

// =============================================================================
// Error Matchers
// =============================================================================

/// Match errors whose concrete type is `K`.
///
/// Works with any error type that views as a `dyn Error`, such as
/// `Box<dyn Error + Send + Sync>`.
///
/// ```rust
/// use std::error::Error;
/// use std::fmt;
/// use testkit_sequence::assertions::matcher::{error_of, Matcher};
///
/// #[derive(Debug)]
/// struct Timeout;
/// impl fmt::Display for Timeout {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         f.write_str("timeout")
///     }
/// }
/// impl Error for Timeout {}
///
/// let err: Box<dyn Error + Send + Sync> = Box::new(Timeout);
/// assert!(error_of::<Timeout>().matches(&err));
/// ```
pub fn error_of<K: StdError + 'static>() -> ErrorOfMatcher<K> {
    ErrorOfMatcher {
        _kind: PhantomData,
    }
}

/// Matcher for the concrete type behind a dynamic error.
pub struct ErrorOfMatcher<K> {
    _kind: PhantomData<fn() -> K>,
}

impl<E, K> Matcher<E> for ErrorOfMatcher<K>
where
    E: AsRef<dyn StdError + Send + Sync + 'static>,
    K: StdError + 'static,
{
    fn matches(&self, error: &E) -> bool {
        error.as_ref().is::<K>()
    }

    fn describe(&self) -> String {
        format!("error of type {}", type_name::<K>())
    }
}

impl<K> Debug for ErrorOfMatcher<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorOfMatcher")
            .field("kind", &type_name::<K>())
            .finish()
    }
}

/// Match errors that are the same enum variant as `sample`, ignoring payload.
///
/// ```rust
/// use testkit_sequence::assertions::matcher::{same_variant, Matcher};
///
/// #[derive(Debug)]
/// enum FetchError {
///     NotFound(String),
///     Refused,
/// }
///
/// let m = same_variant(FetchError::NotFound(String::new()));
/// assert!(m.matches(&FetchError::NotFound("/a".into())));
/// assert!(!m.matches(&FetchError::Refused));
/// ```
pub fn same_variant<E: Debug + Send + Sync>(sample: E) -> SameVariantMatcher<E> {
    SameVariantMatcher { sample }
}

/// Matcher comparing enum discriminants.
#[derive(Debug, Clone)]
pub struct SameVariantMatcher<E> {
    sample: E,
}

impl<E: Debug + Send + Sync> Matcher<E> for SameVariantMatcher<E> {
    fn matches(&self, error: &E) -> bool {
        discriminant(error) == discriminant(&self.sample)
    }

    fn describe(&self) -> String {
        format!("error like {:?}", self.sample)
    }
}
