//! Declarative expectations for async sequences.
//!
//! A test lists what a sequence should produce, in order, and a validator
//! consumes the sequence one element at a time until every expectation is
//! satisfied or the first failure is found.
//!
//! - [`expect_stream`] / [`expect_try_stream`] - Entry points
//! - [`Expectation`] and its builders ([`emit`], [`skip_n`], [`expect_error`], ...)
//! - [`Validator`] - The pass itself
//! - [`Issues`] - Record failures instead of returning them
//! - [`matcher`] - Reusable matchers for elements and errors
//!
//! # Element expectations
//!
//! ```rust
//! use testkit_sequence::assertions::{emit, emit_eventually, expect_stream, skip};
//! use futures::stream;
//!
//! # futures::executor::block_on(async {
//! expect_stream(stream::iter(vec![1, 2, 3, 4]))
//!     .validate(vec![emit(1), skip(), emit_eventually(4)])
//!     .await
//!     .unwrap();
//! # });
//! ```
//!
//! # Error expectations
//!
//! ```rust
//! use testkit_sequence::assertions::{emit, expect_error, expect_try_stream};
//! use futures::stream;
//!
//! # futures::executor::block_on(async {
//! let source = stream::iter(vec![Ok(1), Err("closed")]);
//! expect_try_stream(source)
//!     .validate(vec![emit(1), expect_error()])
//!     .await
//!     .unwrap();
//! # });
//! ```

pub mod expectation;
mod issues;
pub mod matcher;
mod sequence;
mod validator;

pub use expectation::{
    emit, emit_eventually, emit_eventually_where, emit_that, emit_where, expect_error,
    expect_error_like, expect_error_of, expect_error_where, skip, skip_all, skip_n, skip_while,
    Expectation, Expectations, Rule,
};
pub use issues::{Issue, Issues};
pub use sequence::{expect_stream, expect_try_stream, SequenceTest, Unfailing};
pub use validator::Validator;
