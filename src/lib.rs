//! # testkit-sequence
//!
//! > Declarative expectations for async sequences
//!
//! **testkit-sequence** checks that a stream produces an expected pattern of
//! elements and errors. A test lists its expectations in order, and a single
//! pass over the stream reports the first place where the stream and the
//! list disagree.
//!
//! ## Quick Start
//!
//! ```rust
//! use testkit_sequence::prelude::*;
//! use futures::stream;
//!
//! # futures::executor::block_on(async {
//! let readings = stream::iter(vec![0, 3, 7, 12, 40]);
//!
//! expect_stream(readings)
//!     .validate(vec![
//!         emit(0),
//!         skip_while(|r: &i32| *r < 10),
//!         emit_where(|r: &i32| *r > 10),
//!         skip_all(),
//!     ])
//!     .await
//!     .unwrap();
//! # });
//! ```
//!
//! ## Features
//!
//! - **Element expectations** - exact values, predicates and matchers
//! - **Skips** - one, N, all remaining, or while a predicate holds
//! - **Eventually** - discard elements until one matches
//! - **Error expectations** - any error, by type, by variant, or by predicate
//! - **Diagnostics** - failures carry the index and the call site of the
//!   offending expectation
//! - **Recording** - collect failures in [`Issues`](assertions::Issues)
//!   instead of returning them

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assertions;
pub mod config;
pub mod error;
pub mod mock;

/// Prelude for convenient imports
///
/// ```rust
/// use testkit_sequence::prelude::*;
/// ```
pub mod prelude {
    pub use crate::assertions::{
        emit, emit_eventually, emit_eventually_where, emit_that, emit_where, expect_error,
        expect_error_like, expect_error_of, expect_error_where, expect_stream, expect_try_stream,
        skip, skip_all, skip_n, skip_while, Expectation, Expectations, Issue, Issues,
    };
    pub use crate::config::Config;
    pub use crate::error::{Error, FailureKind, Result};
}

// Re-exports
pub use config::Config;
pub use error::{Error, FailureKind, Result};
