//! Mock sources for testing validators and the code that feeds them.
//!
//! - [`ScriptedSource`] - Replays a fixed script and counts pulls
//! - [`source_channel`] - A source fed from another task
//!
//! # Scripted Sources
//!
//! ```rust
//! use testkit_sequence::assertions::{emit, expect_try_stream, skip_all};
//! use testkit_sequence::mock::ScriptedSource;
//!
//! # futures::executor::block_on(async {
//! let source = ScriptedSource::<_, &str>::from_items([1, 2, 3]);
//! let pulls = source.pull_counter();
//!
//! expect_try_stream(source)
//!     .validate(vec![emit(1), skip_all()])
//!     .await
//!     .unwrap();
//! assert_eq!(pulls.get(), 4);
//! # });
//! ```

mod source;

pub use source::{
    source_channel, PullCounter, ScriptedSource, SendError, SourceReceiver, SourceSender, Step,
};
