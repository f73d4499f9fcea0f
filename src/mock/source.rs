//! Controllable sources for exercising validators.
//!
//! - [`ScriptedSource`] replays a fixed script of elements, pending polls
//!   and a terminal error, counting every resolved pull.
//! - [`source_channel`] feeds a source from another task.
//!
//! # Example
//!
//! ```rust
//! use testkit_sequence::mock::ScriptedSource;
//!
//! let source = ScriptedSource::<i32, &str>::new()
//!     .item(1)
//!     .pending()
//!     .item(2)
//!     .fail("gone");
//! let pulls = source.pull_counter();
//! assert_eq!(pulls.get(), 0);
//! ```

use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use futures_core::Stream;
use parking_lot::Mutex;

/// One scripted step of a [`ScriptedSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T, E> {
    /// Yield an element.
    Item(T),
    /// Return `Pending` once, waking the task immediately.
    Pending,
    /// Terminate with an error.
    Fail(E),
}

/// Shared count of resolved pulls on a source.
#[derive(Debug, Clone, Default)]
pub struct PullCounter {
    count: Arc<AtomicUsize>,
}

impl PullCounter {
    /// Number of pulls that resolved to an element, an error or the end.
    #[must_use]
    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    fn increment(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// A source that replays a script.
///
/// Once the script ends, or a [`Step::Fail`] is delivered, every further
/// pull resolves to `None` and is still counted.
pub struct ScriptedSource<T, E = Infallible> {
    steps: VecDeque<Step<T, E>>,
    terminated: bool,
    pulls: PullCounter,
}

// No field is ever pinned.
impl<T, E> Unpin for ScriptedSource<T, E> {}

impl<T, E> Default for ScriptedSource<T, E> {
    fn default() -> Self {
        Self {
            steps: VecDeque::new(),
            terminated: false,
            pulls: PullCounter::default(),
        }
    }
}

impl<T, E> ScriptedSource<T, E> {
    /// Create an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a script that yields `items` and then ends.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        Self::new().items(items)
    }

    /// Append an element.
    #[must_use]
    pub fn item(mut self, value: T) -> Self {
        self.steps.push_back(Step::Item(value));
        self
    }

    /// Append several elements.
    #[must_use]
    pub fn items(mut self, values: impl IntoIterator<Item = T>) -> Self {
        self.steps.extend(values.into_iter().map(Step::Item));
        self
    }

    /// Append a single `Pending` poll.
    #[must_use]
    pub fn pending(mut self) -> Self {
        self.steps.push_back(Step::Pending);
        self
    }

    /// Append a terminal error.
    #[must_use]
    pub fn fail(mut self, error: E) -> Self {
        self.steps.push_back(Step::Fail(error));
        self
    }

    /// Handle observing how many pulls have resolved.
    #[must_use]
    pub fn pull_counter(&self) -> PullCounter {
        self.pulls.clone()
    }

    /// Steps not yet replayed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl<T, E> fmt::Debug for ScriptedSource<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedSource")
            .field("remaining", &self.steps.len())
            .field("terminated", &self.terminated)
            .field("pulls", &self.pulls.get())
            .finish()
    }
}

impl<T, E> Stream for ScriptedSource<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.terminated {
            this.pulls.increment();
            return Poll::Ready(None);
        }

        match this.steps.pop_front() {
            Some(Step::Pending) => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Some(Step::Item(value)) => {
                this.pulls.increment();
                Poll::Ready(Some(Ok(value)))
            }
            Some(Step::Fail(error)) => {
                this.terminated = true;
                this.pulls.increment();
                Poll::Ready(Some(Err(error)))
            }
            None => {
                this.terminated = true;
                this.pulls.increment();
                Poll::Ready(None)
            }
        }
    }
}

// =============================================================================
// Channel-fed source
// =============================================================================

/// Error returned when sending into a closed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendError<T>(pub T);

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sending into a closed source")
    }
}

impl<T: fmt::Debug> std::error::Error for SendError<T> {}

struct State<T, E> {
    queue: VecDeque<Result<T, E>>,
    /// No more items will be queued.
    closed: bool,
    /// The receiver has yielded a terminal error.
    failed: bool,
    waker: Option<Waker>,
}

struct Shared<T, E> {
    state: Mutex<State<T, E>>,
    senders: AtomicUsize,
    sent: AtomicUsize,
}

impl<T, E> Shared<T, E> {
    fn close(&self) {
        let waker = {
            let mut state = self.state.lock();
            state.closed = true;
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn enqueue<V>(
        &self,
        value: V,
        wrap: impl FnOnce(V) -> Result<T, E>,
        close: bool,
    ) -> Result<(), SendError<V>> {
        let waker = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(SendError(value));
            }
            state.queue.push_back(wrap(value));
            state.closed = close;
            state.waker.take()
        };
        self.sent.fetch_add(1, Ordering::SeqCst);
        if let Some(waker) = waker {
            waker.wake();
        }
        Ok(())
    }
}

/// Create a source fed from a [`SourceSender`].
///
/// The receiving half is a `Stream<Item = Result<T, E>>`. It ends when every
/// sender is dropped or [`SourceSender::close`] is called, and it ends right
/// after yielding an error sent with [`SourceSender::fail`].
///
/// # Example
///
/// ```rust
/// use testkit_sequence::mock::source_channel;
///
/// let (tx, rx) = source_channel::<i32, String>();
/// tx.send(1).unwrap();
/// tx.fail("broken".to_string()).unwrap();
/// assert!(tx.send(2).is_err());
/// assert_eq!(tx.sent_count(), 2);
/// # drop(rx);
/// ```
#[must_use]
pub fn source_channel<T, E>() -> (SourceSender<T, E>, SourceReceiver<T, E>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            queue: VecDeque::new(),
            closed: false,
            failed: false,
            waker: None,
        }),
        senders: AtomicUsize::new(1),
        sent: AtomicUsize::new(0),
    });

    (
        SourceSender {
            shared: Arc::clone(&shared),
        },
        SourceReceiver { shared },
    )
}

/// Sending half of a [`source_channel`].
pub struct SourceSender<T, E = Infallible> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> SourceSender<T, E> {
    /// Queue an element.
    ///
    /// # Errors
    ///
    /// Returns the element if the source is already closed.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        self.shared.enqueue(value, Ok, false)
    }

    /// Queue a terminal error and close the source.
    ///
    /// # Errors
    ///
    /// Returns the error if the source is already closed.
    pub fn fail(&self, error: E) -> Result<(), SendError<E>> {
        self.shared.enqueue(error, Err, true)
    }

    /// Close the source. Queued items are still delivered.
    pub fn close(&self) {
        self.shared.close();
    }

    /// Whether the source is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Number of items successfully queued, errors included.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.shared.sent.load(Ordering::SeqCst)
    }
}

impl<T, E> Clone for SourceSender<T, E> {
    fn clone(&self) -> Self {
        self.shared.senders.fetch_add(1, Ordering::SeqCst);
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> Drop for SourceSender<T, E> {
    fn drop(&mut self) {
        if self.shared.senders.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.shared.close();
        }
    }
}

impl<T, E> fmt::Debug for SourceSender<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSender")
            .field("sent", &self.sent_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Receiving half of a [`source_channel`].
pub struct SourceReceiver<T, E = Infallible> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> fmt::Debug for SourceReceiver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("SourceReceiver")
            .field("queued", &state.queue.len())
            .field("closed", &state.closed)
            .finish()
    }
}

impl<T, E> Stream for SourceReceiver<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut state = self.shared.state.lock();
        if state.failed {
            return Poll::Ready(None);
        }
        match state.queue.pop_front() {
            Some(item) => {
                state.failed = item.is_err();
                Poll::Ready(Some(item))
            }
            None if state.closed => Poll::Ready(None),
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_scripted_source_replays_script() {
        let mut source = ScriptedSource::<_, &str>::new()
            .item(1)
            .pending()
            .item(2)
            .fail("boom");
        let pulls = source.pull_counter();

        assert_eq!(source.next().await, Some(Ok(1)));
        assert_eq!(source.next().await, Some(Ok(2)));
        assert_eq!(source.next().await, Some(Err("boom")));
        assert_eq!(source.next().await, None);
        assert_eq!(pulls.get(), 4);
    }

    #[tokio::test]
    async fn test_scripted_source_stays_terminated() {
        let mut source = ScriptedSource::<i32>::from_items([7]);
        let pulls = source.pull_counter();

        assert_eq!(source.next().await, Some(Ok(7)));
        assert_eq!(source.next().await, None);
        assert_eq!(source.next().await, None);
        assert_eq!(pulls.get(), 3);
        assert_eq!(source.remaining(), 0);
    }

    #[tokio::test]
    async fn test_channel_delivers_then_ends() {
        let (tx, mut rx) = source_channel::<i32, &str>();
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        drop(tx);

        assert_eq!(rx.next().await, Some(Ok(1)));
        assert_eq!(rx.next().await, Some(Ok(2)));
        assert_eq!(rx.next().await, None);
    }

    #[tokio::test]
    async fn test_channel_fail_terminates() {
        let (tx, mut rx) = source_channel::<i32, &str>();
        tx.send(1).unwrap();
        tx.fail("reset").unwrap();
        assert_eq!(tx.send(2), Err(SendError(2)));
        assert!(tx.is_closed());

        assert_eq!(rx.next().await, Some(Ok(1)));
        assert_eq!(rx.next().await, Some(Err("reset")));
        assert_eq!(rx.next().await, None);
    }

    #[tokio::test]
    async fn test_channel_wakes_receiver() {
        let (tx, mut rx) = source_channel::<i32, &str>();
        let producer = tokio::spawn(async move {
            tokio::task::yield_now().await;
            tx.send(5).unwrap();
        });

        assert_eq!(rx.next().await, Some(Ok(5)));
        producer.await.unwrap();
        assert_eq!(rx.next().await, None);
    }

    #[test]
    fn test_clone_keeps_channel_open() {
        let (tx, _rx) = source_channel::<i32, &str>();
        let other = tx.clone();
        drop(tx);
        assert!(!other.is_closed());
        drop(other);
    }
}
