//! Async stream utilities and stream identity.
//!
//! Sellus does not implement stream semantics of its own. Element sources are
//! plain [`futures_core::Stream`]s boxed as [`EventStream`], and testers are
//! keyed by [`StreamHandle`], an opaque identity for one such source.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_core::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Type alias for a boxed async stream of elements.
pub type EventStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of an element source.
///
/// Every handle created with [`StreamHandle::new`] is distinct, even when two
/// handles share a label. Clones share the identity of their original.
///
/// ```rust
/// use sellus::StreamHandle;
///
/// let a = StreamHandle::new("sensor");
/// let b = StreamHandle::new("sensor");
/// assert_ne!(a, b);
/// assert_eq!(a, a.clone());
/// ```
#[derive(Clone)]
pub struct StreamHandle {
    id: u64,
    label: Arc<str>,
}

impl StreamHandle {
    /// Create a new, unique stream handle. The label is used for logging only.
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed),
            label: label.into(),
        }
    }

    /// Process-unique identifier of this handle.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl PartialEq for StreamHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for StreamHandle {}

impl Hash for StreamHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("id", &self.id)
            .field("label", &&*self.label)
            .finish()
    }
}

impl fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.label, self.id)
    }
}

/// A sender for elements of an [`EventStream`].
///
/// This wraps a tokio mpsc sender.
pub struct EventSender<T> {
    tx: mpsc::Sender<T>,
}

impl<T> EventSender<T> {
    /// Create a new event sender from an mpsc sender.
    pub fn new(tx: mpsc::Sender<T>) -> Self {
        Self { tx }
    }

    /// Send an element.
    ///
    /// Returns `Ok(())` if the element was sent, or `Err(element)` if the
    /// receiver was dropped.
    pub async fn send(&self, event: T) -> Result<(), T> {
        self.tx.send(event).await.map_err(|e| e.0)
    }

    /// Try to send an element without waiting.
    ///
    /// Returns `Ok(())` if the element was sent, or `Err(element)` if the
    /// channel is full or closed.
    pub fn try_send(&self, event: T) -> Result<(), T> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(v) => v,
            mpsc::error::TrySendError::Closed(v) => v,
        })
    }

    /// Check if the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<T> Clone for EventSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> fmt::Debug for EventSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Builder for creating channel-backed event streams.
///
/// # Example
///
/// ```rust
/// use sellus::StreamBuilder;
///
/// # async fn example() {
/// let (sender, stream) = StreamBuilder::<f64>::new()
///     .buffer_size(16)
///     .build();
///
/// sender.send(21.5).await.unwrap();
/// # }
/// ```
pub struct StreamBuilder<T> {
    buffer_size: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Send + 'static> StreamBuilder<T> {
    /// Create a new stream builder with default settings.
    pub fn new() -> Self {
        Self {
            buffer_size: 100,
            _marker: std::marker::PhantomData,
        }
    }

    /// Set the buffer size for the underlying channel.
    ///
    /// Default is 100.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Build the stream and sender.
    pub fn build(self) -> (EventSender<T>, EventStream<T>) {
        let (tx, rx) = mpsc::channel(self.buffer_size);
        let sender = EventSender::new(tx);
        let stream: EventStream<T> = Box::pin(ReceiverStream::new(rx));
        (sender, stream)
    }
}

impl<T: Send + 'static> Default for StreamBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Create an event stream with the default buffer size.
///
/// ```rust
/// use sellus::create_stream;
///
/// # async fn example() {
/// let (sender, stream) = create_stream::<String>();
/// sender.send("reading".to_string()).await.unwrap();
/// # }
/// ```
pub fn create_stream<T: Send + 'static>() -> (EventSender<T>, EventStream<T>) {
    StreamBuilder::<T>::new().build()
}

/// Extension trait for boxing any sendable stream as an [`EventStream`].
///
/// ```rust
/// use sellus::{EventStream, EventStreamExt};
///
/// let readings: EventStream<u8> = futures::stream::iter(vec![1, 2, 3]).into_event_stream();
/// # drop(readings);
/// ```
pub trait EventStreamExt<T> {
    /// Convert into a boxed event stream.
    fn into_event_stream(self) -> EventStream<T>;
}

impl<S, T> EventStreamExt<T> for S
where
    S: Stream<Item = T> + Send + 'static,
{
    fn into_event_stream(self) -> EventStream<T> {
        Box::pin(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::collections::HashSet;

    #[test]
    fn test_handles_are_unique() {
        let a = StreamHandle::new("temperature");
        let b = StreamHandle::new("temperature");
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.label(), b.label());
    }

    #[test]
    fn test_handle_clone_shares_identity() {
        let a = StreamHandle::new("humidity");
        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&a));
        assert_eq!(format!("{}", a), format!("humidity#{}", a.id()));
    }

    #[tokio::test]
    async fn test_stream_builder() {
        let (sender, stream) = StreamBuilder::<u32>::new().buffer_size(10).build();

        sender.send(1).await.unwrap();
        sender.send(2).await.unwrap();
        sender.send(3).await.unwrap();
        drop(sender);

        let events: Vec<_> = stream.collect().await;
        assert_eq!(events, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_sender_clone() {
        let (sender, stream) = create_stream::<u32>();

        let sender2 = sender.clone();
        sender.send(1).await.unwrap();
        sender2.send(2).await.unwrap();
        drop(sender);
        drop(sender2);

        let events: Vec<_> = stream.collect().await;
        assert_eq!(events, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_into_event_stream() {
        let stream = futures::stream::iter(vec!["a", "b"]).map(str::len).into_event_stream();
        let lengths: Vec<_> = stream.collect().await;
        assert_eq!(lengths, vec![1, 1]);
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (sender, stream) = create_stream::<u32>();
        drop(stream);

        assert!(sender.is_closed());
        assert_eq!(sender.send(7).await, Err(7));
        assert_eq!(sender.try_send(8), Err(8));
    }
}
