//! Registration of testers against streams.
//!
//! Declarations are run once during setup against a [`TesterRegistry`]. Each
//! declaration opens one or more [`Expectation`]s, and every tester added to
//! an expectation is wrapped in a [`GuardedTester`] and appended to the
//! stream's entry in the [`StreamTesters`] table.
//!
//! ```rust
//! use sellus::{declaration, tester, StreamHandle, TesterRegistry};
//!
//! let readings = StreamHandle::new("readings");
//! let stream = readings.clone();
//!
//! let mut registry = TesterRegistry::<i64>::new();
//! let table = registry.register(vec![declaration("pscheck_readings", move |r| {
//!     r.expect_here(&stream)
//!         .unwrap()
//!         .tester(tester("non_negative", |n: &i64| *n >= 0));
//! })]);
//!
//! assert_eq!(table.testers(&readings).len(), 1);
//! assert_eq!(table.testers(&readings)[0].test_name(), "pscheck_readings");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{SellusError, SellusResult};
use crate::stream::StreamHandle;
use crate::tester::{GuardedTester, Tester};

/// Mapping from stream handle to its wrapped testers.
///
/// Entries only ever grow. Streams iterate in first-registration order and
/// testers in registration order.
pub struct StreamTesters<T> {
    order: Vec<StreamHandle>,
    testers: HashMap<StreamHandle, Vec<GuardedTester<T>>>,
}

impl<T> StreamTesters<T> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            testers: HashMap::new(),
        }
    }

    fn push(&mut self, stream: &StreamHandle, tester: GuardedTester<T>) {
        match self.testers.get_mut(stream) {
            Some(list) => list.push(tester),
            None => {
                self.order.push(stream.clone());
                self.testers.insert(stream.clone(), vec![tester]);
            }
        }
    }

    /// Wrapped testers for a stream, in registration order. Empty if none.
    pub fn testers(&self, stream: &StreamHandle) -> &[GuardedTester<T>] {
        self.testers
            .get(stream)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Whether any tester is registered for the stream.
    pub fn contains(&self, stream: &StreamHandle) -> bool {
        self.testers.contains_key(stream)
    }

    /// Streams with at least one tester, in first-registration order.
    pub fn streams(&self) -> impl Iterator<Item = &StreamHandle> {
        self.order.iter()
    }

    /// Iterate `(stream, testers)` pairs in first-registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&StreamHandle, &[GuardedTester<T>])> {
        self.order
            .iter()
            .map(move |stream| (stream, self.testers(stream)))
    }

    /// Distinct correlation names used by any tester, in first-use order.
    pub fn test_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (_, testers) in self.iter() {
            for tester in testers {
                if !names.contains(&tester.test_name()) {
                    names.push(tester.test_name());
                }
            }
        }
        names
    }

    /// Number of streams with testers.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no tester has been registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total number of wrapped testers across all streams.
    pub fn tester_count(&self) -> usize {
        self.testers.values().map(Vec::len).sum()
    }
}

impl<T> fmt::Debug for StreamTesters<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter())
            .finish()
    }
}

/// A named setup function that registers testers.
pub struct Declaration<T> {
    name: Arc<str>,
    body: Box<dyn FnOnce(&mut TesterRegistry<T>) + Send>,
}

impl<T> Declaration<T> {
    /// Name of the declaration, used by [`TesterRegistry::expect_here`].
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> fmt::Debug for Declaration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declaration")
            .field("name", &&*self.name)
            .finish_non_exhaustive()
    }
}

/// Create a named declaration.
pub fn declaration<T, F>(name: impl Into<Arc<str>>, body: F) -> Declaration<T>
where
    F: FnOnce(&mut TesterRegistry<T>) + Send + 'static,
{
    Declaration {
        name: name.into(),
        body: Box::new(body),
    }
}

/// Registry binding streams to their testers.
///
/// Each session owns its own registry; nothing is process-wide.
pub struct TesterRegistry<T> {
    table: StreamTesters<T>,
    current: Option<Arc<str>>,
}

impl<T> TesterRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            table: StreamTesters::new(),
            current: None,
        }
    }

    /// Run every declaration exactly once, in order, and return the table.
    pub fn register<I>(&mut self, declarations: I) -> &StreamTesters<T>
    where
        I: IntoIterator<Item = Declaration<T>>,
    {
        for declaration in declarations {
            debug!(declaration = %declaration.name, "running declaration");
            let previous = self.current.replace(Arc::clone(&declaration.name));
            let mut scope = DeclarationScope {
                registry: &mut *self,
                previous,
            };
            (declaration.body)(&mut *scope.registry);
        }
        &self.table
    }

    /// Open an expectation on `stream` under an explicit correlation name.
    pub fn expect(
        &mut self,
        test_name: impl Into<Arc<str>>,
        stream: &StreamHandle,
    ) -> Expectation<'_, T> {
        Expectation {
            registry: self,
            test_name: test_name.into(),
            stream: stream.clone(),
        }
    }

    /// Open an expectation named after the declaration currently running.
    ///
    /// Helpers called from within a declaration resolve to the declaration's
    /// name, not their own. Fails outside of [`register`](Self::register).
    pub fn expect_here(&mut self, stream: &StreamHandle) -> SellusResult<Expectation<'_, T>> {
        let name = self.current.clone().ok_or(SellusError::OutsideDeclaration)?;
        Ok(self.expect(name, stream))
    }

    /// Name of the declaration currently running, if any.
    pub fn current_declaration(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The stream-to-testers table.
    pub fn table(&self) -> &StreamTesters<T> {
        &self.table
    }

    /// Consume the registry, keeping only the table.
    pub fn into_table(self) -> StreamTesters<T> {
        self.table
    }
}

/// Restores the enclosing declaration name when a declaration ends, even by
/// unwinding.
struct DeclarationScope<'a, T> {
    registry: &'a mut TesterRegistry<T>,
    previous: Option<Arc<str>>,
}

impl<T> Drop for DeclarationScope<'_, T> {
    fn drop(&mut self) {
        self.registry.current = self.previous.take();
    }
}

impl<T> Default for TesterRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TesterRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TesterRegistry")
            .field("table", &self.table)
            .field("current", &self.current.as_deref())
            .finish()
    }
}

/// Testers being attached to one stream under one correlation name.
///
/// Every tester is registered as soon as it is added.
pub struct Expectation<'a, T> {
    registry: &'a mut TesterRegistry<T>,
    test_name: Arc<str>,
    stream: StreamHandle,
}

impl<'a, T> Expectation<'a, T> {
    /// Correlation name of this expectation.
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Wrap and register one tester.
    pub fn tester(self, tester: impl Tester<T> + 'static) -> Self {
        self.add(Arc::new(tester))
    }

    /// Wrap and register several testers, preserving their order.
    pub fn to<I>(self, testers: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn Tester<T>>>,
    {
        testers
            .into_iter()
            .fold(self, |expectation, tester| expectation.add(Arc::from(tester)))
    }

    fn add(self, tester: Arc<dyn Tester<T>>) -> Self {
        debug!(
            test = %self.test_name,
            tester = %tester.name(),
            stream = %self.stream,
            "registering tester"
        );
        let guarded = GuardedTester::new(Arc::clone(&self.test_name), tester);
        self.registry.table.push(&self.stream, guarded);
        self
    }
}
