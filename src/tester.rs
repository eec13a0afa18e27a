//! Testers and the guard that makes them failure-safe.
//!
//! A [`Tester`] is a named predicate over stream elements. Once registered it
//! is wrapped exactly once in a [`GuardedTester`], whose [`check`] never
//! panics and never returns an error: every result is folded into an
//! [`Outcome`].
//!
//! [`check`]: GuardedTester::check

use std::fmt;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::TesterError;

/// Bound shared by every element type flowing through Sellus.
///
/// Elements are cloned into notification payloads and logged with `Debug`.
pub trait Element: Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> Element for T where T: Clone + fmt::Debug + Send + Sync + 'static {}

/// A named predicate checked against every element of a stream.
///
/// Returning `Ok(false)` is an assertion failure. Returning `Err` (or
/// panicking) is a raised error.
pub trait Tester<T>: Send + Sync {
    /// Name reported in notifications.
    fn name(&self) -> &str;

    /// Check one element.
    fn test(&self, element: &T) -> Result<bool, TesterError>;
}

/// Tester built from an infallible closure. See [`tester`].
pub struct FnTester<F> {
    name: String,
    f: F,
}

impl<T, F> Tester<T> for FnTester<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn test(&self, element: &T) -> Result<bool, TesterError> {
        Ok((self.f)(element))
    }
}

/// Tester built from a closure returning `Result`. See [`try_tester`].
pub struct FallibleFnTester<F, E> {
    name: String,
    f: F,
    _error: PhantomData<fn() -> E>,
}

impl<T, F, E> Tester<T> for FallibleFnTester<F, E>
where
    F: Fn(&T) -> Result<bool, E> + Send + Sync,
    E: fmt::Display,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn test(&self, element: &T) -> Result<bool, TesterError> {
        (self.f)(element).map_err(|e| TesterError::Failed(e.to_string()))
    }
}

/// Create a tester from a predicate closure.
///
/// ```rust
/// use sellus::{tester, Tester};
///
/// let positive = tester("is_positive", |n: &i32| *n > 0);
/// assert_eq!(Tester::<i32>::name(&positive), "is_positive");
/// assert_eq!(positive.test(&3_i32), Ok(true));
/// ```
pub fn tester<T, F>(name: impl Into<String>, f: F) -> FnTester<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    FnTester {
        name: name.into(),
        f,
    }
}

/// Create a tester from a closure that may fail.
///
/// The error's `Display` output becomes the [`TesterError::Failed`] message.
pub fn try_tester<T, F, E>(name: impl Into<String>, f: F) -> FallibleFnTester<F, E>
where
    F: Fn(&T) -> Result<bool, E> + Send + Sync,
    E: fmt::Display,
{
    FallibleFnTester {
        name: name.into(),
        f,
        _error: PhantomData,
    }
}

/// Result of running a guarded tester against one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The predicate held.
    Passed,
    /// The predicate returned `false`.
    Failed,
    /// The tester returned an error or panicked.
    Raised(TesterError),
}

impl Outcome {
    /// Whether the element passed.
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

/// A tester bound to its correlation name and made failure-safe.
pub struct GuardedTester<T> {
    test_name: Arc<str>,
    tester: Arc<dyn Tester<T>>,
}

impl<T> GuardedTester<T> {
    pub(crate) fn new(test_name: Arc<str>, tester: Arc<dyn Tester<T>>) -> Self {
        Self { test_name, tester }
    }

    /// Correlation name of the expectation this tester was registered under.
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Name of the wrapped tester.
    pub fn tester_name(&self) -> &str {
        self.tester.name()
    }

    /// Run the wrapped tester. Never panics.
    pub fn check(&self, element: &T) -> Outcome {
        match catch_unwind(AssertUnwindSafe(|| self.tester.test(element))) {
            Ok(Ok(true)) => Outcome::Passed,
            Ok(Ok(false)) => Outcome::Failed,
            Ok(Err(err)) => Outcome::Raised(err),
            Err(payload) => Outcome::Raised(TesterError::from_panic(payload)),
        }
    }
}

impl<T> Clone for GuardedTester<T> {
    fn clone(&self) -> Self {
        Self {
            test_name: Arc::clone(&self.test_name),
            tester: Arc::clone(&self.tester),
        }
    }
}

impl<T> fmt::Debug for GuardedTester<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedTester")
            .field("test_name", &&*self.test_name)
            .field("tester", &self.tester.name())
            .finish()
    }
}
