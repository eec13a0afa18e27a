//! Base trait for named, registrable components.
//!
//! Integrations are registered in a [`Registry`](crate::Registry) by name and
//! looked up when a tester fails. `Provider` is the minimal contract that
//! makes a component registrable.

use std::any::Any;
use std::fmt::Debug;

/// Base trait for components stored in a [`Registry`](crate::Registry).
///
/// # Example
///
/// ```rust
/// use sellus::Provider;
/// use std::any::Any;
///
/// #[derive(Debug)]
/// struct Pager;
///
/// impl Provider for Pager {
///     fn name(&self) -> &str {
///         "pager"
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// assert_eq!(Pager.name(), "pager");
/// ```
pub trait Provider: Send + Sync + Debug {
    /// Returns the unique name of this provider.
    ///
    /// This name is used for registration and lookup in the registry.
    fn name(&self) -> &str;

    /// Downcast to concrete type for advanced usage.
    fn as_any(&self) -> &dyn Any;
}

/// Extension trait for provider type checking.
pub trait ProviderExt: Provider {
    /// Check if this provider is of type T.
    fn is<T: Provider + 'static>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast to type T.
    fn downcast_ref<T: Provider + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl<P: Provider + ?Sized> ProviderExt for P {}
