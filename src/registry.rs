//! Name-keyed registry for providers.
//!
//! The `Registry` stores integrations by name and preserves registration
//! order so that notification fan-out is deterministic.

use std::collections::HashMap;

use crate::error::{RegistryError, RegistryResult};
use crate::provider::Provider;

/// A registry for managing named providers.
///
/// # Example
///
/// ```rust
/// use sellus::{Provider, Registry};
/// use std::any::Any;
///
/// #[derive(Debug)]
/// struct Pager;
///
/// impl Provider for Pager {
///     fn name(&self) -> &str { "pager" }
///     fn as_any(&self) -> &dyn Any { self }
/// }
///
/// let mut registry: Registry<dyn Provider> = Registry::new();
/// registry.register(Box::new(Pager));
///
/// assert!(registry.get("pager").is_some());
/// ```
#[derive(Debug)]
pub struct Registry<P: ?Sized> {
    providers: HashMap<String, Box<P>>,
    ordered: Vec<String>,
}

impl<P: Provider + ?Sized> Registry<P> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            ordered: Vec::new(),
        }
    }

    /// Register a provider.
    ///
    /// The provider is registered under its name. If a provider with the same
    /// name already exists, it will be replaced and keep its original position.
    pub fn register(&mut self, provider: Box<P>) {
        let name = provider.name().to_string();
        if !self.providers.contains_key(&name) {
            self.ordered.push(name.clone());
        }
        self.providers.insert(name, provider);
    }

    /// Register a provider, returning an error if already registered or if
    /// its name is blank.
    pub fn register_unique(&mut self, provider: Box<P>) -> RegistryResult<()> {
        let name = provider.name().to_string();
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidName(name));
        }
        if self.providers.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        self.ordered.push(name.clone());
        self.providers.insert(name, provider);
        Ok(())
    }

    /// Get a provider by name.
    pub fn get(&self, name: &str) -> Option<&P> {
        self.providers.get(name).map(|p| p.as_ref())
    }

    /// Check if a provider with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Get the names of all registered providers, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.ordered.iter().map(|s| s.as_str()).collect()
    }

    /// Get the number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Iterate over all providers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.ordered
            .iter()
            .filter_map(move |name| self.providers.get(name))
            .map(|p| p.as_ref())
    }
}

impl<P: Provider + ?Sized> Default for Registry<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    #[derive(Debug)]
    struct Sink {
        name: String,
        channel: &'static str,
    }

    impl Sink {
        fn new(name: &str, channel: &'static str) -> Self {
            Self {
                name: name.to_string(),
                channel,
            }
        }
    }

    impl Provider for Sink {
        fn name(&self) -> &str {
            &self.name
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut registry: Registry<dyn Provider> = Registry::new();
        registry.register(Box::new(Sink::new("slack", "#alerts")));

        assert!(registry.get("slack").is_some());
        assert!(registry.get("email").is_none());
        assert!(registry.contains("slack"));
    }

    #[test]
    fn test_registry_replace_keeps_position() {
        let mut registry: Registry<dyn Provider> = Registry::new();
        registry.register(Box::new(Sink::new("a", "#one")));
        registry.register(Box::new(Sink::new("b", "#two")));
        registry.register(Box::new(Sink::new("a", "#three")));

        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(registry.len(), 2);
        let replaced = registry
            .get("a")
            .and_then(|p| p.as_any().downcast_ref::<Sink>())
            .map(|s| s.channel);
        assert_eq!(replaced, Some("#three"));
    }

    #[test]
    fn test_registry_unique_registration() {
        let mut registry: Registry<dyn Provider> = Registry::new();

        assert!(registry
            .register_unique(Box::new(Sink::new("slack", "#a")))
            .is_ok());
        assert_eq!(
            registry.register_unique(Box::new(Sink::new("slack", "#b"))),
            Err(RegistryError::AlreadyRegistered("slack".to_string()))
        );
        assert_eq!(
            registry.register_unique(Box::new(Sink::new("  ", "#c"))),
            Err(RegistryError::InvalidName("  ".to_string()))
        );
    }

    #[test]
    fn test_registry_iter_in_order() {
        let mut registry: Registry<dyn Provider> = Registry::new();
        assert!(registry.is_empty());

        registry.register(Box::new(Sink::new("c", "#c")));
        registry.register(Box::new(Sink::new("a", "#a")));
        registry.register(Box::new(Sink::new("b", "#b")));

        let names: Vec<&str> = registry.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
