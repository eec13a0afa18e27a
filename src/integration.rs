//! Integrations and the lookup table that routes failures to them.
//!
//! An [`Integration`] is an external notification sink. Sellus never delivers
//! notifications itself; it looks up the [`TestBinding`] for a correlation
//! name and forwards the payload to every integration bound to it.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::config::SessionConfig;
use crate::error::{IntegrationError, IntegrationResult, RegistryResult, SellusResult};
use crate::notification::{Notification, NotificationKind};
use crate::provider::Provider;
use crate::registry::Registry;
use crate::stream::EventSender;
use crate::tester::Element;

/// An external notification sink.
///
/// # Example
///
/// ```rust
/// use sellus::{async_trait, Integration, IntegrationResult, Notification, Provider};
/// use std::any::Any;
///
/// #[derive(Debug)]
/// struct Stderr;
///
/// impl Provider for Stderr {
///     fn name(&self) -> &str { "stderr" }
///     fn as_any(&self) -> &dyn Any { self }
/// }
///
/// #[async_trait]
/// impl Integration<u32> for Stderr {
///     async fn notify_element(&self, test: &str, n: &Notification<u32>) -> IntegrationResult<()> {
///         eprintln!("[{}] {}", test, n.describe());
///         Ok(())
///     }
///
///     async fn notify_error(&self, test: &str, n: &Notification<u32>) -> IntegrationResult<()> {
///         eprintln!("[{}] {}", test, n.describe());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Integration<T: Element>: Provider {
    /// Called when a tester returned `false` for an element.
    async fn notify_element(&self, test: &str, notification: &Notification<T>)
        -> IntegrationResult<()>;

    /// Called when a tester raised while checking an element.
    async fn notify_error(&self, test: &str, notification: &Notification<T>)
        -> IntegrationResult<()>;
}

/// Description and routing for one correlation name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestBinding {
    /// Human-readable description placed in notifications.
    pub description: String,
    /// Integrations notified on failure, in order.
    pub integrations: Vec<String>,
}

/// Lookup table from correlation name to integrations.
pub struct IntegrationRegistry<T: Element> {
    integrations: Registry<dyn Integration<T>>,
    bindings: HashMap<String, TestBinding>,
}

impl<T: Element> IntegrationRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            integrations: Registry::new(),
            bindings: HashMap::new(),
        }
    }

    /// Build a registry from a session configuration.
    ///
    /// Every integration named by the configuration must be present in
    /// `integrations`.
    pub fn from_config(
        config: &SessionConfig,
        integrations: Vec<Box<dyn Integration<T>>>,
    ) -> SellusResult<Self> {
        let mut registry = Self::new();
        for integration in integrations {
            registry.add_integration(integration)?;
        }
        for test in &config.tests {
            registry.bind(
                test.name.clone(),
                test.description.clone(),
                test.integrations.iter().cloned(),
            )?;
        }
        Ok(registry)
    }

    /// Register an integration under its name.
    pub fn add_integration(&mut self, integration: Box<dyn Integration<T>>) -> RegistryResult<()> {
        debug!(integration = %integration.name(), "registering integration");
        self.integrations.register_unique(integration)
    }

    /// Bind a correlation name to a description and a list of integrations.
    ///
    /// Rebinding a name replaces its previous binding.
    pub fn bind<I, S>(
        &mut self,
        test: impl Into<String>,
        description: impl Into<String>,
        integrations: I,
    ) -> IntegrationResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let integrations: Vec<String> = integrations.into_iter().map(Into::into).collect();
        if let Some(missing) = integrations
            .iter()
            .find(|name| !self.integrations.contains(name))
        {
            return Err(IntegrationError::UnknownIntegration(missing.clone()));
        }
        self.bindings.insert(
            test.into(),
            TestBinding {
                description: description.into(),
                integrations,
            },
        );
        Ok(())
    }

    /// Binding for a correlation name.
    pub fn binding(&self, test: &str) -> IntegrationResult<&TestBinding> {
        self.bindings
            .get(test)
            .ok_or_else(|| IntegrationError::UnknownTest(test.to_string()))
    }

    /// Description for a correlation name.
    pub fn description(&self, test: &str) -> IntegrationResult<&str> {
        self.binding(test).map(|b| b.description.as_str())
    }

    /// Whether a binding exists for the correlation name.
    pub fn contains_test(&self, test: &str) -> bool {
        self.bindings.contains_key(test)
    }

    /// Registered integration by name.
    pub fn integration(&self, name: &str) -> Option<&dyn Integration<T>> {
        self.integrations.get(name)
    }

    /// Names of all registered integrations, in registration order.
    pub fn integration_names(&self) -> Vec<&str> {
        self.integrations.names()
    }

    /// Forward an element failure to every integration bound to `test`.
    pub async fn notify_element(
        &self,
        test: &str,
        notification: &Notification<T>,
    ) -> IntegrationResult<()> {
        self.notify(test, notification, NotificationKind::Element)
            .await
    }

    /// Forward a raised error to every integration bound to `test`.
    pub async fn notify_error(
        &self,
        test: &str,
        notification: &Notification<T>,
    ) -> IntegrationResult<()> {
        self.notify(test, notification, NotificationKind::Error).await
    }

    async fn notify(
        &self,
        test: &str,
        notification: &Notification<T>,
        kind: NotificationKind,
    ) -> IntegrationResult<()> {
        let binding = self.binding(test)?;
        let mut first_error = None;

        for name in &binding.integrations {
            let integration = self
                .integrations
                .get(name)
                .ok_or_else(|| IntegrationError::UnknownIntegration(name.clone()))?;
            let result = match kind {
                NotificationKind::Element => integration.notify_element(test, notification).await,
                NotificationKind::Error => integration.notify_error(test, notification).await,
            };
            if let Err(err) = result {
                error!(test, integration = %name, %kind, error = %err, "notification failed");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<T: Element> Default for IntegrationRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> fmt::Debug for IntegrationRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationRegistry")
            .field("integrations", &self.integrations.names())
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// A notification as forwarded by [`ChannelIntegration`].
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationEvent<T> {
    /// Entry point the notification arrived through.
    pub kind: NotificationKind,
    /// Correlation name.
    pub test: String,
    /// The payload.
    pub notification: Notification<T>,
}

/// Integration that forwards every notification onto an [`EventSender`].
///
/// Pair it with [`create_stream`](crate::create_stream) to consume failures
/// as a stream in another task.
pub struct ChannelIntegration<T> {
    name: String,
    sender: EventSender<IntegrationEvent<T>>,
}

impl<T: Element> ChannelIntegration<T> {
    /// Create a channel integration.
    pub fn new(name: impl Into<String>, sender: EventSender<IntegrationEvent<T>>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }

    async fn forward(
        &self,
        kind: NotificationKind,
        test: &str,
        notification: &Notification<T>,
    ) -> IntegrationResult<()> {
        let event = IntegrationEvent {
            kind,
            test: test.to_string(),
            notification: notification.clone(),
        };
        self.sender
            .send(event)
            .await
            .map_err(|_| IntegrationError::DeliveryFailed {
                integration: self.name.clone(),
                message: "receiver dropped".to_string(),
            })
    }
}

impl<T> fmt::Debug for ChannelIntegration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelIntegration")
            .field("name", &self.name)
            .field("sender", &self.sender)
            .finish()
    }
}

impl<T: Element> Provider for ChannelIntegration<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl<T: Element> Integration<T> for ChannelIntegration<T> {
    async fn notify_element(
        &self,
        test: &str,
        notification: &Notification<T>,
    ) -> IntegrationResult<()> {
        self.forward(NotificationKind::Element, test, notification)
            .await
    }

    async fn notify_error(
        &self,
        test: &str,
        notification: &Notification<T>,
    ) -> IntegrationResult<()> {
        self.forward(NotificationKind::Error, test, notification)
            .await
    }
}
