//! Turning tester outcomes into notifications.

use tracing::{debug, error, warn};

use crate::error::{IntegrationError, IntegrationResult, TesterError};
use crate::integration::IntegrationRegistry;
use crate::notification::Notification;
use crate::tester::{Element, GuardedTester, Outcome};

/// Runs guarded testers and forwards failures to their integrations.
#[derive(Debug)]
pub struct Dispatcher<'a, T: Element> {
    integrations: &'a IntegrationRegistry<T>,
    verbose: bool,
}

impl<'a, T: Element> Dispatcher<'a, T> {
    /// Create a dispatcher over an integration registry.
    pub fn new(integrations: &'a IntegrationRegistry<T>) -> Self {
        Self {
            integrations,
            verbose: false,
        }
    }

    /// Log passing checks at debug level as well.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check one element with one tester and notify on failure.
    ///
    /// The tester's correlation name must be bound in the integration
    /// registry; an unbound name is reported as
    /// [`IntegrationError::UnknownTest`](crate::IntegrationError::UnknownTest)
    /// before the tester runs.
    ///
    /// When an integration fails to deliver an element notification, the
    /// delivery error is attached as [`TesterError::Delivery`] and the payload
    /// goes to `notify_error` instead. Only a lookup failure or a failed
    /// `notify_error` is returned as `Err`.
    pub async fn dispatch(
        &self,
        tester: &GuardedTester<T>,
        element: &T,
    ) -> IntegrationResult<Outcome> {
        let test = tester.test_name();
        let description = self.integrations.description(test)?;
        let outcome = tester.check(element);

        match &outcome {
            Outcome::Passed => {
                if self.verbose {
                    debug!(test, tester = %tester.tester_name(), ?element, "check passed");
                }
            }
            Outcome::Failed => {
                warn!(test, tester = %tester.tester_name(), ?element, "check failed");
                let notification =
                    Notification::new(description, tester.tester_name(), element.clone());
                match self.integrations.notify_element(test, &notification).await {
                    Ok(()) => {}
                    Err(err @ IntegrationError::UnknownTest(_)) => return Err(err),
                    Err(err) => {
                        error!(test, error = %err, "element notification not delivered");
                        let notification =
                            notification.with_error(TesterError::Delivery(err.to_string()));
                        self.integrations.notify_error(test, &notification).await?;
                    }
                }
            }
            Outcome::Raised(err) => {
                warn!(
                    test,
                    tester = %tester.tester_name(),
                    ?element,
                    error = %err,
                    "tester raised"
                );
                let notification =
                    Notification::new(description, tester.tester_name(), element.clone())
                        .with_error(err.clone());
                self.integrations.notify_error(test, &notification).await?;
            }
        }

        Ok(outcome)
    }

    /// Run every tester in order against one element.
    ///
    /// Stops at the first error [`dispatch`](Self::dispatch) returns.
    pub async fn dispatch_all(
        &self,
        testers: &[GuardedTester<T>],
        element: &T,
    ) -> IntegrationResult<Vec<Outcome>> {
        let mut outcomes = Vec::with_capacity(testers.len());
        for tester in testers {
            outcomes.push(self.dispatch(tester, element).await?);
        }
        Ok(outcomes)
    }
}
