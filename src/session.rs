//! Checking sessions.
//!
//! A [`Session`] owns the stream-to-testers table, the integration registry
//! and the configuration of one independent run. It subscribes to element
//! sources and feeds every element through the testers registered for its
//! stream.

use std::ops::AddAssign;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::{Config, SessionConfig};
use crate::dispatch::Dispatcher;
use crate::error::SellusResult;
use crate::integration::IntegrationRegistry;
use crate::registrar::{StreamTesters, TesterRegistry};
use crate::stream::{EventStream, EventStreamExt, StreamHandle};
use crate::tester::{Element, Outcome};

/// Counters collected over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Elements received from all sources
    pub elements: u64,
    /// Tester invocations
    pub checks: u64,
    /// Checks that passed
    pub passed: u64,
    /// Checks whose predicate returned `false`
    pub failed: u64,
    /// Checks whose tester raised
    pub errors: u64,
}

impl RunReport {
    /// Whether every check passed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    fn record(&mut self, outcome: &Outcome) {
        self.checks += 1;
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Raised(_) => self.errors += 1,
        }
    }
}

impl AddAssign for RunReport {
    fn add_assign(&mut self, other: Self) {
        self.elements += other.elements;
        self.checks += other.checks;
        self.passed += other.passed;
        self.failed += other.failed;
        self.errors += other.errors;
    }
}

/// One independent checking session.
#[derive(Debug)]
pub struct Session<T: Element> {
    testers: StreamTesters<T>,
    integrations: IntegrationRegistry<T>,
    config: SessionConfig,
}

impl<T: Element> Session<T> {
    /// Assemble a session.
    ///
    /// The configuration is validated. Correlation names with no integration
    /// binding are logged; they fail only when one of their testers runs.
    pub fn new(
        registry: TesterRegistry<T>,
        integrations: IntegrationRegistry<T>,
        config: SessionConfig,
    ) -> SellusResult<Self> {
        config.validate()?;
        let session = Self {
            testers: registry.into_table(),
            integrations,
            config,
        };
        for name in session.unbound_tests() {
            warn!(
                session = %session.config.name(),
                test = name,
                "no integration binding for test"
            );
        }
        Ok(session)
    }

    /// Correlation names used by testers that have no integration binding.
    pub fn unbound_tests(&self) -> Vec<&str> {
        self.testers
            .test_names()
            .into_iter()
            .filter(|name| !self.integrations.contains_test(name))
            .collect()
    }

    /// The stream-to-testers table.
    pub fn testers(&self) -> &StreamTesters<T> {
        &self.testers
    }

    /// The integration registry.
    pub fn integrations(&self) -> &IntegrationRegistry<T> {
        &self.integrations
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn dispatcher(&self) -> Dispatcher<'_, T> {
        Dispatcher::new(&self.integrations).verbose(self.config.is_verbose())
    }

    /// Run one element through every tester registered for `stream`.
    pub async fn check_element(
        &self,
        stream: &StreamHandle,
        element: &T,
    ) -> SellusResult<RunReport> {
        let mut report = RunReport {
            elements: 1,
            ..RunReport::default()
        };
        let outcomes = self
            .dispatcher()
            .dispatch_all(self.testers.testers(stream), element)
            .await?;
        for outcome in &outcomes {
            report.record(outcome);
        }
        Ok(report)
    }

    /// Subscribe to every source and check each element until all end.
    ///
    /// Per-source element order is preserved; the interleaving across
    /// sources is unspecified. A notification an integration fails to deliver
    /// is rerouted to `notify_error` and the run continues; only an unbound
    /// correlation name or a failed `notify_error` aborts the run. Sources
    /// whose handle has no testers are skipped.
    pub async fn run<I>(&self, sources: I) -> SellusResult<RunReport>
    where
        I: IntoIterator<Item = (StreamHandle, EventStream<T>)>,
    {
        let span = info_span!("session", name = %self.config.name());
        async move {
            let mut subscribed = Vec::new();
            for (handle, source) in sources {
                if !self.testers.contains(&handle) {
                    warn!(stream = %handle, "no testers registered, skipping source");
                    continue;
                }
                debug!(stream = %handle, "subscribing");
                subscribed.push(
                    source
                        .map(move |element| (handle.clone(), element))
                        .into_event_stream(),
                );
            }

            let mut merged = stream::select_all(subscribed);
            let mut report = RunReport::default();
            while let Some((handle, element)) = merged.next().await {
                report += self.check_element(&handle, &element).await?;
            }

            info!(
                elements = report.elements,
                checks = report.checks,
                failed = report.failed,
                errors = report.errors,
                "run complete"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigBuilder, TestConfig};
    use crate::error::{IntegrationError, SellusError};
    use crate::integration::{ChannelIntegration, IntegrationEvent};
    use crate::registrar::declaration;
    use crate::stream::create_stream;
    use crate::tester::tester;

    fn config() -> SessionConfig {
        SessionConfig::builder("unit")
            .test(
                TestConfig::new("pscheck_levels", "Levels stay in range")
                    .with_integration("memory"),
            )
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_counts_every_check() {
        let levels = StreamHandle::new("levels");
        let captured = levels.clone();
        let mut registry = TesterRegistry::<u8>::new();
        registry.register(vec![declaration("pscheck_levels", move |r| {
            r.expect_here(&captured)
                .unwrap()
                .tester(tester("below_90", |n: &u8| *n < 90))
                .tester(tester("above_10", |n: &u8| *n > 10));
        })]);

        let (sender, events) = create_stream::<IntegrationEvent<u8>>();
        let integrations = IntegrationRegistry::<u8>::from_config(
            &config(),
            vec![Box::new(ChannelIntegration::new("memory", sender))],
        )
        .unwrap();
        let session = Session::new(registry, integrations, config()).unwrap();
        assert!(session.unbound_tests().is_empty());

        let source: EventStream<u8> = Box::pin(futures::stream::iter(vec![50, 95, 5]));
        let report = session.run(vec![(levels, source)]).await.unwrap();

        assert_eq!(
            report,
            RunReport {
                elements: 3,
                checks: 6,
                passed: 4,
                failed: 2,
                errors: 0,
            }
        );
        assert!(!report.is_clean());
        drop(session);
        assert_eq!(events.collect::<Vec<_>>().await.len(), 2);
    }

    #[tokio::test]
    async fn test_run_skips_untested_sources() {
        let (sender, _events) = create_stream::<IntegrationEvent<u8>>();
        let integrations = IntegrationRegistry::<u8>::from_config(
            &config(),
            vec![Box::new(ChannelIntegration::new("memory", sender))],
        )
        .unwrap();
        let session = Session::new(TesterRegistry::new(), integrations, config()).unwrap();

        let source: EventStream<u8> = Box::pin(futures::stream::iter(vec![1, 2, 3]));
        let report = session
            .run(vec![(StreamHandle::new("orphan"), source)])
            .await
            .unwrap();
        assert_eq!(report, RunReport::default());
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_run_propagates_unknown_test() {
        let stream = StreamHandle::new("levels");
        let mut registry = TesterRegistry::<u8>::new();
        registry
            .expect("pscheck_unbound", &stream)
            .tester(tester("any", |_: &u8| true));

        let session =
            Session::new(registry, IntegrationRegistry::new(), SessionConfig::new()).unwrap();
        assert_eq!(session.unbound_tests(), vec!["pscheck_unbound"]);

        let source: EventStream<u8> = Box::pin(futures::stream::iter(vec![1]));
        let result = session.run(vec![(stream, source)]).await;
        assert!(matches!(
            result,
            Err(SellusError::Integration(IntegrationError::UnknownTest(_)))
        ));
    }

    #[test]
    fn test_report_add_assign() {
        let mut total = RunReport::default();
        total += RunReport {
            elements: 1,
            checks: 2,
            passed: 1,
            failed: 1,
            errors: 0,
        };
        total += RunReport {
            elements: 1,
            checks: 2,
            passed: 1,
            failed: 0,
            errors: 1,
        };
        assert_eq!(total.checks, 4);
        assert_eq!(total.failed, 1);
        assert_eq!(total.errors, 1);
    }
}
