//! # Sellus
//!
//! **Sellus** attaches behavioral testers to the elements of async streams and
//! routes failing checks to pluggable integrations.
//!
//! ## Overview
//!
//! - **Registrar**: declarations attach named testers to a [`StreamHandle`]
//!   under a correlation name.
//! - **Guard**: every tester is wrapped once in a [`GuardedTester`] that turns
//!   `false`, `Err` and panics into an explicit [`Outcome`].
//! - **Dispatch**: failures become [`Notification`]s forwarded to the
//!   integrations bound to the correlation name.
//! - **Session**: owns one registry, one integration table and one
//!   configuration, and drives element sources through the testers.
//!
//! Streams themselves and notification delivery are external: sources are
//! plain [`futures_core::Stream`]s and sinks implement [`Integration`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sellus::prelude::*;
//!
//! let temperature = StreamHandle::new("temperature");
//! let t = temperature.clone();
//!
//! let mut registry = TesterRegistry::<f64>::new();
//! registry.register(vec![declaration("pscheck_boiler", move |r| {
//!     r.expect_here(&t)
//!         .unwrap()
//!         .tester(tester("below_boiling", |c: &f64| *c < 100.0));
//! })]);
//!
//! let config = SessionConfig::from_file(Path::new("sellus.toml"))?;
//! let integrations = IntegrationRegistry::from_config(&config, vec![Box::new(MySink)])?;
//! let session = Session::new(registry, integrations, config)?;
//!
//! let report = session.run(vec![(temperature, readings)]).await?;
//! ```

mod config;
mod dispatch;
mod error;
mod integration;
mod notification;
mod provider;
mod registrar;
mod registry;
mod session;
mod stream;
mod tester;

pub mod prelude;

pub use config::{
    Config, ConfigBuilder, FileConfig, MergeableConfig, SessionConfig, SessionConfigBuilder,
    TestConfig,
};
pub use dispatch::Dispatcher;
pub use error::{
    ConfigError, ConfigResult, IntegrationError, IntegrationResult, RegistryError,
    RegistryResult, SellusError, SellusResult, TesterError,
};
pub use integration::{
    ChannelIntegration, Integration, IntegrationEvent, IntegrationRegistry, TestBinding,
};
pub use notification::{Notification, NotificationKind};
pub use provider::{Provider, ProviderExt};
pub use registrar::{declaration, Declaration, Expectation, StreamTesters, TesterRegistry};
pub use registry::Registry;
pub use session::{RunReport, Session};
pub use stream::{
    create_stream, EventSender, EventStream, EventStreamExt, StreamBuilder, StreamHandle,
};
pub use tester::{
    tester, try_tester, Element, FallibleFnTester, FnTester, GuardedTester, Outcome, Tester,
};

// Re-export async-trait for integration implementors
pub use async_trait::async_trait;
