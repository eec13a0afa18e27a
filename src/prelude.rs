//! Prelude module for convenient imports.
//!
//! ```rust
//! use sellus::prelude::*;
//! ```

// Configuration
pub use crate::config::{
    Config, ConfigBuilder, FileConfig, MergeableConfig, SessionConfig, TestConfig,
};

// Registration and checking
pub use crate::registrar::{declaration, Declaration, TesterRegistry};
pub use crate::tester::{tester, try_tester, Element, Outcome, Tester};

// Integrations
pub use crate::integration::{ChannelIntegration, Integration, IntegrationRegistry};
pub use crate::notification::{Notification, NotificationKind};
pub use crate::provider::{Provider, ProviderExt};

// Sessions and streams
pub use crate::session::{RunReport, Session};
pub use crate::stream::{
    create_stream, EventSender, EventStream, EventStreamExt, StreamBuilder, StreamHandle,
};

// Errors
pub use crate::error::{
    IntegrationError, IntegrationResult, SellusError, SellusResult, TesterError,
};

pub use async_trait::async_trait;
