//! Example: watching a thermostat feed with Sellus
//!
//! Two declarations attach testers to a temperature stream and a setpoint
//! stream. Failures are routed to a logging integration configured in TOML.
//!
//! Run with `RUST_LOG=debug cargo run --example thermostat` to see every check.

use std::any::Any;

use sellus::prelude::*;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
name = "thermostat"
verbose = true

[[tests]]
name = "pscheck_temperature"
description = "Room temperature stays comfortable"
integrations = ["log"]

[[tests]]
name = "pscheck_setpoint"
description = "Setpoint is a sane number"
integrations = ["log"]
"#;

/// Integration that writes failures to the tracing log.
#[derive(Debug)]
struct LogIntegration;

impl Provider for LogIntegration {
    fn name(&self) -> &str {
        "log"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl Integration<f64> for LogIntegration {
    async fn notify_element(&self, test: &str, n: &Notification<f64>) -> IntegrationResult<()> {
        tracing::warn!(test, "{}", n.describe());
        Ok(())
    }

    async fn notify_error(&self, test: &str, n: &Notification<f64>) -> IntegrationResult<()> {
        tracing::error!(test, "{}", n.describe());
        Ok(())
    }
}

fn comfortable(c: &f64) -> bool {
    (18.0..=26.0).contains(c)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sellus=info".parse()?))
        .init();

    let temperature = StreamHandle::new("temperature");
    let setpoint = StreamHandle::new("setpoint");
    let (t, s) = (temperature.clone(), setpoint.clone());

    let mut registry = TesterRegistry::<f64>::new();
    registry.register(vec![
        declaration("pscheck_temperature", move |r| {
            r.expect_here(&t)
                .expect("inside a declaration")
                .tester(tester("comfortable", comfortable))
                .tester(tester("is_reading", |c: &f64| c.is_finite()));
        }),
        declaration("pscheck_setpoint", move |r| {
            r.expect_here(&s)
                .expect("inside a declaration")
                .tester(try_tester("within_dial", |c: &f64| {
                    if c.is_nan() {
                        Err("setpoint is NaN")
                    } else {
                        Ok((5.0..=35.0).contains(c))
                    }
                }));
        }),
    ]);

    let config = SessionConfig::from_toml_str(CONFIG)?;
    let integrations =
        IntegrationRegistry::<f64>::from_config(&config, vec![Box::new(LogIntegration)])?;
    let session = Session::new(registry, integrations, config)?;

    let (temp_tx, temp_rx) = create_stream::<f64>();
    let (set_tx, set_rx) = create_stream::<f64>();
    tokio::spawn(async move {
        for reading in [21.0, 22.5, 30.1, f64::INFINITY, 19.0] {
            let _ = temp_tx.send(reading).await;
        }
    });
    tokio::spawn(async move {
        for value in [21.0, 40.0, f64::NAN] {
            let _ = set_tx.send(value).await;
        }
    });

    let report = session
        .run(vec![(temperature, temp_rx), (setpoint, set_rx)])
        .await?;

    println!(
        "checked {} elements: {} passed, {} failed, {} errors",
        report.elements, report.passed, report.failed, report.errors
    );
    Ok(())
}
