use std::process::ExitCode;

use ocr_provision::{Components, ProvisionConfig, Provisioner};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ocr_provision=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ProvisionConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        ProvisionConfig::default()
    });

    let components = match Components::system(&config) {
        Ok(components) => components,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(e.kind.exit_code().max(1));
        }
    };

    let outcome = Provisioner::new(config, components).run().await;
    ExitCode::from(outcome.exit_code())
}
