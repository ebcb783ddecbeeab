use anyhow::Context;
use captioner_api::{config::ApiConfig, startup::Application};
use captioner_config::load_config;
use captioner_telemetry::init_tracing;
use std::env;
use tracing::info;

/// Environment variable overriding the configured listen port.
const PORT_ENV_NAME: &str = "PORT";

fn main() -> anyhow::Result<()> {
    let _log_flusher = init_tracing()?;

    // We start the runtime.
    actix_web::rt::System::new().block_on(async_main())?;

    Ok(())
}

async fn async_main() -> anyhow::Result<()> {
    let mut config = load_config::<ApiConfig>()?;

    if let Ok(port) = env::var(PORT_ENV_NAME) {
        config.application.port = port
            .parse()
            .with_context(|| format!("{PORT_ENV_NAME} must be a valid port number"))?;
    }

    info!(
        "starting captioner api with settings:\n{}",
        config.application
    );

    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
