use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use std::env;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;
mod dispatcher;
mod error;
mod handler;
mod normalizer;

use config::{ForwarderConfig, LogLevel};
use handler::{forward_file, function_handler};

fn init_logging(log_level: LogLevel) -> Result<(), Error> {
    let env_filter = format!(
        "h2=off,hyper=off,rustls=off,{}",
        log_level.as_filter_directive()
    );

    // The Lambda log stream already timestamps every line
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_new(env_filter)?)
        .with_level(true)
        .with_target(false)
        .without_time()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Configuration is read once per container lifecycle
    let config = ForwarderConfig::from_env()?;
    init_logging(config.log_level)?;
    debug!("Loaded configuration: {:?}", config);

    // Local replay: forward a JSON file instead of serving invocations
    if let Some(path) = env::args().nth(1) {
        forward_file(path, &config).await?;
        return Ok(());
    }

    let config = &config;
    run(service_fn(move |event: LambdaEvent<Value>| async move {
        function_handler(event, config).await
    }))
    .await
}
