use crate::config::ForwarderConfig;
use crate::dispatcher::dispatch;
use crate::error::ForwarderError;
use crate::normalizer::normalize;
use lambda_runtime::{Error, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Serialize, PartialEq)]
pub struct ForwardResponse {
    status: &'static str,
    records_posted: usize,
}

impl ForwardResponse {
    fn success(records_posted: usize) -> Self {
        Self { status: "Success", records_posted }
    }
}

// Normalize (when enabled) then batch and post
pub async fn forward(raw: &[u8], config: &ForwarderConfig) -> Result<usize, ForwarderError> {
    let body = if config.streaming_conversion_enabled {
        normalize(raw)?
    } else {
        Cow::Borrowed(raw)
    };
    dispatch(config, &body).await
}

// Main Lambda handler - one payload in, one delivery count out
pub async fn function_handler(
    event: LambdaEvent<Value>,
    config: &ForwarderConfig,
) -> Result<ForwardResponse, Error> {
    let raw = serde_json::to_vec(&event.payload)?;
    info!(
        "function: {} / request: {} / event payload bytes: {} / sending to sumologic: {} / batch size: {} / logging level: {}",
        event.context.env_config.function_name,
        event.context.request_id,
        raw.len(),
        config.send_enabled,
        config.max_records_per_post,
        config.log_level,
    );

    match forward(&raw, config).await {
        Ok(records_posted) => Ok(ForwardResponse::success(records_posted)),
        Err(err) => {
            error!("Error in handler: {err}");
            Err(err.into())
        }
    }
}

// Replays a JSON file through the dispatcher, bypassing envelope conversion
pub async fn forward_file(path: impl AsRef<Path>, config: &ForwarderConfig) -> Result<usize, Error> {
    let path = path.as_ref();
    info!("testing {}", path.display());

    let contents = tokio::fs::read(path).await?;
    let data: Value = serde_json::from_slice(&contents).map_err(|source| ForwarderError::Parse {
        stage: "file",
        source,
    })?;
    let records_posted = dispatch(config, &serde_json::to_vec(&data)?).await?;
    info!("records posted / {records_posted}");
    Ok(records_posted)
}
