use crate::config::{ForwarderConfig, OutputMode};
use crate::error::ForwarderError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

const POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Parses a payload into its event list. A top-level array is the list; any
/// other value becomes a one-element list.
pub fn parse_events(body: &[u8]) -> Result<Vec<Value>, ForwarderError> {
    let parsed: Value = serde_json::from_slice(body).map_err(|source| ForwarderError::Parse {
        stage: "dispatch",
        source,
    })?;

    Ok(match parsed {
        Value::Array(events) => events,
        single => vec![single],
    })
}

/// Consecutive, order-preserving batches of at most `max_records` events.
/// Only the last batch may be short; an empty list yields no batches.
pub fn batches(events: &[Value], max_records: usize) -> impl Iterator<Item = &[Value]> {
    events.chunks(max_records.max(1))
}

/// Renders a batch as the POST body.
pub fn serialize_batch(batch: &[Value], mode: OutputMode) -> Result<String, ForwarderError> {
    match mode {
        OutputMode::Multiline => {
            let mut body = String::new();
            for event in batch {
                body.push_str(&serde_json::to_string(event).map_err(ForwarderError::Serialize)?);
                body.push('\n');
            }
            Ok(body)
        }
        OutputMode::Array => serde_json::to_string(batch).map_err(ForwarderError::Serialize),
    }
}

/// Posts batches of events to the configured endpoint.
///
/// Owns the connection pool for one invocation; connections are released when
/// the dispatcher is dropped.
pub struct Dispatcher<'a> {
    config: &'a ForwarderConfig,
    client: Client,
}

impl<'a> Dispatcher<'a> {
    pub fn new(config: &'a ForwarderConfig) -> Result<Self, ForwarderError> {
        let client = Client::builder()
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .build()?;
        Ok(Self { config, client })
    }

    /// Sends `body` in batches and returns the number of records posted.
    ///
    /// Stops at the first non-200 response; later batches are never sent.
    /// With sending disabled every batch is skipped and the count is 0.
    pub async fn dispatch(&self, body: &[u8]) -> Result<usize, ForwarderError> {
        let events = parse_events(body)?;
        let mut records_posted = 0;

        for (index, batch) in batches(&events, self.config.max_records_per_post).enumerate() {
            if !self.config.send_enabled {
                debug!("Sending disabled, skipping batch {index} of {} records", batch.len());
                continue;
            }

            let payload = serialize_batch(batch, self.config.output_mode)?;
            self.post(index, payload).await?;
            records_posted += batch.len();
        }

        info!("records posted / {records_posted}");
        Ok(records_posted)
    }

    async fn post(&self, index: usize, payload: String) -> Result<(), ForwarderError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ForwarderError::Delivery { status, body });
        }

        debug!("Batch {index} accepted");
        Ok(())
    }
}

/// Convenience wrapper: one dispatcher, one payload.
pub async fn dispatch(config: &ForwarderConfig, body: &[u8]) -> Result<usize, ForwarderError> {
    Dispatcher::new(config)?.dispatch(body).await
}
