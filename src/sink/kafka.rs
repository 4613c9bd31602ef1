//! Message sink path: nested JSON messages produced to Kafka
//!
//! Every mutation call is projected to a `{"method", "data"}` message and
//! queued locally, keyed by the instance's identity value and addressed to
//! the entity type's topic. A commit submits the queue in order without
//! waiting for acknowledgments; delivery results are logged as they arrive
//! and never fail the commit. Closing the target waits for every pending
//! acknowledgment before releasing the producer.

use crate::config::{KafkaTargetConfig, PARAM_PROPERTIES_FILE};
use crate::error::{Error, Result};
use crate::project::to_tree;
use crate::record::Record;
use crate::sink::{Operation, ParameterKind, ParameterSpec, Target};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use serde_json::json;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

struct QueuedMessage {
    topic: String,
    key: Option<String>,
    payload: String,
}

/// The Kafka target adapter.
pub struct KafkaTarget {
    producer: FutureProducer,
    queue: Vec<QueuedMessage>,
    deliveries: JoinSet<()>,
}

impl std::fmt::Debug for KafkaTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaTarget")
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl KafkaTarget {
    /// Create a producer from the configured properties.
    ///
    /// `bootstrap.servers` is required; `acks` defaults to `all`. All other
    /// properties are forwarded to the client verbatim.
    pub fn new(config: &KafkaTargetConfig) -> Result<Self> {
        if !config.properties.contains_key("bootstrap.servers") {
            return Err(Error::missing_parameter("bootstrap.servers"));
        }

        let mut properties = config.properties.clone();
        properties
            .entry("acks".to_string())
            .or_insert_with(|| "all".to_string());

        let mut client_config = ClientConfig::new();
        info!("Used properties for the Kafka producer:");
        for (key, value) in &properties {
            client_config.set(key, value);
            info!("{key}={value}");
        }

        let producer: FutureProducer = client_config.create()?;
        Ok(Self {
            producer,
            queue: Vec::new(),
            deliveries: JoinSet::new(),
        })
    }

    /// Set up from a raw parameter map naming a properties file.
    pub fn from_params(params: &std::collections::HashMap<String, String>) -> Result<Self> {
        let config = KafkaTargetConfig::from_params(params)?;
        Self::new(&config)
    }

    /// Number of messages queued for the next commit.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

/// Build the message body for one change event.
pub(crate) fn message_payload(op: Operation, record: &Record) -> Result<String> {
    let body = json!({
        "method": op.as_str(),
        "data": to_tree(record),
    });
    Ok(serde_json::to_string_pretty(&body)?)
}

/// Delivery key: the identity value as text, or no key when absent.
pub(crate) fn message_key(record: &Record) -> Option<String> {
    record.identity().map(|isn| isn.to_string())
}

#[async_trait]
impl Target for KafkaTarget {
    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ParameterSpec::new(
            PARAM_PROPERTIES_FILE,
            "Properties File",
            ParameterKind::File,
        )]
    }

    async fn on_mutation(
        &mut self,
        op: Operation,
        entity_type: &str,
        record: Record,
    ) -> Result<()> {
        let message = QueuedMessage {
            topic: entity_type.to_string(),
            key: message_key(&record),
            payload: message_payload(op, &record)?,
        };
        debug!(%op, entity_type, key = message.key.as_deref(), "queued message");
        self.queue.push(message);
        Ok(())
    }

    async fn on_commit(&mut self, _transaction_id: &str) -> Result<()> {
        for message in self.queue.drain(..) {
            let mut record: FutureRecord<'_, String, String> =
                FutureRecord::to(&message.topic).payload(&message.payload);
            if let Some(key) = &message.key {
                record = record.key(key);
            }

            // Submit without waiting for the acknowledgment; the result is
            // logged from a detached task and never fails the commit.
            match self.producer.send_result(record) {
                Ok(delivery) => {
                    let topic = message.topic.clone();
                    self.deliveries.spawn(async move {
                        match delivery.await {
                            Ok(Ok((partition, offset))) => {
                                debug!(%topic, partition, offset, "record delivered");
                            }
                            Ok(Err((e, _message))) => {
                                error!(%topic, error = %e, "record delivery failed");
                            }
                            Err(_canceled) => {
                                error!(%topic, "producer dropped before acknowledgment");
                            }
                        }
                    });
                }
                Err((e, _record)) => {
                    error!(topic = %message.topic, error = %e, "failed to enqueue record");
                }
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        while self.deliveries.join_next().await.is_some() {}
        self.producer.flush(Timeout::After(Duration::from_secs(30)))?;
        Ok(())
    }
}
