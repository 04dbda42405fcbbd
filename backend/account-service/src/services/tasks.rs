/// Async task dispatch for background cascades
use crate::error::{LifecycleError, Result};
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;
use tracing::warn;

/// Queue interface for work that outlives the request.
///
/// Only the deletion flow uses it today, to cascade removal of the user's
/// profile document. Retries on failure are the consumer's responsibility.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, task: &str, payload: serde_json::Value) -> Result<()>;
}

/// Kafka-backed task queue.
#[derive(Clone)]
pub struct KafkaTaskQueue {
    producer: FutureProducer,
    topic: String,
}

impl KafkaTaskQueue {
    /// Create a new Kafka task queue.
    ///
    /// ## Arguments
    ///
    /// * `brokers` - Comma-separated list of Kafka brokers
    /// * `topic` - Topic task payloads are published to
    pub fn new(brokers: &str, topic: &str) -> Result<Self> {
        let producer = rdkafka::config::ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("client.id", "account-service")
            .create::<FutureProducer>()
            .map_err(|e| {
                LifecycleError::Internal(format!("Failed to create Kafka producer: {}", e))
            })?;

        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl TaskQueue for KafkaTaskQueue {
    async fn enqueue(&self, task: &str, payload: serde_json::Value) -> Result<()> {
        let message = serde_json::json!({
            "task": task,
            "payload": payload,
        })
        .to_string();

        self.producer
            .send(
                FutureRecord::to(&self.topic).key(task).payload(&message),
                Duration::from_secs(5),
            )
            .await
            .map_err(|(e, _)| {
                LifecycleError::Internal(format!("Failed to enqueue task {}: {}", task, e))
            })?;

        Ok(())
    }
}

/// Fallback queue used when Kafka is not configured (development only).
///
/// Tasks are logged and dropped; nothing downstream will pick them up.
#[derive(Clone, Default)]
pub struct LogOnlyTaskQueue;

#[async_trait]
impl TaskQueue for LogOnlyTaskQueue {
    async fn enqueue(&self, task: &str, payload: serde_json::Value) -> Result<()> {
        warn!(task, %payload, "task queue not configured; dropping task");
        Ok(())
    }
}
