/// Service layer for the account service
///
/// External collaborators behind narrow interfaces:
/// - Email notifier (SMTP, no-op mode when unconfigured)
/// - Async task queue (Kafka, log-only mode when unconfigured)
pub mod email;
pub mod tasks;

pub use email::{EmailService, Notifier};
pub use tasks::{KafkaTaskQueue, LogOnlyTaskQueue, TaskQueue};
