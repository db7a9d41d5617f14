//! Run notifications

use crate::config::NotificationsConfig;
use crate::domain::{EntityMapping, Result, RetrieverError};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sns::config::Credentials;
use aws_sdk_sns::error::DisplayErrorContext;
use chrono::{DateTime, Local};

/// Subject line of every run notification
pub const NOTIFICATION_SUBJECT: &str = "Data Retriever Service";

/// Build the pipeline report sent at the end of a run
///
/// # Example
///
/// ```
/// use chrono::{Local, TimeZone};
/// use data_retriever::core::notify::build_notification_message;
///
/// let at = Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
/// let message = build_notification_message(false, &[], "ICDC", at);
/// assert!(message.starts_with("❌ Data Retriever Service Pipeline Report for 'ICDC'"));
/// assert!(message.contains("Time: 2024-05-01 12:30:00"));
/// ```
pub fn build_notification_message(
    success: bool,
    mappings: &[EntityMapping],
    project: &str,
    timestamp: DateTime<Local>,
) -> String {
    let icon = if success { "✅" } else { "❌" };
    let mut message = format!(
        "{icon} Data Retriever Service Pipeline Report for '{project}'\nTime: {}\n\n",
        timestamp.format("%Y-%m-%d %H:%M:%S")
    );

    if success {
        let links: usize = mappings.iter().map(EntityMapping::link_count).sum();
        message.push_str(&format!(
            "🎯 Success: Found CRDC dataset links for {} entities in project '{project}'.\n",
            mappings.len()
        ));
        message.push_str(&format!("🔗 Total CRDC Links Retrieved: {links}"));
    } else {
        message.push_str(
            "🚨 The pipeline encountered an error. Please check the logs for more details.",
        );
    }

    message
}

/// Delivers run notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message
    async fn notify(&self, subject: &str, message: &str) -> Result<()>;
}

/// Region used when the notifications section names none
pub const DEFAULT_REGION: &str = "us-east-1";

/// Notifier that writes the message to the log
///
/// Used when no `[notifications]` section is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subject: &str, message: &str) -> Result<()> {
        tracing::warn!("SNS topics not configured for notifications!");
        tracing::info!(subject = %subject, "{message}");
        Ok(())
    }
}

/// Publishes run notifications to an SNS topic
#[derive(Debug, Clone)]
pub struct SnsNotifier {
    client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl SnsNotifier {
    /// Create a notifier for the configured topic
    ///
    /// `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY` must be set.
    pub async fn new(config: &NotificationsConfig) -> Result<Self> {
        let access_key_id = non_empty_env("AWS_ACCESS_KEY_ID");
        let secret_access_key = non_empty_env("AWS_SECRET_ACCESS_KEY");
        let (Some(access_key_id), Some(secret_access_key)) = (access_key_id, secret_access_key)
        else {
            return Err(RetrieverError::Notification(
                "Missing AWS credentials in environment variables".to_string(),
            ));
        };

        let region = config.region.as_deref().unwrap_or(DEFAULT_REGION).to_string();
        tracing::debug!(topic_arn = %config.topic_arn, region = %region, "Initializing SNS client");

        let credentials =
            Credentials::new(access_key_id, secret_access_key, None, None, "environment");
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region))
            .credentials_provider(credentials)
            .load()
            .await;

        Ok(Self::with_client(aws_sdk_sns::Client::new(&sdk_config), &config.topic_arn))
    }

    /// Wrap an existing SNS client
    pub fn with_client(client: aws_sdk_sns::Client, topic_arn: impl Into<String>) -> Self {
        Self {
            client,
            topic_arn: topic_arn.into(),
        }
    }

    /// Topic messages are published to
    pub fn topic_arn(&self) -> &str {
        &self.topic_arn
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn notify(&self, subject: &str, message: &str) -> Result<()> {
        let response = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|e| {
                RetrieverError::Notification(format!(
                    "Failed to publish SNS notification: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        tracing::info!(topic_arn = %self.topic_arn, "Notification published to SNS topic");
        tracing::debug!(message_id = ?response.message_id(), "SNS publish response");
        Ok(())
    }
}

/// Build the notifier for the configured destination
///
/// No `[notifications]` section means notifications only reach the log.
pub async fn build_notifier(config: Option<&NotificationsConfig>) -> Result<Box<dyn Notifier>> {
    match config {
        Some(config) => Ok(Box::new(SnsNotifier::new(config).await?)),
        None => Ok(Box::new(LogNotifier)),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
