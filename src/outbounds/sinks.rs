//! Outbound collaborators that publish state to the outside world: the announcement renderer and
//! the notification transport.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::models::{Event, Notification};

/// +----------------------------------------------------------+
/// | STRUCTS | TRAITS | ENUMS | FUNCTIONS                     |
/// +----------+-------+-------+------------------------------+
/// | Traits:                                                  |
/// |   - RenderSink                                           |
/// |   - NotificationSink                                     |
/// | Structs:                                                 |
/// |   - LogSink                                              |
/// |   - WebhookSink                                          |
/// | Enums:                                                   |
/// |   - SinkError                                            |
/// +----------------------------------------------------------+

#[derive(Debug, Error)]
pub enum SinkError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote side answered with a non-success status
    #[error("Sink rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Sink error: {0}")]
    Other(String),
}

/// Re-renders the external announcement of an event. Must be safe to call redundantly.
#[async_trait]
pub trait RenderSink: Send + Sync {
    async fn render(&self, event: &Event) -> Result<(), SinkError>;
}

/// Delivers a notification to its recipient.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), SinkError>;
}

/// Sink that only writes to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl RenderSink for LogSink {
    async fn render(&self, event: &Event) -> Result<(), SinkError> {
        info!(
            event_id = %event.id,
            couples = event.couples.len(),
            singles = event.singles.len(),
            "render announcement"
        );
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
        info!(
            template = %notification.template,
            recipient = notification.recipient.id,
            event_id = %notification.payload.event.id,
            "deliver notification"
        );
        Ok(())
    }
}

/// Sink that POSTs JSON to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn post(&self, body: serde_json::Value) -> Result<(), SinkError> {
        let resp = self.client.post(&self.url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        debug!(url = %self.url, status = status.as_u16(), "webhook accepted");
        Ok(())
    }
}

#[async_trait]
impl RenderSink for WebhookSink {
    async fn render(&self, event: &Event) -> Result<(), SinkError> {
        self.post(serde_json::json!({ "kind": "render", "event": event }))
            .await
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
        self.post(serde_json::json!({ "kind": "notification", "notification": notification }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{NotificationPayload, NotificationTemplate, Profile};

    #[tokio::test]
    async fn test_log_sink_accepts_everything() {
        let event = Event::new("e1", "Practica", Profile::new(1, "Owner"));
        assert!(RenderSink::render(&LogSink, &event).await.is_ok());

        let notification = Notification::new(
            NotificationTemplate::CanceledByPartner,
            Profile::new(2, "Ann"),
            NotificationPayload {
                event: event.event_ref(),
                partner: None,
                new_partner: None,
            },
        );
        assert!(LogSink.deliver(&notification).await.is_ok());
    }

    #[test]
    fn test_sink_error_display() {
        let err = SinkError::Rejected {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Sink rejected request with status 502: bad gateway");
    }
}
