//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Notification dispatcher. Hands a notification to the sink and logs the outcome, including a
// failed delivery, to the history table. Delivery is best-effort and never retried here.
//--------------------------------------------------------------------------------------------------

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::models::{HistoryAction, HistoryItem, Notification};
use crate::outbounds::sinks::NotificationSink;
use crate::outbounds::store::{AggregateStore, StoreError};

#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    store: Arc<dyn AggregateStore>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>, store: Arc<dyn AggregateStore>) -> Self {
        Self { sink, store }
    }

    /// Delivers `notification` and appends a `notification_sent` history item.
    ///
    /// A delivery failure is recorded on the logged notification; only a failure to write the
    /// history item is returned.
    pub async fn dispatch(&self, mut notification: Notification) -> Result<(), StoreError> {
        match self.sink.deliver(&notification).await {
            Ok(()) => debug!(
                template = %notification.template,
                recipient = notification.recipient.id,
                "notification delivered"
            ),
            Err(e) => {
                warn!(
                    template = %notification.template,
                    recipient = notification.recipient.id,
                    error = %e,
                    "notification delivery failed"
                );
                notification.error = Some(e.to_string());
            }
        }

        let item = HistoryItem::new(
            HistoryAction::NotificationSent,
            None,
            Some(notification.payload.event.id.clone()),
            &notification,
            Utc::now(),
        );
        self.store.append_history(item).await
    }
}
