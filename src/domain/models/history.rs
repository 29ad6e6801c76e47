use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dancer::Profile;

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub action: HistoryAction,
    /// `None` means the action was initiated by the system itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator: Option<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Opaque payload.
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl HistoryItem {
    pub fn new<T: Serialize>(
        action: HistoryAction,
        initiator: Option<Profile>,
        event_id: Option<String>,
        details: &T,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            action,
            initiator,
            event_id,
            details: serde_json::to_value(details).unwrap_or(serde_json::Value::Null),
            created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    EventCreated,
    EventClosed,
    EventReopened,
    SettingsUpdated,
    PostAttached,
    CoupleAdded,
    CoupleRemoved,
    SingleAdded,
    SingleRemoved,
    NotificationSent,
}
