use serde::{Deserialize, Serialize};
use std::fmt;

use super::dancer::{Dancer, Profile};
use super::event::EventRef;

/// A message to a participant about a change they did not initiate.
///
/// Notifications are built by the registration engine, handed to the notifier after the
/// transaction commits, and logged to history with the delivery outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub template: NotificationTemplate,
    pub recipient: Profile,
    pub payload: NotificationPayload,
    /// Set after a failed delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Notification {
    pub fn new(template: NotificationTemplate, recipient: Profile, payload: NotificationPayload) -> Self {
        Self {
            template,
            recipient,
            payload,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub event: EventRef,
    /// Current (or just removed) partner of the recipient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner: Option<Dancer>,
    /// Partner chosen for the recipient by auto-pairing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_partner: Option<Dancer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    /// Someone registered in a couple with the recipient, who was waiting as a single.
    RegisteredWithSingle,
    /// The partner who picked the recipient from the singles list canceled; the recipient
    /// is back in the singles list.
    CanceledWithSingle,
    /// The recipient registered the couple and their partner left it.
    CanceledByPartner,
    AutoPairPartnerFound,
    /// The partner canceled and auto-pairing found a new one.
    AutoPairPartnerChanged,
}

impl fmt::Display for NotificationTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RegisteredWithSingle => "registered_with_single",
            Self::CanceledWithSingle => "canceled_with_single",
            Self::CanceledByPartner => "canceled_by_partner",
            Self::AutoPairPartnerFound => "auto_pair_partner_found",
            Self::AutoPairPartnerChanged => "auto_pair_partner_changed",
        };
        f.write_str(s)
    }
}
