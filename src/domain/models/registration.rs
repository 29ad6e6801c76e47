//--------------------------------------------------------------------------------------------------
// ENUMS
//--------------------------------------------------------------------------------------------------
// | Name                 | Description                                   | Key Methods            |
// |----------------------|-----------------------------------------------|------------------------|
// | RegistrationStatus   | Where a dancer currently stands at the event |                        |
// | RegistrationResult   | Outcome code of one engine operation          | is_success             |
// |                      |                                               | is_retryable           |
// |                      |                                               | is_terminal            |
//--------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

use super::dancer::Dancer;

/// Registration of a dancer at an event, as seen right after an engine call.
///
/// Not persisted. `related` describes how a counterpart's registration changed as a side
/// effect of the same call: the chosen partner on couple signup, or the ex-partner on removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub dancer: Dancer,
    pub status: RegistrationStatus,
    /// `None` for read-only lookups.
    pub result: Option<RegistrationResult>,
    pub event_id: String,
    pub partner: Option<Dancer>,
    pub related: Option<Box<Registration>>,
}

impl Registration {
    pub fn new(dancer: Dancer, status: RegistrationStatus, event_id: impl Into<String>) -> Self {
        Self {
            dancer,
            status,
            result: None,
            event_id: event_id.into(),
            partner: None,
            related: None,
        }
    }

    /// Sets the result and returns self.
    pub fn with_result(mut self, result: RegistrationResult) -> Self {
        self.result = Some(result);
        self
    }

    /// True when the operation changed the event.
    pub fn is_mutation(&self) -> bool {
        self.result.is_some_and(|r| r.is_success())
    }
}

/// Registration status of a dancer at an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    NotRegistered,
    AsSingle,
    InCouple,
    Forbidden,
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotRegistered => "not_registered",
            Self::AsSingle => "as_single",
            Self::InCouple => "in_couple",
            Self::Forbidden => "forbidden",
        };
        f.write_str(s)
    }
}

/// Outcome of a registration engine operation.
///
/// Guard rejections are ordinary values of this enum, never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationResult {
    RegisteredAsSingle,
    RegisteredInCouple,
    RegistrationRemoved,
    AlreadyAsSingle,
    AlreadyInCouple,
    AlreadyInSameCouple,
    PartnerTaken,
    PartnerSameRole,
    SelfNotAllowed,
    NotRegistered,
    EventClosed,
    ForbiddenDancer,
    ForbiddenPartner,
    ClosedForSingles,
    ClosedForSingleRole,
}

impl RegistrationResult {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::RegisteredAsSingle | Self::RegisteredInCouple | Self::RegistrationRemoved
        )
    }

    /// The caller should let the user pick a different partner or role and try again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PartnerTaken
                | Self::PartnerSameRole
                | Self::SelfNotAllowed
                | Self::ClosedForSingles
                | Self::ClosedForSingleRole
        )
    }

    /// The caller should reset its workflow.
    pub fn is_terminal(&self) -> bool {
        !self.is_retryable()
    }
}

impl fmt::Display for RegistrationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RegisteredAsSingle => "registered_as_single",
            Self::RegisteredInCouple => "registered_in_couple",
            Self::RegistrationRemoved => "registration_removed",
            Self::AlreadyAsSingle => "already_as_single",
            Self::AlreadyInCouple => "already_in_couple",
            Self::AlreadyInSameCouple => "already_in_same_couple",
            Self::PartnerTaken => "partner_taken",
            Self::PartnerSameRole => "partner_same_role",
            Self::SelfNotAllowed => "self_not_allowed",
            Self::NotRegistered => "not_registered",
            Self::EventClosed => "event_closed",
            Self::ForbiddenDancer => "forbidden_dancer",
            Self::ForbiddenPartner => "forbidden_partner",
            Self::ClosedForSingles => "closed_for_singles",
            Self::ClosedForSingleRole => "closed_for_single_role",
        };
        f.write_str(s)
    }
}
