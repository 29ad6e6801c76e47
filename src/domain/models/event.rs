//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The event aggregate and its embedded values. An event is the unit of transactional
// consistency: couples and singles are only ever changed together with the event that holds them.
//
// | Name           | Description                                              |
// |----------------|----------------------------------------------------------|
// | Event          | Aggregate root                                           |
// | EventSettings  | Limit, closing policy and pairing switches               |
// | ClosedFor      | Which signups the event currently refuses                |
// | Couple         | Leader and follower slots plus provenance                |
// | Post           | Reference to the externally rendered announcement        |
// | EventRef       | Lightweight id/caption snapshot used in payloads         |
//--------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dancer::{Dancer, Profile, Role};

/// A social dance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub caption: String,
    /// Announcement reference; `None` while the event is an unpublished draft.
    #[serde(default)]
    pub post: Option<Post>,
    #[serde(default)]
    pub settings: EventSettings,
    #[serde(default)]
    pub couples: Vec<Couple>,
    /// FIFO pairing queue, ordered by `created_at`.
    #[serde(default)]
    pub singles: Vec<Dancer>,
    pub owner: Profile,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(id: impl Into<String>, caption: impl Into<String>, owner: Profile) -> Self {
        Self {
            id: id.into(),
            caption: caption.into(),
            post: None,
            settings: EventSettings::default(),
            couples: Vec::new(),
            singles: Vec::new(),
            owner,
            created_at: Utc::now(),
        }
    }

    pub fn with_settings(mut self, settings: EventSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn is_published(&self) -> bool {
        self.post.is_some()
    }

    pub fn event_ref(&self) -> EventRef {
        EventRef {
            id: self.id.clone(),
            caption: self.caption.clone(),
        }
    }
}

/// Per-event settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSettings {
    /// Maximum number of couples; zero means no limit.
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub closed_for: ClosedFor,
    #[serde(default)]
    pub auto_pairing: bool,
    /// Hide the singles list from partner choice.
    #[serde(default)]
    pub disable_choose_single: bool,
}

/// Which signups an event refuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosedFor {
    #[default]
    None,
    /// No modifications at all.
    All,
    Singles,
    SingleLeaders,
    SingleFollowers,
}

impl ClosedFor {
    /// True when single signups with the given role are refused by a role-specific closing.
    pub fn closes_single_role(&self, role: Role) -> bool {
        matches!(
            (self, role),
            (Self::SingleLeaders, Role::Leader) | (Self::SingleFollowers, Role::Follower)
        )
    }
}

/// A couple of dancers. The leader slot always comes first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Couple {
    pub leader: Dancer,
    pub follower: Dancer,
    /// Initiating party; the system identity for auto-paired couples.
    #[serde(default)]
    pub created_by: Option<Profile>,
    #[serde(default)]
    pub auto_pair: bool,
    pub created_at: DateTime<Utc>,
}

impl Couple {
    /// Builds a couple from two dancers of opposite roles, placing the leader first
    /// regardless of argument order.
    pub fn new(
        a: Dancer,
        b: Dancer,
        created_by: Option<Profile>,
        auto_pair: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        let (leader, follower) = if a.role == Role::Leader { (a, b) } else { (b, a) };
        Self {
            leader,
            follower,
            created_by,
            auto_pair,
            created_at,
        }
    }

    pub fn dancers(&self) -> [&Dancer; 2] {
        [&self.leader, &self.follower]
    }
}

/// Reference to the externally rendered announcement of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub inline_message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
}

/// Id and caption of an event, carried by notifications instead of the whole aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRef {
    pub id: String,
    pub caption: String,
}
