//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Participant identity types: who a dancer is, which role they dance, and how a transport
// refers to them before the engine has resolved them against an event.
//
// | Name          | Description                                                        |
// |---------------|--------------------------------------------------------------------|
// | Profile       | Structured identity with a stable id and an optional handle        |
// | Role          | Leader or follower                                                 |
// | Dancer        | A participant embedded in an event (couples or singles list)       |
// | DancerRef     | Profile-backed or free-text reference supplied by a transport      |
// | Participant   | A reference plus requested role and the pre-computed forbidden flag |
//--------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured participant identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Stable identifier, assigned by the transport.
    pub id: i64,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Public handle without the leading `@`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

impl Profile {
    pub fn new(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: None,
            handle: None,
        }
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    /// Returns the handle if it is present and not empty.
    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref().filter(|h| !h.is_empty())
    }

    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

/// Dance role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Leader,
    Follower,
}

impl Role {
    pub fn opposite(&self) -> Self {
        match self {
            Self::Leader => Self::Follower,
            Self::Follower => Self::Leader,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leader => write!(f, "leader"),
            Self::Follower => write!(f, "follower"),
        }
    }
}

/// A dancer participating in an event.
///
/// Dancers live inside an event's couples or singles list and have no identity of their own
/// beyond the profile (or free-text name) they were registered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dancer {
    /// Absent when the dancer was only referenced by free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    pub full_name: String,
    pub role: Role,
    /// True when the current couple membership came out of the singles pool.
    #[serde(default)]
    pub single_signup: bool,
    /// Drives FIFO ordering of the singles list.
    pub created_at: DateTime<Utc>,
}

impl Dancer {
    pub fn from_profile(profile: Profile, role: Role, created_at: DateTime<Utc>) -> Self {
        Self {
            full_name: profile.full_name(),
            profile: Some(profile),
            role,
            single_signup: false,
            created_at,
        }
    }

    pub fn from_name(name: impl Into<String>, role: Role, created_at: DateTime<Utc>) -> Self {
        Self {
            profile: None,
            full_name: name.into(),
            role,
            single_signup: false,
            created_at,
        }
    }

    pub fn from_ref(reference: &DancerRef, role: Role, created_at: DateTime<Utc>) -> Self {
        match reference {
            DancerRef::ByProfile(profile) => Self::from_profile(profile.clone(), role, created_at),
            DancerRef::ByName(name) => Self::from_name(name.clone(), role, created_at),
        }
    }

    pub fn profile_id(&self) -> Option<i64> {
        self.profile.as_ref().map(|p| p.id)
    }
}

/// How a transport refers to a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DancerRef {
    ByProfile(Profile),
    ByName(String),
}

/// Engine input: a participant reference, the requested role and the forbidden flag.
///
/// Whether a participant is forbidden is decided by the transport before calling in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub reference: DancerRef,
    pub role: Role,
    pub forbidden: bool,
}

impl Participant {
    pub fn new(reference: DancerRef, role: Role) -> Self {
        Self {
            reference,
            role,
            forbidden: false,
        }
    }

    pub fn by_profile(profile: Profile, role: Role) -> Self {
        Self::new(DancerRef::ByProfile(profile), role)
    }

    pub fn by_name(name: impl Into<String>, role: Role) -> Self {
        Self::new(DancerRef::ByName(name.into()), role)
    }

    pub fn forbidden(mut self, forbidden: bool) -> Self {
        self.forbidden = forbidden;
        self
    }
}
