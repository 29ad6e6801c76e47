//--------------------------------------------------------------------------------------------------
// STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name                   | Description                                  | Key Methods         |
// |------------------------|----------------------------------------------|---------------------|
// | ParticipantDto         | Wire form of a participant reference         | into_participant    |
// | CreateEventRequest     | Request to create an event                   |                     |
// | CoupleRequest          | Couple signup                                |                     |
// | DancerRequest          | Single signup, removal and lookup            |                     |
// | AttachPostRequest      | Link an announcement post                    |                     |
// | UpdateSettingsRequest  | Replace event settings                       |                     |
// | RegistrationResponse   | Registration with its outcome flags          | from                |
//--------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::domain::models::{
    Dancer, EventSettings, Participant, Post, Profile, Registration, RegistrationResult,
    RegistrationStatus, Role,
};

/// A participant as sent by a client: exactly one of `profile` or `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDto {
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub name: Option<String>,
    pub role: Role,
    /// Decided by the caller, e.g. from a ban list
    #[serde(default)]
    pub forbidden: bool,
}

impl ParticipantDto {
    pub fn into_participant(self) -> Result<Participant, ApiError> {
        let participant = match (self.profile, self.name) {
            (Some(profile), None) => Participant::by_profile(profile, self.role),
            (None, Some(name)) => Participant::by_name(name, self.role),
            _ => {
                return Err(ApiError::BadRequest(
                    "participant needs exactly one of profile or name".to_string(),
                ));
            }
        };
        Ok(participant.forbidden(self.forbidden))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub owner: Profile,
    pub caption: String,
    #[serde(default)]
    pub settings: EventSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoupleRequest {
    pub dancer: ParticipantDto,
    pub partner: ParticipantDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DancerRequest {
    pub dancer: ParticipantDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachPostRequest {
    pub post: Post,
    #[serde(default)]
    pub initiator: Option<Profile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
    pub settings: EventSettings,
    #[serde(default)]
    pub initiator: Option<Profile>,
}

/// Response for every registration operation. Guard rejections are reported here with
/// `success = false`, never as HTTP errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub event_id: String,
    pub status: RegistrationStatus,
    pub result: Option<RegistrationResult>,
    pub success: bool,
    /// The caller may fix the input and try again
    pub retryable: bool,
    pub dancer: Dancer,
    pub partner: Option<Dancer>,
    pub related: Option<Box<RegistrationResponse>>,
}

impl From<Registration> for RegistrationResponse {
    fn from(reg: Registration) -> Self {
        Self {
            event_id: reg.event_id,
            status: reg.status,
            result: reg.result,
            success: reg.result.is_some_and(|r| r.is_success()),
            retryable: reg.result.is_some_and(|r| r.is_retryable()),
            dancer: reg.dancer,
            partner: reg.partner,
            related: reg.related.map(|r| Box::new(Self::from(*r))),
        }
    }
}
