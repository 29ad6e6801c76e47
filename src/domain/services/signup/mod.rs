use thiserror::Error;

use crate::config::Config;
use crate::domain::models::Profile;
use crate::outbounds::store::StoreError;

pub mod lifecycle;
pub mod service;
pub mod validation;


pub use self::service::SignupService;

/// +----------------------------------------------------------+
/// | MODULES                                                  |
/// +----------+-------+-------+------------------------------+
/// | Exports:                                                 |
/// |   - SignupService (struct)                               |
/// |   - ServiceSettings (struct)                             |
/// |   - ServiceError (enum)                                  |
/// +----------------------------------------------------------+

/// Errors surfaced by the signup service. Guard rejections are not errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The event does not exist
    #[error("Event {0} not found")]
    NotFound(String),

    /// Input rejected before any transaction was opened
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persistence failure; nothing was committed
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ServiceError::NotFound(id),
            other => ServiceError::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Limits and identities the service works with.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Recorded as initiator of auto-pair actions
    pub system_profile: Profile,
    pub event_id_len: usize,
    pub event_caption_max_len: usize,
    pub dancer_name_max_len: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            system_profile: config.system_profile.clone(),
            event_id_len: config.event_id_len,
            event_caption_max_len: config.event_caption_max_len,
            dancer_name_max_len: config.dancer_name_max_len,
        }
    }
}
