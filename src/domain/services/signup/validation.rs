use super::{ServiceError, ServiceResult, ServiceSettings};
use crate::domain::models::{DancerRef, Participant, Profile};

pub fn validate_profile(profile: &Profile) -> ServiceResult<()> {
    if profile.id <= 0 {
        return Err(ServiceError::Validation(format!(
            "profile id must be positive, got {}",
            profile.id
        )));
    }
    if profile.first_name.trim().is_empty() {
        return Err(ServiceError::Validation("profile first name is empty".to_string()));
    }
    Ok(())
}

pub fn validate_participant(participant: &Participant, settings: &ServiceSettings) -> ServiceResult<()> {
    match &participant.reference {
        DancerRef::ByProfile(profile) => validate_profile(profile),
        DancerRef::ByName(name) => {
            let len = name.trim().chars().count();
            if len == 0 || len > settings.dancer_name_max_len {
                return Err(ServiceError::Validation(format!(
                    "dancer name must be 1 to {} characters",
                    settings.dancer_name_max_len
                )));
            }
            Ok(())
        }
    }
}

pub fn validate_caption(caption: &str, settings: &ServiceSettings) -> ServiceResult<()> {
    let len = caption.trim().chars().count();
    if len == 0 || len > settings.event_caption_max_len {
        return Err(ServiceError::Validation(format!(
            "caption must be 1 to {} characters",
            settings.event_caption_max_len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Role;

    #[test]
    fn test_participant_rules() {
        let settings = ServiceSettings {
            dancer_name_max_len: 8,
            ..Default::default()
        };
        let ok = Participant::by_name("Bob", Role::Leader);
        assert!(validate_participant(&ok, &settings).is_ok());

        for bad in [
            Participant::by_name("   ", Role::Leader),
            Participant::by_name("Bob Bobson", Role::Leader),
            Participant::by_profile(Profile::new(0, "Ann"), Role::Leader),
            Participant::by_profile(Profile::new(3, ""), Role::Leader),
        ] {
            assert!(matches!(
                validate_participant(&bad, &settings),
                Err(ServiceError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_caption_rules() {
        let settings = ServiceSettings {
            event_caption_max_len: 5,
            ..Default::default()
        };
        assert!(validate_caption("Salsa", &settings).is_ok());
        assert!(validate_caption("", &settings).is_err());
        assert!(validate_caption("Bachata", &settings).is_err());
    }
}
