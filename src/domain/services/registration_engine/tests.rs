use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;

use crate::domain::models::{
    ClosedFor, Event, EventSettings, HistoryAction, NotificationTemplate, Participant, Profile,
    RegistrationResult, RegistrationStatus, Role,
};
use crate::domain::services::registration_engine::RegistrationEngine;

// Helper to build a fixed point in time
fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn system() -> Profile {
    Profile::new(0, "signup-bot")
}

fn profile(id: i64, name: &str) -> Profile {
    Profile::new(id, name).with_handle(format!("{}_dances", name.to_lowercase()))
}

fn leader(id: i64, name: &str) -> Participant {
    Participant::by_profile(profile(id, name), Role::Leader)
}

fn follower(id: i64, name: &str) -> Participant {
    Participant::by_profile(profile(id, name), Role::Follower)
}

fn event_with(settings: EventSettings) -> Event {
    Event::new("evt123", "Friday milonga", profile(100, "Owner")).with_settings(settings)
}

fn engine(event: &mut Event, secs: i64) -> RegistrationEngine<'_> {
    RegistrationEngine::new(event, &system()).with_clock(at(secs))
}

fn single_ids(event: &Event) -> Vec<i64> {
    event.singles.iter().filter_map(|d| d.profile_id()).collect()
}

// Every identity appears at most once across couples and singles
fn assert_unique_identities(event: &Event) {
    let mut seen = HashSet::new();
    let ids = event
        .couples
        .iter()
        .flat_map(|c| c.dancers())
        .chain(event.singles.iter())
        .filter_map(|d| d.profile_id());
    for id in ids {
        assert!(seen.insert(id), "dancer {id} registered twice");
    }
}

#[test]
fn test_single_add_registers_single() {
    let mut event = event_with(EventSettings::default());
    let mut eng = engine(&mut event, 1);

    let reg = eng.single_add(&leader(1, "Xavier"));

    assert_eq!(reg.result, Some(RegistrationResult::RegisteredAsSingle));
    assert_eq!(reg.status, RegistrationStatus::AsSingle);
    assert!(reg.dancer.single_signup);
    assert_eq!(eng.history().len(), 1);
    assert_eq!(eng.history()[0].action, HistoryAction::SingleAdded);
    assert_eq!(eng.history()[0].initiator.as_ref().map(|p| p.id), Some(1));
    assert!(eng.notifications().is_empty());
    assert_eq!(single_ids(&event), vec![1]);
}

#[test]
fn test_auto_pair_then_removal_restores_single() {
    let mut event = event_with(EventSettings::default());
    engine(&mut event, 1).single_add(&leader(1, "Xavier"));

    // Auto-pairing matches the waiting leader
    event.settings.auto_pairing = true;
    let mut eng = engine(&mut event, 2);
    let reg = eng.single_add(&follower(2, "Yara"));

    assert_eq!(reg.result, Some(RegistrationResult::RegisteredInCouple));
    assert_eq!(reg.status, RegistrationStatus::InCouple);
    assert_eq!(reg.partner.as_ref().and_then(|p| p.profile_id()), Some(1));
    let related = reg.related.as_deref().unwrap();
    assert_eq!(related.status, RegistrationStatus::InCouple);
    assert_eq!(related.result, Some(RegistrationResult::RegisteredInCouple));

    let actions: Vec<_> = eng.history().iter().map(|h| h.action).collect();
    assert_eq!(actions, vec![HistoryAction::SingleRemoved, HistoryAction::CoupleAdded]);
    assert!(eng.history().iter().all(|h| h.initiator == Some(system())));

    let notifications = eng.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].template, NotificationTemplate::AutoPairPartnerFound);
    assert_eq!(notifications[0].recipient.id, 1);
    assert_eq!(notifications[0].payload.partner.as_ref().and_then(|p| p.profile_id()), Some(2));

    assert!(event.singles.is_empty());
    assert_eq!(event.couples.len(), 1);
    let couple = &event.couples[0];
    assert_eq!(couple.leader.profile_id(), Some(1));
    assert_eq!(couple.follower.profile_id(), Some(2));
    assert!(couple.auto_pair);
    assert!(couple.leader.single_signup && couple.follower.single_signup);
    assert_eq!(couple.created_by, Some(system()));

    // Leaving returns the single-signup partner to the pool
    event.settings.auto_pairing = false;
    let mut eng = engine(&mut event, 3);
    let reg = eng.dancer_remove(&leader(1, "Xavier"));

    assert_eq!(reg.result, Some(RegistrationResult::RegistrationRemoved));
    assert_eq!(reg.status, RegistrationStatus::NotRegistered);
    let related = reg.related.as_deref().unwrap();
    assert_eq!(related.status, RegistrationStatus::AsSingle);
    assert_eq!(related.result, Some(RegistrationResult::RegisteredAsSingle));

    let notifications = eng.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].template, NotificationTemplate::CanceledWithSingle);
    assert_eq!(notifications[0].recipient.id, 2);
    assert_eq!(notifications[0].payload.partner.as_ref().and_then(|p| p.profile_id()), Some(1));

    let actions: Vec<_> = eng.history().iter().map(|h| h.action).collect();
    assert_eq!(actions, vec![HistoryAction::CoupleRemoved, HistoryAction::SingleAdded]);
    assert!(event.couples.is_empty());
    assert_eq!(single_ids(&event), vec![2]);
}

#[test]
fn test_repeated_couple_add_is_already_in_same_couple() {
    let mut event = event_with(EventSettings::default());
    let reg = engine(&mut event, 1).couple_add(&leader(1, "Ana"), &follower(2, "Ben"));
    assert_eq!(reg.result, Some(RegistrationResult::RegisteredInCouple));

    let mut eng = engine(&mut event, 2);
    let reg = eng.couple_add(&leader(1, "Ana"), &follower(2, "Ben"));

    assert_eq!(reg.result, Some(RegistrationResult::AlreadyInSameCouple));
    assert!(reg.result.unwrap().is_terminal());
    assert!(eng.history().is_empty());
    assert_eq!(event.couples.len(), 1);
}

#[test]
fn test_closed_for_single_role() {
    let mut event = event_with(EventSettings {
        closed_for: ClosedFor::SingleLeaders,
        ..Default::default()
    });
    let mut eng = engine(&mut event, 1);

    let reg = eng.single_add(&leader(1, "Xavier"));

    assert_eq!(reg.result, Some(RegistrationResult::ClosedForSingleRole));
    assert!(reg.result.unwrap().is_retryable());
    assert!(eng.history().is_empty());
    assert!(event.singles.is_empty());

    // Followers are still welcome
    let reg = engine(&mut event, 2).single_add(&follower(2, "Yara"));
    assert_eq!(reg.result, Some(RegistrationResult::RegisteredAsSingle));
}

#[test]
fn test_closed_for_singles() {
    let mut event = event_with(EventSettings {
        closed_for: ClosedFor::Singles,
        ..Default::default()
    });
    let reg = engine(&mut event, 1).single_add(&follower(1, "Yara"));
    assert_eq!(reg.result, Some(RegistrationResult::ClosedForSingles));
    assert!(event.singles.is_empty());
}

#[test]
fn test_auto_pair_bypasses_closed_for_singles() {
    let mut event = event_with(EventSettings {
        auto_pairing: true,
        ..Default::default()
    });
    engine(&mut event, 1).single_add(&leader(1, "Xavier"));
    event.settings.closed_for = ClosedFor::Singles;

    let reg = engine(&mut event, 2).single_add(&follower(2, "Yara"));

    assert_eq!(reg.result, Some(RegistrationResult::RegisteredInCouple));
    assert_eq!(event.couples.len(), 1);
}

#[test]
fn test_auto_pair_is_fifo() {
    let mut event = event_with(EventSettings::default());
    engine(&mut event, 1).single_add(&leader(1, "Ana"));
    engine(&mut event, 2).single_add(&leader(2, "Bea"));

    event.settings.auto_pairing = true;
    let reg = engine(&mut event, 3).single_add(&follower(3, "Cid"));

    assert_eq!(reg.partner.as_ref().and_then(|p| p.profile_id()), Some(1));
    assert_eq!(single_ids(&event), vec![2]);
}

#[test]
fn test_forbidden_takes_priority_over_same_couple() {
    let mut event = event_with(EventSettings::default());
    engine(&mut event, 1).couple_add(&leader(1, "Ana"), &follower(2, "Ben"));

    let mut eng = engine(&mut event, 2);
    let reg = eng.couple_add(&leader(1, "Ana").forbidden(true), &follower(2, "Ben"));

    assert_eq!(reg.result, Some(RegistrationResult::ForbiddenDancer));
    assert_eq!(reg.status, RegistrationStatus::InCouple);
    assert!(eng.history().is_empty());
}

#[test]
fn test_forbidden_partner() {
    let mut event = event_with(EventSettings::default());
    let reg = engine(&mut event, 1).couple_add(&leader(1, "Ana"), &follower(2, "Ben").forbidden(true));

    assert_eq!(reg.result, Some(RegistrationResult::ForbiddenPartner));
    assert_eq!(reg.related.as_deref().map(|r| r.status), Some(RegistrationStatus::Forbidden));
    assert!(event.couples.is_empty());
}

#[test]
fn test_couple_add_guards() {
    let mut event = event_with(EventSettings::default());
    engine(&mut event, 1).couple_add(&leader(1, "Ana"), &follower(2, "Ben"));

    let reg = engine(&mut event, 2).couple_add(&leader(3, "Cid"), &follower(2, "Ben"));
    assert_eq!(reg.result, Some(RegistrationResult::PartnerTaken));

    let reg = engine(&mut event, 2).couple_add(&leader(1, "Ana"), &follower(4, "Dee"));
    assert_eq!(reg.result, Some(RegistrationResult::AlreadyInCouple));

    let reg = engine(&mut event, 2).couple_add(&leader(3, "Cid"), &leader(4, "Dee"));
    assert_eq!(reg.result, Some(RegistrationResult::PartnerSameRole));

    let reg = engine(&mut event, 2).couple_add(&leader(3, "Cid"), &follower(3, "Cid"));
    assert_eq!(reg.result, Some(RegistrationResult::SelfNotAllowed));

    assert_eq!(event.couples.len(), 1);
    assert!(event.singles.is_empty());
}

#[test]
fn test_closed_for_all_blocks_every_mutation() {
    let mut event = event_with(EventSettings::default());
    engine(&mut event, 1).couple_add(&leader(1, "Ana"), &follower(2, "Ben"));
    event.settings.closed_for = ClosedFor::All;

    let mut eng = engine(&mut event, 2);
    assert_eq!(
        eng.couple_add(&leader(3, "Cid"), &follower(4, "Dee")).result,
        Some(RegistrationResult::EventClosed)
    );
    assert_eq!(eng.single_add(&leader(3, "Cid")).result, Some(RegistrationResult::EventClosed));
    assert_eq!(eng.dancer_remove(&leader(1, "Ana")).result, Some(RegistrationResult::EventClosed));
    assert!(eng.history().is_empty());
    assert_eq!(event.couples.len(), 1);
}

#[test]
fn test_single_add_when_already_registered() {
    let mut event = event_with(EventSettings::default());
    engine(&mut event, 1).couple_add(&leader(1, "Ana"), &follower(2, "Ben"));
    engine(&mut event, 1).single_add(&leader(3, "Cid"));

    let reg = engine(&mut event, 2).single_add(&follower(2, "Ben"));
    assert_eq!(reg.result, Some(RegistrationResult::AlreadyInCouple));

    let reg = engine(&mut event, 2).single_add(&leader(3, "Cid"));
    assert_eq!(reg.result, Some(RegistrationResult::AlreadyAsSingle));
}

#[test]
fn test_remove_twice() {
    let mut event = event_with(EventSettings::default());
    engine(&mut event, 1).single_add(&leader(1, "Ana"));

    let mut eng = engine(&mut event, 2);
    let first = eng.dancer_remove(&leader(1, "Ana"));
    assert_eq!(first.status, RegistrationStatus::NotRegistered);
    assert_eq!(first.result, Some(RegistrationResult::RegistrationRemoved));
    assert_eq!(eng.history().len(), 1);
    assert_eq!(eng.history()[0].action, HistoryAction::SingleRemoved);

    let mut eng = engine(&mut event, 3);
    let second = eng.dancer_remove(&leader(1, "Ana"));
    assert_eq!(second.status, RegistrationStatus::NotRegistered);
    assert_eq!(second.result, Some(RegistrationResult::NotRegistered));
    assert!(!second.is_mutation());
    assert!(eng.history().is_empty());
}

#[test]
fn test_round_trip_with_single_partner() {
    let mut event = event_with(EventSettings::default());
    engine(&mut event, 1).single_add(&follower(2, "Ben"));

    let mut eng = engine(&mut event, 2);
    let reg = eng.couple_add(&leader(1, "Ana"), &follower(2, "Ben"));
    assert_eq!(reg.result, Some(RegistrationResult::RegisteredInCouple));
    assert_eq!(eng.notifications().len(), 1);
    assert_eq!(eng.notifications()[0].template, NotificationTemplate::RegisteredWithSingle);
    assert_eq!(eng.notifications()[0].recipient.id, 2);
    assert!(event.singles.is_empty());
    assert!(event.couples[0].follower.single_signup);
    assert!(!event.couples[0].leader.single_signup);

    let reg = engine(&mut event, 3).dancer_remove(&leader(1, "Ana"));
    assert_eq!(reg.related.as_deref().map(|r| r.status), Some(RegistrationStatus::AsSingle));
    assert_eq!(single_ids(&event), vec![2]);
    assert!(event.couples.is_empty());
}

#[test]
fn test_round_trip_with_invited_partner() {
    let mut event = event_with(EventSettings::default());
    engine(&mut event, 1).couple_add(&leader(1, "Ana"), &follower(2, "Ben"));

    let mut eng = engine(&mut event, 2);
    let reg = eng.dancer_remove(&leader(1, "Ana"));

    let related = reg.related.as_deref().unwrap();
    assert_eq!(related.status, RegistrationStatus::NotRegistered);
    assert_eq!(related.result, Some(RegistrationResult::RegistrationRemoved));
    // The remover created the couple, so nobody is notified
    assert!(eng.notifications().is_empty());
    assert!(event.couples.is_empty());
    assert!(event.singles.is_empty());
}

#[test]
fn test_partner_leaving_notifies_creator() {
    let mut event = event_with(EventSettings::default());
    engine(&mut event, 1).couple_add(&leader(1, "Ana"), &follower(2, "Ben"));

    let mut eng = engine(&mut event, 2);
    eng.dancer_remove(&follower(2, "Ben"));

    let notifications = eng.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].template, NotificationTemplate::CanceledByPartner);
    assert_eq!(notifications[0].recipient.id, 1);
}

#[test]
fn test_restored_single_keeps_fifo_position() {
    let mut event = event_with(EventSettings::default());
    engine(&mut event, 1).single_add(&follower(2, "Ben"));
    engine(&mut event, 2).single_add(&follower(3, "Cat"));
    engine(&mut event, 3).couple_add(&leader(1, "Ana"), &follower(2, "Ben"));
    assert_eq!(single_ids(&event), vec![3]);

    engine(&mut event, 4).dancer_remove(&leader(1, "Ana"));

    assert_eq!(single_ids(&event), vec![2, 3]);
}

#[test]
fn test_removal_re_pairs_single_partner() {
    let mut event = event_with(EventSettings {
        auto_pairing: true,
        ..Default::default()
    });
    engine(&mut event, 1).single_add(&leader(1, "Xavier"));
    engine(&mut event, 2).single_add(&follower(2, "Yara"));
    engine(&mut event, 3).single_add(&leader(3, "Zack"));
    assert_eq!(single_ids(&event), vec![3]);

    let mut eng = engine(&mut event, 4);
    let reg = eng.dancer_remove(&leader(1, "Xavier"));

    let related = reg.related.as_deref().unwrap();
    assert_eq!(related.status, RegistrationStatus::InCouple);
    assert_eq!(related.partner.as_ref().and_then(|p| p.profile_id()), Some(3));

    let notifications: Vec<_> = eng
        .notifications()
        .iter()
        .map(|n| (n.template, n.recipient.id))
        .collect();
    assert_eq!(
        notifications,
        vec![
            (NotificationTemplate::AutoPairPartnerFound, 3),
            (NotificationTemplate::AutoPairPartnerChanged, 2),
        ]
    );
    let changed = &eng.notifications()[1].payload;
    assert_eq!(changed.partner.as_ref().and_then(|p| p.profile_id()), Some(1));
    assert_eq!(changed.new_partner.as_ref().and_then(|p| p.profile_id()), Some(3));

    assert!(event.singles.is_empty());
    assert_eq!(event.couples.len(), 1);
    assert_eq!(event.couples[0].leader.profile_id(), Some(3));
}

#[test]
fn test_name_only_partner() {
    let mut event = event_with(EventSettings::default());
    let bob = Participant::by_name("Bob @bobby_d", Role::Follower);
    engine(&mut event, 1).single_add(&bob);

    let mut eng = engine(&mut event, 2);
    let reg = eng.couple_add(&leader(1, "Ana"), &bob);
    assert_eq!(reg.result, Some(RegistrationResult::RegisteredInCouple));
    // Nobody to deliver to
    assert!(eng.notifications().is_empty());

    // The profile mentioning the same handle resolves to the couple slot
    let bob_profile = Participant::by_profile(Profile::new(7, "Bob").with_handle("bobby_d"), Role::Follower);
    let reg = engine(&mut event, 3).registration_get(&bob_profile);
    assert_eq!(reg.status, RegistrationStatus::InCouple);
    assert_eq!(reg.dancer.full_name, "Bob @bobby_d");
    assert_eq!(reg.partner.as_ref().and_then(|p| p.profile_id()), Some(1));
}

#[test]
fn test_auto_pair_takes_single_without_handle_out_of_the_pool() {
    let mut event = event_with(EventSettings {
        auto_pairing: true,
        ..Default::default()
    });
    engine(&mut event, 1).single_add(&Participant::by_name("Bob", Role::Leader));

    let reg = engine(&mut event, 2).single_add(&follower(1, "Yara"));
    assert_eq!(reg.result, Some(RegistrationResult::RegisteredInCouple));
    assert_eq!(reg.partner.as_ref().map(|p| p.full_name.as_str()), Some("Bob"));
    assert!(event.singles.is_empty());

    // Bob is taken, so the next follower waits alone
    let reg = engine(&mut event, 3).single_add(&follower(2, "Zoe"));
    assert_eq!(reg.result, Some(RegistrationResult::RegisteredAsSingle));
    assert_eq!(event.couples.len(), 1);
    assert_eq!(single_ids(&event), vec![2]);
}

#[test]
fn test_couple_of_two_singles_empties_both_slots() {
    let mut event = event_with(EventSettings::default());
    engine(&mut event, 1).single_add(&follower(2, "Ben"));
    engine(&mut event, 2).single_add(&leader(3, "Cid"));
    engine(&mut event, 3).single_add(&leader(1, "Ana"));

    let reg = engine(&mut event, 4).couple_add(&leader(1, "Ana"), &follower(2, "Ben"));
    assert_eq!(reg.result, Some(RegistrationResult::RegisteredInCouple));
    assert_eq!(single_ids(&event), vec![3]);
    assert_unique_identities(&event);
}

#[test]
fn test_registration_get() {
    let mut event = event_with(EventSettings::default());
    engine(&mut event, 1).single_add(&leader(1, "Ana"));

    let eng = engine(&mut event, 2);
    let reg = eng.registration_get(&leader(1, "Ana"));
    assert_eq!(reg.status, RegistrationStatus::AsSingle);
    assert!(reg.result.is_none());

    let reg = eng.registration_get(&follower(2, "Ben"));
    assert_eq!(reg.status, RegistrationStatus::NotRegistered);
    assert_eq!(reg.dancer.created_at, at(2));

    let reg = eng.registration_get(&follower(2, "Ben").forbidden(true));
    assert_eq!(reg.status, RegistrationStatus::Forbidden);
    assert!(eng.history().is_empty());
}

#[test]
fn test_history_shares_engine_clock() {
    let mut event = event_with(EventSettings::default());
    engine(&mut event, 1).single_add(&follower(2, "Ben"));

    let mut eng = engine(&mut event, 5);
    eng.couple_add(&leader(1, "Ana"), &follower(2, "Ben"));
    let (history, _) = eng.into_parts();

    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|h| h.created_at == at(5)));
    assert!(history.iter().all(|h| h.event_id.as_deref() == Some("evt123")));
}

#[test]
fn test_identities_stay_unique() {
    let mut event = event_with(EventSettings {
        auto_pairing: true,
        ..Default::default()
    });
    let steps: Vec<Box<dyn Fn(&mut RegistrationEngine)>> = vec![
        Box::new(|e| {
            e.single_add(&leader(1, "Ana"));
        }),
        Box::new(|e| {
            e.single_add(&leader(2, "Bea"));
        }),
        Box::new(|e| {
            e.couple_add(&follower(3, "Cid"), &leader(2, "Bea"));
        }),
        Box::new(|e| {
            e.single_add(&follower(4, "Dee"));
        }),
        Box::new(|e| {
            e.couple_add(&leader(1, "Ana"), &follower(3, "Cid"));
        }),
        Box::new(|e| {
            e.dancer_remove(&follower(3, "Cid"));
        }),
        Box::new(|e| {
            e.single_add(&follower(3, "Cid"));
        }),
        Box::new(|e| {
            e.dancer_remove(&leader(1, "Ana"));
        }),
        Box::new(|e| {
            e.single_add(&follower(5, "Eve"));
        }),
    ];

    for (i, step) in steps.iter().enumerate() {
        let mut eng = engine(&mut event, i as i64);
        step(&mut eng);
        drop(eng);
        assert_unique_identities(&event);
    }
}
