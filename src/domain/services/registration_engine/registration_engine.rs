//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The registration state machine over a single event aggregate. It implements couple signup,
// single signup, removal and auto-pairing, mutating the event in place and collecting the
// history items and notifications the caller must dispatch once the change is committed.
//
// The engine performs no I/O. Guard rejections are returned as result codes on the
// registration, never as errors.
//
//--------------------------------------------------------------------------------------------------
// STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name                 | Description                                       | Key Methods        |
// |----------------------|---------------------------------------------------|--------------------|
// | RegistrationEngine   | State machine bound to one event                  | registration_get   |
// |                      |                                                   | couple_add         |
// |                      |                                                   | single_add         |
// |                      |                                                   | dancer_remove      |
// |----------------------|---------------------------------------------------|--------------------|
// | Lookup               | Where a participant was found in the event        |                    |
//--------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::domain::models::{
    ClosedFor, Couple, Dancer, Event, HistoryAction, HistoryItem, Notification,
    NotificationPayload, NotificationTemplate, Participant, Profile, Registration,
    RegistrationResult, RegistrationStatus,
};
use crate::domain::services::identity::is_same;

/// Registration state machine bound to one event.
///
/// History items and notifications accumulate across calls; take them with
/// [`RegistrationEngine::into_parts`] after the mutation has been persisted.
pub struct RegistrationEngine<'a> {
    event: &'a mut Event,
    /// Initiator of auto-pair actions.
    system: Profile,
    /// Shared timestamp of everything recorded by this engine.
    now: DateTime<Utc>,
    history: Vec<HistoryItem>,
    notifications: Vec<Notification>,
}

/// Resolved position of a participant in the event.
#[derive(Debug, Clone)]
struct Lookup {
    dancer: Dancer,
    status: RegistrationStatus,
    partner: Option<Dancer>,
    /// Index into `couples` or `singles`, matching `status`.
    slot: Option<usize>,
}

impl Lookup {
    fn single(dancer: Dancer, slot: usize) -> Self {
        Self {
            dancer,
            status: RegistrationStatus::AsSingle,
            partner: None,
            slot: Some(slot),
        }
    }

    fn unregistered(dancer: Dancer) -> Self {
        Self {
            dancer,
            status: RegistrationStatus::NotRegistered,
            partner: None,
            slot: None,
        }
    }

    fn single_slot(&self) -> Option<usize> {
        self.slot.filter(|_| self.status == RegistrationStatus::AsSingle)
    }

    fn is_partnered_with(&self, other: &Dancer) -> bool {
        self.partner.as_ref().is_some_and(|p| is_same(p, other))
    }
}

impl<'a> RegistrationEngine<'a> {
    /// Creates an engine over `event`. `system` is recorded as the initiator of auto-pairing.
    pub fn new(event: &'a mut Event, system: &Profile) -> Self {
        Self {
            event,
            system: system.clone(),
            now: Utc::now(),
            history: Vec::new(),
            notifications: Vec::new(),
        }
    }

    /// Overrides the engine clock.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn event(&self) -> &Event {
        &*self.event
    }

    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn into_parts(self) -> (Vec<HistoryItem>, Vec<Notification>) {
        (self.history, self.notifications)
    }

    /// Returns the current registration of a participant without changing anything.
    pub fn registration_get(&self, participant: &Participant) -> Registration {
        let found = self.lookup(participant);
        self.registration_of(&found, participant.forbidden)
    }

    /// Registers `dancer` in a couple with `partner`.
    ///
    /// If the partner was waiting as a single, they are taken out of the singles list and
    /// notified.
    pub fn couple_add(&mut self, dancer: &Participant, partner: &Participant) -> Registration {
        let me = self.lookup(dancer);
        let other = self.lookup(partner);

        let rejected = if dancer.forbidden {
            Some(RegistrationResult::ForbiddenDancer)
        } else if partner.forbidden {
            Some(RegistrationResult::ForbiddenPartner)
        } else if other.status == RegistrationStatus::InCouple && !other.is_partnered_with(&me.dancer) {
            Some(RegistrationResult::PartnerTaken)
        } else if me.status == RegistrationStatus::InCouple {
            if me.is_partnered_with(&other.dancer) {
                Some(RegistrationResult::AlreadyInSameCouple)
            } else {
                Some(RegistrationResult::AlreadyInCouple)
            }
        } else if self.event.settings.closed_for == ClosedFor::All {
            Some(RegistrationResult::EventClosed)
        } else if me.dancer.role == other.dancer.role {
            Some(RegistrationResult::PartnerSameRole)
        } else if is_same(&me.dancer, &other.dancer) {
            Some(RegistrationResult::SelfNotAllowed)
        } else {
            None
        };

        if let Some(result) = rejected {
            debug!(event_id = %self.event.id, %result, "couple signup rejected");
            let mut reg = self.registration_of(&me, dancer.forbidden).with_result(result);
            reg.related = Some(Box::new(self.registration_of(&other, partner.forbidden)));
            return reg;
        }

        self.pair(me, other, false)
    }

    /// Registers `dancer` as a single, or pairs them right away when auto-pairing finds an
    /// opposite-role single.
    pub fn single_add(&mut self, dancer: &Participant) -> Registration {
        let me = self.lookup(dancer);

        let rejected = if dancer.forbidden {
            Some(RegistrationResult::ForbiddenDancer)
        } else {
            match me.status {
                RegistrationStatus::InCouple => Some(RegistrationResult::AlreadyInCouple),
                RegistrationStatus::AsSingle => Some(RegistrationResult::AlreadyAsSingle),
                _ if self.event.settings.closed_for == ClosedFor::All => {
                    Some(RegistrationResult::EventClosed)
                }
                _ => None,
            }
        };
        if let Some(result) = rejected {
            debug!(event_id = %self.event.id, %result, "single signup rejected");
            return self.registration_of(&me, dancer.forbidden).with_result(result);
        }

        if let Some(reg) = self.try_auto_pair(&me) {
            return reg;
        }

        let closed_for = self.event.settings.closed_for;
        if closed_for == ClosedFor::Singles {
            return self
                .registration_of(&me, false)
                .with_result(RegistrationResult::ClosedForSingles);
        }
        if closed_for.closes_single_role(me.dancer.role) {
            return self
                .registration_of(&me, false)
                .with_result(RegistrationResult::ClosedForSingleRole);
        }

        let mut single = me.dancer;
        single.single_signup = true;
        self.event.singles.push(single.clone());
        self.record(HistoryAction::SingleAdded, single.profile.clone(), &single);

        Registration::new(single, RegistrationStatus::AsSingle, self.event.id.clone())
            .with_result(RegistrationResult::RegisteredAsSingle)
    }

    /// Removes `dancer` from the event.
    ///
    /// When the dancer leaves a couple, an ex-partner who came from the singles pool goes back
    /// to it (or is auto-paired again); otherwise the ex-partner leaves too and is notified
    /// if they had created the couple.
    pub fn dancer_remove(&mut self, dancer: &Participant) -> Registration {
        let me = self.lookup(dancer);

        if self.event.settings.closed_for == ClosedFor::All {
            return self
                .registration_of(&me, false)
                .with_result(RegistrationResult::EventClosed);
        }

        match me.status {
            RegistrationStatus::AsSingle => {
                self.take_singles(&[me.single_slot()]);
                self.record(HistoryAction::SingleRemoved, me.dancer.profile.clone(), &me.dancer);
                Registration::new(me.dancer, RegistrationStatus::NotRegistered, self.event.id.clone())
                    .with_result(RegistrationResult::RegistrationRemoved)
            }
            RegistrationStatus::InCouple => self.leave_couple(me),
            _ => Registration::new(me.dancer, RegistrationStatus::NotRegistered, self.event.id.clone())
                .with_result(RegistrationResult::NotRegistered),
        }
    }

    fn leave_couple(&mut self, me: Lookup) -> Registration {
        let slot = me.slot.filter(|&idx| idx < self.event.couples.len());
        let Some(couple) = slot.map(|idx| self.event.couples.remove(idx)) else {
            return Registration::new(me.dancer, RegistrationStatus::NotRegistered, self.event.id.clone())
                .with_result(RegistrationResult::NotRegistered);
        };
        self.record(HistoryAction::CoupleRemoved, me.dancer.profile.clone(), &couple);

        let ex = if me.dancer.role == couple.leader.role {
            couple.follower.clone()
        } else {
            couple.leader.clone()
        };

        let related = if ex.single_signup {
            self.restore_single(ex, &me.dancer)
        } else {
            let created_by_ex = matches!(
                (&couple.created_by, &ex.profile),
                (Some(creator), Some(profile)) if creator.id == profile.id
            );
            if created_by_ex {
                self.notify(
                    NotificationTemplate::CanceledByPartner,
                    &ex,
                    Some(me.dancer.clone()),
                    None,
                );
            }
            Registration::new(ex, RegistrationStatus::NotRegistered, self.event.id.clone())
                .with_result(RegistrationResult::RegistrationRemoved)
        };

        let mut reg = Registration::new(me.dancer, RegistrationStatus::NotRegistered, self.event.id.clone())
            .with_result(RegistrationResult::RegistrationRemoved);
        reg.related = Some(Box::new(related));
        reg
    }

    /// Puts an ex-partner who originally signed up as a single back into the pool.
    fn restore_single(&mut self, ex: Dancer, removed: &Dancer) -> Registration {
        if let Some(reg) = self.try_auto_pair(&Lookup::unregistered(ex.clone())) {
            self.notify(
                NotificationTemplate::AutoPairPartnerChanged,
                &reg.dancer,
                Some(removed.clone()),
                reg.partner.clone(),
            );
            return reg;
        }

        let mut single = ex;
        single.single_signup = true;
        self.event.singles.push(single.clone());
        // Stable: keeps earlier signups ahead on equal timestamps.
        self.event.singles.sort_by_key(|d| d.created_at);

        self.notify(
            NotificationTemplate::CanceledWithSingle,
            &single,
            Some(removed.clone()),
            None,
        );
        self.record(HistoryAction::SingleAdded, removed.profile.clone(), &single);

        Registration::new(single, RegistrationStatus::AsSingle, self.event.id.clone())
            .with_result(RegistrationResult::RegisteredAsSingle)
    }

    /// Pairs `me` with the oldest opposite-role single if auto-pairing is enabled.
    fn try_auto_pair(&mut self, me: &Lookup) -> Option<Registration> {
        if !self.event.settings.auto_pairing {
            return None;
        }
        let wanted = me.dancer.role.opposite();
        // First minimum wins, so equal timestamps keep list order.
        let (slot, candidate) = self
            .event
            .singles
            .iter()
            .enumerate()
            .filter(|(_, d)| d.role == wanted)
            .min_by_key(|(_, d)| d.created_at)
            .map(|(idx, d)| (idx, d.clone()))?;
        debug!(event_id = %self.event.id, partner = %candidate.full_name, "auto-pair match found");
        Some(self.pair(me.clone(), Lookup::single(candidate, slot), true))
    }

    /// Builds and appends a couple. Guards have already passed.
    ///
    /// Singles leave the pool by the slot they were found at. Name-only dancers never match by
    /// identity, so searching for them again would miss.
    fn pair(&mut self, me: Lookup, other: Lookup, auto_pair: bool) -> Registration {
        let initiator = if auto_pair {
            Some(self.system.clone())
        } else {
            me.dancer.profile.clone()
        };

        self.take_singles(&[me.single_slot(), other.single_slot()]);

        let mut dancer = me.dancer;
        let mut partner = other.dancer;

        if me.status == RegistrationStatus::AsSingle {
            self.record(HistoryAction::SingleRemoved, dancer.profile.clone(), &dancer);
        }

        let partner_was_single = other.status == RegistrationStatus::AsSingle;
        if partner_was_single {
            self.record(HistoryAction::SingleRemoved, initiator.clone(), &partner);
        }

        dancer.single_signup = auto_pair;
        partner.single_signup = partner_was_single;

        if partner_was_single {
            let template = if auto_pair {
                NotificationTemplate::AutoPairPartnerFound
            } else {
                NotificationTemplate::RegisteredWithSingle
            };
            self.notify(template, &partner, Some(dancer.clone()), None);
        }

        let created_by = if auto_pair {
            Some(self.system.clone())
        } else {
            dancer.profile.clone()
        };
        let couple = Couple::new(dancer.clone(), partner.clone(), created_by, auto_pair, self.now);
        self.record(HistoryAction::CoupleAdded, initiator, &couple);
        self.event.couples.push(couple);

        let mut related = Registration::new(partner.clone(), RegistrationStatus::InCouple, self.event.id.clone())
            .with_result(RegistrationResult::RegisteredInCouple);
        related.partner = Some(dancer.clone());

        let mut reg = Registration::new(dancer, RegistrationStatus::InCouple, self.event.id.clone())
            .with_result(RegistrationResult::RegisteredInCouple);
        reg.partner = Some(partner);
        reg.related = Some(Box::new(related));
        reg
    }

    /// Finds a participant in the couples (either slot), then in the singles.
    fn lookup(&self, participant: &Participant) -> Lookup {
        let probe = Dancer::from_ref(&participant.reference, participant.role, self.now);

        for (idx, couple) in self.event.couples.iter().enumerate() {
            if is_same(&probe, &couple.leader) {
                return Lookup {
                    dancer: couple.leader.clone(),
                    status: RegistrationStatus::InCouple,
                    partner: Some(couple.follower.clone()),
                    slot: Some(idx),
                };
            }
            if is_same(&probe, &couple.follower) {
                return Lookup {
                    dancer: couple.follower.clone(),
                    status: RegistrationStatus::InCouple,
                    partner: Some(couple.leader.clone()),
                    slot: Some(idx),
                };
            }
        }

        if let Some(idx) = self.event.singles.iter().position(|s| is_same(&probe, s)) {
            return Lookup::single(self.event.singles[idx].clone(), idx);
        }

        Lookup::unregistered(probe)
    }

    fn registration_of(&self, found: &Lookup, forbidden: bool) -> Registration {
        let status = if forbidden && found.status == RegistrationStatus::NotRegistered {
            RegistrationStatus::Forbidden
        } else {
            found.status
        };
        let mut reg = Registration::new(found.dancer.clone(), status, self.event.id.clone());
        reg.partner = found.partner.clone();
        reg
    }

    /// Removes singles by index, highest first so earlier indices stay valid.
    fn take_singles(&mut self, slots: &[Option<usize>]) {
        let mut slots: Vec<usize> = slots.iter().flatten().copied().collect();
        slots.sort_unstable_by(|a, b| b.cmp(a));
        slots.dedup();
        for idx in slots {
            if idx < self.event.singles.len() {
                self.event.singles.remove(idx);
            }
        }
    }

    fn record<T: Serialize>(&mut self, action: HistoryAction, initiator: Option<Profile>, details: &T) {
        self.history.push(HistoryItem::new(
            action,
            initiator,
            Some(self.event.id.clone()),
            details,
            self.now,
        ));
    }

    /// Queues a notification. Dancers known only by name cannot be reached and are skipped.
    fn notify(
        &mut self,
        template: NotificationTemplate,
        recipient: &Dancer,
        partner: Option<Dancer>,
        new_partner: Option<Dancer>,
    ) {
        let Some(profile) = recipient.profile.clone() else {
            return;
        };
        let payload = NotificationPayload {
            event: self.event.event_ref(),
            partner,
            new_partner,
        };
        self.notifications.push(Notification::new(template, profile, payload));
    }
}
