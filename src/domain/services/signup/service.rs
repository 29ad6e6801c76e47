//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Transactional update pipeline around the registration engine.
//
// Every mutating call takes the writer lock, opens a store transaction, loads the event, runs
// the engine and, only for a successful mutation, saves and commits. After the commit the
// render is queued (still under the writer lock, so render order follows commit order), and the
// collected history items and notifications are handed to background tasks. A guard rejection
// rolls back and dispatches nothing.
//
//--------------------------------------------------------------------------------------------------
// STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name            | Description                                       | Key Methods         |
// |-----------------|---------------------------------------------------|---------------------|
// | SignupService   | Entry point for transports                        | registration_get    |
// |                 |                                                   | couple_add          |
// |                 |                                                   | single_add          |
// |                 |                                                   | dancer_remove       |
//--------------------------------------------------------------------------------------------------

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::validation::validate_participant;
use super::{ServiceResult, ServiceSettings};
use crate::domain::models::{Event, HistoryItem, Notification, Participant, Registration};
use crate::domain::services::notifier::Notifier;
use crate::domain::services::registration_engine::RegistrationEngine;
use crate::domain::services::render::RenderClient;
use crate::domain::services::supervisor::TaskSupervisor;
use crate::outbounds::store::{AggregateStore, StoreError, StoreTx};

/// Signup operations bound to event ids.
#[derive(Clone)]
pub struct SignupService {
    pub(super) settings: ServiceSettings,
    pub(super) store: Arc<dyn AggregateStore>,
    pub(super) renderer: RenderClient,
    pub(super) notifier: Notifier,
    pub(super) tasks: TaskSupervisor,
    /// Held from `begin` until the render is queued.
    pub(super) writer: Arc<Mutex<()>>,
}

impl SignupService {
    pub fn new(
        settings: ServiceSettings,
        store: Arc<dyn AggregateStore>,
        renderer: RenderClient,
        notifier: Notifier,
        tasks: TaskSupervisor,
    ) -> Self {
        Self {
            settings,
            store,
            renderer,
            notifier,
            tasks,
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn tasks(&self) -> &TaskSupervisor {
        &self.tasks
    }

    pub fn renderer(&self) -> &RenderClient {
        &self.renderer
    }

    /// Current registration of `participant`; never mutates.
    pub async fn registration_get(
        &self,
        event_id: &str,
        participant: &Participant,
    ) -> ServiceResult<Registration> {
        validate_participant(participant, &self.settings)?;
        let mut event = self.store.load(event_id).await?;
        let engine = RegistrationEngine::new(&mut event, &self.settings.system_profile);
        Ok(engine.registration_get(participant))
    }

    pub async fn couple_add(
        &self,
        event_id: &str,
        dancer: &Participant,
        partner: &Participant,
    ) -> ServiceResult<Registration> {
        validate_participant(dancer, &self.settings)?;
        validate_participant(partner, &self.settings)?;
        self.run_engine(event_id, |engine| engine.couple_add(dancer, partner))
            .await
    }

    pub async fn single_add(&self, event_id: &str, dancer: &Participant) -> ServiceResult<Registration> {
        validate_participant(dancer, &self.settings)?;
        self.run_engine(event_id, |engine| engine.single_add(dancer)).await
    }

    pub async fn dancer_remove(&self, event_id: &str, dancer: &Participant) -> ServiceResult<Registration> {
        validate_participant(dancer, &self.settings)?;
        self.run_engine(event_id, |engine| engine.dancer_remove(dancer)).await
    }

    async fn run_engine<F>(&self, event_id: &str, op: F) -> ServiceResult<Registration>
    where
        F: for<'e> FnOnce(&mut RegistrationEngine<'e>) -> Registration + Send,
    {
        let _writer = self.writer.lock().await;
        let mut tx = self.store.begin().await?;

        let loaded = tx.load(event_id).await;
        let mut event = match loaded {
            Ok(event) => event,
            Err(e) => {
                rollback(tx).await;
                return Err(e.into());
            }
        };

        let mut engine = RegistrationEngine::new(&mut event, &self.settings.system_profile);
        let reg = op(&mut engine);
        let (history, notifications) = engine.into_parts();

        if !reg.is_mutation() {
            rollback(tx).await;
            info!(event_id, result = ?reg.result, "registration unchanged");
            return Ok(reg);
        }

        tx.save(&event).await?;
        tx.commit().await?;
        info!(
            event_id,
            result = ?reg.result,
            history = history.len(),
            notifications = notifications.len(),
            "registration committed"
        );

        self.after_commit(event, history, notifications).await;
        Ok(reg)
    }

    /// Side effects of a committed change. Failures are logged, never returned.
    pub(super) async fn after_commit(
        &self,
        event: Event,
        history: Vec<HistoryItem>,
        notifications: Vec<Notification>,
    ) {
        let event_id = event.id.clone();
        if let Err(e) = self.renderer.render(event).await {
            error!(event_id = %event_id, error = %e, "failed to queue render");
        }

        if !history.is_empty() {
            let store = self.store.clone();
            self.tasks.spawn("history", async move {
                for item in history {
                    store.append_history(item).await?;
                }
                Ok::<(), StoreError>(())
            });
        }

        for notification in notifications {
            let notifier = self.notifier.clone();
            debug!(event_id = %event_id, template = %notification.template, "notification queued");
            self.tasks
                .spawn("notify", async move { notifier.dispatch(notification).await });
        }
    }
}

pub(super) async fn rollback(tx: Box<dyn StoreTx>) {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "rollback failed");
    }
}
