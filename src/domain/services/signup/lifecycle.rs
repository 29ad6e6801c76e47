//! Event lifecycle: creation, announcement post, settings and the startup re-render sweep.

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::time::Duration;
use tracing::{info, warn};

use super::service::{SignupService, rollback};
use super::validation::{validate_caption, validate_profile};
use super::{ServiceError, ServiceResult};
use crate::domain::models::{
    ClosedFor, Event, EventSettings, HistoryAction, HistoryItem, Post, Profile,
};
use crate::outbounds::store::StoreError;

/// Attempts at finding a free random id before giving up.
const ID_ATTEMPTS: usize = 5;

impl SignupService {
    /// Creates an unpublished event owned by `owner`.
    pub async fn create_event(
        &self,
        owner: Profile,
        caption: &str,
        settings: EventSettings,
    ) -> ServiceResult<Event> {
        validate_profile(&owner)?;
        validate_caption(caption, &self.settings)?;

        let _writer = self.writer.lock().await;
        for _ in 0..ID_ATTEMPTS {
            let event = Event::new(self.new_event_id(), caption.trim(), owner.clone())
                .with_settings(settings.clone());

            let mut tx = self.store.begin().await?;
            let inserted = tx.insert(&event).await;
            match inserted {
                Ok(()) => {}
                Err(StoreError::Conflict(id)) => {
                    warn!(event_id = %id, "generated event id already taken");
                    rollback(tx).await;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
            tx.commit().await?;
            info!(event_id = %event.id, owner = owner.id, "event created");

            let item = HistoryItem::new(
                HistoryAction::EventCreated,
                Some(owner.clone()),
                Some(event.id.clone()),
                &event,
                Utc::now(),
            );
            let store = self.store.clone();
            self.tasks
                .spawn("history", async move { store.append_history(item).await });
            return Ok(event);
        }
        Err(ServiceError::Store(StoreError::Backend(
            "could not allocate a free event id".to_string(),
        )))
    }

    pub async fn get_event(&self, event_id: &str) -> ServiceResult<Event> {
        Ok(self.store.load(event_id).await?)
    }

    /// History of an existing event.
    pub async fn event_history(&self, event_id: &str) -> ServiceResult<Vec<HistoryItem>> {
        self.store.load(event_id).await?;
        Ok(self.store.history(event_id).await?)
    }

    /// Links the event to its external announcement, which makes it published.
    pub async fn attach_post(
        &self,
        event_id: &str,
        post: Post,
        initiator: Option<Profile>,
    ) -> ServiceResult<Event> {
        if post.inline_message_id.trim().is_empty() {
            return Err(ServiceError::Validation("inline message id is empty".to_string()));
        }
        self.mutate_event(event_id, initiator, move |event| {
            event.post = Some(post.clone());
            (HistoryAction::PostAttached, serde_json::to_value(&post).unwrap_or_default())
        })
        .await
    }

    /// Replaces the event settings. Switching to or from `closed_for = all` is logged as closing
    /// or reopening the event.
    pub async fn update_settings(
        &self,
        event_id: &str,
        settings: EventSettings,
        initiator: Option<Profile>,
    ) -> ServiceResult<Event> {
        self.mutate_event(event_id, initiator, move |event| {
            let was_closed = event.settings.closed_for == ClosedFor::All;
            let is_closed = settings.closed_for == ClosedFor::All;
            let action = match (was_closed, is_closed) {
                (false, true) => HistoryAction::EventClosed,
                (true, false) => HistoryAction::EventReopened,
                _ => HistoryAction::SettingsUpdated,
            };
            let details = serde_json::to_value(&settings).unwrap_or_default();
            event.settings = settings;
            (action, details)
        })
        .await
    }

    /// Re-renders published events saved within `window`. Returns how many were queued.
    pub async fn rerender_recent(&self, window: Duration) -> ServiceResult<usize> {
        let window = chrono::Duration::from_std(window)
            .map_err(|_| ServiceError::Validation("re-render window out of range".to_string()))?;
        let events = self.store.list_updated_since(Utc::now() - window).await?;

        let mut queued = 0;
        for event in events {
            let event_id = event.id.clone();
            match self.renderer.render(event).await {
                Ok(()) => queued += 1,
                Err(e) => warn!(event_id = %event_id, error = %e, "failed to queue startup render"),
            }
        }
        info!(queued, "startup re-render sweep done");
        Ok(queued)
    }

    /// Loads, changes, saves and commits an event outside the registration engine, then runs
    /// the usual post-commit side effects.
    async fn mutate_event<F>(
        &self,
        event_id: &str,
        initiator: Option<Profile>,
        change: F,
    ) -> ServiceResult<Event>
    where
        F: FnOnce(&mut Event) -> (HistoryAction, serde_json::Value) + Send,
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

        let (action, details) = change(&mut event);
        tx.save(&event).await?;
        tx.commit().await?;
        info!(event_id, ?action, "event updated");

        let item = HistoryItem::new(action, initiator, Some(event.id.clone()), &details, Utc::now());
        self.after_commit(event.clone(), vec![item], Vec::new()).await;
        Ok(event)
    }

    fn new_event_id(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.settings.event_id_len.max(1))
            .map(char::from)
            .collect()
    }
}
