// Expose the modules
pub mod api;
pub mod config;
pub mod domain;
pub mod outbounds;

// Re-export key types for easier usage
pub use api::{Api, AppState};
pub use config::Config;
pub use domain::models::{
    ClosedFor, Couple, Dancer, DancerRef, Event, EventSettings, HistoryAction, HistoryItem,
    Notification, NotificationTemplate, Participant, Post, Profile, Registration,
    RegistrationResult, RegistrationStatus, Role,
};
pub use domain::services::notifier::Notifier;
pub use domain::services::registration_engine::RegistrationEngine;
pub use domain::services::render::{RenderClient, RenderWorker};
pub use domain::services::signup::{ServiceError, ServiceSettings, SignupService};
pub use domain::services::supervisor::TaskSupervisor;
pub use outbounds::sinks::{LogSink, NotificationSink, RenderSink, SinkError, WebhookSink};
pub use outbounds::store::{AggregateStore, MemoryStore, StoreError, StoreTx};
