/// +----------------------------------------------------------+
/// | MODULES                                                  |
/// +----------+-------+-------+------------------------------+
/// | Exports:                                                 |
/// |   - dancer                                               |
/// |   - event                                                |
/// |   - history                                              |
/// |   - notification                                         |
/// |   - registration                                         |
/// +----------------------------------------------------------+

pub mod dancer;
pub mod event;
pub mod history;
pub mod notification;
pub mod registration;

pub use dancer::{Dancer, DancerRef, Participant, Profile, Role};
pub use event::{ClosedFor, Couple, Event, EventRef, EventSettings, Post};
pub use history::{HistoryAction, HistoryItem};
pub use notification::{Notification, NotificationPayload, NotificationTemplate};
pub use registration::{Registration, RegistrationResult, RegistrationStatus};
