//! Core of calsync: one-way sync of local calendar appointments into a
//! cloud calendar.
//!
//! - `source`: reading appointments from the local store
//! - `transform`: mapping them into the cloud schema
//! - `reconcile`: matching against existing cloud events by join key
//! - `apply`: writing the resulting plan
//! - `pipeline`: the whole run wired together

pub mod apply;
pub mod config;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod reconcile;
pub mod remote;
pub mod source;
pub mod transform;
pub mod window;

pub use apply::{ApplyReport, CloudWriter, WriteOp};
pub use config::SyncConfig;
pub use error::{BoxError, SyncError, SyncResult};
pub use event::{
    ReminderMethod, ReminderOverride, Reminders, RemoteEvent, SourceEvent, TargetEvent, ZonedTime,
};
pub use pipeline::{Pipeline, SyncOutcome};
pub use reconcile::SyncPlan;
pub use remote::CalendarService;
pub use source::{EventSource, IcsCalendarSource};
pub use transform::EventTransformer;
pub use window::SyncWindow;
