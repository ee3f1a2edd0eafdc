//! Background task that reports workflow status changes.
//!
//! The queue that schedules and retries these tasks is external; its whole
//! contract with this crate is [Task::run]. A task that returns `Ok` is
//! done, a task that returns `Err` is the queue's to log and retry.

use serde::Deserialize;

use crate::error::TaskError;

/// A one-off unit of background work.
pub trait Task {
    fn run(&self) -> Result<(), TaskError>;
}

/// Delivers status-change notifications.
pub trait Notifier {
    fn status_changed(&self, change: &StatusChange) -> Result<(), TaskError>;
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn status_changed(&self, change: &StatusChange) -> Result<(), TaskError> {
        (**self).status_changed(change)
    }
}

/// A workflow entry moving from one status to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub entry: i64,
    pub cm: i64,
    pub old_status: i64,
    pub new_status: i64,
}

/// The payload as the queue stores it: every field may be absent.
#[derive(Deserialize)]
struct RawChange {
    entryid: Option<i64>,
    cmid: Option<i64>,
    oldstatus: Option<i64>,
    newstatus: Option<i64>,
}

/// Sends one notification for a status change.
///
/// The input comes from the queue's opaque payload. Incomplete or malformed
/// payloads are logged and dropped without reaching the notifier; there is
/// nothing useful a retry could do with them. A notifier failure propagates
/// unchanged so the queue observes it.
pub struct StatusChangedTask<N> {
    notifier: N,
    data: serde_json::Value,
}

impl<N> StatusChangedTask<N> {
    pub fn new(notifier: N, data: serde_json::Value) -> Self {
        Self { notifier, data }
    }

    fn parse(&self) -> Option<StatusChange> {
        let raw: RawChange = serde_json::from_value(self.data.clone()).ok()?;
        Some(StatusChange {
            entry: raw.entryid?,
            cm: raw.cmid?,
            old_status: raw.oldstatus?,
            new_status: raw.newstatus?,
        })
    }
}

impl<N: Notifier> Task for StatusChangedTask<N> {
    fn run(&self) -> Result<(), TaskError> {
        let Some(change) = self.parse() else {
            log::warn!(
                "status change task is missing required data, skipping: {}",
                self.data
            );
            return Ok(());
        };
        self.notifier.status_changed(&change)
    }
}
