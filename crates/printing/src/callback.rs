use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::{debug, trace};

use crate::job::JobId;
use crate::reasons::{count_reason_bits, decode_reasons, ReasonKind, ReasonSet};

/// Raw job-state and result codes reported by the transport.
pub mod codes {
    pub const JOB_QUEUED: i32 = 0;
    pub const JOB_RUNNING: i32 = 1;
    pub const JOB_BLOCKED: i32 = 2;
    pub const JOB_DONE: i32 = 3;

    pub const DONE_OK: i32 = 0;
    pub const DONE_ERROR: i32 = -1;
    pub const DONE_CANCELLED: i32 = -2;
    pub const DONE_CORRUPT: i32 = -3;
    pub const DONE_BAD_CERTIFICATE: i32 = -4;
}

/// Job state as reported to listeners.
/// 回報給監聽者的作業狀態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobState {
    Queued,
    Running,
    Blocked,
    Done,
    Other,
}

impl JobState {
    pub fn from_code(code: i32) -> Self {
        match code {
            codes::JOB_QUEUED => Self::Queued,
            codes::JOB_RUNNING => Self::Running,
            codes::JOB_BLOCKED => Self::Blocked,
            codes::JOB_DONE => Self::Done,
            _ => Self::Other,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// How a finished job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobOutcome {
    Ok,
    Error,
    Cancelled,
    Corrupt,
    BadCertificate,
    Other,
}

impl JobOutcome {
    pub fn from_code(code: i32) -> Self {
        match code {
            codes::DONE_OK => Self::Ok,
            codes::DONE_ERROR => Self::Error,
            codes::DONE_CANCELLED => Self::Cancelled,
            codes::DONE_CORRUPT => Self::Corrupt,
            codes::DONE_BAD_CERTIFICATE => Self::BadCertificate,
            _ => Self::Other,
        }
    }

    /// Outcomes whose reason bits are read with the failed-reason table.
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Error | Self::Corrupt)
    }
}

/// Progress notification as delivered by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawJobNotification {
    pub state: i32,
    pub done_result: i32,
    pub reason_bits: u64,
    pub certificate: Option<Vec<u8>>,
}

/// Structured event handed to the listener.
/// 交給監聽者的結構化作業事件。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobCallbackEvent {
    pub job_id: JobId,
    pub state: JobState,
    /// Present only when `state` is [`JobState::Done`].
    pub outcome: Option<JobOutcome>,
    pub reasons: ReasonSet,
    pub certificate: Option<Vec<u8>>,
}

/// Assembles the event for one notification.
pub fn build_event(job_id: JobId, notification: &RawJobNotification) -> JobCallbackEvent {
    let state = JobState::from_code(notification.state);
    let outcome = state
        .is_terminal()
        .then(|| JobOutcome::from_code(notification.done_result));

    let kind = match outcome {
        Some(outcome) if outcome.is_failure() => ReasonKind::Failed,
        _ => ReasonKind::Blocked,
    };
    let bound = kind.bound();
    let count = count_reason_bits(notification.reason_bits, bound);
    let reasons = if count > 0 {
        decode_reasons(notification.reason_bits, bound, kind.table(), count)
    } else {
        ReasonSet::default()
    };

    match &notification.certificate {
        Some(certificate) => trace!(%job_id, len = certificate.len(), "copying certificate"),
        None => trace!(%job_id, "there is no certificate"),
    }

    JobCallbackEvent {
        job_id,
        state,
        outcome,
        reasons,
        certificate: notification.certificate.clone(),
    }
}

/// Receives job events. May be called from any thread.
/// 接收作業事件；可能由任意執行緒呼叫。
pub trait JobListener: Send + Sync {
    fn on_job_event(&self, job_id: JobId, event: JobCallbackEvent);
}

impl<F> JobListener for F
where
    F: Fn(JobId, JobCallbackEvent) + Send + Sync,
{
    fn on_job_event(&self, job_id: JobId, event: JobCallbackEvent) {
        self(job_id, event)
    }
}

/// Forwards transport notifications to one listener.
#[derive(Clone)]
pub struct CallbackDispatcher {
    listener: Arc<dyn JobListener>,
}

impl fmt::Debug for CallbackDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackDispatcher").finish_non_exhaustive()
    }
}

impl CallbackDispatcher {
    pub fn new(listener: Arc<dyn JobListener>) -> Self {
        Self { listener }
    }

    /// Builds the event for `notification` and delivers it exactly once.
    pub fn dispatch(&self, job_id: JobId, notification: &RawJobNotification) {
        let event = build_event(job_id, notification);
        debug!(
            %job_id,
            state = ?event.state,
            outcome = ?event.outcome,
            reasons = %event.reasons,
            "dispatching job event"
        );
        self.listener.on_job_event(job_id, event);
    }
}

static ACTIVE_LISTENER: Lazy<RwLock<Option<Arc<dyn JobListener>>>> =
    Lazy::new(|| RwLock::new(None));

/// Installs the process-wide listener, returning the one it replaces.
pub fn install_listener(listener: Arc<dyn JobListener>) -> Option<Arc<dyn JobListener>> {
    let mut guard = ACTIVE_LISTENER
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    guard.replace(listener)
}

/// Removes the process-wide listener.
pub fn clear_listener() -> Option<Arc<dyn JobListener>> {
    let mut guard = ACTIVE_LISTENER
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    guard.take()
}

/// Delivers `notification` to the installed listener.
///
/// Returns false when no listener is installed. The lock is released before
/// the listener runs, so listeners may install or clear listeners themselves.
pub fn dispatch_notification(job_id: JobId, notification: &RawJobNotification) -> bool {
    let listener = ACTIVE_LISTENER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    match listener {
        Some(listener) => {
            CallbackDispatcher::new(listener).dispatch(job_id, notification);
            true
        }
        None => {
            debug!(%job_id, "no listener installed, dropping job notification");
            false
        }
    }
}
