// ── Request lifecycle controller ──
//
// Wraps one async remote operation and publishes its lifecycle
// (idle / loading / succeeded / failed) through a `watch` channel.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tracing::debug;

use crmsync_api::ErrorInfo;

type Operation<A, T> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, ErrorInfo>> + Send + Sync>;

// ── RequestState ─────────────────────────────────────────────────

/// Observable lifecycle of a [`RequestController`].
///
/// Every variant except `Succeeded` carries the last good value (or the
/// configured initial value), so a refresh in progress or a failed refresh
/// never blanks what the caller was showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState<T> {
    Idle { data: Option<T> },
    Loading { data: Option<T> },
    Succeeded { data: T },
    Failed { error: ErrorInfo, data: Option<T> },
}

impl<T> RequestState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Succeeded { data } => Some(data),
            Self::Idle { data } | Self::Loading { data } | Self::Failed { data, .. } => {
                data.as_ref()
            }
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    fn take_data(&mut self) -> Option<T> {
        match std::mem::replace(self, Self::Idle { data: None }) {
            Self::Succeeded { data } => Some(data),
            Self::Idle { data } | Self::Loading { data } | Self::Failed { data, .. } => data,
        }
    }

    /// Enter `Loading`, dropping any error and keeping the data.
    fn begin_loading(&mut self) {
        let data = self.take_data();
        *self = Self::Loading { data };
    }
}

// ── SettlePolicy ─────────────────────────────────────────────────

/// Which settlement is reflected in state when `execute` calls overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SettlePolicy {
    /// Whichever call settles last overwrites the state, regardless of
    /// issue order.
    #[default]
    LastSettledWins,
    /// Only the most recently issued call may update the state; earlier
    /// calls still resolve for their callers but are ignored here.
    LatestIssuedWins,
}

// ── RequestController ────────────────────────────────────────────

/// Tracks the lifecycle of one bound async operation.
///
/// No retry, no timeout, no cancellation: a failure is published once and
/// returned to the caller. [`reset`](Self::reset) changes only what is
/// observed; an operation already in flight still runs to completion.
pub struct RequestController<A, T> {
    operation: Operation<A, T>,
    initial: Option<T>,
    policy: SettlePolicy,
    state: watch::Sender<RequestState<T>>,
    /// Bumped by `reset`. Settlements from an older epoch are discarded.
    epoch: AtomicU64,
    /// Monotonic id of the latest `execute` call.
    issued: AtomicU64,
}

impl<A, T> RequestController<A, T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(operation: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ErrorInfo>> + Send + 'static,
    {
        Self::with_initial(operation, None)
    }

    pub fn with_initial<F, Fut>(operation: F, initial: Option<T>) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ErrorInfo>> + Send + 'static,
    {
        let (state, _) = watch::channel(RequestState::Idle {
            data: initial.clone(),
        });

        Self {
            operation: Arc::new(move |args| operation(args).boxed()),
            initial,
            policy: SettlePolicy::default(),
            state,
            epoch: AtomicU64::new(0),
            issued: AtomicU64::new(0),
        }
    }

    pub fn with_policy(mut self, policy: SettlePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SettlePolicy {
        self.policy
    }

    /// Current state (cloned).
    pub fn state(&self) -> RequestState<T> {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state.subscribe()
    }

    pub fn data(&self) -> Option<T> {
        self.state.borrow().data().cloned()
    }

    pub fn error(&self) -> Option<ErrorInfo> {
        self.state.borrow().error().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Run the bound operation and publish its outcome.
    ///
    /// Resolves with the operation's own result even when that result is
    /// not reflected in state (superseded by `reset`, or by a newer call
    /// under [`SettlePolicy::LatestIssuedWins`]).
    pub async fn execute(&self, args: A) -> Result<T, ErrorInfo> {
        let epoch = self.epoch.load(Ordering::Acquire);
        let ticket = self.issued.fetch_add(1, Ordering::AcqRel) + 1;

        self.state.send_modify(RequestState::begin_loading);

        let result = (self.operation)(args).await;

        let applied = self.state.send_if_modified(|state| {
            if !self.accepts(epoch, ticket) {
                return false;
            }
            *state = match &result {
                Ok(data) => RequestState::Succeeded { data: data.clone() },
                Err(error) => RequestState::Failed {
                    error: error.clone(),
                    data: state.take_data(),
                },
            };
            true
        });

        if !applied {
            debug!(ticket, "request settled after being superseded; state unchanged");
        }

        result
    }

    /// Return to `Idle` with the initial data.
    ///
    /// Any in-flight `execute` still resolves for its caller, but its
    /// settlement will no longer touch the state.
    pub fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.state.send_replace(RequestState::Idle {
            data: self.initial.clone(),
        });
    }

    fn accepts(&self, epoch: u64, ticket: u64) -> bool {
        if self.epoch.load(Ordering::Acquire) != epoch {
            return false;
        }
        match self.policy {
            SettlePolicy::LastSettledWins => true,
            SettlePolicy::LatestIssuedWins => self.issued.load(Ordering::Acquire) == ticket,
        }
    }
}
