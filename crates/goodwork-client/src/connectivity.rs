//! Backend reachability tracking.
//!
//! # Design
//! - One [`Connectivity`] instance per application, shared behind an `Arc`
//!   and injected into every request client.
//! - Two states, ONLINE (initial) and OFFLINE. Transitions into the current
//!   state are no-ops and notify nobody.
//! - Listeners run after the state lock is released so they may read
//!   [`Connectivity::state`] or report further outcomes.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

/// Snapshot of the tracker's state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectivityState {
    /// The last classified outcome said the backend is unreachable.
    pub is_offline: bool,
    /// Set on the transition back online until dismissed or the next outage.
    pub just_reconnected: bool,
}

/// Classification of a request outcome as seen by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// The backend answered successfully.
    Reachable,
    /// No response arrived (connection refused, timeout, DNS failure).
    Unreachable,
    /// The proxy in front of the backend answered `502`.
    ProxyUnreachable,
    /// The backend answered with another `5xx`.
    ServerError,
}

impl OutcomeKind {
    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reachable => "reachable",
            Self::Unreachable => "unreachable",
            Self::ProxyUnreachable => "proxy_unreachable",
            Self::ServerError => "server_error",
        }
    }

    /// Whether this outcome means the backend can be reached.
    #[must_use]
    pub const fn is_reachable(self) -> bool {
        matches!(self, Self::Reachable)
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Receiver of connectivity transitions.
pub trait ConnectivityListener: Send + Sync {
    /// Called once when the tracker goes from ONLINE to OFFLINE.
    fn on_offline(&self);
    /// Called once when the tracker goes from OFFLINE to ONLINE.
    fn on_online(&self);
}

/// Listener built from a pair of closures.
pub struct ConnectivityHandlers {
    on_offline: Box<dyn Fn() + Send + Sync>,
    on_online: Box<dyn Fn() + Send + Sync>,
}

impl ConnectivityHandlers {
    /// Pair an offline callback with an online callback.
    pub fn new(
        on_offline: impl Fn() + Send + Sync + 'static,
        on_online: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_offline: Box::new(on_offline),
            on_online: Box::new(on_online),
        }
    }
}

impl ConnectivityListener for ConnectivityHandlers {
    fn on_offline(&self) {
        (self.on_offline)();
    }

    fn on_online(&self) {
        (self.on_online)();
    }
}

/// Handle returned by [`Connectivity::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Process-wide source of truth for "can we reach the backend".
pub struct Connectivity {
    inner: Mutex<Inner>,
}

struct Inner {
    state: ConnectivityState,
    listeners: Vec<(SubscriptionId, Arc<dyn ConnectivityListener>)>,
    next_id: u64,
}

impl Connectivity {
    /// Create a tracker in the ONLINE state with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ConnectivityState::default(),
                listeners: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> ConnectivityState {
        self.lock().state
    }

    /// Shorthand for `state().is_offline`.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.lock().state.is_offline
    }

    /// Register a listener; every registered listener sees every transition.
    pub fn subscribe(&self, listener: impl ConnectivityListener + 'static) -> SubscriptionId {
        let listener: Arc<dyn ConnectivityListener> = Arc::new(listener);
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id = inner.next_id.saturating_add(1);
        inner.listeners.push((id, listener));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(existing, _)| *existing != id);
        inner.listeners.len() != before
    }

    /// Record the classification of a request outcome.
    ///
    /// Returns `true` if the outcome caused a transition.
    pub fn report_outcome(&self, kind: OutcomeKind) -> bool {
        if kind.is_reachable() {
            self.go_online()
        } else {
            self.go_offline_because(kind)
        }
    }

    /// Flip to OFFLINE and notify listeners. No-op when already offline.
    ///
    /// Returns `true` if the state changed.
    pub fn go_offline(&self) -> bool {
        self.go_offline_because(OutcomeKind::Unreachable)
    }

    /// Flip to ONLINE and notify listeners. No-op when already online.
    ///
    /// Returns `true` if the state changed.
    pub fn go_online(&self) -> bool {
        let listeners = {
            let mut inner = self.lock();
            if !inner.state.is_offline {
                return false;
            }
            inner.state = ConnectivityState {
                is_offline: false,
                just_reconnected: true,
            };
            inner.snapshot_listeners()
        };

        info!("backend reachable again");
        for listener in listeners {
            listener.on_online();
        }
        true
    }

    /// Clear the `just_reconnected` flag once the reconnect notice was shown.
    pub fn dismiss_reconnect(&self) {
        self.lock().state.just_reconnected = false;
    }

    fn go_offline_because(&self, kind: OutcomeKind) -> bool {
        let listeners = {
            let mut inner = self.lock();
            if inner.state.is_offline {
                return false;
            }
            inner.state = ConnectivityState {
                is_offline: true,
                just_reconnected: false,
            };
            inner.snapshot_listeners()
        };

        warn!(reason = %kind, "backend unreachable; switching to offline mode");
        for listener in listeners {
            listener.on_offline();
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Inner {
    fn snapshot_listeners(&self) -> Vec<Arc<dyn ConnectivityListener>> {
        self.listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Connectivity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        formatter
            .debug_struct("Connectivity")
            .field("state", &inner.state)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}
