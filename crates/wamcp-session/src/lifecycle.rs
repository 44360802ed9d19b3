// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle state, owned by the Session Handle.

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use wamcp_core::{ClientInfo, LifecycleSignal, SessionState};

use crate::protocol::LifecycleEvent;

/// Current [`SessionState`] plus the logged-in identity.
pub struct LifecycleTracker {
    state: watch::Sender<SessionState>,
    info: ArcSwapOption<ClientInfo>,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            state,
            info: ArcSwapOption::empty(),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Identity of the account. Only reported while ready.
    pub fn info(&self) -> Option<ClientInfo> {
        if !self.state().is_ready() {
            return None;
        }
        self.info.load_full().map(|info| (*info).clone())
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Apply a driver event to the state machine.
    pub fn apply(&self, event: &LifecycleEvent) {
        let signal = match event {
            LifecycleEvent::Qr(_) => LifecycleSignal::QrAvailable,
            LifecycleEvent::Ready(info) => {
                self.info.store(Some(Arc::new(info.clone())));
                LifecycleSignal::Ready
            }
            LifecycleEvent::Authenticated => LifecycleSignal::Authenticated,
            LifecycleEvent::AuthFailure(_) => LifecycleSignal::AuthFailure,
            LifecycleEvent::Disconnected(_) => LifecycleSignal::Disconnected,
            LifecycleEvent::Message(_) | LifecycleEvent::Unknown(_) => return,
        };
        self.signal(signal);
    }

    /// Feed a signal directly, e.g. when the driver process goes away.
    pub fn signal(&self, signal: LifecycleSignal) {
        self.state.send_if_modified(|state| {
            let next = state.on(signal);
            if next == *state {
                return false;
            }
            debug!(from = %state, to = %next, "session state change");
            *state = next;
            true
        });
    }
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self::new()
    }
}
