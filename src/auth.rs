// src/auth.rs
// Session-scoped sudo credential cache

use crate::runner::CommandRunner;
use crate::{MachinaError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long the authentication probe may take before the credential is
/// rejected outright.
pub const AUTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Monotonic time source. Injected so expiry tests can advance time without
/// sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock backed by `Instant::now`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A cached sudo password.
///
/// Debug output is redacted and the type implements neither `Serialize` nor
/// `Display`; the secret leaves this module only to be piped to sudo's stdin
/// by the command runner.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential(<redacted>)")
    }
}

#[derive(Default)]
struct SessionState {
    credential: Option<Credential>,
    authenticated_at: Option<Instant>,
}

/// Process-wide sudo session: unauthenticated until a credential passes the
/// probe, then authenticated until the timeout elapses or `invalidate` is
/// called.
///
/// Invariant: `credential` and `authenticated_at` are always both set or
/// both cleared. Expiry is lazy — the first read past the deadline clears
/// them; there is no background timer.
pub struct SudoSession {
    state: Mutex<SessionState>,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl SudoSession {
    pub fn new(timeout: Duration) -> Self {
        Self::with_clock(timeout, Arc::new(SystemClock))
    }

    pub fn with_clock(timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            timeout,
            clock,
        }
    }

    /// Validate `password` by running a no-op elevated command through the
    /// runner. On success the credential is cached for the session window
    /// and the window length is returned; on failure nothing is retained.
    pub async fn authenticate(
        &self,
        runner: &dyn CommandRunner,
        password: &str,
    ) -> Result<Duration> {
        let credential = Credential::new(password);
        let probe = tokio::time::timeout(
            AUTH_PROBE_TIMEOUT,
            runner.run("true", Some(&credential), None),
        )
        .await;

        let accepted = matches!(&probe, Ok(Ok(output)) if output.success());
        if !accepted {
            return Err(MachinaError::AuthenticationFailed);
        }

        let mut state = self.state.lock();
        state.credential = Some(credential);
        state.authenticated_at = Some(self.clock.now());
        Ok(self.timeout)
    }

    /// True while a cached credential is within its validity window.
    pub fn is_authenticated(&self) -> bool {
        self.with_fresh(|_| ()).is_some()
    }

    /// Snapshot of the cached credential, if still valid.
    ///
    /// Callers hand the snapshot straight to the command runner. The session
    /// can still expire between this snapshot and the elevated child
    /// spawning — an accepted window, see DESIGN.md.
    pub fn credential(&self) -> Option<Credential> {
        self.with_fresh(|state| state.credential.clone()).flatten()
    }

    /// Time left before the cached credential expires.
    pub fn remaining(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.with_fresh(|state| {
            state
                .authenticated_at
                .map(|at| self.timeout.saturating_sub(now.saturating_duration_since(at)))
        })
        .flatten()
    }

    /// Drop the cached credential immediately. Idempotent.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.credential = None;
        state.authenticated_at = None;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `f` against the state if the session is authenticated and within
    /// the window; clears expired state as a side effect of the check.
    fn with_fresh<T>(&self, f: impl FnOnce(&SessionState) -> T) -> Option<T> {
        let mut state = self.state.lock();
        match state.authenticated_at {
            Some(at) if self.clock.now().saturating_duration_since(at) < self.timeout => {
                Some(f(&state))
            }
            Some(_) => {
                state.credential = None;
                state.authenticated_at = None;
                None
            }
            None => None,
        }
    }
}
