//! Fixed-capacity blocking pool of decoder sessions
//!
//! The pool is the service's admission-control point: it eagerly builds N
//! sessions at startup and never grows or shrinks. `acquire` blocks the
//! calling thread on a condition variable until a session is idle; the
//! returned handle gives exclusive ownership for one utterance and releases
//! the session on drop, on every exit path.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::model::{ModelBundle, SessionFactory};
use crate::session::DecoderSession;

struct PoolShared {
    /// Unordered idle set; no priority between returned sessions
    idle: Mutex<Vec<DecoderSession>>,
    available: Condvar,
}

/// Thread-safe pool of pre-built decoder sessions
pub struct DecoderPool {
    shared: Arc<PoolShared>,
    capacity: usize,
}

impl DecoderPool {
    /// Eagerly build `bundle.spec.n_decoders` sessions
    pub fn new(bundle: Arc<ModelBundle>) -> Self {
        let capacity = bundle.spec.n_decoders;
        let factory = SessionFactory::new(Arc::clone(&bundle));

        let started = Instant::now();
        let idle: Vec<DecoderSession> = (0..capacity).map(|_| factory.produce()).collect();
        tracing::info!(
            model = %bundle.spec.name,
            capacity,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "decoder pool initialized"
        );

        Self {
            shared: Arc::new(PoolShared {
                idle: Mutex::new(idle),
                available: Condvar::new(),
            }),
            capacity,
        }
    }

    /// Check out an idle session, blocking until one is available
    ///
    /// Callers beyond the pool capacity are throttled here, not rejected.
    pub fn acquire(&self) -> SessionHandle {
        let mut idle = self.shared.idle.lock();
        let session = loop {
            if let Some(session) = idle.pop() {
                break session;
            }
            self.shared.available.wait(&mut idle);
        };

        SessionHandle {
            session: Some(session),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Check out an idle session without blocking
    pub fn try_acquire(&self) -> Option<SessionHandle> {
        let session = self.shared.idle.lock().pop()?;
        Some(SessionHandle {
            session: Some(session),
            shared: Arc::clone(&self.shared),
        })
    }

    /// Fixed pool capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of currently idle sessions
    pub fn idle_count(&self) -> usize {
        self.shared.idle.lock().len()
    }
}

/// Exclusive ownership of one session between acquire and release
///
/// Dropping the handle returns the session to the idle set and wakes one
/// blocked waiter.
pub struct SessionHandle {
    session: Option<DecoderSession>,
    shared: Arc<PoolShared>,
}

impl Deref for SessionHandle {
    type Target = DecoderSession;

    fn deref(&self) -> &DecoderSession {
        self.session
            .as_ref()
            .expect("session present until handle drop")
    }
}

impl DerefMut for SessionHandle {
    fn deref_mut(&mut self) -> &mut DecoderSession {
        self.session
            .as_mut()
            .expect("session present until handle drop")
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            let mut idle = self.shared.idle.lock();
            idle.push(session);
            drop(idle);
            self.shared.available.notify_one();
        }
    }
}
