//! Session pool for concurrent executions.

use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

use parking_lot::Mutex;

use super::{Session, SessionOptions};

#[derive(Debug)]
pub struct SessionPool {
    options: SessionOptions,
    capacity: usize,
    idle: Mutex<Vec<Session>>,
}

impl SessionPool {
    /// `capacity` bounds the idle sessions kept around, not the number handed out.
    pub fn new(options: SessionOptions, capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            options,
            capacity: capacity.max(1),
            idle: Mutex::new(Vec::with_capacity(capacity)),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn idle_len(&self) -> usize {
        self.idle.lock().len()
    }

    pub fn acquire(self: &Arc<Self>) -> PooledSession {
        let reused = self.idle.lock().pop();
        let session = reused.unwrap_or_else(|| {
            tracing::debug!("creating interpreter session");
            Session::new(self.options.clone())
        });
        PooledSession { session: Some(session), pool: Arc::clone(self) }
    }

    fn release(&self, mut session: Session) {
        session.take_locals();
        let mut idle = self.idle.lock();
        if idle.len() < self.capacity {
            idle.push(session);
        }
    }
}

/// Exclusive use of one pooled session; its namespace is cleared on drop.
#[derive(Debug)]
pub struct PooledSession {
    session: Option<Session>,
    pool: Arc<SessionPool>,
}

impl Deref for PooledSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        // Only `drop` takes the session out.
        self.session.as_ref().unwrap_or_else(|| unreachable!("pooled session already released"))
    }
}

impl DerefMut for PooledSession {
    fn deref_mut(&mut self) -> &mut Session {
        self.session.as_mut().unwrap_or_else(|| unreachable!("pooled session already released"))
    }
}

impl Drop for PooledSession {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.pool.release(session);
        }
    }
}
