//! Activity log: processed exchanges kept in memory for the status page.
//!
//! Append-only for the process lifetime; records are never evicted, only the
//! read is windowed (`recent`). Construct once at startup and hand a clone to
//! every handler — tests get isolation by building fresh instances.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// One processed message: what came in, what went out, who sent it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub original: String,
    pub enhanced: String,
    /// Provider-supplied sender id (e.g. "whatsapp:+15551234567"); may be empty.
    pub sender: String,
}

/// In-memory store of exchanges (append, recent window, count).
#[derive(Clone)]
pub struct ActivityLog {
    inner: Arc<RwLock<Vec<Exchange>>>,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Append an exchange. Infallible; appends are atomic with respect to each
    /// other, so concurrent callers never lose or tear a record.
    pub async fn append(&self, exchange: Exchange) {
        self.inner.write().await.push(exchange);
    }

    /// Last `n` exchanges in arrival order (oldest of the window first).
    pub async fn recent(&self, n: usize) -> Vec<Exchange> {
        let g = self.inner.read().await;
        let start = g.len().saturating_sub(n);
        g[start..].to_vec()
    }

    /// Total number of exchanges appended so far.
    pub async fn count(&self) -> usize {
        self.inner.read().await.len()
    }
}
