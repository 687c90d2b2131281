//! Guard against exchanging a Google authorization code twice.
//!
//! Authorization codes are single use. A callback can fire more than once
//! (page reloads, retries), so exchanged codes are remembered for a few
//! minutes under the `usedGoogleCodes` key.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use botdesk_persistence::{KeyValueStore, USED_GOOGLE_CODES_KEY};

use crate::error::Result;

/// How long an exchanged code is remembered, in milliseconds.
pub const CODE_EXPIRY_MS: i64 = 5 * 60 * 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UsedCode {
    code: String,
    timestamp: i64,
}

/// Registry of recently exchanged Google codes.
#[derive(Clone)]
pub struct UsedCodeRegistry {
    store: Arc<dyn KeyValueStore>,
}

impl UsedCodeRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns true if `code` was exchanged within the expiry window.
    pub fn is_used(&self, code: &str) -> Result<bool> {
        self.is_used_at(code, Utc::now().timestamp_millis())
    }

    /// Records `code` as exchanged.
    pub fn mark_used(&self, code: &str) -> Result<()> {
        self.mark_used_at(code, Utc::now().timestamp_millis())
    }

    /// Forgets `code`, allowing it to be exchanged again.
    pub fn remove(&self, code: &str) -> Result<()> {
        let mut codes = self.load();
        let before = codes.len();
        codes.retain(|c| c.code != code);
        if codes.len() != before {
            self.save(&codes)?;
        }
        Ok(())
    }

    /// Forgets every code.
    pub fn clear(&self) -> Result<()> {
        Ok(self.store.remove(USED_GOOGLE_CODES_KEY)?)
    }

    fn is_used_at(&self, code: &str, now: i64) -> Result<bool> {
        let codes = self.load_fresh(now)?;
        Ok(codes.iter().any(|c| c.code == code))
    }

    fn mark_used_at(&self, code: &str, now: i64) -> Result<()> {
        let mut codes = self.load_fresh(now)?;
        if !codes.iter().any(|c| c.code == code) {
            codes.push(UsedCode {
                code: code.to_string(),
                timestamp: now,
            });
            debug!(count = codes.len(), "marked google code as used");
        }
        self.save(&codes)
    }

    /// Loads the list, pruning expired entries.
    fn load_fresh(&self, now: i64) -> Result<Vec<UsedCode>> {
        let mut codes = self.load();
        let before = codes.len();
        codes.retain(|c| now - c.timestamp < CODE_EXPIRY_MS);
        if codes.len() != before {
            self.save(&codes)?;
        }
        Ok(codes)
    }

    fn load(&self) -> Vec<UsedCode> {
        let raw = match self.store.get(USED_GOOGLE_CODES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read used google codes");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "discarding unreadable used google codes");
            Vec::new()
        })
    }

    fn save(&self, codes: &[UsedCode]) -> Result<()> {
        let raw = serde_json::to_string(codes)?;
        self.store.set(USED_GOOGLE_CODES_KEY, &raw)?;
        Ok(())
    }
}
