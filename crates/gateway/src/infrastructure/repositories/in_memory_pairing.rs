use async_trait::async_trait;
use chrono::Duration;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::debug;
use vizora_core::{PairingClaim, PairingCode, PairingSession, PairingStatus, Timestamp};
use vizora_ports::{Clock, PairingError, PairingResult, PairingStore};

/// Attempts at drawing an unused code before giving up
const MAX_CODE_ATTEMPTS: u32 = 10;

/// In-memory pairing session store
///
/// Sessions are keyed by code in a DashMap; every transition goes through
/// the map's per-key entry lock, which makes `claim` a compare-and-set.
/// Codes come from the OS CSPRNG.
pub struct InMemoryPairingStore<C: Clock> {
    clock: Arc<C>,
    sessions: Arc<DashMap<PairingCode, PairingSession>>,
    ttl: Duration,
    code_length: usize,
}

impl<C: Clock> InMemoryPairingStore<C> {
    pub fn new(clock: Arc<C>, ttl: Duration) -> Self {
        Self::with_code_length(clock, ttl, PairingCode::DEFAULT_LENGTH)
    }

    pub fn with_code_length(clock: Arc<C>, ttl: Duration, code_length: usize) -> Self {
        Self {
            clock,
            sessions: Arc::new(DashMap::new()),
            ttl,
            code_length,
        }
    }

    /// Number of stored sessions, live or not yet purged
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn generate_code(&self) -> PairingCode {
        let mut rng = OsRng;
        PairingCode::from_indices(
            (0..self.code_length).map(|_| rng.gen_range(0..PairingCode::ALPHABET.len())),
        )
    }

    /// Clone a session with its stored status replaced by the effective one
    fn effective(session: &PairingSession, now: Timestamp) -> PairingSession {
        let mut view = session.clone();
        view.status = session.status_at(now);
        view
    }
}

impl<C: Clock> Clone for InMemoryPairingStore<C> {
    fn clone(&self) -> Self {
        Self {
            clock: Arc::clone(&self.clock),
            sessions: Arc::clone(&self.sessions),
            ttl: self.ttl,
            code_length: self.code_length,
        }
    }
}

#[async_trait]
impl<C: Clock> PairingStore for InMemoryPairingStore<C> {
    async fn create(
        &self,
        device_identifier: &str,
        nickname: Option<String>,
        metadata: serde_json::Value,
    ) -> PairingResult<PairingSession> {
        let now = self.clock.now();

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = self.generate_code();
            let session = PairingSession::new(
                code.clone(),
                device_identifier,
                nickname.clone(),
                metadata.clone(),
                now,
                self.ttl,
            );

            match self.sessions.entry(code) {
                Entry::Vacant(slot) => {
                    slot.insert(session.clone());
                    return Ok(session);
                }
                // An expired session no longer reserves its code
                Entry::Occupied(mut slot) if slot.get().is_expired_at(now) => {
                    slot.insert(session.clone());
                    return Ok(session);
                }
                Entry::Occupied(_) => {
                    debug!(attempt, "Pairing code collision, drawing again");
                }
            }
        }

        Err(PairingError::CodeSpaceExhausted {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    async fn read(&self, code: &PairingCode) -> PairingResult<PairingSession> {
        let now = self.clock.now();
        self.sessions
            .get(code)
            .map(|session| Self::effective(session.value(), now))
            .ok_or(PairingError::NotFound)
    }

    async fn claim(
        &self,
        code: &PairingCode,
        claim: PairingClaim,
    ) -> PairingResult<PairingSession> {
        let now = self.clock.now();
        let mut session = self.sessions.get_mut(code).ok_or(PairingError::NotFound)?;

        match session.status_at(now) {
            PairingStatus::Expired => Err(PairingError::Expired),
            PairingStatus::Paired => Err(PairingError::AlreadyClaimed),
            PairingStatus::Pending => {
                session.mark_paired(claim);
                Ok(session.value().clone())
            }
        }
    }

    async fn release(&self, code: &PairingCode, organization_id: &str) -> PairingResult<()> {
        let mut session = self.sessions.get_mut(code).ok_or(PairingError::NotFound)?;

        match session.claimed_by_organization_id.as_deref() {
            Some(owner) if owner == organization_id => {
                session.reset_to_pending();
                Ok(())
            }
            Some(_) => Err(PairingError::AlreadyClaimed),
            None => Ok(()),
        }
    }

    async fn list_pending(&self) -> Vec<PairingSession> {
        let now = self.clock.now();
        let mut pending: Vec<PairingSession> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().status_at(now) == PairingStatus::Pending)
            .map(|entry| entry.value().clone())
            .collect();
        pending.sort_by_key(|s| s.created_at);
        pending
    }

    async fn purge_expired(&self, cutoff: Timestamp) -> usize {
        let mut removed = 0;
        self.sessions.retain(|_, session| {
            let keep = session.expires_at >= cutoff;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}
