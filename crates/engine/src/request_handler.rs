// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle, subscriptions, fan-out and RPC dispatch gating.
//!
//! The transport (`mediator-daemon`) owns the HTTP/WebSocket listener and
//! calls into this module for everything that needs session state: login,
//! subscription management, and per-event fan-out.

use std::collections::{HashMap, HashSet};

use hmac::{Hmac, Mac};
use sha2::Sha256;

use mediator_core::{
    Event, IdGen, MediatorError, ModuleId, ObjectRef, Principal, Session, SessionId, Severity,
    SubscriptionOptions, UuidIdGen, VariableRef,
};

type HmacSha256 = Hmac<Sha256>;

/// A method name a client's RPC is dispatched against. Only `Login` and
/// `Logout` are permitted while the handler is still `starting`.
const STARTING_WHITELIST: &[&str] = &["Login", "Authenticate", "Logout"];

#[derive(Debug, Clone)]
pub struct UserCredential {
    pub password: String,
    pub roles: Vec<String>,
}

/// Credentials loaded from the `UserManagement` configuration section.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub users: HashMap<String, UserCredential>,
    pub module_passwords: HashMap<ModuleId, String>,
}

/// What a client is attempting to authenticate as.
#[derive(Debug, Clone)]
pub enum LoginRequest {
    User { user: String },
    Module { module_id: ModuleId },
}

struct PendingLogin {
    principal: LoginRequest,
    challenge: String,
}

/// The challenge a session must answer with `H(password, challenge,
/// session)` before it is usable.
#[derive(Debug, Clone)]
pub struct LoginChallenge {
    pub session_id: SessionId,
    pub challenge: String,
}

/// Owns every live session and the credentials needed to authenticate new
/// ones. Subscription management, fan-out, and the abandonment sweep all
/// operate on the same session map.
pub struct RequestHandler<G: IdGen = UuidIdGen> {
    credentials: Credentials,
    sessions: HashMap<SessionId, Session>,
    pending: HashMap<SessionId, PendingLogin>,
    idle_timeout_ms: i64,
    starting: bool,
    id_gen: G,
}

impl RequestHandler<UuidIdGen> {
    /// `idle_timeout_ms` is the abandonment threshold (spec's open question
    /// (ii); 60s is the suggested, and our, default).
    pub fn new(credentials: Credentials, idle_timeout_ms: i64) -> Self {
        Self::with_id_gen(credentials, idle_timeout_ms, UuidIdGen)
    }
}

impl<G: IdGen> RequestHandler<G> {
    /// Lets tests substitute a `SequentialIdGen` for deterministic session
    /// and challenge ids.
    pub fn with_id_gen(credentials: Credentials, idle_timeout_ms: i64, id_gen: G) -> Self {
        Self {
            credentials,
            sessions: HashMap::new(),
            pending: HashMap::new(),
            idle_timeout_ms,
            starting: true,
            id_gen,
        }
    }

    /// Flips once every configured module has reached `InitComplete`.
    /// Before that, only the login handshake and logout are accepted.
    pub fn mark_started(&mut self) {
        self.starting = false;
    }

    pub fn is_starting(&self) -> bool {
        self.starting
    }

    /// Gate every RPC dispatch: `Err(Connectivity)` while starting and the
    /// method isn't whitelisted.
    pub fn check_dispatchable(&self, method: &str) -> Result<(), MediatorError> {
        if self.starting && !STARTING_WHITELIST.contains(&method) {
            return Err(MediatorError::Connectivity(
                "service is still starting".into(),
            ));
        }
        Ok(())
    }

    /// Step 1 of the handshake: issues a session id and a challenge. The
    /// caller must follow up with [`RequestHandler::authenticate`].
    pub fn login(&mut self, req: LoginRequest, now_ms: i64) -> LoginChallenge {
        let session_id = SessionId::new(self.id_gen.next());
        let challenge = self.id_gen.next();
        let _ = now_ms;
        self.pending.insert(
            session_id.clone(),
            PendingLogin {
                principal: req,
                challenge: challenge.clone(),
            },
        );
        LoginChallenge {
            session_id,
            challenge,
        }
    }

    /// Step 2: verifies `response` against the expected keyed hash and, on
    /// success, creates the live `Session`.
    pub fn authenticate(
        &mut self,
        session_id: &SessionId,
        response: &str,
        now_ms: i64,
    ) -> Result<SessionId, MediatorError> {
        let pending = self
            .pending
            .remove(session_id)
            .ok_or_else(|| MediatorError::Auth("unknown or expired login".into()))?;

        let (password, principal) = match &pending.principal {
            LoginRequest::User { user } => {
                let cred = self
                    .credentials
                    .users
                    .get(user)
                    .ok_or_else(|| MediatorError::Auth("unknown user".into()))?;
                (
                    cred.password.clone(),
                    Principal::User {
                        user: user.clone(),
                        roles: cred.roles.clone(),
                    },
                )
            }
            LoginRequest::Module { module_id } => {
                let password = self
                    .credentials
                    .module_passwords
                    .get(module_id)
                    .ok_or_else(|| MediatorError::Auth("unknown module".into()))?
                    .clone();
                (
                    password,
                    Principal::Module {
                        module_id: module_id.to_string(),
                    },
                )
            }
        };

        let expected = challenge_hash(&password, &pending.challenge, session_id);
        if expected != response {
            return Err(MediatorError::Auth("challenge response mismatch".into()));
        }

        let session = Session::new(session_id.clone(), principal, now_ms);
        self.sessions.insert(session_id.clone(), session);
        Ok(session_id.clone())
    }

    pub fn logout(&mut self, session_id: &SessionId) {
        self.sessions.remove(session_id);
        self.pending.remove(session_id);
    }

    fn session_mut(&mut self, session_id: &SessionId) -> Result<&mut Session, MediatorError> {
        self.sessions
            .get_mut(session_id)
            .ok_or_else(|| MediatorError::Request("invalid or expired session".into()))
    }

    pub fn enable_variable_value_changed_events(
        &mut self,
        session_id: &SessionId,
        variables: HashSet<VariableRef>,
        tree_roots: HashSet<ObjectRef>,
        options: SubscriptionOptions,
    ) -> Result<(), MediatorError> {
        let session = self.session_mut(session_id)?;
        session.value_changes.variables.extend(variables);
        session.value_changes.tree_roots.extend(tree_roots);
        session.value_changes.options = options;
        Ok(())
    }

    pub fn enable_variable_history_changed_events(
        &mut self,
        session_id: &SessionId,
    ) -> Result<(), MediatorError> {
        self.session_mut(session_id)?.history_changes = true;
        Ok(())
    }

    pub fn enable_config_changed_events(
        &mut self,
        session_id: &SessionId,
        objects: HashSet<ObjectRef>,
    ) -> Result<(), MediatorError> {
        self.session_mut(session_id)?.config_changes.extend(objects);
        Ok(())
    }

    pub fn enable_alarms_and_events(
        &mut self,
        session_id: &SessionId,
        min_severity: Severity,
    ) -> Result<(), MediatorError> {
        self.session_mut(session_id)?.alarm_min_severity = Some(min_severity);
        Ok(())
    }

    pub fn disable_alarms_and_events(&mut self, session_id: &SessionId) -> Result<(), MediatorError> {
        self.session_mut(session_id)?.alarm_min_severity = None;
        Ok(())
    }

    pub fn disable_change_events(&mut self, session_id: &SessionId) -> Result<(), MediatorError> {
        let session = self.session_mut(session_id)?;
        session.value_changes = Default::default();
        session.history_changes = false;
        session.config_changes.clear();
        Ok(())
    }

    /// Fans `event` out to every subscribed session's outbound queue,
    /// coalescing per the session's subscription options.
    pub fn fan_out(&mut self, event: Event) {
        for session in self.sessions.values_mut() {
            if session.wants(&event) {
                session.enqueue(event.clone());
            }
        }
    }

    pub fn record_ack(&mut self, session_id: &SessionId, now_ms: i64) {
        if let Some(session) = self.sessions.get_mut(session_id) {
            session.record_ack(now_ms);
        }
    }

    pub fn dequeue_outbound(&mut self, session_id: &SessionId) -> Option<Event> {
        self.sessions.get_mut(session_id)?.outbound.pop_front()
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().cloned().collect()
    }

    /// Purges every session whose last ack is older than the idle window,
    /// returning the ids removed. Call at ~1 Hz from the daemon's sweep
    /// loop.
    pub fn sweep_abandoned(&mut self, now_ms: i64) -> Vec<SessionId> {
        let abandoned: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|s| s.is_abandoned(now_ms, self.idle_timeout_ms))
            .map(|s| s.id.clone())
            .collect();
        for id in &abandoned {
            self.sessions.remove(id);
        }
        abandoned
    }
}

/// `H(password, challenge, session)`: HMAC-SHA-256 keyed by the password,
/// over `challenge ++ session`, truncated to its first 64 bits and rendered
/// as lowercase hex. Replaces the source's bespoke numeric digest per the
/// redesign note: a documented keyed hash removes any accidental weakness,
/// and session-id keying makes two sessions' responses non-transferable.
fn challenge_hash(password: &str, challenge: &str, session_id: &SessionId) -> String {
    let mut mac =
        HmacSha256::new_from_slice(password.as_bytes()).expect("HMAC accepts any key length");
    mac.update(challenge.as_bytes());
    mac.update(session_id.as_str().as_bytes());
    let digest = mac.finalize().into_bytes();
    let truncated = u64::from_be_bytes(digest[..8].try_into().expect("digest is >= 8 bytes"));
    format!("{truncated:016x}")
}

#[cfg(test)]
#[path = "request_handler_tests.rs"]
mod tests;
