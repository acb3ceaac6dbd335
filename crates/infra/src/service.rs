//! Account service: the authorization policy wired to its collaborators.
//!
//! Every operation reads the clock once, asks [`rolegate_auth::policy`] for a
//! decision, and touches the store only after admission. Mutations run inside
//! [`AccountStore::serialize`] so the decision and the write form one unit.

use chrono::{DateTime, Utc};
use thiserror::Error;

use rolegate_auth::{
    Account, AccountPatch, AccountView, ActorContext, NewAccount, Outcome, Role, policy,
};
use rolegate_core::{AccountId, Clock, DomainError};

use crate::credentials::CredentialHasher;
use crate::session::SessionResolver;
use crate::settings::{MissingUpdateTarget, Settings};
use crate::store::{AccountStore, NewAccountRecord, StoreError};
use crate::token::{Hs256TokenIssuer, TokenError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(_) => ServiceError::Conflict(err.to_string()),
            other => ServiceError::Store(other),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Forbidden => ServiceError::Forbidden,
            DomainError::NotFound => ServiceError::NotFound,
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Invalid(other.to_string()),
        }
    }
}

pub struct AccountService<S, H, C> {
    store: S,
    hasher: H,
    clock: C,
    tokens: Hs256TokenIssuer,
    missing_update_target: MissingUpdateTarget,
}

impl<S, H, C> AccountService<S, H, C>
where
    S: AccountStore,
    H: CredentialHasher,
    C: Clock,
{
    pub fn new(store: S, hasher: H, clock: C, tokens: Hs256TokenIssuer) -> Self {
        Self {
            store,
            hasher,
            clock,
            tokens,
            missing_update_target: MissingUpdateTarget::default(),
        }
    }

    pub fn from_settings(store: S, hasher: H, clock: C, settings: &Settings) -> Self {
        let tokens = Hs256TokenIssuer::new(settings.jwt_secret.as_bytes(), settings.token_ttl());
        Self::new(store, hasher, clock, tokens)
            .with_missing_update_target(settings.missing_update_target)
    }

    pub fn with_missing_update_target(mut self, mode: MissingUpdateTarget) -> Self {
        self.missing_update_target = mode;
        self
    }

    /// A resolver sharing this service's store and signing key.
    pub fn session_resolver(&self) -> SessionResolver<S>
    where
        S: Clone,
    {
        SessionResolver::new(self.store.clone(), self.tokens.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorized operations
    // ─────────────────────────────────────────────────────────────────────────

    pub fn list(&self, actor: &ActorContext) -> Result<Vec<AccountView>, ServiceError> {
        let Some(visibility) = policy::list(actor, self.clock.now()).visibility() else {
            tracing::debug!(actor = %actor.id(), "list denied");
            return Err(ServiceError::Forbidden);
        };

        Ok(self
            .store
            .list()?
            .iter()
            .filter(|account| visibility.admits(account))
            .map(Account::view)
            .collect())
    }

    pub fn get(&self, actor: &ActorContext, id: AccountId) -> Result<AccountView, ServiceError> {
        let now = self.clock.now();
        // Regular actors are refused before any lookup.
        let target = if actor.is_regular() {
            None
        } else {
            self.store.find_by_id(id)?
        };

        let outcome = policy::read_by_id(actor, now, target.as_ref()).map(Account::view);
        log_refusal(&outcome, actor, id, "read");
        Ok(outcome.into_result()?)
    }

    pub fn create(&self, actor: &ActorContext, candidate: NewAccount) -> Result<AccountView, ServiceError> {
        let now = self.clock.now();

        let candidate = match policy::create(actor, now, candidate) {
            Outcome::Ok(candidate) => candidate,
            _ => {
                tracing::debug!(actor = %actor.id(), "create denied");
                return Err(ServiceError::Forbidden);
            }
        };

        let account = self.store.insert(self.record(candidate, now))?;
        tracing::info!(
            actor = %actor.id(),
            account = %account.id,
            role = %account.role,
            "account created"
        );
        Ok(account.view())
    }

    pub fn update(
        &self,
        actor: &ActorContext,
        id: AccountId,
        patch: AccountPatch,
    ) -> Result<AccountView, ServiceError> {
        self.store.serialize(id, || -> Result<AccountView, ServiceError> {
            let now = self.clock.now();
            let existing = self.store.find_by_id(id)?;

            let outcome = match policy::update(actor, now, existing.as_ref(), &patch) {
                Outcome::NotFound if self.missing_update_target == MissingUpdateTarget::Forbidden => {
                    Outcome::Forbidden
                }
                outcome => outcome,
            };
            log_refusal(&outcome, actor, id, "update");

            let mut account = outcome.into_result()?;
            if let Some(password) = &patch.password {
                account.password_digest = self.hasher.digest(password);
            }
            self.store.update(&account)?;

            tracing::info!(
                actor = %actor.id(),
                account = %account.id,
                role = %account.role,
                role_changed = existing.is_some_and(|e| e.role != account.role),
                "account updated"
            );
            Ok(account.view())
        })?
    }

    pub fn delete(&self, actor: &ActorContext, id: AccountId) -> Result<AccountView, ServiceError> {
        self.store.serialize(id, || -> Result<AccountView, ServiceError> {
            let now = self.clock.now();
            let target = self.store.find_by_id(id)?;

            let outcome = policy::delete(actor, now, target.as_ref());
            log_refusal(&outcome, actor, id, "delete");
            let target = outcome.into_result()?;

            let removed = self.store.delete(target.id)?.ok_or(ServiceError::NotFound)?;
            tracing::info!(actor = %actor.id(), account = %removed.id, "account deleted");
            Ok(removed.view())
        })?
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Unauthenticated entry points
    // ─────────────────────────────────────────────────────────────────────────

    /// Self-service sign-up. Always creates a Regular account.
    pub fn register(&self, candidate: NewAccount) -> Result<AccountView, ServiceError> {
        let now = self.clock.now();
        let candidate = NewAccount {
            role: Role::Regular,
            ..candidate
        };

        let account = self.store.insert(self.record(candidate, now))?;
        tracing::info!(account = %account.id, "account registered");

        let token = self.tokens.issue(&account, now)?;
        Ok(account.view().with_token(token))
    }

    /// `Ok(None)` for an unknown username or a wrong password.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<AccountView>, ServiceError> {
        let Some(account) = self.store.find_by_username(username)? else {
            tracing::warn!(username, "authentication failed: unknown user");
            return Ok(None);
        };

        if !self.hasher.verify(password, &account.password_digest) {
            tracing::warn!(username, "authentication failed: bad password");
            return Ok(None);
        }

        let token = self.tokens.issue(&account, self.clock.now())?;
        Ok(Some(account.view().with_token(token)))
    }

    fn record(&self, candidate: NewAccount, now: DateTime<Utc>) -> NewAccountRecord {
        NewAccountRecord {
            password_digest: self.hasher.digest(&candidate.password),
            username: candidate.username,
            first_name: candidate.first_name,
            last_name: candidate.last_name,
            email: candidate.email,
            role: candidate.role,
            role_start_date: now,
        }
    }
}

fn log_refusal<T>(outcome: &Outcome<T>, actor: &ActorContext, target: AccountId, operation: &str) {
    match outcome {
        Outcome::Ok(_) => {}
        Outcome::NotFound => {
            tracing::debug!(actor = %actor.id(), target = %target, operation, "target not found")
        }
        Outcome::Forbidden => {
            tracing::debug!(actor = %actor.id(), target = %target, operation, "denied")
        }
    }
}
