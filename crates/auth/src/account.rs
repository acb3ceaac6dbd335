//! The protected entity and the request shapes that act on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rolegate_core::AccountId;

use crate::{Role, is_seasoned};

// ─────────────────────────────────────────────────────────────────────────────
// Account
// ─────────────────────────────────────────────────────────────────────────────

/// A stored user account.
///
/// # Invariants
/// - `id` is assigned by the store and never changes.
/// - `username` is unique across the store (case-sensitive).
/// - `role_start_date` is the instant the *current* role took effect; it moves
///   together with `role` and is never taken from a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_digest: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub role_start_date: DateTime<Utc>,
}

impl Account {
    pub fn is_seasoned(&self, now: DateTime<Utc>) -> bool {
        is_seasoned(self.role_start_date, now)
    }

    pub fn view(&self) -> AccountView {
        AccountView::from(self)
    }
}

/// Input for registration and for an authorized create.
///
/// Carries the plaintext password; it is digested at the store boundary after
/// the policy has admitted the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// Requested changes for an update.
///
/// There is no role start date here: it is derived, never supplied.
/// `password: None` keeps the current digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPatch {
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
}

impl AccountPatch {
    /// A patch that rewrites nothing: every field as currently stored.
    pub fn from_account(account: &Account) -> Self {
        Self {
            username: account.username.clone(),
            password: None,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            role: account.role,
        }
    }
}

/// Outward projection of an account (no credentials).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: AccountId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub role_start_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub token: Option<String>,
}

impl AccountView {
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            role: account.role,
            role_start_date: account.role_start_date,
            token: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Actor
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot of the authenticated caller, resolved once per request.
///
/// The policy only reads it; it is never written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    account: Account,
}

impl ActorContext {
    pub fn new(account: Account) -> Self {
        Self { account }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn id(&self) -> AccountId {
        self.account.id
    }

    pub fn role(&self) -> Role {
        self.account.role
    }

    pub fn is_admin(&self) -> bool {
        self.account.role == Role::Admin
    }

    pub fn is_regular(&self) -> bool {
        self.account.role == Role::Regular
    }

    /// Moderator whose current role has cleared the tenure gate.
    pub fn is_seasoned_moderator(&self, now: DateTime<Utc>) -> bool {
        self.account.role == Role::Moderator && self.account.is_seasoned(now)
    }
}

impl From<Account> for ActorContext {
    fn from(account: Account) -> Self {
        Self::new(account)
    }
}
