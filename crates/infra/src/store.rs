//! Account storage abstraction and an in-memory implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

use rolegate_auth::{Account, Role};
use rolegate_core::AccountId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("account {0} does not exist")]
    Missing(AccountId),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Everything needed to insert an account except the id.
///
/// The password is already digested when it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccountRecord {
    pub username: String,
    pub password_digest: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub role_start_date: DateTime<Utc>,
}

/// Create/read/update/delete store keyed by numeric id, unique on username.
pub trait AccountStore: Send + Sync {
    /// All accounts, ordered by id.
    fn list(&self) -> Result<Vec<Account>, StoreError>;
    fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError>;
    fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;
    fn insert(&self, record: NewAccountRecord) -> Result<Account, StoreError>;
    fn update(&self, account: &Account) -> Result<(), StoreError>;
    fn delete(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Run `f` as one serializable unit for `id`.
    ///
    /// Concurrent units for the same id never interleave, which is what keeps
    /// a policy decision valid until its write lands.
    fn serialize<R, F>(&self, id: AccountId, f: F) -> Result<R, StoreError>
    where
        F: FnOnce() -> R;
}

impl<S> AccountStore for Arc<S>
where
    S: AccountStore,
{
    fn list(&self) -> Result<Vec<Account>, StoreError> {
        (**self).list()
    }

    fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        (**self).find_by_id(id)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        (**self).find_by_username(username)
    }

    fn insert(&self, record: NewAccountRecord) -> Result<Account, StoreError> {
        (**self).insert(record)
    }

    fn update(&self, account: &Account) -> Result<(), StoreError> {
        (**self).update(account)
    }

    fn delete(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        (**self).delete(id)
    }

    fn serialize<R, F>(&self, id: AccountId, f: F) -> Result<R, StoreError>
    where
        F: FnOnce() -> R,
    {
        (**self).serialize(id, f)
    }
}

#[derive(Debug, Default)]
struct Accounts {
    by_id: BTreeMap<AccountId, Account>,
    last_id: u64,
}

impl Accounts {
    fn username_taken(&self, username: &str, except: Option<AccountId>) -> bool {
        self.by_id
            .values()
            .any(|a| a.username == username && Some(a.id) != except)
    }
}

/// In-memory account store for tests/dev.
///
/// Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    inner: RwLock<Accounts>,
    units: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn unit_lock(&self, id: AccountId) -> Result<Arc<Mutex<()>>, StoreError> {
        let mut units = self.units.lock().map_err(|e| poisoned(&e))?;
        Ok(units.entry(id).or_default().clone())
    }

    /// Drop the per-id mutex once no other unit holds or awaits it.
    ///
    /// Clones are only taken under the `units` lock, so the strong count is
    /// stable while it is held: 2 means the map and `unit` are the only owners.
    fn release_unit(&self, id: AccountId, unit: Arc<Mutex<()>>) {
        let mut units = match self.units.lock() {
            Ok(units) => units,
            Err(poisoned) => poisoned.into_inner(),
        };
        if Arc::strong_count(&unit) == 2 {
            units.remove(&id);
        }
    }
}

fn poisoned<E: std::fmt::Display>(err: &E) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

impl AccountStore for InMemoryAccountStore {
    fn list(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = self.inner.read().map_err(|e| poisoned(&e))?;
        Ok(accounts.by_id.values().cloned().collect())
    }

    fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let accounts = self.inner.read().map_err(|e| poisoned(&e))?;
        Ok(accounts.by_id.get(&id).cloned())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.inner.read().map_err(|e| poisoned(&e))?;
        Ok(accounts
            .by_id
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    fn insert(&self, record: NewAccountRecord) -> Result<Account, StoreError> {
        let mut accounts = self.inner.write().map_err(|e| poisoned(&e))?;
        if accounts.username_taken(&record.username, None) {
            return Err(StoreError::DuplicateUsername(record.username));
        }

        accounts.last_id += 1;
        let account = Account {
            id: AccountId::new(accounts.last_id),
            username: record.username,
            password_digest: record.password_digest,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            role: record.role,
            role_start_date: record.role_start_date,
        };
        accounts.by_id.insert(account.id, account.clone());
        Ok(account)
    }

    fn update(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.inner.write().map_err(|e| poisoned(&e))?;
        if !accounts.by_id.contains_key(&account.id) {
            return Err(StoreError::Missing(account.id));
        }
        if accounts.username_taken(&account.username, Some(account.id)) {
            return Err(StoreError::DuplicateUsername(account.username.clone()));
        }
        accounts.by_id.insert(account.id, account.clone());
        Ok(())
    }

    fn delete(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let mut accounts = self.inner.write().map_err(|e| poisoned(&e))?;
        Ok(accounts.by_id.remove(&id))
    }

    fn serialize<R, F>(&self, id: AccountId, f: F) -> Result<R, StoreError>
    where
        F: FnOnce() -> R,
    {
        let unit = self.unit_lock(id)?;
        let result = match unit.lock() {
            Ok(_guard) => Ok(f()),
            Err(e) => Err(poisoned(&e)),
        };
        self.release_unit(id, unit);
        result
    }
}
