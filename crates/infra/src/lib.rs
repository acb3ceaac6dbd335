//! Infrastructure layer: account storage, credentials, sessions, config, and
//! the service that runs the authorization policy against them.

pub mod credentials;
pub mod service;
pub mod session;
pub mod settings;
pub mod store;
pub mod token;

pub use credentials::{CredentialHasher, Sha256Hasher};
pub use service::{AccountService, ServiceError};
pub use session::{SessionError, SessionResolver};
pub use settings::{MissingUpdateTarget, Settings, SettingsError};
pub use store::{AccountStore, InMemoryAccountStore, NewAccountRecord, StoreError};
pub use token::{Hs256TokenIssuer, TokenError};
