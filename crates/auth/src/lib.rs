//! `rolegate-auth`: pure authorization boundary for account management.
//!
//! This crate is intentionally decoupled from HTTP, storage and credentials:
//! every decision is a function of the actor snapshot, the target (as the
//! store currently sees it) and a clock reading.

pub mod account;
pub mod claims;
pub mod policy;
pub mod roles;
pub mod tenure;

pub use account::{Account, AccountPatch, AccountView, ActorContext, NewAccount};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use policy::{ListDecision, Outcome, Visibility};
pub use roles::Role;
pub use tenure::{TENURE_MONTHS, is_seasoned};
