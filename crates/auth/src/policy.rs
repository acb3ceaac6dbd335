//! Authorization decision engine for account management.
//!
//! - No IO
//! - No panics
//! - No logging
//!
//! Each function classifies (actor role, actor tenure, target role, target
//! existence) into an outcome. The rules are written out per role on purpose:
//! Admin acts on everyone, a Moderator's authority over Moderators is
//! tenure-gated, and a Moderator never acts on an Admin target. None of that
//! reduces to comparing ranks.
//!
//! Callers must run "read target, decide, write" as one serializable unit per
//! target id; the engine cannot enforce that itself.

use chrono::{DateTime, Utc};

use rolegate_core::DomainError;

use crate::{Account, AccountPatch, ActorContext, NewAccount, Role};

// ─────────────────────────────────────────────────────────────────────────────
// Outcomes
// ─────────────────────────────────────────────────────────────────────────────

/// Result of a decision that may involve a target account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Ok(T),
    NotFound,
    Forbidden,
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Outcome::Forbidden)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Outcome::NotFound)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::NotFound => Outcome::NotFound,
            Outcome::Forbidden => Outcome::Forbidden,
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<T, DomainError> {
        match self {
            Outcome::Ok(value) => Ok(value),
            Outcome::NotFound => Err(DomainError::NotFound),
            Outcome::Forbidden => Err(DomainError::Forbidden),
        }
    }
}

/// Which accounts a permitted List may return.
///
/// Visibility is decided separately from single-record reads so that an
/// under-qualified moderator cannot enumerate accounts it could not read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Visibility {
    All,
    RegularAndModerator,
    RegularOnly,
}

impl Visibility {
    pub fn admits(self, account: &Account) -> bool {
        self.admits_role(account.role)
    }

    pub fn admits_role(self, role: Role) -> bool {
        match self {
            Visibility::All => true,
            Visibility::RegularAndModerator => matches!(role, Role::Regular | Role::Moderator),
            Visibility::RegularOnly => role == Role::Regular,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ListDecision {
    Permitted(Visibility),
    Denied,
}

impl ListDecision {
    pub fn visibility(self) -> Option<Visibility> {
        match self {
            ListDecision::Permitted(visibility) => Some(visibility),
            ListDecision::Denied => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decisions
// ─────────────────────────────────────────────────────────────────────────────

pub fn list(actor: &ActorContext, now: DateTime<Utc>) -> ListDecision {
    match actor.role() {
        Role::Admin => ListDecision::Permitted(Visibility::All),
        Role::Moderator if actor.account().is_seasoned(now) => {
            ListDecision::Permitted(Visibility::RegularAndModerator)
        }
        Role::Moderator => ListDecision::Permitted(Visibility::RegularOnly),
        Role::Regular => ListDecision::Denied,
    }
}

/// Single-record read.
///
/// A Regular actor is refused before existence is looked at, so it can never
/// learn whether an id exists.
pub fn read_by_id<'a>(
    actor: &ActorContext,
    now: DateTime<Utc>,
    target: Option<&'a Account>,
) -> Outcome<&'a Account> {
    if actor.is_regular() {
        return Outcome::Forbidden;
    }

    let Some(target) = target else {
        return Outcome::NotFound;
    };

    let admitted = match actor.role() {
        Role::Admin => true,
        Role::Moderator => match target.role {
            Role::Admin => false,
            Role::Regular => true,
            Role::Moderator => actor.account().is_seasoned(now),
        },
        Role::Regular => false,
    };

    if admitted {
        Outcome::Ok(target)
    } else {
        Outcome::Forbidden
    }
}

/// Create with the candidate's requested role.
///
/// The role is taken as requested. Role start date and password digest are
/// stamped by the store boundary once this admits.
pub fn create(actor: &ActorContext, now: DateTime<Utc>, candidate: NewAccount) -> Outcome<NewAccount> {
    if may_act_on(actor, now, candidate.role, candidate.role) {
        Outcome::Ok(candidate)
    } else {
        Outcome::Forbidden
    }
}

/// Update an existing account.
///
/// Admission is judged against the *existing* role, except the Regular clause
/// which looks at the requested role. On admit, returns the record to write:
/// a Moderator's request can never move role or role start date; anyone else
/// resets the role start date only on an actual role change.
pub fn update(
    actor: &ActorContext,
    now: DateTime<Utc>,
    existing: Option<&Account>,
    patch: &AccountPatch,
) -> Outcome<Account> {
    let Some(existing) = existing else {
        return Outcome::NotFound;
    };

    if !may_act_on(actor, now, existing.role, patch.role) {
        return Outcome::Forbidden;
    }

    let (role, role_start_date) = if actor.role() == Role::Moderator {
        (existing.role, existing.role_start_date)
    } else if patch.role != existing.role {
        (patch.role, now)
    } else {
        (existing.role, existing.role_start_date)
    };

    Outcome::Ok(Account {
        id: existing.id,
        username: patch.username.clone(),
        password_digest: existing.password_digest.clone(),
        first_name: patch.first_name.clone(),
        last_name: patch.last_name.clone(),
        email: patch.email.clone(),
        role,
        role_start_date,
    })
}

pub fn delete<'a>(
    actor: &ActorContext,
    now: DateTime<Utc>,
    target: Option<&'a Account>,
) -> Outcome<&'a Account> {
    let Some(target) = target else {
        return Outcome::NotFound;
    };

    if may_act_on(actor, now, target.role, target.role) {
        Outcome::Ok(target)
    } else {
        Outcome::Forbidden
    }
}

/// Shared admission rule for create, update and delete.
///
/// `gated_role` is checked by the Moderator-over-Moderator clause and
/// `regular_role` by the "anyone above Regular may handle Regulars" clause.
/// They differ only for update (existing vs requested role).
fn may_act_on(actor: &ActorContext, now: DateTime<Utc>, gated_role: Role, regular_role: Role) -> bool {
    if actor.is_admin() {
        return true;
    }
    if gated_role == Role::Moderator && actor.is_seasoned_moderator(now) {
        return true;
    }
    !actor.is_regular() && regular_role == Role::Regular
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Months, TimeZone};
    use proptest::prelude::*;
    use rolegate_core::AccountId;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 15, 12, 0, 0).unwrap()
    }

    fn months_ago(months: u32) -> DateTime<Utc> {
        now().checked_sub_months(Months::new(months)).unwrap()
    }

    fn account(id: u64, role: Role, role_start_date: DateTime<Utc>) -> Account {
        Account {
            id: AccountId::new(id),
            username: format!("user{id}"),
            password_digest: format!("digest{id}"),
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
            email: format!("user{id}@example.com"),
            role,
            role_start_date,
        }
    }

    fn actor(role: Role, role_start_date: DateTime<Utc>) -> ActorContext {
        ActorContext::new(account(100, role, role_start_date))
    }

    fn admin() -> ActorContext {
        actor(Role::Admin, months_ago(1))
    }

    fn seasoned_moderator() -> ActorContext {
        actor(Role::Moderator, months_ago(7))
    }

    fn fresh_moderator() -> ActorContext {
        actor(Role::Moderator, months_ago(5))
    }

    fn regular() -> ActorContext {
        actor(Role::Regular, months_ago(24))
    }

    fn candidate(role: Role) -> NewAccount {
        NewAccount {
            username: "candidate".to_string(),
            password: "secret".to_string(),
            first_name: "Can".to_string(),
            last_name: "Didate".to_string(),
            email: "candidate@example.com".to_string(),
            role,
        }
    }

    fn patch_for(target: &Account, role: Role) -> AccountPatch {
        AccountPatch {
            email: "changed@example.com".to_string(),
            role,
            ..AccountPatch::from_account(target)
        }
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Regular), Just(Role::Moderator), Just(Role::Admin)]
    }

    // ── list ────────────────────────────────────────────────────────────────

    #[test]
    fn list_visibility_per_actor() {
        assert_eq!(list(&admin(), now()), ListDecision::Permitted(Visibility::All));
        assert_eq!(
            list(&seasoned_moderator(), now()),
            ListDecision::Permitted(Visibility::RegularAndModerator)
        );
        assert_eq!(
            list(&fresh_moderator(), now()),
            ListDecision::Permitted(Visibility::RegularOnly)
        );
        assert_eq!(list(&regular(), now()), ListDecision::Denied);
        assert_eq!(list(&regular(), now()).visibility(), None);
        assert_eq!(list(&admin(), now()).visibility(), Some(Visibility::All));
    }

    #[test]
    fn seasoned_visibility_adds_exactly_moderators() {
        for role in Role::ALL {
            let fresh = Visibility::RegularOnly.admits_role(role);
            let seasoned = Visibility::RegularAndModerator.admits_role(role);
            assert!(!fresh || seasoned, "seasoned must be a superset");
            assert_eq!(seasoned && !fresh, role == Role::Moderator);
        }
        assert!(!Visibility::RegularAndModerator.admits_role(Role::Admin));
    }

    #[test]
    fn moderator_visibility_flips_on_the_tenure_boundary() {
        let start = months_ago(6);
        let mod_actor = actor(Role::Moderator, start);
        assert!(matches!(
            list(&mod_actor, now()),
            ListDecision::Permitted(Visibility::RegularAndModerator)
        ));
        assert!(matches!(
            list(&mod_actor, now() - Duration::days(1)),
            ListDecision::Permitted(Visibility::RegularOnly)
        ));
    }

    // ── read ────────────────────────────────────────────────────────────────

    #[test]
    fn regular_read_of_missing_id_is_forbidden_not_not_found() {
        assert_eq!(read_by_id(&regular(), now(), None), Outcome::Forbidden);
    }

    #[test]
    fn read_of_missing_id_is_not_found_for_privileged_actors() {
        assert_eq!(read_by_id(&admin(), now(), None), Outcome::NotFound);
        assert_eq!(read_by_id(&fresh_moderator(), now(), None), Outcome::NotFound);
    }

    #[test]
    fn moderator_read_rules() {
        let reg = account(1, Role::Regular, months_ago(1));
        let moderator = account(2, Role::Moderator, months_ago(1));
        let adm = account(3, Role::Admin, months_ago(1));

        for m in [seasoned_moderator(), fresh_moderator()] {
            assert!(read_by_id(&m, now(), Some(&reg)).is_ok());
            assert!(read_by_id(&m, now(), Some(&adm)).is_forbidden());
        }
        assert_eq!(read_by_id(&seasoned_moderator(), now(), Some(&moderator)), Outcome::Ok(&moderator));
        assert!(read_by_id(&fresh_moderator(), now(), Some(&moderator)).is_forbidden());
    }

    // ── create ──────────────────────────────────────────────────────────────

    #[test]
    fn seasoned_moderator_may_create_moderator() {
        let out = create(&seasoned_moderator(), now(), candidate(Role::Moderator));
        assert!(out.is_ok());
    }

    #[test]
    fn fresh_moderator_may_not_create_moderator() {
        let out = create(&fresh_moderator(), now(), candidate(Role::Moderator));
        assert!(out.is_forbidden());
    }

    #[test]
    fn moderators_never_create_admins() {
        assert!(create(&seasoned_moderator(), now(), candidate(Role::Admin)).is_forbidden());
        assert!(create(&fresh_moderator(), now(), candidate(Role::Admin)).is_forbidden());
    }

    #[test]
    fn any_non_regular_may_create_regular() {
        for a in [admin(), seasoned_moderator(), fresh_moderator()] {
            assert_eq!(
                create(&a, now(), candidate(Role::Regular)),
                Outcome::Ok(candidate(Role::Regular))
            );
        }
    }

    // ── update ──────────────────────────────────────────────────────────────

    #[test]
    fn update_of_missing_target_is_not_found() {
        let patch = patch_for(&account(1, Role::Regular, now()), Role::Regular);
        assert_eq!(update(&admin(), now(), None, &patch), Outcome::NotFound);
        assert_eq!(update(&regular(), now(), None, &patch), Outcome::NotFound);
    }

    #[test]
    fn admin_role_change_resets_tenure() {
        let target = account(1, Role::Regular, months_ago(10));
        let out = update(&admin(), now(), Some(&target), &patch_for(&target, Role::Moderator));

        let Outcome::Ok(written) = out else {
            panic!("expected admission");
        };
        assert_eq!(written.role, Role::Moderator);
        assert_eq!(written.role_start_date, now());
        assert_eq!(written.email, "changed@example.com");
        assert_eq!(written.password_digest, target.password_digest);
        assert_eq!(written.id, target.id);
    }

    #[test]
    fn admin_same_role_update_keeps_tenure() {
        let target = account(1, Role::Moderator, months_ago(10));
        let written = update(&admin(), now(), Some(&target), &patch_for(&target, Role::Moderator))
            .ok()
            .unwrap();
        assert_eq!(written.role_start_date, target.role_start_date);
    }

    #[test]
    fn moderator_cannot_change_roles_even_when_admitted() {
        let target = account(1, Role::Moderator, months_ago(2));
        let written = update(&seasoned_moderator(), now(), Some(&target), &patch_for(&target, Role::Admin))
            .ok()
            .unwrap();
        assert_eq!(written.role, Role::Moderator);
        assert_eq!(written.role_start_date, target.role_start_date);
        assert_eq!(written.email, "changed@example.com");
    }

    #[test]
    fn fresh_moderator_update_of_moderator_depends_on_requested_role() {
        let target = account(1, Role::Moderator, months_ago(2));
        assert!(update(&fresh_moderator(), now(), Some(&target), &patch_for(&target, Role::Moderator)).is_forbidden());

        // The Regular clause reads the requested role; the role itself stays pinned.
        let written = update(&fresh_moderator(), now(), Some(&target), &patch_for(&target, Role::Regular))
            .ok()
            .unwrap();
        assert_eq!(written.role, Role::Moderator);
        assert_eq!(written.role_start_date, target.role_start_date);
    }

    // ── delete ──────────────────────────────────────────────────────────────

    #[test]
    fn admin_deletes_admin() {
        let target = account(1, Role::Admin, months_ago(30));
        assert_eq!(delete(&admin(), now(), Some(&target)), Outcome::Ok(&target));
    }

    #[test]
    fn moderator_delete_of_moderator_is_tenure_gated() {
        let target = account(1, Role::Moderator, months_ago(30));
        assert!(delete(&seasoned_moderator(), now(), Some(&target)).is_ok());
        assert!(delete(&fresh_moderator(), now(), Some(&target)).is_forbidden());
    }

    #[test]
    fn delete_of_missing_target_is_not_found() {
        assert!(delete(&admin(), now(), None).is_not_found());
        assert!(delete(&regular(), now(), None).is_not_found());
    }

    #[test]
    fn outcome_maps_to_domain_errors() {
        assert_eq!(Outcome::<()>::Forbidden.into_result(), Err(DomainError::Forbidden));
        assert_eq!(Outcome::<()>::NotFound.into_result(), Err(DomainError::NotFound));
        assert_eq!(Outcome::Ok(5).into_result(), Ok(5));
    }

    // ── properties ──────────────────────────────────────────────────────────

    proptest! {
        #[test]
        fn regular_actor_is_always_refused(
            tenure in 0u32..120,
            target_role in role_strategy(),
            requested in role_strategy(),
            exists in any::<bool>(),
        ) {
            let a = actor(Role::Regular, months_ago(tenure));
            let target = account(1, target_role, months_ago(3));
            let target_ref = exists.then_some(&target);

            prop_assert_eq!(list(&a, now()), ListDecision::Denied);
            prop_assert!(read_by_id(&a, now(), target_ref).is_forbidden());
            prop_assert!(create(&a, now(), candidate(requested)).is_forbidden());
            prop_assert!(!update(&a, now(), target_ref, &patch_for(&target, requested)).is_ok());
            prop_assert!(!delete(&a, now(), target_ref).is_ok());
        }

        #[test]
        fn admin_is_invariant_under_target_role(
            tenure in 0u32..120,
            target_role in role_strategy(),
            requested in role_strategy(),
        ) {
            let a = actor(Role::Admin, months_ago(tenure));
            let target = account(1, target_role, months_ago(3));

            prop_assert_eq!(list(&a, now()), ListDecision::Permitted(Visibility::All));
            prop_assert!(read_by_id(&a, now(), Some(&target)).is_ok());
            prop_assert!(create(&a, now(), candidate(requested)).is_ok());
            prop_assert!(update(&a, now(), Some(&target), &patch_for(&target, requested)).is_ok());
            prop_assert!(delete(&a, now(), Some(&target)).is_ok());
        }

        #[test]
        fn moderator_update_never_moves_role_fields(
            tenure in 0u32..24,
            target_role in role_strategy(),
            requested in role_strategy(),
            start_offset in 0u32..60,
        ) {
            let a = actor(Role::Moderator, months_ago(tenure));
            let target = account(1, target_role, months_ago(start_offset));

            if let Outcome::Ok(written) = update(&a, now(), Some(&target), &patch_for(&target, requested)) {
                prop_assert_eq!(written.role, target.role);
                prop_assert_eq!(written.role_start_date, target.role_start_date);
            }
        }

        #[test]
        fn moderator_never_reads_or_deletes_admins(tenure in 0u32..120) {
            let a = actor(Role::Moderator, months_ago(tenure));
            let target = account(1, Role::Admin, months_ago(3));

            prop_assert!(read_by_id(&a, now(), Some(&target)).is_forbidden());
            prop_assert!(delete(&a, now(), Some(&target)).is_forbidden());
        }
    }
}
