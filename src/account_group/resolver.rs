//! Works out which account group a user's transactions and assets are filed
//! under, creating groups and joining users to them on first use.

use std::collections::HashSet;

use rusqlite::Connection;

use crate::{
    Error, UserID,
    account_group::{AccountGroupId, get_or_create_account_group},
    db::begin_immediate,
    user::{
        User, find_first_user_invited_by, find_user_by_code, get_user_by_id,
        set_account_group_if_unset,
    },
};

/// Get the account group for the user `user_id`, assigning one if the user
/// does not have a group yet.
///
/// The rules are applied in order:
/// 1. A user that already has a group keeps it.
/// 2. A user invited by an existing user joins the inviter's group.
/// 3. A user whose code was used by another user joins that user's group.
/// 4. Otherwise the user gets a new group with the user's own code.
///
/// Resolution runs in an immediate transaction and every assignment only
/// writes if the user has no group, so concurrent calls agree on the result.
///
/// # Errors
/// Returns [Error::NotFound] if the user does not exist, or [Error::SqlError]
/// if the store could not be read or written.
pub fn resolve_account_group(
    user_id: UserID,
    connection: &Connection,
) -> Result<AccountGroupId, Error> {
    let transaction = begin_immediate(connection)?;
    let account_group_id = resolve_account_group_in_transaction(user_id, &transaction)?;
    transaction.commit()?;

    Ok(account_group_id)
}

/// The same as [resolve_account_group] for callers that already hold an open
/// transaction on `connection`.
pub(crate) fn resolve_account_group_in_transaction(
    user_id: UserID,
    connection: &Connection,
) -> Result<AccountGroupId, Error> {
    let user = get_user_by_id(user_id, connection)?;

    if let Some(account_group_id) = user.account_group_id {
        return Ok(account_group_id);
    }

    if let Some(inviter_code) = &user.invited_by_code {
        match find_user_by_code(inviter_code, connection)? {
            Some(inviter) => {
                let account_group_id = ensure_inviter_account_group(inviter, user.id, connection)?;
                return set_account_group_if_unset(user.id, account_group_id, connection);
            }
            None => tracing::warn!(
                "User {} was invited with the code {inviter_code}, which does not belong to any user",
                user.id
            ),
        }
    }

    if let Some(invitee) = find_first_user_invited_by(&user.user_code, user.id, connection)? {
        let account_group_id = ensure_account_group(&invitee, connection)?;
        return set_account_group_if_unset(user.id, account_group_id, connection);
    }

    ensure_account_group(&user, connection)
}

/// Get the group of `user`, or create one keyed by the user's code and assign it.
fn ensure_account_group(user: &User, connection: &Connection) -> Result<AccountGroupId, Error> {
    if let Some(account_group_id) = user.account_group_id {
        return Ok(account_group_id);
    }

    let account_group = get_or_create_account_group(&user.user_code, user.id, connection)?;

    set_account_group_if_unset(user.id, account_group.id, connection)
}

/// Get the group of `inviter`, following the chain of inviters upwards while
/// the users along it have no group.
///
/// The chain stops at the first user with a group or with no known inviter.
/// It also stops before revisiting a user, and `resolving_user` counts as
/// visited, so in a cycle the walk never comes back round to the user being
/// resolved. The last user reached has its group ensured and assigned to
/// `inviter`, so everyone in one invitation tree ends up in the same group
/// whichever member is resolved first.
fn ensure_inviter_account_group(
    inviter: User,
    resolving_user: UserID,
    connection: &Connection,
) -> Result<AccountGroupId, Error> {
    let inviter_id = inviter.id;
    let mut visited = HashSet::from([resolving_user, inviter_id]);
    let mut root = inviter;

    while root.account_group_id.is_none() {
        let Some(next_code) = &root.invited_by_code else {
            break;
        };

        match find_user_by_code(next_code, connection)? {
            Some(next) if visited.insert(next.id) => root = next,
            _ => break,
        }
    }

    let account_group_id = ensure_account_group(&root, connection)?;

    set_account_group_if_unset(inviter_id, account_group_id, connection)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error, PasswordHash, UserCode, UserID, initialize_db,
        account_group::{get_account_group, get_or_create_account_group, resolve_account_group},
        user::{NewUser, User, create_user, get_user_by_id, set_account_group_if_unset},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize_db(&conn).unwrap();
        conn
    }

    fn insert_user(code: &str, invited_by: Option<&str>, conn: &Connection) -> User {
        create_user(
            NewUser {
                email: format!("{code}@example.com"),
                password_hash: PasswordHash::new_unchecked("hunter2"),
                user_code: UserCode::new_unchecked(code),
                invited_by_code: invited_by.map(UserCode::new_unchecked),
            },
            conn,
        )
        .unwrap()
    }

    fn count_groups(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(id) FROM account_group", [], |row| row.get(0))
            .unwrap()
    }

    #[track_caller]
    fn assert_group_code(group_id: i64, want_code: &str, conn: &Connection) {
        let group = get_account_group(group_id, conn).unwrap();
        assert_eq!(group.group_code, UserCode::new_unchecked(want_code));
    }

    #[test]
    fn user_without_invitations_gets_own_group() {
        let conn = get_test_connection();
        let user = insert_user("AAAAAA", None, &conn);

        let group_id = resolve_account_group(user.id, &conn).unwrap();

        let group = get_account_group(group_id, &conn).unwrap();
        assert_eq!(group.group_code, user.user_code);
        assert_eq!(group.created_by, user.id);
        assert_eq!(
            get_user_by_id(user.id, &conn).unwrap().account_group_id,
            Some(group_id)
        );
    }

    #[test]
    fn resolving_twice_returns_same_group() {
        let conn = get_test_connection();
        let user = insert_user("AAAAAA", None, &conn);

        let first = resolve_account_group(user.id, &conn).unwrap();
        let second = resolve_account_group(user.id, &conn).unwrap();

        assert_eq!(first, second);
        assert_eq!(count_groups(&conn), 1);
    }

    #[test]
    fn existing_group_is_kept() {
        let conn = get_test_connection();
        let owner = insert_user("AAAAAA", None, &conn);
        let user = insert_user("BBBBBB", None, &conn);
        let group = get_or_create_account_group(&owner.user_code, owner.id, &conn).unwrap();
        set_account_group_if_unset(user.id, group.id, &conn).unwrap();

        let group_id = resolve_account_group(user.id, &conn).unwrap();

        assert_eq!(group_id, group.id);
        assert_eq!(count_groups(&conn), 1);
    }

    #[test]
    fn invited_user_joins_inviters_group() {
        let conn = get_test_connection();
        let inviter = insert_user("AAAAAA", None, &conn);
        let inviter_group = resolve_account_group(inviter.id, &conn).unwrap();
        let invitee = insert_user("BBBBBB", Some("AAAAAA"), &conn);

        let invitee_group = resolve_account_group(invitee.id, &conn).unwrap();

        assert_eq!(invitee_group, inviter_group);
        assert_eq!(count_groups(&conn), 1);
    }

    #[test]
    fn invited_user_creates_group_for_inviter_without_one() {
        let conn = get_test_connection();
        let inviter = insert_user("AAAAAA", None, &conn);
        let invitee = insert_user("BBBBBB", Some("AAAAAA"), &conn);

        let invitee_group = resolve_account_group(invitee.id, &conn).unwrap();

        assert_group_code(invitee_group, "AAAAAA", &conn);
        assert_eq!(
            get_user_by_id(inviter.id, &conn).unwrap().account_group_id,
            Some(invitee_group)
        );
    }

    #[test]
    fn inviter_and_invitee_agree_in_either_order() {
        for invitee_first in [true, false] {
            let conn = get_test_connection();
            let inviter = insert_user("AAAAAA", None, &conn);
            let invitee = insert_user("BBBBBB", Some("AAAAAA"), &conn);

            let (inviter_group, invitee_group) = if invitee_first {
                let invitee_group = resolve_account_group(invitee.id, &conn).unwrap();
                (resolve_account_group(inviter.id, &conn).unwrap(), invitee_group)
            } else {
                let inviter_group = resolve_account_group(inviter.id, &conn).unwrap();
                (inviter_group, resolve_account_group(invitee.id, &conn).unwrap())
            };

            assert_eq!(
                inviter_group, invitee_group,
                "groups differ when invitee_first = {invitee_first}"
            );
            assert_eq!(count_groups(&conn), 1);
        }
    }

    #[test]
    fn user_whose_code_was_used_adopts_invitees_group() {
        let conn = get_test_connection();
        let inviter = insert_user("AAAAAA", None, &conn);
        let invitee = insert_user("BBBBBB", Some("AAAAAA"), &conn);

        let inviter_group = resolve_account_group(inviter.id, &conn).unwrap();

        assert_group_code(inviter_group, "BBBBBB", &conn);
        assert_eq!(
            get_user_by_id(invitee.id, &conn).unwrap().account_group_id,
            Some(inviter_group)
        );
    }

    #[test]
    fn dangling_invitation_falls_back_to_own_group() {
        let conn = get_test_connection();
        let user = insert_user("BBBBBB", Some("GONE00"), &conn);

        let group_id = resolve_account_group(user.id, &conn).unwrap();

        assert_group_code(group_id, "BBBBBB", &conn);
    }

    #[test]
    fn invitation_chain_converges_on_root_group() {
        let conn = get_test_connection();
        let root = insert_user("AAAAAA", None, &conn);
        let middle = insert_user("BBBBBB", Some("AAAAAA"), &conn);
        let leaf = insert_user("CCCCCC", Some("BBBBBB"), &conn);

        let leaf_group = resolve_account_group(leaf.id, &conn).unwrap();
        let middle_group = resolve_account_group(middle.id, &conn).unwrap();
        let root_group = resolve_account_group(root.id, &conn).unwrap();

        assert_group_code(leaf_group, "AAAAAA", &conn);
        assert_eq!(middle_group, leaf_group);
        assert_eq!(root_group, leaf_group);
        assert_eq!(count_groups(&conn), 1);
    }

    #[test]
    fn cyclic_invitations_terminate() {
        let conn = get_test_connection();
        // Only reachable with hand-edited data since registration requires
        // the inviter to exist first.
        insert_user("AAAAAA", Some("BBBBBB"), &conn);
        let second = insert_user("BBBBBB", Some("AAAAAA"), &conn);

        let group_id = resolve_account_group(second.id, &conn).unwrap();

        assert_group_code(group_id, "AAAAAA", &conn);
    }

    #[test]
    fn cycle_members_share_a_group_in_either_order() {
        let conn = get_test_connection();
        let first = insert_user("AAAAAA", Some("BBBBBB"), &conn);
        let second = insert_user("BBBBBB", Some("AAAAAA"), &conn);

        let first_group = resolve_account_group(first.id, &conn).unwrap();
        let second_group = resolve_account_group(second.id, &conn).unwrap();

        assert_group_code(first_group, "BBBBBB", &conn);
        assert_eq!(second_group, first_group);
        assert_eq!(count_groups(&conn), 1);
    }

    #[test]
    fn missing_user_is_not_found() {
        let conn = get_test_connection();

        assert_eq!(
            resolve_account_group(UserID::new(42), &conn),
            Err(Error::NotFound)
        );
    }
}
