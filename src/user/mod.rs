//! User identity: the credential store, user codes and the user endpoints.

mod code;
mod core;
mod endpoints;

pub use code::{UserCode, generate_unique_user_code};
pub use core::{
    NewUser, User, UserID, create_user, create_user_table, find_first_user_invited_by,
    find_user_by_code, get_user_by_email, get_user_by_id, is_code_taken, set_account_group_if_unset,
};
pub use endpoints::{get_current_user, get_user_by_code_endpoint};

#[cfg(test)]
pub use core::count_users;
