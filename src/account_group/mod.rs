//! Account groups: the sets of users that share transactions and assets.

mod core;
mod resolver;

#[cfg(test)]
pub use core::{create_account_group, get_account_group};
pub use core::{AccountGroup, AccountGroupId, create_account_group_table, get_or_create_account_group};
pub(crate) use resolver::resolve_account_group_in_transaction;
pub use resolver::resolve_account_group;
