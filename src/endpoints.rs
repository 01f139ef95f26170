//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/assets/{asset_id}', use [format_endpoint].

/// The route for checking that the server and database are up.
pub const HEALTH: &str = "/health";
/// The same health check under the API prefix.
pub const HEALTH_API: &str = "/api/health";
/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for checking a bearer token.
pub const VERIFY: &str = "/api/auth/verify";
/// The route to get the current user.
pub const CURRENT_USER: &str = "/api/user";
/// The route to look up a user by their user code.
pub const USER_BY_CODE: &str = "/api/user/code/{user_code}";
/// The route to access transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for the monthly income and expense totals.
pub const TRANSACTION_STATS: &str = "/api/transactions/stats";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to access assets.
pub const ASSETS: &str = "/api/assets";
/// The route to access a single asset.
pub const ASSET: &str = "/api/assets/{asset_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: impl std::fmt::Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
