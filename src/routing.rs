//! Application router configuration with protected and unprotected route definitions.

use std::any::Any;

use axum::{
    Router,
    middleware,
    response::Response,
    routing::{delete, get, post, put},
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};

use crate::{
    AppState,
    asset::{
        create_asset_endpoint, delete_asset_endpoint, edit_asset_endpoint, get_assets_endpoint,
    },
    auth::{auth_guard, get_verify, post_log_in, register_user},
    endpoints,
    health::get_health,
    internal_error_response,
    logging::logging_middleware,
    not_found::get_404_not_found,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_stats_endpoint,
        get_transactions_endpoint,
    },
    user::{get_current_user, get_user_by_code_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::HEALTH_API, get(get_health))
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::USER_BY_CODE, get(get_user_by_code_endpoint));

    let protected_routes = Router::new()
        .route(endpoints::VERIFY, get(get_verify))
        .route(endpoints::CURRENT_USER, get(get_current_user))
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION_STATS,
            get(get_transaction_stats_endpoint),
        )
        .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
        .route(
            endpoints::ASSETS,
            get(get_assets_endpoint).post(create_asset_endpoint),
        )
        .route(
            endpoints::ASSET,
            put(edit_asset_endpoint).delete(delete_asset_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!("A route handler panicked: {detail}");

    internal_error_response()
}
