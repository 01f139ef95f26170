#![allow(missing_docs)]

use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};
use time::OffsetDateTime;

use crate::{
    AppState, PasswordHash, User, UserCode, build_router, endpoints,
    auth::encode_token,
    user::{NewUser, create_user},
};

pub(crate) const TEST_JWT_SECRET: &str = "nafstenoas";
pub(crate) const TEST_PASSWORD: &str = "hunter2hunter2";

/// An app state backed by an in-memory database that hashes passwords with
/// the lowest bcrypt cost.
pub(crate) fn get_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");

    AppState::new(connection, TEST_JWT_SECRET)
        .expect("Could not create app state")
        .with_password_hash_cost(4)
}

/// A test server for the full application router.
pub(crate) fn get_test_server() -> (TestServer, AppState) {
    let state = get_test_state();
    let server = TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

    (server, state)
}

/// Insert a user directly into the database and create a token for them.
pub(crate) fn insert_test_user(
    state: &AppState,
    email: &str,
    user_code: &str,
    invited_by_code: Option<&str>,
) -> (User, String) {
    let connection = state.db_connection.lock().unwrap();
    let user = create_user(
        NewUser {
            email: email.to_owned(),
            password_hash: PasswordHash::from_raw_password(TEST_PASSWORD, 4).unwrap(),
            user_code: UserCode::new_unchecked(user_code),
            invited_by_code: invited_by_code.map(UserCode::new_unchecked),
        },
        &connection,
    )
    .expect("Could not create test user");
    let token = encode_token(
        user.id,
        OffsetDateTime::now_utc(),
        state.token_duration,
        &state.jwt_keys,
    )
    .unwrap();

    (user, token)
}

/// A user registered through the API.
pub(crate) struct RegisteredUser {
    pub token: String,
    pub user: Value,
}

impl RegisteredUser {
    pub fn user_code(&self) -> &str {
        self.user["userCode"].as_str().unwrap()
    }
}

/// Register `email` through the API, optionally with an invitation code.
pub(crate) async fn register(
    server: &TestServer,
    email: &str,
    invitation_code: Option<&str>,
) -> RegisteredUser {
    let mut body = json!({"email": email, "password": TEST_PASSWORD});
    if let Some(invitation_code) = invitation_code {
        body["invitationCode"] = json!(invitation_code);
    }

    let response = server.post(endpoints::REGISTER).json(&body).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let body = response.json::<Value>();

    RegisteredUser {
        token: body["token"].as_str().unwrap().to_owned(),
        user: body["user"].clone(),
    }
}
