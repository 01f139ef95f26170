//! Password hashing, bearer tokens and the routes for registering and logging in.

mod log_in;
mod middleware;
mod password;
mod register;
mod token;
mod verify;

pub use log_in::post_log_in;
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use register::register_user;
pub use token::{DEFAULT_TOKEN_DURATION, JwtKeys, decode_token, encode_token};
pub use verify::get_verify;
