//! Extractors that reject malformed requests with the app's JSON error envelope
//! instead of axum's plain text rejections.

use axum::extract::{FromRequest, FromRequestParts};

use crate::Error;

/// A JSON request body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// A deserialized query string.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);

/// Deserialized path parameters.
///
/// Path parameters that do not parse are reported as [Error::NotFound].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);
