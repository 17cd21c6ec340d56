//! Request extractors whose rejections are `ApiError`s.
//!
//! Axum's own `Json`, `Form`, `Query` and `Path` reject with plain-text bodies. These
//! wrappers run the same extraction and convert the rejection, so a malformed body or
//! a bad path segment answers with the usual JSON error and a 422.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `application/x-www-form-urlencoded` request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
pub struct ApiForm<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
