//! # Middleware Module
//!
//! Middleware intercepts HTTP requests and responses.
//! Each module here implements one named stage of the request pipeline
//! (see `pipeline::Stage` for the full order).
//!
//! ## Our Middleware
//! - `auth`: attaches the auth handle, restores the signed-in user, guards routes
//! - `context`: builds the per-request view context (login, session, user, categories)
//! - `breadcrumbs`: builds the navigation trail from the request path
//! - `error_boundary`: renders every error response through the error view

pub mod auth;
pub mod breadcrumbs;
pub mod context;
pub mod error_boundary;
