//! Session and route-protection layer for the ADPA member portal.
//!
//! [`auth::AuthProvider`] owns the token store and builds the
//! [`auth::SessionManager`], the refreshing [`api::ApiClient`] and the
//! [`auth::RouteGuard`] around it. The `adpa` binary drives the same types
//! from the command line.

pub mod api;
pub mod auth;
pub mod build_info;
pub mod cli;
pub mod config;

#[cfg(test)]
pub(crate) mod testing;
