//! Tradepost admin library.
//!
//! Keeps the catalog in step with `NetSuite` and pushes published products to
//! the Algolia search index. Exposed as a library so the CLI and the
//! integration tests drive the same workflows as the HTTP server.
//!
//! # Security
//!
//! This crate holds `NetSuite` token-based-auth credentials and an Algolia
//! write key. The admin routes are unauthenticated; only bind to loopback or
//! a private network.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod algolia;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod netsuite;
pub mod routes;
pub mod state;
pub mod sync;
