//! Tradepost Core - Shared domain types.
//!
//! This crate provides the types shared by every Tradepost component:
//! - `admin` - Admin backend with the ERP and search integrations
//! - `cli` - Command-line tools for migrations and one-shot sync runs
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, statuses, product handles, and sync payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
