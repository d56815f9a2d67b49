//! Core types for Tradepost.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod handle;
pub mod id;
pub mod product;
pub mod status;
pub mod sync;

pub use handle::Handle;
pub use id::*;
pub use product::{ImportedProduct, InventoryQuantity, ProductFields};
pub use status::*;
pub use sync::SyncResult;
