//! Sync pipelines.
//!
//! - **Product sync**: ERP rows → [`mapper`] → [`import`] → [`upsert`] →
//!   catalog, sequenced by [`workflow::ProductSyncWorkflow`].
//! - **Search sync**: published catalog products → search index, page by
//!   page, by [`search::SearchSyncWorkflow`].
//!
//! Both pipelines run strictly sequentially: one outbound call at a time, no
//! retries, no shared state between runs.

pub mod import;
pub mod mapper;
pub mod runs;
pub mod search;
pub mod upsert;
pub mod workflow;

pub use import::{ImportBatch, ImportRequest, import_products};
pub use runs::SyncRunRecorder;
pub use search::{SEARCH_SYNC_WORKFLOW, SearchSyncReport, SearchSyncWorkflow};
pub use upsert::{InventoryTarget, upsert_products};
pub use workflow::{PRODUCT_SYNC_WORKFLOW, ProductSyncReport, ProductSyncWorkflow, SyncStage};
