//! Search index sync: page through published products and push each page.

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::algolia::{SearchDocument, SearchIndex};
use crate::catalog::Catalog;

/// Name under which search sync runs are recorded.
pub const SEARCH_SYNC_WORKFLOW: &str = "algolia-sync-products";

/// Products pushed per page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Summary of one search sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSyncReport {
    /// Pages attempted.
    pub batches: u64,
    /// Products successfully pushed.
    pub indexed: u64,
    /// Published products reported by the last successful page.
    pub total_products: u64,
    /// Pages that failed to load or push.
    pub errors: u64,
    /// Offset after the last page.
    pub final_offset: u64,
}

/// Pushes every published product to the search index.
pub struct SearchSyncWorkflow<'a, C, I> {
    catalog: &'a C,
    index: &'a I,
}

impl<'a, C, I> SearchSyncWorkflow<'a, C, I>
where
    C: Catalog,
    I: SearchIndex,
{
    #[must_use]
    pub const fn new(catalog: &'a C, index: &'a I) -> Self {
        Self { catalog, index }
    }

    /// Run one full pass, always starting from offset 0.
    ///
    /// A failed page is counted and skipped; the offset advances by
    /// `page_size` regardless. For `N` published products the loop runs
    /// `ceil(N / page_size)` times. A `page_size` of 0 uses
    /// [`DEFAULT_PAGE_SIZE`].
    #[instrument(skip(self), fields(workflow = SEARCH_SYNC_WORKFLOW))]
    pub async fn run(&self, page_size: u32) -> SearchSyncReport {
        let page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        let step = u64::from(page_size);
        let mut report = SearchSyncReport::default();
        let mut total = 0_u64;

        info!(page_size, "Starting search index sync");

        loop {
            let offset = report.final_offset;
            info!(offset, limit = page_size, "Processing search batch");

            match self.catalog.list_published(page_size, offset).await {
                Ok(page) => {
                    total = page.count;
                    report.total_products = page.count;
                    if page.count == 0 {
                        break;
                    }

                    let documents: Vec<SearchDocument> =
                        page.products.iter().map(SearchDocument::from).collect();

                    match self.index.save_objects(&documents).await {
                        Ok(_) => {
                            report.indexed += u64::try_from(documents.len()).unwrap_or(u64::MAX);
                            info!(synced = documents.len(), total = report.indexed, "Search batch completed");
                        }
                        Err(e) => {
                            error!(offset, error = %e, "Search batch push failed");
                            report.errors += 1;
                        }
                    }
                }
                Err(e) => {
                    error!(offset, error = %e, "Search batch load failed");
                    report.errors += 1;
                }
            }

            report.batches += 1;
            report.final_offset += step;

            if report.final_offset >= total {
                break;
            }
        }

        if report.errors > 0 {
            warn!(
                errors = report.errors,
                indexed = report.indexed,
                "Search index sync completed with errors"
            );
        } else {
            info!(indexed = report.indexed, "Search index sync completed");
        }

        report
    }
}
