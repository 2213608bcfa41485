//! Pagination: pure page arithmetic plus LIMIT/OFFSET application.

use serde::{Deserialize, Serialize};

use crate::error::{ApplyError, ApplyResult};
use crate::spec::PaginationParams;
use crate::sql::Query;

/// The slice a page maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    pub offset: u64,
    pub limit: u64,
    pub num_pages: u64,
}

/// The page descriptor returned alongside a paginated query, shaped for an
/// API layer to serialize back to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page_size: u64,
    pub page_number: u64,
    pub num_pages: u64,
    pub total_results: u64,
}

/// Compute the slice for a 1-indexed page.
///
/// A page past the end is not an error; it maps to an offset beyond the last
/// row and yields an empty slice. Zero rows means zero pages.
pub fn paginate(total_results: u64, page_size: u64, page_number: u64) -> ApplyResult<PageSlice> {
    if page_size == 0 {
        return Err(ApplyError::BadPagination(
            "page size must be a positive integer".into(),
        ));
    }
    if page_number == 0 {
        return Err(ApplyError::BadPagination(
            "page number must be a positive integer (pages are 1-indexed)".into(),
        ));
    }

    Ok(PageSlice {
        offset: (page_number - 1) * page_size,
        limit: page_size,
        num_pages: total_results.div_ceil(page_size),
    })
}

/// Apply pagination to a query, given the row count of the unpaginated
/// query (callers obtain it by executing a count).
pub fn apply_pagination(
    query: &Query,
    params: &PaginationParams,
    total_results: u64,
) -> ApplyResult<(Query, Page)> {
    let slice = paginate(total_results, params.page_size, params.page_number)?;

    let applied = query.clone().limit(slice.limit).offset(slice.offset);
    let page = Page {
        page_size: params.page_size,
        page_number: params.page_number,
        num_pages: slice.num_pages,
        total_results,
    };
    Ok((applied, page))
}
