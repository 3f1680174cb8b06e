//! Result accumulation.
//!
//! Merges an incoming page into the state: page 1 replaces the list, later
//! pages are appended in arrival order. No sorting and no deduplication; the
//! API's order within a page is kept verbatim.

use super::state::SearchState;
use crate::domain::PageResult;

/// Applies `page` to the view fields of `state`.
///
/// Also records the page's query and pagination. `total_pages` is clamped to
/// at least `page.page`, since the API reports `0` total pages for an empty
/// result set.
pub fn accumulate(state: &mut SearchState, page: &PageResult) {
    if page.page <= 1 {
        state.results.clone_from(&page.results);
    } else {
        state.results.extend(page.results.iter().cloned());
    }

    state.current_page = page.page;
    state.total_pages = page.total_pages.max(page.page);
    state.query.clone_from(&page.query);

    tracing::trace!(
        page = page.page,
        total_pages = state.total_pages,
        result_count = state.results.len(),
        "page accumulated"
    );
}
