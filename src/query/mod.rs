pub mod filter;
pub mod paginate;
pub mod params;
pub mod sort;

use serde::Serialize;

use paginate::{PaginationState, total_pages};
use sort::{SortKey, SortState};

/// One rendered page plus the numbers the pager needs.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageView<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Filter, sort, clamp the pager, then slice.
pub fn run<T, F>(
    items: &[T],
    keep: impl Fn(&T) -> bool,
    sort_state: &SortState<F>,
    pagination: &mut PaginationState,
) -> PageView<T>
where
    T: Clone,
    F: SortKey<T>,
{
    let filtered: Vec<T> = items.iter().filter(|item| keep(item)).cloned().collect();
    let sorted = sort::sort(filtered, sort_state.field, sort_state.direction);

    pagination.clamp(sorted.len());
    let page_items = paginate::page(&sorted, pagination.page, pagination.page_size).to_vec();

    PageView {
        items: page_items,
        page: pagination.page,
        page_size: pagination.page_size,
        total_pages: total_pages(sorted.len(), pagination.page_size),
        total_items: sorted.len(),
    }
}
