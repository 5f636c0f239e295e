//! Pagination utilities for list endpoints and view sessions

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Page sizes offered by the table footer
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

/// Maximum number of page buttons shown at once
const MAX_PAGE_BUTTONS: usize = 5;

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PaginationParams {
    /// Page number (1-indexed)
    pub page: Option<usize>,

    /// Items per page
    pub per_page: Option<usize>,
}

impl PaginationParams {
    /// Returns the page (1-indexed, minimum 1)
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    /// Returns the requested page size, which must be one of the menu options
    pub fn per_page(&self, default: usize) -> Result<usize, ApiError> {
        validate_page_size(self.per_page.unwrap_or(default))
    }
}

pub fn validate_page_size(per_page: usize) -> Result<usize, ApiError> {
    if PAGE_SIZE_OPTIONS.contains(&per_page) {
        Ok(per_page)
    } else {
        Err(ApiError::BadRequest(format!(
            "per_page must be one of {:?}, got {}",
            PAGE_SIZE_OPTIONS, per_page
        )))
    }
}

/// One window of an ordered collection
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub page_items: &'a [T],
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub start_index: usize,
    pub end_index: usize,
}

/// Slice `items` into the requested page.
///
/// Accepts any positive page size; page and size below 1 are treated as 1.
/// A page past the end yields an empty slice anchored at `items.len()`.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_items = items.len();

    let start_index = (page - 1).saturating_mul(page_size).min(total_items);
    let end_index = start_index.saturating_add(page_size).min(total_items);

    Page {
        page_items: &items[start_index..end_index],
        page,
        page_size,
        total_items,
        total_pages: total_items.div_ceil(page_size),
        start_index,
        end_index,
    }
}

/// Page numbers to render as buttons: at most five, centered on `page` when
/// possible and clamped at both ends.
pub fn page_window(page: usize, total_pages: usize) -> Vec<usize> {
    let half = MAX_PAGE_BUTTONS / 2;
    let (first, last) = if total_pages <= MAX_PAGE_BUTTONS {
        (1, total_pages)
    } else if page <= half + 1 {
        (1, MAX_PAGE_BUTTONS)
    } else if page + half >= total_pages {
        (total_pages + 1 - MAX_PAGE_BUTTONS, total_pages)
    } else {
        (page - half, page + half)
    };
    (first..=last).collect()
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaginationMeta {
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub has_next: bool,
    pub has_prev: bool,
    pub page_window: Vec<usize>,
}

impl<T> From<&Page<'_, T>> for PaginationMeta {
    fn from(page: &Page<'_, T>) -> Self {
        Self {
            page: page.page,
            per_page: page.page_size,
            total_items: page.total_items,
            total_pages: page.total_pages,
            start_index: page.start_index,
            end_index: page.end_index,
            has_next: page.page < page.total_pages,
            has_prev: page.page > 1,
            page_window: page_window(page.page, page.total_pages),
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
