// Paginator - Fixed-size pages over an already ordered series
use crate::domain::error::TelemetryError;
use crate::domain::page::Page;

/// Slice `series` into the requested 1-based page.
///
/// Out-of-range page numbers are clamped into `1..=total_pages`; an empty series
/// has a single empty page. Only a zero `page_size` is an error. The series is
/// never re-ordered.
pub fn paginate<T: Clone>(series: &[T], page_number: i64, page_size: usize) -> Result<Page<T>, TelemetryError> {
    if page_size == 0 {
        return Err(TelemetryError::InvalidPageSize(0));
    }

    let total_pages = series.len().div_ceil(page_size).max(1);
    let page_number = usize::try_from(page_number).unwrap_or(1).clamp(1, total_pages);

    let start = (page_number - 1) * page_size;
    let end = (start + page_size).min(series.len());
    let items = series.get(start..end).map(<[T]>::to_vec).unwrap_or_default();

    Ok(Page {
        items,
        page_number,
        page_size,
        total_pages,
        total_items: series.len(),
    })
}

/// Converts a page size taken from a request into a `usize`, rejecting
/// zero and negative values.
pub fn page_size_from(raw: i64) -> Result<usize, TelemetryError> {
    usize::try_from(raw)
        .ok()
        .filter(|size| *size > 0)
        .ok_or(TelemetryError::InvalidPageSize(raw))
}
