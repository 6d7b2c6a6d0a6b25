//! engine::pagination
//!
//! Sequential aggregation of paginated listings.
//!
//! Adapters fetch one page at a time and report a cursor for the next
//! one. [`all_pages`] drives that loop until no cursor remains, so `list`
//! operations return either every item or an error, never a partial
//! result. Pages are never fetched concurrently.

use std::collections::HashSet;
use std::future::Future;

use tracing::trace;

use crate::core::errors::{Error, Result};

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Cursor of the next page, `None` on the last page.
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// The final page.
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    /// A page followed by the page at `cursor`.
    pub fn with_next(items: Vec<T>, cursor: impl Into<String>) -> Self {
        Self {
            items,
            next: Some(cursor.into()),
        }
    }
}

/// Fetch every page and concatenate the items in order.
///
/// `fetch` receives `None` for the first page and the previous page's
/// cursor afterwards.
///
/// # Errors
///
/// - The first error returned by `fetch`; items already fetched are dropped
/// - `Invariant` if the backend hands out the same cursor twice
///
/// # Example
///
/// ```
/// use forgestate::engine::pagination::{all_pages, Page};
///
/// # tokio_test::block_on(async {
/// let items = all_pages(|cursor| async move {
///     Ok(match cursor.as_deref() {
///         None => Page::with_next(vec![1, 2], "2"),
///         Some("2") => Page::last(vec![3]),
///         Some(_) => unreachable!(),
///     })
/// })
/// .await
/// .unwrap();
///
/// assert_eq!(items, vec![1, 2, 3]);
/// # });
/// ```
pub async fn all_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut seen = HashSet::new();

    loop {
        let page = fetch(cursor.take()).await?;
        trace!(count = page.items.len(), next = ?page.next, "fetched page");
        items.extend(page.items);

        match page.next {
            None => return Ok(items),
            Some(next) => {
                if !seen.insert(next.clone()) {
                    return Err(Error::Invariant(format!(
                        "pagination cursor {:?} was returned twice",
                        next
                    )));
                }
                cursor = Some(next);
            }
        }
    }
}
