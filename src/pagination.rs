//! Forward-only traversal of paginated API listings.
//!
//! A listing is fetched one [`Page`] at a time. Each page carries an opaque
//! cursor for the next one; a page without a cursor ends the listing.
//! [`Pages`] is a lazy iterator over those pages. It always starts from the
//! first page, so restarting a traversal means building a new `Pages`.

use crate::error::Result;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the next page, `None` on the last page.
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// Lazy iterator over the pages of a listing.
///
/// Yields `Err` at most once: after an error the traversal is over.
pub struct Pages<T, F>
where
    F: FnMut(Option<&str>) -> Result<Page<T>>,
{
    fetch: F,
    cursor: Option<String>,
    done: bool,
}

impl<T, F> Pages<T, F>
where
    F: FnMut(Option<&str>) -> Result<Page<T>>,
{
    /// `fetch` receives `None` for the first page and the previous page's
    /// cursor afterwards.
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            cursor: None,
            done: false,
        }
    }

    /// Drains the remaining pages into one ordered collection.
    ///
    /// Fails as a whole when any page fails; no partial list is returned.
    pub fn collect_all(self) -> Result<Vec<T>> {
        let mut all = Vec::new();
        for page in self {
            all.extend(page?);
        }
        Ok(all)
    }
}

impl<T, F> Iterator for Pages<T, F>
where
    F: FnMut(Option<&str>) -> Result<Page<T>>,
{
    type Item = Result<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match (self.fetch)(self.cursor.as_deref()) {
            Ok(page) => {
                match page.next {
                    Some(next) => self.cursor = Some(next),
                    None => self.done = true,
                }
                Some(Ok(page.items))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
