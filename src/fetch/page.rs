use crate::{error::Result, http::ApiRequest};

/// Position of the next page within a paginated collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// One-based page number (`page=N`)
    Page(u32),
    /// Zero-based record offset (`offset=N`)
    Offset(u32),
}

/// Records returned by one request, plus where to continue.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub records: Vec<R>,
    /// `None` when the provider declares there is nothing after this page
    pub next: Option<Cursor>,
}

/// Stopping predicate: pagination ends at the first record for which it returns `false`.
pub type Cutoff<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;

/// A paginated collection of one provider.
pub trait PageSource {
    type Record;

    fn first_cursor(&self) -> Cursor;

    /// Request for the page at `cursor`, asking for `page_size` records.
    fn request(&self, cursor: &Cursor, page_size: u32) -> ApiRequest;

    /// Decodes a successful response body into a page.
    fn decode(&self, cursor: &Cursor, body: &str) -> Result<Page<Self::Record>>;
}
