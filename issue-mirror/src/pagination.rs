//! Offset-token pagination.
//!
//! Both APIs hand back an opaque token for the next page (Asana's
//! `next_page.offset`, GitLab's `x-next-page` header). The cursor only stops
//! when the server stops sending one.

/// One page of results plus the server's token for the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_offset: Option<String>,
}

#[cfg(test)]
impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_offset: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CursorState {
    Start,
    Next(String),
    Exhausted,
}

/// Lazy position in a paginated listing. A fresh cursor starts over from
/// the first page; a clone resumes from the same token.
///
/// ```ignore
/// let mut cursor = PageCursor::new();
/// while let Some(offset) = cursor.next_request() {
///     let page = fetch(offset.as_deref()).await?;
///     cursor.advance(page.next_offset);
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    state: CursorState,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCursor {
    pub fn new() -> Self {
        Self {
            state: CursorState::Start,
        }
    }

    /// Offset to request next: `Some(None)` for the first page,
    /// `Some(Some(token))` afterwards, `None` once the listing is exhausted.
    pub fn next_request(&self) -> Option<Option<String>> {
        match &self.state {
            CursorState::Start => Some(None),
            CursorState::Next(token) => Some(Some(token.clone())),
            CursorState::Exhausted => None,
        }
    }

    /// Record the token returned with the page just fetched.
    pub fn advance(&mut self, next_offset: Option<String>) {
        self.state = match next_offset {
            Some(token) if !token.trim().is_empty() => CursorState::Next(token),
            _ => CursorState::Exhausted,
        };
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == CursorState::Exhausted
    }
}
