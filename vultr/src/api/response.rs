//! List response metadata and cursor pagination

use serde::Deserialize;
use std::future::Future;

use super::error::ApiError;

/// `meta` object attached to every Vultr list response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMeta {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub next: String,
    #[serde(default)]
    pub prev: String,
}

impl ListMeta {
    /// An empty `next` link marks the final page.
    pub fn next_cursor(&self) -> Option<&str> {
        if self.links.next.is_empty() {
            None
        } else {
            Some(&self.links.next)
        }
    }
}

/// Drive a cursor-paginated listing to completion.
///
/// The first call is made without a cursor; each subsequent call passes the
/// cursor from the previous page's meta, until the server returns an empty
/// `next` link. Any error aborts the whole listing and discards everything
/// accumulated so far.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, ApiError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, ListMeta), ApiError>>,
{
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let (page, meta) = fetch(cursor.take()).await?;
        records.extend(page);

        match meta.next_cursor() {
            Some(next) => cursor = Some(next.to_string()),
            None => return Ok(records),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    fn meta_with_next(next: &str) -> ListMeta {
        ListMeta {
            total: 0,
            links: Links {
                next: next.to_string(),
                prev: String::new(),
            },
        }
    }

    #[tokio::test]
    async fn collect_pages_concatenates_pages_in_order() {
        let mut pages = VecDeque::from(vec![
            Ok((vec![1, 2], meta_with_next("c2"))),
            Ok((vec![3], meta_with_next("c3"))),
            Ok((vec![4, 5], meta_with_next(""))),
        ]);
        let seen_cursors = Rc::new(RefCell::new(Vec::new()));

        let cursors = seen_cursors.clone();
        let records = collect_pages(move |cursor| {
            cursors.borrow_mut().push(cursor);
            let page = pages.pop_front().expect("fetch called after final page");
            async move { page }
        })
        .await
        .unwrap();

        assert_eq!(records, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            *seen_cursors.borrow(),
            vec![None, Some("c2".to_string()), Some("c3".to_string())]
        );
    }

    #[tokio::test]
    async fn collect_pages_stops_after_single_page() {
        let mut pages = VecDeque::from(vec![Ok((vec!["a"], meta_with_next("")))]);

        let records = collect_pages(move |_cursor| {
            let page = pages.pop_front().expect("fetch called after final page");
            async move { page }
        })
        .await
        .unwrap();

        assert_eq!(records, vec!["a"]);
    }

    #[tokio::test]
    async fn collect_pages_propagates_mid_listing_error() {
        let mut pages: VecDeque<Result<(Vec<i32>, ListMeta), ApiError>> = VecDeque::from(vec![
            Ok((vec![1], meta_with_next("c2"))),
            Err(ApiError::Api {
                status: 500,
                message: "boom".to_string(),
            }),
        ]);

        let result = collect_pages(move |_cursor| {
            let page = pages.pop_front().expect("fetch called after error");
            async move { page }
        })
        .await;

        assert!(matches!(result, Err(ApiError::Api { status: 500, .. })));
    }

    #[test]
    fn next_cursor_empty_means_done() {
        assert_eq!(meta_with_next("").next_cursor(), None);
        assert_eq!(meta_with_next("abc").next_cursor(), Some("abc"));
    }
}
