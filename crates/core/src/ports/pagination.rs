//! Cursor pagination types for list queries.
//!
//! These types implement keyset (Relay-style) cursor pagination. One
//! contract is reused for every list the API returns: top-level queries
//! and batched relation windows both produce a [`Paginated`] built by
//! [`Paginated::from_window`].
//!
//! Invariants, for a window built from `previous_count`/`current_count`:
//!
//! - `previous_count` counts entities strictly before the cursor position
//!   in sort order (0 when no cursor was supplied);
//! - `current_count` counts entities at or after the cursor position
//!   (the full collection size when no cursor was supplied);
//! - `edges.len() == min(first, current_count)`;
//! - `has_next_page == current_count > first`;
//! - `has_previous_page == previous_count > 0`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{DomainError, DomainResult};
use crate::models::{Comment, Notification, Post, Reply, Series, Tag, User};

/// Maximum page size accepted anywhere.
pub const MAX_PAGE_SIZE: i64 = 50;
/// Page size applied when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

// =============================================================================
// Cursor Codec
// =============================================================================

/// The value a cursor encodes: one comparable field of one entity.
///
/// Either a numeric primary key (recency ordering) or a unique string
/// key such as a slug or username (alphabetical ordering).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CursorValue {
    Id(i64),
    Key(String),
}

/// Which [`CursorValue`] variant a given list orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    Id,
    Key,
}

impl CursorValue {
    pub fn kind(&self) -> CursorKind {
        match self {
            CursorValue::Id(_) => CursorKind::Id,
            CursorValue::Key(_) => CursorKind::Key,
        }
    }
}

/// Opaque pagination cursor.
///
/// The encoding is a pure function of the value; clients must treat the
/// string as an opaque token. Decode-then-compare is the only supported
/// operation, the encoded form carries no ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(pub String);

impl Cursor {
    /// Encode a cursor-field value into an opaque cursor string.
    pub fn encode(value: &CursorValue) -> Self {
        let payload = match value {
            CursorValue::Id(id) => format!("id:{}", id),
            CursorValue::Key(key) => format!("key:{}", key),
        };
        Cursor(URL_SAFE_NO_PAD.encode(payload))
    }

    /// Decode an opaque cursor string back into its value.
    ///
    /// Fails with [`DomainError::InvalidCursor`] on any malformed input;
    /// this is a client error and is never retried.
    pub fn decode(raw: &str) -> DomainResult<CursorValue> {
        let bytes = URL_SAFE_NO_PAD
            .decode(raw)
            .map_err(|e| DomainError::InvalidCursor(format!("not valid base64: {}", e)))?;
        let payload = String::from_utf8(bytes)
            .map_err(|_| DomainError::InvalidCursor("not valid UTF-8".into()))?;

        if let Some(id) = payload.strip_prefix("id:") {
            let id = id
                .parse::<i64>()
                .map_err(|_| DomainError::InvalidCursor(format!("not a numeric id: {}", id)))?;
            return Ok(CursorValue::Id(id));
        }
        if let Some(key) = payload.strip_prefix("key:") {
            if key.is_empty() {
                return Err(DomainError::InvalidCursor("empty key".into()));
            }
            return Ok(CursorValue::Key(key.to_string()));
        }

        Err(DomainError::InvalidCursor("unknown cursor format".into()))
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Ordering & Page Arguments
// =============================================================================

/// Ordering direction for sorted queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    /// Ascending order (smallest first).
    Asc,
    /// Descending order (largest first).
    #[default]
    Desc,
}

/// Validated arguments for a top-level paginated query.
///
/// Construction rejects out-of-bounds `first` and malformed cursors
/// before any query executes.
#[derive(Debug, Clone)]
pub struct PageArgs {
    pub first: i64,
    pub after: Option<CursorValue>,
    pub order: OrderDirection,
}

impl PageArgs {
    pub fn new(
        first: Option<i32>,
        after: Option<&str>,
        order: OrderDirection,
    ) -> DomainResult<Self> {
        Ok(Self {
            first: validate_first(first)?,
            after: after.map(Cursor::decode).transpose()?,
            order,
        })
    }
}

/// Validated arguments for a relation-level fetch.
///
/// Relation windows deliberately support only a first page: no `after`.
/// Callers needing the second page of a relation re-query it through the
/// matching top-level list instead of the batched parent fetch.
///
/// Hashable so it can key a loader batch; requests with different args
/// form separate batches and separate queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationArgs {
    pub first: i64,
    pub order: OrderDirection,
}

impl RelationArgs {
    pub fn new(first: Option<i32>, order: OrderDirection) -> DomainResult<Self> {
        Ok(Self {
            first: validate_first(first)?,
            order,
        })
    }
}

fn validate_first(first: Option<i32>) -> DomainResult<i64> {
    let first = i64::from(first.unwrap_or(DEFAULT_PAGE_SIZE as i32));
    if !(1..=MAX_PAGE_SIZE).contains(&first) {
        return Err(DomainError::InvalidPaginationArgs {
            argument: "first",
            message: format!("must be between 1 and {}, got {}", MAX_PAGE_SIZE, first),
        });
    }
    Ok(first)
}

// =============================================================================
// Paginated Result Set
// =============================================================================

/// A single item in a paginated result.
///
/// The cursor is always derived from the node's cursor field, never
/// stored separately.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<T> {
    pub node: T,
    pub cursor: Cursor,
}

/// Information about the current page in a paginated result.
#[derive(Debug, Clone, PartialEq)]
pub struct PageInfo {
    pub start_cursor: Option<Cursor>,
    pub end_cursor: Option<Cursor>,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

/// Paginated result set with edges, page info and the two window counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
    /// Entities at or after the cursor position (full size without cursor).
    pub current_count: i64,
    /// Entities strictly before the cursor position (0 without cursor).
    pub previous_count: i64,
}

/// Exposes the cursor-field value of a model, for edge cursor derivation.
pub trait Cursored {
    fn cursor_value(&self) -> CursorValue;
}

impl<T: Cursored> Paginated<T> {
    /// Build a page from an ordered, already-limited window of rows plus
    /// the two counts computed alongside it.
    ///
    /// This is the single formatting step shared by standalone list
    /// queries and per-parent windows coming out of a batched fetch.
    pub fn from_window(
        rows: Vec<T>,
        previous_count: i64,
        current_count: i64,
        first: i64,
    ) -> Self {
        let edges: Vec<Edge<T>> = rows
            .into_iter()
            .map(|node| Edge {
                cursor: Cursor::encode(&node.cursor_value()),
                node,
            })
            .collect();

        let page_info = PageInfo {
            start_cursor: edges.first().map(|e| e.cursor.clone()),
            end_cursor: edges.last().map(|e| e.cursor.clone()),
            has_previous_page: previous_count > 0,
            has_next_page: current_count > first,
        };

        Self {
            edges,
            page_info,
            current_count,
            previous_count,
        }
    }
}

impl<T> Paginated<T> {
    /// The page a parent with no matching children gets.
    pub fn empty() -> Self {
        Self {
            edges: Vec::new(),
            page_info: PageInfo {
                start_cursor: None,
                end_cursor: None,
                has_previous_page: false,
                has_next_page: false,
            },
            current_count: 0,
            previous_count: 0,
        }
    }
}

// =============================================================================
// Cursor fields per model
// =============================================================================

impl Cursored for Post {
    fn cursor_value(&self) -> CursorValue {
        CursorValue::Id(self.id)
    }
}

impl Cursored for Series {
    fn cursor_value(&self) -> CursorValue {
        CursorValue::Id(self.id)
    }
}

impl Cursored for Comment {
    fn cursor_value(&self) -> CursorValue {
        CursorValue::Id(self.id)
    }
}

impl Cursored for Reply {
    fn cursor_value(&self) -> CursorValue {
        CursorValue::Id(self.id)
    }
}

impl Cursored for Notification {
    fn cursor_value(&self) -> CursorValue {
        CursorValue::Id(self.id)
    }
}

impl Cursored for User {
    fn cursor_value(&self) -> CursorValue {
        CursorValue::Key(self.username.clone())
    }
}

impl Cursored for Tag {
    fn cursor_value(&self) -> CursorValue {
        CursorValue::Key(self.slug.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(i64);

    impl Cursored for Item {
        fn cursor_value(&self) -> CursorValue {
            CursorValue::Id(self.0)
        }
    }

    fn items(ids: &[i64]) -> Vec<Item> {
        ids.iter().copied().map(Item).collect()
    }

    // Test critique: decode(encode(v)) == v pour toutes les valeurs valides
    #[test]
    fn test_cursor_round_trip() {
        for id in [0i64, 1, 42, -7, i64::MAX, i64::MIN] {
            let v = CursorValue::Id(id);
            assert_eq!(Cursor::decode(&Cursor::encode(&v).0).unwrap(), v);
        }
        for key in ["a", "some-slug", "héloïse", "with:colon", "x y z"] {
            let v = CursorValue::Key(key.to_string());
            assert_eq!(Cursor::decode(&Cursor::encode(&v).0).unwrap(), v);
        }
    }

    // Test critique: toute entrée malformée est un InvalidCursor, jamais un panic
    #[test]
    fn test_cursor_decode_rejects_malformed_input() {
        let no_prefix = URL_SAFE_NO_PAD.encode("no-prefix");
        let bad_id = URL_SAFE_NO_PAD.encode("id:abc");
        let empty_key = URL_SAFE_NO_PAD.encode("key:");
        let bad_utf8 = URL_SAFE_NO_PAD.encode([0xffu8, 0xfe]);

        for raw in [
            "not base64 !!",
            "",
            no_prefix.as_str(),
            bad_id.as_str(),
            empty_key.as_str(),
            bad_utf8.as_str(),
        ] {
            let err = Cursor::decode(raw).unwrap_err();
            assert!(
                matches!(err, DomainError::InvalidCursor(_)),
                "expected InvalidCursor for {:?}, got {:?}",
                raw,
                err
            );
        }
    }

    #[test]
    fn test_cursor_encoding_distinct_for_distinct_values() {
        let a = Cursor::encode(&CursorValue::Id(12));
        let b = Cursor::encode(&CursorValue::Id(120));
        let c = Cursor::encode(&CursorValue::Key("12".into()));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_first_bounds_rejected_not_clamped() {
        assert!(PageArgs::new(Some(0), None, OrderDirection::Desc).is_err());
        assert!(PageArgs::new(Some(-3), None, OrderDirection::Desc).is_err());
        assert!(PageArgs::new(Some(51), None, OrderDirection::Desc).is_err());
        assert!(RelationArgs::new(Some(1000), OrderDirection::Asc).is_err());

        let args = PageArgs::new(None, None, OrderDirection::Desc).unwrap();
        assert_eq!(args.first, DEFAULT_PAGE_SIZE);
        let args = RelationArgs::new(Some(50), OrderDirection::Asc).unwrap();
        assert_eq!(args.first, 50);
    }

    #[test]
    fn test_page_args_decodes_after_cursor() {
        let cursor = Cursor::encode(&CursorValue::Id(99));
        let args = PageArgs::new(Some(5), Some(&cursor.0), OrderDirection::Desc).unwrap();
        assert_eq!(args.after, Some(CursorValue::Id(99)));

        let err = PageArgs::new(Some(5), Some("garbage!"), OrderDirection::Desc).unwrap_err();
        assert!(matches!(err, DomainError::InvalidCursor(_)));
    }

    // Scénario A, première page: 10 éléments, first=5, pas de curseur
    #[test]
    fn test_window_first_page() {
        let page = Paginated::from_window(items(&[10, 9, 8, 7, 6]), 0, 10, 5);

        assert_eq!(page.edges.len(), 5);
        assert_eq!(page.current_count, 10);
        assert_eq!(page.previous_count, 0);
        assert!(page.page_info.has_next_page);
        assert!(!page.page_info.has_previous_page);
        assert_eq!(
            page.page_info.end_cursor,
            Some(Cursor::encode(&CursorValue::Id(6)))
        );
    }

    // Scénario A, deuxième page: after = curseur du 5e edge, first=4
    // current=5 (strictement après), previous=5 (curseur inclus)
    #[test]
    fn test_window_second_page() {
        let page = Paginated::from_window(items(&[5, 4, 3, 2]), 5, 5, 4);

        assert_eq!(page.edges.len(), 4);
        assert_eq!(page.current_count, 5);
        assert_eq!(page.previous_count, 5);
        assert!(page.page_info.has_next_page);
        assert!(page.page_info.has_previous_page);
    }

    // Test critique: collection vide → deux compteurs à 0, deux drapeaux à false
    #[test]
    fn test_window_empty_collection() {
        let page = Paginated::<Item>::from_window(vec![], 0, 0, 20);

        assert!(page.edges.is_empty());
        assert_eq!(page.current_count, 0);
        assert_eq!(page.previous_count, 0);
        assert!(!page.page_info.has_next_page);
        assert!(!page.page_info.has_previous_page);
        assert_eq!(page.page_info.start_cursor, None);
        assert_eq!(page.page_info.end_cursor, None);
    }

    // first dépasse ce qui reste → pas de page suivante
    #[test]
    fn test_window_first_exceeds_remaining() {
        let page = Paginated::from_window(items(&[3, 2, 1]), 7, 3, 20);

        assert_eq!(page.edges.len(), 3);
        assert!(!page.page_info.has_next_page);
        assert!(page.page_info.has_previous_page);
    }

    // Curseur au-delà de la fin → fenêtre vide mais has_previous_page=true
    #[test]
    fn test_window_cursor_past_end() {
        let page = Paginated::<Item>::from_window(vec![], 10, 0, 5);

        assert!(page.edges.is_empty());
        assert!(!page.page_info.has_next_page);
        assert!(page.page_info.has_previous_page);
    }

    // len(edges) == min(first, current_count) sur la frontière exacte
    #[test]
    fn test_window_exact_boundary() {
        let page = Paginated::from_window(items(&[5, 4, 3, 2, 1]), 0, 5, 5);

        assert_eq!(page.edges.len(), 5);
        assert!(!page.page_info.has_next_page);
        assert!(!page.page_info.has_previous_page);
    }

    #[test]
    fn test_empty_page_constant() {
        let page = Paginated::<Item>::empty();
        assert_eq!(page.current_count, 0);
        assert_eq!(page.previous_count, 0);
        assert!(page.edges.is_empty());
        assert!(!page.page_info.has_next_page);
    }
}
