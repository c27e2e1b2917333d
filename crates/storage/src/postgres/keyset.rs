//! Keyset pagination driver.
//!
//! One algorithm serves every top-level list query: a single count
//! statement computing both window counts, then a single fetch of the
//! ordered, cursor-filtered, `first`-limited window. Repositories
//! describe their table, columns and filters; the driver owns the
//! cursor math.
//!
//! The cursor predicate is strict (`<` for descending, `>` for
//! ascending): the window starts at the first row strictly past the
//! decoded value, so a cursor row deleted between pages is skipped
//! naturally. `previous_count` is derived as `total - current_count`
//! and therefore counts the cursor row itself as already seen.

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};

use gazette_core::error::{DomainError, DomainResult, StorageResult};
use gazette_core::ports::{
    CursorKind, CursorValue, Cursored, OrderDirection, PageArgs, Paginated,
};

use super::helpers::{bind_values, storage_err};

/// A bound query parameter.
#[derive(Debug, Clone)]
pub(crate) enum SqlValue {
    BigInt(i64),
    Text(String),
}

impl From<&CursorValue> for SqlValue {
    fn from(v: &CursorValue) -> Self {
        match v {
            CursorValue::Id(id) => SqlValue::BigInt(*id),
            CursorValue::Key(key) => SqlValue::Text(key.clone()),
        }
    }
}

pub(crate) fn order_sql(order: OrderDirection) -> &'static str {
    match order {
        OrderDirection::Asc => "ASC",
        OrderDirection::Desc => "DESC",
    }
}

/// Comparison operator selecting rows strictly past the cursor in sort
/// order.
pub(crate) fn cursor_op(order: OrderDirection) -> &'static str {
    match order {
        OrderDirection::Asc => ">",
        OrderDirection::Desc => "<",
    }
}

/// A keyset-paginated query over one entity table.
///
/// SAFETY: the dynamic SQL assembled here is safe from injection because:
/// 1. Table, column and condition fragments are `'static` strings owned
///    by the repositories, never user input
/// 2. Operators and order direction come from enums
/// 3. All VALUES are parameterized via $1, $2, etc. and bound separately
pub(crate) struct KeysetQuery {
    table: &'static str,
    columns: &'static str,
    cursor_column: &'static str,
    cursor_kind: CursorKind,
    conditions: Vec<String>,
    binds: Vec<SqlValue>,
}

impl KeysetQuery {
    pub fn new(
        table: &'static str,
        columns: &'static str,
        cursor_column: &'static str,
        cursor_kind: CursorKind,
    ) -> Self {
        Self {
            table,
            columns,
            cursor_column,
            cursor_kind,
            conditions: Vec::new(),
            binds: Vec::new(),
        }
    }

    /// Add `<prefix> $n` with a bound value, e.g. `filter("author_id =", v)`.
    pub fn filter(self, prefix: &str, value: SqlValue) -> Self {
        self.filter_wrapped(prefix, value, "")
    }

    /// Add `<prefix> $n<suffix>` with a bound value; the suffix closes
    /// subquery parentheses.
    pub fn filter_wrapped(mut self, prefix: &str, value: SqlValue, suffix: &str) -> Self {
        self.binds.push(value);
        self.conditions
            .push(format!("{} ${}{}", prefix, self.binds.len(), suffix));
        self
    }

    /// Add a raw condition with no bound value (e.g. an IS NULL check).
    pub fn condition(mut self, clause: &str) -> Self {
        self.conditions.push(clause.to_string());
        self
    }

    /// Execute the count and window statements and assemble the page.
    ///
    /// Exactly two round trips, whatever the filters: one count query
    /// (both counts via a FILTER aggregate), one window fetch.
    pub async fn fetch_page<R, T, F>(
        mut self,
        pool: &PgPool,
        page: &PageArgs,
        map: F,
    ) -> DomainResult<Paginated<T>>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        T: Cursored,
        F: Fn(R) -> StorageResult<T>,
    {
        if let Some(after) = &page.after {
            if after.kind() != self.cursor_kind {
                return Err(DomainError::InvalidCursor(
                    "cursor does not match this list's ordering key".into(),
                ));
            }
        }

        let (previous_count, current_count) = match &page.after {
            Some(after) => {
                let sql = self.count_sql(true, page.order);
                let mut count_binds = self.binds.clone();
                count_binds.push(SqlValue::from(after));
                let (total, current): (i64, i64) =
                    bind_values!(sqlx::query_as(&sql), count_binds.iter())
                        .fetch_one(pool)
                        .await
                        .map_err(storage_err)?;
                (total - current, current)
            }
            None => {
                let sql = self.count_sql(false, page.order);
                let (total,): (i64,) = bind_values!(sqlx::query_as(&sql), self.binds.iter())
                    .fetch_one(pool)
                    .await
                    .map_err(storage_err)?;
                (0, total)
            }
        };

        if let Some(after) = &page.after {
            // The window statement reuses the filter binds plus the cursor.
            let prefix = format!("{} {}", self.cursor_column, cursor_op(page.order));
            self = self.filter_wrapped(&prefix, SqlValue::from(after), "");
        }

        let sql = self.window_sql(page.order, page.first);
        let rows: Vec<R> = bind_values!(sqlx::query_as(&sql), self.binds.iter())
            .fetch_all(pool)
            .await
            .map_err(storage_err)?;

        let nodes = rows.into_iter().map(map).collect::<StorageResult<Vec<_>>>()?;

        Ok(Paginated::from_window(
            nodes,
            previous_count,
            current_count,
            page.first,
        ))
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    fn count_sql(&self, with_cursor: bool, order: OrderDirection) -> String {
        if with_cursor {
            format!(
                "SELECT COUNT(*), COUNT(*) FILTER (WHERE {} {} ${}) FROM {} {}",
                self.cursor_column,
                cursor_op(order),
                self.binds.len() + 1,
                self.table,
                self.where_clause(),
            )
        } else {
            format!("SELECT COUNT(*) FROM {} {}", self.table, self.where_clause())
        }
    }

    fn window_sql(&self, order: OrderDirection, first: i64) -> String {
        format!(
            "SELECT {} FROM {} {} ORDER BY {} {} LIMIT {}",
            self.columns,
            self.table,
            self.where_clause(),
            self.cursor_column,
            order_sql(order),
            first,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> KeysetQuery {
        KeysetQuery::new("posts", "id, slug", "id", CursorKind::Id)
    }

    #[test]
    fn test_cursor_operator_per_direction() {
        // Desc: la page suivante contient des valeurs plus petites
        assert_eq!(cursor_op(OrderDirection::Desc), "<");
        assert_eq!(cursor_op(OrderDirection::Asc), ">");
    }

    #[test]
    fn test_count_sql_without_cursor() {
        let sql = query()
            .filter("author_id =", SqlValue::BigInt(7))
            .count_sql(false, OrderDirection::Desc);
        assert_eq!(sql, "SELECT COUNT(*) FROM posts WHERE author_id = $1");
    }

    // Test critique: les deux compteurs sortent d'une seule requête,
    // le FILTER référence le bind qui suit ceux des filtres
    #[test]
    fn test_count_sql_with_cursor() {
        let sql = query()
            .filter("author_id =", SqlValue::BigInt(7))
            .count_sql(true, OrderDirection::Desc);
        assert_eq!(
            sql,
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE id < $2) FROM posts WHERE author_id = $1"
        );
    }

    #[test]
    fn test_window_sql_orders_and_limits() {
        let sql = query().window_sql(OrderDirection::Asc, 5);
        assert_eq!(sql, "SELECT id, slug FROM posts  ORDER BY id ASC LIMIT 5");
    }

    #[test]
    fn test_filter_wrapped_closes_subquery() {
        let q = query().filter_wrapped(
            "id IN (SELECT post_id FROM post_tags WHERE tag_id =",
            SqlValue::BigInt(3),
            ")",
        );
        assert_eq!(
            q.where_clause(),
            "WHERE id IN (SELECT post_id FROM post_tags WHERE tag_id = $1)"
        );
    }

    #[test]
    fn test_conditions_join_with_and() {
        let q = query()
            .filter("author_id =", SqlValue::BigInt(1))
            .condition("published_at IS NOT NULL");
        assert_eq!(
            q.where_clause(),
            "WHERE author_id = $1 AND published_at IS NOT NULL"
        );
    }
}
