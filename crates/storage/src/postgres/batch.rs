//! Grouped relation queries.
//!
//! Resolves a relation for a whole batch of parents in one statement,
//! whatever the batch size. The statement unnests the (deduplicated)
//! parent-id array and attaches, per parent, a correlated count and a
//! lateral ordered/limited child window; only the join condition differs
//! between the direct and pivot shapes. Results are re-aligned to the
//! original input array, duplicates included, with empty windows for
//! parents that matched nothing.

use std::collections::{HashMap, HashSet};

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};

use gazette_core::error::{DomainResult, StorageError};
use gazette_core::ports::{OrderDirection, RelationArgs, RelationConfig, RelationShape};

use super::helpers::storage_err;
use super::keyset::order_sql;

/// One parent's slice of a grouped result: total child count plus the
/// ordered, limited child rows.
#[derive(Debug, Clone)]
pub(crate) struct RelationWindow<R> {
    pub count: i64,
    pub rows: Vec<R>,
}

impl<R> Default for RelationWindow<R> {
    fn default() -> Self {
        Self {
            count: 0,
            rows: Vec::new(),
        }
    }
}

/// Fetch the windowed relation for every parent in `parent_ids`.
///
/// One statement per call. The returned vector has exactly the length
/// and order of `parent_ids`.
pub(crate) async fn batch_windows<R>(
    pool: &PgPool,
    cfg: &RelationConfig,
    parent_ids: &[i64],
    args: RelationArgs,
) -> DomainResult<Vec<RelationWindow<R>>>
where
    R: for<'r> FromRow<'r, PgRow> + Clone + Send + Unpin,
{
    if parent_ids.is_empty() {
        return Ok(Vec::new());
    }

    let unique = dedupe(parent_ids);
    let sql = window_batch_sql(cfg, args.order, args.first);

    let rows = sqlx::query(&sql)
        .bind(&unique)
        .fetch_all(pool)
        .await
        .map_err(storage_err)?;

    let mut grouped: HashMap<i64, RelationWindow<R>> = HashMap::new();
    for row in rows {
        let parent_id: i64 = row.try_get("batch_parent_id").map_err(storage_err)?;
        let count: i64 = row.try_get("batch_child_count").map_err(storage_err)?;
        let window = grouped.entry(parent_id).or_insert(RelationWindow {
            count,
            rows: Vec::new(),
        });

        // Parents with zero children come back as one row with a NULL
        // child; every child table keys on `id`.
        let child_id: Option<i64> = row.try_get("id").map_err(storage_err)?;
        if child_id.is_some() {
            let child = R::from_row(&row)
                .map_err(|e| StorageError::SerializationError(e.to_string()))?;
            window.rows.push(child);
        }
    }

    Ok(align(parent_ids, &grouped))
}

/// Fetch the child count for every parent in `parent_ids`.
///
/// One grouped statement; the result is aligned with the input,
/// zero-filled for parents without matches.
pub(crate) async fn batch_counts(
    pool: &PgPool,
    shape: &RelationShape,
    parent_ids: &[i64],
) -> DomainResult<Vec<i64>> {
    if parent_ids.is_empty() {
        return Ok(Vec::new());
    }

    let unique = dedupe(parent_ids);
    let sql = count_batch_sql(shape);

    let counted: Vec<(i64, i64)> = sqlx::query_as(&sql)
        .bind(&unique)
        .fetch_all(pool)
        .await
        .map_err(storage_err)?;

    let grouped: HashMap<i64, i64> = counted.into_iter().collect();
    Ok(parent_ids
        .iter()
        .map(|id| grouped.get(id).copied().unwrap_or(0))
        .collect())
}

/// For each parent id, whether a pivot row `(parent, member)` exists.
///
/// Backs viewer-scoped flags ("liked", "followed"); the member id is an
/// explicit argument, never ambient request state. Aligned with the
/// input, `false`-filled.
pub(crate) async fn batch_membership(
    pool: &PgPool,
    pivot_table: &str,
    parent_key: &str,
    member_key: &str,
    member_id: i64,
    parent_ids: &[i64],
) -> DomainResult<Vec<bool>> {
    if parent_ids.is_empty() {
        return Ok(Vec::new());
    }

    let unique = dedupe(parent_ids);
    let sql = format!(
        "SELECT {parent} FROM {pivot} WHERE {member} = $1 AND {parent} = ANY($2)",
        parent = parent_key,
        pivot = pivot_table,
        member = member_key,
    );

    let hits: Vec<(i64,)> = sqlx::query_as(&sql)
        .bind(member_id)
        .bind(&unique)
        .fetch_all(pool)
        .await
        .map_err(storage_err)?;

    let members: HashSet<i64> = hits.into_iter().map(|(id,)| id).collect();
    Ok(parent_ids.iter().map(|id| members.contains(id)).collect())
}

// =============================================================================
// Statement assembly
// =============================================================================

// SAFETY: table and column names in these statements come from the
// static relation registry, never from user input; the id array and the
// member id are bound parameters.

fn window_batch_sql(cfg: &RelationConfig, order: OrderDirection, first: i64) -> String {
    let dir = order_sql(order);
    let (count_from, child_select) = match cfg.shape {
        RelationShape::Direct {
            child_table,
            foreign_key,
        } => (
            format!("{child} WHERE {fk} = p.parent_id", child = child_table, fk = foreign_key),
            format!(
                "SELECT ch.* FROM {child} ch WHERE ch.{fk} = p.parent_id",
                child = child_table,
                fk = foreign_key,
            ),
        ),
        RelationShape::Pivot {
            child_table,
            pivot_table,
            parent_key,
            child_key,
        } => (
            format!(
                "{pivot} pv WHERE pv.{pk} = p.parent_id",
                pivot = pivot_table,
                pk = parent_key,
            ),
            format!(
                "SELECT ch.* FROM {pivot} pv JOIN {child} ch ON ch.id = pv.{ck} \
                 WHERE pv.{pk} = p.parent_id",
                pivot = pivot_table,
                child = child_table,
                ck = child_key,
                pk = parent_key,
            ),
        ),
    };

    format!(
        "SELECT p.parent_id AS batch_parent_id, \
                cnt.child_count AS batch_child_count, \
                c.* \
         FROM UNNEST($1::BIGINT[]) AS p(parent_id) \
         CROSS JOIN LATERAL (SELECT COUNT(*) AS child_count FROM {count_from}) cnt \
         LEFT JOIN LATERAL ({child_select} ORDER BY ch.{col} {dir} LIMIT {first}) c ON TRUE \
         ORDER BY batch_parent_id, c.{col} {dir} NULLS LAST",
        count_from = count_from,
        child_select = child_select,
        col = cfg.order_column,
        dir = dir,
        first = first,
    )
}

fn count_batch_sql(shape: &RelationShape) -> String {
    let (table, key) = match shape {
        RelationShape::Direct {
            child_table,
            foreign_key,
        } => (*child_table, *foreign_key),
        RelationShape::Pivot {
            pivot_table,
            parent_key,
            ..
        } => (*pivot_table, *parent_key),
    };
    format!(
        "SELECT {key}, COUNT(*) FROM {table} WHERE {key} = ANY($1) GROUP BY {key}",
        key = key,
        table = table,
    )
}

fn dedupe(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Re-align grouped windows to the caller's parent-id array.
///
/// The output always has the input's length and order; parents absent
/// from the result set (zero children, or ids that exist nowhere) get
/// an empty window, and duplicated ids each get their copy.
fn align<R: Clone>(
    parent_ids: &[i64],
    grouped: &HashMap<i64, RelationWindow<R>>,
) -> Vec<RelationWindow<R>> {
    parent_ids
        .iter()
        .map(|id| grouped.get(id).cloned().unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazette_core::ports::{relation, CursorKind};

    fn window(count: i64, rows: &[&str]) -> RelationWindow<String> {
        RelationWindow {
            count,
            rows: rows.iter().map(|s| s.to_string()).collect(),
        }
    }

    // Test critique: le résultat a toujours la longueur et l'ordre de
    // l'entrée, doublons compris, fenêtre vide pour les parents absents
    #[test]
    fn test_align_preserves_input_shape() {
        let mut grouped = HashMap::new();
        grouped.insert(2, window(5, &["a", "b"]));
        grouped.insert(9, window(9, &["x"]));

        let aligned = align(&[7, 2, 9, 2], &grouped);

        assert_eq!(aligned.len(), 4);
        assert_eq!(aligned[0].count, 0);
        assert!(aligned[0].rows.is_empty());
        assert_eq!(aligned[1].count, 5);
        assert_eq!(aligned[2].count, 9);
        assert_eq!(aligned[3].rows, vec!["a", "b"]);
    }

    // Scénario type "likes count": [0, 5, 9] dans l'ordre d'entrée
    #[test]
    fn test_count_alignment_zero_fills() {
        let grouped: HashMap<i64, i64> = [(2, 5), (3, 9)].into_iter().collect();
        let aligned: Vec<i64> = [1, 2, 3]
            .iter()
            .map(|id| grouped.get(id).copied().unwrap_or(0))
            .collect();
        assert_eq!(aligned, vec![0, 5, 9]);
    }

    #[test]
    fn test_dedupe_preserves_first_occurrence_order() {
        assert_eq!(dedupe(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn test_direct_window_sql_shape() {
        let cfg = relation("post", "comments").unwrap();
        let sql = window_batch_sql(cfg, OrderDirection::Desc, 5);

        assert!(sql.contains("UNNEST($1::BIGINT[])"));
        assert!(sql.contains("COUNT(*) AS child_count FROM comments WHERE post_id = p.parent_id"));
        assert!(sql.contains("LEFT JOIN LATERAL"));
        assert!(sql.contains("ORDER BY ch.id DESC LIMIT 5"));
    }

    #[test]
    fn test_pivot_window_sql_shape() {
        let cfg = relation("post", "tags").unwrap();
        let sql = window_batch_sql(cfg, OrderDirection::Asc, 10);

        assert!(sql.contains("FROM post_tags pv WHERE pv.post_id = p.parent_id"));
        assert!(sql.contains("JOIN tags ch ON ch.id = pv.tag_id"));
        assert!(sql.contains("ORDER BY ch.slug ASC LIMIT 10"));
    }

    // Test critique: les deux formes partagent la même ossature de
    // requête, seule la condition de jointure change
    #[test]
    fn test_shapes_share_statement_skeleton() {
        let direct = window_batch_sql(relation("post", "comments").unwrap(), OrderDirection::Desc, 3);
        let pivot = window_batch_sql(relation("series", "followers").unwrap(), OrderDirection::Desc, 3);

        for fragment in [
            "SELECT p.parent_id AS batch_parent_id",
            "cnt.child_count AS batch_child_count",
            "CROSS JOIN LATERAL",
            "LEFT JOIN LATERAL",
            "NULLS LAST",
        ] {
            assert!(direct.contains(fragment), "direct missing {}", fragment);
            assert!(pivot.contains(fragment), "pivot missing {}", fragment);
        }
    }

    #[test]
    fn test_count_batch_sql_per_shape() {
        let direct = count_batch_sql(&RelationShape::Direct {
            child_table: "comments",
            foreign_key: "post_id",
        });
        assert_eq!(
            direct,
            "SELECT post_id, COUNT(*) FROM comments WHERE post_id = ANY($1) GROUP BY post_id"
        );

        let pivot = count_batch_sql(&RelationShape::Pivot {
            child_table: "users",
            pivot_table: "post_likes",
            parent_key: "post_id",
            child_key: "user_id",
        });
        assert_eq!(
            pivot,
            "SELECT post_id, COUNT(*) FROM post_likes WHERE post_id = ANY($1) GROUP BY post_id"
        );
    }

    #[test]
    fn test_registry_cursor_kinds_match_order_columns() {
        // Les relations ordonnées par id utilisent des curseurs Id,
        // celles ordonnées par slug/username des curseurs Key
        for cfg in gazette_core::ports::RELATIONS {
            match cfg.order_column {
                "id" => assert_eq!(cfg.cursor_kind, CursorKind::Id),
                _ => assert_eq!(cfg.cursor_kind, CursorKind::Key),
            }
        }
    }
}
