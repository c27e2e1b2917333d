//! Relation registry for batched fetches.
//!
//! Every relation the API can resolve for a batch of parents is declared
//! here, once, as data: which child table holds the rows, how parent and
//! child are associated, and which column the window orders by. The
//! storage layer builds its grouped queries from these entries; nothing
//! dispatches on runtime types.

use crate::error::{DomainError, DomainResult};
use crate::ports::pagination::{CursorKind, RelationArgs};

/// How a parent and its children are associated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationShape {
    /// Children reference the parent directly by a foreign key column.
    Direct {
        child_table: &'static str,
        foreign_key: &'static str,
    },
    /// Children are linked to the parent through a pivot table (many-to-many).
    Pivot {
        child_table: &'static str,
        pivot_table: &'static str,
        parent_key: &'static str,
        child_key: &'static str,
    },
}

/// One registered relation: `(entity, name)` plus the query ingredients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationConfig {
    /// Parent entity name, e.g. `"post"`.
    pub entity: &'static str,
    /// Relation field name, e.g. `"comments"`.
    pub name: &'static str,
    /// Child column the window orders and derives cursors by.
    pub order_column: &'static str,
    /// Cursor-field type of `order_column`.
    pub cursor_kind: CursorKind,
    pub shape: RelationShape,
}

/// The unit of batching: one parent's request for one relation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadRequest {
    pub parent_id: i64,
    pub args: RelationArgs,
}

/// Every relation the API resolves through the batcher.
///
/// Count-only and membership lookups reuse the entry of the relation
/// they count over.
pub const RELATIONS: &[RelationConfig] = &[
    RelationConfig {
        entity: "series",
        name: "posts",
        order_column: "id",
        cursor_kind: CursorKind::Id,
        shape: RelationShape::Direct {
            child_table: "posts",
            foreign_key: "series_id",
        },
    },
    RelationConfig {
        entity: "post",
        name: "comments",
        order_column: "id",
        cursor_kind: CursorKind::Id,
        shape: RelationShape::Direct {
            child_table: "comments",
            foreign_key: "post_id",
        },
    },
    RelationConfig {
        entity: "comment",
        name: "replies",
        order_column: "id",
        cursor_kind: CursorKind::Id,
        shape: RelationShape::Direct {
            child_table: "replies",
            foreign_key: "comment_id",
        },
    },
    RelationConfig {
        entity: "post",
        name: "tags",
        order_column: "slug",
        cursor_kind: CursorKind::Key,
        shape: RelationShape::Pivot {
            child_table: "tags",
            pivot_table: "post_tags",
            parent_key: "post_id",
            child_key: "tag_id",
        },
    },
    RelationConfig {
        entity: "post",
        name: "likers",
        order_column: "username",
        cursor_kind: CursorKind::Key,
        shape: RelationShape::Pivot {
            child_table: "users",
            pivot_table: "post_likes",
            parent_key: "post_id",
            child_key: "user_id",
        },
    },
    RelationConfig {
        entity: "series",
        name: "followers",
        order_column: "username",
        cursor_kind: CursorKind::Key,
        shape: RelationShape::Pivot {
            child_table: "users",
            pivot_table: "series_followers",
            parent_key: "series_id",
            child_key: "user_id",
        },
    },
];

/// Look up a registered relation.
///
/// A miss is a wiring error, not a client error; [`validate_relations`]
/// turns it into a startup failure.
pub fn relation(entity: &str, name: &str) -> DomainResult<&'static RelationConfig> {
    RELATIONS
        .iter()
        .find(|r| r.entity == entity && r.name == name)
        .ok_or_else(|| DomainError::UnknownRelation {
            entity: entity.to_string(),
            name: name.to_string(),
        })
}

/// Verify the registry is well-formed. Called once at startup, before
/// the server accepts traffic.
pub fn validate_relations() -> DomainResult<()> {
    validate(RELATIONS)
}

fn validate(configs: &[RelationConfig]) -> DomainResult<()> {
    for (i, a) in configs.iter().enumerate() {
        for b in &configs[i + 1..] {
            if a.entity == b.entity && a.name == b.name {
                return Err(DomainError::ValidationError(format!(
                    "relation {}.{} registered twice",
                    a.entity, a.name
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_relations_resolve() {
        let cfg = relation("post", "comments").unwrap();
        assert!(matches!(
            cfg.shape,
            RelationShape::Direct {
                child_table: "comments",
                foreign_key: "post_id",
            }
        ));

        let cfg = relation("series", "followers").unwrap();
        assert!(matches!(cfg.shape, RelationShape::Pivot { .. }));
        assert_eq!(cfg.cursor_kind, CursorKind::Key);
    }

    // Test critique: une relation non enregistrée est une erreur de câblage,
    // détectée comme UnknownRelation et jamais résolue silencieusement
    #[test]
    fn test_unknown_relation_is_an_error() {
        let err = relation("post", "ghosts").unwrap_err();
        assert!(matches!(err, DomainError::UnknownRelation { .. }));
        assert!(err.to_string().contains("post.ghosts"));
    }

    #[test]
    fn test_registry_is_valid() {
        validate_relations().unwrap();
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let cfg = RelationConfig {
            entity: "post",
            name: "comments",
            order_column: "id",
            cursor_kind: CursorKind::Id,
            shape: RelationShape::Direct {
                child_table: "comments",
                foreign_key: "post_id",
            },
        };
        assert!(validate(&[cfg, cfg]).is_err());
    }
}
