//! Helpers shared by the MySQL adapters

use sqlx::{MySql, QueryBuilder};
use tracing::{error, warn};

use otica_core::error::DomainError;
use otica_shared::Pagination;

/// Maps a failed statement to `DatabaseError`, logging it with `context`.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| {
        error!("Database error {}: {}", context, e);
        DomainError::DatabaseError(e.to_string())
    }
}

/// Like [`db_error`], but a unique-key violation becomes `Conflict(conflict)`.
pub(crate) fn write_error(
    context: &'static str,
    conflict: impl Into<String>,
) -> impl FnOnce(sqlx::Error) -> DomainError {
    let conflict = conflict.into();
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            warn!("Unique violation {}: {}", context, db.message());
            DomainError::Conflict(conflict)
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            warn!("Foreign key violation {}: {}", context, db.message());
            DomainError::InvalidReference(db.message().to_string())
        }
        _ => db_error(context)(e),
    }
}

/// `%term%` with LIKE wildcards in the term escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub(crate) fn push_page(builder: &mut QueryBuilder<'_, MySql>, pagination: Pagination) {
    builder
        .push(" LIMIT ")
        .push_bind(pagination.limit() as i64)
        .push(" OFFSET ")
        .push_bind(pagination.offset() as i64);
}

/// `(?, ?, ...)` for an `IN` clause; callers must not pass an empty slice.
pub(crate) fn push_id_list(builder: &mut QueryBuilder<'_, MySql>, ids: &[i64]) {
    builder.push("(");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("maria"), "%maria%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_id_list_and_page_sql() {
        let mut builder = QueryBuilder::<MySql>::new("SELECT id FROM lenses WHERE id IN ");
        push_id_list(&mut builder, &[1, 2, 3]);
        push_page(&mut builder, Pagination::new(Some(2), Some(10)));
        assert_eq!(
            builder.sql(),
            "SELECT id FROM lenses WHERE id IN (?, ?, ?) LIMIT ? OFFSET ?"
        );
    }
}
