//! Shared helpers for the Diesel repositories.
//!
//! Activity rows are written by every mutating adapter inside its own
//! transaction, so the insert lives here rather than in the activity
//! repository.

use std::str::FromStr;

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde_json::{Value, json};

use crate::domain::{Activity, ActivityDraft};

use super::diesel_error_mapping::RepositoryError;
use super::models::{ActivityRow, NewActivityRow};
use super::schema::system_activity;

/// Insert `draft` on `conn` and return the stored row.
pub(crate) async fn insert_activity(
    conn: &mut AsyncPgConnection,
    draft: &ActivityDraft,
) -> QueryResult<ActivityRow> {
    let row = NewActivityRow {
        activity_type: &draft.activity_type,
        description: &draft.description,
        actor_id: &draft.actor_id,
        actor_role: &draft.actor_role,
        target_id: draft.target_id.as_deref(),
        target_type: draft.target_type.as_deref(),
        metadata: &draft.metadata,
    };
    diesel::insert_into(system_activity::table)
        .values(&row)
        .returning(ActivityRow::as_returning())
        .get_result(conn)
        .await
}

/// Copy of `draft` with `key` merged into its metadata object.
pub(crate) fn with_metadata_entry(draft: &ActivityDraft, key: &str, value: Value) -> ActivityDraft {
    let mut enriched = draft.clone();
    match enriched.metadata.as_object_mut() {
        Some(map) => {
            map.insert(key.to_owned(), value);
        }
        None => enriched.metadata = json!({ key: value }),
    }
    enriched
}

#[derive(QueryableByName)]
struct SequenceValue {
    #[diesel(sql_type = BigInt)]
    value: i64,
}

/// Advance a PostgreSQL sequence.
pub(crate) async fn next_value(
    conn: &mut AsyncPgConnection,
    sequence: &'static str,
) -> QueryResult<i64> {
    diesel::sql_query("SELECT nextval($1::regclass) AS value")
        .bind::<Text, _>(sequence)
        .get_result::<SequenceValue>(conn)
        .await
        .map(|row| row.value)
}

impl From<ActivityRow> for Activity {
    fn from(row: ActivityRow) -> Self {
        Self {
            activity_id: row.activity_id,
            activity_type: row.activity_type,
            description: row.description,
            actor_id: row.actor_id,
            actor_role: row.actor_role,
            target_id: row.target_id,
            target_type: row.target_type,
            metadata: row.metadata,
            created_at: row.created_at,
        }
    }
}

/// Parse an enum column, reporting the column name on failure.
pub(crate) fn decode<T, E>(value: &str, column: &str) -> Result<T, E>
where
    T: FromStr,
    E: RepositoryError,
{
    value
        .parse()
        .map_err(|_| E::query_error(format!("unexpected {column} value: {value}")))
}

/// Parse a nullable enum column.
pub(crate) fn decode_opt<T, E>(value: Option<&str>, column: &str) -> Result<Option<T>, E>
where
    T: FromStr,
    E: RepositoryError,
{
    value.map(|raw| decode(raw, column)).transpose()
}

/// Escape `%`, `_` and `\` so `term` matches literally in `LIKE`.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Substring pattern for `ILIKE`.
pub(crate) fn like_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::domain::ports::OrderRepositoryError;
    use rstest::rstest;

    #[rstest]
    #[case("center", Ok(Role::Center))]
    #[case("owner", Err(OrderRepositoryError::query("unexpected creator_role value: owner")))]
    fn decode_reports_column(
        #[case] raw: &str,
        #[case] expected: Result<Role, OrderRepositoryError>,
    ) {
        assert_eq!(decode::<Role, OrderRepositoryError>(raw, "creator_role"), expected);
    }

    #[rstest]
    #[case("north", "%north%")]
    #[case("50%_off", "%50\\%\\_off%")]
    fn like_patterns_escape_wildcards(#[case] term: &str, #[case] expected: &str) {
        assert_eq!(like_pattern(term), expected);
    }
}
