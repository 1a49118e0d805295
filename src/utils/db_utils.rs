use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use sqlx::MySqlPool;

use crate::error::AppError;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

fn to_sql_value(value: &Value) -> Result<SqlValue, AppError> {
    match value {
        Value::String(s) => {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Ok(SqlValue::Date(d))
            } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                Ok(SqlValue::DateTime(dt))
            } else if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S") {
                Ok(SqlValue::Time(t))
            } else if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M") {
                Ok(SqlValue::Time(t))
            } else {
                Ok(SqlValue::String(s.clone()))
            }
        }
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::I64)
            .or_else(|| n.as_f64().map(SqlValue::F64))
            .ok_or_else(|| AppError::BadRequest("Unsupported number".into())),
        Value::Bool(b) => Ok(SqlValue::Bool(*b)),
        Value::Null => Ok(SqlValue::Null),
        _ => Err(AppError::BadRequest("Unsupported JSON value type".into())),
    }
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Only keys listed in `allowed` may appear in the payload; they become the SET
/// clause. `filters` become the AND-joined WHERE clause.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    filters: Vec<(&str, SqlValue)>,
) -> Result<SqlUpdate, AppError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::BadRequest("Payload must be a JSON object".into()))?;

    if obj.is_empty() {
        return Err(AppError::BadRequest("No fields provided for update".into()));
    }

    if let Some(unknown) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(AppError::BadRequest(format!("Field '{}' cannot be updated", unknown)));
    }

    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let where_clause = filters
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(" AND ");

    let sql = format!("UPDATE {} SET {} WHERE {}", table, set_clause, where_clause);

    let mut values = Vec::with_capacity(obj.len() + filters.len());
    for value in obj.values() {
        values.push(to_sql_value(value)?);
    }
    values.extend(filters.into_iter().map(|(_, v)| v));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    tracing::debug!(sql = %update.sql, values = ?update.values, "Executing dynamic update");

    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Time(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALLOWED: &[&str] = &["first_name", "hire_date", "shift_start", "position"];

    #[test]
    fn test_builds_scoped_update() {
        let update = build_update_sql(
            "employees",
            &json!({"first_name": "Ana", "hire_date": "2024-02-01", "shift_start": "07:30"}),
            ALLOWED,
            vec![("id", SqlValue::U64(4)), ("tenant_id", SqlValue::U64(1))],
        )
        .unwrap();

        assert!(update.sql.starts_with("UPDATE employees SET "));
        assert!(update.sql.ends_with(" WHERE id = ? AND tenant_id = ?"));
        assert_eq!(update.values.len(), 5);
        assert!(update.values.contains(&SqlValue::String("Ana".into())));
        assert!(update.values.contains(&SqlValue::Date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())));
        assert!(update.values.contains(&SqlValue::Time(NaiveTime::from_hms_opt(7, 30, 0).unwrap())));
        assert_eq!(update.values[3], SqlValue::U64(4));
        assert_eq!(update.values[4], SqlValue::U64(1));
    }

    #[test]
    fn test_rejects_fields_outside_whitelist() {
        let err = build_update_sql(
            "employees",
            &json!({"tenant_id": 9}),
            ALLOWED,
            vec![("id", SqlValue::U64(1))],
        )
        .unwrap_err();
        assert!(err.to_string().contains("tenant_id"));
    }

    #[test]
    fn test_rejects_empty_and_non_object() {
        assert!(build_update_sql("employees", &json!({}), ALLOWED, vec![]).is_err());
        assert!(build_update_sql("employees", &json!([1, 2]), ALLOWED, vec![]).is_err());
        assert!(build_update_sql("employees", &json!({"position": [1]}), ALLOWED, vec![]).is_err());
    }

    #[test]
    fn test_null_clears_column() {
        let update = build_update_sql(
            "employees",
            &json!({"position": null}),
            ALLOWED,
            vec![("id", SqlValue::U64(1))],
        )
        .unwrap();
        assert_eq!(update.values[0], SqlValue::Null);
    }
}
