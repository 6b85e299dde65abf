//! Conversion between driver rows/arguments and the dynamic value model.

use std::sync::Arc;

use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgRow, PgTypeInfo};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _, TypeInfo, ValueRef};

use crate::domain::models::{Row, Value};
use crate::shared::errors::GatewayError;

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// A NULL parameter sent with type OID 0, leaving the server to infer the
/// type from where the placeholder is used
struct UntypedNull;

impl sqlx::Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl Encode<'_, Postgres> for UntypedNull {
    fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        Ok(IsNull::Yes)
    }
}

/// Bind positional parameters in order
pub(super) fn bind_params<'q>(
    statement: &'q str,
    params: &[Value],
) -> Result<PgQuery<'q>, GatewayError> {
    let mut query = sqlx::query(statement);
    for (idx, value) in params.iter().enumerate() {
        query = match value {
            Value::Null => query.bind(UntypedNull),
            Value::Bool(v) => query.bind(*v),
            Value::Int16(v) => query.bind(*v),
            Value::Int32(v) => query.bind(*v),
            Value::Int64(v) => query.bind(*v),
            Value::Float32(v) => query.bind(*v),
            Value::Float64(v) => query.bind(*v),
            Value::Decimal(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.clone()),
            Value::Bytes(v) => query.bind(v.clone()),
            Value::Date(v) => query.bind(*v),
            Value::Time(v) => query.bind(*v),
            Value::Timestamp(v) => query.bind(*v),
            Value::TimestampTz(v) => query.bind(*v),
            Value::Uuid(v) => query.bind(*v),
            Value::Json(v) => query.bind(v.clone()),
            Value::Unsupported(type_name) => {
                return Err(GatewayError::QueryFailed {
                    statement: statement.to_string(),
                    code: None,
                    detail: format!("parameter ${} has unsupported type {type_name}", idx + 1),
                });
            }
        };
    }
    Ok(query)
}

/// Convert driver rows into engine-native rows sharing one column list
pub(super) fn decode_rows(pg_rows: &[PgRow]) -> Vec<Row> {
    let Some(first) = pg_rows.first() else {
        return Vec::new();
    };

    let columns: Arc<[String]> = first
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    pg_rows
        .iter()
        .map(|pg_row| {
            let values = (0..pg_row.len()).map(|idx| decode_value(pg_row, idx)).collect();
            Row::new(Arc::clone(&columns), values)
        })
        .collect()
}

fn decode_value(row: &PgRow, idx: usize) -> Value {
    if row.try_get_raw(idx).is_ok_and(|raw| raw.is_null()) {
        return Value::Null;
    }

    let type_name = row.column(idx).type_info().name();
    let decoded = match type_name {
        "BOOL" => decode_as(row, idx, Value::Bool),
        "INT2" => decode_as(row, idx, Value::Int16),
        "INT4" => decode_as(row, idx, Value::Int32),
        "INT8" => decode_as(row, idx, Value::Int64),
        "FLOAT4" => decode_as(row, idx, Value::Float32),
        "FLOAT8" => decode_as(row, idx, Value::Float64),
        "NUMERIC" => decode_as(row, idx, Value::Decimal),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" | "CITEXT" | "UNKNOWN" => {
            decode_as(row, idx, Value::Text)
        }
        "BYTEA" => decode_as(row, idx, Value::Bytes),
        "DATE" => decode_as(row, idx, Value::Date),
        "TIME" => decode_as(row, idx, Value::Time),
        "TIMESTAMP" => decode_as(row, idx, Value::Timestamp),
        "TIMESTAMPTZ" => decode_as(row, idx, Value::TimestampTz),
        "UUID" => decode_as(row, idx, Value::Uuid),
        "JSON" | "JSONB" => decode_as(row, idx, Value::Json),
        // Enum labels are transmitted as their text in binary format too.
        _ => row
            .try_get_unchecked::<Option<String>, _>(idx)
            .ok()
            .map(|v| v.map_or(Value::Null, Value::Text)),
    };

    decoded.unwrap_or_else(|| Value::Unsupported(type_name.to_string()))
}

fn decode_as<'r, T>(row: &'r PgRow, idx: usize, wrap: fn(T) -> Value) -> Option<Value>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<Option<T>, _>(idx)
        .ok()
        .map(|v| v.map_or(Value::Null, wrap))
}
