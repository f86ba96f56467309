use std::error::Error;

use async_trait::async_trait;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures::future::try_join_all;
use rust_decimal::Decimal;
use tokio_postgres::types::{to_sql_checked, FromSql, IsNull, ToSql, Type};
use tokio_postgres::{Client, NoTls};
use tracing::{trace, warn};
use uuid::Uuid;

use crate::builders::Placeholder;
use crate::error::{DatabaseError, DatabaseErrorKind, DbResult};
use crate::traits::{Connection, DatabaseDriver};
use crate::types::{ColumnDescriptor, Cursor, Row, SqlValue};

/// PostgreSQL driver implementation using tokio-postgres.
///
/// Every call to `connect` opens a fresh connection; nothing is pooled.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPostgresDriver;

impl TokioPostgresDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatabaseDriver for TokioPostgresDriver {
    async fn connect(&self, connection_string: &str) -> DbResult<Box<dyn Connection>> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
            .await
            .map_err(|e| to_database_error(DatabaseErrorKind::Connect, e))?;

        // Spawn the connection handler; it finishes once the client is dropped.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "PostgreSQL connection error");
            }
        });

        Ok(Box::new(PostgresConnection { client }))
    }

    fn placeholder(&self) -> Placeholder {
        Placeholder::Numbered
    }
}

struct PostgresConnection {
    client: Client,
}

impl Drop for PostgresConnection {
    fn drop(&mut self) {
        trace!("releasing PostgreSQL connection");
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn execute(&mut self, statement: &str) -> DbResult<Cursor> {
        let prepared = self
            .client
            .prepare(statement)
            .await
            .map_err(|e| to_database_error(DatabaseErrorKind::Execute, e))?;
        let verb = statement_verb(statement);

        // No result set: DDL or DML without RETURNING.
        if prepared.columns().is_empty() {
            let affected = self
                .client
                .execute(&prepared, &[])
                .await
                .map_err(|e| to_database_error(DatabaseErrorKind::Execute, e))?;
            if !reports_row_count(&verb) {
                return Ok(Cursor::new(-1).with_status_message(verb));
            }
            return Ok(Cursor::new(affected as i64).with_status_message(format!("{verb} {affected}")));
        }

        let description = prepared
            .columns()
            .iter()
            .map(|c| ColumnDescriptor::new(c.name()))
            .collect();

        let rows = self
            .client
            .query(&prepared, &[])
            .await
            .map_err(|e| to_database_error(DatabaseErrorKind::Fetch, e))?;

        let values: Vec<Row> = rows.iter().map(convert_row).collect();

        Ok(Cursor::new(values.len() as i64)
            .with_description(description)
            .with_status_message(format!("{verb} {}", values.len()))
            .with_rows(values))
    }

    async fn execute_many(&mut self, statement: &str, rows: &[Row]) -> DbResult<Cursor> {
        // Dropping an uncommitted transaction rolls it back, so a failing row
        // leaves the table untouched.
        let transaction = self
            .client
            .transaction()
            .await
            .map_err(|e| to_database_error(DatabaseErrorKind::Execute, e))?;

        let prepared = transaction
            .prepare(statement)
            .await
            .map_err(|e| to_database_error(DatabaseErrorKind::Execute, e))?;

        let affected: u64 = {
            let transaction = &transaction;
            let prepared = &prepared;

            // Requests issued concurrently on one client are pipelined by tokio-postgres.
            let executions = rows.iter().map(|row| async move {
                let converted_params: Vec<Box<dyn ToSql + Sync + Send>> =
                    row.iter().map(sql_value_to_tosql).collect();
                let param_refs: Vec<&(dyn ToSql + Sync)> = converted_params
                    .iter()
                    .map(|b| b.as_ref() as &(dyn ToSql + Sync))
                    .collect();
                transaction.execute(prepared, &param_refs).await
            });

            try_join_all(executions)
                .await
                .map_err(|e| to_database_error(DatabaseErrorKind::Execute, e))?
                .into_iter()
                .sum()
        };

        transaction
            .commit()
            .await
            .map_err(|e| to_database_error(DatabaseErrorKind::Execute, e))?;

        Ok(Cursor::new(affected as i64).with_status_message(format!(
            "{} {affected}",
            statement_verb(statement)
        )))
    }
}

fn to_database_error(kind: DatabaseErrorKind, e: tokio_postgres::Error) -> DatabaseError {
    let code = e.code().map(|state| state.code().to_string());
    // The server's own message is more useful than the generic "db error" wrapper.
    let message = match e.as_db_error() {
        Some(db) => db.message().to_string(),
        None => e.to_string(),
    };
    let error = DatabaseError::new(kind, message);
    match code {
        Some(code) => error.with_code(code),
        None => error,
    }
}

/// Upper-cased first keyword of a statement, mirroring the server's command tag.
///
/// Leading `--` and `/* */` comments are skipped. A statement opening with a
/// CTE reports `WITH`, not the verb of its main clause.
fn statement_verb(statement: &str) -> String {
    let mut rest = statement.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map(|(_, tail)| tail).unwrap_or("");
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map(|(_, tail)| tail).unwrap_or("");
        } else {
            break;
        }
        rest = rest.trim_start();
    }

    rest.split(|c: char| c.is_whitespace() || c == '(' || c == ';')
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

/// Whether the server's row count means something for this verb.
/// Everything else (DDL, SET, BEGIN, ...) reports -1.
fn reports_row_count(verb: &str) -> bool {
    matches!(
        verb,
        "INSERT" | "UPDATE" | "DELETE" | "MERGE" | "SELECT" | "COPY" | "FETCH" | "MOVE" | "WITH"
    )
}

/// A NULL parameter that binds to a column of any type.
#[derive(Debug)]
struct Null;

impl ToSql for Null {
    fn to_sql(
        &self,
        _ty: &Type,
        _out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        Ok(IsNull::Yes)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// The undecoded wire value of a column, `None` for NULL. Accepts every type.
struct RawValue<'a>(Option<&'a [u8]>);

impl<'a> FromSql<'a> for RawValue<'a> {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(RawValue(Some(raw)))
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(RawValue(None))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Convert a SqlValue to a boxed ToSql trait object.
fn sql_value_to_tosql(value: &SqlValue) -> Box<dyn ToSql + Sync + Send> {
    match value {
        SqlValue::Null => Box::new(Null),
        SqlValue::Text(s) => Box::new(s.clone()),
        SqlValue::Int32(i) => Box::new(*i),
        SqlValue::Int64(i) => Box::new(*i),
        SqlValue::Float64(v) => Box::new(*v),
        SqlValue::Bool(b) => Box::new(*b),
    }
}

fn convert_row(row: &tokio_postgres::Row) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| match row.try_get::<_, RawValue<'_>>(i) {
            Ok(RawValue(raw)) => decode_value(col.type_(), raw),
            Err(_) => unsupported(col.type_()),
        })
        .collect()
}

/// Decode a binary-format value according to its column type.
///
/// Numbers and booleans keep their type; dates, times, numerics, uuids and json
/// become their canonical text. Types with no decoder render as `<typename>`.
fn decode_value(ty: &Type, raw: Option<&[u8]>) -> SqlValue {
    let Some(raw) = raw else {
        return SqlValue::Null;
    };

    let decoded = if *ty == Type::BOOL {
        bool::from_sql(ty, raw).map(SqlValue::Bool)
    } else if *ty == Type::INT2 {
        i16::from_sql(ty, raw).map(|i| SqlValue::Int32(i.into()))
    } else if *ty == Type::INT4 {
        i32::from_sql(ty, raw).map(SqlValue::Int32)
    } else if *ty == Type::INT8 {
        i64::from_sql(ty, raw).map(SqlValue::Int64)
    } else if *ty == Type::FLOAT4 {
        f32::from_sql(ty, raw).map(|f| SqlValue::Float64(f.into()))
    } else if *ty == Type::FLOAT8 {
        f64::from_sql(ty, raw).map(SqlValue::Float64)
    } else if *ty == Type::NUMERIC {
        Decimal::from_sql(ty, raw).map(|d| SqlValue::Text(d.to_string()))
    } else if *ty == Type::TIMESTAMP {
        NaiveDateTime::from_sql(ty, raw).map(|t| SqlValue::Text(t.to_string()))
    } else if *ty == Type::TIMESTAMPTZ {
        DateTime::<Utc>::from_sql(ty, raw).map(|t| SqlValue::Text(t.to_string()))
    } else if *ty == Type::DATE {
        NaiveDate::from_sql(ty, raw).map(|d| SqlValue::Text(d.to_string()))
    } else if *ty == Type::TIME {
        NaiveTime::from_sql(ty, raw).map(|t| SqlValue::Text(t.to_string()))
    } else if *ty == Type::UUID {
        Uuid::from_sql(ty, raw).map(|u| SqlValue::Text(u.to_string()))
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        serde_json::Value::from_sql(ty, raw).map(|j| SqlValue::Text(j.to_string()))
    } else if *ty == Type::BYTEA {
        let hex: String = raw.iter().map(|b| format!("{b:02x}")).collect();
        Ok(SqlValue::Text(format!("\\x{hex}")))
    } else if <String as FromSql>::accepts(ty) {
        String::from_sql(ty, raw).map(SqlValue::Text)
    } else {
        return unsupported(ty);
    };

    decoded.unwrap_or_else(|_| unsupported(ty))
}

fn unsupported(ty: &Type) -> SqlValue {
    SqlValue::Text(format!("<{}>", ty.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<T: ToSql>(value: T, ty: &Type) -> BytesMut {
        let mut buf = BytesMut::new();
        value.to_sql(ty, &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_statement_verb() {
        assert_eq!(statement_verb("select 1"), "SELECT");
        assert_eq!(statement_verb("  \n insert into t values (1)"), "INSERT");
        assert_eq!(statement_verb("select(1)"), "SELECT");
        assert_eq!(statement_verb(""), "");
    }

    #[test]
    fn test_statement_verb_skips_comments() {
        assert_eq!(statement_verb("-- load\nselect 1"), "SELECT");
        assert_eq!(statement_verb("/* a */ /* b */\n-- c\n delete from t"), "DELETE");
        assert_eq!(statement_verb("-- only a comment"), "");
        assert_eq!(statement_verb("with x as (select 1) select * from x"), "WITH");
    }

    #[test]
    fn test_reports_row_count() {
        assert!(reports_row_count("INSERT"));
        assert!(reports_row_count("SELECT"));
        assert!(!reports_row_count("CREATE"));
        assert!(!reports_row_count("DROP"));
        assert!(!reports_row_count("SET"));
    }

    #[test]
    fn test_null_accepts_any_type() {
        assert!(<Null as ToSql>::accepts(&Type::INT4));
        assert!(<Null as ToSql>::accepts(&Type::TEXT));
        let mut buf = BytesMut::new();
        assert!(matches!(Null.to_sql(&Type::INT8, &mut buf), Ok(IsNull::Yes)));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_raw_value_reads_nulls_of_any_type() {
        assert!(<RawValue<'_> as FromSql>::accepts(&Type::NUMERIC));
        assert!(<RawValue<'_> as FromSql>::accepts(&Type::TIMESTAMPTZ));

        let null = RawValue::from_sql_nullable(&Type::DATE, None).unwrap();
        assert!(null.0.is_none());
        let present = RawValue::from_sql_nullable(&Type::DATE, Some(&[0u8, 0, 0, 1][..])).unwrap();
        assert_eq!(present.0, Some(&[0u8, 0, 0, 1][..]));
    }

    #[test]
    fn test_decode_null_of_non_text_types() {
        for ty in [Type::NUMERIC, Type::DATE, Type::TIMESTAMPTZ, Type::UUID, Type::JSONB, Type::INT4] {
            assert_eq!(decode_value(&ty, None), SqlValue::Null);
        }
    }

    #[test]
    fn test_decode_scalars() {
        let bool_raw = encode(true, &Type::BOOL);
        assert_eq!(decode_value(&Type::BOOL, Some(&bool_raw[..])), SqlValue::Bool(true));
        let int2_raw = encode(7i16, &Type::INT2);
        assert_eq!(decode_value(&Type::INT2, Some(&int2_raw[..])), SqlValue::Int32(7));
        let int8_raw = encode(-9i64, &Type::INT8);
        assert_eq!(decode_value(&Type::INT8, Some(&int8_raw[..])), SqlValue::Int64(-9));
        let float8_raw = encode(2.5f64, &Type::FLOAT8);
        assert_eq!(decode_value(&Type::FLOAT8, Some(&float8_raw[..])), SqlValue::Float64(2.5));
        let text_raw = encode("hi", &Type::VARCHAR);
        assert_eq!(
            decode_value(&Type::VARCHAR, Some(&text_raw[..])),
            SqlValue::Text("hi".to_string())
        );
    }

    #[test]
    fn test_decode_numeric_and_temporal() {
        let numeric = encode(Decimal::new(15, 1), &Type::NUMERIC);
        assert_eq!(decode_value(&Type::NUMERIC, Some(&numeric[..])), SqlValue::from("1.5"));

        let date = encode(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), &Type::DATE);
        assert_eq!(decode_value(&Type::DATE, Some(&date[..])), SqlValue::from("2024-01-02"));

        let stamp = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let timestamp = encode(stamp, &Type::TIMESTAMP);
        assert_eq!(
            decode_value(&Type::TIMESTAMP, Some(&timestamp[..])),
            SqlValue::from("2024-01-02 03:04:05")
        );

        let timestamptz = encode(stamp.and_utc(), &Type::TIMESTAMPTZ);
        assert_eq!(
            decode_value(&Type::TIMESTAMPTZ, Some(&timestamptz[..])),
            SqlValue::from("2024-01-02 03:04:05 UTC")
        );
    }

    #[test]
    fn test_decode_uuid_json_and_bytea() {
        let uuid = encode(Uuid::nil(), &Type::UUID);
        assert_eq!(
            decode_value(&Type::UUID, Some(&uuid[..])),
            SqlValue::from("00000000-0000-0000-0000-000000000000")
        );

        let json = encode(serde_json::json!({"a": 1}), &Type::JSONB);
        assert_eq!(decode_value(&Type::JSONB, Some(&json[..])), SqlValue::from(r#"{"a":1}"#));

        assert_eq!(
            decode_value(&Type::BYTEA, Some(&[0xde, 0xad][..])),
            SqlValue::from("\\xdead")
        );
    }

    #[test]
    fn test_decode_unsupported_type() {
        assert_eq!(decode_value(&Type::POINT, Some(&[0u8; 16][..])), SqlValue::from("<point>"));
    }

    #[test]
    fn test_driver_placeholder() {
        assert_eq!(TokioPostgresDriver::new().placeholder(), Placeholder::Numbered);
    }
}
