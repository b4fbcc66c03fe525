//! Direct Postgres access to the same tables the managed backend exposes.
//! Identifiers come from validated config only; values are always bound.

use super::{GuestStore, NamePattern};
use crate::config::TableNames;
use crate::error::AppError;
use crate::model::{Attendance, GuestChanges, GuestId, GuestRow, MasterGuest, NewGuest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

const GUEST_COLUMNS: &str = r#"id, name, attendance, "cantidad_acompañante", created_at, updated_at"#;
const MASTER_COLUMNS: &str = "id, nombre, pases";

#[derive(sqlx::FromRow)]
struct PgGuestRow {
    id: i64,
    name: String,
    attendance: String,
    #[sqlx(rename = "cantidad_acompañante")]
    companions: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<PgGuestRow> for GuestRow {
    type Error = AppError;

    fn try_from(row: PgGuestRow) -> Result<Self, Self::Error> {
        Ok(GuestRow {
            id: row.id,
            name: row.name,
            attendance: row.attendance.parse()?,
            companions: row.companions,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgMasterRow {
    id: i64,
    nombre: String,
    pases: i32,
}

impl From<PgMasterRow> for MasterGuest {
    fn from(row: PgMasterRow) -> Self {
        MasterGuest {
            id: row.id,
            name: row.nombre,
            pass_count: row.pases,
        }
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    guests: String,
    master: String,
    guests_raw: String,
}

impl PgStore {
    pub fn new(pool: PgPool, tables: &TableNames) -> Self {
        PgStore {
            pool,
            guests: quoted(&tables.guests),
            master: quoted(&tables.master),
            guests_raw: tables.guests.clone(),
        }
    }

    pub async fn connect(database_url: &str, tables: &TableNames) -> Result<Self, AppError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool, tables))
    }

    /// Create both tables if missing, plus the BEFORE INSERT trigger that fills a
    /// null allowance on "yes" from the case-insensitively matching master entry.
    pub async fn ensure_tables(&self) -> Result<(), AppError> {
        let guests_ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
                name TEXT NOT NULL,
                attendance TEXT NOT NULL DEFAULT 'pending',
                "cantidad_acompañante" INTEGER,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ
            )
            "#,
            self.guests
        );
        sqlx::query(&guests_ddl).execute(&self.pool).await?;

        let master_ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
                nombre TEXT NOT NULL,
                pases INTEGER NOT NULL DEFAULT 1
            )
            "#,
            self.master
        );
        sqlx::query(&master_ddl).execute(&self.pool).await?;

        let function = quoted(&format!("{}_fill_companions", self.guests_raw));
        let function_ddl = format!(
            r#"
            CREATE OR REPLACE FUNCTION {function}() RETURNS trigger LANGUAGE plpgsql AS $$
            BEGIN
                IF NEW.attendance = 'yes' AND NEW."cantidad_acompañante" IS NULL THEN
                    NEW."cantidad_acompañante" := (
                        SELECT pases FROM {master} WHERE nombre ILIKE NEW.name ORDER BY id LIMIT 1
                    );
                END IF;
                RETURN NEW;
            END
            $$
            "#,
            function = function,
            master = self.master
        );
        sqlx::query(&function_ddl).execute(&self.pool).await?;

        let trigger = quoted(&format!("{}_fill_companions_trg", self.guests_raw));
        sqlx::query(&format!("DROP TRIGGER IF EXISTS {} ON {}", trigger, self.guests))
            .execute(&self.pool)
            .await?;
        sqlx::query(&format!(
            "CREATE TRIGGER {} BEFORE INSERT ON {} FOR EACH ROW EXECUTE FUNCTION {}()",
            trigger, self.guests, function
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn rows(rows: Vec<PgGuestRow>) -> Result<Vec<GuestRow>, AppError> {
        rows.into_iter().map(GuestRow::try_from).collect()
    }
}

#[async_trait]
impl GuestStore for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn insert_guest(&self, guest: &NewGuest) -> Result<GuestRow, AppError> {
        // An explicit NULL would reach the trigger just like an omitted column.
        let sql = format!(
            r#"INSERT INTO {} (name, attendance, "cantidad_acompañante") VALUES ($1, $2, $3) RETURNING {}"#,
            self.guests, GUEST_COLUMNS
        );
        tracing::debug!(sql = %sql, name = %guest.name, "query");
        let row: PgGuestRow = sqlx::query_as(&sql)
            .bind(&guest.name)
            .bind(guest.attendance.as_str())
            .bind(guest.companions)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn list_guests(&self, attendance: Option<Attendance>) -> Result<Vec<GuestRow>, AppError> {
        let rows: Vec<PgGuestRow> = match attendance {
            Some(a) => {
                let sql = format!(
                    "SELECT {} FROM {} WHERE attendance = $1 ORDER BY created_at DESC, id DESC",
                    GUEST_COLUMNS, self.guests
                );
                tracing::debug!(sql = %sql, "query");
                sqlx::query_as(&sql).bind(a.as_str()).fetch_all(&self.pool).await?
            }
            None => {
                let sql = format!("SELECT {} FROM {} ORDER BY created_at DESC, id DESC", GUEST_COLUMNS, self.guests);
                tracing::debug!(sql = %sql, "query");
                sqlx::query_as(&sql).fetch_all(&self.pool).await?
            }
        };
        Self::rows(rows)
    }

    async fn fetch_guest(&self, id: GuestId) -> Result<Option<GuestRow>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", GUEST_COLUMNS, self.guests);
        tracing::debug!(sql = %sql, id, "query");
        let row: Option<PgGuestRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(GuestRow::try_from).transpose()
    }

    async fn update_guest(&self, id: GuestId, changes: &GuestChanges) -> Result<Option<GuestRow>, AppError> {
        let sql = format!(
            r#"UPDATE {} SET
                name = COALESCE($2, name),
                attendance = COALESCE($3, attendance),
                "cantidad_acompañante" = COALESCE($4, "cantidad_acompañante"),
                updated_at = NOW()
            WHERE id = $1 RETURNING {}"#,
            self.guests, GUEST_COLUMNS
        );
        tracing::debug!(sql = %sql, id, "query");
        let row: Option<PgGuestRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(changes.attendance.map(|a| a.as_str()))
            .bind(changes.companions)
            .fetch_optional(&self.pool)
            .await?;
        row.map(GuestRow::try_from).transpose()
    }

    async fn delete_guest(&self, id: GuestId) -> Result<(), AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.guests);
        tracing::debug!(sql = %sql, id, "query");
        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn count_guests(&self, attendance: Attendance) -> Result<u64, AppError> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE attendance = $1", self.guests);
        tracing::debug!(sql = %sql, "query");
        let count: Option<i64> = sqlx::query_scalar(&sql)
            .bind(attendance.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count.unwrap_or(0).max(0) as u64)
    }

    async fn find_guest(&self, pattern: &NamePattern) -> Result<Option<GuestRow>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE name ILIKE $1 ORDER BY id LIMIT 1",
            GUEST_COLUMNS, self.guests
        );
        tracing::debug!(sql = %sql, pattern = ?pattern, "query");
        let row: Option<PgGuestRow> = sqlx::query_as(&sql)
            .bind(pattern.to_ilike())
            .fetch_optional(&self.pool)
            .await?;
        row.map(GuestRow::try_from).transpose()
    }

    async fn find_master(&self, pattern: &NamePattern) -> Result<Option<MasterGuest>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE nombre ILIKE $1 ORDER BY id LIMIT 1",
            MASTER_COLUMNS, self.master
        );
        tracing::debug!(sql = %sql, pattern = ?pattern, "query");
        let row: Option<PgMasterRow> = sqlx::query_as(&sql)
            .bind(pattern.to_ilike())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(MasterGuest::from))
    }

    async fn list_master(&self) -> Result<Vec<MasterGuest>, AppError> {
        let sql = format!("SELECT {} FROM {} ORDER BY id", MASTER_COLUMNS, self.master);
        tracing::debug!(sql = %sql, "query");
        let rows: Vec<PgMasterRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(MasterGuest::from).collect())
    }
}
