//! Dining table writes
//!
//! Table numbers are unique. A duplicate is reported as its own error so the
//! caller can show "already exists" instead of the generic failure message.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
};
use serde::Deserialize;
use thiserror::Error;

use crate::entity::dining_table::{self, TableStatus};

pub const MSG_TABLE_EXISTS: &str = "Table number already exists";
pub const MSG_TABLE_CREATE_FAILED: &str = "Failed to create table";
pub const MSG_TABLE_UPDATE_FAILED: &str = "Failed to update table";

#[derive(Debug, Error)]
pub enum TableError {
    #[error("table number {0} already exists")]
    DuplicateNumber(i32),

    #[error("{0}")]
    Invalid(String),

    #[error("table not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl TableError {
    /// Message shown to the user; `fallback` covers unexpected backend errors
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            TableError::DuplicateNumber(_) => MSG_TABLE_EXISTS.to_string(),
            TableError::Invalid(msg) => msg.clone(),
            TableError::NotFound => "Table not found".to_string(),
            TableError::Database(_) => fallback.to_string(),
        }
    }
}

/// Create/update table form
#[derive(Debug, Clone, Deserialize)]
pub struct TableForm {
    pub number: i32,
    pub capacity: i32,
    pub status: Option<String>,
}

impl TableForm {
    fn validate(&self) -> Result<TableStatus, TableError> {
        if self.number <= 0 {
            return Err(TableError::Invalid("Table number must be positive".to_string()));
        }
        if self.capacity <= 0 {
            return Err(TableError::Invalid("Capacity must be positive".to_string()));
        }
        match self.status.as_deref() {
            None => Ok(TableStatus::Available),
            Some(s) => TableStatus::parse(s)
                .ok_or_else(|| TableError::Invalid(format!("Unknown table status: {}", s))),
        }
    }
}

pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn map_write_error(err: DbErr, number: i32) -> TableError {
    if is_unique_violation(&err) {
        TableError::DuplicateNumber(number)
    } else {
        TableError::Database(err)
    }
}

pub async fn create_table<C: ConnectionTrait>(
    db: &C,
    form: &TableForm,
) -> Result<dining_table::Model, TableError> {
    let status = form.validate()?;

    let existing = dining_table::Entity::find()
        .filter(dining_table::Column::Number.eq(form.number))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(TableError::DuplicateNumber(form.number));
    }

    dining_table::ActiveModel {
        number: Set(form.number),
        capacity: Set(form.capacity),
        status: Set(status.as_str().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| map_write_error(e, form.number))
}

pub async fn update_table<C: ConnectionTrait>(
    db: &C,
    id: i64,
    form: &TableForm,
) -> Result<dining_table::Model, TableError> {
    let status = form.validate()?;

    let clash = dining_table::Entity::find()
        .filter(dining_table::Column::Number.eq(form.number))
        .filter(dining_table::Column::Id.ne(id))
        .one(db)
        .await?;
    if clash.is_some() {
        return Err(TableError::DuplicateNumber(form.number));
    }

    let current = dining_table::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(TableError::NotFound)?;

    let mut active: dining_table::ActiveModel = current.into();
    active.number = Set(form.number);
    active.capacity = Set(form.capacity);
    active.status = Set(status.as_str().to_string());
    active
        .update(db)
        .await
        .map_err(|e| map_write_error(e, form.number))
}

/// Mark a table occupied or free; used by the order flow
pub async fn set_table_status<C: ConnectionTrait>(
    db: &C,
    id: i64,
    status: TableStatus,
) -> Result<(), DbErr> {
    if let Some(table) = dining_table::Entity::find_by_id(id).one(db).await? {
        let mut active: dining_table::ActiveModel = table.into();
        active.status = Set(status.as_str().to_string());
        active.update(db).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction};

    fn table(id: i64, number: i32) -> dining_table::Model {
        dining_table::Model {
            id,
            number,
            capacity: 4,
            status: "available".to_string(),
        }
    }

    fn form(number: i32) -> TableForm {
        TableForm {
            number,
            capacity: 4,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_table() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<dining_table::Model>::new()])
            .append_query_results([vec![table(9, 5)]])
            .into_connection();

        let created = create_table(&db, &form(5)).await.unwrap();
        assert_eq!(created.number, 5);
        assert_eq!(db.into_transaction_log().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_number_adds_no_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![table(1, 5)]])
            .into_connection();

        let err = create_table(&db, &form(5)).await.unwrap_err();
        assert!(matches!(err, TableError::DuplicateNumber(5)));
        assert_eq!(err.user_message(MSG_TABLE_CREATE_FAILED), MSG_TABLE_EXISTS);

        // only the lookup ran; no INSERT reached the database
        assert_eq!(
            db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"SELECT "pos_dining_table"."id", "pos_dining_table"."number", "pos_dining_table"."capacity", "pos_dining_table"."status" FROM "pos_dining_table" WHERE "pos_dining_table"."number" = $1 LIMIT $2"#,
                [5i32.into(), 1u64.into()]
            )]
        );
    }

    #[tokio::test]
    async fn test_other_insert_failure_is_generic() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<dining_table::Model>::new()])
            .append_query_errors([DbErr::Custom("connection reset".to_string())])
            .into_connection();

        let err = create_table(&db, &form(6)).await.unwrap_err();
        assert!(matches!(err, TableError::Database(_)));
        assert_eq!(err.user_message(MSG_TABLE_CREATE_FAILED), MSG_TABLE_CREATE_FAILED);
    }

    #[tokio::test]
    async fn test_invalid_form_never_queries() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = create_table(&db, &form(0)).await.unwrap_err();
        assert!(matches!(err, TableError::Invalid(_)));

        let bad_status = TableForm {
            status: Some("broken".to_string()),
            ..form(3)
        };
        assert!(matches!(
            create_table(&db, &bad_status).await,
            Err(TableError::Invalid(_))
        ));
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_update_to_taken_number() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![table(2, 8)]])
            .into_connection();

        let err = update_table(&db, 1, &form(8)).await.unwrap_err();
        assert!(matches!(err, TableError::DuplicateNumber(8)));
    }
}
