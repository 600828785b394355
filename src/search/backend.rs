use async_trait::async_trait;
use std::sync::Arc;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
};

use super::aggregator::{SearchError, SearchHit, SearchKind};
use crate::entity::{
    category, coupon, customer, dining_table, inventory_item, menu_item, order, profile, supplier,
};

/// One partial-match lookup against one collection
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn lookup(
        &self,
        kind: SearchKind,
        query: &str,
        limit: u64,
    ) -> Result<Vec<SearchHit>, SearchError>;
}

/// Case-insensitive `%query%` matching over the relational tables
#[derive(Clone)]
pub struct DbSearchBackend {
    db: Arc<DatabaseConnection>,
}

impl DbSearchBackend {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

/// Escape LIKE wildcards and wrap in `%...%`, lowercased
pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = query
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// `lower(col) LIKE pattern`
fn contains<C: ColumnTrait>(col: C, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).like(pattern)
}

#[async_trait]
impl SearchBackend for DbSearchBackend {
    async fn lookup(
        &self,
        kind: SearchKind,
        query: &str,
        limit: u64,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let p = like_pattern(query);
        let number = query.parse::<i64>().ok();
        let db = &*self.db;
        let wrap = move |source| SearchError::Lookup { kind, source };

        let hits = match kind {
            SearchKind::MenuItem => menu_item::Entity::find()
                .filter(
                    Condition::any()
                        .add(contains(menu_item::Column::Name, &p))
                        .add(contains(menu_item::Column::Description, &p)),
                )
                .limit(limit)
                .all(db)
                .await
                .map_err(wrap)?
                .into_iter()
                .map(|m| SearchHit::new(kind, m.id, m.name, m.description))
                .collect(),
            SearchKind::Order => {
                let mut cond = Condition::any()
                    .add(contains(order::Column::CustomerName, &p))
                    .add(contains(order::Column::CustomerPhone, &p));
                if let Some(n) = number {
                    cond = cond.add(order::Column::OrderNumber.eq(n));
                }
                order::Entity::find()
                    .filter(cond)
                    .limit(limit)
                    .all(db)
                    .await
                    .map_err(wrap)?
                    .into_iter()
                    .map(|o| {
                        SearchHit::new(
                            kind,
                            o.id,
                            format!("Order #{}", o.order_number),
                            o.customer_name,
                        )
                    })
                    .collect()
            }
            SearchKind::Category => category::Entity::find()
                .filter(contains(category::Column::Name, &p))
                .limit(limit)
                .all(db)
                .await
                .map_err(wrap)?
                .into_iter()
                .map(|c| SearchHit::new(kind, c.id, c.name, c.description))
                .collect(),
            SearchKind::Customer => customer::Entity::find()
                .filter(
                    Condition::any()
                        .add(contains(customer::Column::Name, &p))
                        .add(contains(customer::Column::Phone, &p))
                        .add(contains(customer::Column::Email, &p)),
                )
                .limit(limit)
                .all(db)
                .await
                .map_err(wrap)?
                .into_iter()
                .map(|c| SearchHit::new(kind, c.id, c.name, c.phone))
                .collect(),
            SearchKind::Supplier => supplier::Entity::find()
                .filter(
                    Condition::any()
                        .add(contains(supplier::Column::Name, &p))
                        .add(contains(supplier::Column::ContactName, &p)),
                )
                .limit(limit)
                .all(db)
                .await
                .map_err(wrap)?
                .into_iter()
                .map(|s| SearchHit::new(kind, s.id, s.name, s.contact_name))
                .collect(),
            SearchKind::Table => {
                let mut cond = Condition::any().add(contains(dining_table::Column::Status, &p));
                // numbers outside the column's range cannot match any table
                if let Some(n) = number.and_then(|n| i32::try_from(n).ok()) {
                    cond = cond.add(dining_table::Column::Number.eq(n));
                }
                dining_table::Entity::find()
                    .filter(cond)
                    .limit(limit)
                    .all(db)
                    .await
                    .map_err(wrap)?
                    .into_iter()
                    .map(|t| {
                        SearchHit::new(kind, t.id, format!("Table {}", t.number), Some(t.status))
                    })
                    .collect()
            }
            SearchKind::Inventory => inventory_item::Entity::find()
                .filter(contains(inventory_item::Column::Name, &p))
                .limit(limit)
                .all(db)
                .await
                .map_err(wrap)?
                .into_iter()
                .map(|i| {
                    let stock = format!("{} {}", i.quantity, i.unit);
                    SearchHit::new(kind, i.id, i.name, Some(stock))
                })
                .collect(),
            SearchKind::Coupon => coupon::Entity::find()
                .filter(
                    Condition::any()
                        .add(contains(coupon::Column::Code, &p))
                        .add(contains(coupon::Column::Description, &p)),
                )
                .limit(limit)
                .all(db)
                .await
                .map_err(wrap)?
                .into_iter()
                .map(|c| SearchHit::new(kind, c.id, c.code, c.description))
                .collect(),
            SearchKind::Profile => profile::Entity::find()
                .filter(
                    Condition::any()
                        .add(contains(profile::Column::Username, &p))
                        .add(contains(profile::Column::FullName, &p))
                        .add(contains(profile::Column::Email, &p)),
                )
                .limit(limit)
                .all(db)
                .await
                .map_err(wrap)?
                .into_iter()
                .map(|u| SearchHit::new(kind, u.id, u.full_name, Some(u.role)))
                .collect(),
        };

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction};

    fn backend(db: MockDatabase) -> DbSearchBackend {
        DbSearchBackend::new(Arc::new(db.into_connection()))
    }

    fn transaction_log(backend: DbSearchBackend) -> Vec<Transaction> {
        Arc::try_unwrap(backend.db)
            .ok()
            .expect("connection still shared")
            .into_transaction_log()
    }

    fn table(id: i64, number: i32) -> dining_table::Model {
        dining_table::Model {
            id,
            number,
            capacity: 4,
            status: "available".to_string(),
        }
    }

    const TABLE_COLUMNS: &str = r#"SELECT "pos_dining_table"."id", "pos_dining_table"."number", "pos_dining_table"."capacity", "pos_dining_table"."status" FROM "pos_dining_table""#;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Pizza"), "%pizza%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[tokio::test]
    async fn test_menu_item_lookup_query() {
        let backend = backend(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
            vec![menu_item::Model {
                id: 7,
                category_id: 1,
                name: "Pizza Margherita".to_string(),
                description: Some("Tomato, mozzarella".to_string()),
                price_cents: 4500,
                image_url: None,
                available: true,
            }],
        ]));

        let hits = backend.lookup(SearchKind::MenuItem, "Pizza", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Pizza Margherita");
        assert_eq!(hits[0].route, "/menu?item=7");

        assert_eq!(
            transaction_log(backend),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"SELECT "pos_menu_item"."id", "pos_menu_item"."category_id", "pos_menu_item"."name", "pos_menu_item"."description", "pos_menu_item"."price_cents", "pos_menu_item"."image_url", "pos_menu_item"."available" FROM "pos_menu_item" WHERE LOWER("name") LIKE $1 OR LOWER("description") LIKE $2 LIMIT $3"#,
                ["%pizza%".into(), "%pizza%".into(), 5u64.into()]
            )]
        );
    }

    #[tokio::test]
    async fn test_table_lookup_matches_number() {
        let backend = backend(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![table(3, 12)]]),
        );

        let hits = backend.lookup(SearchKind::Table, "12", 3).await.unwrap();
        assert_eq!(hits[0].title, "Table 12");

        assert_eq!(
            transaction_log(backend),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                &format!(
                    r#"{} WHERE LOWER("status") LIKE $1 OR "pos_dining_table"."number" = $2 LIMIT $3"#,
                    TABLE_COLUMNS
                ),
                ["%12%".into(), 12i32.into(), 3u64.into()]
            )]
        );
    }

    #[tokio::test]
    async fn test_table_lookup_ignores_out_of_range_number() {
        let backend = backend(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<dining_table::Model>::new()]),
        );

        let hits = backend.lookup(SearchKind::Table, "4294967297", 3).await.unwrap();
        assert!(hits.is_empty());

        // no number filter: 4294967297 would wrap to table 1
        assert_eq!(
            transaction_log(backend),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                &format!(r#"{} WHERE LOWER("status") LIKE $1 LIMIT $2"#, TABLE_COLUMNS),
                ["%4294967297%".into(), 3u64.into()]
            )]
        );
    }

    #[tokio::test]
    async fn test_lookup_error_is_tagged() {
        let backend = backend(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([sea_orm::DbErr::Custom("down".into())]),
        );

        let err = backend.lookup(SearchKind::Coupon, "xmas", 3).await.unwrap_err();
        assert!(matches!(err, SearchError::Lookup { kind: SearchKind::Coupon, .. }));
    }
}
