//! Order writes
//!
//! Every status change appends a row to the status history and publishes it
//! on the change feed; customer notifications are driven from those events.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::catalog::set_table_status;
use crate::entity::dining_table::TableStatus;
use crate::entity::order::{OrderStatus, OrderType};
use crate::entity::{coupon, menu_item, order, order_item, order_status_history};
use crate::notify::ChangeFeed;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("An order needs at least one item")]
    Empty,

    #[error("Item quantity must be positive")]
    InvalidQuantity,

    #[error("Menu item {0} does not exist")]
    UnknownMenuItem(i64),

    #[error("{0} is not available")]
    Unavailable(String),

    #[error("Coupon {0} is invalid or expired")]
    InvalidCoupon(String),

    #[error("Order not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl OrderError {
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            OrderError::Database(_) => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
    #[serde(rename = "menuItemId")]
    pub menu_item_id: i64,
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    #[serde(rename = "tableId")]
    pub table_id: Option<i64>,
    #[serde(rename = "customerId")]
    pub customer_id: Option<i64>,
    #[serde(rename = "customerName")]
    pub customer_name: Option<String>,
    #[serde(rename = "customerPhone")]
    pub customer_phone: Option<String>,
    #[serde(rename = "orderType")]
    pub order_type: OrderType,
    pub notes: Option<String>,
    #[serde(rename = "couponCode")]
    pub coupon_code: Option<String>,
    pub items: Vec<NewOrderItem>,
}

pub fn next_order_number(last: Option<i64>) -> i64 {
    last.unwrap_or(0) + 1
}

/// Percent discount, rounded down to the cent
pub fn discount_cents(subtotal_cents: i64, percent: i32) -> i64 {
    let percent = i64::from(percent.clamp(0, 100));
    subtotal_cents * percent / 100
}

fn coupon_usable(c: &coupon::Model, now: i64) -> bool {
    c.active && c.expires_at.map_or(true, |exp| exp > now)
}

/// Create an order with its items and the initial `pending` history row
pub async fn create_order(
    db: &DatabaseConnection,
    feed: &ChangeFeed,
    new: NewOrder,
    created_by: Option<i64>,
) -> Result<(order::Model, Vec<order_item::Model>), OrderError> {
    if new.items.is_empty() {
        return Err(OrderError::Empty);
    }
    if new.items.iter().any(|i| i.quantity <= 0) {
        return Err(OrderError::InvalidQuantity);
    }

    let ids: Vec<i64> = new.items.iter().map(|i| i.menu_item_id).collect();
    let menu: HashMap<i64, menu_item::Model> = menu_item::Entity::find()
        .filter(menu_item::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let mut subtotal = 0i64;
    for line in &new.items {
        let item = menu
            .get(&line.menu_item_id)
            .ok_or(OrderError::UnknownMenuItem(line.menu_item_id))?;
        if !item.available {
            return Err(OrderError::Unavailable(item.name.clone()));
        }
        subtotal += item.price_cents * i64::from(line.quantity);
    }

    let now = chrono::Utc::now().timestamp();
    let coupon_code = new
        .coupon_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_uppercase);
    let discount = match &coupon_code {
        Some(code) => {
            let found = coupon::Entity::find()
                .filter(coupon::Column::Code.eq(code.as_str()))
                .one(db)
                .await?;
            match found {
                Some(c) if coupon_usable(&c, now) => discount_cents(subtotal, c.discount_percent),
                _ => return Err(OrderError::InvalidCoupon(code.clone())),
            }
        }
        None => 0,
    };

    let txn = db.begin().await?;

    let last = order::Entity::find()
        .order_by_desc(order::Column::OrderNumber)
        .one(&txn)
        .await?
        .map(|o| o.order_number);

    let table_id = match new.order_type {
        OrderType::DineIn => new.table_id,
        _ => None,
    };

    let created = order::ActiveModel {
        order_number: Set(next_order_number(last)),
        table_id: Set(table_id),
        customer_id: Set(new.customer_id),
        customer_name: Set(new.customer_name),
        customer_phone: Set(new.customer_phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())),
        order_type: Set(new.order_type.as_str().to_string()),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        notes: Set(new.notes),
        coupon_code: Set(coupon_code),
        subtotal_cents: Set(subtotal),
        discount_cents: Set(discount),
        total_cents: Set(subtotal - discount),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(new.items.len());
    for line in new.items {
        let menu_entry = &menu[&line.menu_item_id];
        let item = order_item::ActiveModel {
            order_id: Set(created.id),
            menu_item_id: Set(line.menu_item_id),
            name: Set(menu_entry.name.clone()),
            unit_price_cents: Set(menu_entry.price_cents),
            quantity: Set(line.quantity),
            notes: Set(line.notes),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    let history = insert_history(&txn, created.id, OrderStatus::Pending, created_by).await?;

    if let Some(table_id) = table_id {
        set_table_status(&txn, table_id, TableStatus::Occupied).await?;
    }

    txn.commit().await?;

    tracing::info!("Order #{} created ({} items)", created.order_number, items.len());
    feed.publish_insert(order::TABLE_NAME, &created);
    feed.publish_insert(order_status_history::TABLE_NAME, &history);

    Ok((created, items))
}

async fn insert_history<C: ConnectionTrait>(
    db: &C,
    order_id: i64,
    status: OrderStatus,
    changed_by: Option<i64>,
) -> Result<order_status_history::Model, DbErr> {
    order_status_history::ActiveModel {
        order_id: Set(order_id),
        status: Set(status.as_str().to_string()),
        changed_by: Set(changed_by),
        created_at: Set(chrono::Utc::now().timestamp()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Move an order to `status`, record the transition and publish it once
/// committed
pub async fn update_status(
    db: &DatabaseConnection,
    feed: &ChangeFeed,
    order_id: i64,
    status: OrderStatus,
    changed_by: Option<i64>,
) -> Result<order::Model, OrderError> {
    let txn = db.begin().await?;

    let current = order::Entity::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(OrderError::NotFound)?;
    let table_id = current.table_id;

    let mut active: order::ActiveModel = current.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(chrono::Utc::now().timestamp());
    let updated = active.update(&txn).await?;

    let history = insert_history(&txn, order_id, status, changed_by).await?;

    if let (Some(table_id), OrderStatus::Completed | OrderStatus::Cancelled) = (table_id, status) {
        set_table_status(&txn, table_id, TableStatus::Available).await?;
    }

    txn.commit().await?;

    tracing::info!("Order #{} is now {}", updated.order_number, status.as_str());
    feed.publish_update(order::TABLE_NAME, &updated);
    feed.publish_insert(order_status_history::TABLE_NAME, &history);

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ChangeKind;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn sample_order(status: &str) -> order::Model {
        order::Model {
            id: 10,
            order_number: 55,
            table_id: None,
            customer_id: None,
            customer_name: Some("Bruno".to_string()),
            customer_phone: Some("11999990000".to_string()),
            order_type: "delivery".to_string(),
            status: status.to_string(),
            notes: None,
            coupon_code: None,
            subtotal_cents: 3000,
            discount_cents: 0,
            total_cents: 3000,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_order_numbers() {
        assert_eq!(next_order_number(None), 1);
        assert_eq!(next_order_number(Some(41)), 42);
    }

    #[test]
    fn test_discount() {
        assert_eq!(discount_cents(10000, 10), 1000);
        assert_eq!(discount_cents(999, 15), 149);
        assert_eq!(discount_cents(500, 150), 500);
        assert_eq!(discount_cents(500, -5), 0);
    }

    #[test]
    fn test_coupon_expiry() {
        let c = coupon::Model {
            id: 1,
            code: "XMAS".to_string(),
            description: None,
            discount_percent: 10,
            active: true,
            expires_at: Some(100),
        };
        assert!(coupon_usable(&c, 99));
        assert!(!coupon_usable(&c, 100));
        assert!(!coupon_usable(&coupon::Model { active: false, ..c.clone() }, 0));
        assert!(coupon_usable(&coupon::Model { expires_at: None, ..c }, i64::MAX));
    }

    #[tokio::test]
    async fn test_update_status_records_and_publishes() {
        let history = order_status_history::Model {
            id: 3,
            order_id: 10,
            status: "ready".to_string(),
            changed_by: Some(1),
            created_at: 0,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_order("preparing")]])
            .append_query_results([vec![sample_order("ready")]])
            .append_query_results([vec![history]])
            .into_connection();
        let feed = ChangeFeed::new(8);
        let mut rx = feed.subscribe();

        let updated = update_status(&db, &feed, 10, OrderStatus::Ready, Some(1))
            .await
            .unwrap();
        assert_eq!(updated.status, "ready");

        let first = rx.recv().await.unwrap();
        assert_eq!((first.table.as_str(), first.kind), (order::TABLE_NAME, ChangeKind::Update));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.table, order_status_history::TABLE_NAME);
        assert_eq!(second.kind, ChangeKind::Insert);
        assert_eq!(second.record["status"], "ready");
        assert_eq!(second.record["order_id"], 10);
    }

    #[tokio::test]
    async fn test_update_status_missing_order() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<order::Model>::new()])
            .into_connection();
        let feed = ChangeFeed::new(8);

        let err = update_status(&db, &feed, 99, OrderStatus::Ready, None)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotFound));
        assert_eq!(feed.publish_insert("probe", &()), 0);
    }

    #[tokio::test]
    async fn test_create_order_rejects_empty() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let feed = ChangeFeed::new(8);
        let new = NewOrder {
            table_id: None,
            customer_id: None,
            customer_name: None,
            customer_phone: None,
            order_type: OrderType::Takeaway,
            notes: None,
            coupon_code: None,
            items: vec![],
        };
        assert!(matches!(create_order(&db, &feed, new, None).await, Err(OrderError::Empty)));
    }
}
