//! Initial data for a fresh installation
//!
//! Each collection is filled only when it has no rows yet, so running the
//! seed twice is harmless.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};

use crate::entity::profile::Role;
use crate::entity::{category, dining_table, menu_item, profile, restaurant_settings};

pub const ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// (name, sort order)
pub const CATEGORIES: [(&str, i32); 4] = [
    ("Starters", 1),
    ("Mains", 2),
    ("Desserts", 3),
    ("Drinks", 4),
];

/// (number, capacity)
pub const TABLES: [(i32, i32); 8] = [
    (1, 2),
    (2, 2),
    (3, 4),
    (4, 4),
    (5, 4),
    (6, 6),
    (7, 6),
    (8, 8),
];

pub struct SeedItem {
    pub category: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price_cents: i64,
}

pub const MENU_ITEMS: [SeedItem; 8] = [
    SeedItem {
        category: "Starters",
        name: "Bruschetta",
        description: "Toasted bread, tomato, basil and olive oil",
        price_cents: 2490,
    },
    SeedItem {
        category: "Starters",
        name: "Garlic Bread",
        description: "Baked with garlic butter and parsley",
        price_cents: 1890,
    },
    SeedItem {
        category: "Mains",
        name: "Margherita Pizza",
        description: "Tomato sauce, mozzarella and basil",
        price_cents: 4990,
    },
    SeedItem {
        category: "Mains",
        name: "Spaghetti Carbonara",
        description: "Egg, pecorino, guanciale and black pepper",
        price_cents: 4590,
    },
    SeedItem {
        category: "Mains",
        name: "Grilled Salmon",
        description: "With lemon butter and seasonal vegetables",
        price_cents: 6890,
    },
    SeedItem {
        category: "Desserts",
        name: "Tiramisu",
        description: "Mascarpone, espresso and cocoa",
        price_cents: 2290,
    },
    SeedItem {
        category: "Drinks",
        name: "Fresh Lemonade",
        description: "Squeezed to order",
        price_cents: 990,
    },
    SeedItem {
        category: "Drinks",
        name: "Espresso",
        description: "Single shot",
        price_cents: 690,
    },
];

/// What one run inserted
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub settings: bool,
    pub categories: usize,
    pub tables: usize,
    pub menu_items: usize,
    pub admin: bool,
}

async fn is_empty<E: EntityTrait, C: ConnectionTrait>(db: &C) -> Result<bool, DbErr> {
    Ok(E::find().one(db).await?.is_none())
}

fn step(msg: &str) {
    println!("==> {}", msg);
    tracing::info!("{}", msg);
}

/// Fill every empty collection
pub async fn run<C: ConnectionTrait>(db: &C, admin_password: &str) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();

    if is_empty::<restaurant_settings::Entity, _>(db).await? {
        restaurant_settings::ActiveModel {
            name: Set("RestoPOS".to_string()),
            address: Set(None),
            phone: Set(None),
            email: Set(None),
            currency: Set("BRL".to_string()),
            service_fee_percent: Set(10),
            receipt_footer: Set(Some("Thank you for dining with us!".to_string())),
            ..Default::default()
        }
        .insert(db)
        .await?;
        report.settings = true;
        step("Created restaurant settings");
    } else {
        step("Restaurant settings exist, skipping");
    }

    if is_empty::<category::Entity, _>(db).await? {
        for (name, sort_order) in CATEGORIES {
            category::ActiveModel {
                name: Set(name.to_string()),
                description: Set(None),
                sort_order: Set(sort_order),
                active: Set(true),
                ..Default::default()
            }
            .insert(db)
            .await?;
            report.categories += 1;
        }
        step(&format!("Created {} categories", report.categories));
    } else {
        step("Categories exist, skipping");
    }

    if is_empty::<dining_table::Entity, _>(db).await? {
        for (number, capacity) in TABLES {
            dining_table::ActiveModel {
                number: Set(number),
                capacity: Set(capacity),
                status: Set(dining_table::TableStatus::Available.as_str().to_string()),
                ..Default::default()
            }
            .insert(db)
            .await?;
            report.tables += 1;
        }
        step(&format!("Created {} tables", report.tables));
    } else {
        step("Tables exist, skipping");
    }

    if is_empty::<menu_item::Entity, _>(db).await? {
        let categories = category::Entity::find().all(db).await?;
        for item in &MENU_ITEMS {
            let Some(cat) = categories.iter().find(|c| c.name == item.category) else {
                println!("    no category {:?}, skipping {}", item.category, item.name);
                continue;
            };
            menu_item::ActiveModel {
                category_id: Set(cat.id),
                name: Set(item.name.to_string()),
                description: Set(Some(item.description.to_string())),
                price_cents: Set(item.price_cents),
                image_url: Set(None),
                available: Set(true),
                ..Default::default()
            }
            .insert(db)
            .await?;
            report.menu_items += 1;
        }
        step(&format!("Created {} menu items", report.menu_items));
    } else {
        step("Menu items exist, skipping");
    }

    let admin = profile::Entity::find()
        .filter(profile::Column::Username.eq(ADMIN_USERNAME))
        .one(db)
        .await?;
    if admin.is_none() {
        let now = chrono::Utc::now().timestamp();
        profile::ActiveModel {
            username: Set(ADMIN_USERNAME.to_string()),
            password: Set(bcrypt::hash(admin_password, bcrypt::DEFAULT_COST)?),
            full_name: Set("Administrator".to_string()),
            email: Set(None),
            role: Set(Role::Admin.as_str().to_string()),
            active: Set(true),
            last_login: Set(0),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        report.admin = true;
        step(&format!("Created user {:?}", ADMIN_USERNAME));
    } else {
        step("Admin user exists, skipping");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::HashSet;

    fn settings_row() -> restaurant_settings::Model {
        restaurant_settings::Model {
            id: 1,
            name: "RestoPOS".to_string(),
            address: None,
            phone: None,
            email: None,
            currency: "BRL".to_string(),
            service_fee_percent: 10,
            receipt_footer: None,
        }
    }

    fn category_rows() -> Vec<category::Model> {
        CATEGORIES
            .iter()
            .enumerate()
            .map(|(i, (name, sort_order))| category::Model {
                id: i as i64 + 1,
                name: name.to_string(),
                description: None,
                sort_order: *sort_order,
                active: true,
            })
            .collect()
    }

    fn table_rows() -> Vec<dining_table::Model> {
        TABLES
            .iter()
            .enumerate()
            .map(|(i, (number, capacity))| dining_table::Model {
                id: i as i64 + 1,
                number: *number,
                capacity: *capacity,
                status: "available".to_string(),
            })
            .collect()
    }

    fn menu_rows() -> Vec<menu_item::Model> {
        MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(i, item)| menu_item::Model {
                id: i as i64 + 1,
                category_id: 1,
                name: item.name.to_string(),
                description: None,
                price_cents: item.price_cents,
                image_url: None,
                available: true,
            })
            .collect()
    }

    fn admin_row() -> profile::Model {
        profile::Model {
            id: 1,
            username: ADMIN_USERNAME.to_string(),
            password: String::new(),
            full_name: "Administrator".to_string(),
            email: None,
            role: "admin".to_string(),
            active: true,
            last_login: 0,
            created_at: 0,
        }
    }

    #[test]
    fn test_seed_data() {
        for item in &MENU_ITEMS {
            assert!(
                CATEGORIES.iter().any(|(name, _)| *name == item.category),
                "{}",
                item.name
            );
            assert!(item.price_cents > 0);
        }
        let numbers: HashSet<i32> = TABLES.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers.len(), TABLES.len());
        let names: HashSet<&str> = MENU_ITEMS.iter().map(|i| i.name).collect();
        assert_eq!(names.len(), MENU_ITEMS.len());
    }

    #[tokio::test]
    async fn test_first_run_fills_everything() {
        // every INSERT ... RETURNING answers with one row
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<restaurant_settings::Model>::new(), vec![settings_row()]])
            .append_query_results([Vec::<category::Model>::new()])
            .append_query_results(category_rows().into_iter().map(|c| vec![c]))
            .append_query_results([Vec::<dining_table::Model>::new()])
            .append_query_results(table_rows().into_iter().map(|t| vec![t]))
            .append_query_results([Vec::<menu_item::Model>::new()])
            .append_query_results([category_rows()])
            .append_query_results(menu_rows().into_iter().map(|m| vec![m]))
            .append_query_results([Vec::<profile::Model>::new(), vec![admin_row()]])
            .into_connection();

        let report = run(&db, "secret1").await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                settings: true,
                categories: 4,
                tables: 8,
                menu_items: 8,
                admin: true,
            }
        );

        // four emptiness checks, the admin lookup and the category reload,
        // then one statement per inserted row
        assert_eq!(db.into_transaction_log().len(), 4 + 1 + 1 + (1 + 4 + 8 + 8 + 1));
    }

    #[tokio::test]
    async fn test_second_run_inserts_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![settings_row()]])
            .append_query_results([category_rows()])
            .append_query_results([table_rows()])
            .append_query_results([menu_rows()])
            .append_query_results([vec![admin_row()]])
            .into_connection();

        let report = run(&db, "unused").await.unwrap();
        assert_eq!(report, SeedReport::default());

        // one lookup per collection and nothing else
        assert_eq!(db.into_transaction_log().len(), 5);
    }
}
