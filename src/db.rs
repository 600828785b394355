use sea_orm::sea_query::TableCreateStatement;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Schema,
    Statement,
};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::entity::{
    category, coupon, customer, dining_table, inventory_item, menu_item, order, order_item,
    order_status_history, profile, restaurant_settings, supplier, theme_preference,
    user_permission,
};

/// Initialize database connection and auto-migrate tables
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let database_url = config.connection_url();

    info!("Connecting to database: {}:{}/{}", config.host, config.port, config.name);

    let mut opt = ConnectOptions::new(&database_url);
    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug)
        .set_schema_search_path("public");

    let db = Database::connect(opt).await?;
    info!("Database connection established");

    auto_migrate(&db).await?;

    Ok(db)
}

/// Create every table that does not exist yet
async fn auto_migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    info!("Running auto-migration for all entities...");

    // Catalog and settings
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(restaurant_settings::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(category::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(menu_item::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(dining_table::Entity)).await?;

    // Staff
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(profile::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(user_permission::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(theme_preference::Entity)).await?;

    // Back office
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(customer::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(supplier::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(inventory_item::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(coupon::Entity)).await?;

    // Orders
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(order::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(order_item::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(order_status_history::Entity)).await?;

    info!("Auto-migration completed successfully");
    Ok(())
}

/// Create a table if it doesn't exist
async fn create_table_if_not_exists(
    db: &DatabaseConnection,
    backend: DbBackend,
    mut stmt: TableCreateStatement,
) -> Result<(), DbErr> {
    stmt.if_not_exists();

    let sql = backend.build(&stmt);

    db.execute(Statement::from_string(backend, sql.to_string())).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_table_statement() {
        let schema = Schema::new(DbBackend::Postgres);
        let mut stmt = schema.create_table_from_entity(order::Entity);
        stmt.if_not_exists();
        let sql = DbBackend::Postgres.build(&stmt).to_string();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"pos_order\""));
        assert!(sql.contains("\"customer_phone\""));
    }

    #[test]
    fn test_table_number_is_unique() {
        let schema = Schema::new(DbBackend::Postgres);
        let stmt = schema.create_table_from_entity(dining_table::Entity);
        let sql = DbBackend::Postgres.build(&stmt).to_string();
        assert!(sql.contains("\"number\" integer"));
        assert!(sql.contains("UNIQUE"));
    }
}
