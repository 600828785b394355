//! Populate a fresh RestoPOS database with starter records
//!
//! Usage: seed [-config <path>] [-admin-password <password>]

use std::env;

use restopos::{db, seed, Config};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "-help" || arg == "--help") {
        println!("Usage: seed [OPTIONS]");
        println!("Options:");
        println!("  -config <path>             Path to configuration file (default: ./etc/restopos.toml)");
        println!("  -admin-password <password> Password for the admin user (default: RESTOPOS_ADMIN_PASSWORD or {})", seed::DEFAULT_ADMIN_PASSWORD);
        println!("  -help, --help              Print this help message");
        return Ok(());
    }

    let config_path = Config::path_from_args(&args);
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Could not load config file: {}, using defaults", e);
        Config::default()
    });

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    fmt::fmt().with_env_filter(env_filter).with_target(false).init();

    let password = args
        .iter()
        .skip_while(|arg| arg.as_str() != "-admin-password")
        .nth(1)
        .cloned()
        .or_else(|| env::var("RESTOPOS_ADMIN_PASSWORD").ok())
        .unwrap_or_else(|| seed::DEFAULT_ADMIN_PASSWORD.to_string());

    println!(
        "Seeding database {} on {}:{}",
        config.database.name, config.database.host, config.database.port
    );
    let db = db::init_database(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Database initialization failed: {}", e))?;

    let report = seed::run(&db, &password).await?;
    println!(
        "Done: settings={} categories={} tables={} menu items={} admin={}",
        report.settings, report.categories, report.tables, report.menu_items, report.admin
    );
    if report.admin && password == seed::DEFAULT_ADMIN_PASSWORD {
        println!("Log in as {:?} and change the default password", seed::ADMIN_USERNAME);
    }

    Ok(())
}
