//! Hayat Backend - Blood Donation Coordination API
//!
//! Run modes:
//!   cargo run -- api                 - Start the REST API server
//!   cargo run -- admin [options]     - Create an administrator account
//!   cargo run -- help                - Show usage

use std::env;

use hayat::config::AppConfig;
use hayat::storage::{AdminStore, SqliteStore};
use hayat::types::user::{Admin, Role};
use hayat::{api, auth, logging};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "api" => run_api_server(&args[2..]).await,
        "admin" => run_create_admin(&args[2..]).await,
        "help" | "--help" | "-h" => print_usage(),
        _ => print_usage(),
    }
}

fn print_usage() {
    println!("Hayat Backend - Blood Donation Coordination API");
    println!();
    println!("Usage:");
    println!("  hayat-api api [--port <port>]               Start REST API server (default: 3000)");
    println!("  hayat-api admin --username <u> --email <e> --password <p> [--superadmin]");
    println!("                                              Create an administrator account");
    println!();
    println!("Environment Variables:");
    println!("  HAYAT_ENV             production or development (default: development)");
    println!("  HAYAT_PORT            REST API port (default: 3000)");
    println!("  HAYAT_DB_PATH         SQLite database path (default: data/hayat.db)");
    println!("  HAYAT_JWT_SECRET      Token signing secret (required in production)");
    println!("  HAYAT_TOKEN_TTL_SECS  Token lifetime in seconds (default: 86400)");
    println!("  HAYAT_LOG_LEVEL       Logging level (default: info)");
}

/// Start the REST API server
async fn run_api_server(args: &[String]) {
    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Parse arguments
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                config.port = args[i + 1].parse().unwrap_or(config.port);
                i += 2;
            }
            _ => i += 1,
        }
    }

    if let Err(e) = logging::init_from_config(&config) {
        eprintln!("Warning: {}", e);
    }
    config.print_summary();

    if let Err(e) = api::start_server(config).await {
        eprintln!("API server error: {}", e);
        std::process::exit(1);
    }
}

/// Create an administrator account in the configured database
async fn run_create_admin(args: &[String]) {
    let mut username = None;
    let mut email = None;
    let mut password = None;
    let mut role = Role::Admin;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--username" if i + 1 < args.len() => {
                username = Some(args[i + 1].clone());
                i += 2;
            }
            "--email" if i + 1 < args.len() => {
                email = Some(args[i + 1].clone());
                i += 2;
            }
            "--password" if i + 1 < args.len() => {
                password = Some(args[i + 1].clone());
                i += 2;
            }
            "--superadmin" => {
                role = Role::Superadmin;
                i += 1;
            }
            _ => i += 1,
        }
    }

    let (username, email, password) = match (username, email, password) {
        (Some(u), Some(e), Some(p)) => (u, e, p),
        _ => {
            eprintln!("admin mode requires --username, --email, and --password");
            print_usage();
            std::process::exit(1);
        }
    };

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let store = match SqliteStore::new(&config.db_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Storage error: {}", e);
            std::process::exit(1);
        }
    };

    let password_hash = match auth::hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            eprintln!("Hashing error: {}", e);
            std::process::exit(1);
        }
    };

    let admin = Admin::new(username, email, password_hash, role);
    match store.insert_admin(&admin).await {
        Ok(()) => println!("Created {} account {} ({})", admin.role, admin.username, admin.id),
        Err(e) => {
            eprintln!("Failed to create admin: {}", e);
            std::process::exit(1);
        }
    }
}
